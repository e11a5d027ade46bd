//! Frontera de transacción de un run.
//!
//! Rol en el flujo:
//! - `TransactionManager::maybe_begin` abre una transacción sólo si la
//!   metadata del mapa la declara. Un `begin` fallido es un error fatal de
//!   configuración: la garantía declarada no se puede honrar, así que el run
//!   aborta antes de ejecutar paso alguno.
//! - Exactamente uno de {commit, rollback, ninguno} ocurre por run. El
//!   manager garantiza la exclusión aunque el orquestador intente resolver
//!   dos veces.
//! - Sin transacción declarada, commit y rollback son no-ops.
//!
//! El proveedor es inyectado (mismo patrón que el `ConnectionProvider` de la
//! capa de persistencia): el motor nunca sabe qué hay detrás del handle.

use thiserror::Error;
use uuid::Uuid;

use crate::errors::LooperError;
use crate::stepmap::StepMap;

/// Handle opaco emitido por el proveedor. `commit` y `rollback` son
/// mutuamente excluyentes y cada uno se llama a lo sumo una vez.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionHandle(pub Uuid);

impl TransactionHandle {
    pub fn mint() -> Self {
        Self(Uuid::new_v4())
    }
}

/// El proveedor no puede abrir la transacción pedida.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct BeginRefused(pub String);

/// Proveedor de transacciones inyectado por el host. `commit`/`rollback` son
/// fire-and-forget desde el punto de vista del motor; un backend que pueda
/// fallar al confirmar debe resolverlo (o loguearlo) por su cuenta.
pub trait TransactionProvider {
    fn begin(&mut self) -> Result<TransactionHandle, BeginRefused>;
    fn commit(&mut self, handle: TransactionHandle);
    fn rollback(&mut self, handle: TransactionHandle);
}

/// Proveedor por defecto: rechaza abrir. Con él, un mapa que declara
/// transacción es un error de configuración y uno que no la declara corre
/// igual que siempre.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTransactions;

impl TransactionProvider for NoTransactions {
    fn begin(&mut self) -> Result<TransactionHandle, BeginRefused> {
        Err(BeginRefused("no transaction provider configured".to_string()))
    }

    fn commit(&mut self, _handle: TransactionHandle) {}

    fn rollback(&mut self, _handle: TransactionHandle) {}
}

/// Proveedor en memoria que registra cada operación; el backend de referencia
/// para tests, igual que la store en memoria del event log del motor F2.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTransactionProvider {
    pub begun: Vec<TransactionHandle>,
    pub committed: Vec<TransactionHandle>,
    pub rolled_back: Vec<TransactionHandle>,
}

impl InMemoryTransactionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invariante de exclusividad: nunca commit y rollback para el mismo run.
    pub fn resolved_exclusively(&self) -> bool {
        self.committed.iter().all(|h| !self.rolled_back.contains(h))
    }
}

impl TransactionProvider for InMemoryTransactionProvider {
    fn begin(&mut self) -> Result<TransactionHandle, BeginRefused> {
        let handle = TransactionHandle::mint();
        self.begun.push(handle);
        log::debug!("transaction begun: {:?}", handle);
        Ok(handle)
    }

    fn commit(&mut self, handle: TransactionHandle) {
        log::debug!("transaction committed: {:?}", handle);
        self.committed.push(handle);
    }

    fn rollback(&mut self, handle: TransactionHandle) {
        log::debug!("transaction rolled back: {:?}", handle);
        self.rolled_back.push(handle);
    }
}

/// Estado transaccional de UN run. Propiedad exclusiva del run.
#[derive(Debug, Default)]
pub struct TransactionManager {
    handle: Option<TransactionHandle>,
    resolved: bool,
}

impl TransactionManager {
    /// Manager sin transacción (aún no se consultó la metadata).
    pub fn inactive() -> Self {
        Self::default()
    }

    /// Abre una transacción sólo si la metadata del mapa la declara.
    pub fn maybe_begin<T>(provider: &mut T, map: &StepMap) -> Result<Self, LooperError>
        where T: TransactionProvider
    {
        if !map.metadata().transaction {
            return Ok(Self::inactive());
        }
        let handle = provider.begin()
                             .map_err(|e| LooperError::TransactionBegin(e.to_string()))?;
        Ok(Self { handle: Some(handle),
                  resolved: false })
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_some() && !self.resolved
    }

    pub fn commit<T>(&mut self, provider: &mut T)
        where T: TransactionProvider
    {
        if let Some(handle) = self.take() {
            provider.commit(handle);
        }
    }

    pub fn rollback<T>(&mut self, provider: &mut T)
        where T: TransactionProvider
    {
        if let Some(handle) = self.take() {
            provider.rollback(handle);
        }
    }

    /// Entrega el handle una única vez; llamadas posteriores son no-ops.
    fn take(&mut self) -> Option<TransactionHandle> {
        if self.resolved {
            return None;
        }
        self.resolved = true;
        self.handle.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_with_txn(transaction: bool) -> StepMap {
        StepMap::builder().transaction(transaction)
                          .step("s1", serde_json::json!({}))
                          .build()
    }

    #[test]
    fn no_declaration_means_no_transaction() {
        let mut provider = InMemoryTransactionProvider::new();
        let mut mgr = TransactionManager::maybe_begin(&mut provider, &map_with_txn(false)).unwrap();
        assert!(!mgr.is_active());
        mgr.commit(&mut provider);
        mgr.rollback(&mut provider);
        assert!(provider.begun.is_empty());
        assert!(provider.committed.is_empty());
        assert!(provider.rolled_back.is_empty());
    }

    #[test]
    fn commit_then_rollback_is_a_noop() {
        let mut provider = InMemoryTransactionProvider::new();
        let mut mgr = TransactionManager::maybe_begin(&mut provider, &map_with_txn(true)).unwrap();
        assert!(mgr.is_active());
        mgr.commit(&mut provider);
        mgr.rollback(&mut provider);
        mgr.commit(&mut provider);
        assert_eq!(provider.committed.len(), 1);
        assert!(provider.rolled_back.is_empty());
        assert!(provider.resolved_exclusively());
    }

    #[test]
    fn refused_begin_is_a_configuration_error() {
        let mut provider = NoTransactions;
        let err = TransactionManager::maybe_begin(&mut provider, &map_with_txn(true)).unwrap_err();
        assert!(matches!(err, LooperError::TransactionBegin(_)));
        // sin declaración el mismo proveedor funciona
        assert!(TransactionManager::maybe_begin(&mut provider, &map_with_txn(false)).is_ok());
    }

    #[test]
    fn metadata_defaults_leave_transaction_off() {
        let map = StepMap::builder().step("s1", serde_json::json!({})).build();
        assert!(!map.metadata().transaction);
        assert!(map.metadata().access.is_none());
    }
}
