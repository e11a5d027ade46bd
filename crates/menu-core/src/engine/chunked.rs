//! Modo chunked: entrega progresiva, un chunk por visita de paso.
//!
//! Mismo algoritmo por paso que el modo síncrono (comparten
//! `LoopRun::advance`), pero en lugar de iterar internamente la función es
//! una secuencia finita de un solo sentido: tras la actualización del Hat de
//! cada paso produce un chunk y queda suspendida hasta que el consumidor
//! tire del siguiente. Exactamente un punto de suspensión por paso, después
//! del dispatch y antes del gate del paso siguiente.
//!
//! La suspensión es cooperativa y dirigida por pull: el engine no agenda
//! trabajo en segundo plano ni reanuda solo. Abandonar la secuencia a mitad
//! de run NO hace limpieza implícita (ni commit, ni rollback, ni callbacks);
//! envolver cancelación o timeout es responsabilidad documentada del
//! llamador. Una secuencia agotada no se reinicia: para re-ejecutar se
//! construye un run nuevo.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::access::AccessProvider;
use crate::dispatch::Dispatcher;
use crate::engine::context::RunContext;
use crate::engine::core::{LoopEngine, LoopRun};
use crate::errors::LooperError;
use crate::notify::NotificationChannel;
use crate::signal::{NavigationSignal, Outcome};
use crate::stepmap::StepMap;
use crate::txn::TransactionProvider;

/// Una unidad de salida progresiva: corresponde a una visita de paso.
///
/// `terminal` marca el chunk con el que el run quedó resuelto. Una
/// terminación sin dispatch (denegación de item) también emite su chunk
/// terminal, con `result` nulo y la señal a bordo, para que un consumidor
/// progresivo siempre vea el final del run en banda.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub step_key: String,
    pub result: Value,
    pub signal: Option<NavigationSignal>,
    pub terminal: bool,
}

impl<A, T, N> LoopEngine<A, T, N>
    where A: AccessProvider,
          T: TransactionProvider,
          N: NotificationChannel
{
    /// Entrada progresiva: secuencia finita de chunks, dirigida por pull.
    ///
    /// `Err` en el arranque sólo por errores de configuración (transacción
    /// declarada que no se puede abrir); una denegación de bloque produce
    /// una secuencia vacía cuyo `outcome()` es `Back`.
    pub fn run_chunked<'r>(&'r mut self,
                           map: &'r StepMap,
                           ctx: RunContext,
                           dispatcher: &'r mut (dyn Dispatcher + 'r))
                           -> Result<ChunkedRun<'r, A, T, N>, LooperError> {
        Ok(ChunkedRun { inner: LoopRun::start(self, map, ctx, dispatcher)? })
    }
}

/// Run en curso del modo chunked. Iterar tira del siguiente paso; soltarlo
/// abandona el run sin limpieza implícita.
pub struct ChunkedRun<'r, A, T, N>
    where A: AccessProvider,
          T: TransactionProvider,
          N: NotificationChannel
{
    inner: LoopRun<'r, A, T, N>,
}

impl<A, T, N> ChunkedRun<'_, A, T, N>
    where A: AccessProvider,
          T: TransactionProvider,
          N: NotificationChannel
{
    pub fn run_id(&self) -> Uuid {
        self.inner.ctx.run_id
    }

    /// Outcome final; `None` mientras la secuencia no haya terminado.
    pub fn outcome(&self) -> Option<&Outcome> {
        self.inner.finished.as_ref()
    }

    /// El run quedó resuelto (se agotó o terminó por señal).
    pub fn is_finished(&self) -> bool {
        self.inner.finished.is_some()
    }
}

impl<A, T, N> Iterator for ChunkedRun<'_, A, T, N>
    where A: AccessProvider,
          T: TransactionProvider,
          N: NotificationChannel
{
    type Item = Result<Chunk, LooperError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.inner.finished.is_some() || self.inner.failed {
            return None;
        }
        match self.inner.advance() {
            Ok(Some(chunk)) => Some(Ok(chunk)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

impl<A, T, N> Drop for ChunkedRun<'_, A, T, N>
    where A: AccessProvider,
          T: TransactionProvider,
          N: NotificationChannel
{
    fn drop(&mut self) {
        // Run abandonado: sin limpieza de semántica (la transacción queda
        // sin resolver a propósito), pero la traza parcial sí se conserva
        // para observabilidad.
        if self.inner.finished.is_none() && !self.inner.failed {
            self.inner.engine.last_trace = Some(self.inner.trace.clone());
        }
    }
}
