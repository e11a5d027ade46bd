//! Builder para `LoopEngine`.
//!
//! Patrón consume-self: cada `with_*` reemplaza un colaborador y devuelve un
//! builder re-parametrizado; `build` entrega el engine final. Los defaults
//! (evaluación estándar de acceso, sin transacciones, avisos descartados)
//! permiten construir un engine útil sin configurar nada.

use crate::access::{AccessProvider, StaticAccessProvider};
use crate::engine::core::LoopEngine;
use crate::notify::{NotificationChannel, NullNotifier};
use crate::signal::{NavigationSignal, Outcome, SignalCallbacks};
use crate::txn::{NoTransactions, TransactionProvider};

pub struct EngineBuilder<A, T, N>
    where A: AccessProvider,
          T: TransactionProvider,
          N: NotificationChannel
{
    access: A,
    transactions: T,
    notifier: N,
    callbacks: SignalCallbacks,
}

impl EngineBuilder<StaticAccessProvider, NoTransactions, NullNotifier> {
    pub(crate) fn init() -> Self {
        Self { access: StaticAccessProvider,
               transactions: NoTransactions,
               notifier: NullNotifier,
               callbacks: SignalCallbacks::new() }
    }
}

impl<A, T, N> EngineBuilder<A, T, N>
    where A: AccessProvider,
          T: TransactionProvider,
          N: NotificationChannel
{
    /// Reemplaza el proveedor de acceso.
    pub fn with_access<A2>(self, access: A2) -> EngineBuilder<A2, T, N>
        where A2: AccessProvider
    {
        EngineBuilder { access,
                        transactions: self.transactions,
                        notifier: self.notifier,
                        callbacks: self.callbacks }
    }

    /// Reemplaza el proveedor de transacciones.
    pub fn with_transactions<T2>(self, transactions: T2) -> EngineBuilder<A, T2, N>
        where T2: TransactionProvider
    {
        EngineBuilder { access: self.access,
                        transactions,
                        notifier: self.notifier,
                        callbacks: self.callbacks }
    }

    /// Reemplaza el canal de notificaciones.
    pub fn with_notifier<N2>(self, notifier: N2) -> EngineBuilder<A, T, N2>
        where N2: NotificationChannel
    {
        EngineBuilder { access: self.access,
                        transactions: self.transactions,
                        notifier,
                        callbacks: self.callbacks }
    }

    /// Registra el callback de una señal (a lo sumo uno por variante; el
    /// último registro gana). Se dispara exactamente una vez al terminar,
    /// después de resolver la transacción.
    pub fn on_signal<F>(mut self, signal: NavigationSignal, callback: F) -> Self
        where F: FnMut(&Outcome) + 'static
    {
        self.callbacks.register(signal, Box::new(callback));
        self
    }

    pub fn build(self) -> LoopEngine<A, T, N> {
        LoopEngine::from_parts(self.access, self.transactions, self.notifier, self.callbacks)
    }
}
