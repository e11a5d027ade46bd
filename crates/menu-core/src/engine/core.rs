//! Orquestador del loop de pasos.
//!
//! `LoopEngine` es la pieza compartida por los dos llamadores del sistema
//! (la REPL bloqueante y el render progresivo): una única máquina de estados
//! por paso (`LoopRun::advance`) alimenta tanto `run` (drena hasta terminar)
//! como `run_chunked` (una visita de paso por pull). Así la semántica de
//! visita es idéntica en ambos modos por construcción.
//!
//! Por visita de paso: gate de item -> interpolación -> dispatch ->
//! clasificación del resultado -> actualización del Hat. Una señal termina el
//! run tal cual; un salto redirige la siguiente iteración; un redisplay
//! repite el mismo paso; cualquier otro valor se guarda y el run avanza
//! posicionalmente.

use serde_json::Value;

use crate::access::{check_block, check_item, AccessDecision, AccessProvider, StaticAccessProvider};
use crate::dispatch::{DispatchOutcome, Dispatcher};
use crate::engine::builder::EngineBuilder;
use crate::engine::chunked::Chunk;
use crate::engine::context::RunContext;
use crate::errors::LooperError;
use crate::hat::Hat;
use crate::interp::interpolate;
use crate::notify::{NotificationChannel, NullNotifier, Severity};
use crate::signal::{NavigationSignal, Outcome, SignalCallbacks};
use crate::stepmap::StepMap;
use crate::trace::{RunEventKind, RunTrace};
use crate::txn::{NoTransactions, TransactionManager, TransactionProvider};

/// Motor de ejecución de mapas de pasos.
///
/// Genérico sobre sus tres colaboradores inyectados (acceso, transacciones,
/// notificaciones); el dispatcher se inyecta por run, no por engine. El
/// engine no introduce paralelismo: cada run es estrictamente secuencial y
/// es propiedad de un solo llamador.
pub struct LoopEngine<A, T, N>
    where A: AccessProvider,
          T: TransactionProvider,
          N: NotificationChannel
{
    pub(crate) access: A,
    pub(crate) transactions: T,
    pub(crate) notifier: N,
    pub(crate) callbacks: SignalCallbacks,
    pub(crate) last_trace: Option<RunTrace>,
}

impl LoopEngine<StaticAccessProvider, NoTransactions, NullNotifier> {
    /// Engine con colaboradores por defecto: evaluación estándar de acceso,
    /// sin transacciones, avisos descartados.
    pub fn new() -> Self {
        Self { access: StaticAccessProvider,
               transactions: NoTransactions,
               notifier: NullNotifier,
               callbacks: SignalCallbacks::new(),
               last_trace: None }
    }

    /// Builder para configurar colaboradores y callbacks.
    pub fn builder() -> EngineBuilder<StaticAccessProvider, NoTransactions, NullNotifier> {
        EngineBuilder::init()
    }
}

impl Default for LoopEngine<StaticAccessProvider, NoTransactions, NullNotifier> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, T, N> LoopEngine<A, T, N>
    where A: AccessProvider,
          T: TransactionProvider,
          N: NotificationChannel
{
    pub(crate) fn from_parts(access: A, transactions: T, notifier: N, callbacks: SignalCallbacks) -> Self {
        Self { access,
               transactions,
               notifier,
               callbacks,
               last_trace: None }
    }

    /// Proveedor de acceso configurado.
    pub fn access_provider(&self) -> &A {
        &self.access
    }

    /// Proveedor de transacciones configurado (inspección post-run en tests).
    pub fn transactions(&self) -> &T {
        &self.transactions
    }

    /// Canal de notificaciones configurado.
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Traza del último run (completo o abandonado).
    pub fn trace(&self) -> Option<&RunTrace> {
        self.last_trace.as_ref()
    }

    /// Vista compacta de la traza del último run.
    pub fn trace_variants(&self) -> Option<Vec<&'static str>> {
        self.last_trace.as_ref().map(|t| t.variants())
    }

    /// Entrada síncrona: corre el mapa hasta un resultado terminal.
    ///
    /// Devuelve `Err` sólo ante errores de configuración (§ errores del
    /// crate); las denegaciones de acceso y los fallos de dispatch son
    /// outcomes, no errores.
    pub fn run(&mut self,
               map: &StepMap,
               ctx: RunContext,
               dispatcher: &mut dyn Dispatcher)
               -> Result<Outcome, LooperError> {
        let mut run = LoopRun::start(self, map, ctx, dispatcher)?;
        loop {
            match run.advance()? {
                Some(_chunk) => continue,
                None => break,
            }
        }
        run.finished
           .take()
           .ok_or_else(|| LooperError::Internal("run drained without an outcome".to_string()))
    }
}

/// Estado vivo de UNA ejecución. Compartido por ambos modos.
pub(crate) struct LoopRun<'r, A, T, N>
    where A: AccessProvider,
          T: TransactionProvider,
          N: NotificationChannel
{
    pub(crate) engine: &'r mut LoopEngine<A, T, N>,
    pub(crate) map: &'r StepMap,
    pub(crate) ctx: RunContext,
    pub(crate) dispatcher: &'r mut (dyn Dispatcher + 'r),
    pub(crate) hat: Hat,
    pub(crate) txn: TransactionManager,
    pub(crate) trace: RunTrace,
    pub(crate) cursor: usize,
    pub(crate) finished: Option<Outcome>,
    pub(crate) failed: bool,
}

impl<'r, A, T, N> LoopRun<'r, A, T, N>
    where A: AccessProvider,
          T: TransactionProvider,
          N: NotificationChannel
{
    /// Arranque de un run: gate de bloque y, si corresponde, apertura de la
    /// transacción. Ningún paso se ejecuta aquí.
    pub(crate) fn start(engine: &'r mut LoopEngine<A, T, N>,
                        map: &'r StepMap,
                        ctx: RunContext,
                        dispatcher: &'r mut (dyn Dispatcher + 'r))
                        -> Result<Self, LooperError> {
        let mut trace = RunTrace::new(ctx.run_id);
        trace.append(RunEventKind::RunStarted { definition_hash: map.definition_hash().to_string(),
                                                step_count: map.len() });

        let decision = check_block(&engine.access, map, &ctx.principal);
        let mut run = Self { engine,
                             map,
                             ctx,
                             dispatcher,
                             hat: Hat::new(),
                             txn: TransactionManager::inactive(),
                             trace,
                             cursor: 0,
                             finished: None,
                             failed: false };

        if !decision.is_granted() {
            // Denegación de bloque: aviso + Back, jamás un error duro. La
            // transacción nunca llegó a abrirse (resolución: ninguna).
            let message = deny_message(decision, None);
            log::info!("block access denied for run {}: {:?}", run.ctx.run_id, decision);
            run.engine.notifier.notify(&message, Severity::Warning);
            run.trace.append(RunEventKind::BlockDenied { decision });
            run.finish_terminated(NavigationSignal::Back, Some(message));
            return Ok(run);
        }

        match TransactionManager::maybe_begin(&mut run.engine.transactions, map) {
            Ok(txn) => run.txn = txn,
            Err(e) => {
                // La garantía declarada no se puede honrar: abortar antes de
                // ejecutar paso alguno.
                run.engine.last_trace = Some(run.trace.clone());
                return Err(e);
            }
        }
        Ok(run)
    }

    /// Una visita de paso. Devuelve `Ok(Some(chunk))` mientras haya trabajo,
    /// `Ok(None)` cuando el run ya terminó, `Err` ante un error de
    /// configuración detectado en vuelo.
    pub(crate) fn advance(&mut self) -> Result<Option<Chunk>, LooperError> {
        if self.finished.is_some() {
            return Ok(None);
        }
        let map = self.map;
        if self.cursor >= map.len() {
            // Fin de la secuencia sin señal terminal (incluye mapas vacíos).
            self.finish_completed();
            return Ok(None);
        }
        let Some((key, step)) = map.at(self.cursor) else {
            return Err(LooperError::Internal(format!("cursor {} out of bounds", self.cursor)));
        };

        // (1) gate de item, siempre antes del dispatcher
        let decision = check_item(&self.engine.access, step, &self.ctx.principal);
        if !decision.is_granted() {
            let message = deny_message(decision, Some(key));
            log::info!("item access denied at step `{key}`: {:?}", decision);
            self.engine.notifier.notify(&message, Severity::Warning);
            self.trace.append(RunEventKind::StepDenied { step_key: key.to_string(),
                                                         decision });
            self.finish_terminated(NavigationSignal::Back, Some(message));
            return Ok(Some(Chunk { step_key: key.to_string(),
                                   result: Value::Null,
                                   signal: Some(NavigationSignal::Back),
                                   terminal: true }));
        }

        // (2) interpolación, una vez por visita y sólo sobre estos params
        let params = interpolate(&step.params, &self.hat);

        // (3) dispatch
        self.trace.append(RunEventKind::StepDispatched { step_index: self.cursor,
                                                         step_key: key.to_string() });
        let dispatched = self.dispatcher.dispatch(key, &params);

        // (4) clasificación del resultado
        match dispatched {
            Err(err) => {
                // Recuperación local: log con contexto, rollback si hay
                // transacción activa, conversión a `Error`. Nunca se
                // propaga más allá de esta frontera de paso.
                log::warn!("dispatch failed at step `{key}`: {err}");
                let message = format!("step `{key}` failed: {err}");
                self.engine.notifier.notify(&message, Severity::Error);
                self.trace.append(RunEventKind::DispatchFailed { step_key: key.to_string(),
                                                                 message: err.to_string() });
                self.finish_terminated(NavigationSignal::Error, Some(message));
                Ok(Some(Chunk { step_key: key.to_string(),
                                result: Value::Null,
                                signal: Some(NavigationSignal::Error),
                                terminal: true }))
            }
            Ok(DispatchOutcome::Signal { signal, message }) => {
                self.trace.append(RunEventKind::SignalObserved { step_key: key.to_string(),
                                                                 signal });
                self.finish_terminated(signal, message);
                Ok(Some(Chunk { step_key: key.to_string(),
                                result: Value::Null,
                                signal: Some(signal),
                                terminal: true }))
            }
            Ok(DispatchOutcome::Jump(target)) => {
                let Some(next) = map.index_of(&target) else {
                    // Error de configuración: rollback de la transacción
                    // activa y propagación inmediata.
                    self.txn.rollback(&mut self.engine.transactions);
                    self.failed = true;
                    self.engine.last_trace = Some(self.trace.clone());
                    return Err(LooperError::UnknownJumpTarget { from: key.to_string(),
                                                                target });
                };
                self.trace.append(RunEventKind::JumpTaken { from_key: key.to_string(),
                                                            to_key: target });
                self.cursor = next;
                Ok(Some(Chunk { step_key: key.to_string(),
                                result: Value::Null,
                                signal: None,
                                terminal: false }))
            }
            Ok(DispatchOutcome::Redisplay) => {
                self.trace.append(RunEventKind::StepRedisplayed { step_index: self.cursor,
                                                                  step_key: key.to_string() });
                Ok(Some(Chunk { step_key: key.to_string(),
                                result: Value::Null,
                                signal: None,
                                terminal: false }))
            }
            Ok(DispatchOutcome::Value(value)) => {
                // (5) actualización del Hat y avance posicional
                let key = key.to_string();
                self.hat.set(key.clone(), value.clone());
                self.trace.append(RunEventKind::StepStored { step_index: self.cursor,
                                                             step_key: key.clone() });
                self.cursor += 1;
                let terminal = self.cursor == map.len();
                if terminal {
                    self.finish_completed();
                }
                Ok(Some(Chunk { step_key: key,
                                result: value,
                                signal: None,
                                terminal }))
            }
        }
    }

    /// Cierre por señal: transacción -> callback -> outcome, en ese orden.
    fn finish_terminated(&mut self, signal: NavigationSignal, message: Option<String>) {
        if signal.commits() {
            self.txn.commit(&mut self.engine.transactions);
        } else {
            self.txn.rollback(&mut self.engine.transactions);
        }
        let outcome = Outcome::Terminated { signal, message };
        self.engine.callbacks.fire(&outcome);
        self.trace.append(RunEventKind::RunFinished { outcome: signal.as_str().to_string() });
        self.engine.last_trace = Some(self.trace.clone());
        self.finished = Some(outcome);
    }

    /// Cierre normal: la secuencia se agotó sin señal terminal.
    fn finish_completed(&mut self) {
        self.txn.commit(&mut self.engine.transactions);
        let outcome = Outcome::Completed(self.hat.snapshot());
        // los callbacks son por señal; una finalización normal no dispara
        self.trace.append(RunEventKind::RunFinished { outcome: "completed".to_string() });
        self.engine.last_trace = Some(self.trace.clone());
        self.finished = Some(outcome);
    }
}

/// Aviso de denegación para la capa de presentación.
fn deny_message(decision: AccessDecision, step_key: Option<&str>) -> String {
    let what = match decision {
        AccessDecision::DeniedGuest => "authentication required",
        _ => "access denied",
    };
    match step_key {
        Some(key) => format!("{what} for step `{key}`"),
        None => what.to_string(),
    }
}
