//! Enrutamiento de pasos a handlers por `kind`.
//!
//! El discriminador vive en los parámetros del paso (`"kind": "menu" |
//! "query" | "call" | ...`); el motor nunca lo interpreta. Un paso sin
//! `kind`, o con un `kind` sin handler registrado, es un fallo de dispatch:
//! el motor lo recupera en la frontera del paso y termina el run con
//! `Error`.

use indexmap::IndexMap;
use menu_core::{DispatchError, DispatchOutcome, Dispatcher};
use serde_json::Value;

/// Un handler concreto para una familia de pasos.
pub trait StepHandler {
    fn handle(&mut self, step_key: &str, params: &Value) -> Result<DispatchOutcome, DispatchError>;
}

/// Dispatcher estándar: tabla `kind -> handler`.
#[derive(Default)]
pub struct RoutingDispatcher {
    handlers: IndexMap<String, Box<dyn StepHandler>>,
}

impl RoutingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra (o reemplaza) el handler de un `kind`.
    pub fn register(&mut self, kind: impl Into<String>, handler: Box<dyn StepHandler>) {
        self.handlers.insert(kind.into(), handler);
    }

    /// Variante encadenable de `register`.
    pub fn with_handler(mut self, kind: impl Into<String>, handler: Box<dyn StepHandler>) -> Self {
        self.register(kind, handler);
        self
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(|k| k.as_str())
    }
}

impl Dispatcher for RoutingDispatcher {
    fn dispatch(&mut self, step_key: &str, params: &Value) -> Result<DispatchOutcome, DispatchError> {
        let kind = params.get("kind")
                         .and_then(Value::as_str)
                         .ok_or_else(|| DispatchError::new(format!("step `{step_key}` declares no `kind`")))?
                         .to_string();
        log::debug!("routing step `{step_key}` to kind `{kind}`");
        match self.handlers.get_mut(&kind) {
            Some(handler) => handler.handle(step_key, params),
            None => Err(DispatchError::new(format!("no handler registered for kind `{kind}`"))),
        }
    }
}
