//! Dispatcher seam.
//!
//! The engine never reflects into arbitrary callables: the host implements
//! and injects a `Dispatcher`, and the orchestrator only interprets the
//! classified result shapes below. Routing a step to a menu render, a data
//! query or a function call is entirely the dispatcher's business.

use serde_json::Value;
use thiserror::Error;

use crate::signal::NavigationSignal;

/// Resultado clasificado de despachar un paso.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Valor plano: se guarda en el Hat bajo la clave del paso y el run
    /// avanza posicionalmente.
    Value(Value),
    /// Señal de navegación: termina el run tal cual, sin reclasificación.
    Signal {
        signal: NavigationSignal,
        message: Option<String>,
    },
    /// Directiva de salto: la próxima iteración corre la clave nombrada.
    Jump(String),
    /// El paso pide volver a mostrarse (bucle de menú).
    Redisplay,
}

impl DispatchOutcome {
    pub fn value(v: Value) -> Self {
        DispatchOutcome::Value(v)
    }

    pub fn signal(signal: NavigationSignal) -> Self {
        DispatchOutcome::Signal { signal, message: None }
    }

    pub fn signal_with_message(signal: NavigationSignal, message: impl Into<String>) -> Self {
        DispatchOutcome::Signal { signal,
                                  message: Some(message.into()) }
    }

    pub fn jump(target: impl Into<String>) -> Self {
        DispatchOutcome::Jump(target.into())
    }
}

/// Fallo de un dispatch. Se captura en la frontera del paso: el orquestador
/// lo loguea con contexto, revierte la transacción activa y termina el run
/// con `NavigationSignal::Error`. Nunca se propaga más allá de un paso.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct DispatchError {
    pub message: String,
}

impl DispatchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Unidad de trabajo inyectada. Recibe la clave del paso y sus parámetros ya
/// interpolados.
pub trait Dispatcher {
    fn dispatch(&mut self, step_key: &str, params: &Value) -> Result<DispatchOutcome, DispatchError>;
}

/// Dispatcher a partir de una clausura; el atajo ergonómico para demos y
/// tests.
pub struct FnDispatcher<F>
    where F: FnMut(&str, &Value) -> Result<DispatchOutcome, DispatchError>
{
    f: F,
}

impl<F> FnDispatcher<F>
    where F: FnMut(&str, &Value) -> Result<DispatchOutcome, DispatchError>
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Dispatcher for FnDispatcher<F>
    where F: FnMut(&str, &Value) -> Result<DispatchOutcome, DispatchError>
{
    fn dispatch(&mut self, step_key: &str, params: &Value) -> Result<DispatchOutcome, DispatchError> {
        (self.f)(step_key, params)
    }
}
