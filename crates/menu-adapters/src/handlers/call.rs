//! Llamada a función registrada.
//!
//! El registro es explícito: el host inscribe cada función por nombre y el
//! handler sólo busca en la tabla; nunca se reflexiona sobre callables
//! arbitrarios. Una función puede devolver cualquier forma clasificada
//! (valor, señal, salto, redisplay), así que este handler es también el
//! punto natural para cablear navegación decidida por el host.

use indexmap::IndexMap;
use menu_core::{DispatchError, DispatchOutcome};
use serde_json::Value;

use crate::routing::StepHandler;

type RegisteredFn = Box<dyn FnMut(&Value) -> Result<DispatchOutcome, DispatchError>>;

/// Parámetros reconocidos: `function` (obligatorio) y `args` (árbol libre,
/// ya interpolado por el motor).
#[derive(Default)]
pub struct FunctionCallHandler {
    registry: IndexMap<String, RegisteredFn>,
}

impl FunctionCallHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_function<F>(mut self, name: impl Into<String>, f: F) -> Self
        where F: FnMut(&Value) -> Result<DispatchOutcome, DispatchError> + 'static
    {
        self.registry.insert(name.into(), Box::new(f));
        self
    }
}

impl StepHandler for FunctionCallHandler {
    fn handle(&mut self, step_key: &str, params: &Value) -> Result<DispatchOutcome, DispatchError> {
        let name = params.get("function")
                         .and_then(Value::as_str)
                         .ok_or_else(|| DispatchError::new(format!("call `{step_key}`: missing `function`")))?
                         .to_string();
        let args = params.get("args").cloned().unwrap_or(Value::Null);
        match self.registry.get_mut(&name) {
            Some(f) => f(&args),
            None => Err(DispatchError::new(format!("call `{step_key}`: unknown function `{name}`"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use menu_core::NavigationSignal;
    use serde_json::json;

    use super::*;

    #[test]
    fn invokes_registered_function_with_args() {
        let mut h = FunctionCallHandler::new().with_function("doblar", |args: &Value| {
            let n = args.get("n").and_then(Value::as_i64).unwrap_or(0);
            Ok(DispatchOutcome::value(json!(n * 2)))
        });
        let out = h.handle("c", &json!({"kind": "call", "function": "doblar", "args": {"n": 21}}))
                   .expect("handle");
        assert_eq!(out, DispatchOutcome::Value(json!(42)));
    }

    #[test]
    fn functions_can_steer_navigation() {
        let mut h = FunctionCallHandler::new().with_function("salir", |_args: &Value| {
            Ok(DispatchOutcome::signal(NavigationSignal::Exit))
        });
        let out = h.handle("c", &json!({"kind": "call", "function": "salir"})).expect("handle");
        assert_eq!(out, DispatchOutcome::signal(NavigationSignal::Exit));
    }

    #[test]
    fn unknown_function_is_a_dispatch_error() {
        let mut h = FunctionCallHandler::new();
        assert!(h.handle("c", &json!({"kind": "call", "function": "nope"})).is_err());
        assert!(h.handle("c", &json!({"kind": "call"})).is_err());
    }
}
