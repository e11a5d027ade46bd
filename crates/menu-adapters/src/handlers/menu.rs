//! Render de menú.
//!
//! Produce una representación neutra del menú (título, líneas numeradas,
//! prompt) como `Value`; pintar pantalla es problema del front. La elección
//! del usuario NO pasa por aquí: el host la resuelve fuera y decide con ella
//! (señal, salto o valor) en su propio handler.

use menu_core::{DispatchError, DispatchOutcome};
use serde_json::{json, Value};

use crate::routing::StepHandler;

/// Parámetros reconocidos: `title`, `prompt` y `items` (array de strings o
/// de objetos `{key, label}`).
#[derive(Debug, Clone, Copy, Default)]
pub struct MenuRenderHandler;

impl MenuRenderHandler {
    pub fn new() -> Self {
        Self
    }
}

impl StepHandler for MenuRenderHandler {
    fn handle(&mut self, step_key: &str, params: &Value) -> Result<DispatchOutcome, DispatchError> {
        let title = params.get("title").and_then(Value::as_str).unwrap_or(step_key);
        let prompt = params.get("prompt").and_then(Value::as_str).unwrap_or("> ");

        let mut lines: Vec<String> = Vec::new();
        if let Some(items) = params.get("items").and_then(Value::as_array) {
            for (i, item) in items.iter().enumerate() {
                let label = match item {
                    Value::String(s) => s.as_str(),
                    Value::Object(obj) => obj.get("label")
                                             .and_then(Value::as_str)
                                             .unwrap_or_default(),
                    _ => {
                        return Err(DispatchError::new(format!(
                            "menu `{step_key}`: item {i} must be a string or an object"
                        )));
                    }
                };
                lines.push(format!("{}) {}", i + 1, label));
            }
        }

        Ok(DispatchOutcome::value(json!({
                                      "title": title,
                                      "lines": lines,
                                      "prompt": prompt,
                                  })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_numbered_lines() {
        let mut handler = MenuRenderHandler::new();
        let out = handler.handle("inicio",
                                 &json!({
                                     "kind": "menu",
                                     "title": "Inicio",
                                     "items": ["Ventas", {"key": "x", "label": "Salir"}]
                                 }))
                         .expect("handle");
        let DispatchOutcome::Value(v) = out else { panic!("expected value") };
        assert_eq!(v["title"], json!("Inicio"));
        assert_eq!(v["lines"], json!(["1) Ventas", "2) Salir"]));
    }

    #[test]
    fn missing_items_render_an_empty_menu() {
        let mut handler = MenuRenderHandler::new();
        let out = handler.handle("inicio", &json!({"kind": "menu"})).expect("handle");
        let DispatchOutcome::Value(v) = out else { panic!("expected value") };
        assert_eq!(v["lines"], json!([]));
        assert_eq!(v["title"], json!("inicio"));
    }

    #[test]
    fn malformed_item_is_a_dispatch_error() {
        let mut handler = MenuRenderHandler::new();
        assert!(handler.handle("inicio", &json!({"kind": "menu", "items": [7]})).is_err());
    }
}
