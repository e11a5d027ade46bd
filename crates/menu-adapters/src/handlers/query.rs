//! Consulta de datos en memoria.
//!
//! Backend de referencia para pasos `kind: "query"`: datasets registrados
//! por nombre, filtro de igualdad opcional y límite. Un host con almacén
//! real implementa su propio `StepHandler` con esta misma forma de
//! parámetros.

use indexmap::IndexMap;
use menu_core::{DispatchError, DispatchOutcome};
use serde_json::Value;

use crate::routing::StepHandler;

/// Parámetros reconocidos: `source` (obligatorio), `filter: {field, equals}`
/// y `limit`.
#[derive(Default)]
pub struct DataQueryHandler {
    datasets: IndexMap<String, Vec<Value>>,
}

impl DataQueryHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dataset(mut self, name: impl Into<String>, rows: Vec<Value>) -> Self {
        self.datasets.insert(name.into(), rows);
        self
    }
}

impl StepHandler for DataQueryHandler {
    fn handle(&mut self, step_key: &str, params: &Value) -> Result<DispatchOutcome, DispatchError> {
        let source = params.get("source")
                           .and_then(Value::as_str)
                           .ok_or_else(|| DispatchError::new(format!("query `{step_key}`: missing `source`")))?;
        let rows = self.datasets
                       .get(source)
                       .ok_or_else(|| DispatchError::new(format!("query `{step_key}`: unknown source `{source}`")))?;

        let mut selected: Vec<Value> = match params.get("filter") {
            Some(filter) => {
                let field = filter.get("field")
                                  .and_then(Value::as_str)
                                  .ok_or_else(|| DispatchError::new(format!("query `{step_key}`: filter without `field`")))?;
                let wanted = filter.get("equals").cloned().unwrap_or(Value::Null);
                rows.iter()
                    .filter(|row| row.get(field) == Some(&wanted))
                    .cloned()
                    .collect()
            }
            None => rows.clone(),
        };

        if let Some(limit) = params.get("limit").and_then(Value::as_u64) {
            selected.truncate(limit as usize);
        }
        Ok(DispatchOutcome::value(Value::Array(selected)))
    }
}
