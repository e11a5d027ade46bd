//! Canonicalización JSON mínima para hashing estable.
//!
//! El orden de claves de un objeto no debe afectar la identidad de un mapa de
//! pasos, así que las claves se serializan ordenadas. Los arrays conservan su
//! orden (es semántico).

use std::collections::BTreeMap;

use serde_json::Value;

pub fn to_canonical_json(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => serde_json::to_string(s).unwrap_or_default(),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(to_canonical_json).collect();
            format!("[{}]", parts.join(","))
        }
        Value::Object(map) => {
            let ordered: BTreeMap<&String, &Value> = map.iter().collect();
            let parts: Vec<String> = ordered.into_iter()
                                            .map(|(k, v)| {
                                                format!("{}:{}",
                                                        serde_json::to_string(k).unwrap_or_default(),
                                                        to_canonical_json(v))
                                            })
                                            .collect();
            format!("{{{}}}", parts.join(","))
        }
    }
}
