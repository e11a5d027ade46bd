//! Mapa de pasos: la definición declarativa de un flujo o menú.
//!
//! Modelo interno con dos campos explícitos (`metadata`, `steps`) en lugar de
//! la convención heredada de claves con guion bajo; la compatibilidad con el
//! formato plano (`_access`, `_transaction` mezclados con los pasos) se
//! mantiene sólo en la frontera de deserialización.
//!
//! Invariantes:
//! - Las claves de metadata jamás se tratan como pasos ejecutables.
//! - El orden de inserción de los pasos ES el orden de ejecución por defecto.
//! - `definition_hash` se calcula al construir y no cambia después; dos mapas
//!   con los mismos pasos, el mismo orden y la misma metadata comparten hash.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::access::AccessRule;
use crate::constants::{ENGINE_VERSION, METADATA_PREFIX};
use crate::errors::LooperError;
use crate::hashing::hash_value;

/// Bloque de metadata del mapa.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapMetadata {
    /// Regla de acceso de nivel bloque (todo el flujo).
    #[serde(default)]
    pub access: Option<AccessRule>,
    /// Si el run entero debe correr dentro de una transacción.
    #[serde(default)]
    pub transaction: bool,
}

/// Un paso declarado. Opaco para el motor salvo su regla de acceso; los
/// parámetros viajan tal cual al dispatcher (tras interpolación).
#[derive(Debug, Clone, PartialEq)]
pub struct StepDefinition {
    /// Regla de acceso de nivel item.
    pub access: Option<AccessRule>,
    /// Parámetros del paso, árbol JSON neutro.
    pub params: Value,
}

impl StepDefinition {
    pub fn new(params: Value) -> Self {
        Self { access: None,
               params }
    }

    pub fn with_access(mut self, rule: AccessRule) -> Self {
        self.access = Some(rule);
        self
    }

    /// Frontera de deserialización de un paso.
    ///
    /// Acepta tres formas:
    /// - objeto estructurado `{"access": ..., "params": ...}`;
    /// - objeto plano heredado con `_access` embebido entre los parámetros;
    /// - cualquier otro valor, que es íntegramente los parámetros.
    fn from_wire(value: Value) -> Result<Self, LooperError> {
        match value {
            Value::Object(mut obj) => {
                let structured = obj.contains_key("params")
                                 && obj.keys().all(|k| k == "params" || k == "access");
                if structured {
                    let access = match obj.remove("access") {
                        None | Some(Value::Null) => None,
                        Some(v) => Some(parse_rule(v)?),
                    };
                    let params = obj.remove("params").unwrap_or(Value::Null);
                    return Ok(Self { access, params });
                }
                let access = match obj.remove("_access") {
                    None => None,
                    Some(v) => Some(parse_rule(v)?),
                };
                Ok(Self { access,
                          params: Value::Object(obj) })
            }
            other => Ok(Self::new(other)),
        }
    }

    /// Forma explícita para serializar de vuelta.
    fn to_wire(&self) -> Value {
        match &self.access {
            None => self.params.clone(),
            Some(rule) => {
                let mut obj = serde_json::Map::new();
                obj.insert("access".to_string(),
                           serde_json::to_value(rule).unwrap_or(Value::Null));
                obj.insert("params".to_string(), self.params.clone());
                Value::Object(obj)
            }
        }
    }
}

fn parse_rule(value: Value) -> Result<AccessRule, LooperError> {
    serde_json::from_value(value).map_err(|e| LooperError::MalformedStepMap(format!("invalid access rule: {e}")))
}

/// Definición inmutable de un flujo: metadata + pasos ordenados + hash.
#[derive(Debug, Clone, PartialEq)]
pub struct StepMap {
    metadata: MapMetadata,
    steps: IndexMap<String, StepDefinition>,
    definition_hash: String,
}

impl StepMap {
    pub fn new(metadata: MapMetadata, steps: IndexMap<String, StepDefinition>) -> Self {
        let definition_hash = compute_definition_hash(&metadata, &steps);
        Self { metadata,
               steps,
               definition_hash }
    }

    pub fn builder() -> StepMapBuilder {
        StepMapBuilder::default()
    }

    pub fn metadata(&self) -> &MapMetadata {
        &self.metadata
    }

    pub fn definition_hash(&self) -> &str {
        &self.definition_hash
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Claves de paso en orden de ejecución.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.steps.keys().map(|k| k.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&StepDefinition> {
        self.steps.get(key)
    }

    /// Posición de una clave (destinos de salto).
    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.steps.get_index_of(key)
    }

    /// Paso en la posición dada.
    pub fn at(&self, index: usize) -> Option<(&str, &StepDefinition)> {
        self.steps.get_index(index).map(|(k, v)| (k.as_str(), v))
    }

    /// Deserializa un mapa desde JSON. Acepta la forma explícita
    /// `{"metadata": ..., "steps": {...}}` y la forma plana heredada donde
    /// las claves `_access`/`_transaction` son metadata y el resto pasos.
    pub fn from_json_str(s: &str) -> Result<Self, LooperError> {
        let value: Value = serde_json::from_str(s).map_err(|e| LooperError::MalformedStepMap(e.to_string()))?;
        Self::from_json_value(value)
    }

    pub fn from_json_value(value: Value) -> Result<Self, LooperError> {
        let Value::Object(mut root) = value else {
            return Err(LooperError::MalformedStepMap("step map must be a JSON object".to_string()));
        };

        let explicit = matches!(root.get("steps"), Some(Value::Object(_)))
                       && root.keys().all(|k| k == "steps" || k == "metadata");
        if explicit {
            let metadata = match root.remove("metadata") {
                None => MapMetadata::default(),
                Some(v) => serde_json::from_value(v)
                    .map_err(|e| LooperError::MalformedStepMap(format!("invalid metadata: {e}")))?,
            };
            let Some(Value::Object(raw_steps)) = root.remove("steps") else {
                return Err(LooperError::MalformedStepMap("steps must be a JSON object".to_string()));
            };
            let mut steps = IndexMap::new();
            for (key, value) in raw_steps {
                steps.insert(key, StepDefinition::from_wire(value)?);
            }
            return Ok(Self::new(metadata, steps));
        }

        // Forma plana heredada: separar metadata de pasos por prefijo.
        let mut metadata = MapMetadata::default();
        let mut steps = IndexMap::new();
        for (key, value) in root {
            if !key.starts_with(METADATA_PREFIX) {
                steps.insert(key, StepDefinition::from_wire(value)?);
                continue;
            }
            match &key[1..] {
                "access" => metadata.access = Some(parse_rule(value)?),
                "transaction" => {
                    metadata.transaction = value.as_bool().ok_or_else(|| {
                        LooperError::MalformedStepMap("_transaction must be a boolean".to_string())
                    })?;
                }
                other => {
                    log::warn!("clave de metadata desconocida `_{other}` ignorada");
                }
            }
        }
        Ok(Self::new(metadata, steps))
    }

    /// Serializa a la forma explícita de dos campos.
    pub fn to_json_value(&self) -> Value {
        let mut steps = serde_json::Map::new();
        for (key, def) in &self.steps {
            steps.insert(key.clone(), def.to_wire());
        }
        let mut root = serde_json::Map::new();
        root.insert("metadata".to_string(),
                    serde_json::to_value(&self.metadata).unwrap_or(Value::Null));
        root.insert("steps".to_string(), Value::Object(steps));
        Value::Object(root)
    }
}

fn compute_definition_hash(metadata: &MapMetadata, steps: &IndexMap<String, StepDefinition>) -> String {
    let keys: Vec<&str> = steps.keys().map(|k| k.as_str()).collect();
    hash_value(&serde_json::json!({
                   "engine_version": ENGINE_VERSION,
                   "metadata": serde_json::to_value(metadata).unwrap_or(Value::Null),
                   "step_keys": keys,
               }))
}

/// Builder ergonómico para construir mapas en código (demos y tests).
#[derive(Debug, Default)]
pub struct StepMapBuilder {
    metadata: MapMetadata,
    steps: IndexMap<String, StepDefinition>,
}

impl StepMapBuilder {
    /// Regla de acceso de nivel bloque.
    pub fn access(mut self, rule: AccessRule) -> Self {
        self.metadata.access = Some(rule);
        self
    }

    /// Declara (o no) la transacción del run.
    pub fn transaction(mut self, transaction: bool) -> Self {
        self.metadata.transaction = transaction;
        self
    }

    /// Paso sin regla propia.
    pub fn step(mut self, key: impl Into<String>, params: Value) -> Self {
        self.steps.insert(key.into(), StepDefinition::new(params));
        self
    }

    /// Paso con regla de acceso de nivel item.
    pub fn guarded_step(mut self, key: impl Into<String>, params: Value, rule: AccessRule) -> Self {
        self.steps.insert(key.into(), StepDefinition::new(params).with_access(rule));
        self
    }

    pub fn build(self) -> StepMap {
        StepMap::new(self.metadata, self.steps)
    }
}
