//! Errores de configuración del core.
//!
//! Sólo los errores fatales de configuración viven aquí: un mapa malformado,
//! un salto a una clave inexistente, una transacción declarada que el
//! proveedor no puede abrir. Los fallos de dispatch NO son errores del motor:
//! se recuperan en la frontera del paso y terminan el run con
//! `NavigationSignal::Error`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum LooperError {
    #[error("malformed step map: {0}")] MalformedStepMap(String),
    #[error("unknown jump target `{target}` from step `{from}`")] UnknownJumpTarget { from: String, target: String },
    #[error("transaction declared but could not begin: {0}")] TransactionBegin(String),
    #[error("internal: {0}")] Internal(String),
}
