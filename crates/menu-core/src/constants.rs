//! Constantes del motor core.
//!
//! Valores estáticos que participan en el cálculo del `definition_hash` y en
//! la compatibilidad entre versiones del motor. Cambiar `ENGINE_VERSION`
//! invalida los hashes de definiciones aunque el mapa de pasos no cambie.

/// Versión lógica del motor. Se incluye en el input del hash de definición
/// para que un cambio incompatible del engine se refleje determinísticamente
/// en la identidad de los mapas. Mantener estable mientras no haya cambios
/// incompatibles.
pub const ENGINE_VERSION: &str = "M1.0";

/// Prefijo que distingue claves de metadata de claves de paso en el formato
/// plano heredado (`_access`, `_transaction`). Sólo se interpreta en la
/// frontera de deserialización; el modelo interno separa metadata y pasos en
/// campos explícitos.
pub const METADATA_PREFIX: char = '_';
