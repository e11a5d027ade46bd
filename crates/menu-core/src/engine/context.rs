//! Contexto de un run.

use uuid::Uuid;

use crate::access::Principal;

/// Identidad y principal de UNA ejecución. Las entradas públicas lo toman
/// por valor: la propiedad exclusiva por run la garantiza el sistema de
/// tipos, no la documentación. Para aislar usuarios concurrentes el host
/// construye un `RunContext` (y un mapa) fresco por sesión; nunca comparte
/// estado del engine.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: Uuid,
    pub principal: Principal,
}

impl RunContext {
    pub fn new(principal: Principal) -> Self {
        Self { run_id: Uuid::new_v4(),
               principal }
    }

    /// Variante con id fijado por el llamador (replays, correlación externa).
    pub fn with_run_id(run_id: Uuid, principal: Principal) -> Self {
        Self { run_id, principal }
    }
}
