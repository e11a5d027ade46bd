//! Traza de ejecución de un run.
//!
//! Rol en el flujo:
//! - El orquestador registra cada hito del run (inicio, gates, dispatches,
//!   saltos, señal terminal) en una traza append-only con `seq` y `ts`.
//! - La traza es observabilidad en proceso, no almacenamiento: vive en el
//!   engine hasta el siguiente run y se descarta con él. El motor no
//!   persiste nada.
//! - `variants()` da la vista compacta que usan los tests para afirmar
//!   secuencias de visita sin comparar payloads completos.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::AccessDecision;
use crate::signal::NavigationSignal;

/// Hitos observables de un run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RunEventKind {
    /// Primer evento de todo run: fija la identidad del mapa y su tamaño.
    RunStarted { definition_hash: String, step_count: usize },
    /// El gate de bloque denegó; el run termina con `Back` sin ejecutar nada.
    BlockDenied { decision: AccessDecision },
    /// El gate de item denegó; el dispatcher nunca se invoca para ese paso.
    StepDenied { step_key: String, decision: AccessDecision },
    /// El paso se entregó al dispatcher (params ya interpolados).
    StepDispatched { step_index: usize, step_key: String },
    /// El resultado del paso quedó guardado en el Hat.
    StepStored { step_index: usize, step_key: String },
    /// El paso pidió volver a mostrarse; la próxima visita repite la clave.
    StepRedisplayed { step_index: usize, step_key: String },
    /// Directiva de salto tomada.
    JumpTaken { from_key: String, to_key: String },
    /// El paso devolvió una señal de navegación.
    SignalObserved { step_key: String, signal: NavigationSignal },
    /// El dispatch falló; se convierte en `Error` sin re-lanzar.
    DispatchFailed { step_key: String, message: String },
    /// Cierre del run con su outcome ("completed" o el nombre de la señal).
    RunFinished { outcome: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEvent {
    pub seq: u64, // orden de append dentro del run
    pub run_id: Uuid,
    pub kind: RunEventKind,
    pub ts: DateTime<Utc>, // metadato, no participa en ninguna identidad
}

/// Traza append-only de UN run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunTrace {
    run_id: Uuid,
    events: Vec<RunEvent>,
}

impl RunTrace {
    pub fn new(run_id: Uuid) -> Self {
        Self { run_id,
               events: Vec::new() }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn append(&mut self, kind: RunEventKind) {
        let seq = self.events.len() as u64;
        self.events.push(RunEvent { seq,
                                    run_id: self.run_id,
                                    kind,
                                    ts: Utc::now() });
    }

    pub fn events(&self) -> &[RunEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Vista compacta de la secuencia, una letra por evento.
    pub fn variants(&self) -> Vec<&'static str> {
        self.events.iter()
                   .map(|e| match e.kind {
                       RunEventKind::RunStarted { .. } => "I",
                       RunEventKind::BlockDenied { .. } => "B",
                       RunEventKind::StepDenied { .. } => "D",
                       RunEventKind::StepDispatched { .. } => "S",
                       RunEventKind::StepStored { .. } => "F",
                       RunEventKind::StepRedisplayed { .. } => "L",
                       RunEventKind::JumpTaken { .. } => "J",
                       RunEventKind::SignalObserved { .. } => "G",
                       RunEventKind::DispatchFailed { .. } => "X",
                       RunEventKind::RunFinished { .. } => "C",
                   })
                   .collect()
    }

    /// Claves de paso despachadas, en orden de visita. Base de la propiedad
    /// de determinismo entre los dos modos de ejecución.
    pub fn dispatched_keys(&self) -> Vec<&str> {
        self.events.iter()
                   .filter_map(|e| match &e.kind {
                       RunEventKind::StepDispatched { step_key, .. } => Some(step_key.as_str()),
                       _ => None,
                   })
                   .collect()
    }
}
