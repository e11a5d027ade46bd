//! Señales de navegación y resultado terminal de un run.
//!
//! Rol en el flujo:
//! - Un paso puede devolver una `NavigationSignal` en lugar de un valor; el
//!   run termina inmediatamente con esa señal, sin reclasificarla jamás.
//! - `Outcome` es el contrato observable de las dos entradas públicas:
//!   `Completed` con el snapshot final del Hat, o `Terminated` con la señal
//!   (más un mensaje opcional para la capa de presentación).
//! - Las señales son un conjunto cerrado (variantes etiquetadas, no strings
//!   centinela) para tener chequeo exhaustivo en compilación.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::hat::Hat;

/// Conjunto cerrado de señales de navegación.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NavigationSignal {
    /// Volver al nivel anterior (también el resultado de una denegación de
    /// acceso).
    Back,
    /// Salir del flujo completo.
    Exit,
    /// Detener la ejecución de forma ordenada.
    Stop,
    /// Fallo de un paso, ya convertido por el motor (nunca se re-lanza).
    Error,
    /// Resultado vacío; navegación sin contenido.
    Empty,
}

impl NavigationSignal {
    /// Nombre estable para logging y trazas.
    pub fn as_str(&self) -> &'static str {
        match self {
            NavigationSignal::Back => "back",
            NavigationSignal::Exit => "exit",
            NavigationSignal::Stop => "stop",
            NavigationSignal::Error => "error",
            NavigationSignal::Empty => "empty",
        }
    }

    /// Política de resolución de transacción al terminar con esta señal.
    ///
    /// `Stop` confirma; `Back`/`Exit`/`Empty` confirman por defecto (los pasos
    /// ya ejecutados pueden tener efectos secundarios propios que quedarían
    /// desincronizados con un rollback silencioso); sólo `Error` revierte.
    pub fn commits(&self) -> bool {
        !matches!(self, NavigationSignal::Error)
    }
}

impl std::fmt::Display for NavigationSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resultado terminal de un run.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// La secuencia llegó al final sin señal terminal; lleva el snapshot del
    /// Hat con el último resultado de cada paso.
    Completed(Hat),
    /// El run terminó anticipadamente por una señal de navegación.
    Terminated {
        signal: NavigationSignal,
        message: Option<String>,
    },
}

impl Outcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed(_))
    }

    /// Señal terminal, si la hubo.
    pub fn signal(&self) -> Option<NavigationSignal> {
        match self {
            Outcome::Completed(_) => None,
            Outcome::Terminated { signal, .. } => Some(*signal),
        }
    }

    /// Mensaje asociado a la terminación (aviso de acceso, error de dispatch).
    pub fn message(&self) -> Option<&str> {
        match self {
            Outcome::Completed(_) => None,
            Outcome::Terminated { message, .. } => message.as_deref(),
        }
    }

    /// Snapshot final del Hat cuando el run completó.
    pub fn hat(&self) -> Option<&Hat> {
        match self {
            Outcome::Completed(hat) => Some(hat),
            Outcome::Terminated { .. } => None,
        }
    }
}

/// Callback opcional por señal. Se dispara exactamente una vez al terminar,
/// después de resolver la transacción y antes de devolver el outcome (o de
/// marcar terminal el último chunk).
pub type SignalCallback = Box<dyn FnMut(&Outcome)>;

/// Registro de callbacks por variante de señal. A lo sumo uno por variante;
/// registrar de nuevo reemplaza el anterior.
#[derive(Default)]
pub struct SignalCallbacks {
    slots: HashMap<NavigationSignal, SignalCallback>,
}

impl SignalCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, signal: NavigationSignal, callback: SignalCallback) {
        self.slots.insert(signal, callback);
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Dispara el callback registrado para la señal del outcome, si existe.
    /// Una finalización normal (`Completed`) no dispara ninguno.
    pub(crate) fn fire(&mut self, outcome: &Outcome) {
        if let Some(signal) = outcome.signal() {
            if let Some(cb) = self.slots.get_mut(&signal) {
                cb(outcome);
            }
        }
    }
}
