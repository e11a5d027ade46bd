//! Canal de notificaciones hacia la capa de presentación.
//!
//! Fire-and-forget: el motor emite avisos (denegaciones de acceso, fallos de
//! dispatch) y no espera respuesta ni confirma entrega. El render concreto es
//! problema del host.

/// Severidad de un aviso.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Colaborador externo de display. Inyectado por el host.
pub trait NotificationChannel {
    fn notify(&mut self, message: &str, severity: Severity);
}

/// Canal que descarta todo. El default del engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl NotificationChannel for NullNotifier {
    fn notify(&mut self, _message: &str, _severity: Severity) {}
}

/// Canal en memoria que acumula los avisos, para tests y para hosts que
/// difieren el render.
#[derive(Debug, Clone, Default)]
pub struct BufferNotifier {
    pub messages: Vec<(String, Severity)>,
}

impl BufferNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, fragment: &str) -> bool {
        self.messages.iter().any(|(m, _)| m.contains(fragment))
    }
}

impl NotificationChannel for BufferNotifier {
    fn notify(&mut self, message: &str, severity: Severity) {
        self.messages.push((message.to_string(), severity));
    }
}
