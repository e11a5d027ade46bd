//! Access gate: reglas declarativas evaluadas contra el principal.
//!
//! Rol en el flujo:
//! - `check_block` corre una sola vez por run, sobre la regla del mapa.
//! - `check_item` corre por paso, sobre la regla del paso, siempre ANTES de
//!   invocar el dispatcher.
//! - Una denegación no es un error duro: el orquestador emite un aviso por el
//!   canal de notificación y termina el run con `Back`.
//! - La decisión se recalcula fresca en cada chequeo; nunca se cachea entre
//!   runs.

use serde::{Deserialize, Serialize};

use crate::stepmap::{StepDefinition, StepMap};

/// Regla de acceso declarada en el mapa (nivel bloque) o en un paso (nivel
/// item). Todos los campos son opcionales; una regla vacía concede siempre.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRule {
    /// Exige un principal autenticado aunque no pida rol ni permiso.
    #[serde(default)]
    pub require_auth: bool,
    /// Rol requerido.
    #[serde(default)]
    pub role: Option<String>,
    /// Permiso requerido.
    #[serde(default)]
    pub permission: Option<String>,
}

impl AccessRule {
    /// La regla exige alguna identidad (no basta un invitado).
    pub fn needs_identity(&self) -> bool {
        self.require_auth || self.role.is_some() || self.permission.is_some()
    }
}

/// Decisión de un chequeo de acceso.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessDecision {
    Granted,
    /// El principal está identificado pero no cumple la regla.
    Denied,
    /// El principal es invitado y la regla exige identidad; la capa de
    /// presentación puede ofrecer login en lugar de un rechazo plano.
    DeniedGuest,
}

impl AccessDecision {
    pub fn is_granted(&self) -> bool {
        matches!(self, AccessDecision::Granted)
    }
}

/// Identidad bajo la cual corre un run. Propiedad exclusiva del run (viaja
/// dentro del `RunContext`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: String,
    pub authenticated: bool,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
}

impl Principal {
    /// Invitado sin identidad verificada.
    pub fn guest(id: impl Into<String>) -> Self {
        Self { id: id.into(),
               authenticated: false,
               roles: Vec::new(),
               permissions: Vec::new() }
    }

    /// Usuario autenticado sin roles ni permisos todavía.
    pub fn user(id: impl Into<String>) -> Self {
        Self { id: id.into(),
               authenticated: true,
               roles: Vec::new(),
               permissions: Vec::new() }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.push(permission.into());
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

/// Proveedor de decisiones de acceso, inyectado por el host.
pub trait AccessProvider {
    fn check(&self, principal: &Principal, rule: &AccessRule) -> AccessDecision;
}

/// Evaluación estándar de autenticación/rol/permiso, sin estado.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticAccessProvider;

impl AccessProvider for StaticAccessProvider {
    fn check(&self, principal: &Principal, rule: &AccessRule) -> AccessDecision {
        if rule.needs_identity() && !principal.authenticated {
            return AccessDecision::DeniedGuest;
        }
        if let Some(role) = &rule.role {
            if !principal.has_role(role) {
                return AccessDecision::Denied;
            }
        }
        if let Some(permission) = &rule.permission {
            if !principal.has_permission(permission) {
                return AccessDecision::Denied;
            }
        }
        AccessDecision::Granted
    }
}

/// Chequeo de nivel bloque (una vez por run). Sin regla declarada, concede.
pub fn check_block<A>(provider: &A, map: &StepMap, principal: &Principal) -> AccessDecision
    where A: AccessProvider + ?Sized
{
    match &map.metadata().access {
        Some(rule) => provider.check(principal, rule),
        None => AccessDecision::Granted,
    }
}

/// Chequeo de nivel item (una vez por visita de paso).
pub fn check_item<A>(provider: &A, step: &StepDefinition, principal: &Principal) -> AccessDecision
    where A: AccessProvider + ?Sized
{
    match &step.access {
        Some(rule) => provider.check(principal, rule),
        None => AccessDecision::Granted,
    }
}
