//! menu-adapters: colaboradores concretos para el motor de pasos.
//!
//! El core sólo conoce el seam `Dispatcher`; este crate aporta el enrutador
//! estándar (`RoutingDispatcher`) y los tres handlers que cubren los casos
//! del sistema: render de menú, consulta de datos y llamada a función. Un
//! host puede mezclar estos handlers con los suyos propios.

pub mod handlers;
pub mod routing;

pub use handlers::{DataQueryHandler, FunctionCallHandler, MenuRenderHandler};
pub use routing::{RoutingDispatcher, StepHandler};
