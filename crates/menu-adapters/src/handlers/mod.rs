//! Handlers estándar: menú, consulta y llamada a función.

pub mod call;
pub mod menu;
pub mod query;

pub use call::FunctionCallHandler;
pub use menu::MenuRenderHandler;
pub use query::DataQueryHandler;
