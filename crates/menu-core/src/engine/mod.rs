//! Engine module: orquestador, builder, contexto y modo chunked.

pub mod builder;
pub mod chunked;
pub mod context;
pub mod core;

pub use builder::EngineBuilder;
pub use chunked::{Chunk, ChunkedRun};
pub use context::RunContext;
pub use core::LoopEngine;
