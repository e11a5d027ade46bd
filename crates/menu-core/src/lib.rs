//! menu-core: motor de ejecución por pasos ("el looper").
//!
//! Interpreta un mapa declarativo y ordenado de pasos con nombre: gate de
//! acceso, interpolación de parámetros contra el Hat, dispatch inyectado,
//! clasificación del resultado (valor plano, señal de navegación, salto,
//! redisplay) y frontera de transacción opcional para todo el run. Dos
//! entradas públicas sobre el mismo orquestador: `run` (síncrona, hasta
//! completar) y `run_chunked` (progresiva, un chunk por paso, dirigida por
//! pull). El motor no posee almacenamiento propio y no hace I/O de red.

pub mod access;
pub mod constants;
pub mod dispatch;
pub mod engine;
pub mod errors;
pub mod hashing;
pub mod hat;
pub mod interp;
pub mod notify;
pub mod signal;
pub mod stepmap;
pub mod trace;
pub mod txn;

pub use access::{AccessDecision, AccessProvider, AccessRule, Principal, StaticAccessProvider};
pub use dispatch::{DispatchError, DispatchOutcome, Dispatcher, FnDispatcher};
pub use engine::{Chunk, ChunkedRun, EngineBuilder, LoopEngine, RunContext};
pub use errors::LooperError;
pub use hat::Hat;
pub use interp::{interpolate, MISSING_FALLBACK};
pub use notify::{BufferNotifier, NotificationChannel, NullNotifier, Severity};
pub use signal::{NavigationSignal, Outcome, SignalCallbacks};
pub use stepmap::{MapMetadata, StepDefinition, StepMap, StepMapBuilder};
pub use trace::{RunEvent, RunEventKind, RunTrace};
pub use txn::{BeginRefused, InMemoryTransactionProvider, NoTransactions, TransactionHandle,
              TransactionManager, TransactionProvider};
