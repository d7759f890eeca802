pub mod engine;
pub mod error;
pub mod process;
pub mod registry;
pub mod workspace;

pub use engine::{ExecutionEngine, Limits, LocalEngine};
pub use error::{EngineError, EngineResult};
pub use registry::{LanguageProfile, Registry, BUILTIN_PROFILES};
pub use workspace::Workspace;
