//!
//! velac - builtin fast paths for the vela runtime
//!
//! Generates the string case and list formatting builtins with Cranelift and
//! provides the runtime fallback table they call into.
//!

pub mod codegen;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod runtime;

pub use codegen::{Builtin, CodegenError};
pub use config::{ConfigError, VelaConfig};
pub use context::{Context, RuntimeStats};
pub use engine::{read_parts, read_string, Engine};
pub use error::EngineError;
pub use runtime::RuntimeFunctionId;
