use thiserror::Error;

use crate::codegen::CodegenError;
use crate::config::ConfigError;

/// Errors raised while setting up an engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to compile builtins: {0}")]
    Codegen(#[from] CodegenError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
