//! Behavior engine errors

use thiserror::Error;

/// Behavior engine result
pub type ScriptResult<T> = Result<T, ScriptError>;

/// Everything that can go wrong between receiving a script identifier and
/// committing its updates. `BehaviorEngine::invoke` catches all of these;
/// none escape to the simulation loop.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("script not found: {0}")]
    NotFound(String),

    #[error("script `{id}` failed to compile: {message}")]
    Compile { id: String, message: String },

    #[error("script `{id}` failed at runtime: {message}")]
    Runtime { id: String, message: String },

    #[error("script value is not a key/value mapping: {0}")]
    Normalization(String),

    #[error("script source unreadable: {0}")]
    Io(#[from] std::io::Error),
}

impl ScriptError {
    /// Stable kind label carried in failure diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            ScriptError::NotFound(_) => "not-found",
            ScriptError::Compile { .. } => "compile",
            ScriptError::Runtime { .. } => "runtime",
            ScriptError::Normalization(_) => "normalization",
            ScriptError::Io(_) => "io",
        }
    }
}
