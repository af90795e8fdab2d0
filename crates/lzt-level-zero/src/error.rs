//! Level-Zero error codes mapped to Rust error types.

use crate::ffi::ZeResult;

/// Errors from Level-Zero queries.
#[derive(Debug, thiserror::Error)]
pub enum LevelZeroError {
    /// Level-Zero loader library not found.
    #[error("Level-Zero runtime not found: {0}")]
    RuntimeNotFound(String),

    /// The loader was found but lacks an entry point.
    #[error("Level-Zero loader is missing symbol `{name}`: {reason}")]
    SymbolNotFound { name: String, reason: String },

    /// A Level-Zero API call returned an error.
    #[error("{call} failed: {result}")]
    ApiError { call: &'static str, result: ZeResult },

    /// A handle this backend never issued.
    #[error("invalid {kind} handle 0x{raw:x}")]
    InvalidHandle { kind: &'static str, raw: usize },

    /// A fake topology description could not be parsed.
    #[error("invalid device topology: {0}")]
    TopologyParse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LevelZeroError {
    /// The driver result code, when this error came from an API call.
    pub fn result(&self) -> Option<ZeResult> {
        match self {
            Self::ApiError { result, .. } => Some(*result),
            _ => None,
        }
    }
}

/// Convenience result type for Level-Zero operations.
pub type Result<T> = std::result::Result<T, LevelZeroError>;

/// Check a `ze_result_t` and convert to `Result<()>`.
pub fn check(call: &'static str, result: ZeResult) -> Result<()> {
    if result.is_success() { Ok(()) } else { Err(LevelZeroError::ApiError { call, result }) }
}
