//! Harness error types.

use crate::outcome::Failure;
use crate::sku::SkuError;
use lzt_level_zero::LevelZeroError;
use std::path::PathBuf;

/// Why a case stopped before running to completion.
#[derive(Debug, thiserror::Error)]
pub enum CaseError {
    /// A hard check failed; the rest of the case was not run.
    #[error("hard check failed: {0}")]
    Abort(Failure),

    #[error(transparent)]
    Api(#[from] LevelZeroError),

    #[error(transparent)]
    Sku(#[from] SkuError),

    /// The system cannot exercise this case.
    #[error("skipped: {0}")]
    Skip(String),
}

/// Errors loading or validating [`HarnessConfig`](crate::config::HarnessConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },

    #[error("failed to parse configuration: {0}")]
    Parse(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors outside any single case: opening a backend, building an inventory.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error(transparent)]
    Api(#[from] LevelZeroError),

    #[error(transparent)]
    Sku(#[from] SkuError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
