//! CLI-level errors

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    /// No `--config-dir` and the platform has no config directory
    #[error("No configuration directory available; pass --config-dir")]
    NoConfigDir,

    /// Path argument that cannot be used as a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Service reachable but not healthy, or unreachable
    #[error("Analysis service is not available: {0}")]
    ServiceUnavailable(String),
}
