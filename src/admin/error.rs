use std::path::{Path, PathBuf};

use crate::types::FtError;
use thiserror::Error;

/// Error type for administrative operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Tree image not found at the specified path.
    #[error("tree image not found: {0}")]
    MissingImage(PathBuf),
    /// Core tree or verifier error.
    #[error(transparent)]
    Core(#[from] FtError),
    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Tree image could not be decoded.
    #[error("invalid tree image: {0}")]
    Image(#[from] serde_json::Error),
}

/// Result type alias for administrative operations.
pub type Result<T> = std::result::Result<T, AdminError>;

impl AdminError {
    pub(crate) fn missing_image(path: impl AsRef<Path>) -> Self {
        AdminError::MissingImage(path.as_ref().to_path_buf())
    }

    /// Returns true for a broken-precondition failure rather than an I/O or input problem.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AdminError::Core(FtError::Fatal(_)))
    }
}
