//! Item validation: does a candidate file decode as an image?

mod decode;

pub use decode::ImageDecodeValidator;

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why an item was rejected.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Failed to read {path}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not a decodable image: {reason}")]
    Undecodable { path: PathBuf, reason: String },
}

/// Stateless pass/fail check on one source item.
pub trait ItemValidator: Send + Sync {
    /// Name of this validator for logging.
    fn name(&self) -> &str;

    fn validate(&self, path: &Path) -> Result<(), ValidationError>;
}
