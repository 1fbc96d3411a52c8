//! The oracle contract.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use super::types::{BatchImage, ClassificationResult};

/// Hard failures calling the oracle.
///
/// The run loop treats every variant the same way as "no key found".
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Oracle not configured: {0}")]
    NotConfigured(String),
}

/// Classifies one batch of photographs.
///
/// Implementations must be stateless per call: no memory of earlier
/// batches. Results are trusted at face value.
#[async_trait]
pub trait ClassificationOracle: Send + Sync {
    /// Name of this oracle for logging.
    fn name(&self) -> &str;

    async fn classify(&self, batch: &[BatchImage]) -> Result<ClassificationResult, OracleError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OracleError::Malformed("expected value".to_string());
        assert_eq!(err.to_string(), "Malformed response: expected value");

        let err = OracleError::Timeout(Duration::from_secs(3));
        assert_eq!(err.to_string(), "Timeout after 3s");
    }
}
