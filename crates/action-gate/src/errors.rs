//! Error types for gate validation

use thiserror::Error;

/// Gate validation error enumeration
///
/// An unverified submission is an outcome, not an error; see [`crate::GateOutcome`].
#[derive(Debug, Error, Clone)]
pub enum GateError {
    /// Invalid expectation spec
    #[error("Invalid ExpectSpec: {0}")]
    InvalidSpec(String),
}

impl GateError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Get error severity (0=low, 1=medium, 2=high, 3=critical)
    pub fn severity(&self) -> u8 {
        match self {
            GateError::InvalidSpec(_) => 2,
        }
    }
}
