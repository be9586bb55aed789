//! Error types for action primitives

use cdp_adapter::AdapterError;
use thiserror::Error;

/// Errors raised while talking to the page
#[derive(Debug, Error, Clone)]
pub enum ActionError {
    /// CDP communication or protocol error
    #[error("CDP I/O error: {0}")]
    CdpIo(String),

    /// Page script returned something other than the expected shape
    #[error("Unexpected script result: {0}")]
    ScriptResult(String),

    /// Element handle no longer resolves in the page
    #[error("Stale element: {0}")]
    StaleElement(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ActionError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, ActionError::CdpIo(_) | ActionError::StaleElement(_))
    }

    /// Get error severity level (0=low, 1=medium, 2=high, 3=critical)
    pub fn severity(&self) -> u8 {
        match self {
            ActionError::Internal(_) => 3,
            ActionError::CdpIo(_) => 2,
            ActionError::ScriptResult(_) => 1,
            ActionError::StaleElement(_) => 0,
        }
    }
}

impl From<AdapterError> for ActionError {
    fn from(err: AdapterError) -> Self {
        ActionError::CdpIo(err.to_string())
    }
}

impl From<serde_json::Error> for ActionError {
    fn from(err: serde_json::Error) -> Self {
        ActionError::ScriptResult(err.to_string())
    }
}
