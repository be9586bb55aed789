//! Error types for locator system

use campaignforge_core_types::{Platform, PostError};
use thiserror::Error;

/// Locator error enumeration
#[derive(Debug, Error, Clone)]
pub enum LocatorError {
    /// Element not found with any strategy
    #[error("Element not found: {role} (tried {tried})")]
    ElementNotFound { role: String, tried: String },

    /// Role table cannot be searched at all
    #[error("Invalid role table: {0}")]
    InvalidTable(String),
}

impl LocatorError {
    /// Never retryable: the page changed shape and the same session will not recover.
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Get error severity (0=low, 1=medium, 2=high, 3=critical)
    pub fn severity(&self) -> u8 {
        match self {
            LocatorError::InvalidTable(_) => 3,
            LocatorError::ElementNotFound { .. } => 2,
        }
    }

    pub fn into_post_error(self, platform: Platform) -> PostError {
        match self {
            LocatorError::ElementNotFound { role, .. } => PostError::ElementNotFound { platform, role },
            LocatorError::InvalidTable(reason) => PostError::ElementNotFound {
                platform,
                role: reason,
            },
        }
    }
}
