use thiserror::Error;

use campaignforge_core_types::{Platform, PostError};

use crate::model::MethodAttempt;

#[derive(Debug, Error)]
pub enum InjectError {
    #[error("nothing to insert")]
    EmptyText,
    #[error("no method left text in the compose element (tried {})", .attempts.len())]
    Exhausted { attempts: Vec<MethodAttempt> },
}

impl InjectError {
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Get error severity (0=low, 1=medium, 2=high, 3=critical)
    pub fn severity(&self) -> u8 {
        match self {
            InjectError::EmptyText => 1,
            InjectError::Exhausted { .. } => 2,
        }
    }

    pub fn into_post_error(self, platform: Platform) -> PostError {
        PostError::InjectionFailed {
            platform,
            reason: self.to_string(),
        }
    }
}
