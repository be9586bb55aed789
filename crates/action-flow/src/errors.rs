//! Driver error types

use campaignforge_core_types::{Platform, PostError};
use thiserror::Error;

use crate::types::DriveStage;

/// Driver errors
#[derive(Debug, Error)]
pub enum FlowError {
    /// A stage could not complete
    #[error("{stage} failed: {error}")]
    Step { stage: DriveStage, error: PostError },

    /// Platform has no browser automation profile
    #[error("No browser automation profile for {0}")]
    NoSiteProfile(Platform),
}

impl FlowError {
    pub fn step(stage: DriveStage, error: impl Into<PostError>) -> Self {
        FlowError::Step {
            stage,
            error: error.into(),
        }
    }

    /// Never retryable within one session; retries live inside each stage's poll loop.
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Get error severity (0=low, 1=medium, 2=high, 3=critical)
    pub fn severity(&self) -> u8 {
        match self {
            FlowError::Step { error, .. } => error.severity(),
            FlowError::NoSiteProfile(_) => 0,
        }
    }

    pub fn stage(&self) -> DriveStage {
        match self {
            FlowError::Step { stage, .. } => *stage,
            FlowError::NoSiteProfile(_) => DriveStage::Start,
        }
    }
}

impl From<FlowError> for PostError {
    fn from(err: FlowError) -> Self {
        match err {
            FlowError::Step { error, .. } => error,
            FlowError::NoSiteProfile(platform) => PostError::UnsupportedPlatform(format!(
                "{platform} (no browser automation profile)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_unwraps_to_post_error() {
        let err = FlowError::step(
            DriveStage::LocateCompose,
            PostError::ElementNotFound {
                platform: Platform::LinkedIn,
                role: "compose box".into(),
            },
        );
        assert_eq!(err.stage(), DriveStage::LocateCompose);
        assert_eq!(err.severity(), 2);
        assert!(matches!(PostError::from(err), PostError::ElementNotFound { .. }));
    }

    #[test]
    fn email_has_no_profile() {
        let err: PostError = FlowError::NoSiteProfile(Platform::Email).into();
        assert!(!err.leaves_session_open());
        assert!(err.to_string().contains("email"));
    }
}
