//! Failure taxonomy shared by every posting path

use serde_json::Value;
use thiserror::Error;

use crate::{Platform, PostResult};

const MANUAL_HINT: &str = "The browser window has been left open so the post can be completed manually.";

/// Terminal failure of one posting attempt.
#[derive(Debug, Error, Clone)]
pub enum PostError {
    /// Platform name did not match any supported target
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// Required credential field absent; raised before any side effect
    #[error("Missing {platform} credential: {field}")]
    MissingCredential { platform: Platform, field: String },

    /// Post-login heuristic says the session is still logged out
    #[error("Authentication failed on {platform}: {reason}")]
    AuthenticationFailed { platform: Platform, reason: String },

    /// Page load did not complete; the session is kept for inspection
    #[error("Could not load {url} on {platform}: {reason}")]
    NavigationFailed {
        platform: Platform,
        url: String,
        reason: String,
    },

    /// Locator exhausted every strategy for a role
    #[error("Could not find the {role} on {platform}")]
    ElementNotFound { platform: Platform, role: String },

    /// Every injection method failed independent verification
    #[error("Could not insert content on {platform}: {reason}")]
    InjectionFailed { platform: Platform, reason: String },

    /// Submission clicked but never observed as completed
    #[error("Submission on {platform} could not be verified")]
    SubmissionUnverified {
        platform: Platform,
        observation: Option<Value>,
    },

    /// Browser could not be launched or driven at all
    #[error("Browser unavailable: {0}")]
    BrowserUnavailable(String),

    /// Network/API failure on the direct path
    #[error("{message}")]
    TransportError {
        message: String,
        status: Option<u16>,
        body: Option<String>,
    },
}

impl PostError {
    pub fn transport(message: impl Into<String>) -> Self {
        PostError::TransportError {
            message: message.into(),
            status: None,
            body: None,
        }
    }

    pub fn upstream(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        PostError::TransportError {
            message: format!("HTTP {status}: {body}"),
            status: Some(status),
            body: Some(body),
        }
    }

    /// Whether the owning driver keeps its browser session alive for a human.
    pub fn leaves_session_open(&self) -> bool {
        matches!(
            self,
            PostError::AuthenticationFailed { .. }
                | PostError::NavigationFailed { .. }
                | PostError::ElementNotFound { .. }
                | PostError::InjectionFailed { .. }
                | PostError::SubmissionUnverified { .. }
        )
    }

    pub fn is_unverified(&self) -> bool {
        matches!(self, PostError::SubmissionUnverified { .. })
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            PostError::TransportError { status, .. } => *status,
            _ => None,
        }
    }

    /// Get error severity (0=low, 1=medium, 2=high, 3=critical)
    pub fn severity(&self) -> u8 {
        match self {
            PostError::UnsupportedPlatform(_) | PostError::MissingCredential { .. } => 0,
            PostError::SubmissionUnverified { .. } => 1,
            PostError::TransportError { .. }
            | PostError::NavigationFailed { .. }
            | PostError::ElementNotFound { .. }
            | PostError::InjectionFailed { .. } => 2,
            PostError::AuthenticationFailed { .. } | PostError::BrowserUnavailable(_) => 3,
        }
    }

    /// Human-readable message, with manual-completion guidance when a session stays open.
    pub fn user_message(&self) -> String {
        match self {
            PostError::SubmissionUnverified { platform, .. } => format!(
                "Post on {platform} was submitted but could not be verified. Please check manually. {MANUAL_HINT}"
            ),
            other if other.leaves_session_open() => format!("{other}. {MANUAL_HINT}"),
            other => other.to_string(),
        }
    }
}

impl From<PostError> for PostResult {
    fn from(err: PostError) -> Self {
        let mut result = PostResult::failure(err.user_message());
        result.status_code = err.status_code();
        if let PostError::SubmissionUnverified {
            observation: Some(observation),
            ..
        } = &err
        {
            result.data = Some(serde_json::json!({ "verification": observation }));
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_session_errors_carry_manual_hint() {
        let err = PostError::ElementNotFound {
            platform: Platform::LinkedIn,
            role: "compose box".into(),
        };
        assert!(err.leaves_session_open());
        let result: PostResult = err.into();
        assert!(!result.success);
        assert!(result.message.contains("compose box"));
        assert!(result.message.contains("completed manually"));
    }

    #[test]
    fn missing_credential_does_not_leave_anything_open() {
        let err = PostError::MissingCredential {
            platform: Platform::Email,
            field: "password".into(),
        };
        assert!(!err.leaves_session_open());
        assert_eq!(err.severity(), 0);
        let result: PostResult = err.into();
        assert_eq!(result.message, "Missing email credential: password");
    }

    #[test]
    fn navigation_failure_keeps_session_for_inspection() {
        let err = PostError::NavigationFailed {
            platform: Platform::Reddit,
            url: "https://www.reddit.com/login".into(),
            reason: "timed out".into(),
        };
        assert!(err.leaves_session_open());
        assert_eq!(err.severity(), 2);
        assert!(err.user_message().starts_with("Could not load https://www.reddit.com/login on reddit"));
    }

    #[test]
    fn upstream_error_keeps_status_and_body() {
        let result: PostResult = PostError::upstream(401, "{\"message\":\"bad token\"}").into();
        assert_eq!(result.status_code, Some(401));
        assert!(result.message.contains("bad token"));
    }

    #[test]
    fn unverified_surfaces_observation() {
        let err = PostError::SubmissionUnverified {
            platform: Platform::Reddit,
            observation: Some(serde_json::json!({ "signals_held": 3 })),
        };
        assert!(err.is_unverified());
        let result: PostResult = err.into();
        assert!(result.message.contains("check manually"));
        assert_eq!(result.data.unwrap()["verification"]["signals_held"], 3);
    }
}
