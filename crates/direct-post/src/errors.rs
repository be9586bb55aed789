//! Error types for the direct posting path

use campaignforge_core_types::{Platform, PostError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DirectPostError {
    /// Request never produced a response (DNS, connect, timeout, TLS)
    #[error("Error posting to {}: {source}", .platform.display_name())]
    Http {
        platform: Platform,
        #[source]
        source: reqwest::Error,
    },

    /// Upstream answered with a non-success status; body kept verbatim
    #[error("Failed to post to {}: {body}", .platform.display_name())]
    Upstream {
        platform: Platform,
        status: u16,
        body: String,
    },

    #[error("Failed to authenticate with Reddit: {body}")]
    RedditAuth { status: Option<u16>, body: String },

    /// Reddit accepted the call but listed errors in its JSON envelope
    #[error("Reddit rejected the submission: {0}")]
    Rejected(String),

    #[error("Invalid email address {address}: {reason}")]
    Address { address: String, reason: String },

    #[error("Could not build the email: {0}")]
    Compose(String),

    #[error("Error sending email: {0}")]
    Smtp(String),

    #[error("HTTP client setup failed: {0}")]
    Client(String),
}

impl DirectPostError {
    pub fn http(platform: Platform, source: reqwest::Error) -> Self {
        DirectPostError::Http { platform, source }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            DirectPostError::Upstream { status, .. } => Some(*status),
            DirectPostError::RedditAuth { status, .. } => *status,
            _ => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            DirectPostError::Http { source, .. } => source.is_timeout() || source.is_connect(),
            DirectPostError::Upstream { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Get error severity (0=low, 1=medium, 2=high, 3=critical)
    pub fn severity(&self) -> u8 {
        match self {
            DirectPostError::Address { .. } | DirectPostError::Compose(_) => 1,
            DirectPostError::Http { .. }
            | DirectPostError::Upstream { .. }
            | DirectPostError::Rejected(_)
            | DirectPostError::Smtp(_) => 2,
            DirectPostError::RedditAuth { .. } | DirectPostError::Client(_) => 3,
        }
    }
}

impl From<DirectPostError> for PostError {
    fn from(err: DirectPostError) -> Self {
        let status = err.status();
        let body = match &err {
            DirectPostError::Upstream { body, .. } | DirectPostError::RedditAuth { body, .. } => Some(body.clone()),
            _ => None,
        };
        PostError::TransportError {
            message: err.to_string(),
            status,
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campaignforge_core_types::PostResult;

    #[test]
    fn upstream_failure_keeps_status_and_body() {
        let err = DirectPostError::Upstream {
            platform: Platform::LinkedIn,
            status: 401,
            body: r#"{"message":"Invalid access token"}"#.into(),
        };
        assert!(!err.is_retryable());
        let result: PostResult = PostError::from(err).into();
        assert!(!result.success);
        assert_eq!(result.status_code, Some(401));
        assert_eq!(
            result.message,
            r#"Failed to post to LinkedIn: {"message":"Invalid access token"}"#
        );
    }

    #[test]
    fn server_errors_are_retryable() {
        let err = DirectPostError::Upstream {
            platform: Platform::Reddit,
            status: 503,
            body: String::new(),
        };
        assert!(err.is_retryable());
        assert_eq!(err.severity(), 2);
    }
}
