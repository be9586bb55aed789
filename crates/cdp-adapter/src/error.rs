use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use campaignforge_core_types::PostError;

/// High-level error categories surfaced by the adapter.
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdapterErrorKind {
    #[error("browser launch failed")]
    Launch,
    #[error("navigation timed out")]
    NavTimeout,
    #[error("cdp i/o failure")]
    CdpIo,
    #[error("script evaluation failed")]
    Script,
    #[error("cookie store failure")]
    CookieStore,
    #[error("internal error")]
    Internal,
}

/// Enriched error metadata passed back to higher layers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdapterError {
    pub kind: AdapterErrorKind,
    pub hint: Option<String>,
    pub retriable: bool,
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(hint) = &self.hint {
            write!(f, ": {}", hint)?;
        }
        Ok(())
    }
}

impl std::error::Error for AdapterError {}

impl AdapterError {
    pub fn new(kind: AdapterErrorKind) -> Self {
        Self {
            kind,
            hint: None,
            retriable: false,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn retriable(mut self, flag: bool) -> Self {
        self.retriable = flag;
        self
    }

    pub fn io(err: impl fmt::Display) -> Self {
        Self::new(AdapterErrorKind::CdpIo)
            .with_hint(err.to_string())
            .retriable(true)
    }

    pub fn script(err: impl fmt::Display) -> Self {
        Self::new(AdapterErrorKind::Script).with_hint(err.to_string())
    }
}

impl From<AdapterError> for PostError {
    fn from(err: AdapterError) -> Self {
        match err.kind {
            AdapterErrorKind::Launch => PostError::BrowserUnavailable(err.to_string()),
            _ => PostError::BrowserUnavailable(format!("browser session error: {err}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_hint() {
        let err = AdapterError::new(AdapterErrorKind::NavTimeout).with_hint("https://x.test");
        assert_eq!(err.to_string(), "navigation timed out: https://x.test");
        assert!(!err.retriable);
        assert!(AdapterError::io("socket closed").retriable);
    }
}
