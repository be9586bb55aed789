//! Condition types for post-submission verification

use action_primitives::ElementHandle;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::GateError;

/// Where the page must be for a submission to count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UrlPattern {
    /// URL contains substring
    Contains(String),

    /// URL matches regex pattern
    Matches(String),
}

impl UrlPattern {
    pub fn compile(&self) -> Result<UrlMatcher, GateError> {
        match self {
            UrlPattern::Contains(fragment) => Ok(UrlMatcher::Contains(fragment.clone())),
            UrlPattern::Matches(pattern) => Regex::new(pattern)
                .map(UrlMatcher::Regex)
                .map_err(|e| GateError::InvalidSpec(format!("Invalid regex: {}", e))),
        }
    }
}

/// Compiled form of [`UrlPattern`].
#[derive(Debug, Clone)]
pub enum UrlMatcher {
    Contains(String),
    Regex(Regex),
}

impl UrlMatcher {
    pub fn is_match(&self, url: &str) -> bool {
        match self {
            UrlMatcher::Contains(fragment) => url.contains(fragment.as_str()),
            UrlMatcher::Regex(re) => re.is_match(url),
        }
    }
}

/// Large editables still holding more than `max_chars` count as leftover content.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResidualRule {
    pub min_width: f64,
    pub min_height: f64,
    pub max_chars: usize,
}

impl Default for ResidualRule {
    fn default() -> Self {
        Self {
            min_width: 200.0,
            min_height: 0.0,
            max_chars: 50,
        }
    }
}

/// Expected post-submission state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectSpec {
    pub destination: UrlPattern,

    /// Compose element that held the injected content
    pub compose: Option<ElementHandle>,

    /// Submit control that was clicked; also the re-click target
    pub submit: Option<ElementHandle>,

    /// Lower-case labels of controls that must no longer be visible
    pub submit_labels: Vec<String>,

    /// The compose element counts as cleared at or below this many characters
    pub cleared_max_chars: usize,

    pub residual: ResidualRule,
}

impl ExpectSpec {
    pub fn new(destination: UrlPattern) -> Self {
        Self {
            destination,
            compose: None,
            submit: None,
            submit_labels: Vec::new(),
            cleared_max_chars: 5,
            residual: ResidualRule::default(),
        }
    }

    pub fn with_compose(mut self, handle: ElementHandle) -> Self {
        self.compose = Some(handle);
        self
    }

    pub fn with_submit(mut self, handle: Option<ElementHandle>) -> Self {
        self.submit = handle;
        self
    }

    pub fn with_submit_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.submit_labels = labels
            .into_iter()
            .map(|label| label.into().to_lowercase())
            .collect();
        self
    }

    pub fn with_residual(mut self, residual: ResidualRule) -> Self {
        self.residual = residual;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_patterns() {
        let feed = UrlPattern::Contains("/feed".into()).compile().unwrap();
        assert!(feed.is_match("https://www.linkedin.com/feed/"));
        assert!(!feed.is_match("https://www.linkedin.com/login"));

        let comments = UrlPattern::Matches(r"/r/[^/]+/comments/".into()).compile().unwrap();
        assert!(comments.is_match("https://www.reddit.com/r/test/comments/abc123/title/"));

        assert!(matches!(
            UrlPattern::Matches("(".into()).compile(),
            Err(GateError::InvalidSpec(_))
        ));
    }

    #[test]
    fn labels_are_lowercased() {
        let spec = ExpectSpec::new(UrlPattern::Contains("/feed".into())).with_submit_labels(["Post", "SHARE"]);
        assert_eq!(spec.submit_labels, vec!["post", "share"]);
        assert_eq!(spec.cleared_max_chars, 5);
    }
}
