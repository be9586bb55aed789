//! Endpoints and defaults for the direct path. Base URLs are configurable so tests can
//! point them at a local mock server.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectConfig {
    pub linkedin_api_base: String,
    /// Host serving `/api/v1/access_token`
    pub reddit_auth_base: String,
    /// Host serving the OAuth API (`/api/submit`)
    pub reddit_api_base: String,
    pub user_agent: String,
    pub default_subreddit: String,
    pub timeout_secs: u64,
}

impl Default for DirectConfig {
    fn default() -> Self {
        Self {
            linkedin_api_base: "https://api.linkedin.com".into(),
            reddit_auth_base: "https://www.reddit.com".into(),
            reddit_api_base: "https://oauth.reddit.com".into(),
            user_agent: "CampaignForge/1.0".into(),
            default_subreddit: "test".into(),
            timeout_secs: 30,
        }
    }
}

impl DirectConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Every base pointed at one server, for tests.
    pub fn with_base(mut self, base: &str) -> Self {
        self.linkedin_api_base = base.to_string();
        self.reddit_auth_base = base.to_string();
        self.reddit_api_base = base.to_string();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailSettings {
    pub smtp_server: String,
    pub smtp_port: u16,
    pub subject: String,
    /// Upper bound for fetching the optional image
    pub image_timeout_secs: u64,
    pub smtp_timeout_secs: u64,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            smtp_server: "smtp.gmail.com".into(),
            smtp_port: 587,
            subject: "Marketing Content".into(),
            image_timeout_secs: 10,
            smtp_timeout_secs: 30,
        }
    }
}

pub(crate) fn endpoint(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config: DirectConfig = serde_json::from_str(r#"{ "user_agent": "Test/2.0" }"#).unwrap();
        assert_eq!(config.user_agent, "Test/2.0");
        assert_eq!(config.reddit_api_base, "https://oauth.reddit.com");
        assert_eq!(endpoint("http://127.0.0.1:9/", "/v2/ugcPosts"), "http://127.0.0.1:9/v2/ugcPosts");
    }
}
