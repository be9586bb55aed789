use reqwest::Client;
use tracing::warn;

use campaignforge_core_types::{Platform, PostError, PostRequest, PostResult};

use crate::config::DirectConfig;
use crate::errors::DirectPostError;

/// HTTP client for the platforms that expose a posting API.
#[derive(Clone)]
pub struct DirectClient {
    pub(crate) http: Client,
    pub(crate) config: DirectConfig,
}

impl DirectClient {
    pub fn new(config: DirectConfig) -> Result<Self, DirectPostError> {
        let http = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|err| DirectPostError::Client(err.to_string()))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &DirectConfig {
        &self.config
    }

    /// Posts through the platform API and folds any failure into the result.
    pub async fn post(&self, request: &PostRequest) -> PostResult {
        let outcome = match request.platform {
            Platform::LinkedIn => self.post_linkedin(request).await,
            Platform::Reddit => self.post_reddit(request).await,
            Platform::Email => Err(PostError::UnsupportedPlatform(
                "email (use the SMTP sender)".into(),
            )),
        };
        outcome.unwrap_or_else(|err| {
            warn!(platform = %request.platform, error = %err, "direct post failed");
            err.into()
        })
    }
}

/// Reads the body of a response whose status already decided the outcome.
pub(crate) async fn body_text(response: reqwest::Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "<response unavailable>".to_string())
}
