//! Posting façade
//!
//! Turns a platform name plus content into exactly one `PostResult`, choosing between
//! the browser session driver, the platform API and SMTP.

use std::sync::Arc;

use action_flow::{ChromiumFactory, SessionDriver};
use campaignforge_core_types::{Credentials, Platform, PostRequest, PostResult};
use cdp_adapter::CookieJar;
use clap::ValueEnum;
use direct_post::linkedin::{ACCESS_TOKEN_KEYS, PERSON_ID_KEYS};
use direct_post::reddit::{CLIENT_ID_KEYS, CLIENT_SECRET_KEYS};
use direct_post::{DirectClient, DirectPostError, EmailSender};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::config::AppConfig;

/// Which path LinkedIn and Reddit posts take. Email always goes over SMTP.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PostMode {
    /// API when the credentials allow it, browser otherwise
    #[default]
    Auto,
    Direct,
    Browser,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Direct,
    Browser,
    Smtp,
}

impl Route {
    pub fn name(&self) -> &'static str {
        match self {
            Route::Direct => "direct",
            Route::Browser => "browser",
            Route::Smtp => "smtp",
        }
    }
}

/// Whether `credentials` carry everything the platform API needs.
pub fn has_api_credentials(platform: Platform, credentials: &Credentials) -> bool {
    match platform {
        Platform::LinkedIn => {
            credentials.get_any(&ACCESS_TOKEN_KEYS).is_some() && credentials.get_any(&PERSON_ID_KEYS).is_some()
        }
        Platform::Reddit => {
            credentials.get_any(&CLIENT_ID_KEYS).is_some()
                && credentials.get_any(&CLIENT_SECRET_KEYS).is_some()
                && credentials.has_all(&["username", "password"])
        }
        Platform::Email => false,
    }
}

pub fn route(mode: PostMode, request: &PostRequest) -> Route {
    if !request.platform.supports_browser() {
        return Route::Smtp;
    }
    match mode {
        PostMode::Direct => Route::Direct,
        PostMode::Browser => Route::Browser,
        PostMode::Auto if has_api_credentials(request.platform, &request.credentials) => Route::Direct,
        PostMode::Auto => Route::Browser,
    }
}

pub struct Poster {
    browser: SessionDriver,
    direct: DirectClient,
    email: EmailSender,
    mode: PostMode,
}

impl Poster {
    pub fn new(browser: SessionDriver, direct: DirectClient, email: EmailSender) -> Self {
        Self {
            browser,
            direct,
            email,
            mode: PostMode::default(),
        }
    }

    /// Real collaborators: a visible Chromium per browser run, reqwest, SMTP.
    pub fn from_config(config: &AppConfig) -> Result<Self, DirectPostError> {
        let factory = Arc::new(ChromiumFactory::new(config.browser.clone()));
        let browser = SessionDriver::new(factory)
            .with_cookie_jar(Some(CookieJar::new(config.cookies_dir.clone())))
            .with_settings(config.automation.clone())
            .with_default_subreddit(config.direct.default_subreddit.clone());
        let direct = DirectClient::new(config.direct.clone())?;
        let email = EmailSender::smtp(config.email.clone())?;
        Ok(Self::new(browser, direct, email))
    }

    pub fn with_mode(mut self, mode: PostMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> PostMode {
        self.mode
    }

    /// Unknown platform names fail here, before anything is contacted.
    #[instrument(skip(self, content, credentials, image_url))]
    pub async fn post(
        &self,
        platform: &str,
        content: &str,
        credentials: Credentials,
        image_url: Option<String>,
    ) -> PostResult {
        let platform = match platform.parse::<Platform>() {
            Ok(platform) => platform,
            Err(err) => {
                warn!(error = %err, "rejecting post");
                return PostResult::failure(format!("Unsupported platform: {}", err.0));
            }
        };
        let request = PostRequest::new(platform, content, credentials).with_image(image_url);
        self.dispatch(&request).await
    }

    pub async fn dispatch(&self, request: &PostRequest) -> PostResult {
        let route = route(self.mode, request);
        info!(platform = %request.platform, route = route.name(), "dispatching post");
        let result = match route {
            Route::Smtp => self.email.post(request).await,
            Route::Direct => self.direct.post(request).await,
            Route::Browser => self.browser.post(request).await,
        };
        info!(platform = %request.platform, success = result.success, "post finished");
        result
    }
}
