//! Reddit script-app posting: password-grant token, then one submit call

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument};

use campaignforge_core_types::{split_title_body, Platform, PostError, PostRequest, PostResult};

use crate::client::{body_text, DirectClient};
use crate::config::endpoint;
use crate::errors::DirectPostError;

pub const CLIENT_ID_KEYS: [&str; 2] = ["clientId", "client_id"];
pub const CLIENT_SECRET_KEYS: [&str; 2] = ["clientSecret", "client_secret"];

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
}

/// Form fields of one `/api/submit` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub subreddit: String,
    pub title: String,
    pub kind: SubmissionKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionKind {
    SelfPost { text: String },
    Link { url: String },
}

impl Submission {
    /// Link post when an image URL is given, self post with the body otherwise.
    pub fn from_content(subreddit: &str, content: &str, image_url: Option<&str>) -> Self {
        let (title, body) = split_title_body(content);
        let kind = match image_url {
            Some(url) => SubmissionKind::Link { url: url.to_string() },
            None => SubmissionKind::SelfPost { text: body },
        };
        Self {
            subreddit: subreddit.trim().trim_start_matches("r/").to_string(),
            title,
            kind,
        }
    }

    pub fn form(&self) -> Vec<(&'static str, String)> {
        let mut form = vec![
            ("api_type", "json".to_string()),
            ("sr", self.subreddit.clone()),
            ("title", self.title.clone()),
        ];
        match &self.kind {
            SubmissionKind::SelfPost { text } => {
                form.push(("kind", "self".into()));
                form.push(("text", text.clone()));
            }
            SubmissionKind::Link { url } => {
                form.push(("kind", "link".into()));
                form.push(("url", url.clone()));
            }
        }
        form
    }
}

/// Error strings from the `{"json": {"errors": [[code, message, field], ..]}}` envelope.
fn envelope_errors(body: &Value) -> Vec<String> {
    body["json"]["errors"]
        .as_array()
        .map(|errors| {
            errors
                .iter()
                .map(|entry| match entry.as_array() {
                    Some(parts) => parts
                        .iter()
                        .filter_map(Value::as_str)
                        .collect::<Vec<_>>()
                        .join(": "),
                    None => entry.to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}

impl DirectClient {
    async fn reddit_token(&self, client_id: &str, client_secret: &str, username: &str, password: &str) -> Result<String, DirectPostError> {
        let response = self
            .http
            .post(endpoint(&self.config.reddit_auth_base, "/api/v1/access_token"))
            .basic_auth(client_id, Some(client_secret))
            .form(&[("grant_type", "password"), ("username", username), ("password", password)])
            .send()
            .await
            .map_err(|err| DirectPostError::http(Platform::Reddit, err))?;

        let status = response.status().as_u16();
        let body = body_text(response).await;
        if status != 200 {
            return Err(DirectPostError::RedditAuth {
                status: Some(status),
                body,
            });
        }
        let token: TokenResponse = serde_json::from_str(&body).map_err(|_| DirectPostError::RedditAuth {
            status: Some(status),
            body: body.clone(),
        })?;
        match (token.access_token, token.error) {
            (Some(token), _) => Ok(token),
            (None, error) => Err(DirectPostError::RedditAuth {
                status: Some(status),
                body: error.unwrap_or(body),
            }),
        }
    }

    #[instrument(skip_all, fields(platform = "reddit"))]
    pub async fn post_reddit(&self, request: &PostRequest) -> Result<PostResult, PostError> {
        let platform = Platform::Reddit;
        let creds = &request.credentials;
        let client_id = creds.need(platform, &CLIENT_ID_KEYS)?;
        let client_secret = creds.need(platform, &CLIENT_SECRET_KEYS)?;
        let username = creds.need(platform, &["username"])?;
        let password = creds.need(platform, &["password"])?;
        let subreddit = creds.get("subreddit").unwrap_or(self.config.default_subreddit.as_str());

        let token = self.reddit_token(client_id, client_secret, username, password).await?;
        debug!("Reddit token acquired");

        let submission = Submission::from_content(subreddit, &request.content, request.image_url.as_deref());
        let response = self
            .http
            .post(endpoint(&self.config.reddit_api_base, "/api/submit"))
            .bearer_auth(token)
            .form(&submission.form())
            .send()
            .await
            .map_err(|err| DirectPostError::http(platform, err))?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = body_text(response).await;
            return Err(DirectPostError::Upstream { platform, status, body }.into());
        }
        let data = response.json::<Value>().await.ok();
        if let Some(body) = &data {
            let errors = envelope_errors(body);
            if !errors.is_empty() {
                return Err(DirectPostError::Rejected(errors.join("; ")).into());
            }
        }
        info!(subreddit = %submission.subreddit, "Reddit submission accepted");

        let mut result = PostResult::ok(format!("Content posted to r/{} successfully", submission.subreddit))
            .with_status(status);
        result.data = data;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DirectConfig;
    use campaignforge_core_types::Credentials;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn creds() -> Credentials {
        Credentials::new()
            .with("clientId", "cid")
            .with("clientSecret", "secret")
            .with("username", "campaign_bot")
            .with("password", "hunter2")
            .with("subreddit", "rust")
    }

    async fn client(server: &MockServer) -> DirectClient {
        DirectClient::new(DirectConfig::default().with_base(&server.uri())).unwrap()
    }

    async fn mount_token(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/api/v1/access_token"))
            .and(body_string_contains("grant_type=password"))
            .and(header("user-agent", "CampaignForge/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "rt-1" })))
            .mount(server)
            .await;
    }

    #[test]
    fn link_post_when_image_given() {
        let sub = Submission::from_content("r/rust", "Title line\nBody", Some("https://img/x.jpg"));
        assert_eq!(sub.subreddit, "rust");
        assert_eq!(sub.title, "Title line");
        assert_eq!(sub.kind, SubmissionKind::Link { url: "https://img/x.jpg".into() });
        assert!(sub.form().contains(&("kind", "link".to_string())));

        let text = Submission::from_content("rust", "Only line", None);
        assert_eq!(text.kind, SubmissionKind::SelfPost { text: "Only line".into() });
    }

    #[test]
    fn envelope_errors_are_flattened() {
        let body = json!({ "json": { "errors": [["SUBREDDIT_NOEXIST", "that subreddit doesn't exist", "sr"]] } });
        assert_eq!(
            envelope_errors(&body),
            vec!["SUBREDDIT_NOEXIST: that subreddit doesn't exist: sr".to_string()]
        );
        assert!(envelope_errors(&json!({ "json": { "errors": [] } })).is_empty());
    }

    #[tokio::test]
    async fn self_post_goes_through() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("POST"))
            .and(path("/api/submit"))
            .and(header("authorization", "Bearer rt-1"))
            .and(body_string_contains("kind=self"))
            .and(body_string_contains("sr=rust"))
            .and(body_string_contains("title=Spring+launch"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "json": { "errors": [], "data": { "url": "https://www.reddit.com/r/rust/comments/abc/" } }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = PostRequest::new(Platform::Reddit, "Spring launch\nDetails inside", creds());
        let result = client(&server).await.post(&request).await;
        assert!(result.success, "{}", result.message);
        assert_eq!(result.message, "Content posted to r/rust successfully");
    }

    #[tokio::test]
    async fn bad_password_stops_before_submit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/access_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "error": "invalid_grant" })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/submit"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let request = PostRequest::new(Platform::Reddit, "hello", creds());
        let result = client(&server).await.post(&request).await;
        assert!(!result.success);
        assert_eq!(result.message, "Failed to authenticate with Reddit: invalid_grant");
    }

    #[tokio::test]
    async fn envelope_errors_fail_the_post() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("POST"))
            .and(path("/api/submit"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "json": { "errors": [["RATELIMIT", "you are doing that too much", "ratelimit"]] }
            })))
            .mount(&server)
            .await;

        let request = PostRequest::new(Platform::Reddit, "hello", creds());
        let result = client(&server).await.post(&request).await;
        assert!(!result.success);
        assert!(result.message.contains("RATELIMIT"));
    }
}
