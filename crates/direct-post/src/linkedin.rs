//! LinkedIn UGC posts

use serde_json::{json, Value};
use tracing::{info, instrument};

use campaignforge_core_types::{Platform, PostError, PostRequest, PostResult};

use crate::client::{body_text, DirectClient};
use crate::config::endpoint;
use crate::errors::DirectPostError;

pub const ACCESS_TOKEN_KEYS: [&str; 2] = ["accessToken", "access_token"];
pub const PERSON_ID_KEYS: [&str; 2] = ["personId", "person_id"];

/// UGC payload for one member share.
pub fn ugc_payload(person_id: &str, content: &str, image_url: Option<&str>) -> Value {
    let mut share = json!({
        "shareCommentary": { "text": content },
        "shareMediaCategory": "NONE",
    });
    if let Some(url) = image_url {
        share["shareMediaCategory"] = json!("IMAGE");
        share["media"] = json!([{ "status": "READY", "originalUrl": url }]);
    }
    json!({
        "author": format!("urn:li:person:{person_id}"),
        "lifecycleState": "PUBLISHED",
        "specificContent": { "com.linkedin.ugc.ShareContent": share },
        "visibility": { "com.linkedin.ugc.MemberNetworkVisibility": "PUBLIC" },
    })
}

impl DirectClient {
    #[instrument(skip_all, fields(platform = "linkedin"))]
    pub async fn post_linkedin(&self, request: &PostRequest) -> Result<PostResult, PostError> {
        let platform = Platform::LinkedIn;
        let token = request.credentials.need(platform, &ACCESS_TOKEN_KEYS)?;
        let person_id = request.credentials.need(platform, &PERSON_ID_KEYS)?;

        let payload = ugc_payload(person_id, &request.content, request.image_url.as_deref());
        let response = self
            .http
            .post(endpoint(&self.config.linkedin_api_base, "/v2/ugcPosts"))
            .bearer_auth(token)
            .header("X-Restli-Protocol-Version", "2.0.0")
            .json(&payload)
            .send()
            .await
            .map_err(|err| DirectPostError::http(platform, err))?;

        let status = response.status().as_u16();
        if !matches!(status, 200 | 201) {
            let body = body_text(response).await;
            return Err(DirectPostError::Upstream { platform, status, body }.into());
        }
        let data = response.json::<Value>().await.ok();
        info!(status, "LinkedIn share published");

        let mut result = PostResult::ok("Content posted to LinkedIn successfully").with_status(status);
        result.data = data;
        Ok(result)
    }
}
