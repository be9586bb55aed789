use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Credentials, Platform};

/// Longest title Reddit accepts.
pub const TITLE_MAX_CHARS: usize = 300;

/// Splits post content into a title and a body.
///
/// The title is the first line cut to [`TITLE_MAX_CHARS`]; the body is everything after
/// it. Single-line content is used whole as the body as well.
pub fn split_title_body(content: &str) -> (String, String) {
    match content.split_once('\n') {
        Some((first, rest)) => (truncate_chars(first.trim_end_matches('\r'), TITLE_MAX_CHARS), rest.to_string()),
        None => (truncate_chars(content, TITLE_MAX_CHARS), content.to_string()),
    }
}

fn truncate_chars(raw: &str, max: usize) -> String {
    raw.chars().take(max).collect()
}

/// One posting request. Immutable once dispatched.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PostRequest {
    pub platform: Platform,
    pub content: String,
    #[serde(default)]
    pub credentials: Credentials,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl PostRequest {
    pub fn new(platform: Platform, content: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            platform,
            content: content.into(),
            credentials,
            image_url: None,
        }
    }

    pub fn with_image(mut self, image_url: Option<String>) -> Self {
        self.image_url = image_url.filter(|url| !url.trim().is_empty());
        self
    }
}

/// Terminal value handed back to the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PostResult {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl PostResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            status_code: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            status_code: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_snake_case_and_omits_empty_fields() {
        let json = serde_json::to_value(PostResult::ok("posted").with_status(201)).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["status_code"], 201);
        assert!(json.get("data").is_none());
    }

    #[test]
    fn title_is_first_line() {
        let (title, body) = split_title_body("Line one\nLine two\nLine three");
        assert_eq!(title, "Line one");
        assert_eq!(body, "Line two\nLine three");
    }

    #[test]
    fn single_line_is_title_and_body() {
        let long = "é".repeat(320);
        let (title, body) = split_title_body(&long);
        assert_eq!(title.chars().count(), TITLE_MAX_CHARS);
        assert_eq!(body, long);
    }

    #[test]
    fn blank_image_url_is_dropped() {
        let req = PostRequest::new(Platform::Reddit, "hi", Credentials::new())
            .with_image(Some("  ".into()));
        assert!(req.image_url.is_none());
    }
}
