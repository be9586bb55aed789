//! Shared primitives for the CampaignForge posting crates.
//!
//! Everything that crosses a crate boundary (platform name, credential bag, request,
//! terminal result, failure taxonomy) lives here so the automation layers and the
//! direct-API path agree on one vocabulary.

mod credentials;
mod errors;
mod platform;
mod post;

pub use credentials::Credentials;
pub use errors::PostError;
pub use platform::{Platform, UnknownPlatform};
pub use post::{split_title_body, PostRequest, PostResult, TITLE_MAX_CHARS};

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of one exclusive browser session bound to one [`PostRequest`].
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
