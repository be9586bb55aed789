//! CampaignForge library
//!
//! Posting façade plus the pieces the `campaignforge` binary wires together:
//! configuration, manual login capture, bulk email and the operator hold.

pub mod bulk;
pub mod capture;
pub mod config;
pub mod facade;
pub mod operator;

pub use bulk::{parse_recipients, BulkDraft, BulkMailer, BulkReport, RecipientOutcome};
pub use capture::{CaptureReport, LoginCapture};
pub use config::{load_config, AppConfig};
pub use facade::{has_api_credentials, route, PostMode, Poster, Route};
pub use operator::{hold_open_sessions, HoldEnd};

pub use campaignforge_core_types::{Credentials, Platform, PostError, PostRequest, PostResult};
