//! Direct posting path
//!
//! One authenticated HTTP call per platform for LinkedIn and Reddit, and an SMTP session
//! for email. No browser is involved; every entry point returns a `PostResult`.

mod client;
pub mod config;
pub mod email;
pub mod errors;
pub mod linkedin;
pub mod reddit;

pub use client::DirectClient;
pub use config::{DirectConfig, EmailSettings};
pub use email::{compose, EmailDraft, EmailJob, EmailSender, MailTransport, SmtpRelay, SmtpTransport, ATTACHMENT_NAME};
pub use errors::DirectPostError;
pub use reddit::{Submission, SubmissionKind};

/// Rendered message handed to a [`MailTransport`].
pub use lettre::Message;
