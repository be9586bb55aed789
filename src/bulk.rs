//! One draft, many recipients, one SMTP message each.

use campaignforge_core_types::{Credentials, PostError};
use direct_post::{compose, EmailJob, EmailSender};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BulkDraft {
    /// Falls back to the configured default subject
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(alias = "body")]
    pub content: String,
    #[serde(default, alias = "imageUrl")]
    pub image_url: Option<String>,
}

/// One address per line; blanks, `#` comments and lines without `@` are skipped.
pub fn parse_recipients(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter(|line| line.contains('@'))
        .map(str::to_lowercase)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipientOutcome {
    pub recipient: String,
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkReport {
    pub dry_run: bool,
    pub outcomes: Vec<RecipientOutcome>,
}

impl BulkReport {
    pub fn sent(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.success).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.sent()
    }
}

pub struct BulkMailer {
    sender: EmailSender,
}

impl BulkMailer {
    pub fn new(sender: EmailSender) -> Self {
        Self { sender }
    }

    /// Sends `draft` to each recipient in turn. A failure for one address never stops
    /// the rest. With `dry_run` every message is rendered but none is delivered.
    #[instrument(skip_all, fields(recipients = recipients.len(), dry_run = dry_run))]
    pub async fn send_all(
        &self,
        credentials: &Credentials,
        draft: &BulkDraft,
        recipients: &[String],
        dry_run: bool,
    ) -> BulkReport {
        let image = match draft.image_url.as_deref() {
            Some(url) => self.sender.fetch_image(url).await,
            None => None,
        };

        let mut report = BulkReport {
            dry_run,
            outcomes: Vec::with_capacity(recipients.len()),
        };
        for recipient in recipients {
            let outcome = match self.send_one(credentials, draft, recipient, image.clone(), dry_run).await {
                Ok(message) => RecipientOutcome {
                    recipient: recipient.clone(),
                    success: true,
                    message,
                },
                Err(err) => {
                    warn!(%recipient, error = %err, "bulk email failed for recipient");
                    RecipientOutcome {
                        recipient: recipient.clone(),
                        success: false,
                        message: err.to_string(),
                    }
                }
            };
            report.outcomes.push(outcome);
        }
        info!(sent = report.sent(), failed = report.failed(), "bulk email finished");
        report
    }

    async fn send_one(
        &self,
        credentials: &Credentials,
        draft: &BulkDraft,
        recipient: &str,
        image: Option<Vec<u8>>,
        dry_run: bool,
    ) -> Result<String, PostError> {
        let mut credentials = credentials.clone();
        credentials.insert("recipient", recipient);
        if let Some(subject) = &draft.subject {
            credentials.insert("subject", subject.as_str());
        }
        let job = EmailJob::from_credentials(&credentials, &draft.content, self.sender.settings())?;
        let message = compose(&job.draft, image)?;
        if dry_run {
            return Ok(format!("Composed email to {recipient} (dry run, not sent)"));
        }
        self.sender.deliver(&job.relay, message).await?;
        Ok(format!("Email sent to {recipient} successfully"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use direct_post::{DirectPostError, EmailSettings, MailTransport, Message, SmtpRelay};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Outbox {
        to: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MailTransport for Outbox {
        async fn deliver(&self, _relay: &SmtpRelay, message: Message) -> Result<(), DirectPostError> {
            let rendered = String::from_utf8_lossy(&message.formatted()).to_string();
            if rendered.contains("bounce@example.org") {
                return Err(DirectPostError::Smtp("550 mailbox unavailable".into()));
            }
            self.to.lock().push(rendered);
            Ok(())
        }
    }

    fn sender_creds() -> Credentials {
        Credentials::new()
            .with("senderEmail", "team@example.com")
            .with("password", "app-pass")
    }

    fn draft() -> BulkDraft {
        serde_json::from_str(r#"{ "subject": "Spring launch", "body": "We shipped it." }"#).unwrap()
    }

    fn mailer(outbox: Arc<Outbox>) -> BulkMailer {
        BulkMailer::new(EmailSender::new(EmailSettings::default(), outbox).unwrap())
    }

    #[test]
    fn recipients_file_is_filtered() {
        let raw = "# launch list\nLead@Example.org\n\n  ops@example.com  \nnot-an-address\n";
        assert_eq!(parse_recipients(raw), vec!["lead@example.org", "ops@example.com"]);
    }

    #[tokio::test]
    async fn one_bad_address_does_not_stop_the_rest() {
        let outbox = Arc::new(Outbox::default());
        let recipients = parse_recipients("a@example.org\nbounce@example.org\nb@example.org\n");

        let report = mailer(outbox.clone())
            .send_all(&sender_creds(), &draft(), &recipients, false)
            .await;

        assert_eq!(report.sent(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.outcomes[1].message, "Error sending email: 550 mailbox unavailable");
        let delivered = outbox.to.lock();
        assert_eq!(delivered.len(), 2);
        assert!(delivered[0].contains("Subject: Spring launch"));
    }

    #[tokio::test]
    async fn dry_run_delivers_nothing() {
        let outbox = Arc::new(Outbox::default());
        let recipients = vec!["a@example.org".to_string()];

        let report = mailer(outbox.clone())
            .send_all(&sender_creds(), &draft(), &recipients, true)
            .await;

        assert!(report.dry_run);
        assert_eq!(report.sent(), 1);
        assert!(report.outcomes[0].message.contains("dry run"));
        assert!(outbox.to.lock().is_empty());
    }

    #[tokio::test]
    async fn missing_password_fails_every_recipient() {
        let outbox = Arc::new(Outbox::default());
        let creds = Credentials::new().with("senderEmail", "team@example.com");
        let recipients = vec!["a@example.org".to_string()];

        let report = mailer(outbox).send_all(&creds, &draft(), &recipients, false).await;
        assert_eq!(report.failed(), 1);
        assert_eq!(report.outcomes[0].message, "Missing email credential: password");
    }
}
