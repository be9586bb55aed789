//! SMTP delivery: multipart plain + HTML, optional image attachment, STARTTLS relay

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials as SmtpCredentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use reqwest::Client;
use tracing::{info, instrument, warn};

use campaignforge_core_types::{Credentials, Platform, PostError, PostRequest, PostResult};

use crate::config::EmailSettings;
use crate::errors::DirectPostError;

pub const ATTACHMENT_NAME: &str = "marketing_image.jpg";

const SENDER_KEYS: [&str; 3] = ["senderEmail", "sender_email", "email"];
const RECIPIENT_KEYS: [&str; 2] = ["recipient", "recipient_email"];
const SERVER_KEYS: [&str; 2] = ["smtpServer", "smtp_server"];
const PORT_KEYS: [&str; 2] = ["smtpPort", "smtp_port"];

/// Where and as whom to deliver.
#[derive(Clone, PartialEq, Eq)]
pub struct SmtpRelay {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for SmtpRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpRelay")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// One outgoing message before it is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailDraft {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub content: String,
}

/// Everything an email post needs, resolved from the credential bag.
#[derive(Debug, Clone)]
pub struct EmailJob {
    pub relay: SmtpRelay,
    pub draft: EmailDraft,
}

impl EmailJob {
    /// camelCase and snake_case keys are both accepted; server, port and subject fall
    /// back to `defaults`.
    pub fn from_credentials(creds: &Credentials, content: &str, defaults: &EmailSettings) -> Result<Self, PostError> {
        let platform = Platform::Email;
        let sender = creds.need(platform, &SENDER_KEYS)?;
        let password = creds.need(platform, &["password"])?;
        let recipient = creds.need(platform, &RECIPIENT_KEYS)?;
        let port = match creds.get_any(&PORT_KEYS) {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| {
                PostError::transport(format!("Invalid SMTP port: {raw}"))
            })?,
            None => defaults.smtp_port,
        };
        Ok(Self {
            relay: SmtpRelay {
                server: creds
                    .get_any(&SERVER_KEYS)
                    .unwrap_or(defaults.smtp_server.as_str())
                    .to_string(),
                port,
                username: sender.to_string(),
                password: password.to_string(),
            },
            draft: EmailDraft {
                from: sender.to_string(),
                to: recipient.to_string(),
                subject: creds.get("subject").unwrap_or(defaults.subject.as_str()).to_string(),
                content: content.to_string(),
            },
        })
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// HTML alternative: escaped content, line breaks as `<br>`.
pub fn html_body(subject: &str, content: &str) -> String {
    let paragraph = escape_html(content).replace("\r\n", "\n").replace('\n', "<br>");
    format!(
        "<html><body><div style=\"font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;\">\
         <h2>{}</h2><p style=\"line-height: 1.6; color: #333;\">{paragraph}</p></div></body></html>",
        escape_html(subject)
    )
}

fn mailbox(address: &str) -> Result<Mailbox, DirectPostError> {
    address.trim().parse().map_err(|err: lettre::address::AddressError| DirectPostError::Address {
        address: address.to_string(),
        reason: err.to_string(),
    })
}

/// Renders the draft. Without an image the message is a bare `multipart/alternative`.
pub fn compose(draft: &EmailDraft, image: Option<Vec<u8>>) -> Result<Message, DirectPostError> {
    let alternative = MultiPart::alternative_plain_html(draft.content.clone(), html_body(&draft.subject, &draft.content));
    let body = match image {
        Some(bytes) => {
            let jpeg = ContentType::parse("image/jpeg").map_err(|err| DirectPostError::Compose(err.to_string()))?;
            MultiPart::mixed()
                .multipart(alternative)
                .singlepart(Attachment::new(ATTACHMENT_NAME.to_string()).body(bytes, jpeg))
        }
        None => alternative,
    };
    Message::builder()
        .from(mailbox(&draft.from)?)
        .to(mailbox(&draft.to)?)
        .subject(draft.subject.clone())
        .multipart(body)
        .map_err(|err| DirectPostError::Compose(err.to_string()))
}

/// Outgoing mail seam.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn deliver(&self, relay: &SmtpRelay, message: Message) -> Result<(), DirectPostError>;
}

/// Real delivery: one STARTTLS connection per message.
pub struct SmtpTransport {
    timeout: Duration,
}

impl SmtpTransport {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl MailTransport for SmtpTransport {
    async fn deliver(&self, relay: &SmtpRelay, message: Message) -> Result<(), DirectPostError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&relay.server)
            .map_err(|err| DirectPostError::Smtp(err.to_string()))?
            .port(relay.port)
            .credentials(SmtpCredentials::new(relay.username.clone(), relay.password.clone()))
            .timeout(Some(self.timeout))
            .build();
        transport
            .send(message)
            .await
            .map(|_| ())
            .map_err(|err| DirectPostError::Smtp(err.to_string()))
    }
}

/// Email peer path of the façade.
#[derive(Clone)]
pub struct EmailSender {
    http: Client,
    settings: EmailSettings,
    transport: Arc<dyn MailTransport>,
}

impl EmailSender {
    pub fn new(settings: EmailSettings, transport: Arc<dyn MailTransport>) -> Result<Self, DirectPostError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.image_timeout_secs))
            .build()
            .map_err(|err| DirectPostError::Client(err.to_string()))?;
        Ok(Self {
            http,
            settings,
            transport,
        })
    }

    /// Real SMTP delivery with the configured timeout.
    pub fn smtp(settings: EmailSettings) -> Result<Self, DirectPostError> {
        let transport = Arc::new(SmtpTransport::new(Duration::from_secs(settings.smtp_timeout_secs)));
        Self::new(settings, transport)
    }

    pub fn settings(&self) -> &EmailSettings {
        &self.settings
    }

    /// Downloads the attachment; any failure is logged and the mail goes out without it.
    pub async fn fetch_image(&self, url: &str) -> Option<Vec<u8>> {
        let response = match self.http.get(url).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(%url, error = %err, "could not fetch image, sending without attachment");
                return None;
            }
        };
        if !response.status().is_success() {
            warn!(%url, status = response.status().as_u16(), "image fetch refused, sending without attachment");
            return None;
        }
        match response.bytes().await {
            Ok(bytes) => Some(bytes.to_vec()),
            Err(err) => {
                warn!(%url, error = %err, "image download interrupted, sending without attachment");
                None
            }
        }
    }

    /// Renders the message for `draft`, fetching the image when one is named.
    pub async fn prepare(&self, draft: &EmailDraft, image_url: Option<&str>) -> Result<Message, DirectPostError> {
        let image = match image_url {
            Some(url) => self.fetch_image(url).await,
            None => None,
        };
        compose(draft, image)
    }

    pub async fn deliver(&self, relay: &SmtpRelay, message: Message) -> Result<(), DirectPostError> {
        self.transport.deliver(relay, message).await
    }

    #[instrument(skip_all, fields(platform = "email"))]
    pub async fn send_post(&self, request: &PostRequest) -> Result<PostResult, PostError> {
        let job = EmailJob::from_credentials(&request.credentials, &request.content, &self.settings)?;
        let message = self.prepare(&job.draft, request.image_url.as_deref()).await?;
        self.deliver(&job.relay, message).await?;
        info!(to = %job.draft.to, server = %job.relay.server, "email sent");
        Ok(PostResult::ok(format!("Email sent to {} successfully", job.draft.to)))
    }

    /// Same as [`EmailSender::send_post`], failures folded into the result.
    pub async fn post(&self, request: &PostRequest) -> PostResult {
        self.send_post(request).await.unwrap_or_else(|err| {
            warn!(error = %err, "email failed");
            err.into()
        })
    }
}
