use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use campaignforge_cli::{parse_recipients, AppConfig, BulkDraft, BulkMailer};
use clap::Args;
use direct_post::EmailSender;
use tokio::fs;

use super::credentials::CredentialArgs;
use super::output::OutputFormat;

#[derive(Args, Clone, Debug)]
pub struct BulkEmailArgs {
    /// Draft JSON: {"subject": .., "content": .., "image_url": ..}
    #[arg(long, value_name = "FILE", default_value = "data/email-draft.json")]
    pub draft: PathBuf,

    /// Recipients, one address per line
    #[arg(long, value_name = "FILE", default_value = "data/recipients.txt")]
    pub recipients: PathBuf,

    /// SMTP sender fields (senderEmail, password, smtpServer, smtpPort)
    #[command(flatten)]
    pub credentials: CredentialArgs,

    /// Render every message but send none
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn cmd_bulk_email(args: BulkEmailArgs, config: &AppConfig, output: OutputFormat) -> Result<()> {
    let raw_draft = fs::read_to_string(&args.draft)
        .await
        .with_context(|| format!("Could not read {}", args.draft.display()))?;
    let draft: BulkDraft = serde_json::from_str(&raw_draft)
        .with_context(|| format!("Could not parse {}", args.draft.display()))?;
    let raw_recipients = fs::read_to_string(&args.recipients)
        .await
        .with_context(|| format!("Could not read {}", args.recipients.display()))?;
    let recipients = parse_recipients(&raw_recipients);
    if recipients.is_empty() {
        bail!("No valid addresses in {}", args.recipients.display());
    }
    let credentials = args.credentials.load().await?;

    let sender = EmailSender::smtp(config.email.clone()).context("Failed to set up SMTP sender")?;
    let subject = draft.subject.clone().unwrap_or_else(|| config.email.subject.clone());
    if matches!(output, OutputFormat::Human) {
        println!("📧 Email bulk send");
        println!("   Subject: {subject}");
        println!("   Recipients: {}", recipients.len());
        println!("   Dry run: {}", args.dry_run);
    }

    let report = BulkMailer::new(sender)
        .send_all(&credentials, &draft, &recipients, args.dry_run)
        .await;

    if !output.print_structured(&report)? {
        for outcome in &report.outcomes {
            let mark = if outcome.success { "✅" } else { "❌" };
            println!("   {mark} {}: {}", outcome.recipient, outcome.message);
        }
        println!("   Done: {} sent, {} failed", report.sent(), report.failed());
    }
    if report.failed() > 0 {
        bail!("{} of {} emails failed", report.failed(), report.outcomes.len());
    }
    Ok(())
}
