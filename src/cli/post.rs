use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use campaignforge_cli::{hold_open_sessions, AppConfig, HoldEnd, PostMode, Poster};
use clap::Args;
use tokio::fs;
use tracing::info;

use super::credentials::CredentialArgs;
use super::output::{print_post_result, OutputFormat};

#[derive(Args, Clone, Debug)]
pub struct PostArgs {
    /// Target platform: linkedin, reddit or email
    pub platform: String,

    /// Text to post (first line becomes the Reddit title)
    #[arg(long, conflicts_with = "content_file", required_unless_present = "content_file")]
    pub content: Option<String>,

    /// Read the text to post from a file
    #[arg(long, value_name = "FILE")]
    pub content_file: Option<PathBuf>,

    /// Image to share, attach or link
    #[arg(long)]
    pub image_url: Option<String>,

    #[command(flatten)]
    pub credentials: CredentialArgs,

    /// Posting path for LinkedIn and Reddit
    #[arg(long, value_enum, default_value_t = PostMode::Auto)]
    pub mode: PostMode,

    /// How long to keep a browser left open for manual completion (e.g. 10m); waits
    /// for Ctrl-C when omitted
    #[arg(long, value_parser = humantime::parse_duration)]
    pub hold: Option<Duration>,

    /// Exit right away even when a browser was left open
    #[arg(long)]
    pub no_hold: bool,
}

pub async fn cmd_post(args: PostArgs, config: &AppConfig, output: OutputFormat) -> Result<()> {
    let content = match (&args.content, &args.content_file) {
        (Some(content), _) => content.clone(),
        (None, Some(path)) => fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read content file {}", path.display()))?,
        (None, None) => bail!("either --content or --content-file is required"),
    };
    let credentials = args.credentials.load().await?;

    let poster = Poster::from_config(config)
        .context("Failed to set up posting clients")?
        .with_mode(args.mode);
    let result = poster
        .post(&args.platform, &content, credentials, args.image_url.clone())
        .await;
    print_post_result(&result, output)?;

    if !args.no_hold {
        let end = hold_open_sessions(args.hold).await;
        if end != HoldEnd::NothingHeld {
            info!(?end, "operator hold finished");
        }
    }

    if !result.success {
        bail!("{}", result.message);
    }
    Ok(())
}
