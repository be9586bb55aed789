use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use action_flow::ChromiumFactory;
use campaignforge_cli::{AppConfig, LoginCapture, Platform};
use cdp_adapter::CookieJar;
use clap::Args;
use serde_json::json;

use super::output::OutputFormat;

#[derive(Args, Clone, Debug)]
pub struct LoginArgs {
    /// Platform to sign in to: linkedin or reddit
    pub platform: Platform,

    /// How long to wait for the sign-in to finish (e.g. 5m)
    #[arg(long, default_value = "5m", value_parser = humantime::parse_duration)]
    pub wait: Duration,
}

pub async fn cmd_login(args: LoginArgs, config: &AppConfig, output: OutputFormat) -> Result<()> {
    let factory = Arc::new(ChromiumFactory::new(config.browser.clone()));
    let capture = LoginCapture::new(factory, CookieJar::new(config.cookies_dir.clone())).with_wait(args.wait);

    if matches!(output, OutputFormat::Human) {
        println!(
            "Sign in to {} in the browser window; waiting up to {}.",
            args.platform.display_name(),
            humantime::format_duration(args.wait)
        );
    }
    let report = capture
        .capture(args.platform)
        .await
        .with_context(|| format!("Login capture for {} failed", args.platform))?;

    let summary = json!({
        "platform": report.platform,
        "url": report.url,
        "cookies": report.cookies,
        "path": report.path,
    });
    if !output.print_structured(&summary)? {
        println!(
            "✅ Saved {} cookies for {} to {}",
            report.cookies,
            report.platform.display_name(),
            report.path.display()
        );
    }
    Ok(())
}
