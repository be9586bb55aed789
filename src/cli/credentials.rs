use std::path::PathBuf;

use anyhow::{Context, Result};
use campaignforge_cli::Credentials;
use clap::Args;
use tokio::fs;

#[derive(Args, Clone, Debug, Default)]
pub struct CredentialArgs {
    /// JSON object of credential fields, e.g. {"email": "..", "password": ".."}
    #[arg(long, value_name = "FILE")]
    pub credentials: Option<PathBuf>,

    /// Single credential field; repeatable and applied over --credentials
    #[arg(long = "cred", value_name = "KEY=VALUE", value_parser = parse_pair)]
    pub pairs: Vec<(String, String)>,
}

impl CredentialArgs {
    pub async fn load(&self) -> Result<Credentials> {
        let mut credentials = match &self.credentials {
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read credentials file {}", path.display()))?;
                serde_json::from_str::<Credentials>(&raw)
                    .with_context(|| format!("Credentials file {} must be a JSON object of strings", path.display()))?
            }
            None => Credentials::new(),
        };
        for (key, value) in &self.pairs {
            credentials.insert(key.clone(), value.clone());
        }
        Ok(credentials)
    }
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got `{raw}`")),
    }
}
