//! Configuration management module
//!
//! One YAML file with a section per subsystem. Every section falls back to its own
//! defaults, so a partial file (or none at all) is valid.

use std::path::{Path, PathBuf};

use action_flow::AutomationSettings;
use anyhow::{Context, Result};
use cdp_adapter::CdpConfig;
use direct_post::{DirectConfig, EmailSettings};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{info, warn};

pub const APP_DIR: &str = "campaignforge";
pub const CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub browser: CdpConfig,
    pub automation: AutomationSettings,
    pub direct: DirectConfig,
    pub email: EmailSettings,
    /// Where `<platform>.json` cookie files live
    pub cookies_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            browser: CdpConfig::default(),
            automation: AutomationSettings::default(),
            direct: DirectConfig::default(),
            email: EmailSettings::default(),
            cookies_dir: PathBuf::from("cookies"),
        }
    }
}

/// `--config` when given, then `./config/config.yaml`, then the user config dir.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = Path::new("config").join(CONFIG_FILE);
    if local.exists() {
        return Some(local);
    }
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

/// Load configuration; a missing file yields defaults.
pub async fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    let Some(path) = resolve_config_path(explicit) else {
        warn!("No config directory available, using defaults");
        return Ok(AppConfig::default());
    };

    if !path.exists() {
        warn!("Config file not found, using defaults: {}", path.display());
        return Ok(AppConfig::default());
    }

    let content = fs::read_to_string(&path)
        .await
        .context("Failed to read config file")?;
    let config: AppConfig = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    info!("Loaded configuration from: {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    #[tokio::test]
    async fn partial_file_keeps_section_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "browser:\n  navigation_timeout_ms: 15000\nautomation:\n  verify_attempts: 5\ndirect:\n  default_subreddit: marketing\ncookies_dir: /tmp/cf-cookies\n",
        )
        .unwrap();

        let config = load_config(Some(&path)).await.unwrap();
        assert_eq!(config.browser.navigation_timeout(), Duration::from_secs(15));
        assert_eq!(config.automation.verify_attempts, Some(5));
        assert_eq!(config.automation.verify_delay_ms, None);
        assert_eq!(config.direct.default_subreddit, "marketing");
        assert_eq!(config.direct.user_agent, "CampaignForge/1.0");
        assert_eq!(config.email.smtp_port, 587);
        assert_eq!(config.cookies_dir, PathBuf::from("/tmp/cf-cookies"));
    }

    #[tokio::test]
    async fn missing_file_means_defaults() {
        let dir = tempdir().unwrap();
        let config = load_config(Some(&dir.path().join("absent.yaml"))).await.unwrap();
        assert_eq!(config.cookies_dir, PathBuf::from("cookies"));
        assert_eq!(config.email.subject, "Marketing Content");
    }

    #[tokio::test]
    async fn malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "browser: [not, a, map]\n").unwrap();
        let err = load_config(Some(&path)).await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn explicit_path_wins() {
        let explicit = PathBuf::from("/etc/cf.yaml");
        assert_eq!(resolve_config_path(Some(&explicit)), Some(explicit));
    }
}
