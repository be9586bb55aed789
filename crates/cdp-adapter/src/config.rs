use crate::detect_chrome_executable;
use serde::{Deserialize, Serialize};
use std::{env, path::PathBuf, time::Duration};

/// Configuration for launching the visible automation browser.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CdpConfig {
    pub executable: PathBuf,
    pub user_data_dir: Option<PathBuf>,
    /// Only meant for contract tests on CI; operators always get a window.
    pub headless: bool,
    pub navigation_timeout_ms: u64,
    pub window_width: u32,
    pub window_height: u32,
    pub extra_args: Vec<String>,
}

impl Default for CdpConfig {
    fn default() -> Self {
        Self {
            executable: default_chrome_path(),
            user_data_dir: default_profile_dir(),
            headless: resolve_headless_default(),
            navigation_timeout_ms: 60_000,
            window_width: 1366,
            window_height: 900,
            extra_args: vec![
                "--no-sandbox".into(),
                "--disable-setuid-sandbox".into(),
                "--start-maximized".into(),
            ],
        }
    }
}

impl CdpConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    /// Configured executable when it exists, otherwise whatever detection finds.
    pub fn resolve_executable(&self) -> Option<PathBuf> {
        if !self.executable.as_os_str().is_empty() && self.executable.exists() {
            return Some(self.executable.clone());
        }
        detect_chrome_executable()
    }
}

fn resolve_headless_default() -> bool {
    match env::var("CAMPAIGNFORGE_HEADLESS") {
        Ok(value) => matches!(
            value.to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        Err(_) => false,
    }
}

fn default_chrome_path() -> PathBuf {
    detect_chrome_executable().unwrap_or_default()
}

fn default_profile_dir() -> Option<PathBuf> {
    env::var("CAMPAIGNFORGE_CHROME_PROFILE")
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}
