//! Browser-engine collaborator for CampaignForge.
//!
//! Launches a visible Chromium through chromiumoxide and exposes the narrow
//! [`PageSession`] surface the locator, injector and verifier drive: navigation with a
//! completion gate and deadline, script evaluation, synthetic keyboard and mouse input,
//! cookies, and an explicit close-or-leave-open ending.

use std::{env, path::PathBuf};
use which::which;

mod chromium;
pub mod config;
pub mod cookies;
pub mod error;
pub mod keeper;
pub mod session;

pub use chromium::ChromiumSession;
pub use config::CdpConfig;
pub use cookies::{CookieJar, StoredCookie};
pub use error::{AdapterError, AdapterErrorKind};
pub use session::{KeyChord, PageSession, WaitGate};

pub fn detect_chrome_executable() -> Option<PathBuf> {
    if let Ok(raw) = env::var("CAMPAIGNFORGE_CHROME") {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            let candidate = PathBuf::from(trimmed);
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }

    for name in chrome_executable_names() {
        if let Ok(path) = which(name) {
            return Some(path);
        }
    }

    let skip_defaults = env::var("CAMPAIGNFORGE_SKIP_OS_PATHS")
        .map(|value| !value.trim().is_empty())
        .unwrap_or(false);

    if !skip_defaults {
        for candidate in os_specific_chrome_paths() {
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }

    None
}

fn chrome_executable_names() -> &'static [&'static str] {
    #[cfg(target_os = "windows")]
    {
        &["chrome.exe", "chromium.exe", "msedge.exe"]
    }

    #[cfg(not(target_os = "windows"))]
    {
        &[
            "google-chrome-stable",
            "google-chrome",
            "chromium",
            "chromium-browser",
        ]
    }
}

fn os_specific_chrome_paths() -> Vec<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let mut paths = Vec::new();
        for key in ["PROGRAMFILES", "PROGRAMFILES(X86)", "LOCALAPPDATA"] {
            if let Ok(value) = env::var(key) {
                let root = PathBuf::from(value.trim());
                paths.push(root.join("Google/Chrome/Application/chrome.exe"));
                paths.push(root.join("Chromium/Application/chrome.exe"));
            }
        }
        paths
    }

    #[cfg(target_os = "macos")]
    {
        vec![
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"),
            PathBuf::from("/Applications/Chromium.app/Contents/MacOS/Chromium"),
        ]
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        vec![
            PathBuf::from("/usr/bin/google-chrome-stable"),
            PathBuf::from("/usr/bin/google-chrome"),
            PathBuf::from("/usr/bin/chromium-browser"),
            PathBuf::from("/usr/bin/chromium"),
            PathBuf::from("/snap/bin/chromium"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::{chrome_executable_names, detect_chrome_executable};
    use serial_test::serial;
    use std::{env, fs};
    use tempfile::tempdir;

    fn restore(key: &str, value: Option<String>) {
        match value {
            Some(value) => env::set_var(key, value),
            None => env::remove_var(key),
        }
    }

    #[test]
    #[serial]
    fn detects_from_env_var() {
        let dir = tempdir().unwrap();
        let exe_path = dir.path().join("my-chrome");
        fs::write(&exe_path, b"").unwrap();
        let original = env::var("CAMPAIGNFORGE_CHROME").ok();
        env::set_var("CAMPAIGNFORGE_CHROME", exe_path.to_string_lossy().to_string());
        let detected = detect_chrome_executable();
        restore("CAMPAIGNFORGE_CHROME", original);
        assert_eq!(detected, Some(exe_path));
    }

    #[test]
    #[serial]
    fn detects_from_path_entries() {
        let dir = tempdir().unwrap();
        let name = chrome_executable_names()[0];
        let exe_path = dir.path().join(name);
        fs::write(&exe_path, b"").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&exe_path, fs::Permissions::from_mode(0o755)).unwrap();
        }
        let original_path = env::var("PATH").ok();
        let original_env = env::var("CAMPAIGNFORGE_CHROME").ok();
        let skip_flag = env::var("CAMPAIGNFORGE_SKIP_OS_PATHS").ok();
        env::set_var("CAMPAIGNFORGE_CHROME", "");
        env::set_var("CAMPAIGNFORGE_SKIP_OS_PATHS", "1");
        env::set_var("PATH", dir.path());
        let detected = detect_chrome_executable();
        restore("PATH", original_path);
        restore("CAMPAIGNFORGE_CHROME", original_env);
        restore("CAMPAIGNFORGE_SKIP_OS_PATHS", skip_flag);
        assert_eq!(detected, Some(exe_path));
    }
}
