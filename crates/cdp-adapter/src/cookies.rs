//! Per-platform cookie persistence so a logged-in session can be restored without
//! re-entering credentials.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info};

use crate::error::{AdapterError, AdapterErrorKind};

/// Browser cookie as written to disk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    #[serde(default = "default_path")]
    pub path: String,
    /// Seconds since epoch; session cookies carry `None`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<f64>,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
}

fn default_path() -> String {
    "/".to_string()
}

/// Directory of `<platform>.json` cookie files.
#[derive(Clone, Debug)]
pub struct CookieJar {
    dir: PathBuf,
}

impl CookieJar {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, platform: &str) -> PathBuf {
        self.dir.join(format!("{}.json", platform.to_ascii_lowercase()))
    }

    /// `Ok(None)` when nothing has been saved yet.
    pub async fn load(&self, platform: &str) -> Result<Option<Vec<StoredCookie>>, AdapterError> {
        let path = self.path_for(platform);
        if !fs::try_exists(&path).await.unwrap_or(false) {
            debug!(path = %path.display(), "no saved cookies");
            return Ok(None);
        }
        let raw = fs::read_to_string(&path).await.map_err(|err| store_error(&path, err))?;
        let cookies: Vec<StoredCookie> =
            serde_json::from_str(&raw).map_err(|err| store_error(&path, err))?;
        debug!(path = %path.display(), count = cookies.len(), "loaded cookies");
        Ok(Some(cookies))
    }

    pub async fn save(&self, platform: &str, cookies: &[StoredCookie]) -> Result<PathBuf, AdapterError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|err| store_error(&self.dir, err))?;
        let path = self.path_for(platform);
        let body = serde_json::to_string_pretty(cookies).map_err(|err| store_error(&path, err))?;
        fs::write(&path, body).await.map_err(|err| store_error(&path, err))?;
        info!(path = %path.display(), count = cookies.len(), "saved cookies");
        Ok(path)
    }
}

fn store_error(path: &Path, err: impl std::fmt::Display) -> AdapterError {
    AdapterError::new(AdapterErrorKind::CookieStore).with_hint(format!("{}: {err}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn cookie(name: &str) -> StoredCookie {
        StoredCookie {
            name: name.into(),
            value: "v".into(),
            domain: ".linkedin.com".into(),
            path: "/".into(),
            expires: Some(1_900_000_000.0),
            http_only: true,
            secure: true,
        }
    }

    #[tokio::test]
    async fn missing_jar_is_none() {
        let dir = tempdir().unwrap();
        let jar = CookieJar::new(dir.path());
        assert!(jar.load("reddit").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_then_load_per_platform() {
        let dir = tempdir().unwrap();
        let jar = CookieJar::new(dir.path().join("cookies"));
        let path = jar.save("LinkedIn", &[cookie("li_at")]).await.unwrap();
        assert!(path.ends_with("linkedin.json"));

        let loaded = jar.load("linkedin").await.unwrap().unwrap();
        assert_eq!(loaded, vec![cookie("li_at")]);
        assert!(jar.load("reddit").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn corrupt_file_is_a_store_error() {
        let dir = tempdir().unwrap();
        let jar = CookieJar::new(dir.path());
        std::fs::write(jar.path_for("reddit"), "not json").unwrap();
        let err = jar.load("reddit").await.unwrap_err();
        assert_eq!(err.kind, AdapterErrorKind::CookieStore);
    }

    #[test]
    fn reads_devtools_style_export() {
        let raw = r#"[{"name":"reddit_session","value":"x","domain":".reddit.com","httpOnly":true}]"#;
        let cookies: Vec<StoredCookie> = serde_json::from_str(raw).unwrap();
        assert_eq!(cookies[0].path, "/");
        assert!(cookies[0].http_only);
        assert!(cookies[0].expires.is_none());
    }
}
