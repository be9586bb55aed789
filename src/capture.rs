//! Manual login capture.
//!
//! Opens the platform login page in a visible browser, lets the operator sign in by
//! hand (2FA, captchas and all), then stores the session cookies so later automated
//! runs start logged in.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use action_flow::{profile_for, SessionFactory};
use action_primitives::{poll_until, PollPolicy};
use campaignforge_core_types::{Platform, PostError};
use cdp_adapter::{CookieJar, WaitGate};
use tracing::{info, instrument, warn};

const URL_CHECK_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct CaptureReport {
    pub platform: Platform,
    /// Page the operator ended up on
    pub url: String,
    pub cookies: usize,
    pub path: PathBuf,
}

pub struct LoginCapture {
    factory: Arc<dyn SessionFactory>,
    jar: CookieJar,
    wait: Duration,
}

impl LoginCapture {
    pub fn new(factory: Arc<dyn SessionFactory>, jar: CookieJar) -> Self {
        Self {
            factory,
            jar,
            wait: Duration::from_secs(300),
        }
    }

    pub fn with_wait(mut self, wait: Duration) -> Self {
        self.wait = wait;
        self
    }

    fn poll_policy(&self) -> PollPolicy {
        let checks = self.wait.as_millis() / URL_CHECK_INTERVAL.as_millis();
        let attempts = u32::try_from(checks).unwrap_or(u32::MAX).saturating_add(1);
        PollPolicy::new(attempts, URL_CHECK_INTERVAL)
    }

    #[instrument(skip(self), fields(wait = ?self.wait))]
    pub async fn capture(&self, platform: Platform) -> Result<CaptureReport, PostError> {
        let profile = profile_for(platform)?;
        let session = self.factory.open(platform).await?;
        let page = session.page.clone();

        let login_url = profile.login.url.as_str();
        if let Err(err) = page
            .navigate(login_url, WaitGate::DomReady, profile.navigation_timeout)
            .await
        {
            page.leave_open("the login page did not load");
            return Err(PostError::NavigationFailed {
                platform,
                url: login_url.to_string(),
                reason: err.to_string(),
            });
        }
        info!(%platform, url = login_url, "waiting for the operator to sign in");

        let check = &profile.login.check;
        let landed = poll_until(self.poll_policy(), |_| {
            let page = page.clone();
            async move {
                match page.current_url().await {
                    Ok(url) if check.is_logged_in(&url) => Some(url),
                    _ => None,
                }
            }
        })
        .await;

        let Some(url) = landed else {
            close(&*page).await;
            return Err(PostError::AuthenticationFailed {
                platform,
                reason: format!("not signed in within {}s", self.wait.as_secs()),
            });
        };

        let cookies = page.cookies().await;
        close(&*page).await;
        let cookies = cookies?;
        let path = self.jar.save(platform.as_str(), &cookies).await?;
        info!(%platform, count = cookies.len(), path = %path.display(), "login captured");

        Ok(CaptureReport {
            platform,
            url,
            cookies: cookies.len(),
            path,
        })
    }
}

async fn close(page: &dyn cdp_adapter::PageSession) {
    if let Err(err) = page.close().await {
        warn!(error = %err, "closing the capture browser failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use action_flow::BrowserSession;
    use action_primitives::fake::FakeDom;
    use action_primitives::DomPort;
    use async_trait::async_trait;
    use cdp_adapter::{PageSession, StoredCookie};
    use tempfile::tempdir;

    const LOGIN: &str = "https://www.linkedin.com/login";
    const FEED: &str = "https://www.linkedin.com/feed/";

    struct FakeFactory {
        dom: Arc<FakeDom>,
        opened: AtomicUsize,
    }

    #[async_trait]
    impl SessionFactory for FakeFactory {
        async fn open(&self, _platform: Platform) -> Result<BrowserSession, PostError> {
            self.opened.fetch_add(1, Ordering::SeqCst);
            let page: Arc<dyn PageSession> = self.dom.clone();
            let dom: Arc<dyn DomPort> = self.dom.clone();
            Ok(BrowserSession::new(page, dom))
        }
    }

    fn session_cookie() -> StoredCookie {
        StoredCookie {
            name: "li_at".into(),
            value: "abc".into(),
            domain: ".linkedin.com".into(),
            path: "/".into(),
            expires: None,
            http_only: true,
            secure: true,
        }
    }

    fn factory(dom: FakeDom) -> Arc<FakeFactory> {
        Arc::new(FakeFactory {
            dom: Arc::new(dom),
            opened: AtomicUsize::new(0),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn cookies_are_saved_once_the_operator_lands_on_the_feed() {
        let dir = tempdir().unwrap();
        let fake = factory(FakeDom::new().page(LOGIN, Vec::new()).with_cookies(vec![session_cookie()]));
        let dom = fake.dom.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(7)).await;
            dom.set_url(FEED);
        });

        let capture = LoginCapture::new(fake.clone(), CookieJar::new(dir.path())).with_wait(Duration::from_secs(60));
        let report = capture.capture(Platform::LinkedIn).await.unwrap();

        assert_eq!(report.url, FEED);
        assert_eq!(report.cookies, 1);
        assert_eq!(fake.dom.navigations(), vec![LOGIN.to_string()]);
        assert!(fake.dom.is_closed());
        let saved = CookieJar::new(dir.path()).load("linkedin").await.unwrap();
        assert_eq!(saved, Some(vec![session_cookie()]));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_the_wait() {
        let dir = tempdir().unwrap();
        let fake = factory(FakeDom::new().page(LOGIN, Vec::new()));

        let capture = LoginCapture::new(fake.clone(), CookieJar::new(dir.path())).with_wait(Duration::from_secs(10));
        let err = capture.capture(Platform::LinkedIn).await.unwrap_err();

        assert!(matches!(err, PostError::AuthenticationFailed { .. }));
        assert!(err.to_string().contains("not signed in within 10s"));
        assert!(fake.dom.is_closed());
        assert!(!dir.path().join("linkedin.json").exists());
    }

    #[tokio::test]
    async fn email_has_no_login_page() {
        let dir = tempdir().unwrap();
        let fake = factory(FakeDom::new());
        let err = LoginCapture::new(fake.clone(), CookieJar::new(dir.path()))
            .capture(Platform::Email)
            .await
            .unwrap_err();
        assert!(matches!(err, PostError::UnsupportedPlatform(_)));
        assert_eq!(fake.opened.load(Ordering::SeqCst), 0);
    }
}
