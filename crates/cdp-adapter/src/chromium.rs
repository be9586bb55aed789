//! chromiumoxide-backed [`PageSession`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchKeyEventParams, DispatchKeyEventType, DispatchMouseEventParams,
    DispatchMouseEventType, InsertTextParams, MouseButton,
};
use chromiumoxide::cdp::browser_protocol::network::{CookieParam, TimeSinceEpoch};
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use campaignforge_core_types::SessionId;

use crate::config::CdpConfig;
use crate::cookies::StoredCookie;
use crate::error::{AdapterError, AdapterErrorKind};
use crate::keeper;
use crate::session::{KeyChord, PageSession, WaitGate};

/// Owns the browser process and its event loop. Dropping it kills the browser.
struct BrowserHandle {
    browser: Mutex<Browser>,
    event_loop: JoinHandle<()>,
}

impl Drop for BrowserHandle {
    fn drop(&mut self) {
        self.event_loop.abort();
    }
}

pub struct ChromiumSession {
    id: SessionId,
    page: Page,
    handle: Arc<BrowserHandle>,
}

impl ChromiumSession {
    /// Launches a fresh browser with a single blank page.
    pub async fn launch(cfg: &CdpConfig) -> Result<Self, AdapterError> {
        let executable = cfg.resolve_executable().ok_or_else(|| {
            AdapterError::new(AdapterErrorKind::Launch)
                .with_hint("Chrome/Chromium not found; set CAMPAIGNFORGE_CHROME")
        })?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(executable.clone())
            .window_size(cfg.window_width, cfg.window_height)
            .viewport(None);
        if !cfg.headless {
            builder = builder.with_head();
        }
        if let Some(dir) = &cfg.user_data_dir {
            builder = builder.user_data_dir(dir);
        }
        for arg in &cfg.extra_args {
            builder = builder.arg(arg.as_str());
        }
        let config = builder
            .build()
            .map_err(|err| AdapterError::new(AdapterErrorKind::Launch).with_hint(err))?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(|err| {
            AdapterError::new(AdapterErrorKind::Launch).with_hint(err.to_string())
        })?;

        let event_loop = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    debug!(?err, "browser handler event error");
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(AdapterError::io)?;

        let id = SessionId::new();
        info!(session = %id, executable = %executable.display(), headless = cfg.headless, "browser session launched");
        Ok(Self {
            id,
            page,
            handle: Arc::new(BrowserHandle {
                browser: Mutex::new(browser),
                event_loop,
            }),
        })
    }

    async fn dispatch_key(&self, params: DispatchKeyEventParams) -> Result<(), AdapterError> {
        self.page.execute(params).await.map_err(AdapterError::io)?;
        Ok(())
    }

    async fn wait_dom_ready(&self, deadline: Instant) -> Result<(), AdapterError> {
        while Instant::now() < deadline {
            let state = self.evaluate_script("document.readyState").await?;
            if matches!(state.as_str(), Some("interactive") | Some("complete")) {
                return Ok(());
            }
            sleep(Duration::from_millis(100)).await;
        }
        Err(AdapterError::new(AdapterErrorKind::NavTimeout).with_hint("document never left loading"))
    }
}

fn key_params(
    kind: DispatchKeyEventType,
    chord: &KeyChord,
    text: Option<&str>,
) -> Result<DispatchKeyEventParams, AdapterError> {
    let mut builder = DispatchKeyEventParams::builder()
        .r#type(kind)
        .key(chord.key.clone())
        .code(chord.code.clone())
        .windows_virtual_key_code(chord.key_code)
        .native_virtual_key_code(chord.key_code)
        .modifiers(chord.modifiers);
    if let Some(text) = text {
        builder = builder.text(text).unmodified_text(text);
    }
    builder
        .build()
        .map_err(|err| AdapterError::new(AdapterErrorKind::Internal).with_hint(err))
}

fn mouse_params(
    kind: DispatchMouseEventType,
    x: f64,
    y: f64,
) -> Result<DispatchMouseEventParams, AdapterError> {
    DispatchMouseEventParams::builder()
        .r#type(kind)
        .x(x)
        .y(y)
        .button(MouseButton::Left)
        .click_count(1)
        .build()
        .map_err(|err| AdapterError::new(AdapterErrorKind::Internal).with_hint(err))
}

fn cookie_param(cookie: &StoredCookie) -> Result<CookieParam, AdapterError> {
    let mut builder = CookieParam::builder()
        .name(cookie.name.clone())
        .value(cookie.value.clone())
        .domain(cookie.domain.clone())
        .path(cookie.path.clone())
        .http_only(cookie.http_only)
        .secure(cookie.secure);
    if let Some(expires) = cookie.expires.filter(|value| *value > 0.0) {
        builder = builder.expires(TimeSinceEpoch::new(expires));
    }
    builder
        .build()
        .map_err(|err| AdapterError::new(AdapterErrorKind::CookieStore).with_hint(err))
}

#[async_trait]
impl PageSession for ChromiumSession {
    fn id(&self) -> &SessionId {
        &self.id
    }

    async fn navigate(
        &self,
        url: &str,
        gate: WaitGate,
        deadline: Duration,
    ) -> Result<(), AdapterError> {
        let started = Instant::now();
        debug!(session = %self.id, url, ?gate, "navigate");
        let nav = async {
            self.page.goto(url).await.map_err(AdapterError::io)?;
            if gate == WaitGate::Load {
                self.page
                    .wait_for_navigation()
                    .await
                    .map_err(AdapterError::io)?;
            }
            Ok::<(), AdapterError>(())
        };
        match timeout(deadline, nav).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(AdapterError::new(AdapterErrorKind::NavTimeout)
                    .with_hint(format!("{url} after {}ms", deadline.as_millis()))
                    .retriable(true))
            }
        }
        if gate == WaitGate::DomReady {
            self.wait_dom_ready(started + deadline).await?;
        }
        Ok(())
    }

    async fn evaluate_script(&self, expression: &str) -> Result<Value, AdapterError> {
        let result = self
            .page
            .evaluate(expression)
            .await
            .map_err(AdapterError::script)?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn current_url(&self) -> Result<String, AdapterError> {
        let url = self.page.url().await.map_err(AdapterError::io)?;
        Ok(url.unwrap_or_default())
    }

    async fn press_key(&self, chord: &KeyChord) -> Result<(), AdapterError> {
        self.dispatch_key(key_params(
            DispatchKeyEventType::KeyDown,
            chord,
            chord.text.as_deref(),
        )?)
        .await?;
        self.dispatch_key(key_params(DispatchKeyEventType::KeyUp, chord, None)?)
            .await
    }

    async fn insert_text(&self, text: &str) -> Result<(), AdapterError> {
        self.page
            .execute(InsertTextParams::new(text))
            .await
            .map_err(AdapterError::io)?;
        Ok(())
    }

    async fn type_char(&self, ch: char) -> Result<(), AdapterError> {
        if ch == '\n' {
            return self.press_key(&KeyChord::enter()).await;
        }
        let text = ch.to_string();
        let chord = KeyChord {
            key: text.clone(),
            code: String::new(),
            key_code: 0,
            modifiers: 0,
            text: Some(text.clone()),
        };
        self.dispatch_key(key_params(DispatchKeyEventType::KeyDown, &chord, Some(&text))?)
            .await?;
        self.dispatch_key(key_params(DispatchKeyEventType::KeyUp, &chord, None)?)
            .await
    }

    async fn click_at(&self, x: f64, y: f64) -> Result<(), AdapterError> {
        for kind in [
            DispatchMouseEventType::MouseMoved,
            DispatchMouseEventType::MousePressed,
            DispatchMouseEventType::MouseReleased,
        ] {
            self.page
                .execute(mouse_params(kind, x, y)?)
                .await
                .map_err(AdapterError::io)?;
        }
        Ok(())
    }

    async fn cookies(&self) -> Result<Vec<StoredCookie>, AdapterError> {
        let cookies = self.page.get_cookies().await.map_err(AdapterError::io)?;
        Ok(cookies
            .into_iter()
            .map(|cookie| StoredCookie {
                name: cookie.name,
                value: cookie.value,
                domain: cookie.domain,
                path: cookie.path,
                expires: (!cookie.session && cookie.expires > 0.0).then_some(cookie.expires),
                http_only: cookie.http_only,
                secure: cookie.secure,
            })
            .collect())
    }

    async fn set_cookies(&self, cookies: &[StoredCookie]) -> Result<(), AdapterError> {
        if cookies.is_empty() {
            return Ok(());
        }
        let params = cookies
            .iter()
            .map(cookie_param)
            .collect::<Result<Vec<_>, _>>()?;
        self.page
            .set_cookies(params)
            .await
            .map_err(AdapterError::io)?;
        Ok(())
    }

    async fn close(&self) -> Result<(), AdapterError> {
        let mut browser = self.handle.browser.lock().await;
        if let Err(err) = browser.close().await {
            warn!(session = %self.id, ?err, "browser close reported an error");
        }
        if let Err(err) = browser.wait().await {
            debug!(session = %self.id, ?err, "waiting for the browser process failed");
        }
        info!(session = %self.id, "browser session closed");
        Ok(())
    }

    fn leave_open(&self, reason: &str) {
        keeper::hold(self.id.clone(), reason, self.handle.clone());
    }
}
