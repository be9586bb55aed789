//! Generic session driver.
//!
//! `Start → [RestoreCookies] → Navigate(login) → AuthenticateFill → AuthenticateSubmit →
//! ConfirmLoggedIn → Navigate(compose) → LocateCompose → Inject → LocateSubmit → Click →
//! Verify → {Done | Unverified | Failed}`, parameterised by a [`SiteProfile`].
//!
//! A verified run closes its browser. Every other ending after launch parks the browser
//! for an operator instead.

use std::sync::Arc;
use std::time::Duration;

use action_gate::{ExpectSpec, Observation, Verifier};
use action_injector::{preview, InjectReport, Injector};
use action_locator::{Located, Locator};
use action_primitives::{settle, ActionError, ElementHandle};
use campaignforge_core_types::{split_title_body, Credentials, Platform, PostError, PostRequest, PostResult};
use cdp_adapter::{CookieJar, KeyChord, WaitGate};
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use crate::errors::FlowError;
use crate::profile::{AutomationSettings, ComposePlan, KeyBurst, SiteProfile};
use crate::session::{BrowserSession, SessionFactory};
use crate::sites::profile_for;
use crate::types::{DriveOutcome, DriveReport, DriveStage, DriveSummary, StageTrace, SubmitVia};

/// Pause between characters when a login field has to be typed.
const FIELD_KEYSTROKE_DELAY: Duration = Duration::from_millis(50);

/// Runs the per-site state machine, one fresh session per request.
pub struct SessionDriver {
    factory: Arc<dyn SessionFactory>,
    jar: Option<CookieJar>,
    settings: AutomationSettings,
    default_subreddit: Option<String>,
}

impl SessionDriver {
    pub fn new(factory: Arc<dyn SessionFactory>) -> Self {
        Self {
            factory,
            jar: None,
            settings: AutomationSettings::default(),
            default_subreddit: None,
        }
    }

    pub fn with_cookie_jar(mut self, jar: Option<CookieJar>) -> Self {
        self.jar = jar;
        self
    }

    pub fn with_settings(mut self, settings: AutomationSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Subreddit used when a request's credentials name none.
    pub fn with_default_subreddit(mut self, subreddit: impl Into<String>) -> Self {
        self.default_subreddit = Some(subreddit.into());
        self
    }

    /// Drives `request` with its platform's profile and folds the report into a result.
    pub async fn post(&self, request: &PostRequest) -> PostResult {
        match profile_for(request.platform) {
            Ok(profile) => self.drive(&profile, request).await.into_post_result(),
            Err(err) => PostError::from(err).into(),
        }
    }

    /// Runs one posting attempt to a terminal stage. Never panics, never returns early
    /// without a report.
    #[instrument(skip_all, fields(platform = %request.platform))]
    pub async fn drive(&self, profile: &SiteProfile, request: &PostRequest) -> DriveReport {
        let mut profile = self.settings.apply(profile.clone());
        if let Some(subreddit) = &self.default_subreddit {
            profile.default_subreddit = subreddit.clone();
        }
        let platform = profile.platform;
        let success_message = profile.success_message_for(&request.credentials);
        let mut trace = StageTrace::new();

        let unlaunched = |mut trace: StageTrace, error: PostError| {
            trace.enter(DriveStage::Failed);
            DriveReport {
                platform,
                session: None,
                trace,
                outcome: DriveOutcome::Failed {
                    stage: DriveStage::Start,
                    error,
                },
                success_message: success_message.clone(),
            }
        };

        if let Err(error) = preflight(&profile, request) {
            warn!(error = %error, "refusing to launch a browser");
            return unlaunched(trace, error);
        }

        let session = match self.factory.open(platform).await {
            Ok(session) => session,
            Err(error) => {
                warn!(error = %error, "browser session could not be opened");
                return unlaunched(trace, error);
            }
        };
        let session_id = session.id().clone();
        info!(session = %session_id, "drive started");

        let mut run = Run {
            profile: &profile,
            request,
            locator: Locator::new(session.dom.clone()),
            session: session.clone(),
            jar: self.jar.as_ref(),
            trace: &mut trace,
        };
        let result = run.execute().await;

        let outcome = match result {
            Ok(summary) => {
                trace.enter(DriveStage::Done);
                info!(
                    session = %session_id,
                    method = summary.inject_method.name(),
                    "post verified, closing browser"
                );
                if let Err(err) = session.page.close().await {
                    warn!(error = %err, "browser close failed");
                }
                DriveOutcome::Done(summary)
            }
            Err(FlowError::Step {
                stage: DriveStage::Verify,
                error,
            }) if error.is_unverified() => {
                trace.enter(DriveStage::Unverified);
                warn!(session = %session_id, "submission unverified, leaving browser open");
                session.page.leave_open(&error.user_message());
                DriveOutcome::Unverified(error)
            }
            Err(err) => {
                let stage = err.stage();
                let error = PostError::from(err);
                trace.enter(DriveStage::Failed);
                warn!(session = %session_id, stage = %stage, error = %error, "drive failed, leaving browser open");
                session.page.leave_open(&error.user_message());
                DriveOutcome::Failed { stage, error }
            }
        };

        DriveReport {
            platform,
            session: Some(session_id),
            trace,
            outcome,
            success_message,
        }
    }
}

/// Checks that need no browser: every login credential supplied, content present and,
/// for titled sites, a non-blank first line.
fn preflight(profile: &SiteProfile, request: &PostRequest) -> Result<(), PostError> {
    for keys in profile.required_credentials() {
        request.credentials.need(profile.platform, &keys)?;
    }
    if request.content.trim().is_empty() {
        return Err(PostError::InjectionFailed {
            platform: profile.platform,
            reason: "content is empty".into(),
        });
    }
    if let ComposePlan::TitleBody { .. } = profile.compose {
        let (title, _) = split_title_body(&request.content);
        if title.trim().is_empty() {
            return Err(PostError::InjectionFailed {
                platform: profile.platform,
                reason: "title line is empty".into(),
            });
        }
    }
    Ok(())
}

/// Compose elements found for one run.
struct ComposeTargets {
    title: Option<Located>,
    body: Located,
}

struct Run<'a> {
    profile: &'a SiteProfile,
    request: &'a PostRequest,
    session: BrowserSession,
    locator: Locator,
    jar: Option<&'a CookieJar>,
    trace: &'a mut StageTrace,
}

impl Run<'_> {
    fn platform(&self) -> Platform {
        self.profile.platform
    }

    fn credentials(&self) -> &Credentials {
        &self.request.credentials
    }

    async fn execute(&mut self) -> Result<DriveSummary, FlowError> {
        let compose_url = self.profile.compose_url_for(self.credentials());

        let mut reused_cookies = false;
        if self.restore_cookies().await {
            self.navigate(DriveStage::NavigateCompose, &compose_url).await?;
            settle(self.profile.compose_settle).await;
            self.trace.enter(DriveStage::ConfirmLoggedIn);
            let url = self.current_url().await;
            reused_cookies = self.profile.login.check.is_logged_in(&url);
            if reused_cookies {
                info!(%url, "restored session is logged in");
            } else {
                info!(%url, "restored cookies did not hold, logging in");
            }
        }

        if !reused_cookies {
            self.login().await?;
            self.save_cookies().await;
            self.navigate(DriveStage::NavigateCompose, &compose_url).await?;
            settle(self.profile.compose_settle).await;
        }

        let targets = self.locate_compose().await?;
        let report = self.inject(&targets).await?;
        let (submitted, submit_handle) = self.submit(&targets.body).await?;
        let verification = self.verify(&targets.body.handle, submit_handle).await?;

        Ok(DriveSummary {
            compose_strategy: targets.body.strategy,
            inject_method: report.method,
            submitted,
            reused_cookies,
            verification,
        })
    }

    async fn restore_cookies(&mut self) -> bool {
        let Some(jar) = self.jar else {
            return false;
        };
        self.trace.enter(DriveStage::RestoreCookies);
        let platform = self.platform();
        match jar.load(platform.as_str()).await {
            Ok(Some(cookies)) if !cookies.is_empty() => match self.session.page.set_cookies(&cookies).await {
                Ok(()) => {
                    info!(count = cookies.len(), "restored saved cookies");
                    true
                }
                Err(err) => {
                    warn!(error = %err, "could not load saved cookies into the browser");
                    false
                }
            },
            Ok(_) => {
                debug!("no saved cookies");
                false
            }
            Err(err) => {
                warn!(error = %err, "cookie jar unreadable");
                false
            }
        }
    }

    async fn save_cookies(&self) {
        let Some(jar) = self.jar else {
            return;
        };
        let platform = self.platform();
        match self.session.page.cookies().await {
            Ok(cookies) => match jar.save(platform.as_str(), &cookies).await {
                Ok(path) => info!(count = cookies.len(), path = %path.display(), "session cookies saved"),
                Err(err) => warn!(error = %err, "could not save session cookies"),
            },
            Err(err) => warn!(error = %err, "could not read session cookies"),
        }
    }

    async fn navigate(&mut self, stage: DriveStage, url: &str) -> Result<(), FlowError> {
        self.trace.enter(stage);
        info!(stage = %stage, %url, "navigating");
        self.session
            .page
            .navigate(url, WaitGate::DomReady, self.profile.navigation_timeout)
            .await
            .map_err(|err| {
                FlowError::step(
                    stage,
                    PostError::NavigationFailed {
                        platform: self.platform(),
                        url: url.to_string(),
                        reason: err.to_string(),
                    },
                )
            })
    }

    async fn current_url(&self) -> String {
        match self.session.page.current_url().await {
            Ok(url) => url,
            Err(err) => {
                warn!(error = %err, "could not read the page URL");
                String::new()
            }
        }
    }

    async fn login(&mut self) -> Result<(), FlowError> {
        let profile = self.profile;
        let login = &profile.login;
        let platform = self.platform();
        self.navigate(DriveStage::NavigateLogin, &login.url).await?;

        self.trace.enter(DriveStage::AuthenticateFill);
        for field in &login.fields {
            let value = self
                .credentials()
                .need(platform, &field.key_refs())
                .map_err(|err| FlowError::step(DriveStage::AuthenticateFill, err))?;
            let located = self
                .locator
                .locate(&field.table)
                .await
                .map_err(|err| FlowError::step(DriveStage::AuthenticateFill, err.into_post_error(platform)))?;
            if !field.secret {
                debug!(role = %field.table.role, value = %preview(value, 40), "filling field");
            }
            self.fill(&located.handle, value)
                .await
                .map_err(|err| page_error(DriveStage::AuthenticateFill, err))?;
        }

        self.trace.enter(DriveStage::AuthenticateSubmit);
        let dom = &self.session.dom;
        let clicked = match self.locator.locate(&login.submit).await {
            Ok(located) => dom.click(&located.handle).await.unwrap_or(false),
            Err(err) => {
                debug!(error = %err, "no sign-in control found");
                false
            }
        };
        if !clicked {
            warn!("sign-in control not clicked, submitting the form with Enter");
            dom.press_key(&KeyChord::enter())
                .await
                .map_err(|err| page_error(DriveStage::AuthenticateSubmit, err))?;
        }
        settle(login.settle).await;

        self.trace.enter(DriveStage::ConfirmLoggedIn);
        let url = self.current_url().await;
        if !login.check.is_logged_in(&url) {
            return Err(FlowError::step(
                DriveStage::ConfirmLoggedIn,
                PostError::AuthenticationFailed {
                    platform,
                    reason: format!("still on {url} after signing in; check the credentials"),
                },
            ));
        }
        info!(%url, "logged in");
        Ok(())
    }

    /// Sets a login field's value, typing it when the direct write does not stick.
    async fn fill(&self, target: &ElementHandle, value: &str) -> Result<(), ActionError> {
        let dom = &self.session.dom;
        if dom.set_field_value(target, value).await? && dom.read_text(target).await?.as_deref() == Some(value) {
            return Ok(());
        }
        debug!(token = %target.token, "direct write did not stick, typing");
        dom.activate(target).await?;
        dom.press_key(&KeyChord::select_all()).await?;
        for ch in value.chars() {
            dom.type_char(ch).await?;
            sleep(FIELD_KEYSTROKE_DELAY).await;
        }
        Ok(())
    }

    async fn locate(&self, stage: DriveStage, table: &action_locator::RoleTable) -> Result<Located, FlowError> {
        self.locator
            .locate(table)
            .await
            .map_err(|err| FlowError::step(stage, err.into_post_error(self.platform())))
    }

    async fn locate_compose(&mut self) -> Result<ComposeTargets, FlowError> {
        self.trace.enter(DriveStage::LocateCompose);
        match &self.profile.compose {
            ComposePlan::Single { body } => Ok(ComposeTargets {
                title: None,
                body: self.locate(DriveStage::LocateCompose, body).await?,
            }),
            ComposePlan::TitleBody { title, body } => {
                let title = self.locate(DriveStage::LocateCompose, title).await?;
                let body = self.locate(DriveStage::LocateCompose, body).await?;
                Ok(ComposeTargets {
                    title: Some(title),
                    body,
                })
            }
        }
    }

    async fn inject(&mut self, targets: &ComposeTargets) -> Result<InjectReport, FlowError> {
        self.trace.enter(DriveStage::Inject);
        let platform = self.platform();
        let injector = Injector::new(self.session.dom.clone()).with_policy(self.profile.inject.clone());
        let content = self.request.content.as_str();
        let body = match &targets.title {
            Some(title) => {
                let (title_text, body_text) = split_title_body(content);
                let report = injector
                    .inject(&title.handle, &title_text)
                    .await
                    .map_err(|err| FlowError::step(DriveStage::Inject, err.into_post_error(platform)))?;
                if body_text.trim().is_empty() {
                    info!("no body text, submitting a title-only post");
                    return Ok(report);
                }
                body_text
            }
            None => content.to_string(),
        };
        injector
            .inject(&targets.body.handle, &body)
            .await
            .map_err(|err| FlowError::step(DriveStage::Inject, err.into_post_error(platform)))
    }

    /// Clicks the submit control, or falls back to the profile's key chords.
    async fn submit(&mut self, compose: &Located) -> Result<(SubmitVia, Option<ElementHandle>), FlowError> {
        self.trace.enter(DriveStage::LocateSubmit);
        let profile = self.profile;
        let plan = &profile.submit;
        let platform = self.platform();
        let located = match self.locator.locate(&plan.table).await {
            Ok(located) => Some(located),
            Err(err) if !plan.key_fallbacks.is_empty() => {
                warn!(error = %err, "submit control not found, falling back to keys");
                None
            }
            Err(err) => return Err(FlowError::step(DriveStage::LocateSubmit, err.into_post_error(platform))),
        };

        self.trace.enter(DriveStage::Click);
        let dom = self.session.dom.clone();
        if let Some(located) = &located {
            match dom.click(&located.handle).await {
                Ok(true) => {
                    info!(strategy = located.strategy.name(), "submit clicked");
                    return Ok((
                        SubmitVia::Control {
                            strategy: located.strategy,
                        },
                        Some(located.handle.clone()),
                    ));
                }
                Ok(false) => warn!(token = %located.handle.token, "submit control refused the click"),
                Err(err) => warn!(error = %err, "submit click failed"),
            }
        }

        let handle = located.map(|located| located.handle);
        if !plan.key_fallbacks.is_empty() {
            if let Err(err) = dom.activate(&compose.handle).await {
                debug!(error = %err, "could not refocus the compose box");
            }
        }
        for burst in &plan.key_fallbacks {
            match self.press_burst(burst).await {
                Ok(()) => {
                    info!(chord = %burst.label(), "submitted with keys");
                    return Ok((SubmitVia::Keys { chord: burst.label() }, handle));
                }
                Err(err) => warn!(chord = %burst.label(), error = %err, "key submit failed"),
            }
        }
        Err(FlowError::step(
            DriveStage::Click,
            PostError::ElementNotFound {
                platform,
                role: plan.table.role.clone(),
            },
        ))
    }

    async fn press_burst(&self, burst: &KeyBurst) -> Result<(), ActionError> {
        for n in 0..burst.repeat {
            if n > 0 {
                sleep(burst.gap).await;
            }
            self.session.dom.press_key(&burst.chord).await?;
        }
        Ok(())
    }

    async fn verify(&mut self, compose: &ElementHandle, submit: Option<ElementHandle>) -> Result<Observation, FlowError> {
        self.trace.enter(DriveStage::Verify);
        let platform = self.platform();
        let spec = ExpectSpec::new(self.profile.destination.clone())
            .with_compose(compose.clone())
            .with_submit(submit)
            .with_submit_labels(self.profile.submit_labels.iter().cloned());
        let outcome = Verifier::new(self.session.dom.clone())
            .with_policy(self.profile.gate)
            .verify(&spec)
            .await
            .map_err(|err| {
                warn!(error = %err, "verifier could not run");
                FlowError::step(
                    DriveStage::Verify,
                    PostError::SubmissionUnverified {
                        platform,
                        observation: None,
                    },
                )
            })?;
        outcome
            .into_result(platform)
            .map_err(|err| FlowError::step(DriveStage::Verify, err))
    }
}

fn page_error(stage: DriveStage, err: ActionError) -> FlowError {
    FlowError::step(stage, PostError::BrowserUnavailable(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sites;
    use action_primitives::fake::{Effect, FakeDom, FakeElement};
    use action_primitives::DomPort;
    use async_trait::async_trait;
    use cdp_adapter::{PageSession, StoredCookie};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const LOGIN: &str = "https://www.linkedin.com/login";
    const FEED: &str = "https://www.linkedin.com/feed/";
    const CONTENT: &str = "Spring launch is live!\nRead more on our blog.";

    struct FakeFactory {
        dom: Arc<FakeDom>,
        opened: AtomicUsize,
    }

    impl FakeFactory {
        fn new(dom: FakeDom) -> Arc<Self> {
            Arc::new(Self {
                dom: Arc::new(dom),
                opened: AtomicUsize::new(0),
            })
        }

        fn opened(&self) -> usize {
            self.opened.load(Ordering::SeqCst)
        }
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

    fn linkedin_creds() -> Credentials {
        Credentials::new()
            .with("email", "ops@example.com")
            .with("password", "hunter2")
    }

    fn login_page(sign_in: FakeElement) -> Vec<FakeElement> {
        vec![
            FakeElement::new("email", "input").matches("#username"),
            FakeElement::new("password", "input")
                .matches("#password")
                .input_type("password"),
            sign_in,
        ]
    }

    fn sign_in_to(url: &str) -> FakeElement {
        FakeElement::new("sign-in", "button")
            .matches("button")
            .text("Sign in")
            .on_click(Effect::Navigate(url.into()))
    }

    fn editor() -> FakeElement {
        FakeElement::new("editor", "div")
            .matches(r#"div[contenteditable="true"][role="textbox"]"#)
            .rect(0.0, 100.0, 500.0, 120.0)
            .editable()
            .role("textbox")
            .placeholder("What do you want to talk about?")
    }

    fn post_button() -> FakeElement {
        FakeElement::new("post", "button")
            .matches("button")
            .rect(400.0, 240.0, 60.0, 30.0)
            .text("Post")
    }

    fn feed_page(post: FakeElement) -> Vec<FakeElement> {
        vec![editor(), post]
    }

    fn working_post() -> FakeElement {
        post_button()
            .on_click(Effect::SetText("editor".into(), String::new()))
            .on_click(Effect::Remove("post".into()))
    }

    fn request(platform: Platform, credentials: Credentials) -> PostRequest {
        PostRequest::new(platform, CONTENT, credentials)
    }

    #[tokio::test(start_paused = true)]
    async fn linkedin_post_is_verified_and_browser_closed() {
        let factory = FakeFactory::new(
            FakeDom::new()
                .page(LOGIN, login_page(sign_in_to(FEED)))
                .page(FEED, feed_page(working_post())),
        );
        let driver = SessionDriver::new(factory.clone());
        let report = driver
            .drive(&sites::linkedin(), &request(Platform::LinkedIn, linkedin_creds()))
            .await;

        assert!(report.is_done(), "{:?}", report.outcome);
        assert!(!report.left_open());
        let dom = &factory.dom;
        assert!(dom.is_closed());
        assert!(dom.left_open_reason().is_none());
        assert_eq!(dom.navigations(), vec![LOGIN, FEED, FEED]);

        let stages = report.trace.stages();
        assert_eq!(stages.first(), Some(&DriveStage::Start));
        assert!(!report.trace.visited(DriveStage::RestoreCookies));
        assert_eq!(stages.last(), Some(&DriveStage::Done));

        let result = report.into_post_result();
        assert!(result.success);
        assert_eq!(result.message, "Content posted to LinkedIn successfully");
        let data = result.data.unwrap();
        assert_eq!(data["mode"], "browser");
        assert_eq!(data["inject_method"], "exec_insert");
        assert_eq!(data["compose_strategy"], "primary");
        assert_eq!(data["submitted"]["via"], "control");
        assert_eq!(data["verification"]["held"], 4);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_credential_fails_before_launch() {
        let factory = FakeFactory::new(FakeDom::new().page(LOGIN, login_page(sign_in_to(FEED))));
        let driver = SessionDriver::new(factory.clone());
        let creds = Credentials::new().with("email", "ops@example.com");
        let result = driver.post(&request(Platform::LinkedIn, creds)).await;

        assert!(!result.success);
        assert_eq!(result.message, "Missing linkedin credential: password");
        assert_eq!(factory.opened(), 0);
        assert!(factory.dom.navigations().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn email_is_not_driven() {
        let factory = FakeFactory::new(FakeDom::new());
        let result = SessionDriver::new(factory.clone())
            .post(&request(Platform::Email, Credentials::new()))
            .await;
        assert!(!result.success);
        assert_eq!(factory.opened(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn still_on_login_page_is_authentication_failure() {
        let stuck = FakeElement::new("sign-in", "button").matches("button").text("Sign in");
        let factory = FakeFactory::new(FakeDom::new().page(LOGIN, login_page(stuck)));
        let report = SessionDriver::new(factory.clone())
            .drive(&sites::linkedin(), &request(Platform::LinkedIn, linkedin_creds()))
            .await;

        match &report.outcome {
            DriveOutcome::Failed {
                stage: DriveStage::ConfirmLoggedIn,
                error: PostError::AuthenticationFailed { .. },
            } => {}
            other => panic!("unexpected {other:?}"),
        }
        let dom = &factory.dom;
        assert!(!dom.is_closed());
        assert!(dom.left_open_reason().unwrap().contains("completed manually"));
        assert_eq!(dom.text_of("email").as_deref(), Some("ops@example.com"));
        assert_eq!(dom.text_of("password").as_deref(), Some("hunter2"));
        let result = report.into_post_result();
        assert_eq!(result.data.unwrap()["failed_stage"], "confirm_logged_in");
    }

    #[tokio::test(start_paused = true)]
    async fn missing_compose_box_leaves_browser_open() {
        let factory = FakeFactory::new(
            FakeDom::new()
                .page(LOGIN, login_page(sign_in_to(FEED)))
                .page(FEED, vec![post_button()]),
        );
        let report = SessionDriver::new(factory.clone())
            .drive(&sites::linkedin(), &request(Platform::LinkedIn, linkedin_creds()))
            .await;

        match &report.outcome {
            DriveOutcome::Failed {
                stage: DriveStage::LocateCompose,
                error: PostError::ElementNotFound { role, .. },
            } => assert_eq!(role, "compose box"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(report.left_open());
        assert!(factory.dom.left_open_reason().is_some());
        assert_eq!(factory.dom.clicks("post"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stubborn_post_button_is_unverified() {
        let factory = FakeFactory::new(
            FakeDom::new()
                .page(LOGIN, login_page(sign_in_to(FEED)))
                .page(FEED, feed_page(post_button())),
        );
        let settings = AutomationSettings {
            verify_attempts: Some(3),
            ..AutomationSettings::default()
        };
        let report = SessionDriver::new(factory.clone())
            .with_settings(settings)
            .drive(&sites::linkedin(), &request(Platform::LinkedIn, linkedin_creds()))
            .await;

        assert!(matches!(report.outcome, DriveOutcome::Unverified(_)));
        assert_eq!(report.trace.current(), Some(DriveStage::Unverified));
        // Initial click plus the verifier's single re-click.
        assert_eq!(factory.dom.clicks("post"), 2);
        assert!(!factory.dom.is_closed());

        let result = report.into_post_result();
        assert!(!result.success);
        assert!(result.message.contains("could not be verified"));
        let data = result.data.unwrap();
        assert_eq!(data["mode"], "browser");
        assert_eq!(data["verification"]["signals"]["submit_gone"], false);
    }

    #[tokio::test(start_paused = true)]
    async fn enter_submits_when_no_post_button_is_found() {
        let factory = FakeFactory::new(
            FakeDom::new()
                .page(LOGIN, login_page(sign_in_to(FEED)))
                .page(FEED, vec![editor()])
                .on_key("Enter", Effect::ClearEditables),
        );
        let report = SessionDriver::new(factory.clone())
            .drive(&sites::linkedin(), &request(Platform::LinkedIn, linkedin_creds()))
            .await;

        match &report.outcome {
            DriveOutcome::Done(summary) => assert_eq!(
                summary.submitted,
                SubmitVia::Keys {
                    chord: "Enter".into()
                }
            ),
            other => panic!("unexpected {other:?}"),
        }
        let enters = factory.dom.keys().iter().filter(|k| k.key == "Enter").count();
        assert_eq!(enters, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn navigation_failure_is_reported_with_url() {
        let factory = FakeFactory::new(FakeDom::new().failing_navigation());
        let report = SessionDriver::new(factory.clone())
            .drive(&sites::linkedin(), &request(Platform::LinkedIn, linkedin_creds()))
            .await;
        match &report.outcome {
            DriveOutcome::Failed {
                stage: DriveStage::NavigateLogin,
                error: PostError::NavigationFailed { url, .. },
            } => assert_eq!(url, LOGIN),
            other => panic!("unexpected {other:?}"),
        }
        assert!(factory.dom.left_open_reason().is_some());
    }

    fn session_cookie() -> StoredCookie {
        StoredCookie {
            name: "reddit_session".into(),
            value: "abc".into(),
            domain: ".reddit.com".into(),
            path: "/".into(),
            expires: None,
            http_only: true,
            secure: true,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn reddit_reuses_cookies_and_splits_title() {
        const SUBMIT: &str = "https://www.reddit.com/r/rust/submit";
        let dir = tempfile::tempdir().unwrap();
        let jar = CookieJar::new(dir.path());
        jar.save("reddit", &[session_cookie()]).await.unwrap();

        let title = FakeElement::new("title", "textarea").matches(r#"textarea[name="title"]"#);
        let body = FakeElement::new("body", "div")
            .matches(r#"div[contenteditable="true"]"#)
            .rect(0.0, 200.0, 600.0, 200.0)
            .editable();
        let submit = FakeElement::new("submit", "button")
            .matches(r#"button[type="submit"]"#)
            .input_type("submit")
            .text("Post")
            .on_click(Effect::SetText("body".into(), String::new()))
            .on_click(Effect::Remove("submit".into()))
            .on_click(Effect::SetUrl("https://www.reddit.com/r/rust/comments/abc123/spring/".into()));
        let factory = FakeFactory::new(FakeDom::new().page(SUBMIT, vec![title, body, submit]));

        let creds = Credentials::new()
            .with("username", "campaign_bot")
            .with("password", "hunter2")
            .with("subreddit", "rust");
        let report = SessionDriver::new(factory.clone())
            .with_cookie_jar(Some(jar))
            .drive(&sites::reddit(), &request(Platform::Reddit, creds))
            .await;

        assert!(report.is_done(), "{:?}", report.outcome);
        use DriveStage::*;
        assert_eq!(
            report.trace.stages(),
            vec![
                Start,
                RestoreCookies,
                NavigateCompose,
                ConfirmLoggedIn,
                LocateCompose,
                Inject,
                LocateSubmit,
                Click,
                Verify,
                Done
            ]
        );
        let dom = &factory.dom;
        assert_eq!(dom.navigations(), vec![SUBMIT]);
        assert_eq!(dom.stored_cookies(), vec![session_cookie()]);
        assert_eq!(dom.text_of("title").as_deref(), Some("Spring launch is live!"));

        let result = report.into_post_result();
        assert_eq!(result.message, "Content posted to r/rust successfully");
        assert_eq!(result.data.unwrap()["reused_cookies"], true);
    }

    fn reddit_creds() -> Credentials {
        Credentials::new()
            .with("username", "campaign_bot")
            .with("password", "hunter2")
            .with("subreddit", "rust")
    }

    fn reddit_submit_page() -> Vec<FakeElement> {
        let title = FakeElement::new("title", "textarea").matches(r#"textarea[name="title"]"#);
        let body = FakeElement::new("body", "div")
            .matches(r#"div[contenteditable="true"]"#)
            .rect(0.0, 200.0, 600.0, 200.0)
            .editable();
        let submit = FakeElement::new("submit", "button")
            .matches(r#"button[type="submit"]"#)
            .input_type("submit")
            .text("Post")
            .on_click(Effect::SetText("title".into(), String::new()))
            .on_click(Effect::Remove("submit".into()))
            .on_click(Effect::SetUrl("https://www.reddit.com/r/rust/comments/abc123/spring/".into()));
        vec![title, body, submit]
    }

    #[tokio::test(start_paused = true)]
    async fn reddit_title_only_post_skips_the_body() {
        const SUBMIT: &str = "https://www.reddit.com/r/rust/submit";
        let dir = tempfile::tempdir().unwrap();
        let jar = CookieJar::new(dir.path());
        jar.save("reddit", &[session_cookie()]).await.unwrap();

        for content in ["Spring launch is live!\n", "Spring launch is live!\n  \n"] {
            let factory = FakeFactory::new(FakeDom::new().page(SUBMIT, reddit_submit_page()));
            let report = SessionDriver::new(factory.clone())
                .with_cookie_jar(Some(jar.clone()))
                .drive(&sites::reddit(), &PostRequest::new(Platform::Reddit, content, reddit_creds()))
                .await;

            assert!(report.is_done(), "{content:?}: {:?}", report.outcome);
            assert_eq!(factory.dom.text_of("body").as_deref(), Some(""));
            assert_eq!(factory.dom.clicks("submit"), 1);
            assert!(factory.dom.is_closed());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn configured_default_subreddit_is_used_without_credential() {
        const SUBMIT: &str = "https://www.reddit.com/r/marketing/submit";
        let dir = tempfile::tempdir().unwrap();
        let jar = CookieJar::new(dir.path());
        jar.save("reddit", &[session_cookie()]).await.unwrap();

        let factory = FakeFactory::new(FakeDom::new().page(SUBMIT, reddit_submit_page()));
        let creds = Credentials::new()
            .with("username", "campaign_bot")
            .with("password", "hunter2");
        let report = SessionDriver::new(factory.clone())
            .with_cookie_jar(Some(jar))
            .with_default_subreddit("marketing")
            .drive(&sites::reddit(), &PostRequest::new(Platform::Reddit, "Launch\n", creds))
            .await;

        assert!(report.is_done(), "{:?}", report.outcome);
        assert_eq!(factory.dom.navigations(), vec![SUBMIT]);
        assert_eq!(report.into_post_result().message, "Content posted to r/marketing successfully");
    }

    #[tokio::test(start_paused = true)]
    async fn blank_title_line_fails_before_launch() {
        let factory = FakeFactory::new(FakeDom::new());
        let report = SessionDriver::new(factory.clone())
            .drive(
                &sites::reddit(),
                &PostRequest::new(Platform::Reddit, "  \nOnly a body", reddit_creds()),
            )
            .await;

        match &report.outcome {
            DriveOutcome::Failed {
                stage: DriveStage::Start,
                error: PostError::InjectionFailed { reason, .. },
            } => assert_eq!(reason, "title line is empty"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(factory.opened(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_login_refreshes_cookie_jar() {
        let dir = tempfile::tempdir().unwrap();
        let cookie = StoredCookie {
            name: "li_at".into(),
            domain: ".linkedin.com".into(),
            ..session_cookie()
        };
        let factory = FakeFactory::new(
            FakeDom::new()
                .page(LOGIN, login_page(sign_in_to(FEED)))
                .page(FEED, feed_page(working_post()))
                .with_cookies(vec![cookie.clone()]),
        );
        let report = SessionDriver::new(factory.clone())
            .with_cookie_jar(Some(CookieJar::new(dir.path())))
            .drive(&sites::linkedin(), &request(Platform::LinkedIn, linkedin_creds()))
            .await;

        assert!(report.is_done(), "{:?}", report.outcome);
        assert!(report.trace.visited(DriveStage::RestoreCookies));
        assert!(report.trace.visited(DriveStage::NavigateLogin));
        let saved = CookieJar::new(dir.path()).load("linkedin").await.unwrap();
        assert_eq!(saved, Some(vec![cookie]));
    }
}
