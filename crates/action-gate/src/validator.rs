//! Post-submission verifier: bounded polling over four page signals

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use action_primitives::{poll_until, settle, ActionError, DomPort, PollPolicy};
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::conditions::{ExpectSpec, UrlMatcher};
use crate::errors::GateError;
use crate::evidence::{evaluate, record};
use crate::types::{GateOutcome, Observation, PageObservation};

/// Timing for one verification run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatePolicy {
    /// Wait after the submit click before the first observation
    pub initial_settle: Duration,
    pub poll: PollPolicy,
    /// Extra wait after the single re-click
    pub reclick_settle: Duration,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self {
            initial_settle: Duration::from_secs(8),
            poll: PollPolicy::new(15, Duration::from_secs(2)),
            reclick_settle: Duration::from_secs(3),
        }
    }
}

pub struct Verifier {
    dom: Arc<dyn DomPort>,
    policy: GatePolicy,
}

impl Verifier {
    pub fn new(dom: Arc<dyn DomPort>) -> Self {
        Self {
            dom,
            policy: GatePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: GatePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Polls until one observation has all four signals, re-clicking the submit control
    /// once if it is still visible.
    #[instrument(skip_all, fields(attempts = self.policy.poll.max_attempts))]
    pub async fn verify(&self, spec: &ExpectSpec) -> Result<GateOutcome, GateError> {
        let destination = spec.destination.compile()?;
        settle(self.policy.initial_settle).await;

        let best: Mutex<Option<Observation>> = Mutex::new(None);
        let reclicked = AtomicBool::new(false);

        let verified = poll_until(self.policy.poll, |attempt| {
            let destination = &destination;
            let best = &best;
            let reclicked = &reclicked;
            async move {
                let page = match self.observe(spec).await {
                    Ok(page) => page,
                    Err(err) => {
                        debug!(attempt, error = %err, "observation failed");
                        return None;
                    }
                };
                let observation = self.score(attempt, spec, destination, &page);
                if observation.signals.all_hold() {
                    return Some(observation);
                }
                debug!(attempt, signals = ?observation.signals, "not all signals hold");
                {
                    let mut best = best.lock();
                    if best.as_ref().map(|b| observation.held > b.held).unwrap_or(true) {
                        *best = Some(observation);
                    }
                }
                if page.submit_visible && !reclicked.swap(true, Ordering::SeqCst) {
                    self.reclick(spec).await;
                }
                None
            }
        })
        .await;

        let reclicked = reclicked.load(Ordering::SeqCst);
        match verified {
            Some(observation) => {
                info!(attempt = observation.attempt, reclicked, "submission verified");
                Ok(GateOutcome::Verified {
                    observation,
                    reclicked,
                })
            }
            None => {
                let best = best.into_inner();
                warn!(
                    best_held = best.as_ref().map(|b| b.held).unwrap_or(0),
                    reclicked,
                    "submission unverified"
                );
                Ok(GateOutcome::Unverified {
                    best,
                    attempts: self.policy.poll.max_attempts,
                    reclicked,
                })
            }
        }
    }

    fn score(&self, attempt: u32, spec: &ExpectSpec, destination: &UrlMatcher, page: &PageObservation) -> Observation {
        record(attempt, page, evaluate(spec, destination, page))
    }

    /// Gathers the raw state the four signals are computed from.
    pub async fn observe(&self, spec: &ExpectSpec) -> Result<PageObservation, ActionError> {
        let url = self.dom.current_url().await?;
        let compose_text = match &spec.compose {
            Some(handle) => self.dom.read_text(handle).await?,
            None => None,
        };
        let submit_visible = match &spec.submit {
            Some(handle) => self.dom.is_visible(handle).await?,
            None => false,
        };
        let labelled_control_visible = if spec.submit_labels.is_empty() {
            false
        } else {
            self.dom.visible_labelled_controls(&spec.submit_labels).await?
        };
        let regions = self
            .dom
            .editable_regions(spec.residual.min_width, spec.residual.min_height)
            .await?;
        Ok(PageObservation {
            url,
            compose_text,
            submit_visible,
            labelled_control_visible,
            regions,
        })
    }

    async fn reclick(&self, spec: &ExpectSpec) {
        let Some(handle) = &spec.submit else {
            return;
        };
        info!(token = %handle.token, "submit control still visible, clicking once more");
        match self.dom.click(handle).await {
            Ok(clicked) => debug!(clicked, "re-click issued"),
            Err(err) => debug!(error = %err, "re-click failed"),
        }
        settle(self.policy.reclick_settle).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::UrlPattern;
    use action_primitives::fake::{Effect, FakeDom, FakeElement};
    use action_primitives::ElementHandle;
    use tokio::time::Instant;

    const FEED: &str = "https://www.linkedin.com/feed/";

    fn spec() -> ExpectSpec {
        ExpectSpec::new(UrlPattern::Contains("/feed".into()))
            .with_compose(ElementHandle::new("editor"))
            .with_submit(Some(ElementHandle::new("post")))
            .with_submit_labels(["post", "share"])
    }

    fn editor(text: &str) -> FakeElement {
        FakeElement::new("editor", "div")
            .rect(0.0, 100.0, 500.0, 120.0)
            .editable()
            .text(text)
    }

    fn post_button() -> FakeElement {
        FakeElement::new("post", "button").text("Post")
    }

    fn quick() -> GatePolicy {
        GatePolicy {
            initial_settle: Duration::from_secs(8),
            poll: PollPolicy::new(4, Duration::from_secs(2)),
            reclick_settle: Duration::from_secs(3),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn verified_when_page_settles() {
        let dom = Arc::new(FakeDom::new().at(FEED).with_elements(vec![editor("")]));
        let started = Instant::now();
        let outcome = Verifier::new(dom).with_policy(quick()).verify(&spec()).await.unwrap();
        assert!(outcome.is_verified());
        assert_eq!(started.elapsed(), Duration::from_secs(8));
    }

    #[tokio::test(start_paused = true)]
    async fn three_signals_never_verify() {
        // Everything clears except a leftover "Post" button.
        let dom = Arc::new(FakeDom::new().at(FEED).with_elements(vec![
            editor(""),
            FakeElement::new("other-post", "button").text("Post"),
        ]));
        let outcome = Verifier::new(dom).with_policy(quick()).verify(&spec()).await.unwrap();
        match outcome {
            GateOutcome::Unverified {
                best: Some(best),
                attempts,
                reclicked,
            } => {
                assert_eq!(attempts, 4);
                assert_eq!(best.held, 3);
                assert!(!best.signals.submit_gone);
                assert!(!reclicked);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn visible_submit_is_reclicked_once() {
        let dom = Arc::new(FakeDom::new().at(FEED).with_elements(vec![
            editor("Spring launch is live!"),
            post_button()
                .on_click(Effect::SetText("editor".into(), String::new()))
                .on_click(Effect::Remove("post".into())),
        ]));
        let outcome = Verifier::new(dom.clone()).with_policy(quick()).verify(&spec()).await.unwrap();
        match outcome {
            GateOutcome::Verified { observation, reclicked } => {
                assert!(reclicked);
                assert_eq!(observation.attempt, 2);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(dom.clicks("post"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stubborn_submit_is_not_clicked_twice() {
        let dom = Arc::new(FakeDom::new().at(FEED).with_elements(vec![editor("Spring launch"), post_button()]));
        let outcome = Verifier::new(dom.clone()).with_policy(quick()).verify(&spec()).await.unwrap();
        assert!(!outcome.is_verified());
        assert_eq!(dom.clicks("post"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn wrong_destination_stays_unverified() {
        let dom = Arc::new(FakeDom::new().at("https://www.linkedin.com/checkpoint/challenge").with_elements(vec![editor("")]));
        let outcome = Verifier::new(dom).with_policy(quick()).verify(&spec()).await.unwrap();
        match outcome {
            GateOutcome::Unverified { best: Some(best), .. } => {
                assert!(!best.signals.on_destination);
                assert_eq!(best.held, 3);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
