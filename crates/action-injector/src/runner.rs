use std::sync::Arc;

use action_primitives::{settle, ActionError, DomPort, ElementHandle};
use cdp_adapter::KeyChord;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use crate::errors::InjectError;
use crate::model::{InjectMethod, InjectReport, MethodAttempt};
use crate::policy::InjectPolicy;
use crate::redact;

/// Makes text appear in a compose element, trying each method until a read-back
/// confirms it.
pub struct Injector {
    dom: Arc<dyn DomPort>,
    policy: InjectPolicy,
}

impl Injector {
    pub fn new(dom: Arc<dyn DomPort>) -> Self {
        Self {
            dom,
            policy: InjectPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: InjectPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &InjectPolicy {
        &self.policy
    }

    /// Runs the configured methods in order against `target`.
    ///
    /// A method's own return value is never trusted; after each one the target is
    /// re-read and judged by [`crate::Acceptance`].
    #[instrument(skip_all, fields(target = %target.token, chars = text.chars().count()))]
    pub async fn inject(&self, target: &ElementHandle, text: &str) -> Result<InjectReport, InjectError> {
        if text.trim().is_empty() {
            return Err(InjectError::EmptyText);
        }
        debug!(preview = %redact::preview(text, 40), "injecting content");

        let mut current = target.clone();
        let mut attempts = Vec::with_capacity(self.policy.methods.len());
        for method in &self.policy.methods {
            let dispatched = match self.apply(*method, &mut current, text).await {
                Ok(dispatched) => dispatched,
                Err(err) => {
                    debug!(method = method.name(), error = %err, "method raised");
                    false
                }
            };
            settle(self.policy.settle).await;

            let observed = self.read_back(&current).await;
            let accepted = self.policy.acceptance.accepts(&observed, text);
            let observed_chars = observed.trim().chars().count();
            attempts.push(MethodAttempt {
                method: *method,
                dispatched,
                observed_chars,
                accepted,
            });
            if accepted {
                info!(method = method.name(), "content landed");
                return Ok(InjectReport {
                    method: *method,
                    attempts,
                });
            }
            debug!(method = method.name(), dispatched, observed_chars, "method did not take");
        }

        warn!(tried = attempts.len(), "every injection method failed read-back");
        Err(InjectError::Exhausted { attempts })
    }

    async fn apply(
        &self,
        method: InjectMethod,
        current: &mut ElementHandle,
        text: &str,
    ) -> Result<bool, ActionError> {
        match method {
            InjectMethod::ExecInsert => {
                self.ensure_focus(current).await?;
                self.dom.exec_insert_text(text).await
            }
            InjectMethod::ReplaceContent => match self.dom.replace_content(Some(current), text).await? {
                Some(written) => {
                    if written != *current {
                        debug!(from = %current.token, to = %written.token, "content replaced on another editable");
                        *current = written;
                    }
                    Ok(true)
                }
                None => Ok(false),
            },
            InjectMethod::RichText => {
                self.ensure_focus(current).await?;
                self.dom.replace_html_focused(&redact::rich_html(text)).await
            }
            InjectMethod::Paste => {
                self.ensure_focus(current).await?;
                self.dom.paste_focused(text).await
            }
            InjectMethod::Keystrokes => {
                self.ensure_focus(current).await?;
                self.type_out(text).await?;
                Ok(true)
            }
        }
    }

    async fn type_out(&self, text: &str) -> Result<(), ActionError> {
        self.dom.press_key(&KeyChord::select_all()).await?;
        sleep(self.policy.select_all_pause).await;
        let total = text.chars().count();
        if total > self.policy.max_keystroke_chars {
            warn!(total, typed = self.policy.max_keystroke_chars, "typing truncated");
        }
        for ch in text.chars().take(self.policy.max_keystroke_chars) {
            if ch == '\r' {
                continue;
            }
            self.dom.type_char(ch).await?;
            settle(self.policy.keystroke_delay).await;
        }
        Ok(())
    }

    async fn ensure_focus(&self, target: &ElementHandle) -> Result<(), ActionError> {
        let focused = self.dom.focused().await?;
        if focused.as_ref().map(|f| &f.handle) != Some(target) {
            self.dom.activate(target).await?;
        }
        Ok(())
    }

    async fn read_back(&self, target: &ElementHandle) -> String {
        match self.dom.read_text(target).await {
            Ok(Some(text)) => text,
            Ok(None) | Err(_) => self.dom.focused_text().await.ok().flatten().unwrap_or_default(),
        }
    }
}
