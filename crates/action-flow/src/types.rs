//! Core types for the session driver: stages, the recorded path and the run outcome

use std::fmt;

use action_gate::Observation;
use action_injector::InjectMethod;
use action_locator::LocateStrategy;
use campaignforge_core_types::{Platform, PostError, PostResult, SessionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// One state of the per-site driver.
///
/// The same machine runs for every site; only the profile tables differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriveStage {
    Start,
    RestoreCookies,
    NavigateLogin,
    AuthenticateFill,
    AuthenticateSubmit,
    ConfirmLoggedIn,
    NavigateCompose,
    LocateCompose,
    Inject,
    LocateSubmit,
    Click,
    Verify,
    Done,
    Unverified,
    Failed,
}

impl DriveStage {
    pub fn name(&self) -> &'static str {
        match self {
            DriveStage::Start => "start",
            DriveStage::RestoreCookies => "restore_cookies",
            DriveStage::NavigateLogin => "navigate_login",
            DriveStage::AuthenticateFill => "authenticate_fill",
            DriveStage::AuthenticateSubmit => "authenticate_submit",
            DriveStage::ConfirmLoggedIn => "confirm_logged_in",
            DriveStage::NavigateCompose => "navigate_compose",
            DriveStage::LocateCompose => "locate_compose",
            DriveStage::Inject => "inject",
            DriveStage::LocateSubmit => "locate_submit",
            DriveStage::Click => "click",
            DriveStage::Verify => "verify",
            DriveStage::Done => "done",
            DriveStage::Unverified => "unverified",
            DriveStage::Failed => "failed",
        }
    }

    /// Stages that may follow this one.
    pub fn successors(&self) -> &'static [DriveStage] {
        use DriveStage::*;
        match self {
            Start => &[RestoreCookies, NavigateLogin, Failed],
            RestoreCookies => &[NavigateCompose, NavigateLogin, Failed],
            NavigateLogin => &[AuthenticateFill, Failed],
            AuthenticateFill => &[AuthenticateSubmit, Failed],
            AuthenticateSubmit => &[ConfirmLoggedIn, Failed],
            // Restored cookies either hold (straight to compose) or send us back to login.
            ConfirmLoggedIn => &[NavigateCompose, LocateCompose, NavigateLogin, Failed],
            NavigateCompose => &[ConfirmLoggedIn, LocateCompose, Failed],
            LocateCompose => &[Inject, Failed],
            Inject => &[LocateSubmit, Failed],
            LocateSubmit => &[Click, Failed],
            Click => &[Verify, Failed],
            Verify => &[Done, Unverified, Failed],
            Done | Unverified | Failed => &[],
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DriveStage::Done | DriveStage::Unverified | DriveStage::Failed)
    }

    pub fn can_enter(&self, next: DriveStage) -> bool {
        self.successors().contains(&next)
    }
}

impl fmt::Display for DriveStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Entry into one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: DriveStage,
    pub entered_at: DateTime<Utc>,
}

/// Path the driver actually took, in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StageTrace {
    records: Vec<StageRecord>,
}

impl StageTrace {
    pub fn new() -> Self {
        Self {
            records: vec![StageRecord {
                stage: DriveStage::Start,
                entered_at: Utc::now(),
            }],
        }
    }

    /// Records a transition. Transitions outside the state machine are a driver bug.
    pub fn enter(&mut self, stage: DriveStage) {
        if let Some(current) = self.current() {
            if current == stage {
                return;
            }
            debug_assert!(current.can_enter(stage), "illegal transition {current} -> {stage}");
        }
        tracing::debug!(stage = %stage, "entering stage");
        self.records.push(StageRecord {
            stage,
            entered_at: Utc::now(),
        });
    }

    pub fn current(&self) -> Option<DriveStage> {
        self.records.last().map(|record| record.stage)
    }

    pub fn stages(&self) -> Vec<DriveStage> {
        self.records.iter().map(|record| record.stage).collect()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.records.iter().map(|record| record.stage.name()).collect()
    }

    pub fn visited(&self, stage: DriveStage) -> bool {
        self.records.iter().any(|record| record.stage == stage)
    }
}

/// How the submission was triggered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "via", rename_all = "snake_case")]
pub enum SubmitVia {
    Control { strategy: LocateStrategy },
    Keys { chord: String },
}

/// What a verified run did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriveSummary {
    pub compose_strategy: LocateStrategy,
    pub inject_method: InjectMethod,
    pub submitted: SubmitVia,
    pub reused_cookies: bool,
    pub verification: Observation,
}

/// Terminal state of one drive.
#[derive(Debug, Clone)]
pub enum DriveOutcome {
    Done(DriveSummary),
    /// Submitted, but the four signals never agreed; carries `SubmissionUnverified`
    Unverified(PostError),
    Failed { stage: DriveStage, error: PostError },
}

impl DriveOutcome {
    pub fn terminal_stage(&self) -> DriveStage {
        match self {
            DriveOutcome::Done(_) => DriveStage::Done,
            DriveOutcome::Unverified(_) => DriveStage::Unverified,
            DriveOutcome::Failed { .. } => DriveStage::Failed,
        }
    }
}

/// Everything one drive produced.
#[derive(Debug, Clone)]
pub struct DriveReport {
    pub platform: Platform,
    /// `None` when the run failed before a browser was launched
    pub session: Option<SessionId>,
    pub trace: StageTrace,
    pub outcome: DriveOutcome,
    pub success_message: String,
}

impl DriveReport {
    pub fn is_done(&self) -> bool {
        matches!(self.outcome, DriveOutcome::Done(_))
    }

    /// Whether the browser was parked for an operator rather than closed.
    pub fn left_open(&self) -> bool {
        match &self.outcome {
            DriveOutcome::Done(_) => false,
            DriveOutcome::Unverified(_) => true,
            DriveOutcome::Failed { .. } => self.session.is_some(),
        }
    }

    pub fn into_post_result(self) -> PostResult {
        let stages = self.trace.names();
        match self.outcome {
            DriveOutcome::Done(summary) => PostResult::ok(self.success_message).with_data(json!({
                "mode": "browser",
                "session": self.session,
                "stages": stages,
                "compose_strategy": summary.compose_strategy.name(),
                "inject_method": summary.inject_method.name(),
                "submitted": summary.submitted,
                "reused_cookies": summary.reused_cookies,
                "verification": summary.verification,
            })),
            DriveOutcome::Unverified(error) => {
                let mut result = PostResult::from(error);
                let data = result.data.get_or_insert_with(|| json!({}));
                data["mode"] = json!("browser");
                data["stages"] = json!(stages);
                result
            }
            DriveOutcome::Failed { stage, error } => {
                let mut result = PostResult::from(error);
                result.data = Some(json!({
                    "mode": "browser",
                    "failed_stage": stage.name(),
                    "stages": stages,
                }));
                result
            }
        }
    }
}
