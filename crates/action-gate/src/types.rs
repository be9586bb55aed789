//! Core types for the verifier

use action_primitives::EditableRegion;
use campaignforge_core_types::{Platform, PostError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw page state gathered in one observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageObservation {
    pub url: String,

    /// Text of the compose element; `None` when it is gone
    pub compose_text: Option<String>,

    /// The clicked submit control is still visible
    pub submit_visible: bool,

    /// Some control labelled like a submit button is still visible
    pub labelled_control_visible: bool,

    /// Large editable regions and their content
    pub regions: Vec<EditableRegion>,
}

/// The four signals, each evaluated on one observation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalSnapshot {
    pub on_destination: bool,
    pub compose_cleared: bool,
    pub submit_gone: bool,
    pub no_residual: bool,
}

impl SignalSnapshot {
    /// Verified only when every signal holds in the same observation.
    pub fn all_hold(&self) -> bool {
        self.on_destination && self.compose_cleared && self.submit_gone && self.no_residual
    }

    pub fn held_count(&self) -> usize {
        [
            self.on_destination,
            self.compose_cleared,
            self.submit_gone,
            self.no_residual,
        ]
        .iter()
        .filter(|held| **held)
        .count()
    }
}

/// One scored observation, kept as evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub attempt: u32,
    pub url: String,
    pub signals: SignalSnapshot,
    pub held: usize,
    pub observed_at: DateTime<Utc>,
}

/// Verifier verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GateOutcome {
    Verified {
        observation: Observation,
        reclicked: bool,
    },
    /// Attempts ran out without all four signals agreeing; the submission may still
    /// have gone through.
    Unverified {
        best: Option<Observation>,
        attempts: u32,
        reclicked: bool,
    },
}

impl GateOutcome {
    pub fn is_verified(&self) -> bool {
        matches!(self, GateOutcome::Verified { .. })
    }

    /// `Ok` with the verifying observation, or `SubmissionUnverified` carrying the best
    /// one seen.
    pub fn into_result(self, platform: Platform) -> Result<Observation, PostError> {
        match self {
            GateOutcome::Verified { observation, .. } => Ok(observation),
            GateOutcome::Unverified { best, .. } => Err(PostError::SubmissionUnverified {
                platform,
                observation: best.and_then(|obs| serde_json::to_value(obs).ok()),
            }),
        }
    }
}
