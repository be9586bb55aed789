//! Core types for the locator: role tables, scoring rules and outcomes

use std::time::Duration;

use action_primitives::{CandidateFeatures, ElementHandle, PollPolicy};
use serde::{Deserialize, Serialize};

/// Strategy that produced a located element.
///
/// Strategies run in the order their fallbacks are listed in a [`RoleTable`], with
/// [`LocateStrategy::Primary`] always first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocateStrategy {
    /// The role's own selector family
    Primary,

    /// Click a large container, then search inside it
    ContainerClick,

    /// Full-document search for placeholder phrases
    PhraseSearch,

    /// Click a fixed viewport coordinate, then search again
    ViewportPoint,

    /// Tab through focus and test the focused element
    TabProbe,

    /// A secondary selector family
    Selectors,
}

impl LocateStrategy {
    /// Get strategy name as string
    pub fn name(&self) -> &'static str {
        match self {
            LocateStrategy::Primary => "primary",
            LocateStrategy::ContainerClick => "container-click",
            LocateStrategy::PhraseSearch => "phrase-search",
            LocateStrategy::ViewportPoint => "viewport-point",
            LocateStrategy::TabProbe => "tab-probe",
            LocateStrategy::Selectors => "selectors",
        }
    }
}

/// Predicate over a candidate's features.
#[derive(Debug, Clone, PartialEq)]
pub enum Matcher {
    ContentEditable,
    Role(String),
    PlaceholderContains(String),
    ClassContains(String),
    /// Strictly wider and taller than the given size
    LargerThan { width: f64, height: f64 },
    TextEquals(String),
    TextContains(String),
    SubmitType,
    DataControlContains(String),
    AcceptsText,
    /// Matches when any inner matcher does; its bonus counts once
    Any(Vec<Matcher>),
}

impl Matcher {
    pub fn matches(&self, candidate: &CandidateFeatures) -> bool {
        match self {
            Matcher::ContentEditable => candidate.content_editable,
            Matcher::Role(role) => candidate.has_role(role),
            Matcher::PlaceholderContains(word) => candidate.placeholder.contains(word.as_str()),
            Matcher::ClassContains(word) => candidate.class_name.contains(word.as_str()),
            Matcher::LargerThan { width, height } => candidate.rect.exceeds(*width, *height),
            Matcher::TextEquals(text) => candidate.text == *text,
            Matcher::TextContains(text) => candidate.text.contains(text.as_str()),
            Matcher::SubmitType => candidate.input_type.as_deref() == Some("submit"),
            Matcher::DataControlContains(word) => candidate
                .data_control
                .as_deref()
                .map(|name| name.to_lowercase().contains(word.as_str()))
                .unwrap_or(false),
            Matcher::AcceptsText => candidate.accepts_text(),
            Matcher::Any(matchers) => matchers.iter().any(|matcher| matcher.matches(candidate)),
        }
    }
}

/// Weighted scoring over rendered area plus matcher bonuses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreRules {
    /// Each matching entry adds its bonus to the base area
    pub bonuses: Vec<(Matcher, f64)>,
    /// Candidates must satisfy every one of these
    pub required: Vec<Matcher>,
    /// Candidates must earn at least one bonus
    pub require_bonus: bool,
    /// Lower-case text fragments that disqualify a candidate
    pub exclude_text: Vec<String>,
    /// Disabled controls score nothing
    pub skip_disabled: bool,
}

impl ScoreRules {
    pub fn bonus(mut self, matcher: Matcher, weight: f64) -> Self {
        self.bonuses.push((matcher, weight));
        self
    }

    pub fn require(mut self, matcher: Matcher) -> Self {
        self.required.push(matcher);
        self
    }

    pub fn require_bonus(mut self) -> Self {
        self.require_bonus = true;
        self
    }

    pub fn exclude_text(mut self, fragment: &str) -> Self {
        self.exclude_text.push(fragment.to_lowercase());
        self
    }

    pub fn skip_disabled(mut self) -> Self {
        self.skip_disabled = true;
        self
    }
}

/// What counts as having found the element once candidates are ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcceptWhen {
    /// Focus-and-click each candidate; accept the first that holds focus afterwards
    Focused,
    /// Accept the first ranked candidate that is still visible, without touching it
    Present,
}

/// Ordered fallback tried once every earlier strategy came back empty.
#[derive(Debug, Clone, PartialEq)]
pub enum Fallback {
    /// Click the largest matching containers, then re-search inside each one and,
    /// failing that, across the whole document with `loose_min` as the size floor.
    ContainerClick {
        containers: Vec<String>,
        container_min: (f64, f64),
        max_containers: usize,
        settle: Duration,
        inner: Vec<String>,
        loose_min: (f64, f64),
    },
    /// Any element whose text or placeholder contains one of the phrases.
    PhraseSearch {
        phrases: Vec<String>,
        policy: PollPolicy,
    },
    /// Real click at `(width * x_ratio, height * y_ratio)` of the viewport, then search.
    ViewportPoint {
        x_ratio: f64,
        y_ratio: f64,
        settle: Duration,
        selectors: Vec<String>,
    },
    /// Press Tab up to `presses` times and accept a focused element that takes text.
    TabProbe { presses: u32, delay: Duration },
    /// Another selector family scored with the role's rules.
    Selectors {
        selectors: Vec<String>,
        policy: PollPolicy,
    },
}

impl Fallback {
    pub fn strategy(&self) -> LocateStrategy {
        match self {
            Fallback::ContainerClick { .. } => LocateStrategy::ContainerClick,
            Fallback::PhraseSearch { .. } => LocateStrategy::PhraseSearch,
            Fallback::ViewportPoint { .. } => LocateStrategy::ViewportPoint,
            Fallback::TabProbe { .. } => LocateStrategy::TabProbe,
            Fallback::Selectors { .. } => LocateStrategy::Selectors,
        }
    }
}

/// Everything the locator knows about one semantic role on one site.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleTable {
    /// Semantic role name, used in logs and errors ("compose box", "submit control")
    pub role: String,
    /// Primary selector family, in priority order
    pub selectors: Vec<String>,
    pub rules: ScoreRules,
    /// Candidates must be strictly larger than this
    pub min_size: (f64, f64),
    /// How many ranked candidates are tried per pass
    pub top_k: usize,
    pub accept: AcceptWhen,
    /// Retry budget for the primary family
    pub primary: PollPolicy,
    pub fallbacks: Vec<Fallback>,
}

impl RoleTable {
    pub fn new<I, S>(role: &str, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            role: role.to_string(),
            selectors: selectors.into_iter().map(Into::into).collect(),
            rules: ScoreRules::default(),
            min_size: (0.0, 0.0),
            top_k: 5,
            accept: AcceptWhen::Focused,
            primary: PollPolicy::once(),
            fallbacks: Vec::new(),
        }
    }

    pub fn rules(mut self, rules: ScoreRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn min_size(mut self, width: f64, height: f64) -> Self {
        self.min_size = (width, height);
        self
    }

    pub fn top_k(mut self, k: usize) -> Self {
        self.top_k = k.max(1);
        self
    }

    pub fn accept(mut self, accept: AcceptWhen) -> Self {
        self.accept = accept;
        self
    }

    pub fn primary(mut self, policy: PollPolicy) -> Self {
        self.primary = policy;
        self
    }

    pub fn fallback(mut self, fallback: Fallback) -> Self {
        self.fallbacks.push(fallback);
        self
    }
}

/// A candidate that survived scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranked {
    pub features: CandidateFeatures,
    pub score: f64,
}

/// Successful locate outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Located {
    pub handle: ElementHandle,
    pub strategy: LocateStrategy,
    pub score: f64,
}
