//! Core data types for DOM interaction

use serde::{Deserialize, Serialize};

/// Attribute used to tag elements the engine has looked at.
pub const ANCHOR_ATTR: &str = "data-campaignforge-anchor";

/// Rendered bounding box in CSS pixels, viewport relative.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    pub fn exceeds(&self, width: f64, height: f64) -> bool {
        self.width > width && self.height > height
    }

    pub fn in_viewport(&self) -> bool {
        self.x >= 0.0 && self.y >= 0.0
    }
}

/// Reference to an element that has been tagged in the page.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle {
    pub token: String,
}

impl ElementHandle {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn selector(&self) -> String {
        format!(r#"[{}="{}"]"#, ANCHOR_ATTR, self.token)
    }
}

/// Everything scoring needs to know about one matched element.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CandidateFeatures {
    pub handle: ElementHandle,
    /// Selector or strategy that surfaced the element
    pub source: String,
    pub tag: String,
    pub rect: Rect,
    pub content_editable: bool,
    #[serde(default)]
    pub role: Option<String>,
    /// Lower-cased placeholder, aria-placeholder, data-placeholder and aria-label
    #[serde(default)]
    pub placeholder: String,
    #[serde(default)]
    pub class_name: String,
    /// Lower-cased trimmed visible text (truncated)
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub data_control: Option<String>,
    #[serde(default)]
    pub input_type: Option<String>,
    #[serde(default)]
    pub disabled: bool,
}

impl CandidateFeatures {
    pub fn has_role(&self, role: &str) -> bool {
        self.role
            .as_deref()
            .map(|value| value.eq_ignore_ascii_case(role))
            .unwrap_or(false)
    }

    /// Content-editable, a textbox role, or a native text control.
    pub fn accepts_text(&self) -> bool {
        self.content_editable
            || self.has_role("textbox")
            || self.tag == "textarea"
            || (self.tag == "input"
                && !matches!(
                    self.input_type.as_deref(),
                    Some("button" | "submit" | "checkbox" | "radio" | "hidden")
                ))
    }
}

/// What to look for in one probe.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeQuery {
    pub selectors: Vec<String>,
    /// Restrict the search to descendants of this element
    pub scope: Option<ElementHandle>,
    /// Also match any element whose text or placeholder contains one of these
    pub text_phrases: Vec<String>,
    /// Elements must be strictly larger than this
    pub min_width: f64,
    pub min_height: f64,
    /// Drop elements whose top/left lie outside the viewport
    pub in_viewport: bool,
}

impl ProbeQuery {
    pub fn selectors<I, S>(selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            selectors: selectors.into_iter().map(Into::into).collect(),
            in_viewport: true,
            ..Self::default()
        }
    }

    pub fn phrases<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            text_phrases: phrases
                .into_iter()
                .map(|phrase| phrase.into().to_lowercase())
                .collect(),
            in_viewport: true,
            ..Self::default()
        }
    }

    pub fn min_size(mut self, width: f64, height: f64) -> Self {
        self.min_width = width;
        self.min_height = height;
        self
    }

    pub fn within(mut self, scope: ElementHandle) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn anywhere(mut self) -> Self {
        self.in_viewport = false;
        self
    }
}

/// Result of focusing and clicking an element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activation {
    /// The element still existed
    pub found: bool,
    /// The element itself, or one of its descendants, holds focus afterwards
    pub focused: bool,
}

/// Large editable area and what it currently contains.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EditableRegion {
    pub rect: Rect,
    pub text: String,
}

impl EditableRegion {
    pub fn trimmed_len(&self) -> usize {
        self.text.trim().chars().count()
    }
}
