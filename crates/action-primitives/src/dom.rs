//! Element-level page surface.

use async_trait::async_trait;
use cdp_adapter::KeyChord;

use crate::errors::ActionError;
use crate::types::{Activation, CandidateFeatures, EditableRegion, ElementHandle, ProbeQuery, Rect};

/// Operations the locator, injector and verifier perform on a page.
///
/// Methods that write return whether the page accepted the call at all; none of them
/// claim the write took effect. Callers re-read state to find that out.
#[async_trait]
pub trait DomPort: Send + Sync {
    /// Tags and describes every visible element matching the query.
    async fn probe(&self, query: &ProbeQuery) -> Result<Vec<CandidateFeatures>, ActionError>;

    /// Scrolls into view, focuses and clicks.
    async fn activate(&self, target: &ElementHandle) -> Result<Activation, ActionError>;

    /// Clicks an enabled element; `false` when it is gone or disabled.
    async fn click(&self, target: &ElementHandle) -> Result<bool, ActionError>;

    /// Real mouse click at a viewport coordinate.
    async fn click_point(&self, x: f64, y: f64) -> Result<(), ActionError>;

    async fn press_key(&self, chord: &KeyChord) -> Result<(), ActionError>;

    async fn viewport(&self) -> Result<Rect, ActionError>;

    /// Describes `document.activeElement` when it is not the body.
    async fn focused(&self) -> Result<Option<CandidateFeatures>, ActionError>;

    /// Rendered text (or value for native text controls); `None` when the element is gone.
    async fn read_text(&self, target: &ElementHandle) -> Result<Option<String>, ActionError>;

    /// Text of the focused element, if any.
    async fn focused_text(&self) -> Result<Option<String>, ActionError>;

    async fn is_visible(&self, target: &ElementHandle) -> Result<bool, ActionError>;

    /// `document.execCommand('insertText')` on the focused element.
    async fn exec_insert_text(&self, text: &str) -> Result<bool, ActionError>;

    /// Replaces the content of `preferred` (or the best visible editable when that is
    /// unusable) and fires input, change, keyup, keydown and paste events. Returns the
    /// element that was written.
    async fn replace_content(
        &self,
        preferred: Option<&ElementHandle>,
        text: &str,
    ) -> Result<Option<ElementHandle>, ActionError>;

    /// Sets `innerHTML` of the focused content-editable element and fires `input`.
    async fn replace_html_focused(&self, html: &str) -> Result<bool, ActionError>;

    /// Dispatches a synthetic paste carrying `text`; falls back to a content replacement
    /// when the page ignores the event.
    async fn paste_focused(&self, text: &str) -> Result<bool, ActionError>;

    /// One real keystroke carrying `ch`.
    async fn type_char(&self, ch: char) -> Result<(), ActionError>;

    /// Native value setter plus input/change events, for form fields.
    async fn set_field_value(&self, target: &ElementHandle, value: &str) -> Result<bool, ActionError>;

    async fn current_url(&self) -> Result<String, ActionError>;

    /// Whether any visible button-like control has one of these labels (exact, lower-case).
    async fn visible_labelled_controls(&self, labels: &[String]) -> Result<bool, ActionError>;

    /// Content-editable and textarea regions strictly wider/taller than the given size.
    async fn editable_regions(
        &self,
        min_width: f64,
        min_height: f64,
    ) -> Result<Vec<EditableRegion>, ActionError>;
}
