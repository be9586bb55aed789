//! The page surface the automation layers drive.
//!
//! Element queries and bounding geometry are expressed as page scripts through
//! [`PageSession::evaluate_script`]; only navigation, raw input and cookies need dedicated
//! protocol calls.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use campaignforge_core_types::SessionId;

use crate::cookies::StoredCookie;
use crate::error::AdapterError;

/// Completion condition for a navigation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitGate {
    /// Return as soon as the navigation is committed
    Committed,
    /// Wait until `document.readyState` leaves `loading`
    DomReady,
    /// Wait for the load event
    Load,
}

/// A single key press, optionally with modifiers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyChord {
    pub key: String,
    pub code: String,
    pub key_code: i64,
    /// CDP modifier bitmask: Alt=1, Ctrl=2, Meta=4, Shift=8
    pub modifiers: i64,
    pub text: Option<String>,
}

impl KeyChord {
    pub const CTRL: i64 = 2;

    pub fn enter() -> Self {
        Self {
            key: "Enter".into(),
            code: "Enter".into(),
            key_code: 13,
            modifiers: 0,
            text: Some("\r".into()),
        }
    }

    pub fn tab() -> Self {
        Self {
            key: "Tab".into(),
            code: "Tab".into(),
            key_code: 9,
            modifiers: 0,
            text: None,
        }
    }

    pub fn backspace() -> Self {
        Self {
            key: "Backspace".into(),
            code: "Backspace".into(),
            key_code: 8,
            modifiers: 0,
            text: None,
        }
    }

    pub fn select_all() -> Self {
        Self {
            key: "a".into(),
            code: "KeyA".into(),
            key_code: 65,
            modifiers: Self::CTRL,
            text: None,
        }
    }

    pub fn ctrl_enter() -> Self {
        Self {
            modifiers: Self::CTRL,
            text: None,
            ..Self::enter()
        }
    }
}

/// One exclusive page inside one browser, owned by one driver run.
#[async_trait]
pub trait PageSession: Send + Sync {
    fn id(&self) -> &SessionId;

    async fn navigate(&self, url: &str, gate: WaitGate, deadline: Duration)
        -> Result<(), AdapterError>;

    async fn evaluate_script(&self, expression: &str) -> Result<Value, AdapterError>;

    async fn current_url(&self) -> Result<String, AdapterError>;

    async fn press_key(&self, chord: &KeyChord) -> Result<(), AdapterError>;

    /// `Input.insertText` into whatever currently has focus.
    async fn insert_text(&self, text: &str) -> Result<(), AdapterError>;

    /// One printable character as a keyDown/keyUp pair.
    async fn type_char(&self, ch: char) -> Result<(), AdapterError>;

    async fn click_at(&self, x: f64, y: f64) -> Result<(), AdapterError>;

    async fn cookies(&self) -> Result<Vec<StoredCookie>, AdapterError>;

    async fn set_cookies(&self, cookies: &[StoredCookie]) -> Result<(), AdapterError>;

    /// Tears down the page and its browser.
    async fn close(&self) -> Result<(), AdapterError>;

    /// Parks the browser in the keep-alive registry so it outlives this handle.
    fn leave_open(&self, reason: &str);
}

#[cfg(test)]
mod tests {
    use super::KeyChord;

    #[test]
    fn ctrl_enter_carries_modifier_without_text() {
        let chord = KeyChord::ctrl_enter();
        assert_eq!(chord.key, "Enter");
        assert_eq!(chord.modifiers, KeyChord::CTRL);
        assert!(chord.text.is_none());
        assert_eq!(KeyChord::enter().modifiers, 0);
    }
}
