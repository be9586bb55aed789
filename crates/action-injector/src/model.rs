use serde::{Deserialize, Serialize};

/// One way of making text appear in a compose element.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InjectMethod {
    /// `execCommand('insertText')` on the focused element
    ExecInsert,
    /// Content replacement on the best visible editable plus synthetic input events
    ReplaceContent,
    /// `<br>`-separated HTML on the focused content-editable element
    RichText,
    /// Synthetic clipboard paste, falling back to content replacement
    Paste,
    /// Select-all then one real keystroke per character
    Keystrokes,
}

impl InjectMethod {
    /// Fixed priority order, least invasive first.
    pub const ORDER: [InjectMethod; 5] = [
        InjectMethod::ExecInsert,
        InjectMethod::ReplaceContent,
        InjectMethod::RichText,
        InjectMethod::Paste,
        InjectMethod::Keystrokes,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            InjectMethod::ExecInsert => "exec_insert",
            InjectMethod::ReplaceContent => "replace_content",
            InjectMethod::RichText => "rich_text",
            InjectMethod::Paste => "paste",
            InjectMethod::Keystrokes => "keystrokes",
        }
    }
}

/// What one method did, as seen by the read-back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MethodAttempt {
    pub method: InjectMethod,
    /// The page accepted the call (says nothing about the text landing)
    pub dispatched: bool,
    /// Characters read back from the target afterwards
    pub observed_chars: usize,
    pub accepted: bool,
}

/// Successful injection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InjectReport {
    pub method: InjectMethod,
    pub attempts: Vec<MethodAttempt>,
}

impl InjectReport {
    pub fn methods_tried(&self) -> usize {
        self.attempts.len()
    }
}
