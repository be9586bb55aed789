use std::time::Duration;

use crate::model::InjectMethod;

#[derive(Clone, Debug)]
pub struct InjectPolicy {
    /// Methods in the order they are tried
    pub methods: Vec<InjectMethod>,
    /// Pause between a method and its read-back
    pub settle: Duration,
    /// Pause after select-all before typing
    pub select_all_pause: Duration,
    /// Pause between keystrokes
    pub keystroke_delay: Duration,
    /// Longest text the keystroke method will type
    pub max_keystroke_chars: usize,
    pub acceptance: Acceptance,
}

impl Default for InjectPolicy {
    fn default() -> Self {
        Self {
            methods: InjectMethod::ORDER.to_vec(),
            settle: Duration::from_millis(500),
            select_all_pause: Duration::from_millis(200),
            keystroke_delay: Duration::from_millis(20),
            max_keystroke_chars: 2000,
            acceptance: Acceptance::default(),
        }
    }
}

/// Read-back condition a method must meet to count as effective.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Acceptance {
    /// Leading characters of the expected text that must appear in the target
    pub prefix_chars: usize,
    /// Minimum characters the target must hold, capped at the expected length
    pub min_chars: usize,
}

impl Default for Acceptance {
    fn default() -> Self {
        Self {
            prefix_chars: 20,
            min_chars: 11,
        }
    }
}

impl Acceptance {
    /// Whether `observed` (read back from the page) shows that `expected` landed.
    ///
    /// Whitespace is collapsed on both sides first: rich-text and paste paths rewrite
    /// line breaks.
    pub fn accepts(&self, observed: &str, expected: &str) -> bool {
        let observed = collapse_whitespace(observed);
        let expected = collapse_whitespace(expected);
        if expected.is_empty() {
            return true;
        }
        let expected_len = expected.chars().count();
        if observed.chars().count() < self.min_chars.min(expected_len) {
            return false;
        }
        let prefix: String = expected.chars().take(self.prefix_chars).collect();
        observed.contains(&prefix)
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_prefix_match_across_reflowed_lines() {
        let rule = Acceptance::default();
        let expected = "Launching our spring campaign today!\nSee the details below.";
        assert!(rule.accepts("Launching our spring campaign today! See the details below.", expected));
        assert!(rule.accepts("  Launching  our spring\ncampaign today!", expected));
    }

    #[test]
    fn rejects_short_or_unrelated_content() {
        let rule = Acceptance::default();
        let expected = "Launching our spring campaign today!";
        assert!(!rule.accepts("", expected));
        assert!(!rule.accepts("Launching", expected));
        assert!(!rule.accepts("What do you want to talk about?", expected));
    }

    #[test]
    fn short_text_needs_only_its_own_length() {
        let rule = Acceptance::default();
        assert!(rule.accepts("Hi all", "Hi all"));
        assert!(!rule.accepts("Hi", "Hi all"));
    }

    #[test]
    fn defaults_try_every_method_in_order() {
        let policy = InjectPolicy::default();
        assert_eq!(policy.methods, InjectMethod::ORDER.to_vec());
        assert_eq!(policy.max_keystroke_chars, 2000);
    }
}
