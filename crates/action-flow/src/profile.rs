//! Per-site strategy tables consumed by the generic driver

use std::time::Duration;

use action_gate::{GatePolicy, UrlPattern};
use action_injector::InjectPolicy;
use action_locator::RoleTable;
use action_primitives::PollPolicy;
use campaignforge_core_types::{Credentials, Platform};
use cdp_adapter::KeyChord;
use serde::{Deserialize, Serialize};

/// Subreddit used when the request names none.
pub const DEFAULT_SUBREDDIT: &str = "test";

/// A login form field filled from one credential.
#[derive(Debug, Clone)]
pub struct LoginField {
    /// Accepted credential spellings, first one reported when all are missing
    pub keys: Vec<String>,
    pub table: RoleTable,
    /// Never logged or echoed
    pub secret: bool,
}

impl LoginField {
    pub fn new(keys: &[&str], table: RoleTable) -> Self {
        Self {
            keys: keys.iter().map(|key| key.to_string()).collect(),
            table,
            secret: false,
        }
    }

    pub fn secret(mut self) -> Self {
        self.secret = true;
        self
    }

    pub fn key_refs(&self) -> Vec<&str> {
        self.keys.iter().map(String::as_str).collect()
    }
}

/// URL shape that counts as logged in. A heuristic: the sites send no acknowledgment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggedInCheck {
    /// Any of these fragments present means logged in
    pub any_contains: Vec<String>,
    /// None of these present also means logged in
    pub none_contains: Vec<String>,
}

impl LoggedInCheck {
    pub fn is_logged_in(&self, url: &str) -> bool {
        let url = url.to_lowercase();
        if self.any_contains.iter().any(|fragment| url.contains(fragment.as_str())) {
            return true;
        }
        !self.none_contains.is_empty()
            && self
                .none_contains
                .iter()
                .all(|fragment| !url.contains(fragment.as_str()))
    }
}

#[derive(Debug, Clone)]
pub struct LoginPlan {
    pub url: String,
    pub fields: Vec<LoginField>,
    pub submit: RoleTable,
    /// Wait after the sign-in click before reading the URL
    pub settle: Duration,
    pub check: LoggedInCheck,
}

/// Compose elements a site needs filled.
#[derive(Debug, Clone)]
pub enum ComposePlan {
    /// One editor takes the whole content
    Single { body: RoleTable },
    /// First line goes to a title field, the remainder to the body
    TitleBody { title: RoleTable, body: RoleTable },
}

impl ComposePlan {
    pub fn body(&self) -> &RoleTable {
        match self {
            ComposePlan::Single { body } | ComposePlan::TitleBody { body, .. } => body,
        }
    }
}

/// A key chord pressed `repeat` times as a last-ditch submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBurst {
    pub chord: KeyChord,
    pub repeat: u32,
    pub gap: Duration,
}

impl KeyBurst {
    pub fn label(&self) -> String {
        if self.chord.modifiers & KeyChord::CTRL != 0 {
            format!("Ctrl+{}", self.chord.key)
        } else {
            self.chord.key.clone()
        }
    }
}

#[derive(Debug, Clone)]
pub struct SubmitPlan {
    pub table: RoleTable,
    /// Tried in order, only when no submit control could be located or clicked
    pub key_fallbacks: Vec<KeyBurst>,
}

/// Everything site-specific about a browser posting run.
#[derive(Debug, Clone)]
pub struct SiteProfile {
    pub platform: Platform,
    pub login: LoginPlan,
    /// May contain `{subreddit}`
    pub compose_url: String,
    /// Fills `{subreddit}` when the credentials name none
    pub default_subreddit: String,
    pub compose_settle: Duration,
    pub compose: ComposePlan,
    pub submit: SubmitPlan,
    pub destination: UrlPattern,
    /// Labels of controls that must be gone once the post went through
    pub submit_labels: Vec<String>,
    pub navigation_timeout: Duration,
    pub gate: GatePolicy,
    pub inject: InjectPolicy,
    /// May contain `{subreddit}`
    pub success_message: String,
}

impl SiteProfile {
    pub fn compose_url_for(&self, credentials: &Credentials) -> String {
        self.render(&self.compose_url, credentials)
    }

    pub fn success_message_for(&self, credentials: &Credentials) -> String {
        self.render(&self.success_message, credentials)
    }

    fn render(&self, template: &str, credentials: &Credentials) -> String {
        let subreddit = credentials
            .get("subreddit")
            .unwrap_or(self.default_subreddit.as_str())
            .trim()
            .trim_start_matches("r/");
        template.replace("{subreddit}", subreddit)
    }

    /// Every credential key set the login form needs, checked before anything launches.
    pub fn required_credentials(&self) -> Vec<Vec<&str>> {
        self.login.fields.iter().map(LoginField::key_refs).collect()
    }

    fn tables_mut(&mut self) -> Vec<&mut RoleTable> {
        let mut tables = vec![&mut self.submit.table];
        match &mut self.compose {
            ComposePlan::Single { body } => tables.push(body),
            ComposePlan::TitleBody { title, body } => {
                tables.push(title);
                tables.push(body);
            }
        }
        tables
    }
}

/// Timing overrides from the `automation` config section. Unset fields keep the
/// site's own values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationSettings {
    pub navigation_timeout_ms: Option<u64>,
    pub login_settle_ms: Option<u64>,
    pub compose_settle_ms: Option<u64>,
    pub locate_attempts: Option<u32>,
    pub locate_delay_ms: Option<u64>,
    pub verify_settle_ms: Option<u64>,
    pub verify_attempts: Option<u32>,
    pub verify_delay_ms: Option<u64>,
}

impl AutomationSettings {
    pub fn apply(&self, mut profile: SiteProfile) -> SiteProfile {
        if let Some(ms) = self.navigation_timeout_ms {
            profile.navigation_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.login_settle_ms {
            profile.login.settle = Duration::from_millis(ms);
        }
        if let Some(ms) = self.compose_settle_ms {
            profile.compose_settle = Duration::from_millis(ms);
        }
        if self.locate_attempts.is_some() || self.locate_delay_ms.is_some() {
            for table in profile.tables_mut() {
                table.primary = override_poll(table.primary, self.locate_attempts, self.locate_delay_ms);
            }
        }
        if let Some(ms) = self.verify_settle_ms {
            profile.gate.initial_settle = Duration::from_millis(ms);
        }
        profile.gate.poll = override_poll(profile.gate.poll, self.verify_attempts, self.verify_delay_ms);
        profile
    }
}

fn override_poll(policy: PollPolicy, attempts: Option<u32>, delay_ms: Option<u64>) -> PollPolicy {
    PollPolicy::new(
        attempts.unwrap_or(policy.max_attempts),
        delay_ms.map(Duration::from_millis).unwrap_or(policy.delay),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sites;

    #[test]
    fn logged_in_heuristic() {
        let check = LoggedInCheck {
            any_contains: vec!["feed".into(), "in/".into()],
            none_contains: vec!["login".into()],
        };
        assert!(check.is_logged_in("https://www.linkedin.com/feed/"));
        assert!(check.is_logged_in("https://www.linkedin.com/checkpoint/challenge"));
        assert!(!check.is_logged_in("https://www.linkedin.com/login?trk=guest"));
        assert!(!LoggedInCheck::default().is_logged_in("https://example.com"));
    }

    #[test]
    fn subreddit_is_substituted() {
        let profile = sites::reddit();
        let creds = Credentials::new().with("subreddit", "r/rust");
        assert_eq!(
            profile.compose_url_for(&creds),
            "https://www.reddit.com/r/rust/submit"
        );
        assert_eq!(
            profile.compose_url_for(&Credentials::new()),
            "https://www.reddit.com/r/test/submit"
        );
        assert_eq!(profile.success_message_for(&creds), "Content posted to r/rust successfully");
    }

    #[test]
    fn configured_default_subreddit_fills_the_url() {
        let profile = SiteProfile {
            default_subreddit: "r/marketing".into(),
            ..sites::reddit()
        };
        assert_eq!(
            profile.compose_url_for(&Credentials::new()),
            "https://www.reddit.com/r/marketing/submit"
        );
        let named = Credentials::new().with("subreddit", "rust");
        assert_eq!(profile.compose_url_for(&named), "https://www.reddit.com/r/rust/submit");
    }

    #[test]
    fn settings_override_only_what_is_set() {
        let settings = AutomationSettings {
            verify_attempts: Some(3),
            login_settle_ms: Some(100),
            ..AutomationSettings::default()
        };
        let base = sites::linkedin();
        let tuned = settings.apply(base.clone());
        assert_eq!(tuned.gate.poll.max_attempts, 3);
        assert_eq!(tuned.gate.poll.delay, base.gate.poll.delay);
        assert_eq!(tuned.login.settle, Duration::from_millis(100));
        assert_eq!(tuned.compose_settle, base.compose_settle);
        assert_eq!(tuned.compose.body().primary, base.compose.body().primary);
    }

    #[test]
    fn settings_parse_from_partial_yaml_like_json() {
        let settings: AutomationSettings =
            serde_json::from_str(r#"{ "locate_attempts": 4 }"#).unwrap();
        assert_eq!(settings.locate_attempts, Some(4));
        assert_eq!(settings.verify_attempts, None);
    }
}
