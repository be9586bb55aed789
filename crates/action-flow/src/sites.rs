//! Strategy tables for the supported sites.
//!
//! Selectors and weights track the live markup as last observed; when a site changes
//! shape, this is the file to edit.

use std::time::Duration;

use action_gate::{GatePolicy, UrlPattern};
use action_injector::InjectPolicy;
use action_locator::{AcceptWhen, Fallback, Matcher, RoleTable, ScoreRules};
use action_primitives::PollPolicy;
use campaignforge_core_types::Platform;
use cdp_adapter::KeyChord;

use crate::errors::FlowError;
use crate::profile::{
    ComposePlan, KeyBurst, LoggedInCheck, LoginField, LoginPlan, SiteProfile, SubmitPlan, DEFAULT_SUBREDDIT,
};

const LINKEDIN_COMPOSE_SELECTORS: [&str; 22] = [
    r#"div[contenteditable="true"][role="textbox"]"#,
    r#"div[contenteditable="plaintext-only"][role="textbox"]"#,
    r#"div[contenteditable="true"]"#,
    r#"div[contenteditable="plaintext-only"]"#,
    r#"[contenteditable="true"]"#,
    r#"[contenteditable="plaintext-only"]"#,
    r#"[role="textbox"]"#,
    r#"div[role="textbox"]"#,
    r#"div[class*="share-box"]"#,
    r#"div[class*="shareBox"]"#,
    r#"div[class*="feed"]"#,
    r#"div[class*="compose"]"#,
    r#"div[class*="editor"]"#,
    r#"div[class*="text"]"#,
    r#"div[class*="input"]"#,
    "div[data-placeholder]",
    "div[aria-label]",
    r#"div[id*="share"]"#,
    r#"div[id*="post"]"#,
    r#"div[id*="compose"]"#,
    r#"div[data-control-name*="share"]"#,
    r#"div[data-control-name*="create"]"#,
];

const EDITABLE_SELECTORS: [&str; 2] = [r#"[contenteditable="true"]"#, r#"[contenteditable="plaintext-only"]"#];

/// Profile for `platform`, or `NoSiteProfile` for targets that never use a browser.
pub fn profile_for(platform: Platform) -> Result<SiteProfile, FlowError> {
    match platform {
        Platform::LinkedIn => Ok(linkedin()),
        Platform::Reddit => Ok(reddit()),
        Platform::Email => Err(FlowError::NoSiteProfile(platform)),
    }
}

/// Sign-in button found by its label; social sign-in buttons never qualify.
fn sign_in_button(labels: &[&str], role: &str) -> RoleTable {
    let mut rules = ScoreRules::default()
        .require_bonus()
        .skip_disabled()
        .exclude_text("with apple")
        .exclude_text("with google")
        .exclude_text("with microsoft");
    for label in labels {
        rules = rules.bonus(Matcher::TextEquals((*label).into()), 5000.0);
    }
    rules = rules.bonus(Matcher::SubmitType, 1000.0);
    RoleTable::new(role, ["button", "[type=submit]", "[role=button]"])
        .rules(rules)
        .top_k(10)
        .accept(AcceptWhen::Present)
        .primary(PollPolicy::new(3, Duration::from_secs(1)))
}

fn text_field(role: &str, selectors: &[&str]) -> RoleTable {
    RoleTable::new(role, selectors.iter().copied())
        .rules(ScoreRules::default().require(Matcher::AcceptsText).skip_disabled())
        .top_k(3)
        .primary(PollPolicy::new(5, Duration::from_secs(1)))
}

pub fn linkedin() -> SiteProfile {
    let compose_rules = ScoreRules::default()
        .bonus(Matcher::ContentEditable, 5000.0)
        .bonus(Matcher::Role("textbox".into()), 3000.0)
        .bonus(
            Matcher::Any(vec![
                Matcher::PlaceholderContains("what".into()),
                Matcher::PlaceholderContains("talk".into()),
            ]),
            2000.0,
        )
        .bonus(
            Matcher::Any(vec![
                Matcher::ClassContains("share".into()),
                Matcher::ClassContains("compose".into()),
                Matcher::ClassContains("feed".into()),
            ]),
            1000.0,
        )
        .bonus(
            Matcher::LargerThan {
                width: 300.0,
                height: 100.0,
            },
            500.0,
        );
    let compose = RoleTable::new("compose box", LINKEDIN_COMPOSE_SELECTORS)
        .rules(compose_rules)
        .min_size(20.0, 10.0)
        .top_k(5)
        .primary(PollPolicy::new(15, Duration::from_millis(500)))
        .fallback(Fallback::ContainerClick {
            containers: vec![
                r#"div[class*="share"]"#.into(),
                r#"div[class*="compose"]"#.into(),
                r#"div[class*="feed"]"#.into(),
            ],
            container_min: (400.0, 100.0),
            max_containers: 1,
            settle: Duration::from_secs(2),
            inner: EDITABLE_SELECTORS.iter().map(|s| s.to_string()).collect(),
            loose_min: (200.0, 50.0),
        })
        .fallback(Fallback::PhraseSearch {
            phrases: vec!["what do you want to talk about".into(), "start a post".into()],
            policy: PollPolicy::new(5, Duration::from_secs(1)),
        })
        .fallback(Fallback::ViewportPoint {
            x_ratio: 0.5,
            y_ratio: 1.0 / 3.0,
            settle: Duration::from_secs(2),
            selectors: vec![r#"[contenteditable="true"]"#.into()],
        })
        .fallback(Fallback::TabProbe {
            presses: 2,
            delay: Duration::from_millis(500),
        });

    let post_rules = ScoreRules::default()
        .bonus(Matcher::TextEquals("post".into()), 5000.0)
        .bonus(Matcher::TextEquals("share".into()), 4000.0)
        .bonus(Matcher::TextContains("post".into()), 3000.0)
        .bonus(Matcher::SubmitType, 2000.0)
        .bonus(Matcher::DataControlContains("share".into()), 1500.0)
        .bonus(Matcher::ClassContains("share".into()), 1000.0)
        .bonus(Matcher::ClassContains("post".into()), 1000.0)
        .require_bonus()
        .exclude_text("start a post")
        .exclude_text("view")
        .skip_disabled();
    let post_button = RoleTable::new(
        "post button",
        ["button", "[type=submit]", "[role=button]", "a", "span", "div"],
    )
    .rules(post_rules)
    .min_size(25.0, 8.0)
    .top_k(10)
    .accept(AcceptWhen::Present)
    .primary(PollPolicy::new(12, Duration::from_millis(500)))
    .fallback(Fallback::Selectors {
        selectors: vec![
            r#"button[data-control-name*="share"]"#.into(),
            r#"button[data-control-name*="post"]"#.into(),
            r#"form button[type="submit"]"#.into(),
            r#"form input[type="submit"]"#.into(),
        ],
        policy: PollPolicy::new(2, Duration::from_millis(500)),
    });

    SiteProfile {
        platform: Platform::LinkedIn,
        login: LoginPlan {
            url: "https://www.linkedin.com/login".into(),
            fields: vec![
                LoginField::new(
                    &["email", "username"],
                    text_field("email field", &["#username", "[name=session_key]"]),
                ),
                LoginField::new(
                    &["password"],
                    text_field("password field", &["#password", "[name=session_password]"]),
                )
                .secret(),
            ],
            submit: sign_in_button(&["sign in", "log in"], "sign-in button"),
            settle: Duration::from_secs(4),
            check: LoggedInCheck {
                any_contains: vec!["feed".into(), "linkedin.com/in/".into()],
                none_contains: vec!["login".into()],
            },
        },
        compose_url: "https://www.linkedin.com/feed/".into(),
        default_subreddit: DEFAULT_SUBREDDIT.into(),
        compose_settle: Duration::from_secs(5),
        compose: ComposePlan::Single { body: compose },
        submit: SubmitPlan {
            table: post_button,
            key_fallbacks: vec![
                KeyBurst {
                    chord: KeyChord::enter(),
                    repeat: 3,
                    gap: Duration::from_millis(300),
                },
                KeyBurst {
                    chord: KeyChord::ctrl_enter(),
                    repeat: 1,
                    gap: Duration::ZERO,
                },
            ],
        },
        destination: UrlPattern::Contains("/feed".into()),
        submit_labels: vec!["post".into(), "share".into()],
        navigation_timeout: Duration::from_secs(60),
        gate: GatePolicy::default(),
        inject: InjectPolicy::default(),
        success_message: "Content posted to LinkedIn successfully".into(),
    }
}

pub fn reddit() -> SiteProfile {
    let title = RoleTable::new(
        "title field",
        [
            r#"textarea[placeholder*="Title"]"#,
            r#"textarea[name="title"]"#,
            r#"input[name="title"]"#,
            r#"textarea[data-testid*="title"]"#,
            r#"div[contenteditable="true"][data-testid*="title"]"#,
        ],
    )
    .rules(ScoreRules::default().require(Matcher::AcceptsText))
    .top_k(3)
    .primary(PollPolicy::new(10, Duration::from_secs(1)));

    let body = RoleTable::new(
        "body editor",
        [
            r#"div[contenteditable="true"][data-testid*="text"]"#,
            r#"textarea[name="text"]"#,
            r#"textarea[placeholder*="Text"]"#,
            r#"div[contenteditable="true"]"#,
            r#"div[role="textbox"]"#,
        ],
    )
    .rules(
        ScoreRules::default()
            .require(Matcher::AcceptsText)
            .bonus(Matcher::ContentEditable, 2000.0)
            .bonus(Matcher::Role("textbox".into()), 1000.0)
            .exclude_text("title"),
    )
    .min_size(30.0, 15.0)
    .top_k(5)
    .primary(PollPolicy::new(10, Duration::from_secs(1)))
    .fallback(Fallback::TabProbe {
        presses: 2,
        delay: Duration::from_millis(500),
    });

    let submit = RoleTable::new(
        "submit button",
        [
            r#"button[type="submit"]"#,
            r#"button[data-testid*="submit"]"#,
            r#"form button[type="submit"]"#,
            "button",
        ],
    )
    .rules(
        ScoreRules::default()
            .bonus(Matcher::TextEquals("post".into()), 5000.0)
            .bonus(Matcher::TextEquals("submit".into()), 4000.0)
            .bonus(Matcher::SubmitType, 2000.0)
            .bonus(Matcher::DataControlContains("submit".into()), 1500.0)
            .require_bonus()
            .exclude_text("save draft")
            .skip_disabled(),
    )
    .top_k(10)
    .accept(AcceptWhen::Present)
    .primary(PollPolicy::new(10, Duration::from_millis(500)));

    SiteProfile {
        platform: Platform::Reddit,
        login: LoginPlan {
            url: "https://www.reddit.com/login".into(),
            fields: vec![
                LoginField::new(
                    &["username", "email"],
                    text_field(
                        "username field",
                        &[
                            "#loginUsername",
                            r#"input[name="username"]"#,
                            r#"input[id*="username"]"#,
                            r#"input[autocomplete="username"]"#,
                            r#"input[placeholder*="Username"]"#,
                            r#"input[type="text"]"#,
                        ],
                    ),
                ),
                LoginField::new(
                    &["password"],
                    text_field(
                        "password field",
                        &[
                            "#loginPassword",
                            r#"input[name="password"]"#,
                            r#"input[type="password"]"#,
                            r#"input[autocomplete="current-password"]"#,
                        ],
                    ),
                )
                .secret(),
            ],
            submit: sign_in_button(&["log in", "sign in", "login"], "log-in button"),
            settle: Duration::from_secs(5),
            check: LoggedInCheck {
                any_contains: Vec::new(),
                none_contains: vec!["/login".into()],
            },
        },
        compose_url: "https://www.reddit.com/r/{subreddit}/submit".into(),
        default_subreddit: DEFAULT_SUBREDDIT.into(),
        compose_settle: Duration::from_secs(2),
        compose: ComposePlan::TitleBody { title, body },
        submit: SubmitPlan {
            table: submit,
            key_fallbacks: Vec::new(),
        },
        destination: UrlPattern::Contains("/comments/".into()),
        submit_labels: vec!["post".into()],
        navigation_timeout: Duration::from_secs(30),
        gate: GatePolicy {
            initial_settle: Duration::from_secs(3),
            poll: PollPolicy::new(10, Duration::from_secs(2)),
            reclick_settle: Duration::from_secs(3),
        },
        inject: InjectPolicy::default(),
        success_message: "Content posted to r/{subreddit} successfully".into(),
    }
}
