//! In-memory page model for tests.
//!
//! [`FakeDom`] implements both [`DomPort`] and [`PageSession`] over a tiny element table
//! so locator, injector, verifier and driver logic can be exercised without a browser.
//! Pages are registered per URL; navigating (or a click with [`Effect::Navigate`]) swaps
//! the element table.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use campaignforge_core_types::SessionId;
use cdp_adapter::{AdapterError, AdapterErrorKind, KeyChord, PageSession, StoredCookie, WaitGate};
use parking_lot::Mutex;
use serde_json::Value;

use crate::dom::DomPort;
use crate::errors::ActionError;
use crate::types::{Activation, CandidateFeatures, EditableRegion, ElementHandle, ProbeQuery, Rect};

/// Page reaction to a click, key press or viewport click.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    Navigate(String),
    /// Client-side route change: the URL moves, the element table stays
    SetUrl(String),
    Focus(String),
    Show(String),
    Hide(String),
    Remove(String),
    SetText(String, String),
    ClearEditables,
}

/// How the fake page responds to one injection technique.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MethodBehavior {
    Works,
    /// Call reports success but nothing changes
    Ignored,
    /// Only the first N characters land
    Truncates(usize),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InjectBehavior {
    pub exec_insert: MethodBehavior,
    pub replace_content: MethodBehavior,
    pub rich_text: MethodBehavior,
    pub paste: MethodBehavior,
    pub typing: MethodBehavior,
}

impl Default for InjectBehavior {
    fn default() -> Self {
        Self {
            exec_insert: MethodBehavior::Works,
            replace_content: MethodBehavior::Works,
            rich_text: MethodBehavior::Works,
            paste: MethodBehavior::Works,
            typing: MethodBehavior::Works,
        }
    }
}

impl InjectBehavior {
    pub fn all(behavior: MethodBehavior) -> Self {
        Self {
            exec_insert: behavior,
            replace_content: behavior,
            rich_text: behavior,
            paste: behavior,
            typing: behavior,
        }
    }
}

#[derive(Clone, Debug)]
pub struct FakeElement {
    pub features: CandidateFeatures,
    pub selectors: Vec<String>,
    pub parent: Option<String>,
    pub visible: bool,
    pub focusable: bool,
    pub text: String,
    pub on_click: Vec<Effect>,
}

impl FakeElement {
    pub fn new(token: &str, tag: &str) -> Self {
        Self {
            features: CandidateFeatures {
                handle: ElementHandle::new(token),
                source: String::new(),
                tag: tag.to_string(),
                rect: Rect::new(10.0, 10.0, 100.0, 30.0),
                content_editable: false,
                role: None,
                placeholder: String::new(),
                class_name: String::new(),
                text: String::new(),
                data_control: None,
                input_type: None,
                disabled: false,
            },
            selectors: Vec::new(),
            parent: None,
            visible: true,
            focusable: matches!(tag, "input" | "textarea" | "button" | "a"),
            text: String::new(),
            on_click: Vec::new(),
        }
    }

    pub fn token(&self) -> &str {
        &self.features.handle.token
    }

    pub fn matches(mut self, selector: &str) -> Self {
        self.selectors.push(selector.to_string());
        self
    }

    pub fn rect(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.features.rect = Rect::new(x, y, width, height);
        self
    }

    pub fn editable(mut self) -> Self {
        self.features.content_editable = true;
        self.focusable = true;
        self
    }

    pub fn focusable(mut self, focusable: bool) -> Self {
        self.focusable = focusable;
        self
    }

    pub fn role(mut self, role: &str) -> Self {
        self.features.role = Some(role.to_string());
        self
    }

    pub fn placeholder(mut self, placeholder: &str) -> Self {
        self.features.placeholder = placeholder.to_lowercase();
        self
    }

    pub fn class(mut self, class_name: &str) -> Self {
        self.features.class_name = class_name.to_lowercase();
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn data_control(mut self, name: &str) -> Self {
        self.features.data_control = Some(name.to_string());
        self
    }

    pub fn input_type(mut self, kind: &str) -> Self {
        self.features.input_type = Some(kind.to_string());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.features.disabled = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn inside(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_string());
        self
    }

    pub fn on_click(mut self, effect: Effect) -> Self {
        self.on_click.push(effect);
        self
    }

    fn accepts_text(&self) -> bool {
        self.features.content_editable
            || self.features.tag == "textarea"
            || self.features.tag == "input"
            || self.features.has_role("textbox")
    }

    fn snapshot(&self, source: &str) -> CandidateFeatures {
        let mut features = self.features.clone();
        features.source = source.to_string();
        let label = self.text.trim().to_lowercase();
        features.text = label.chars().take(200).collect();
        features
    }
}

#[derive(Default)]
struct FakeState {
    url: String,
    pages: HashMap<String, Vec<FakeElement>>,
    elements: Vec<FakeElement>,
    focused: Option<String>,
    viewport: Rect,
    behavior: InjectBehavior,
    select_all_armed: bool,
    tab_order: Vec<String>,
    key_effects: HashMap<String, Vec<Effect>>,
    point_effects: Vec<Effect>,
    point_clicks: Vec<(f64, f64)>,
    keys: Vec<KeyChord>,
    clicks: HashMap<String, u32>,
    navigations: Vec<String>,
    cookies: Vec<StoredCookie>,
    fail_navigation: bool,
    closed: bool,
    left_open: Option<String>,
    calls: Vec<String>,
}

impl FakeState {
    fn find(&self, token: &str) -> Option<&FakeElement> {
        self.elements.iter().find(|el| el.token() == token)
    }

    fn find_mut(&mut self, token: &str) -> Option<&mut FakeElement> {
        self.elements.iter_mut().find(|el| el.token() == token)
    }

    fn load(&mut self, url: &str) {
        self.url = url.to_string();
        self.navigations.push(url.to_string());
        self.elements = self.pages.get(url).cloned().unwrap_or_default();
        self.focused = None;
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Navigate(url) => self.load(&url),
                Effect::SetUrl(url) => self.url = url,
                Effect::Focus(token) => self.focused = Some(token),
                Effect::Show(token) => {
                    if let Some(el) = self.find_mut(&token) {
                        el.visible = true;
                    }
                }
                Effect::Hide(token) => {
                    if let Some(el) = self.find_mut(&token) {
                        el.visible = false;
                    }
                }
                Effect::Remove(token) => self.elements.retain(|el| el.token() != token),
                Effect::SetText(token, text) => {
                    if let Some(el) = self.find_mut(&token) {
                        el.text = text;
                    }
                }
                Effect::ClearEditables => {
                    for el in self.elements.iter_mut().filter(|el| el.accepts_text()) {
                        el.text.clear();
                    }
                }
            }
        }
    }

    fn focused_editable_mut(&mut self) -> Option<&mut FakeElement> {
        let token = self.focused.clone()?;
        self.find_mut(&token).filter(|el| el.accepts_text())
    }

    fn write_focused(&mut self, behavior: MethodBehavior, text: &str, append: bool) -> bool {
        let Some(el) = self.focused_editable_mut() else {
            return false;
        };
        let landed: String = match behavior {
            MethodBehavior::Works => text.to_string(),
            MethodBehavior::Ignored => return true,
            MethodBehavior::Truncates(n) => text.chars().take(n).collect(),
        };
        if append {
            el.text.push_str(&landed);
        } else {
            el.text = landed;
        }
        true
    }
}

/// Scriptable in-memory page implementing [`DomPort`] and [`PageSession`].
pub struct FakeDom {
    id: SessionId,
    state: Mutex<FakeState>,
}

impl Default for FakeDom {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeDom {
    pub fn new() -> Self {
        Self {
            id: SessionId::new(),
            state: Mutex::new(FakeState {
                url: "about:blank".into(),
                viewport: Rect::new(0.0, 0.0, 1280.0, 800.0),
                ..FakeState::default()
            }),
        }
    }

    /// Registers the element table served at `url`.
    pub fn page(self, url: &str, elements: Vec<FakeElement>) -> Self {
        self.state.lock().pages.insert(url.to_string(), elements);
        self
    }

    /// Starts on `url` without recording a navigation.
    pub fn at(self, url: &str) -> Self {
        {
            let mut state = self.state.lock();
            state.load(url);
            state.navigations.clear();
        }
        self
    }

    pub fn with_elements(self, elements: Vec<FakeElement>) -> Self {
        self.state.lock().elements = elements;
        self
    }

    pub fn with_behavior(self, behavior: InjectBehavior) -> Self {
        self.state.lock().behavior = behavior;
        self
    }

    pub fn with_tab_order(self, tokens: &[&str]) -> Self {
        self.state.lock().tab_order = tokens.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn on_key(self, key: &str, effect: Effect) -> Self {
        self.state
            .lock()
            .key_effects
            .entry(key.to_string())
            .or_default()
            .push(effect);
        self
    }

    pub fn on_point_click(self, effect: Effect) -> Self {
        self.state.lock().point_effects.push(effect);
        self
    }

    pub fn with_cookies(self, cookies: Vec<StoredCookie>) -> Self {
        self.state.lock().cookies = cookies;
        self
    }

    pub fn failing_navigation(self) -> Self {
        self.state.lock().fail_navigation = true;
        self
    }

    pub fn add_element(&self, element: FakeElement) {
        self.state.lock().elements.push(element);
    }

    pub fn set_url(&self, url: &str) {
        self.state.lock().url = url.to_string();
    }

    pub fn apply(&self, effects: Vec<Effect>) {
        self.state.lock().apply(effects);
    }

    pub fn text_of(&self, token: &str) -> Option<String> {
        self.state.lock().find(token).map(|el| el.text.clone())
    }

    pub fn focused_token(&self) -> Option<String> {
        self.state.lock().focused.clone()
    }

    pub fn clicks(&self, token: &str) -> u32 {
        self.state.lock().clicks.get(token).copied().unwrap_or(0)
    }

    pub fn keys(&self) -> Vec<KeyChord> {
        self.state.lock().keys.clone()
    }

    pub fn point_clicks(&self) -> Vec<(f64, f64)> {
        self.state.lock().point_clicks.clone()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state.lock().navigations.clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    pub fn stored_cookies(&self) -> Vec<StoredCookie> {
        self.state.lock().cookies.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn left_open_reason(&self) -> Option<String> {
        self.state.lock().left_open.clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.state.lock().calls.push(call.into());
    }

    fn key(&self, chord: &KeyChord) {
        let mut state = self.state.lock();
        state.keys.push(chord.clone());
        if chord.key == "a" && chord.modifiers & KeyChord::CTRL != 0 {
            state.select_all_armed = true;
        }
        if chord.key == "Tab" && !state.tab_order.is_empty() {
            let next = match state
                .focused
                .as_ref()
                .and_then(|current| state.tab_order.iter().position(|t| t == current))
            {
                Some(pos) => (pos + 1) % state.tab_order.len(),
                None => 0,
            };
            state.focused = Some(state.tab_order[next].clone());
        }
        let lookup = if chord.modifiers & KeyChord::CTRL != 0 {
            format!("Ctrl+{}", chord.key)
        } else {
            chord.key.clone()
        };
        if let Some(effects) = state.key_effects.get(&lookup).cloned() {
            state.apply(effects);
        }
    }

    fn typed(&self, ch: char) {
        let mut state = self.state.lock();
        let behavior = state.behavior.typing;
        let armed = std::mem::take(&mut state.select_all_armed);
        let Some(el) = state.focused_editable_mut() else {
            return;
        };
        if armed {
            el.text.clear();
        }
        match behavior {
            MethodBehavior::Works => el.text.push(ch),
            MethodBehavior::Ignored => {}
            MethodBehavior::Truncates(n) => {
                if el.text.chars().count() < n {
                    el.text.push(ch);
                }
            }
        }
    }
}

fn size_ok(el: &FakeElement, query: &ProbeQuery) -> bool {
    let rect = el.features.rect;
    rect.width > query.min_width
        && rect.height > query.min_height
        && (!query.in_viewport || rect.in_viewport())
}

#[async_trait]
impl DomPort for FakeDom {
    async fn probe(&self, query: &ProbeQuery) -> Result<Vec<CandidateFeatures>, ActionError> {
        self.record("probe");
        let state = self.state.lock();
        let scoped = |el: &&FakeElement| match &query.scope {
            Some(scope) => el.parent.as_deref() == Some(scope.token.as_str()),
            None => true,
        };
        let mut seen: Vec<String> = Vec::new();
        let mut out = Vec::new();
        for selector in &query.selectors {
            for el in state.elements.iter().filter(scoped) {
                if !el.selectors.iter().any(|s| s == selector) || seen.iter().any(|t| t == el.token()) {
                    continue;
                }
                seen.push(el.token().to_string());
                if el.visible && size_ok(el, query) {
                    out.push(el.snapshot(selector));
                }
            }
        }
        for el in state.elements.iter().filter(scoped) {
            if seen.iter().any(|t| t == el.token()) {
                continue;
            }
            let text = el.text.to_lowercase();
            if let Some(phrase) = query
                .text_phrases
                .iter()
                .find(|p| text.contains(p.as_str()) || el.features.placeholder.contains(p.as_str()))
            {
                seen.push(el.token().to_string());
                if el.visible && size_ok(el, query) {
                    out.push(el.snapshot(&format!("text:{phrase}")));
                }
            }
        }
        Ok(out)
    }

    async fn activate(&self, target: &ElementHandle) -> Result<Activation, ActionError> {
        self.record(format!("activate:{}", target.token));
        let mut state = self.state.lock();
        let Some(el) = state.find(&target.token).cloned() else {
            return Ok(Activation::default());
        };
        if el.visible && el.focusable {
            state.focused = Some(target.token.clone());
        }
        *state.clicks.entry(target.token.clone()).or_default() += 1;
        state.apply(el.on_click.clone());
        let focused = match state.focused.clone() {
            Some(token) if token == target.token => true,
            Some(token) => state
                .find(&token)
                .map(|f| f.parent.as_deref() == Some(target.token.as_str()))
                .unwrap_or(false),
            None => false,
        };
        Ok(Activation {
            found: true,
            focused,
        })
    }

    async fn click(&self, target: &ElementHandle) -> Result<bool, ActionError> {
        self.record(format!("click:{}", target.token));
        let mut state = self.state.lock();
        let Some(el) = state.find(&target.token).cloned() else {
            return Ok(false);
        };
        if !el.visible || el.features.disabled {
            return Ok(false);
        }
        *state.clicks.entry(target.token.clone()).or_default() += 1;
        state.apply(el.on_click.clone());
        Ok(true)
    }

    async fn click_point(&self, x: f64, y: f64) -> Result<(), ActionError> {
        self.record("click_point");
        let mut state = self.state.lock();
        state.point_clicks.push((x, y));
        let effects = state.point_effects.clone();
        state.apply(effects);
        Ok(())
    }

    async fn press_key(&self, chord: &KeyChord) -> Result<(), ActionError> {
        self.record(format!("key:{}", chord.key));
        self.key(chord);
        Ok(())
    }

    async fn viewport(&self) -> Result<Rect, ActionError> {
        Ok(self.state.lock().viewport)
    }

    async fn focused(&self) -> Result<Option<CandidateFeatures>, ActionError> {
        let state = self.state.lock();
        Ok(state
            .focused
            .as_ref()
            .and_then(|token| state.find(token))
            .map(|el| el.snapshot("focused")))
    }

    async fn read_text(&self, target: &ElementHandle) -> Result<Option<String>, ActionError> {
        Ok(self.text_of(&target.token))
    }

    async fn focused_text(&self) -> Result<Option<String>, ActionError> {
        let state = self.state.lock();
        Ok(state
            .focused
            .as_ref()
            .and_then(|token| state.find(token))
            .map(|el| el.text.clone()))
    }

    async fn is_visible(&self, target: &ElementHandle) -> Result<bool, ActionError> {
        Ok(self
            .state
            .lock()
            .find(&target.token)
            .map(|el| el.visible)
            .unwrap_or(false))
    }

    async fn exec_insert_text(&self, text: &str) -> Result<bool, ActionError> {
        self.record("exec_insert_text");
        let mut state = self.state.lock();
        let behavior = state.behavior.exec_insert;
        Ok(state.write_focused(behavior, text, true))
    }

    async fn replace_content(
        &self,
        preferred: Option<&ElementHandle>,
        text: &str,
    ) -> Result<Option<ElementHandle>, ActionError> {
        self.record("replace_content");
        let mut state = self.state.lock();
        let usable = |el: &FakeElement| {
            el.visible
                && el.accepts_text()
                && el.features.rect.width > 30.0
                && el.features.rect.height > 15.0
        };
        let token = preferred
            .and_then(|handle| state.find(&handle.token))
            .filter(|el| usable(*el))
            .or_else(|| state.elements.iter().find(|el| usable(*el)))
            .map(|el| el.token().to_string());
        let Some(token) = token else {
            return Ok(None);
        };
        state.focused = Some(token.clone());
        let behavior = state.behavior.replace_content;
        state.write_focused(behavior, text, false);
        Ok(Some(ElementHandle::new(token)))
    }

    async fn replace_html_focused(&self, html: &str) -> Result<bool, ActionError> {
        self.record("replace_html_focused");
        let mut state = self.state.lock();
        let content_editable = state
            .focused
            .as_ref()
            .and_then(|token| state.find(token))
            .map(|el| el.features.content_editable)
            .unwrap_or(false);
        if !content_editable {
            return Ok(false);
        }
        let rendered = html.replace("<br>", "\n");
        let behavior = state.behavior.rich_text;
        Ok(state.write_focused(behavior, &rendered, false))
    }

    async fn paste_focused(&self, text: &str) -> Result<bool, ActionError> {
        self.record("paste_focused");
        let mut state = self.state.lock();
        let behavior = state.behavior.paste;
        Ok(state.write_focused(behavior, text, false))
    }

    async fn type_char(&self, ch: char) -> Result<(), ActionError> {
        self.typed(ch);
        Ok(())
    }

    async fn set_field_value(&self, target: &ElementHandle, value: &str) -> Result<bool, ActionError> {
        self.record(format!("set_field_value:{}", target.token));
        let mut state = self.state.lock();
        match state.find_mut(&target.token) {
            Some(el) => {
                el.text = value.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn current_url(&self) -> Result<String, ActionError> {
        Ok(self.state.lock().url.clone())
    }

    async fn visible_labelled_controls(&self, labels: &[String]) -> Result<bool, ActionError> {
        let state = self.state.lock();
        Ok(state.elements.iter().any(|el| {
            el.visible
                && (el.features.tag == "button" || el.features.has_role("button"))
                && labels
                    .iter()
                    .any(|label| el.text.trim().eq_ignore_ascii_case(label))
        }))
    }

    async fn editable_regions(
        &self,
        min_width: f64,
        min_height: f64,
    ) -> Result<Vec<EditableRegion>, ActionError> {
        let state = self.state.lock();
        Ok(state
            .elements
            .iter()
            .filter(|el| el.visible && (el.features.content_editable || el.features.tag == "textarea"))
            .filter(|el| el.features.rect.exceeds(min_width, min_height))
            .map(|el| EditableRegion {
                rect: el.features.rect,
                text: el.text.clone(),
            })
            .collect())
    }
}

#[async_trait]
impl PageSession for FakeDom {
    fn id(&self) -> &SessionId {
        &self.id
    }

    async fn navigate(&self, url: &str, _gate: WaitGate, _deadline: Duration) -> Result<(), AdapterError> {
        let mut state = self.state.lock();
        if state.fail_navigation {
            return Err(AdapterError::new(AdapterErrorKind::NavTimeout).with_hint(url.to_string()));
        }
        state.load(url);
        Ok(())
    }

    async fn evaluate_script(&self, _expression: &str) -> Result<Value, AdapterError> {
        Ok(Value::Null)
    }

    async fn current_url(&self) -> Result<String, AdapterError> {
        Ok(self.state.lock().url.clone())
    }

    async fn press_key(&self, chord: &KeyChord) -> Result<(), AdapterError> {
        self.key(chord);
        Ok(())
    }

    async fn insert_text(&self, text: &str) -> Result<(), AdapterError> {
        let mut state = self.state.lock();
        state.write_focused(MethodBehavior::Works, text, true);
        Ok(())
    }

    async fn type_char(&self, ch: char) -> Result<(), AdapterError> {
        self.typed(ch);
        Ok(())
    }

    async fn click_at(&self, x: f64, y: f64) -> Result<(), AdapterError> {
        self.state.lock().point_clicks.push((x, y));
        Ok(())
    }

    async fn cookies(&self) -> Result<Vec<StoredCookie>, AdapterError> {
        Ok(self.state.lock().cookies.clone())
    }

    async fn set_cookies(&self, cookies: &[StoredCookie]) -> Result<(), AdapterError> {
        self.state.lock().cookies = cookies.to_vec();
        Ok(())
    }

    async fn close(&self) -> Result<(), AdapterError> {
        self.state.lock().closed = true;
        Ok(())
    }

    fn leave_open(&self, reason: &str) {
        self.state.lock().left_open = Some(reason.to_string());
    }
}
