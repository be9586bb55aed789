use std::sync::Arc;

use async_trait::async_trait;
use cdp_adapter::{KeyChord, PageSession};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::trace;
use uuid::Uuid;

use crate::dom::DomPort;
use crate::errors::ActionError;
use crate::scripts;
use crate::types::{Activation, CandidateFeatures, EditableRegion, ElementHandle, ProbeQuery, Rect};

const DEFAULT_PROBE_LIMIT: usize = 300;

/// [`DomPort`] backed by page scripts evaluated through a live session.
pub struct ScriptDom {
    page: Arc<dyn PageSession>,
    probe_limit: usize,
}

impl ScriptDom {
    pub fn new(page: Arc<dyn PageSession>) -> Self {
        Self {
            page,
            probe_limit: DEFAULT_PROBE_LIMIT,
        }
    }

    pub fn with_probe_limit(mut self, limit: usize) -> Self {
        self.probe_limit = limit.max(1);
        self
    }

    async fn run<T: DeserializeOwned>(&self, name: &str, body: &str, args: Value) -> Result<T, ActionError> {
        let expression = scripts::wrap(body, &args);
        let value = self.page.evaluate_script(&expression).await?;
        trace!(script = name, "page script returned");
        serde_json::from_value(value)
            .map_err(|err| ActionError::ScriptResult(format!("{name}: {err}")))
    }

    fn prefix() -> String {
        format!("cf-{}", Uuid::new_v4().simple())
    }
}

#[async_trait]
impl DomPort for ScriptDom {
    async fn probe(&self, query: &ProbeQuery) -> Result<Vec<CandidateFeatures>, ActionError> {
        let args = json!({
            "selectors": query.selectors,
            "scope": query.scope.as_ref().map(|handle| handle.token.clone()),
            "phrases": query.text_phrases,
            "min_width": query.min_width,
            "min_height": query.min_height,
            "in_viewport": query.in_viewport,
            "limit": self.probe_limit,
            "prefix": Self::prefix(),
        });
        self.run("probe", scripts::PROBE, args).await
    }

    async fn activate(&self, target: &ElementHandle) -> Result<Activation, ActionError> {
        self.run("activate", scripts::ACTIVATE, json!({ "token": target.token }))
            .await
    }

    async fn click(&self, target: &ElementHandle) -> Result<bool, ActionError> {
        self.run("click", scripts::CLICK, json!({ "token": target.token }))
            .await
    }

    async fn click_point(&self, x: f64, y: f64) -> Result<(), ActionError> {
        Ok(self.page.click_at(x, y).await?)
    }

    async fn press_key(&self, chord: &KeyChord) -> Result<(), ActionError> {
        Ok(self.page.press_key(chord).await?)
    }

    async fn viewport(&self) -> Result<Rect, ActionError> {
        self.run("viewport", scripts::VIEWPORT, Value::Null).await
    }

    async fn focused(&self) -> Result<Option<CandidateFeatures>, ActionError> {
        self.run("focused", scripts::FOCUSED, json!({ "prefix": Self::prefix() }))
            .await
    }

    async fn read_text(&self, target: &ElementHandle) -> Result<Option<String>, ActionError> {
        self.run("read_text", scripts::READ_TEXT, json!({ "token": target.token }))
            .await
    }

    async fn focused_text(&self) -> Result<Option<String>, ActionError> {
        self.run("focused_text", scripts::FOCUSED_TEXT, Value::Null)
            .await
    }

    async fn is_visible(&self, target: &ElementHandle) -> Result<bool, ActionError> {
        self.run("is_visible", scripts::IS_VISIBLE, json!({ "token": target.token }))
            .await
    }

    async fn exec_insert_text(&self, text: &str) -> Result<bool, ActionError> {
        self.run("exec_insert_text", scripts::EXEC_INSERT, json!({ "text": text }))
            .await
    }

    async fn replace_content(
        &self,
        preferred: Option<&ElementHandle>,
        text: &str,
    ) -> Result<Option<ElementHandle>, ActionError> {
        let args = json!({
            "token": preferred.map(|handle| handle.token.clone()),
            "text": text,
            "prefix": Self::prefix(),
        });
        self.run("replace_content", scripts::REPLACE_CONTENT, args)
            .await
    }

    async fn replace_html_focused(&self, html: &str) -> Result<bool, ActionError> {
        self.run("replace_html_focused", scripts::REPLACE_HTML_FOCUSED, json!({ "html": html }))
            .await
    }

    async fn paste_focused(&self, text: &str) -> Result<bool, ActionError> {
        self.run("paste_focused", scripts::PASTE_FOCUSED, json!({ "text": text }))
            .await
    }

    async fn type_char(&self, ch: char) -> Result<(), ActionError> {
        Ok(self.page.type_char(ch).await?)
    }

    async fn set_field_value(&self, target: &ElementHandle, value: &str) -> Result<bool, ActionError> {
        self.run(
            "set_field_value",
            scripts::SET_FIELD_VALUE,
            json!({ "token": target.token, "value": value }),
        )
        .await
    }

    async fn current_url(&self) -> Result<String, ActionError> {
        Ok(self.page.current_url().await?)
    }

    async fn visible_labelled_controls(&self, labels: &[String]) -> Result<bool, ActionError> {
        let labels: Vec<String> = labels.iter().map(|label| label.to_lowercase()).collect();
        self.run("visible_labelled_controls", scripts::VISIBLE_LABELLED, json!({ "labels": labels }))
            .await
    }

    async fn editable_regions(
        &self,
        min_width: f64,
        min_height: f64,
    ) -> Result<Vec<EditableRegion>, ActionError> {
        self.run(
            "editable_regions",
            scripts::EDITABLE_REGIONS,
            json!({ "min_width": min_width, "min_height": min_height }),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeDom;

    #[tokio::test]
    async fn null_results_map_per_return_type() {
        let dom = ScriptDom::new(Arc::new(FakeDom::new()));
        assert_eq!(dom.read_text(&ElementHandle::new("gone")).await.unwrap(), None);
        assert!(dom.focused().await.unwrap().is_none());
        let err = dom.viewport().await.unwrap_err();
        assert!(matches!(err, ActionError::ScriptResult(ref msg) if msg.starts_with("viewport")));
    }
}
