//! Browser session acquisition.
//!
//! Every posting run opens its own session; sessions are never pooled or shared.

use std::sync::Arc;

use action_primitives::{DomPort, ScriptDom};
use async_trait::async_trait;
use campaignforge_core_types::{Platform, PostError, SessionId};
use cdp_adapter::{CdpConfig, ChromiumSession, PageSession};
use tracing::info;

/// One exclusive page plus the element-level view over it.
#[derive(Clone)]
pub struct BrowserSession {
    pub page: Arc<dyn PageSession>,
    pub dom: Arc<dyn DomPort>,
}

impl BrowserSession {
    pub fn new(page: Arc<dyn PageSession>, dom: Arc<dyn DomPort>) -> Self {
        Self { page, dom }
    }

    /// Script-driven DOM over a live page.
    pub fn scripted(page: Arc<dyn PageSession>) -> Self {
        let dom: Arc<dyn DomPort> = Arc::new(ScriptDom::new(page.clone()));
        Self { page, dom }
    }

    pub fn id(&self) -> &SessionId {
        self.page.id()
    }
}

/// Opens a fresh session for one run.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self, platform: Platform) -> Result<BrowserSession, PostError>;
}

/// Launches a visible Chromium per run.
pub struct ChromiumFactory {
    config: CdpConfig,
}

impl ChromiumFactory {
    pub fn new(config: CdpConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CdpConfig {
        &self.config
    }
}

#[async_trait]
impl SessionFactory for ChromiumFactory {
    async fn open(&self, platform: Platform) -> Result<BrowserSession, PostError> {
        let page = ChromiumSession::launch(&self.config).await?;
        info!(platform = %platform, session = %page.id(), "browser session opened");
        Ok(BrowserSession::scripted(Arc::new(page)))
    }
}
