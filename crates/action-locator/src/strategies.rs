//! Fallback strategies
//!
//! Tried in table order once the primary selector family comes back empty:
//! 1. Container click - open a collapsed composer, then search inside it
//! 2. Phrase search - placeholder vocabulary anywhere in the document
//! 3. Viewport point - click where the composer usually sits, then search
//! 4. Tab probe - walk focus with the keyboard and test what lands
//! 5. Selectors - a secondary selector family

use std::time::Duration;

use action_primitives::{poll_until, settle, PollPolicy, ProbeQuery};
use cdp_adapter::KeyChord;
use tracing::debug;

use crate::resolver::Locator;
use crate::scoring::rank;
use crate::types::{Fallback, Located, LocateStrategy, Matcher, RoleTable, ScoreRules};

impl Locator {
    pub(crate) async fn run_fallback(&self, table: &RoleTable, fallback: &Fallback) -> Option<Located> {
        match fallback {
            Fallback::ContainerClick {
                containers,
                container_min,
                max_containers,
                settle: delay,
                inner,
                loose_min,
            } => {
                self.container_click(table, containers, *container_min, *max_containers, *delay, inner, *loose_min)
                    .await
            }
            Fallback::PhraseSearch { phrases, policy } => self.phrase_search(table, phrases, *policy).await,
            Fallback::ViewportPoint {
                x_ratio,
                y_ratio,
                settle: delay,
                selectors,
            } => self.viewport_point(table, *x_ratio, *y_ratio, *delay, selectors).await,
            Fallback::TabProbe { presses, delay } => self.tab_probe(*presses, *delay).await,
            Fallback::Selectors { selectors, policy } => {
                let query = self.query(table, selectors);
                poll_until(*policy, move |_| {
                    let query = query.clone();
                    async move { self.pass(table, &query, LocateStrategy::Selectors).await }
                })
                .await
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn container_click(
        &self,
        table: &RoleTable,
        containers: &[String],
        container_min: (f64, f64),
        max_containers: usize,
        delay: Duration,
        inner: &[String],
        loose_min: (f64, f64),
    ) -> Option<Located> {
        let query = ProbeQuery::selectors(containers.iter().cloned())
            .min_size(container_min.0, container_min.1);
        let found = self.dom.probe(&query).await.ok()?;
        let largest = rank(found, &ScoreRules::default(), max_containers);

        for container in largest {
            let handle = container.features.handle;
            debug!(token = %handle.token, "clicking container");
            if self.dom.activate(&handle).await.is_err() {
                continue;
            }
            settle(delay).await;

            let scoped = self.query(table, inner).within(handle.clone());
            if let Some(located) = self.pass(table, &scoped, LocateStrategy::ContainerClick).await {
                return Some(located);
            }
            let loose = ProbeQuery::selectors(inner.iter().cloned()).min_size(loose_min.0, loose_min.1);
            if let Some(located) = self.pass(table, &loose, LocateStrategy::ContainerClick).await {
                return Some(located);
            }
        }
        None
    }

    async fn phrase_search(&self, table: &RoleTable, phrases: &[String], policy: PollPolicy) -> Option<Located> {
        let query = ProbeQuery::phrases(phrases.iter().cloned()).min_size(table.min_size.0, table.min_size.1);
        let rules = table.rules.clone().require(Matcher::AcceptsText);
        poll_until(policy, move |_| {
            let query = query.clone();
            let rules = rules.clone();
            async move {
                let found = self.dom.probe(&query).await.ok()?;
                let ranked = rank(found, &rules, table.top_k);
                self.accept_first(table.accept, ranked, LocateStrategy::PhraseSearch).await
            }
        })
        .await
    }

    async fn viewport_point(
        &self,
        table: &RoleTable,
        x_ratio: f64,
        y_ratio: f64,
        delay: Duration,
        selectors: &[String],
    ) -> Option<Located> {
        let viewport = self.dom.viewport().await.ok()?;
        let (x, y) = (viewport.width * x_ratio, viewport.height * y_ratio);
        debug!(x, y, "clicking viewport point");
        self.dom.click_point(x, y).await.ok()?;
        settle(delay).await;
        let query = self.query(table, selectors);
        self.pass(table, &query, LocateStrategy::ViewportPoint).await
    }

    async fn tab_probe(&self, presses: u32, delay: Duration) -> Option<Located> {
        let tab = KeyChord::tab();
        for press in 1..=presses {
            self.dom.press_key(&tab).await.ok()?;
            settle(delay).await;
            match self.dom.focused().await {
                Ok(Some(focused)) if focused.accepts_text() => {
                    debug!(press, token = %focused.handle.token, "tab reached an editable element");
                    return Some(Located {
                        score: focused.rect.area(),
                        handle: focused.handle,
                        strategy: LocateStrategy::TabProbe,
                    });
                }
                _ => continue,
            }
        }
        None
    }
}
