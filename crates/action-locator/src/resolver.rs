//! Element resolver with fallback chain orchestration

use std::sync::Arc;

use action_primitives::{poll_until, DomPort, ProbeQuery};
use tracing::{debug, info, instrument, warn};

use crate::errors::LocatorError;
use crate::scoring::rank;
use crate::types::{AcceptWhen, Located, LocateStrategy, Ranked, RoleTable};

/// Finds the element playing a semantic role on the current page.
pub struct Locator {
    pub(crate) dom: Arc<dyn DomPort>,
}

impl Locator {
    pub fn new(dom: Arc<dyn DomPort>) -> Self {
        Self { dom }
    }

    /// Runs the primary selector family, then every fallback in order.
    ///
    /// `ElementNotFound` is returned only after all of them are exhausted; callers treat it
    /// as terminal for the posting attempt.
    #[instrument(skip_all, fields(role = %table.role))]
    pub async fn locate(&self, table: &RoleTable) -> Result<Located, LocatorError> {
        if table.selectors.is_empty() && table.fallbacks.is_empty() {
            return Err(LocatorError::InvalidTable(format!(
                "{} has no selectors or fallbacks",
                table.role
            )));
        }

        let mut tried = Vec::with_capacity(table.fallbacks.len() + 1);
        if !table.selectors.is_empty() {
            tried.push(LocateStrategy::Primary.name());
            let query = self.query(table, &table.selectors);
            let hit = poll_until(table.primary, move |attempt| {
                let query = query.clone();
                async move {
                    debug!(attempt, "primary selector pass");
                    self.pass(table, &query, LocateStrategy::Primary).await
                }
            })
            .await;
            if let Some(located) = hit {
                return Ok(self.found(table, located));
            }
        }

        for fallback in &table.fallbacks {
            let strategy = fallback.strategy();
            tried.push(strategy.name());
            debug!(strategy = strategy.name(), "trying fallback");
            if let Some(located) = self.run_fallback(table, fallback).await {
                return Ok(self.found(table, located));
            }
        }

        warn!(tried = ?tried, "every locate strategy exhausted");
        Err(LocatorError::ElementNotFound {
            role: table.role.clone(),
            tried: tried.join(", "),
        })
    }

    fn found(&self, table: &RoleTable, located: Located) -> Located {
        info!(
            strategy = located.strategy.name(),
            token = %located.handle.token,
            score = located.score,
            "located {}",
            table.role
        );
        located
    }

    pub(crate) fn query(&self, table: &RoleTable, selectors: &[String]) -> ProbeQuery {
        ProbeQuery::selectors(selectors.iter().cloned()).min_size(table.min_size.0, table.min_size.1)
    }

    /// One probe, ranked with the table's rules, then accepted per [`AcceptWhen`].
    pub(crate) async fn pass(
        &self,
        table: &RoleTable,
        query: &ProbeQuery,
        strategy: LocateStrategy,
    ) -> Option<Located> {
        let candidates = match self.dom.probe(query).await {
            Ok(candidates) => candidates,
            Err(err) => {
                debug!(error = %err, "probe failed");
                return None;
            }
        };
        let ranked = rank(candidates, &table.rules, table.top_k);
        self.accept_first(table.accept, ranked, strategy).await
    }

    pub(crate) async fn accept_first(
        &self,
        accept: AcceptWhen,
        ranked: Vec<Ranked>,
        strategy: LocateStrategy,
    ) -> Option<Located> {
        for candidate in ranked {
            let handle = candidate.features.handle;
            let accepted = match accept {
                AcceptWhen::Focused => match self.dom.activate(&handle).await {
                    Ok(activation) => activation.focused,
                    Err(err) => {
                        debug!(token = %handle.token, error = %err, "activation failed");
                        false
                    }
                },
                AcceptWhen::Present => self.dom.is_visible(&handle).await.unwrap_or(false),
            };
            if accepted {
                return Some(Located {
                    handle,
                    strategy,
                    score: candidate.score,
                });
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Matcher, ScoreRules};
    use action_primitives::fake::{Effect, FakeDom, FakeElement};
    use action_primitives::PollPolicy;
    use std::time::Duration;

    fn rules() -> ScoreRules {
        ScoreRules::default()
            .bonus(Matcher::ContentEditable, 5000.0)
            .bonus(Matcher::Role("textbox".into()), 3000.0)
    }

    #[tokio::test(start_paused = true)]
    async fn picks_highest_score_that_takes_focus() {
        let dom = Arc::new(FakeDom::new().with_elements(vec![
            FakeElement::new("small", "div")
                .matches("[contenteditable]")
                .rect(0.0, 0.0, 100.0, 40.0)
                .editable(),
            FakeElement::new("decoy", "div")
                .matches("[contenteditable]")
                .rect(0.0, 0.0, 600.0, 200.0)
                .editable()
                .focusable(false),
            FakeElement::new("label", "span")
                .matches("[contenteditable]")
                .rect(0.0, 0.0, 50.0, 20.0),
        ]));
        let table = RoleTable::new("compose box", ["[contenteditable]"]).rules(rules());
        let located = Locator::new(dom.clone()).locate(&table).await.unwrap();
        assert_eq!(located.handle.token, "small");
        assert_eq!(located.strategy, LocateStrategy::Primary);
        assert_eq!(dom.clicks("decoy"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn primary_polls_until_element_appears() {
        let dom = Arc::new(FakeDom::new());
        let late = dom.clone();
        let table = RoleTable::new("compose box", ["[contenteditable]"])
            .rules(rules())
            .primary(PollPolicy::new(5, Duration::from_millis(500)));
        let appear = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1200)).await;
            late.add_element(
                FakeElement::new("editor", "div")
                    .matches("[contenteditable]")
                    .rect(0.0, 0.0, 300.0, 100.0)
                    .editable(),
            );
        });
        let located = Locator::new(dom.clone()).locate(&table).await.unwrap();
        appear.await.unwrap();
        assert_eq!(located.handle.token, "editor");
    }

    #[tokio::test(start_paused = true)]
    async fn present_acceptance_does_not_click() {
        let dom = Arc::new(FakeDom::new().with_elements(vec![FakeElement::new("post", "button")
            .matches("button")
            .text("Post")
            .on_click(Effect::ClearEditables)]));
        let table = RoleTable::new("submit control", ["button"])
            .rules(ScoreRules::default().bonus(Matcher::TextEquals("post".into()), 5000.0))
            .accept(AcceptWhen::Present);
        let located = Locator::new(dom.clone()).locate(&table).await.unwrap();
        assert_eq!(located.handle.token, "post");
        assert_eq!(dom.clicks("post"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn not_found_lists_strategies() {
        let dom = Arc::new(FakeDom::new());
        let table = RoleTable::new("compose box", ["[contenteditable]"])
            .primary(PollPolicy::new(3, Duration::from_millis(100)));
        match Locator::new(dom).locate(&table).await {
            Err(LocatorError::ElementNotFound { role, tried }) => {
                assert_eq!(role, "compose box");
                assert_eq!(tried, "primary");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_table_is_rejected() {
        let table = RoleTable::new("nothing", Vec::<String>::new());
        let err = Locator::new(Arc::new(FakeDom::new())).locate(&table).await.unwrap_err();
        assert!(matches!(err, LocatorError::InvalidTable(_)));
    }
}
