//! Keeps the process alive while browsers parked for an operator are still needed.

use std::time::Duration;

use cdp_adapter::keeper;
use tokio::signal;
use tokio::time::sleep;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldEnd {
    /// Nothing was parked
    NothingHeld,
    Interrupted,
    Elapsed,
}

/// Waits for Ctrl-C, or for `limit` when one is given, then releases every parked
/// browser. Returns at once when no browser was left open.
pub async fn hold_open_sessions(limit: Option<Duration>) -> HoldEnd {
    let held = keeper::held_sessions();
    if held.is_empty() {
        return HoldEnd::NothingHeld;
    }
    for session in &held {
        info!(session = %session.session, reason = %session.reason, "browser left open");
    }

    let end = match limit {
        Some(limit) => tokio::select! {
            _ = signal::ctrl_c() => HoldEnd::Interrupted,
            _ = sleep(limit) => HoldEnd::Elapsed,
        },
        None => match signal::ctrl_c().await {
            Ok(()) => HoldEnd::Interrupted,
            // no signal handler, nothing could end the hold
            Err(_) => HoldEnd::Elapsed,
        },
    };
    let released = keeper::release_all();
    info!(released, ?end, "released held browser sessions");
    end
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use campaignforge_core_types::SessionId;
    use serial_test::serial;

    #[tokio::test]
    #[serial]
    async fn returns_immediately_without_parked_sessions() {
        keeper::release_all();
        assert_eq!(hold_open_sessions(None).await, HoldEnd::NothingHeld);
    }

    #[tokio::test(start_paused = true)]
    #[serial]
    async fn limit_releases_parked_sessions() {
        keeper::release_all();
        keeper::hold(SessionId::new(), "post could not be verified", Arc::new(()));

        assert_eq!(hold_open_sessions(Some(Duration::from_secs(600))).await, HoldEnd::Elapsed);
        assert_eq!(keeper::held_count(), 0);
    }
}
