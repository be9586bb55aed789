//! Process-wide registry of browser sessions deliberately left open for an operator.
//!
//! Dropping a browser handle kills the browser process, so anything that must stay
//! visible after its driver returns is parked here until the process decides to exit.

use std::any::Any;
use std::sync::Arc;
use std::time::SystemTime;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tracing::info;

use campaignforge_core_types::SessionId;

struct HeldSession {
    info: HeldSessionInfo,
    _keep: Arc<dyn Any + Send + Sync>,
}

/// Summary of one parked session.
#[derive(Clone, Debug)]
pub struct HeldSessionInfo {
    pub session: SessionId,
    pub reason: String,
    pub since: SystemTime,
}

static HELD: Lazy<Mutex<Vec<HeldSession>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Keeps `keep` alive until [`release_all`].
pub fn hold(session: SessionId, reason: impl Into<String>, keep: Arc<dyn Any + Send + Sync>) {
    let reason = reason.into();
    info!(session = %session, %reason, "leaving browser session open");
    HELD.lock().push(HeldSession {
        info: HeldSessionInfo {
            session,
            reason,
            since: SystemTime::now(),
        },
        _keep: keep,
    });
}

pub fn held_sessions() -> Vec<HeldSessionInfo> {
    HELD.lock().iter().map(|held| held.info.clone()).collect()
}

pub fn held_count() -> usize {
    HELD.lock().len()
}

/// Drops every parked handle; returns how many were released.
pub fn release_all() -> usize {
    let drained: Vec<HeldSession> = HELD.lock().drain(..).collect();
    let count = drained.len();
    drop(drained);
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn hold_keeps_value_alive_until_release() {
        release_all();
        let marker = Arc::new(42u8);
        hold(SessionId::new(), "unverified", marker.clone());
        assert_eq!(held_count(), 1);
        assert_eq!(Arc::strong_count(&marker), 2);
        assert_eq!(held_sessions()[0].reason, "unverified");

        assert_eq!(release_all(), 1);
        assert_eq!(Arc::strong_count(&marker), 1);
        assert_eq!(held_count(), 0);
    }
}
