//! Bounded fixed-delay polling.
//!
//! Target pages expose no completion signal, so every wait in the engine is a bounded
//! poll: at most `max_attempts` probes, `delay` apart, never an open-ended block.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::trace;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollPolicy {
    pub max_attempts: u32,
    #[serde(with = "millis")]
    pub delay: Duration,
}

impl PollPolicy {
    pub const fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    pub const fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Upper bound on time spent sleeping between attempts.
    pub fn budget(&self) -> Duration {
        self.delay * self.max_attempts.saturating_sub(1)
    }
}

/// Runs `attempt` until it yields `Some`, at most `policy.max_attempts` times.
///
/// The closure receives the 1-based attempt number. There is no sleep after the final
/// attempt.
pub async fn poll_until<T, F, Fut>(policy: PollPolicy, mut attempt: F) -> Option<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Option<T>>,
{
    for n in 1..=policy.max_attempts {
        if let Some(value) = attempt(n).await {
            return Some(value);
        }
        trace!(attempt = n, max = policy.max_attempts, "poll attempt missed");
        if n < policy.max_attempts && !policy.delay.is_zero() {
            sleep(policy.delay).await;
        }
    }
    None
}

/// Fixed settle delay after an action the page reacts to asynchronously.
pub async fn settle(delay: Duration) {
    if !delay.is_zero() {
        sleep(delay).await;
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn stops_at_first_hit() {
        let calls = AtomicU32::new(0);
        let started = Instant::now();
        let hit = poll_until(PollPolicy::new(10, Duration::from_millis(500)), |n| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { (n == 3).then_some(n) }
        })
        .await;
        assert_eq!(hit, Some(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(started.elapsed(), Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_without_trailing_sleep() {
        let started = Instant::now();
        let hit: Option<()> =
            poll_until(PollPolicy::new(4, Duration::from_secs(1)), |_| async { None }).await;
        assert!(hit.is_none());
        assert_eq!(started.elapsed(), Duration::from_secs(3));
        assert_eq!(PollPolicy::new(4, Duration::from_secs(1)).budget(), Duration::from_secs(3));
    }

    #[tokio::test]
    async fn zero_attempts_never_probes() {
        let hit = poll_until(PollPolicy::new(0, Duration::ZERO), |_| async { Some(()) }).await;
        assert!(hit.is_none());
    }

    #[test]
    fn policy_serializes_delay_as_millis() {
        let policy = PollPolicy::new(15, Duration::from_millis(500));
        let json = serde_json::to_value(policy).unwrap();
        assert_eq!(json["delay"], 500);
        let back: PollPolicy = serde_json::from_value(json).unwrap();
        assert_eq!(back, policy);
    }
}
