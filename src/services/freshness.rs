use crate::{
    config::RewardPolicy,
    error::{AppError, Result},
};

/// Rejects signed messages whose embedded timestamp is too old, or further in
/// the future than the tolerated clock skew.
#[derive(Debug, Clone, Copy)]
pub struct FreshnessGuard {
    max_age_ms: i64,
    max_future_skew_ms: i64,
}

impl FreshnessGuard {
    pub fn new(max_age_ms: i64, max_future_skew_ms: i64) -> Self {
        Self {
            max_age_ms,
            max_future_skew_ms,
        }
    }

    pub fn from_policy(policy: &RewardPolicy) -> Self {
        Self::new(
            policy.message_max_age_secs.saturating_mul(1000),
            policy.message_max_future_skew_secs.saturating_mul(1000),
        )
    }

    /// Fresh iff `-max_future_skew_ms <= now - timestamp <= max_age_ms`.
    pub fn is_fresh(&self, timestamp_ms: i64, now_ms: i64) -> bool {
        let gap = now_ms.saturating_sub(timestamp_ms);
        gap >= -self.max_future_skew_ms && gap <= self.max_age_ms
    }

    pub fn ensure_fresh(&self, timestamp_ms: i64, now_ms: i64) -> Result<()> {
        if self.is_fresh(timestamp_ms, now_ms) {
            Ok(())
        } else {
            tracing::debug!(
                "Rejecting stale message: timestamp={} now={}",
                timestamp_ms,
                now_ms
            );
            Err(AppError::MessageExpired)
        }
    }
}
