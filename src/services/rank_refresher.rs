use std::sync::Arc;
use tokio::time::{interval, Duration};

use crate::{db::Store, error::Result};

/// Rank Refresher - keeps the display-only `rank` column in step with the
/// live leaderboard order
pub struct RankRefresher {
    store: Arc<dyn Store>,
    interval_secs: u64,
}

impl RankRefresher {
    pub fn new(store: Arc<dyn Store>, interval_secs: u64) -> Self {
        Self {
            store,
            interval_secs,
        }
    }

    /// Start refresh loop
    pub async fn start(self: Arc<Self>) {
        if self.interval_secs == 0 {
            tracing::warn!("Rank refresher disabled (RANK_REFRESH_INTERVAL_SECS=0)");
            return;
        }

        tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(self.interval_secs));

            loop {
                ticker.tick().await;

                if let Err(e) = self.refresh().await {
                    tracing::error!("Rank refresher error: {}", e);
                }
            }
        });
    }

    pub async fn refresh(&self) -> Result<u64> {
        let changed = self.store.refresh_rank_cache().await?;
        if changed > 0 {
            tracing::debug!("Rank cache updated for {} users", changed);
        }
        Ok(changed)
    }
}
