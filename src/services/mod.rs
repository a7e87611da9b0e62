// All service modules
pub mod claim_auth;
pub mod daily_claim;
pub mod freshness;
pub mod game_result;
pub mod leaderboard;
pub mod message_format;
pub mod rank_refresher;
pub mod referral;
pub mod user_service;

// Re-export for convenience
pub use claim_auth::{AuthenticatedClaim, ClaimAuthenticator};
pub use daily_claim::DailyClaimService;
pub use game_result::GameResultService;
pub use leaderboard::LeaderboardService;
pub use rank_refresher::RankRefresher;
pub use referral::ReferralService;
pub use user_service::UserService;

use crate::{config::Config, db::Store};
use std::sync::Arc;

/// Start all background services
pub async fn start_background_services(store: Arc<dyn Store>, config: Config) {
    tracing::info!("Starting background services...");

    let rank_refresher = Arc::new(RankRefresher::new(
        store,
        config.rank_refresh_interval_secs,
    ));
    rank_refresher.start().await;
}
