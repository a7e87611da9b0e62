use std::cmp::Ordering;
use std::sync::Arc;

use crate::{
    db::Store,
    error::Result,
    models::{LeaderboardEntry, LeaderboardResponse, User, UserRank},
};

/// Total order used everywhere a rank is shown: points descending, then
/// earlier `created_at`, then address ascending.
///
/// The SQL in `db::Database` (`ORDER BY points DESC, created_at ASC, address ASC`)
/// must stay in step with this.
pub fn leaderboard_order(a: &User, b: &User) -> Ordering {
    b.points
        .cmp(&a.points)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.address.cmp(&b.address))
}

pub struct LeaderboardService {
    store: Arc<dyn Store>,
    size: i64,
}

impl LeaderboardService {
    pub fn new(store: Arc<dyn Store>, size: i64) -> Self {
        Self { store, size }
    }

    pub async fn top(&self, n: i64) -> Result<Vec<LeaderboardEntry>> {
        let users = self.store.top_users(n).await?;
        Ok(users
            .iter()
            .enumerate()
            .map(|(index, user)| user.summary(index as i64 + 1))
            .collect())
    }

    /// 1-based rank of `address`, counted as "users strictly ahead + 1".
    pub async fn rank_of(&self, address: &str) -> Result<Option<UserRank>> {
        let address = address.trim().to_ascii_lowercase();
        let Some(user) = self.store.get_user(&address).await? else {
            return Ok(None);
        };

        let rank = self.store.count_outranking(&user).await? + 1;
        Ok(Some(UserRank {
            rank,
            user: user.summary(rank),
        }))
    }

    pub async fn leaderboard(&self, user_address: Option<&str>) -> Result<LeaderboardResponse> {
        let leaderboard = self.top(self.size).await?;
        let user_rank = match user_address {
            Some(address) if !address.trim().is_empty() => self.rank_of(address).await?,
            _ => None,
        };

        Ok(LeaderboardResponse {
            leaderboard,
            user_rank,
        })
    }
}
