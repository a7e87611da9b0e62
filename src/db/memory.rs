use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{DailyClaimUpdate, ReferralWrite, Store};
use crate::{
    error::{AppError, Result},
    models::{GameResult, RefClaim, User},
    services::leaderboard::leaderboard_order,
};

#[derive(Default)]
struct MemoryState {
    users: HashMap<String, User>,
    game_results: Vec<GameResult>,
}

/// In-process store used for `DATABASE_URL=memory://` and in tests.
/// Each call holds the write lock for its whole mutation.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger rows for `address`, oldest first.
    #[cfg(test)]
    pub(crate) async fn game_results_for(&self, address: &str) -> Vec<GameResult> {
        let state = self.state.read().await;
        state
            .game_results
            .iter()
            .filter(|record| record.address == address)
            .cloned()
            .collect()
    }

    #[cfg(test)]
    pub(crate) async fn insert_user(&self, user: User) {
        let mut state = self.state.write().await;
        state.users.insert(user.address.clone(), user);
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn get_user(&self, address: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.get(address).cloned())
    }

    async fn upsert_user(
        &self,
        address: &str,
        username: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<User> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .entry(address.to_string())
            .and_modify(|existing| {
                if let Some(name) = username {
                    existing.username = name.to_string();
                }
                existing.updated_at = now;
            })
            .or_insert_with(|| User::new(address, username, now));
        Ok(user.clone())
    }

    async fn apply_daily_claim(
        &self,
        address: &str,
        expected_last: Option<DateTime<Utc>>,
        update: DailyClaimUpdate,
    ) -> Result<bool> {
        let mut state = self.state.write().await;
        let Some(user) = state.users.get_mut(address) else {
            return Ok(false);
        };
        if user.last_daily_claim_at != expected_last {
            return Ok(false);
        }

        user.points += update.points;
        user.streak = update.streak;
        user.last_daily_claim_at = Some(update.claimed_at);
        user.updated_at = update.claimed_at;
        Ok(true)
    }

    async fn apply_referral_claim(
        &self,
        address: &str,
        referrer: &str,
        points: i64,
        now: DateTime<Utc>,
    ) -> Result<ReferralWrite> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .get_mut(address)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if let Some(existing) = user.ref_claim_from(referrer) {
            return Ok(ReferralWrite::AlreadyClaimed {
                claimed_at: existing.claimed_at,
            });
        }

        user.ref_claims.push(RefClaim {
            referrer: referrer.to_string(),
            claimed_at: now,
        });
        user.points += points;
        user.updated_at = now;
        Ok(ReferralWrite::Applied)
    }

    async fn record_game_result(&self, record: &GameResult) -> Result<()> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .get_mut(&record.address)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        user.points += record.points_delta;
        if let Some(uri) = &record.reward_uri {
            if !user.nfts.contains(uri) {
                user.nfts.push(uri.clone());
            }
        }
        user.updated_at = record.created_at;

        state.game_results.push(record.clone());
        Ok(())
    }

    async fn top_users(&self, limit: i64) -> Result<Vec<User>> {
        let state = self.state.read().await;
        let mut users: Vec<User> = state.users.values().cloned().collect();
        users.sort_by(leaderboard_order);
        users.truncate(limit.max(0) as usize);
        Ok(users)
    }

    async fn count_outranking(&self, user: &User) -> Result<i64> {
        let state = self.state.read().await;
        let count = state
            .users
            .values()
            .filter(|other| leaderboard_order(other, user) == Ordering::Less)
            .count();
        Ok(count as i64)
    }

    async fn refresh_rank_cache(&self) -> Result<u64> {
        let mut state = self.state.write().await;
        let mut ordered: Vec<(String, User)> = state
            .users
            .iter()
            .map(|(address, user)| (address.clone(), user.clone()))
            .collect();
        ordered.sort_by(|a, b| leaderboard_order(&a.1, &b.1));

        let mut changed = 0;
        for (position, (address, _)) in ordered.into_iter().enumerate() {
            let rank = position as i32 + 1;
            if let Some(user) = state.users.get_mut(&address) {
                if user.rank != rank {
                    user.rank = rank;
                    changed += 1;
                }
            }
        }
        Ok(changed)
    }
}
