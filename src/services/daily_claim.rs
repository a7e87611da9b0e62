use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use crate::{
    config::RewardPolicy,
    db::{DailyClaimUpdate, Store},
    error::{AppError, Result},
    models::User,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DailyDecision {
    Eligible { award: i64, new_streak: i32 },
    Rejected { next_eligible_at: DateTime<Utc> },
}

/// Cooldown and streak rule for one daily claim at `now`.
///
/// A claim less than `daily_cooldown_hours` after the previous one is
/// rejected. Otherwise the streak continues when the previous claim is more
/// than `daily_cooldown_hours` and at most `streak_window_hours` old, and
/// restarts at 1 in every other case.
pub fn evaluate(
    last_claim_at: Option<DateTime<Utc>>,
    streak: i32,
    now: DateTime<Utc>,
    policy: &RewardPolicy,
) -> DailyDecision {
    let cooldown = Duration::hours(policy.daily_cooldown_hours);
    let streak_window = Duration::hours(policy.streak_window_hours);

    let new_streak = match last_claim_at {
        Some(last) => {
            let elapsed = now - last;
            if elapsed < cooldown {
                return DailyDecision::Rejected {
                    next_eligible_at: last + cooldown,
                };
            }
            if elapsed > cooldown && elapsed <= streak_window {
                streak.max(0).saturating_add(1)
            } else {
                1
            }
        }
        None => 1,
    };

    DailyDecision::Eligible {
        award: policy.daily_claim_points,
        new_streak,
    }
}

#[derive(Debug, Clone)]
pub struct DailyClaimOutcome {
    pub points_earned: i64,
    pub new_streak: i32,
    pub user: User,
}

pub struct DailyClaimService {
    store: Arc<dyn Store>,
    policy: RewardPolicy,
}

impl DailyClaimService {
    pub fn new(store: Arc<dyn Store>, policy: RewardPolicy) -> Self {
        Self { store, policy }
    }

    pub async fn claim(&self, address: &str, now: DateTime<Utc>) -> Result<DailyClaimOutcome> {
        let user = self.load_user(address).await?;

        let (award, new_streak) = match evaluate(user.last_daily_claim_at, user.streak, now, &self.policy) {
            DailyDecision::Eligible { award, new_streak } => (award, new_streak),
            DailyDecision::Rejected { next_eligible_at } => {
                tracing::debug!("Daily claim on cooldown for {} until {}", address, next_eligible_at);
                return Err(AppError::DailyClaimCooldown {
                    next_claim_at: next_eligible_at,
                });
            }
        };

        let update = DailyClaimUpdate {
            points: award,
            streak: new_streak,
            claimed_at: now,
        };
        let applied = self
            .store
            .apply_daily_claim(address, user.last_daily_claim_at, update)
            .await?;

        if !applied {
            // Another claim landed between our read and the conditional write.
            let current = self.load_user(address).await?;
            return match evaluate(current.last_daily_claim_at, current.streak, now, &self.policy) {
                DailyDecision::Rejected { next_eligible_at } => Err(AppError::DailyClaimCooldown {
                    next_claim_at: next_eligible_at,
                }),
                DailyDecision::Eligible { .. } => Err(AppError::Conflict(
                    "Daily claim is already being processed".to_string(),
                )),
            };
        }

        let user = self.load_user(address).await?;
        tracing::info!(
            "Daily claim: user={}, points=+{}, streak={}",
            address,
            award,
            new_streak
        );

        Ok(DailyClaimOutcome {
            points_earned: award,
            new_streak,
            user,
        })
    }

    async fn load_user(&self, address: &str) -> Result<User> {
        self.store
            .get_user(address)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}
