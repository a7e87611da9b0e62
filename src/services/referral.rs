use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::{
    config::RewardPolicy,
    db::{ReferralWrite, Store},
    error::{AppError, Result},
    models::User,
};

pub fn ensure_not_self_referral(address: &str, referrer: &str) -> Result<()> {
    if address.eq_ignore_ascii_case(referrer) {
        return Err(AppError::BadRequest(
            "Cannot claim referral from yourself".to_string(),
        ));
    }
    Ok(())
}

/// Referral rule: no self-referral, the referrer must exist and each
/// (claimant, referrer) pair pays out once. Returns the points to award.
pub fn evaluate(
    claimant: &User,
    referrer: &str,
    referrer_user: Option<&User>,
    policy: &RewardPolicy,
) -> Result<i64> {
    ensure_not_self_referral(&claimant.address, referrer)?;

    if referrer_user.is_none() {
        return Err(AppError::NotFound("Referrer not found".to_string()));
    }

    if let Some(existing) = claimant.ref_claim_from(referrer) {
        return Err(AppError::ReferralAlreadyClaimed {
            claimed_at: existing.claimed_at,
        });
    }

    Ok(policy.referral_points)
}

#[derive(Debug, Clone)]
pub struct ReferralClaimOutcome {
    pub points_earned: i64,
    pub referrer: String,
    pub user: User,
}

pub struct ReferralService {
    store: Arc<dyn Store>,
    policy: RewardPolicy,
}

impl ReferralService {
    pub fn new(store: Arc<dyn Store>, policy: RewardPolicy) -> Self {
        Self { store, policy }
    }

    /// `address` and `referrer` must already be normalized.
    pub async fn claim(
        &self,
        address: &str,
        referrer: &str,
        now: DateTime<Utc>,
    ) -> Result<ReferralClaimOutcome> {
        ensure_not_self_referral(address, referrer)?;

        let user = self
            .store
            .get_user(address)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        let referrer_user = self.store.get_user(referrer).await?;

        let award = evaluate(&user, referrer, referrer_user.as_ref(), &self.policy)?;

        match self
            .store
            .apply_referral_claim(address, referrer, award, now)
            .await?
        {
            ReferralWrite::Applied => {}
            ReferralWrite::AlreadyClaimed { claimed_at } => {
                tracing::debug!("Referral {} -> {} claimed concurrently", referrer, address);
                return Err(AppError::ReferralAlreadyClaimed { claimed_at });
            }
        }

        let user = self
            .store
            .get_user(address)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        tracing::info!(
            "Referral claim: user={}, referrer={}, points=+{}",
            address,
            referrer,
            award
        );

        Ok(ReferralClaimOutcome {
            points_earned: award,
            referrer: referrer.to_string(),
            user,
        })
    }
}
