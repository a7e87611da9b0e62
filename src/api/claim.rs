use axum::{extract::rejection::JsonRejection, extract::State, Json};
use chrono::Utc;

use super::AppState;
use crate::{
    error::{AppError, Result},
    models::{
        ApiResponse, DailyClaimRequest, DailyClaimResponse, ReferralClaimRequest,
        ReferralClaimResponse,
    },
    services::{
        message_format::{MessageBody, MessageKind},
        DailyClaimService, ReferralService,
    },
    utils::normalize_address,
};

/// POST /api/claim/daily
pub async fn claim_daily(
    State(state): State<AppState>,
    payload: std::result::Result<Json<DailyClaimRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<DailyClaimResponse>>> {
    let Json(req) = payload?;
    let now = Utc::now();

    let claim = state.authenticator.authenticate(
        &req.address,
        &req.signature,
        &req.message,
        MessageKind::DailyClaim,
        now,
    )?;

    let outcome = DailyClaimService::new(state.store.clone(), state.policy)
        .claim(&claim.address, now)
        .await?;

    Ok(Json(ApiResponse::success(DailyClaimResponse {
        message: format!("Daily claim successful! +{} points", outcome.points_earned),
        points_earned: outcome.points_earned,
        new_streak: outcome.new_streak,
        user: outcome.user,
    })))
}

/// POST /api/claim/referral
pub async fn claim_referral(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ReferralClaimRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<ReferralClaimResponse>>> {
    let Json(req) = payload?;
    let referrer = normalize_address(&req.referrer, "referrer")?;
    let now = Utc::now();

    let claim = state.authenticator.authenticate(
        &req.address,
        &req.signature,
        &req.message,
        MessageKind::ReferralClaim,
        now,
    )?;

    // The signed referrer must be the one being credited.
    match &claim.message.body {
        MessageBody::ReferralClaim {
            referrer: signed, ..
        } if *signed == referrer => {}
        _ => return Err(AppError::InvalidMessageFormat),
    }

    let outcome = ReferralService::new(state.store.clone(), state.policy)
        .claim(&claim.address, &referrer, now)
        .await?;

    Ok(Json(ApiResponse::success(ReferralClaimResponse {
        message: format!(
            "Referral claim successful! +{} points from {}",
            outcome.points_earned, outcome.referrer
        ),
        points_earned: outcome.points_earned,
        referrer: outcome.referrer,
        user: outcome.user,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{app, sign};
    use crate::crypto::wallet::{LocalWalletProvider, WalletProvider};
    use crate::db::Store;
    use crate::services::test_support::{friend, player, stranger};

    async fn register(state: &AppState, wallet: &LocalWalletProvider) {
        state
            .store
            .upsert_user(&wallet.address(), None, Utc::now())
            .await
            .unwrap();
    }

    async fn daily_request(state: &AppState, wallet: &LocalWalletProvider) -> DailyClaimRequest {
        let body = MessageBody::DailyClaim {
            address: wallet.address(),
        };
        let (message, signature) = sign(state, wallet, &body).await;
        DailyClaimRequest {
            address: wallet.address(),
            signature,
            message,
        }
    }

    async fn referral_request(
        state: &AppState,
        wallet: &LocalWalletProvider,
        referrer: &str,
    ) -> ReferralClaimRequest {
        let body = MessageBody::ReferralClaim {
            address: wallet.address(),
            referrer: referrer.to_string(),
        };
        let (message, signature) = sign(state, wallet, &body).await;
        ReferralClaimRequest {
            address: wallet.address(),
            referrer: referrer.to_string(),
            signature,
            message,
        }
    }

    #[tokio::test]
    async fn daily_claim_awards_then_enforces_cooldown() {
        let (_store, state) = app();
        let wallet = player();
        register(&state, &wallet).await;

        let req = daily_request(&state, &wallet).await;
        let Json(response) = claim_daily(State(state.clone()), Ok(Json(req)))
            .await
            .unwrap();
        assert_eq!(response.data.points_earned, 5);
        assert_eq!(response.data.new_streak, 1);
        assert_eq!(response.data.message, "Daily claim successful! +5 points");
        assert_eq!(response.data.user.points, 5);

        let req = daily_request(&state, &wallet).await;
        let err = claim_daily(State(state), Ok(Json(req))).await.unwrap_err();
        assert!(matches!(err, AppError::DailyClaimCooldown { .. }));
    }

    #[tokio::test]
    async fn daily_claim_rejects_auth_template() {
        let (_store, state) = app();
        let wallet = player();
        register(&state, &wallet).await;

        let body = MessageBody::Auth {
            address: wallet.address(),
        };
        let (message, signature) = sign(&state, &wallet, &body).await;
        let req = DailyClaimRequest {
            address: wallet.address(),
            signature,
            message,
        };
        let err = claim_daily(State(state), Ok(Json(req))).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidMessageFormat));
    }

    #[tokio::test]
    async fn daily_claim_for_unknown_user_is_not_found() {
        let (_store, state) = app();
        let req = daily_request(&state, &player()).await;
        let err = claim_daily(State(state), Ok(Json(req))).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn referral_claim_credits_once_per_referrer() {
        let (_store, state) = app();
        let wallet = player();
        let referrer = friend();
        register(&state, &wallet).await;
        register(&state, &referrer).await;

        let req = referral_request(&state, &wallet, &referrer.address()).await;
        let Json(response) = claim_referral(State(state.clone()), Ok(Json(req)))
            .await
            .unwrap();
        assert_eq!(response.data.points_earned, 10);
        assert_eq!(response.data.referrer, referrer.address());
        assert_eq!(
            response.data.message,
            format!(
                "Referral claim successful! +10 points from {}",
                referrer.address()
            )
        );
        assert_eq!(response.data.user.ref_claims.len(), 1);

        let req = referral_request(&state, &wallet, &referrer.address()).await;
        let err = claim_referral(State(state), Ok(Json(req)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ReferralAlreadyClaimed { .. }));
    }

    #[tokio::test]
    async fn referral_claim_rejects_self_referral() {
        let (_store, state) = app();
        let wallet = player();
        register(&state, &wallet).await;

        let req = referral_request(&state, &wallet, &wallet.address()).await;
        let err = claim_referral(State(state), Ok(Json(req)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn referral_claim_requires_signed_referrer_to_match() {
        let (_store, state) = app();
        let wallet = player();
        register(&state, &wallet).await;
        register(&state, &friend()).await;
        register(&state, &stranger()).await;

        let mut req = referral_request(&state, &wallet, &friend().address()).await;
        req.referrer = stranger().address();
        let err = claim_referral(State(state), Ok(Json(req)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidMessageFormat));
    }

    #[tokio::test]
    async fn referral_claim_rejects_unknown_referrer() {
        let (_store, state) = app();
        let wallet = player();
        register(&state, &wallet).await;

        let req = referral_request(&state, &wallet, &friend().address()).await;
        let err = claim_referral(State(state), Ok(Json(req)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
