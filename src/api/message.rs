use axum::{extract::rejection::JsonRejection, extract::State, Json};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::{
    error::{AppError, Result},
    models::{ApiResponse, GameId, GameOutcome},
    services::message_format::{MessageBody, MessageKind},
    utils::normalize_address,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareMessageRequest {
    pub kind: MessageKind,
    /// Not part of the game-result template, so ignored for that kind.
    pub address: Option<String>,
    pub referrer: Option<String>,
    pub game_id: Option<String>,
    pub result: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareMessageResponse {
    pub message: String,
    pub timestamp: i64,
    pub expires_at: DateTime<Utc>,
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("{} is required", field)))
}

fn message_body(req: &PrepareMessageRequest) -> Result<MessageBody> {
    let wallet = || normalize_address(required(&req.address, "address")?, "wallet");
    let body = match req.kind {
        MessageKind::Auth => MessageBody::Auth { address: wallet()? },
        MessageKind::DailyClaim => MessageBody::DailyClaim { address: wallet()? },
        MessageKind::ReferralClaim => MessageBody::ReferralClaim {
            address: wallet()?,
            referrer: normalize_address(required(&req.referrer, "referrer")?, "referrer")?,
        },
        MessageKind::GameResult => {
            let game_id = required(&req.game_id, "gameId")?;
            let result = required(&req.result, "result")?;
            MessageBody::GameResult {
                game_id: GameId::parse(game_id)
                    .ok_or_else(|| AppError::BadRequest(format!("Unknown game id: {}", game_id)))?,
                outcome: GameOutcome::parse(result).ok_or_else(|| {
                    AppError::BadRequest("Result must be one of: win, loss, draw".to_string())
                })?,
            }
        }
    };
    Ok(body)
}

/// POST /api/message/prepare
///
/// Returns the exact text the wallet has to sign for the next call, stamped
/// with server time so client clock drift cannot expire it.
pub async fn prepare_message(
    State(state): State<AppState>,
    payload: std::result::Result<Json<PrepareMessageRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<PrepareMessageResponse>>> {
    let Json(req) = payload?;
    let body = message_body(&req)?;

    let now = Utc::now();
    let timestamp = now.timestamp_millis();
    let message = state.authenticator.validator().render(&body, timestamp);

    Ok(Json(ApiResponse::success(PrepareMessageResponse {
        message,
        timestamp,
        expires_at: now + Duration::seconds(state.policy.message_max_age_secs),
    })))
}
