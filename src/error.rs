use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Invalid message format")]
    InvalidMessageFormat,

    #[error("Message expired")]
    MessageExpired,

    #[error("{0}")]
    NotFound(String),

    #[error("Daily claim already used")]
    DailyClaimCooldown { next_claim_at: DateTime<Utc> },

    #[error("Referral already claimed from this address")]
    ReferralAlreadyClaimed { claimed_at: DateTime<Utc> },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String, Option<serde_json::Value>) {
        match self {
            AppError::InvalidSignature => (
                StatusCode::UNAUTHORIZED,
                "INVALID_SIGNATURE",
                "Invalid signature".to_string(),
                None,
            ),
            AppError::InvalidMessageFormat => (
                StatusCode::UNAUTHORIZED,
                "INVALID_MESSAGE_FORMAT",
                "Invalid message format".to_string(),
                None,
            ),
            AppError::MessageExpired => (
                StatusCode::UNAUTHORIZED,
                "MESSAGE_EXPIRED",
                "Message expired".to_string(),
                None,
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone(), None),
            AppError::DailyClaimCooldown { next_claim_at } => (
                StatusCode::CONFLICT,
                "DAILY_CLAIM_COOLDOWN",
                self.to_string(),
                Some(json!({ "nextClaimAt": next_claim_at })),
            ),
            AppError::ReferralAlreadyClaimed { claimed_at } => (
                StatusCode::CONFLICT,
                "REFERRAL_ALREADY_CLAIMED",
                self.to_string(),
                Some(json!({ "claimedAt": claimed_at })),
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone(), None),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone(), None)
            }
            AppError::Database(_) | AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error".to_string(),
                None,
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = self.parts();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Request failed: {}", self);
        }

        let body = Json(ErrorResponse {
            success: false,
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
