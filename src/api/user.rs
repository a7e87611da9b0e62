use axum::{extract::rejection::JsonRejection, extract::State, Json};
use chrono::Utc;

use super::AppState;
use crate::{
    error::Result,
    models::{ApiResponse, AuthRequest, UserResponse},
    services::{message_format::MessageKind, UserService},
    utils::validate_username,
};

/// POST /api/user/upsert
pub async fn upsert_user(
    State(state): State<AppState>,
    payload: std::result::Result<Json<AuthRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<UserResponse>>> {
    let Json(req) = payload?;
    let username = validate_username(req.username.as_deref())?;
    let now = Utc::now();

    let claim = state.authenticator.authenticate(
        &req.address,
        &req.signature,
        &req.message,
        MessageKind::Auth,
        now,
    )?;

    let user = UserService::new(state.store.clone())
        .authenticate_or_create(&claim.address, username.as_deref(), now)
        .await?;

    Ok(Json(ApiResponse::success(UserResponse { user })))
}
