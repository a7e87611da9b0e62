use axum::{
    extract::{Query, State},
    Json,
};

use super::AppState;
use crate::{
    error::Result,
    models::{ApiResponse, LeaderboardQuery, LeaderboardResponse},
    services::LeaderboardService,
};

/// GET /api/leaderboard/top
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<ApiResponse<LeaderboardResponse>>> {
    let service = LeaderboardService::new(state.store.clone(), state.config.leaderboard_size);
    let response = service.leaderboard(query.user_address.as_deref()).await?;

    Ok(Json(ApiResponse::success(response)))
}
