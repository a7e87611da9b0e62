use axum::{extract::rejection::JsonRejection, extract::State, Json};
use chrono::Utc;

use super::AppState;
use crate::{
    error::{AppError, Result},
    models::{ApiResponse, GameId, GameOutcome, GameResultRequest, GameResultResponse},
    services::{
        game_result::GameSubmission,
        message_format::{MessageBody, MessageKind},
        GameResultService,
    },
};

fn parse_game(req: &GameResultRequest) -> Result<(GameId, GameOutcome)> {
    let game_id = GameId::parse(&req.game_id)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown game id: {}", req.game_id)))?;
    let outcome = GameOutcome::parse(&req.result).ok_or_else(|| {
        AppError::BadRequest("Result must be one of: win, loss, draw".to_string())
    })?;
    Ok((game_id, outcome))
}

/// POST /api/game/result
pub async fn submit_game_result(
    State(state): State<AppState>,
    payload: std::result::Result<Json<GameResultRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<GameResultResponse>>> {
    let Json(req) = payload?;
    let (game_id, outcome) = parse_game(&req)?;
    let now = Utc::now();

    let claim = state.authenticator.authenticate(
        &req.address,
        &req.signature,
        &req.message,
        MessageKind::GameResult,
        now,
    )?;

    match claim.message.body {
        MessageBody::GameResult {
            game_id: signed_game,
            outcome: signed_outcome,
        } if signed_game == game_id && signed_outcome == outcome => {}
        _ => {
            tracing::debug!(
                "Signed game result does not match payload {}:{}",
                game_id,
                outcome
            );
            return Err(AppError::InvalidMessageFormat);
        }
    }

    let played = GameResultService::new(state.store.clone(), state.policy)
        .submit(
            GameSubmission {
                address: claim.address,
                game_id,
                outcome,
                bet_amount: req.bet_amount,
                tx_hash: req.tx_hash,
            },
            now,
        )
        .await?;

    Ok(Json(ApiResponse::success(GameResultResponse {
        game_result: played.record,
        points_earned: played.points_earned,
        nft_earned: played.nft_earned,
        user: played.user,
    })))
}
