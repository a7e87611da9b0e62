// src/models/mod.rs
pub mod user;

pub use user::{
    default_username,
    ApiResponse,
    AuthRequest,
    DailyClaimRequest,
    DailyClaimResponse,
    GameId,
    GameOutcome,
    GameResult,
    GameResultRequest,
    GameResultResponse,
    LeaderboardEntry,
    LeaderboardQuery,
    LeaderboardResponse,
    RefClaim,
    ReferralClaimRequest,
    ReferralClaimResponse,
    User,
    UserRank,
    UserResponse,
};
