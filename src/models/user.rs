use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::constants::{DEFAULT_USERNAME_PREFIX, GAME_REWARD_URIS};

// ==================== USER ====================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub address: String,
    pub username: String,
    pub points: i64,
    pub nfts: Vec<String>,
    pub streak: i32,
    pub rank: i32,
    pub last_daily_claim_at: Option<DateTime<Utc>>,
    #[sqlx(skip)]
    pub ref_claims: Vec<RefClaim>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Fresh record for a first-time authenticated address.
    pub fn new(address: &str, username: Option<&str>, now: DateTime<Utc>) -> Self {
        Self {
            address: address.to_string(),
            username: username
                .map(str::to_string)
                .unwrap_or_else(|| default_username(address)),
            points: 0,
            nfts: Vec::new(),
            streak: 0,
            rank: 0,
            last_daily_claim_at: None,
            ref_claims: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn ref_claim_from(&self, referrer: &str) -> Option<&RefClaim> {
        self.ref_claims
            .iter()
            .find(|claim| claim.referrer.eq_ignore_ascii_case(referrer))
    }

    pub fn summary(&self, rank: i64) -> LeaderboardEntry {
        LeaderboardEntry {
            rank,
            address: self.address.clone(),
            username: self.username.clone(),
            points: self.points,
            streak: self.streak,
            nfts: self.nfts.clone(),
        }
    }
}

pub fn default_username(address: &str) -> String {
    let start = address.len().saturating_sub(6);
    format!("{}{}", DEFAULT_USERNAME_PREFIX, &address[start..])
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RefClaim {
    pub referrer: String,
    #[serde(rename = "at")]
    pub claimed_at: DateTime<Utc>,
}

// ==================== GAMES ====================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameId {
    #[serde(rename = "rps")]
    Rps,
    #[serde(rename = "coin")]
    Coin,
    #[serde(rename = "dice")]
    Dice,
    #[serde(rename = "guess")]
    Guess,
    #[serde(rename = "tictactoe")]
    TicTacToe,
    #[serde(rename = "blackjack")]
    Blackjack,
    #[serde(rename = "memory")]
    Memory,
    #[serde(rename = "2048")]
    Game2048,
    #[serde(rename = "reaction")]
    Reaction,
    #[serde(rename = "scramble")]
    Scramble,
}

impl GameId {
    pub const ALL: [GameId; 10] = [
        GameId::Rps,
        GameId::Coin,
        GameId::Dice,
        GameId::Guess,
        GameId::TicTacToe,
        GameId::Blackjack,
        GameId::Memory,
        GameId::Game2048,
        GameId::Reaction,
        GameId::Scramble,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameId::Rps => "rps",
            GameId::Coin => "coin",
            GameId::Dice => "dice",
            GameId::Guess => "guess",
            GameId::TicTacToe => "tictactoe",
            GameId::Blackjack => "blackjack",
            GameId::Memory => "memory",
            GameId::Game2048 => "2048",
            GameId::Reaction => "reaction",
            GameId::Scramble => "scramble",
        }
    }

    /// Exact, case-sensitive lookup.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|game| game.as_str() == value)
    }

    pub fn reward_uri(&self) -> &'static str {
        let id = self.as_str();
        GAME_REWARD_URIS
            .iter()
            .find(|(game, _)| *game == id)
            .map(|(_, uri)| *uri)
            .unwrap_or_default()
    }
}

impl std::fmt::Display for GameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameOutcome {
    Win,
    Loss,
    Draw,
}

impl GameOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameOutcome::Win => "win",
            GameOutcome::Loss => "loss",
            GameOutcome::Draw => "draw",
        }
    }

    /// Exact lookup; `lose` is not an accepted spelling.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "win" => Some(GameOutcome::Win),
            "loss" => Some(GameOutcome::Loss),
            "draw" => Some(GameOutcome::Draw),
            _ => None,
        }
    }
}

impl std::fmt::Display for GameOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only ledger row for one played round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GameResult {
    pub address: String,
    pub game_id: String,
    pub result: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bet_amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    pub points_delta: i64,
    #[serde(rename = "nftUri", skip_serializing_if = "Option::is_none")]
    pub reward_uri: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ==================== REQUESTS ====================
#[derive(Debug, Deserialize)]
pub struct AuthRequest {
    pub address: String,
    pub signature: String,
    pub message: String,
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DailyClaimRequest {
    pub address: String,
    pub signature: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ReferralClaimRequest {
    pub address: String,
    pub referrer: String,
    pub signature: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResultRequest {
    pub address: String,
    pub game_id: String,
    pub result: String,
    pub bet_amount: Option<String>,
    pub tx_hash: Option<String>,
    pub signature: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardQuery {
    pub user_address: Option<String>,
}

// ==================== RESPONSES ====================
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: User,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyClaimResponse {
    pub message: String,
    pub points_earned: i64,
    pub new_streak: i32,
    pub user: User,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralClaimResponse {
    pub message: String,
    pub points_earned: i64,
    pub referrer: String,
    pub user: User,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResultResponse {
    pub game_result: GameResult,
    pub points_earned: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nft_earned: Option<String>,
    pub user: User,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: i64,
    pub address: String,
    pub username: String,
    pub points: i64,
    pub streak: i32,
    pub nfts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRank {
    pub rank: i64,
    pub user: LeaderboardEntry,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardResponse {
    pub leaderboard: Vec<LeaderboardEntry>,
    pub user_rank: Option<UserRank>,
}

// ==================== API RESPONSE ====================
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn api_response_success_sets_flag() {
        let response = ApiResponse::success("ok");
        assert!(response.success);
        assert_eq!(response.data, "ok");
    }

    #[test]
    fn default_username_uses_address_suffix() {
        assert_eq!(
            default_username("0x2c7536e3605d9c16a7a3d7b1898e529396a65c23"),
            "Player_a65c23"
        );
        assert_eq!(default_username("abc"), "Player_abc");
    }

    #[test]
    fn game_ids_round_trip_through_their_wire_names() {
        for game in GameId::ALL {
            assert_eq!(GameId::parse(game.as_str()), Some(game));
            assert!(game.reward_uri().starts_with("ipfs://"));
        }
        assert_eq!(GameId::parse("RPS"), None);
        assert_eq!(GameId::parse("chess"), None);
        assert_eq!(GameId::Game2048.reward_uri(), "ipfs://2048-nft");
    }

    #[test]
    fn lose_is_not_an_outcome() {
        assert_eq!(GameOutcome::parse("loss"), Some(GameOutcome::Loss));
        assert_eq!(GameOutcome::parse("lose"), None);
        assert_eq!(GameOutcome::parse("Win"), None);
    }

    #[test]
    fn user_serializes_camel_case_profile() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut user = User::new("0x00000000000000000000000000000000000000aa", None, now);
        user.ref_claims.push(RefClaim {
            referrer: "0x00000000000000000000000000000000000000bb".into(),
            claimed_at: now,
        });
        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["username"], "Player_0000aa");
        assert!(value.get("lastDailyClaimAt").is_some());
        assert_eq!(value["refClaims"][0]["at"], serde_json::json!(now));
        assert!(value.get("createdAt").is_some());
    }

    #[test]
    fn ref_claim_lookup_ignores_case() {
        let now = Utc::now();
        let mut user = User::new("0x00000000000000000000000000000000000000aa", None, now);
        user.ref_claims.push(RefClaim {
            referrer: "0x00000000000000000000000000000000000000bb".into(),
            claimed_at: now,
        });
        assert!(user
            .ref_claim_from("0x00000000000000000000000000000000000000BB")
            .is_some());
        assert!(user
            .ref_claim_from("0x00000000000000000000000000000000000000cc")
            .is_none());
    }
}
