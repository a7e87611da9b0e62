use serde::Deserialize;
use std::env;

use crate::constants::{
    DAILY_CLAIM_COOLDOWN_HOURS, DAILY_STREAK_WINDOW_HOURS, DATABASE_ACQUIRE_TIMEOUT_SECS,
    DATABASE_MAX_CONNECTIONS, DEFAULT_APP_NAME, LEADERBOARD_SIZE, MEMORY_DATABASE_URL,
    MESSAGE_MAX_AGE_SECS, MESSAGE_MAX_FUTURE_SKEW_SECS, POINTS_DAILY_CLAIM, POINTS_GAME_DRAW,
    POINTS_GAME_LOSS, POINTS_GAME_WIN, POINTS_REFERRAL_CLAIM, RANK_REFRESH_INTERVAL_SECS,
};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,
    pub environment: String,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,
    pub database_acquire_timeout_secs: u64,

    // Signed messages
    pub app_name: String,
    pub message_max_age_secs: Option<i64>,
    pub message_max_future_skew_secs: Option<i64>,

    // Rewards
    pub daily_claim_points: Option<i64>,
    pub referral_claim_points: Option<i64>,
    pub game_win_points: Option<i64>,
    pub game_draw_points: Option<i64>,
    pub game_loss_points: Option<i64>,
    pub daily_claim_cooldown_hours: Option<i64>,
    pub daily_streak_window_hours: Option<i64>,

    // Leaderboard
    pub leaderboard_size: i64,
    pub rank_refresh_interval_secs: u64,

    // CORS
    pub cors_allowed_origins: String,
}

fn optional_number<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),

            database_url: env::var("DATABASE_URL")?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| DATABASE_MAX_CONNECTIONS.to_string())
                .parse()?,
            database_acquire_timeout_secs: env::var("DATABASE_ACQUIRE_TIMEOUT_SECS")
                .unwrap_or_else(|_| DATABASE_ACQUIRE_TIMEOUT_SECS.to_string())
                .parse()?,

            app_name: env::var("APP_NAME").unwrap_or_else(|_| DEFAULT_APP_NAME.to_string()),
            message_max_age_secs: optional_number("MESSAGE_MAX_AGE_SECS"),
            message_max_future_skew_secs: optional_number("MESSAGE_MAX_FUTURE_SKEW_SECS"),

            daily_claim_points: optional_number("DAILY_CLAIM_POINTS"),
            referral_claim_points: optional_number("REFERRAL_CLAIM_POINTS"),
            game_win_points: optional_number("GAME_WIN_POINTS"),
            game_draw_points: optional_number("GAME_DRAW_POINTS"),
            game_loss_points: optional_number("GAME_LOSS_POINTS"),
            daily_claim_cooldown_hours: optional_number("DAILY_CLAIM_COOLDOWN_HOURS"),
            daily_streak_window_hours: optional_number("DAILY_STREAK_WINDOW_HOURS"),

            leaderboard_size: env::var("LEADERBOARD_SIZE")
                .unwrap_or_else(|_| LEADERBOARD_SIZE.to_string())
                .parse()?,
            rank_refresh_interval_secs: env::var("RANK_REFRESH_INTERVAL_SECS")
                .unwrap_or_else(|_| RANK_REFRESH_INTERVAL_SECS.to_string())
                .parse()?,

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string()),
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database_url.trim().is_empty() {
            anyhow::bail!("DATABASE_URL is empty");
        }
        if self.app_name.trim().is_empty() {
            anyhow::bail!("APP_NAME is empty");
        }
        if self.app_name != self.app_name.trim() {
            anyhow::bail!("APP_NAME must not start or end with whitespace");
        }
        if self.leaderboard_size <= 0 {
            anyhow::bail!("LEADERBOARD_SIZE must be > 0");
        }

        let policy = self.reward_policy();
        if policy.message_max_age_secs <= 0 {
            anyhow::bail!("MESSAGE_MAX_AGE_SECS must be > 0");
        }
        if policy.message_max_future_skew_secs < 0 {
            anyhow::bail!("MESSAGE_MAX_FUTURE_SKEW_SECS must be >= 0");
        }
        if policy.daily_cooldown_hours <= 0 {
            anyhow::bail!("DAILY_CLAIM_COOLDOWN_HOURS must be > 0");
        }
        if policy.streak_window_hours < policy.daily_cooldown_hours {
            anyhow::bail!("DAILY_STREAK_WINDOW_HOURS must be >= DAILY_CLAIM_COOLDOWN_HOURS");
        }
        if [
            policy.daily_claim_points,
            policy.referral_points,
            policy.win_points,
            policy.draw_points,
            policy.loss_points,
        ]
        .iter()
        .any(|points| *points < 0)
        {
            anyhow::bail!("Reward points must be >= 0");
        }

        if self.database_max_connections == 0 {
            tracing::warn!("DATABASE_MAX_CONNECTIONS should be > 0");
        }
        if self.cors_allowed_origins.trim().is_empty() {
            tracing::warn!("CORS_ALLOWED_ORIGINS is empty; requests may be blocked");
        }

        Ok(())
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database_url.starts_with(MEMORY_DATABASE_URL)
    }

    pub fn reward_policy(&self) -> RewardPolicy {
        let defaults = RewardPolicy::default();
        RewardPolicy {
            daily_claim_points: self.daily_claim_points.unwrap_or(defaults.daily_claim_points),
            referral_points: self.referral_claim_points.unwrap_or(defaults.referral_points),
            win_points: self.game_win_points.unwrap_or(defaults.win_points),
            draw_points: self.game_draw_points.unwrap_or(defaults.draw_points),
            loss_points: self.game_loss_points.unwrap_or(defaults.loss_points),
            daily_cooldown_hours: self
                .daily_claim_cooldown_hours
                .unwrap_or(defaults.daily_cooldown_hours),
            streak_window_hours: self
                .daily_streak_window_hours
                .unwrap_or(defaults.streak_window_hours),
            message_max_age_secs: self
                .message_max_age_secs
                .unwrap_or(defaults.message_max_age_secs),
            message_max_future_skew_secs: self
                .message_max_future_skew_secs
                .unwrap_or(defaults.message_max_future_skew_secs),
        }
    }
}

/// Tunable numbers behind every claim and game-result decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardPolicy {
    pub daily_claim_points: i64,
    pub referral_points: i64,
    pub win_points: i64,
    pub draw_points: i64,
    pub loss_points: i64,
    pub daily_cooldown_hours: i64,
    pub streak_window_hours: i64,
    pub message_max_age_secs: i64,
    pub message_max_future_skew_secs: i64,
}

impl Default for RewardPolicy {
    fn default() -> Self {
        Self {
            daily_claim_points: POINTS_DAILY_CLAIM,
            referral_points: POINTS_REFERRAL_CLAIM,
            win_points: POINTS_GAME_WIN,
            draw_points: POINTS_GAME_DRAW,
            loss_points: POINTS_GAME_LOSS,
            daily_cooldown_hours: DAILY_CLAIM_COOLDOWN_HOURS,
            streak_window_hours: DAILY_STREAK_WINDOW_HOURS,
            message_max_age_secs: MESSAGE_MAX_AGE_SECS,
            message_max_future_skew_secs: MESSAGE_MAX_FUTURE_SKEW_SECS,
        }
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 3000,
        environment: "test".to_string(),
        database_url: MEMORY_DATABASE_URL.to_string(),
        database_max_connections: 1,
        database_acquire_timeout_secs: 1,
        app_name: DEFAULT_APP_NAME.to_string(),
        message_max_age_secs: None,
        message_max_future_skew_secs: None,
        daily_claim_points: None,
        referral_claim_points: None,
        game_win_points: None,
        game_draw_points: None,
        game_loss_points: None,
        daily_claim_cooldown_hours: None,
        daily_streak_window_hours: None,
        leaderboard_size: LEADERBOARD_SIZE,
        rank_refresh_interval_secs: 0,
        cors_allowed_origins: "*".to_string(),
    }
}
