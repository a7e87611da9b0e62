//! Fixed templates for signed claim messages.
//!
//! Every message is `<AppName> <purpose>: <fields> @ <unix millis>`. A
//! signature is only ever accepted for the template of the endpoint it is
//! presented to, so a signed auth message cannot be replayed as a claim.

use regex::Regex;
use serde::Deserialize;

use crate::{
    error::{AppError, Result},
    models::{GameId, GameOutcome},
};

const ADDRESS_PATTERN: &str = "(0x[0-9a-fA-F]{40})";
const TIMESTAMP_PATTERN: &str = "([0-9]{1,18})";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageKind {
    Auth,
    DailyClaim,
    ReferralClaim,
    GameResult,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    Auth { address: String },
    DailyClaim { address: String },
    ReferralClaim { address: String, referrer: String },
    GameResult { game_id: GameId, outcome: GameOutcome },
}

impl MessageBody {
    #[cfg(test)]
    pub fn kind(&self) -> MessageKind {
        match self {
            MessageBody::Auth { .. } => MessageKind::Auth,
            MessageBody::DailyClaim { .. } => MessageKind::DailyClaim,
            MessageBody::ReferralClaim { .. } => MessageKind::ReferralClaim,
            MessageBody::GameResult { .. } => MessageKind::GameResult,
        }
    }

    /// Signer address embedded in the message, lower-cased. Game-result
    /// messages carry none.
    pub fn address(&self) -> Option<&str> {
        match self {
            MessageBody::Auth { address }
            | MessageBody::DailyClaim { address }
            | MessageBody::ReferralClaim { address, .. } => Some(address),
            MessageBody::GameResult { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMessage {
    pub body: MessageBody,
    pub timestamp_ms: i64,
}

pub struct MessageValidator {
    app_name: String,
    auth: Regex,
    daily: Regex,
    referral: Regex,
    game_result: Regex,
}

impl MessageValidator {
    pub fn new(app_name: &str) -> Result<Self> {
        let app = regex::escape(app_name);
        let games = GameId::ALL
            .iter()
            .map(|game| regex::escape(game.as_str()))
            .collect::<Vec<_>>()
            .join("|");

        let compile = |pattern: String| {
            Regex::new(&pattern)
                .map_err(|e| AppError::Internal(format!("Invalid message template: {}", e)))
        };

        Ok(Self {
            app_name: app_name.to_string(),
            auth: compile(format!(
                "^{app} auth: {ADDRESS_PATTERN} @ {TIMESTAMP_PATTERN}$"
            ))?,
            daily: compile(format!(
                "^{app} daily claim: {ADDRESS_PATTERN} @ {TIMESTAMP_PATTERN}$"
            ))?,
            referral: compile(format!(
                "^{app} referral claim: {ADDRESS_PATTERN} from {ADDRESS_PATTERN} @ {TIMESTAMP_PATTERN}$"
            ))?,
            game_result: compile(format!(
                "^{app} game result: ({games}) (win|loss|draw) @ {TIMESTAMP_PATTERN}$"
            ))?,
        })
    }

    /// Matches `message` against the exact template for `kind` and extracts
    /// its fields and trailing timestamp.
    pub fn validate(&self, message: &str, kind: MessageKind) -> Result<ParsedMessage> {
        let regex = match kind {
            MessageKind::Auth => &self.auth,
            MessageKind::DailyClaim => &self.daily,
            MessageKind::ReferralClaim => &self.referral,
            MessageKind::GameResult => &self.game_result,
        };

        let caps = regex
            .captures(message)
            .ok_or(AppError::InvalidMessageFormat)?;
        let group = |i: usize| caps.get(i).map(|m| m.as_str()).unwrap_or_default();

        let (body, timestamp) = match kind {
            MessageKind::Auth => (
                MessageBody::Auth {
                    address: group(1).to_ascii_lowercase(),
                },
                group(2),
            ),
            MessageKind::DailyClaim => (
                MessageBody::DailyClaim {
                    address: group(1).to_ascii_lowercase(),
                },
                group(2),
            ),
            MessageKind::ReferralClaim => (
                MessageBody::ReferralClaim {
                    address: group(1).to_ascii_lowercase(),
                    referrer: group(2).to_ascii_lowercase(),
                },
                group(3),
            ),
            MessageKind::GameResult => (
                MessageBody::GameResult {
                    game_id: GameId::parse(group(1)).ok_or(AppError::InvalidMessageFormat)?,
                    outcome: GameOutcome::parse(group(2)).ok_or(AppError::InvalidMessageFormat)?,
                },
                group(3),
            ),
        };

        let timestamp_ms = timestamp
            .parse::<i64>()
            .map_err(|_| AppError::InvalidMessageFormat)?;

        Ok(ParsedMessage { body, timestamp_ms })
    }

    /// Builds the exact text a wallet must sign for `body`.
    pub fn render(&self, body: &MessageBody, timestamp_ms: i64) -> String {
        let app = &self.app_name;
        match body {
            MessageBody::Auth { address } => format!("{app} auth: {address} @ {timestamp_ms}"),
            MessageBody::DailyClaim { address } => {
                format!("{app} daily claim: {address} @ {timestamp_ms}")
            }
            MessageBody::ReferralClaim { address, referrer } => {
                format!("{app} referral claim: {address} from {referrer} @ {timestamp_ms}")
            }
            MessageBody::GameResult { game_id, outcome } => {
                format!("{app} game result: {game_id} {outcome} @ {timestamp_ms}")
            }
        }
    }
}
