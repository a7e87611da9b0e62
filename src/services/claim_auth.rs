use chrono::{DateTime, Utc};

use crate::{
    config::RewardPolicy,
    crypto::signature::SignatureVerifier,
    error::{AppError, Result},
    services::{
        freshness::FreshnessGuard,
        message_format::{MessageKind, MessageValidator, ParsedMessage},
    },
    utils::normalize_address,
};

/// A request that passed signature, template and freshness checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedClaim {
    /// Lower-cased wallet address of the signer.
    pub address: String,
    pub message: ParsedMessage,
}

/// Shared gate in front of every write endpoint.
pub struct ClaimAuthenticator {
    validator: MessageValidator,
    freshness: FreshnessGuard,
}

impl ClaimAuthenticator {
    pub fn new(app_name: &str, policy: &RewardPolicy) -> Result<Self> {
        Ok(Self {
            validator: MessageValidator::new(app_name)?,
            freshness: FreshnessGuard::from_policy(policy),
        })
    }

    pub fn validator(&self) -> &MessageValidator {
        &self.validator
    }

    /// Runs the checks in order: address shape, signature recovery, exact
    /// template for `kind`, freshness against `now`, and finally that the
    /// address inside the message is the signer's own.
    pub fn authenticate(
        &self,
        address: &str,
        signature: &str,
        message: &str,
        kind: MessageKind,
        now: DateTime<Utc>,
    ) -> Result<AuthenticatedClaim> {
        let address = normalize_address(address, "wallet")?;

        SignatureVerifier::ensure_signed_by(message, signature, &address)?;

        let parsed = self.validator.validate(message, kind)?;

        self.freshness
            .ensure_fresh(parsed.timestamp_ms, now.timestamp_millis())?;

        if let Some(embedded) = parsed.body.address() {
            if embedded != address {
                tracing::debug!(
                    "Message address {} does not match signer {}",
                    embedded,
                    address
                );
                return Err(AppError::InvalidMessageFormat);
            }
        }

        Ok(AuthenticatedClaim {
            address,
            message: parsed,
        })
    }
}
