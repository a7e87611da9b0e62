use std::str::FromStr;

use ethers::types::{Address, Signature};

use crate::error::{AppError, Result};
use crate::utils::is_wallet_address;

/// Verifies personal-sign (EIP-191) wallet signatures.
pub struct SignatureVerifier;

impl SignatureVerifier {
    /// Recovers the signer of `message` and compares it with `claimed_address`
    /// (case-insensitive). Malformed signatures or addresses verify as `false`.
    pub fn verify_signature(message: &str, signature: &str, claimed_address: &str) -> bool {
        let Some(claimed) = parse_address(claimed_address) else {
            return false;
        };

        match Self::recover_signer(message, signature) {
            Some(recovered) => recovered == claimed,
            None => false,
        }
    }

    /// Same check as [`verify_signature`](Self::verify_signature), as a request guard.
    pub fn ensure_signed_by(message: &str, signature: &str, claimed_address: &str) -> Result<()> {
        if Self::verify_signature(message, signature, claimed_address) {
            Ok(())
        } else {
            tracing::debug!("Signature does not recover to {}", claimed_address);
            Err(AppError::InvalidSignature)
        }
    }

    /// `recover` hashes `message` with the EIP-191 personal-sign prefix.
    fn recover_signer(message: &str, signature: &str) -> Option<Address> {
        let signature = Signature::from_str(signature.trim()).ok()?;
        signature.recover(message).ok()
    }
}

fn parse_address(value: &str) -> Option<Address> {
    if !is_wallet_address(value) {
        return None;
    }
    Address::from_str(value).ok()
}
