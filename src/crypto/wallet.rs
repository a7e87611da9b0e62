use std::str::FromStr;

use ethers::signers::{LocalWallet, Signer};

use crate::error::{AppError, Result};

/// Wallet capability handed to whatever needs to sign claim messages.
/// Production clients sign in the browser wallet; local tools and tests
/// inject a [`LocalWalletProvider`].
#[async_trait::async_trait]
pub trait WalletProvider: Send + Sync {
    /// Lower-cased `0x` address of the connected account.
    fn address(&self) -> String;

    /// Personal-sign `message`, returning a `0x`-prefixed 65-byte hex signature.
    async fn sign_message(&self, message: &str) -> Result<String>;
}

pub struct LocalWalletProvider {
    wallet: LocalWallet,
}

impl LocalWalletProvider {
    pub fn from_private_key(private_key: &str) -> Result<Self> {
        let wallet = LocalWallet::from_str(private_key.trim())
            .map_err(|e| AppError::Internal(format!("Invalid private key: {}", e)))?;
        Ok(Self { wallet })
    }

    /// EIP-55 mixed-case form of [`WalletProvider::address`].
    pub fn checksum_address(&self) -> String {
        ethers::utils::to_checksum(&self.wallet.address(), None)
    }
}

#[async_trait::async_trait]
impl WalletProvider for LocalWalletProvider {
    fn address(&self) -> String {
        format!("{:#x}", self.wallet.address())
    }

    async fn sign_message(&self, message: &str) -> Result<String> {
        let signature = self
            .wallet
            .sign_message(message)
            .await
            .map_err(|e| AppError::Internal(format!("Signing failed: {}", e)))?;
        Ok(format!("0x{}", signature))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_is_lowercase_hex() {
        let wallet = LocalWalletProvider::from_private_key(
            "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318",
        )
        .unwrap();
        let address = wallet.address();
        assert_eq!(address, "0x2c7536e3605d9c16a7a3d7b1898e529396a65c23");
        assert_eq!(address, address.to_lowercase());
        assert_eq!(wallet.checksum_address().to_lowercase(), address);
    }

    #[tokio::test]
    async fn signatures_are_65_bytes_hex() {
        let wallet = LocalWalletProvider::from_private_key(
            "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318",
        )
        .unwrap();
        let signature = wallet.sign_message("hello").await.unwrap();
        assert!(signature.starts_with("0x"));
        assert_eq!(signature.len(), 2 + 130);
    }

    #[test]
    fn invalid_key_is_an_error() {
        assert!(LocalWalletProvider::from_private_key("not-a-key").is_err());
    }
}
