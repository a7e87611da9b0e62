// src/api/mod.rs

pub mod claim;
pub mod game;
pub mod health;
pub mod leaderboard;
pub mod message;
pub mod user;

use std::sync::Arc;

use crate::config::{Config, RewardPolicy};
use crate::db::Store;
use crate::error::Result;
use crate::services::ClaimAuthenticator;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Config,
    pub policy: RewardPolicy,
    pub authenticator: Arc<ClaimAuthenticator>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Result<Self> {
        let policy = config.reward_policy();
        let authenticator = ClaimAuthenticator::new(&config.app_name, &policy)?;
        Ok(Self {
            store,
            config,
            policy,
            authenticator: Arc::new(authenticator),
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::AppState;
    use crate::config::test_config;
    use crate::crypto::wallet::WalletProvider;
    use crate::db::MemoryStore;
    use crate::services::message_format::MessageBody;
    use chrono::Utc;
    use std::sync::Arc;

    pub fn app() -> (Arc<MemoryStore>, AppState) {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone(), test_config()).unwrap();
        (store, state)
    }

    /// Renders `body` stamped with the current time and signs it.
    pub async fn sign(
        state: &AppState,
        wallet: &dyn WalletProvider,
        body: &MessageBody,
    ) -> (String, String) {
        let message = state
            .authenticator
            .validator()
            .render(body, Utc::now().timestamp_millis());
        let signature = wallet.sign_message(&message).await.unwrap();
        (message, signature)
    }
}
