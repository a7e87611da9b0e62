use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::{db::Store, error::Result, models::User};

pub struct UserService {
    store: Arc<dyn Store>,
}

impl UserService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Creates the profile on first authenticated call; afterwards only the
    /// username (when given) and `updated_at` change.
    pub async fn authenticate_or_create(
        &self,
        address: &str,
        username: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<User> {
        let user = self.store.upsert_user(address, username, now).await?;
        if user.created_at == user.updated_at {
            tracing::info!("Created user {} ({})", user.address, user.username);
        } else {
            tracing::debug!("Authenticated user {}", user.address);
        }
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use chrono::Duration;

    #[tokio::test]
    async fn first_call_creates_with_defaults() {
        let service = UserService::new(Arc::new(MemoryStore::new()));
        let now = Utc::now();
        let user = service
            .authenticate_or_create("0x2c7536e3605d9c16a7a3d7b1898e529396a65c23", None, now)
            .await
            .unwrap();

        assert_eq!(user.username, "Player_a65c23");
        assert_eq!(user.points, 0);
        assert_eq!(user.streak, 0);
        assert!(user.nfts.is_empty());
        assert!(user.ref_claims.is_empty());
        assert!(user.last_daily_claim_at.is_none());
        assert_eq!(user.created_at, now);
    }

    #[tokio::test]
    async fn later_calls_keep_address_and_progress() {
        let store = Arc::new(MemoryStore::new());
        let service = UserService::new(store.clone());
        let t0 = Utc::now();
        let address = "0x2c7536e3605d9c16a7a3d7b1898e529396a65c23";
        service.authenticate_or_create(address, None, t0).await.unwrap();

        let t1 = t0 + Duration::hours(1);
        let user = service
            .authenticate_or_create(address, Some("rocky"), t1)
            .await
            .unwrap();
        assert_eq!(user.address, address);
        assert_eq!(user.username, "rocky");
        assert_eq!(user.created_at, t0);
        assert_eq!(user.updated_at, t1);
    }
}
