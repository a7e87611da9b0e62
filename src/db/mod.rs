use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

use crate::{
    config::Config,
    error::{AppError, Result},
    models::*,
};

pub mod memory;

pub use memory::MemoryStore;

/// Field changes applied by a successful daily claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyClaimUpdate {
    pub points: i64,
    pub streak: i32,
    pub claimed_at: DateTime<Utc>,
}

/// Outcome of the conditional referral write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferralWrite {
    Applied,
    AlreadyClaimed { claimed_at: DateTime<Utc> },
}

/// Persistence seam for users, referral claims and the game ledger.
///
/// Every mutating call is atomic per address: callers never read-modify-write
/// a whole user record.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    async fn ping(&self) -> Result<()>;

    async fn get_user(&self, address: &str) -> Result<Option<User>>;

    /// Inserts a user for `address` or, when it exists, bumps `updated_at`
    /// and replaces the username if one is given.
    async fn upsert_user(
        &self,
        address: &str,
        username: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<User>;

    /// Compare-and-swap on `last_daily_claim_at`. Returns `false` without
    /// writing when the stored value no longer equals `expected_last`.
    async fn apply_daily_claim(
        &self,
        address: &str,
        expected_last: Option<DateTime<Utc>>,
        update: DailyClaimUpdate,
    ) -> Result<bool>;

    /// Records the (address, referrer) pair and awards `points`, unless the
    /// pair already exists.
    async fn apply_referral_claim(
        &self,
        address: &str,
        referrer: &str,
        points: i64,
        now: DateTime<Utc>,
    ) -> Result<ReferralWrite>;

    /// Appends the ledger row, increments points by its delta and appends its
    /// reward URI to the user's NFTs when not already held.
    async fn record_game_result(&self, record: &GameResult) -> Result<()>;

    /// Users ordered by points desc, created_at asc, address asc.
    async fn top_users(&self, limit: i64) -> Result<Vec<User>>;

    /// Number of users strictly ahead of `user` in leaderboard order.
    async fn count_outranking(&self, user: &User) -> Result<i64>;

    /// Rewrites the cached `rank` column; returns rows changed.
    async fn refresh_rank_cache(&self) -> Result<u64>;
}

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .acquire_timeout(Duration::from_secs(config.database_acquire_timeout_secs))
            .connect(&config.database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn load_ref_claims(&self, user: &mut User) -> Result<()> {
        user.ref_claims = sqlx::query_as::<_, RefClaim>(
            "SELECT referrer, claimed_at FROM referral_claims
             WHERE user_address = $1
             ORDER BY claimed_at ASC",
        )
        .bind(&user.address)
        .fetch_all(&self.pool)
        .await?;
        Ok(())
    }
}

// ==================== USER QUERIES ====================
#[async_trait::async_trait]
impl Store for Database {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn get_user(&self, address: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE address = $1")
            .bind(address)
            .fetch_optional(&self.pool)
            .await?;

        match user {
            Some(mut user) => {
                self.load_ref_claims(&mut user).await?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    async fn upsert_user(
        &self,
        address: &str,
        username: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<User> {
        let initial_username = username
            .map(str::to_string)
            .unwrap_or_else(|| default_username(address));

        let mut user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (address, username, created_at, updated_at)
            VALUES ($1, $2, $3, $3)
            ON CONFLICT (address) DO UPDATE
            SET username   = COALESCE($4, users.username),
                updated_at = $3
            RETURNING *
            "#,
        )
        .bind(address)
        .bind(&initial_username)
        .bind(now)
        .bind(username)
        .fetch_one(&self.pool)
        .await?;

        self.load_ref_claims(&mut user).await?;
        Ok(user)
    }

    async fn apply_daily_claim(
        &self,
        address: &str,
        expected_last: Option<DateTime<Utc>>,
        update: DailyClaimUpdate,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET points              = points + $2,
                streak              = $3,
                last_daily_claim_at = $4,
                updated_at          = $4
            WHERE address = $1
              AND last_daily_claim_at IS NOT DISTINCT FROM $5
            "#,
        )
        .bind(address)
        .bind(update.points)
        .bind(update.streak)
        .bind(update.claimed_at)
        .bind(expected_last)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn apply_referral_claim(
        &self,
        address: &str,
        referrer: &str,
        points: i64,
        now: DateTime<Utc>,
    ) -> Result<ReferralWrite> {
        let mut tx = self.pool.begin().await?;

        let inserted: Option<DateTime<Utc>> = sqlx::query_scalar(
            r#"
            INSERT INTO referral_claims (user_address, referrer, claimed_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_address, referrer) DO NOTHING
            RETURNING claimed_at
            "#,
        )
        .bind(address)
        .bind(referrer)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        if inserted.is_none() {
            let claimed_at: DateTime<Utc> = sqlx::query_scalar(
                "SELECT claimed_at FROM referral_claims WHERE user_address = $1 AND referrer = $2",
            )
            .bind(address)
            .bind(referrer)
            .fetch_one(&mut *tx)
            .await?;
            tx.rollback().await?;
            return Ok(ReferralWrite::AlreadyClaimed { claimed_at });
        }

        let updated = sqlx::query(
            "UPDATE users SET points = points + $2, updated_at = $3 WHERE address = $1",
        )
        .bind(address)
        .bind(points)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() != 1 {
            tx.rollback().await?;
            return Err(AppError::NotFound("User not found".to_string()));
        }

        tx.commit().await?;
        Ok(ReferralWrite::Applied)
    }

    async fn record_game_result(&self, record: &GameResult) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE users
            SET points     = points + $2,
                nfts       = CASE
                                 WHEN $3::TEXT IS NULL OR $3::TEXT = ANY(nfts) THEN nfts
                                 ELSE array_append(nfts, $3::TEXT)
                             END,
                updated_at = $4
            WHERE address = $1
            "#,
        )
        .bind(&record.address)
        .bind(record.points_delta)
        .bind(&record.reward_uri)
        .bind(record.created_at)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() != 1 {
            tx.rollback().await?;
            return Err(AppError::NotFound("User not found".to_string()));
        }

        sqlx::query(
            r#"
            INSERT INTO game_results
                (address, game_id, result, bet_amount, tx_hash, points_delta, reward_uri, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&record.address)
        .bind(&record.game_id)
        .bind(&record.result)
        .bind(&record.bet_amount)
        .bind(&record.tx_hash)
        .bind(record.points_delta)
        .bind(&record.reward_uri)
        .bind(record.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn top_users(&self, limit: i64) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users
             ORDER BY points DESC, created_at ASC, address ASC
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn count_outranking(&self, user: &User) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM users
            WHERE points > $1
               OR (points = $1 AND created_at < $2)
               OR (points = $1 AND created_at = $2 AND address < $3)
            "#,
        )
        .bind(user.points)
        .bind(user.created_at)
        .bind(&user.address)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn refresh_rank_cache(&self) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE users u
            SET rank = r.position::INTEGER
            FROM (
                SELECT address,
                       ROW_NUMBER() OVER (ORDER BY points DESC, created_at ASC, address ASC) AS position
                FROM users
            ) r
            WHERE u.address = r.address
              AND u.rank <> r.position
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn database_new_returns_error_on_invalid_url() {
        let mut config = crate::config::test_config();
        config.database_url = "not-a-url".to_string();
        let result = Database::new(&config).await;
        assert!(result.is_err());
    }
}
