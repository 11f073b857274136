use chrono::{DateTime, Utc};
use rocket_db_pools::sqlx::PgPool;
use uuid::Uuid;

use crate::auth::refresh_store::RefreshTokenStore;
use crate::models::{Chirp, RefreshToken, User};
use crate::store::{ChirpStore, SortOrder, StoreError, StoreResult, UserStore};

const USER_COLUMNS: &str = "id, created_at, updated_at, email, hashed_password, is_chirpy_red";
const CHIRP_COLUMNS: &str = "id, created_at, updated_at, body, user_id";
const REFRESH_TOKEN_COLUMNS: &str = "token, created_at, updated_at, user_id, expires_at, revoked_at";

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[rocket::async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, email: &str, hashed_password: &str) -> StoreResult<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, created_at, updated_at, email, hashed_password) \
             VALUES ($1, NOW(), NOW(), $2, $3) RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_user_credentials(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> StoreResult<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET email = $2, hashed_password = $3, updated_at = NOW() \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn upgrade_user(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE users SET is_chirpy_red = TRUE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_all_users(&self) -> StoreResult<u64> {
        // chirps and refresh_tokens cascade.
        let result = sqlx::query("DELETE FROM users").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

#[rocket::async_trait]
impl ChirpStore for PgStore {
    async fn create_chirp(&self, user_id: Uuid, body: &str) -> StoreResult<Chirp> {
        let result = sqlx::query_as::<_, Chirp>(&format!(
            "INSERT INTO chirps (id, created_at, updated_at, body, user_id) \
             VALUES ($1, NOW(), NOW(), $2, $3) RETURNING {CHIRP_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(body)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(chirp) => Ok(chirp),
            Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
                Err(StoreError::NotFound)
            }
            Err(err) => Err(StoreError::from(err)),
        }
    }

    async fn chirp(&self, id: Uuid) -> StoreResult<Option<Chirp>> {
        let chirp = sqlx::query_as::<_, Chirp>(&format!(
            "SELECT {CHIRP_COLUMNS} FROM chirps WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(chirp)
    }

    async fn list_chirps(&self, author: Option<Uuid>, order: SortOrder) -> StoreResult<Vec<Chirp>> {
        let direction = match order {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        };

        let chirps = sqlx::query_as::<_, Chirp>(&format!(
            "SELECT {CHIRP_COLUMNS} FROM chirps \
             WHERE ($1::uuid IS NULL OR user_id = $1) \
             ORDER BY created_at {direction}, id {direction}"
        ))
        .bind(author)
        .fetch_all(&self.pool)
        .await?;

        Ok(chirps)
    }

    async fn delete_chirp(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM chirps WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[rocket::async_trait]
impl RefreshTokenStore for PgStore {
    async fn create_refresh_token(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<RefreshToken> {
        let result = sqlx::query_as::<_, RefreshToken>(&format!(
            "INSERT INTO refresh_tokens (token, created_at, updated_at, user_id, expires_at) \
             VALUES ($1, NOW(), NOW(), $2, $3) RETURNING {REFRESH_TOKEN_COLUMNS}"
        ))
        .bind(token)
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(record) => Ok(record),
            Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
                Err(StoreError::NotFound)
            }
            Err(err) => Err(StoreError::from(err)),
        }
    }

    async fn refresh_token(&self, token: &str) -> StoreResult<Option<RefreshToken>> {
        let record = sqlx::query_as::<_, RefreshToken>(&format!(
            "SELECT {REFRESH_TOKEN_COLUMNS} FROM refresh_tokens WHERE token = $1"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn revoke_refresh_token(&self, token: &str, now: DateTime<Utc>) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE refresh_tokens \
             SET revoked_at = COALESCE(revoked_at, $2), \
                 updated_at = CASE WHEN revoked_at IS NULL THEN $2 ELSE updated_at END \
             WHERE token = $1",
        )
        .bind(token)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
