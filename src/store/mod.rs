//! Persistence behind the HTTP layer.
//!
//! Handlers only see the [`Storage`] trait object kept in Rocket state, so the
//! same routes run against Postgres in production and against
//! [`MemoryStore`] in tests and local experiments.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::models::{Chirp, User};

pub mod memory;
pub mod postgres;

pub use crate::auth::refresh_store::RefreshTokenStore;
pub use memory::MemoryStore;
pub use postgres::PgStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                StoreError::Conflict(db_err.message().to_string())
            }
            _ => StoreError::Database(err),
        }
    }
}

/// Chirp listing order, by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    /// Anything other than `desc` keeps the default ascending order.
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("desc") => SortOrder::Descending,
            _ => SortOrder::Ascending,
        }
    }
}

#[rocket::async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, email: &str, hashed_password: &str) -> StoreResult<User>;

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn update_user_credentials(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> StoreResult<User>;

    /// Mark a user as a Chirpy Red subscriber. `NotFound` for unknown ids.
    async fn upgrade_user(&self, id: Uuid) -> StoreResult<()>;

    /// Delete every user together with their chirps and refresh tokens.
    async fn delete_all_users(&self) -> StoreResult<u64>;
}

#[rocket::async_trait]
pub trait ChirpStore: Send + Sync {
    async fn create_chirp(&self, user_id: Uuid, body: &str) -> StoreResult<Chirp>;

    async fn chirp(&self, id: Uuid) -> StoreResult<Option<Chirp>>;

    async fn list_chirps(&self, author: Option<Uuid>, order: SortOrder) -> StoreResult<Vec<Chirp>>;

    /// `NotFound` when no chirp has the id.
    async fn delete_chirp(&self, id: Uuid) -> StoreResult<()>;
}

/// Everything the HTTP layer needs from persistence.
pub trait Storage: UserStore + ChirpStore + RefreshTokenStore {}

impl<T> Storage for T where T: UserStore + ChirpStore + RefreshTokenStore {}

pub type SharedStore = Arc<dyn Storage>;
