//! In-process storage with the same observable behaviour as [`PgStore`].
//!
//! [`PgStore`]: crate::store::PgStore

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::auth::refresh_store::RefreshTokenStore;
use crate::models::{Chirp, RefreshToken, User};
use crate::store::{ChirpStore, SortOrder, StoreError, StoreResult, UserStore};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    chirps: Vec<Chirp>,
    refresh_tokens: HashMap<String, RefreshToken>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite a stored refresh token's expiry.
    pub fn set_refresh_token_expiry(&self, token: &str, expires_at: DateTime<Utc>) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let record = tables
            .refresh_tokens
            .get_mut(token)
            .ok_or(StoreError::NotFound)?;
        record.expires_at = expires_at;
        Ok(())
    }
}

fn email_taken(tables: &Tables, email: &str, except: Option<Uuid>) -> bool {
    tables
        .users
        .values()
        .any(|user| user.email == email && Some(user.id) != except)
}

#[rocket::async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, email: &str, hashed_password: &str) -> StoreResult<User> {
        let mut tables = self.tables.write();
        if email_taken(&tables, email, None) {
            return Err(StoreError::Conflict(format!("email {email} already registered")));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
            is_chirpy_red: false,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read();
        Ok(tables.users.values().find(|user| user.email == email).cloned())
    }

    async fn update_user_credentials(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> StoreResult<User> {
        let mut tables = self.tables.write();
        if email_taken(&tables, email, Some(id)) {
            return Err(StoreError::Conflict(format!("email {email} already registered")));
        }

        let user = tables.users.get_mut(&id).ok_or(StoreError::NotFound)?;
        user.email = email.to_string();
        user.hashed_password = hashed_password.to_string();
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn upgrade_user(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let user = tables.users.get_mut(&id).ok_or(StoreError::NotFound)?;
        user.is_chirpy_red = true;
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_all_users(&self) -> StoreResult<u64> {
        let mut tables = self.tables.write();
        let removed = tables.users.len() as u64;
        tables.users.clear();
        tables.chirps.clear();
        tables.refresh_tokens.clear();
        Ok(removed)
    }
}

#[rocket::async_trait]
impl ChirpStore for MemoryStore {
    async fn create_chirp(&self, user_id: Uuid, body: &str) -> StoreResult<Chirp> {
        let mut tables = self.tables.write();
        if !tables.users.contains_key(&user_id) {
            return Err(StoreError::NotFound);
        }

        let now = Utc::now();
        let chirp = Chirp {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            body: body.to_string(),
            user_id,
        };
        tables.chirps.push(chirp.clone());
        Ok(chirp)
    }

    async fn chirp(&self, id: Uuid) -> StoreResult<Option<Chirp>> {
        let tables = self.tables.read();
        Ok(tables.chirps.iter().find(|chirp| chirp.id == id).cloned())
    }

    async fn list_chirps(&self, author: Option<Uuid>, order: SortOrder) -> StoreResult<Vec<Chirp>> {
        let tables = self.tables.read();
        // Insertion order is creation order.
        let mut chirps: Vec<Chirp> = tables
            .chirps
            .iter()
            .filter(|chirp| author.is_none_or(|id| chirp.user_id == id))
            .cloned()
            .collect();
        if order == SortOrder::Descending {
            chirps.reverse();
        }
        Ok(chirps)
    }

    async fn delete_chirp(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let before = tables.chirps.len();
        tables.chirps.retain(|chirp| chirp.id != id);
        if tables.chirps.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[rocket::async_trait]
impl RefreshTokenStore for MemoryStore {
    async fn create_refresh_token(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<RefreshToken> {
        let mut tables = self.tables.write();
        if !tables.users.contains_key(&user_id) {
            return Err(StoreError::NotFound);
        }
        if tables.refresh_tokens.contains_key(token) {
            return Err(StoreError::Conflict("refresh token already exists".into()));
        }

        let now = Utc::now();
        let record = RefreshToken {
            token: token.to_string(),
            created_at: now,
            updated_at: now,
            user_id,
            expires_at,
            revoked_at: None,
        };
        tables
            .refresh_tokens
            .insert(record.token.clone(), record.clone());
        Ok(record)
    }

    async fn refresh_token(&self, token: &str) -> StoreResult<Option<RefreshToken>> {
        let tables = self.tables.read();
        Ok(tables.refresh_tokens.get(token).cloned())
    }

    async fn revoke_refresh_token(&self, token: &str, now: DateTime<Utc>) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let record = tables
            .refresh_tokens
            .get_mut(token)
            .ok_or(StoreError::NotFound)?;
        if record.revoked_at.is_none() {
            record.revoked_at = Some(now);
            record.updated_at = now;
        }
        Ok(())
    }
}
