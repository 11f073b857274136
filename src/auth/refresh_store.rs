use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::auth::jwt::make_refresh_token;
use crate::auth::{AuthError, AuthResult};
use crate::models::RefreshToken;
use crate::store::{StoreError, StoreResult};

/// Storage operations the refresh-token flow depends on.
#[rocket::async_trait]
pub trait RefreshTokenStore: Send + Sync {
    async fn create_refresh_token(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<RefreshToken>;

    async fn refresh_token(&self, token: &str) -> StoreResult<Option<RefreshToken>>;

    /// Stamp `revoked_at` unless it is already set. `NotFound` for unknown
    /// tokens.
    async fn revoke_refresh_token(&self, token: &str, now: DateTime<Utc>) -> StoreResult<()>;
}

#[derive(Debug, Clone)]
pub struct RefreshTokenIssued {
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Mint a fresh opaque token for `user_id` and persist it.
pub async fn issue_token<S>(
    store: &S,
    user_id: Uuid,
    now: DateTime<Utc>,
    ttl: Duration,
) -> AuthResult<RefreshTokenIssued>
where
    S: RefreshTokenStore + ?Sized,
{
    let token = make_refresh_token();
    let expires_at = now
        .checked_add_signed(ttl)
        .ok_or_else(|| AuthError::Config("refresh token lifetime out of range".into()))?;
    let stored = store
        .create_refresh_token(&token, user_id, expires_at)
        .await?;

    Ok(RefreshTokenIssued {
        token,
        user_id: stored.user_id,
        expires_at: stored.expires_at,
    })
}

/// Look a token up and resolve its owner if it may still mint access tokens.
/// The token itself is left untouched.
pub async fn redeem_token<S>(store: &S, token: &str, now: DateTime<Utc>) -> AuthResult<Uuid>
where
    S: RefreshTokenStore + ?Sized,
{
    let record = store
        .refresh_token(token)
        .await?
        .ok_or(AuthError::RefreshTokenUnknown)?;

    ensure_usable(&record, now)?;
    Ok(record.user_id)
}

pub async fn revoke_token<S>(store: &S, token: &str, now: DateTime<Utc>) -> AuthResult<()>
where
    S: RefreshTokenStore + ?Sized,
{
    match store.revoke_refresh_token(token, now).await {
        Ok(()) => Ok(()),
        Err(StoreError::NotFound) => Err(AuthError::RefreshTokenUnknown),
        Err(err) => Err(AuthError::from(err)),
    }
}

pub fn ensure_usable(record: &RefreshToken, now: DateTime<Utc>) -> AuthResult<()> {
    if now >= record.expires_at {
        return Err(AuthError::RefreshTokenExpired);
    }

    if record.revoked_at.is_some() {
        return Err(AuthError::RefreshTokenRevoked);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, UserStore};

    async fn store_with_user() -> (MemoryStore, Uuid) {
        let store = MemoryStore::new();
        let user = store
            .create_user("walt@breakingbad.com", "$argon2id$stub")
            .await
            .expect("create user");
        (store, user.id)
    }

    #[tokio::test]
    async fn out_of_range_expiry_is_an_error() {
        let (store, user_id) = store_with_user().await;

        let result = issue_token(&store, user_id, DateTime::<Utc>::MAX_UTC, Duration::days(1)).await;
        assert!(matches!(result, Err(AuthError::Config(_))));
    }

    #[tokio::test]
    async fn live_token_resolves_its_owner() {
        let (store, user_id) = store_with_user().await;
        let now = Utc::now();

        let issued = issue_token(&store, user_id, now, Duration::days(60))
            .await
            .expect("issue");
        assert_eq!(issued.expires_at, now + Duration::days(60));

        let owner = redeem_token(&store, &issued.token, now)
            .await
            .expect("redeem");
        assert_eq!(owner, user_id);

        // Redeeming does not consume the token.
        let again = redeem_token(&store, &issued.token, now + Duration::days(1))
            .await
            .expect("redeem again");
        assert_eq!(again, user_id);
    }

    #[tokio::test]
    async fn unknown_token_is_rejected() {
        let (store, _) = store_with_user().await;
        let err = redeem_token(&store, "never-issued", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::RefreshTokenUnknown));
    }

    #[tokio::test]
    async fn token_dies_at_expiry() {
        let (store, user_id) = store_with_user().await;
        let now = Utc::now();
        let issued = issue_token(&store, user_id, now, Duration::hours(1))
            .await
            .expect("issue");

        let err = redeem_token(&store, &issued.token, issued.expires_at)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::RefreshTokenExpired));
    }

    #[tokio::test]
    async fn revoked_token_is_rejected_and_stays_revoked() {
        let (store, user_id) = store_with_user().await;
        let now = Utc::now();
        let issued = issue_token(&store, user_id, now, Duration::days(60))
            .await
            .expect("issue");

        revoke_token(&store, &issued.token, now).await.expect("revoke");
        let err = redeem_token(&store, &issued.token, now).await.unwrap_err();
        assert!(matches!(err, AuthError::RefreshTokenRevoked));

        let later = now + Duration::minutes(5);
        revoke_token(&store, &issued.token, later)
            .await
            .expect("second revoke succeeds");
        let record = store
            .refresh_token(&issued.token)
            .await
            .expect("lookup")
            .expect("record");
        assert_eq!(record.revoked_at, Some(now));
    }

    #[tokio::test]
    async fn revoking_unknown_token_fails() {
        let (store, _) = store_with_user().await;
        let err = revoke_token(&store, "never-issued", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::RefreshTokenUnknown));
    }
}
