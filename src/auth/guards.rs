use rocket::Request;
use rocket::State;
use rocket::http::HeaderMap;
use rocket::request::{FromRequest, Outcome};
use uuid::Uuid;

use crate::auth::{AuthError, AuthResult, AuthState};
use crate::config::AppConfig;

const AUTHORIZATION: &str = "Authorization";
const BEARER_PREFIX: &str = "Bearer ";
const API_KEY_PREFIX: &str = "ApiKey ";

/// Caller identity resolved from a valid bearer access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
}

impl AuthUser {
    /// Only the owner of a resource may mutate it.
    pub fn ensure_owns(&self, owner_id: Uuid) -> AuthResult<()> {
        if self.id == owner_id {
            Ok(())
        } else {
            Err(AuthError::NotOwner)
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthUser {
    type Error = AuthError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match extract_user(request).await {
            Ok(user) => Outcome::Success(user),
            Err(err) => Outcome::Error((err.status(), err)),
        }
    }
}

async fn extract_user(request: &Request<'_>) -> AuthResult<AuthUser> {
    let token = bearer_token(request.headers())?;

    let auth_state = request
        .guard::<&State<AuthState>>()
        .await
        .succeeded()
        .ok_or_else(|| AuthError::Config("AuthState missing from state".into()))?;

    let id = auth_state.jwt_service.validate_access_token(token)?;
    Ok(AuthUser { id })
}

/// Raw bearer credential, not interpreted. Used where the bearer is an
/// opaque refresh token rather than a signed access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken(pub String);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for BearerToken {
    type Error = AuthError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match bearer_token(request.headers()) {
            Ok(token) => Outcome::Success(BearerToken(token.to_string())),
            Err(err) => Outcome::Error((err.status(), err)),
        }
    }
}

/// Proof that the caller presented the configured Polka API key.
#[derive(Debug, Clone, Copy)]
pub struct PolkaApiKey;

#[rocket::async_trait]
impl<'r> FromRequest<'r> for PolkaApiKey {
    type Error = AuthError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match check_polka_key(request).await {
            Ok(()) => Outcome::Success(PolkaApiKey),
            Err(err) => Outcome::Error((err.status(), err)),
        }
    }
}

async fn check_polka_key(request: &Request<'_>) -> AuthResult<()> {
    let key = api_key(request.headers())?;

    let auth_state = request
        .guard::<&State<AuthState>>()
        .await
        .succeeded()
        .ok_or_else(|| AuthError::Config("AuthState missing from state".into()))?;

    if constant_time_eq::constant_time_eq(key.as_bytes(), auth_state.config.polka_key.as_bytes()) {
        Ok(())
    } else {
        Err(AuthError::InvalidApiKey)
    }
}

/// Admits requests only when the service runs on the `dev` platform.
/// An environment check, not a statement about the caller.
#[derive(Debug, Clone, Copy)]
pub struct RequireDevPlatform;

#[rocket::async_trait]
impl<'r> FromRequest<'r> for RequireDevPlatform {
    type Error = AuthError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let config = match request.guard::<&State<AppConfig>>().await {
            Outcome::Success(config) => config,
            _ => {
                let err = AuthError::Config("AppConfig missing from state".into());
                return Outcome::Error((err.status(), err));
            }
        };

        if config.is_dev() {
            Outcome::Success(RequireDevPlatform)
        } else {
            let err = AuthError::PlatformRestricted;
            Outcome::Error((err.status(), err))
        }
    }
}

/// Pull the token out of `Authorization: Bearer <token>`.
pub fn bearer_token<'h>(headers: &'h HeaderMap<'_>) -> AuthResult<&'h str> {
    credential_with_prefix(headers, BEARER_PREFIX)
}

/// Pull the key out of `Authorization: ApiKey <key>`.
pub fn api_key<'h>(headers: &'h HeaderMap<'_>) -> AuthResult<&'h str> {
    credential_with_prefix(headers, API_KEY_PREFIX)
}

fn credential_with_prefix<'h>(headers: &'h HeaderMap<'_>, prefix: &str) -> AuthResult<&'h str> {
    let header = headers
        .get_one(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthorization)?;
    match header.strip_prefix(prefix) {
        Some(credential) if !credential.is_empty() => Ok(credential),
        _ => Err(AuthError::MalformedAuthorization),
    }
}

mod constant_time_eq {
    /// Constant-time comparison to avoid timing side-channels.
    pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
        if a.len() != b.len() {
            return false;
        }

        let mut result: u8 = 0;
        for (&x, &y) in a.iter().zip(b.iter()) {
            result |= x ^ y;
        }

        result == 0
    }
}
