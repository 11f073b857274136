use rocket::http::Status;
use thiserror::Error;

use crate::store::StoreError;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authorization header missing")]
    MissingAuthorization,
    #[error("authorization header malformed")]
    MalformedAuthorization,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("token expired")]
    TokenExpired,
    #[error("token invalid")]
    TokenInvalid,
    #[error("refresh token not found")]
    RefreshTokenUnknown,
    #[error("refresh token expired")]
    RefreshTokenExpired,
    #[error("refresh token revoked")]
    RefreshTokenRevoked,
    #[error("api key invalid")]
    InvalidApiKey,
    #[error("user is not the owner of the resource")]
    NotOwner,
    #[error("endpoint only available on the dev platform")]
    PlatformRestricted,
    #[error("configuration error: {0}")]
    Config(String),
    #[error("jwt error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("argon2 parameter error: {0}")]
    Argon2(String),
    #[error("password hashing error: {0}")]
    PasswordHash(String),
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl AuthError {
    pub fn status(&self) -> Status {
        match self {
            AuthError::MissingAuthorization
            | AuthError::MalformedAuthorization
            | AuthError::InvalidCredentials
            | AuthError::TokenExpired
            | AuthError::TokenInvalid
            | AuthError::RefreshTokenUnknown
            | AuthError::RefreshTokenExpired
            | AuthError::RefreshTokenRevoked
            | AuthError::InvalidApiKey => Status::Unauthorized,
            AuthError::NotOwner | AuthError::PlatformRestricted => Status::Forbidden,
            AuthError::Config(_)
            | AuthError::Jwt(_)
            | AuthError::Argon2(_)
            | AuthError::PasswordHash(_)
            | AuthError::Store(_) => Status::InternalServerError,
        }
    }

    /// Message safe to hand back to the caller.
    ///
    /// Every rejection of a token or key shares one message so a client cannot
    /// tell which check failed. Login failures share another so an unknown
    /// email and a wrong password look the same.
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "Incorrect email or password",
            AuthError::NotOwner => "You are not the author of this resource",
            AuthError::PlatformRestricted => "Forbidden",
            err if err.status() == Status::Unauthorized => "Missing or invalid credentials",
            _ => "Something went wrong",
        }
    }
}

impl From<argon2::Error> for AuthError {
    fn from(err: argon2::Error) -> Self {
        AuthError::Argon2(err.to_string())
    }
}

impl From<argon2::password_hash::Error> for AuthError {
    fn from(err: argon2::password_hash::Error) -> Self {
        AuthError::PasswordHash(err.to_string())
    }
}
