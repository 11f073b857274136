use chrono::Utc;
use rocket::http::Status;
use rocket::serde::json::{self, Json};
use rocket::{State, post};

use crate::auth::guards::BearerToken;
use crate::auth::refresh_store::{issue_token, redeem_token, revoke_token};
use crate::auth::responses::{LoginRequest, LoginResponse, TokenResponse};
use crate::auth::{AuthError, AuthState};
use crate::error::ApiError;
use crate::models::UserResponse;
use crate::routes::helpers::{json_body, normalize_email};
use crate::store::SharedStore;

#[post("/login", data = "<payload>")]
pub async fn login(
    state: &State<AuthState>,
    store: &State<SharedStore>,
    payload: Result<Json<LoginRequest>, json::Error<'_>>,
) -> Result<Json<LoginResponse>, ApiError> {
    let LoginRequest { email, password } = json_body(payload)?;

    // Unknown email and wrong password must be indistinguishable, in both
    // message and time spent hashing.
    let user = store.user_by_email(normalize_email(&email)).await?;
    let verified = match &user {
        Some(user) => state
            .password_service
            .verify_password(&password, &user.hashed_password)?,
        None => state.password_service.verify_missing(&password)?,
    };
    let user = match user {
        Some(user) if verified => user,
        _ => return Err(AuthError::InvalidCredentials.into()),
    };

    let access_token = state.jwt_service.issue_access_token(user.id)?;
    let refresh_token = issue_token(
        store.inner().as_ref(),
        user.id,
        Utc::now(),
        state.refresh_token_ttl(),
    )
    .await?;

    log::info!("user {} logged in", user.id);

    Ok(Json(LoginResponse {
        user: UserResponse::from(user),
        token: access_token.token,
        refresh_token: refresh_token.token,
    }))
}

/// Trade a live refresh token for a new access token. The refresh token
/// itself is not rotated.
#[post("/refresh")]
pub async fn refresh(
    state: &State<AuthState>,
    store: &State<SharedStore>,
    bearer: Result<BearerToken, AuthError>,
) -> Result<Json<TokenResponse>, ApiError> {
    let BearerToken(token) = bearer?;
    let user_id = redeem_token(store.inner().as_ref(), &token, Utc::now()).await?;
    let access_token = state.jwt_service.issue_access_token(user_id)?;

    Ok(Json(TokenResponse {
        token: access_token.token,
    }))
}

#[post("/revoke")]
pub async fn revoke(
    store: &State<SharedStore>,
    bearer: Result<BearerToken, AuthError>,
) -> Result<Status, ApiError> {
    let BearerToken(token) = bearer?;
    revoke_token(store.inner().as_ref(), &token, Utc::now()).await?;
    Ok(Status::NoContent)
}
