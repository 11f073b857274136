use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::{self, Json};
use rocket::{State, post, put};

use crate::auth::{AuthError, AuthState, AuthUser};
use crate::error::ApiError;
use crate::models::{UserCredentials, UserResponse};
use crate::routes::helpers::{json_body, normalize_email};
use crate::store::{SharedStore, StoreError};

const EMAIL_TAKEN: &str = "Email already in use";

/// Check the credential payload and return the trimmed email.
fn validate_credentials(credentials: &UserCredentials) -> Result<String, ApiError> {
    let email = normalize_email(&credentials.email);
    if email.is_empty() {
        return Err(ApiError::BadRequest("Email is required".to_string()));
    }
    if credentials.password.is_empty() {
        return Err(ApiError::BadRequest("Password is required".to_string()));
    }
    Ok(email.to_string())
}

fn email_conflict(err: StoreError) -> ApiError {
    match err {
        StoreError::Conflict(_) => ApiError::BadRequest(EMAIL_TAKEN.to_string()),
        other => ApiError::from(other),
    }
}

#[post("/users", data = "<payload>")]
pub async fn create_user(
    state: &State<AuthState>,
    store: &State<SharedStore>,
    payload: Result<Json<UserCredentials>, json::Error<'_>>,
) -> Result<status::Custom<Json<UserResponse>>, ApiError> {
    let credentials = json_body(payload)?;
    let email = validate_credentials(&credentials)?;

    let hashed_password = state.password_service.hash_password(&credentials.password)?;
    let user = store
        .create_user(&email, &hashed_password)
        .await
        .map_err(email_conflict)?;

    log::info!("created user {}", user.id);
    Ok(status::Custom(Status::Created, Json(UserResponse::from(user))))
}

/// Replace the caller's own email and password.
#[put("/users", data = "<payload>")]
pub async fn update_user(
    state: &State<AuthState>,
    store: &State<SharedStore>,
    user: Result<AuthUser, AuthError>,
    payload: Result<Json<UserCredentials>, json::Error<'_>>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = user?;
    let credentials = json_body(payload)?;
    let email = validate_credentials(&credentials)?;

    let hashed_password = state.password_service.hash_password(&credentials.password)?;
    let updated = store
        .update_user_credentials(user.id, &email, &hashed_password)
        .await
        .map_err(email_conflict)?;

    Ok(Json(UserResponse::from(updated)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(email: &str, password: &str) -> UserCredentials {
        UserCredentials {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn rejects_blank_fields() {
        assert!(matches!(
            validate_credentials(&credentials("  ", "pw")),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            validate_credentials(&credentials("a@example.com", "")),
            Err(ApiError::BadRequest(_))
        ));
        assert_eq!(
            validate_credentials(&credentials(" a@example.com ", "pw")).expect("valid"),
            "a@example.com"
        );
    }

    #[test]
    fn conflicts_become_bad_requests() {
        match email_conflict(StoreError::Conflict("users_email_key".into())) {
            ApiError::BadRequest(msg) => assert_eq!(msg, EMAIL_TAKEN),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(matches!(
            email_conflict(StoreError::NotFound),
            ApiError::NotFound(_)
        ));
    }
}
