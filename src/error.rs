use rocket::http::{ContentType, Status};
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::{Request, Response, catch};
use std::io::Cursor;
use thiserror::Error;

use crate::auth::AuthError;
use crate::models::ErrorBody;
use crate::store::StoreError;

const INTERNAL_MESSAGE: &str = "Something went wrong";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("database error: {0}")]
    DatabaseError(sqlx::Error),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("internal error: {0}")]
    InternalError(String),
}

impl ApiError {
    pub fn status(&self) -> Status {
        match self {
            ApiError::DatabaseError(_) | ApiError::InternalError(_) => Status::InternalServerError,
            ApiError::NotFound(_) => Status::NotFound,
            ApiError::BadRequest(_) => Status::BadRequest,
            ApiError::Auth(err) => err.status(),
        }
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        let message = match self {
            ApiError::DatabaseError(e) => {
                log::error!("{} {}: database error: {}", request.method(), request.uri(), e);
                INTERNAL_MESSAGE.to_string()
            }
            ApiError::NotFound(msg) => {
                log::debug!("not found: {}", msg);
                msg
            }
            ApiError::BadRequest(msg) => {
                log::debug!("bad request: {}", msg);
                msg
            }
            ApiError::Auth(err) => {
                if status == Status::InternalServerError {
                    log::error!("{} {}: {}", request.method(), request.uri(), err);
                } else {
                    log::warn!("{} {} rejected: {}", request.method(), request.uri(), err);
                }
                err.public_message().to_string()
            }
            ApiError::InternalError(msg) => {
                log::error!("{} {}: internal error: {}", request.method(), request.uri(), msg);
                INTERNAL_MESSAGE.to_string()
            }
        };

        let json = serde_json::to_string(&ErrorBody::new(message))
            .unwrap_or_else(|_| format!(r#"{{"error":"{INTERNAL_MESSAGE}"}}"#));

        Response::build()
            .status(status)
            .header(ContentType::JSON)
            .sized_body(json.len(), Cursor::new(json))
            .ok()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFound("Resource not found".to_string()),
            StoreError::Conflict(detail) => {
                log::debug!("store conflict: {}", detail);
                ApiError::BadRequest("Resource already exists".to_string())
            }
            StoreError::Database(e) => ApiError::DatabaseError(e),
        }
    }
}

// ===== Catchers =====
//
// Failures that never reach a handler (unknown routes, guards that error
// outside a `Result` wrapper, data limits) still get the JSON error body.

fn caught(status: Status, message: &str) -> (Status, Json<ErrorBody>) {
    (status, Json(ErrorBody::new(message)))
}

#[catch(400)]
pub fn bad_request() -> (Status, Json<ErrorBody>) {
    caught(Status::BadRequest, "Bad request")
}

#[catch(401)]
pub fn unauthorized() -> (Status, Json<ErrorBody>) {
    caught(Status::Unauthorized, "Missing or invalid credentials")
}

#[catch(403)]
pub fn forbidden() -> (Status, Json<ErrorBody>) {
    caught(Status::Forbidden, "Forbidden")
}

#[catch(404)]
pub fn not_found() -> (Status, Json<ErrorBody>) {
    caught(Status::NotFound, "Not found")
}

#[catch(422)]
pub fn unprocessable() -> (Status, Json<ErrorBody>) {
    caught(Status::BadRequest, "Couldn't decode parameters")
}

#[catch(500)]
pub fn internal_error() -> (Status, Json<ErrorBody>) {
    caught(Status::InternalServerError, INTERNAL_MESSAGE)
}

#[catch(default)]
pub fn default_catcher(status: Status, _request: &Request<'_>) -> (Status, Json<ErrorBody>) {
    caught(status, status.reason().unwrap_or(INTERNAL_MESSAGE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_http_statuses() {
        assert_eq!(ApiError::from(StoreError::NotFound).status(), Status::NotFound);
        assert_eq!(
            ApiError::from(StoreError::Conflict("users_email_key".into())).status(),
            Status::BadRequest
        );
        assert_eq!(
            ApiError::from(StoreError::Database(sqlx::Error::PoolTimedOut)).status(),
            Status::InternalServerError
        );
    }

    #[test]
    fn auth_errors_keep_their_status() {
        assert_eq!(
            ApiError::from(AuthError::TokenExpired).status(),
            Status::Unauthorized
        );
        assert_eq!(ApiError::from(AuthError::NotOwner).status(), Status::Forbidden);
        assert_eq!(
            ApiError::from(AuthError::Config("missing".into())).status(),
            Status::InternalServerError
        );
    }
}
