//! Shared helper functions for Rocket route handlers.

use rocket::serde::json::{self, Json};
use uuid::Uuid;

use crate::error::ApiError;

/// Unwrap a JSON body, turning decode failures into a 400.
pub fn json_body<T>(body: Result<Json<T>, json::Error<'_>>) -> Result<T, ApiError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(err) => {
            // The raw body may hold a password; log only the parser's verdict.
            match err {
                json::Error::Io(e) => log::debug!("could not read request body: {}", e),
                json::Error::Parse(_, e) => log::debug!("rejecting request body: {}", e),
            }
            Err(ApiError::BadRequest("Couldn't decode parameters".to_string()))
        }
    }
}

/// Canonical form of an email address as stored and looked up.
pub fn normalize_email(raw: &str) -> &str {
    raw.trim()
}

/// Parse a UUID taken from a path segment or query string.
///
/// Returns [`ApiError::BadRequest`] naming `what` when the value is malformed.
pub fn parse_uuid(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid {what}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_surrounding_whitespace() {
        assert_eq!(normalize_email("  walt@breakingbad.com\n"), "walt@breakingbad.com");
        assert_eq!(normalize_email("walt@breakingbad.com"), "walt@breakingbad.com");
    }

    #[test]
    fn parses_uuids() {
        let id = Uuid::new_v4();
        assert_eq!(parse_uuid(&id.to_string(), "chirp ID").expect("uuid"), id);

        match parse_uuid("not-a-uuid", "chirp ID") {
            Err(ApiError::BadRequest(msg)) => assert_eq!(msg, "Invalid chirp ID"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
