//! HTTP route handlers grouped by resource.
//!
//! Handlers take their guards as `Result<Guard, AuthError>` and their JSON
//! bodies as `Result<Json<T>, json::Error>` so every rejection flows through
//! [`ApiError`](crate::error::ApiError) and is logged once.

pub mod admin;
pub mod chirps;
pub mod health;
pub(crate) mod helpers;
pub mod users;
pub mod webhooks;
