//! Chirp creation, listing, lookup and deletion.

use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::{self, Json};
use rocket::{State, delete, get, post};

use crate::auth::{AuthError, AuthUser};
use crate::error::ApiError;
use crate::models::{Chirp, CreateChirp};
use crate::moderation::censor;
use crate::routes::helpers::{json_body, parse_uuid};
use crate::store::{SharedStore, SortOrder};

pub const MAX_CHIRP_LENGTH: usize = 140;

/// Enforce the body constraints and return the censored text to store.
fn prepare_body(body: &str) -> Result<String, ApiError> {
    if body.trim().is_empty() {
        return Err(ApiError::BadRequest("Body is required".to_string()));
    }
    if body.chars().count() > MAX_CHIRP_LENGTH {
        return Err(ApiError::BadRequest("Chirp is too long".to_string()));
    }
    Ok(censor(body))
}

#[post("/chirps", data = "<payload>")]
pub async fn create_chirp(
    store: &State<SharedStore>,
    user: Result<AuthUser, AuthError>,
    payload: Result<Json<CreateChirp>, json::Error<'_>>,
) -> Result<status::Custom<Json<Chirp>>, ApiError> {
    let user = user?;
    let CreateChirp { body } = json_body(payload)?;
    let body = prepare_body(&body)?;

    let chirp = store.create_chirp(user.id, &body).await?;
    Ok(status::Custom(Status::Created, Json(chirp)))
}

/// List chirps, optionally by one author, ordered by creation time.
#[get("/chirps?<author_id>&<sort>")]
pub async fn list_chirps(
    store: &State<SharedStore>,
    author_id: Option<&str>,
    sort: Option<&str>,
) -> Result<Json<Vec<Chirp>>, ApiError> {
    let author = author_id
        .filter(|raw| !raw.is_empty())
        .map(|raw| parse_uuid(raw, "author ID"))
        .transpose()?;

    let chirps = store
        .list_chirps(author, SortOrder::from_query(sort))
        .await?;
    Ok(Json(chirps))
}

#[get("/chirps/<chirp_id>")]
pub async fn get_chirp(
    store: &State<SharedStore>,
    chirp_id: &str,
) -> Result<Json<Chirp>, ApiError> {
    let id = parse_uuid(chirp_id, "chirp ID")?;
    let chirp = store
        .chirp(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Chirp not found".to_string()))?;
    Ok(Json(chirp))
}

/// Delete a chirp. Only its author may do so.
#[delete("/chirps/<chirp_id>")]
pub async fn delete_chirp(
    store: &State<SharedStore>,
    user: Result<AuthUser, AuthError>,
    chirp_id: &str,
) -> Result<Status, ApiError> {
    let user = user?;
    let id = parse_uuid(chirp_id, "chirp ID")?;

    let chirp = store
        .chirp(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Chirp not found".to_string()))?;
    user.ensure_owns(chirp.user_id)?;

    store.delete_chirp(id).await?;
    log::info!("user {} deleted chirp {}", user.id, id);
    Ok(Status::NoContent)
}
