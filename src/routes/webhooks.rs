use rocket::http::Status;
use rocket::serde::json::{self, Json};
use rocket::{State, post};

use crate::auth::{AuthError, PolkaApiKey};
use crate::error::ApiError;
use crate::models::PolkaEvent;
use crate::routes::helpers::json_body;
use crate::store::{SharedStore, StoreError};

pub const USER_UPGRADED: &str = "user.upgraded";

/// Payment-provider callback. Upgrades are applied; any other event is
/// acknowledged and ignored.
#[post("/polka/webhooks", data = "<payload>")]
pub async fn polka_webhook(
    store: &State<SharedStore>,
    key: Result<PolkaApiKey, AuthError>,
    payload: Result<Json<PolkaEvent>, json::Error<'_>>,
) -> Result<Status, ApiError> {
    key?;
    let event = json_body(payload)?;

    if event.event != USER_UPGRADED {
        log::debug!("ignoring polka event {:?}", event.event);
        return Ok(Status::NoContent);
    }

    let user_id = event
        .data
        .user_id
        .ok_or_else(|| ApiError::BadRequest("Missing user_id".to_string()))?;

    match store.upgrade_user(user_id).await {
        Ok(()) => {
            log::info!("user {} upgraded to chirpy red", user_id);
            Ok(Status::NoContent)
        }
        Err(StoreError::NotFound) => Err(ApiError::NotFound("User not found".to_string())),
        Err(err) => Err(err.into()),
    }
}
