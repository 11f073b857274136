//! Operator endpoints mounted under `/admin`.

use rocket::response::content::RawHtml;
use rocket::{State, get, post};

use crate::auth::{AuthError, RequireDevPlatform};
use crate::error::ApiError;
use crate::metrics::HitCounter;
use crate::store::SharedStore;

pub fn render_metrics(hits: u64) -> String {
    format!(
        "<html>\n  <body>\n    <h1>Welcome, Chirpy Admin</h1>\n    \
         <p>Chirpy has been visited {hits} times!</p>\n  </body>\n</html>\n"
    )
}

#[get("/metrics")]
pub fn metrics(counter: &State<HitCounter>) -> RawHtml<String> {
    RawHtml(render_metrics(counter.hits()))
}

/// Zero the hit counter and delete every user. Only on the dev platform.
#[post("/reset")]
pub async fn reset(
    platform: Result<RequireDevPlatform, AuthError>,
    counter: &State<HitCounter>,
    store: &State<SharedStore>,
) -> Result<String, ApiError> {
    platform?;

    counter.reset();
    let removed = store.delete_all_users().await?;
    log::warn!("reset: hit counter zeroed, {} users deleted", removed);

    Ok("Hits reset to 0 and database reset to initial state.".to_string())
}
