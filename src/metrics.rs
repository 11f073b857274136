use std::sync::atomic::{AtomicU64, Ordering};

use rocket::fairing::{Fairing, Info, Kind};
use rocket::{Data, Request};

/// Path prefix of the static file server.
pub const APP_PREFIX: &str = "/app";

/// Number of requests served by the file server since startup or last reset.
#[derive(Debug, Default)]
pub struct HitCounter {
    hits: AtomicU64,
}

impl HitCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self) -> u64 {
        self.hits.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
    }
}

/// Fairing counting every request under [`APP_PREFIX`] into the managed
/// [`HitCounter`].
pub struct FileserverHits;

#[rocket::async_trait]
impl Fairing for FileserverHits {
    fn info(&self) -> Info {
        Info {
            name: "Fileserver Hits",
            kind: Kind::Request,
        }
    }

    async fn on_request(&self, request: &mut Request<'_>, _: &mut Data<'_>) {
        if !is_app_path(request.uri().path().as_str()) {
            return;
        }

        match request.rocket().state::<HitCounter>() {
            Some(counter) => {
                counter.increment();
            }
            None => log::warn!("hit counter not managed; /app request not counted"),
        }
    }
}

fn is_app_path(path: &str) -> bool {
    path == APP_PREFIX
        || path
            .strip_prefix(APP_PREFIX)
            .is_some_and(|rest| rest.starts_with('/'))
}
