#[macro_use]
extern crate rocket;

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod metrics;
pub mod models;
pub mod moderation;
pub mod request_logger;
pub mod routes;
pub mod store;

use crate::auth::{AuthConfig, AuthState};
use crate::config::AppConfig;
use crate::db::ChirpyDb;
use crate::metrics::{APP_PREFIX, FileserverHits, HitCounter};
use crate::request_logger::RequestLogger;
use crate::store::{PgStore, SharedStore};
use env_logger::Env;
use rocket::fairing::AdHoc;
use rocket::fs::FileServer;
use rocket::http::Method;
use rocket::{Build, Catcher, Rocket, Route};
use rocket_cors::{AllowedOrigins, CorsOptions};
use rocket_db_pools::Database;
use std::sync::{Arc, Once};

static LOGGER: Once = Once::new();

fn init_logger() {
    LOGGER.call_once(|| {
        env_logger::Builder::from_env(
            Env::default().default_filter_or("info,rocket::server=warn,rocket::request=warn"),
        )
        .init();
    });
}

/// Routes mounted under `/api`.
pub fn api_routes() -> Vec<Route> {
    routes![
        // Health
        routes::health::healthz,
        // Users
        routes::users::create_user,
        routes::users::update_user,
        // Sessions
        auth::routes::login,
        auth::routes::refresh,
        auth::routes::revoke,
        // Chirps
        routes::chirps::create_chirp,
        routes::chirps::list_chirps,
        routes::chirps::get_chirp,
        routes::chirps::delete_chirp,
        // Webhooks
        routes::webhooks::polka_webhook,
    ]
}

/// Routes mounted under `/admin`.
pub fn admin_routes() -> Vec<Route> {
    routes![routes::admin::metrics, routes::admin::reset]
}

pub fn catchers() -> Vec<Catcher> {
    catchers![
        error::bad_request,
        error::unauthorized,
        error::forbidden,
        error::not_found,
        error::unprocessable,
        error::internal_error,
        error::default_catcher,
    ]
}

fn cors_options() -> CorsOptions {
    CorsOptions::default()
        .allowed_origins(AllowedOrigins::all())
        .allowed_methods(
            vec![Method::Get, Method::Post, Method::Put, Method::Delete]
                .into_iter()
                .map(From::from)
                .collect(),
        )
}

pub fn rocket() -> Rocket<Build> {
    init_logger();

    match dotenvy::dotenv() {
        Ok(path) => log::info!("loaded environment from {}", path.display()),
        Err(err) if err.not_found() => {}
        Err(err) => log::warn!("failed to load .env: {}", err),
    }

    let mut figment = rocket::Config::figment();
    if let Ok(url) = std::env::var("DB_URL") {
        figment = figment.merge(("databases.chirpy_db.url", url));
    }

    let app_config = AppConfig::from_env();
    log::info!(
        "starting chirpy (platform: {:?}, serving files from {})",
        app_config.platform,
        app_config.file_root.display()
    );

    let mut rocket = rocket::custom(figment)
        .attach(RequestLogger)
        .attach(FileserverHits)
        .attach(ChirpyDb::init())
        .attach(AdHoc::try_on_ignite("CORS", |rocket| async move {
            match cors_options().to_cors() {
                Ok(cors) => Ok(rocket.attach(cors)),
                Err(e) => {
                    log::error!("invalid CORS configuration: {}", e);
                    Err(rocket)
                }
            }
        }))
        // Run database migrations on startup
        .attach(AdHoc::try_on_ignite(
            "Run Migrations",
            |rocket| async move {
                match ChirpyDb::fetch(&rocket) {
                    Some(db) => match db::run_migrations(db).await {
                        Ok(_) => {
                            log::info!("database migrations successful");
                            Ok(rocket)
                        }
                        Err(e) => {
                            log::error!("database migrations failed: {}", e);
                            Err(rocket)
                        }
                    },
                    None => {
                        log::error!("database pool not available for migrations");
                        Err(rocket)
                    }
                }
            },
        ))
        .attach(AdHoc::try_on_ignite("Manage Storage", |rocket| async move {
            match ChirpyDb::fetch(&rocket) {
                Some(db) => {
                    let store: SharedStore = Arc::new(PgStore::new((**db).clone()));
                    Ok(rocket.manage(store))
                }
                None => Err(rocket),
            }
        }))
        .attach(AdHoc::try_on_ignite(
            "Auth Configuration",
            |rocket| async move {
                match AuthConfig::from_env().and_then(AuthState::from_config) {
                    Ok(state) => Ok(rocket.manage(state)),
                    Err(e) => {
                        log::error!("auth configuration invalid: {}", e);
                        Err(rocket)
                    }
                }
            },
        ))
        .manage(HitCounter::new())
        .mount("/api", api_routes())
        .mount("/admin", admin_routes())
        .register("/", catchers());

    if app_config.file_root.is_dir() {
        rocket = rocket.mount(APP_PREFIX, FileServer::from(&app_config.file_root));
    } else {
        log::warn!(
            "file root {} is not a directory; {} is not served",
            app_config.file_root.display(),
            APP_PREFIX
        );
    }

    rocket.manage(app_config)
}

#[cfg_attr(not(test), allow(dead_code))]
pub mod test_support {
    use std::sync::Arc;

    use rocket::config::LogLevel;
    use rocket::figment::Figment;
    use rocket::local::asynchronous::Client as AsyncClient;
    use rocket::local::blocking::Client;
    use rocket::{Build, Rocket};
    use rocket_db_pools::sqlx::PgPool;

    use crate::auth::{AuthConfig, AuthState, PasswordService};
    use crate::config::AppConfig;
    use crate::metrics::{FileserverHits, HitCounter};
    use crate::store::{MemoryStore, PgStore, SharedStore};

    pub use database::{TestDatabase, TestDatabaseError};

    pub const TEST_JWT_SECRET: &str = "test-secret-with-enough-entropy-for-hs256";
    pub const TEST_POLKA_KEY: &str = "f271c81ff7084ee5b99a5091b42d486e";

    /// Auth configuration with fixed secrets and default lifetimes.
    pub fn test_auth_config() -> AuthConfig {
        AuthConfig::from_lookup(|key: &str| match key {
            "SECRET_JWT" => Some(TEST_JWT_SECRET.to_string()),
            "POLKA_KEY" => Some(TEST_POLKA_KEY.to_string()),
            _ => None,
        })
        .expect("static test auth config is valid")
    }

    /// Auth state with a cheap Argon2 cost so tests stay fast.
    pub fn test_auth_state() -> AuthState {
        let passwords =
            PasswordService::with_cost(1024, 1, 1).expect("cheap argon2 parameters are valid");
        AuthState::new(test_auth_config(), passwords)
    }

    pub mod database {
        use log::LevelFilter;
        use rocket_db_pools::sqlx::postgres::{PgConnectOptions, PgPoolOptions};
        use rocket_db_pools::sqlx::{self, ConnectOptions, PgPool};
        use testcontainers_modules::postgres::Postgres;
        use testcontainers_modules::testcontainers::{
            ContainerAsync, core::error::TestcontainersError, runners::AsyncRunner,
        };
        use thiserror::Error;
        use uuid::Uuid;

        use crate::db::run_migrations;

        #[derive(Debug, Error)]
        pub enum TestDatabaseError {
            #[error("database error: {0}")]
            Sqlx(#[from] sqlx::Error),
            #[error("migration error: {0}")]
            Migration(#[from] sqlx::migrate::MigrateError),
            #[error("container error: {0}")]
            Container(#[from] TestcontainersError),
        }

        /// Ephemeral database for integration tests, migrated on creation.
        pub struct TestDatabase {
            pool: Option<PgPool>,
            admin_options: PgConnectOptions,
            database_name: String,
            container: Option<ContainerAsync<Postgres>>,
        }

        impl TestDatabase {
            /// Create a scratch database on the server named by
            /// `TEST_DATABASE_URL`, or in a disposable Postgres container when
            /// the variable is unset.
            pub async fn new_from_env() -> Result<Self, TestDatabaseError> {
                match std::env::var("TEST_DATABASE_URL") {
                    Ok(url) => {
                        let options: PgConnectOptions = url.parse()?;
                        Self::provision(options, None).await
                    }
                    Err(_) => Self::new().await,
                }
            }

            /// Launch a disposable Postgres container and create a scratch
            /// database inside it.
            pub async fn new() -> Result<Self, TestDatabaseError> {
                let container = Postgres::default().start().await?;

                let host = container.get_host().await?.to_string();
                let port = container.get_host_port_ipv4(5432).await?;
                let admin_url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);
                let options: PgConnectOptions = admin_url.parse()?;

                Self::provision(options, Some(container)).await
            }

            async fn provision(
                base_options: PgConnectOptions,
                container: Option<ContainerAsync<Postgres>>,
            ) -> Result<Self, TestDatabaseError> {
                let base_options = base_options.log_statements(LevelFilter::Off);
                let admin_options = base_options.clone().database("postgres");

                let admin_pool = PgPoolOptions::new()
                    .max_connections(1)
                    .connect_with(admin_options.clone())
                    .await?;

                let database_name = format!("chirpy_test_{}", Uuid::new_v4().simple());
                let create_sql = format!("CREATE DATABASE \"{}\" TEMPLATE template0", database_name);
                sqlx::query(&create_sql).execute(&admin_pool).await?;
                admin_pool.close().await;

                let pool = PgPoolOptions::new()
                    .max_connections(5)
                    .connect_with(base_options.database(&database_name))
                    .await?;

                run_migrations(&pool).await?;

                Ok(Self {
                    pool: Some(pool),
                    admin_options,
                    database_name,
                    container,
                })
            }

            pub fn pool(&self) -> &PgPool {
                self.pool.as_ref().expect("test database pool is available")
            }

            pub fn pool_clone(&self) -> PgPool {
                self.pool().clone()
            }

            /// Close pool connections and drop the scratch database.
            pub async fn close(mut self) -> Result<(), TestDatabaseError> {
                if let Some(pool) = self.pool.take() {
                    pool.close().await;
                }

                let admin_pool = PgPoolOptions::new()
                    .max_connections(1)
                    .connect_with(self.admin_options.clone())
                    .await?;
                let drop_sql = format!("DROP DATABASE IF EXISTS \"{}\" WITH (FORCE)", self.database_name);
                sqlx::query(&drop_sql).execute(&admin_pool).await?;
                admin_pool.close().await;

                // The container, if any, is removed when dropped.
                self.container.take();
                Ok(())
            }
        }
    }

    /// Builder for constructing Rocket instances tailored for integration tests.
    ///
    /// Defaults to the full route table over a fresh [`MemoryStore`], test
    /// secrets, and a non-dev platform.
    pub struct TestRocketBuilder {
        figment: Figment,
        store: SharedStore,
        auth: AuthState,
        app_config: AppConfig,
    }

    impl Default for TestRocketBuilder {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TestRocketBuilder {
        /// Start a builder with sensible defaults: random port, logging disabled.
        pub fn new() -> Self {
            let figment = rocket::Config::figment()
                .merge(("port", 0))
                .merge(("log_level", LogLevel::Off))
                .merge(("cli_colors", false));

            Self {
                figment,
                store: Arc::new(MemoryStore::new()),
                auth: test_auth_state(),
                app_config: AppConfig::default(),
            }
        }

        /// Use a caller-held store, e.g. an `Arc<MemoryStore>` the test also
        /// inspects directly.
        pub fn store(mut self, store: SharedStore) -> Self {
            self.store = store;
            self
        }

        /// Back the routes with Postgres.
        pub fn pg_pool(mut self, pool: PgPool) -> Self {
            self.store = Arc::new(PgStore::new(pool));
            self
        }

        pub fn auth_config(mut self, config: AuthConfig) -> Self {
            self.auth = AuthState::new(
                config,
                PasswordService::with_cost(1024, 1, 1).expect("cheap argon2 parameters are valid"),
            );
            self
        }

        pub fn platform(mut self, platform: &str) -> Self {
            self.app_config.platform = platform.to_string();
            self
        }

        /// Finish building the Rocket instance.
        pub fn build(self) -> Rocket<Build> {
            rocket::custom(self.figment)
                .attach(FileserverHits)
                .manage(self.store)
                .manage(self.auth)
                .manage(self.app_config)
                .manage(HitCounter::new())
                .mount("/api", crate::api_routes())
                .mount("/admin", crate::admin_routes())
                .register("/", crate::catchers())
        }

        /// Convenience helper to produce a blocking local client.
        pub fn blocking_client(self) -> Client {
            Client::tracked(self.build()).expect("valid Rocket instance")
        }

        /// Convenience helper to produce an asynchronous local client.
        pub async fn async_client(self) -> AsyncClient {
            AsyncClient::tracked(self.build())
                .await
                .expect("valid Rocket instance")
        }
    }
}
