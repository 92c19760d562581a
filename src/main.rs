//! Release Notes Backend
//!
//! Mirrors GitHub release notes into a local store, keeps them fresh through
//! release webhooks, and serves them alongside static build metadata.

mod api;
mod auth;
mod blob;
mod config;
mod db;
mod errors;
mod github;
mod models;
mod service;
mod store;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use auth::WebhookSecretValidator;
use config::Config;
use db::ReleaseNoteRepository;
use github::GithubReleaseSource;
use service::{CiBuildMetadataService, ModuleCatalog, ReleaseNoteService};
use store::{CachedReleaseStore, ReleaseStore, SqlReleaseStore};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub releases: Arc<ReleaseNoteService>,
    pub validator: Arc<WebhookSecretValidator>,
    pub build_metadata: Arc<CiBuildMetadataService>,
    pub modules: Arc<ModuleCatalog>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Release Notes Backend");
    tracing::info!(
        "Tracking releases of {}/{}",
        config.github.org,
        config.github.repo
    );
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.github.webhook_secret.is_empty() {
        tracing::warn!("No webhook secret configured (RN_GITHUB_WEBHOOK_SECRET). Webhooks will be rejected!");
    }

    let store = build_store(&config).await?;
    tracing::info!("Release store backend: {}", store.backend());

    let source = Arc::new(GithubReleaseSource::new(&config.github));
    let releases = Arc::new(ReleaseNoteService::new(
        source,
        store,
        config.github.tag_link_base.clone(),
    ));

    // Seed the store in the background; the server answers requests meanwhile.
    tokio::spawn({
        let releases = releases.clone();
        async move {
            tracing::info!("Getting releases from GitHub");
            releases.get_releases_on_initialization().await;
        }
    });

    let state = AppState {
        releases,
        validator: Arc::new(WebhookSecretValidator::from_config(&config.github)),
        build_metadata: Arc::new(CiBuildMetadataService::new()),
        modules: Arc::new(ModuleCatalog::new(&config.module)),
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Pick the release store once at startup. The database is only opened when
/// blob storage is disabled.
async fn build_store(config: &Config) -> Result<Arc<dyn ReleaseStore>, errors::AppError> {
    if config.blob.enabled {
        let blob = blob::from_config(&config.blob.kind)?;
        return Ok(Arc::new(CachedReleaseStore::new(blob)));
    }

    tracing::info!("Database path: {:?}", config.db_path);
    let pool = db::init_database(&config.db_path).await?;
    Ok(Arc::new(SqlReleaseStore::new(ReleaseNoteRepository::new(
        pool,
    ))))
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Releases
        .route("/releases", get(api::get_releases))
        .route("/webhook/{secret}", post(api::release_webhook))
        // Build metadata
        .route("/buildpack/metadata", get(api::get_buildpack_metadata))
        .route(
            "/dockerfile/template/metadata",
            get(api::get_dockerfile_template_metadata),
        )
        // Module catalog
        .route("/modules", get(api::get_modules))
        .route("/v2/modules", get(api::get_modules_v2))
        .route("/module", get(api::get_module_by_name))
        // Health check
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
