//! # catalog: Product Catalog Service
//!
//! `catalog` is an HTTP backend for a small product catalog. Clients create, list, update and
//! delete products, each optionally carrying an uploaded image. Product records live in SQLite,
//! images live in a local upload directory that the service also serves.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for the HTTP layer and
//! [sqlx](https://github.com/launchbadge/sqlx) over SQLite for persistence.
//!
//! A request to `/api/products*` is handled by a function in [`api::handlers::products`]. Multipart
//! bodies are parsed and validated by the [`api::models::products::ProductForm`] extractor before
//! the handler runs. Handlers store any image through [`storage::FileStorage`], then persist via
//! [`service::ProductService`], which delegates to the [`db::handlers::Products`] repository.
//!
//! Stored images are served under `/uploads`. Everything not matched by an API route falls
//! through to the bundled frontend in `static/`, with `index.html` serving client-side routes.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use catalog::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = catalog::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     catalog::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod service;
pub mod storage;
pub mod telemetry;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use crate::{
    config::CorsOrigin,
    openapi::ApiDoc,
    service::ProductService,
    storage::{FileStorage, LocalFileStorage, UPLOADS_URL_PREFIX},
};
use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::{Json, Router, routing::get};
use bon::Builder;
pub use config::Config;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

/// Application state shared across all request handlers.
///
/// ```ignore
/// let state = AppState::builder()
///     .config(config)
///     .products(ProductService::new(pool))
///     .storage(Arc::new(LocalFileStorage::new("uploads")?))
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub products: ProductService,
    pub storage: Arc<dyn FileStorage>,
}

/// Get the catalog database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Open the configured SQLite database (creating the file if needed) and apply migrations.
#[instrument(skip_all, err)]
async fn setup_database(config: &Config) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.database.url)
        .with_context(|| format!("Invalid database url {}", config.database.url))?
        .create_if_missing(true);

    let settings = &config.database.pool;
    let seconds = |secs: u64| (secs > 0).then(|| Duration::from_secs(secs));

    let pool = SqlitePoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .idle_timeout(seconds(settings.idle_timeout_secs))
        .max_lifetime(seconds(settings.max_lifetime_secs))
        .connect_with(options)
        .await?;

    migrator().run(&pool).await?;
    info!("Database ready at {}", config.database.url);

    Ok(pool)
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let cors = &config.cors;

    let allow_origin = if cors.allowed_origins.contains(&CorsOrigin::Wildcard) {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &cors.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                // Browsers send the bare origin, without the trailing slash Url adds
                origins.push(url.origin().ascii_serialization().parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut layer = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(cors.allow_credentials);

    if let Some(max_age) = cors.max_age {
        layer = layer.max_age(Duration::from_secs(max_age));
    }

    Ok(layer)
}

/// Build the main application router.
///
/// - Product API under `/api`, with the request body capped at `uploads.max_body_size`
/// - Stored images under `/uploads`
/// - `/healthz`, `/docs` and `/api-docs/openapi.json`
/// - Embedded frontend assets as the fallback
///
/// # Errors
///
/// Returns an error if the CORS configuration cannot be turned into header values.
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    use api::handlers::{products, static_assets};

    let upload_limit = state.config.uploads.max_body_size;
    let upload_dir = state.config.uploads.dir.clone();
    let cors_layer = create_cors_layer(&state.config)?;

    let api_routes = Router::new()
        .route("/products", get(products::list_products).post(products::create_product))
        .route(
            "/products/{id}",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state);

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .nest("/api", api_routes)
        .nest_service(UPLOADS_URL_PREFIX, ServeDir::new(upload_dir))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .fallback_service(get(static_assets::serve_embedded_asset))
        .layer(cors_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    Ok(router)
}

pub struct Application {
    router: Router,
    config: Config,
    pool: SqlitePool,
}

impl Application {
    /// Create a new application instance, opening the configured database
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::new_with_pool(config, None).await
    }

    /// Create a new application instance, reusing `pool` when given.
    ///
    /// Migrations are applied to a supplied pool as well.
    pub async fn new_with_pool(config: Config, pool: Option<SqlitePool>) -> anyhow::Result<Self> {
        debug!("Starting catalog with configuration: {:#?}", config);

        let pool = match pool {
            Some(pool) => {
                migrator().run(&pool).await?;
                pool
            }
            None => setup_database(&config).await?,
        };

        let storage = LocalFileStorage::new(&config.uploads.dir)
            .with_context(|| format!("Failed to prepare upload directory {}", config.uploads.dir.display()))?;

        let state = AppState::builder()
            .config(config.clone())
            .products(ProductService::new(pool.clone()))
            .storage(Arc::new(storage))
            .build();

        let router = build_router(state)?;

        Ok(Self { router, config, pool })
    }

    #[cfg(any(test, feature = "test-utils"))]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Catalog listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}
