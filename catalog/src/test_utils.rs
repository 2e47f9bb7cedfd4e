//! Test utilities for integration testing (available with `test-utils` feature).

use crate::config::{Config, PoolSettings};
use axum_test::TestServer;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use std::path::Path;

/// In-memory SQLite database with the schema applied.
///
/// The pool holds exactly one connection that never expires: each in-memory connection is its
/// own database, so a second connection would see an empty schema.
pub async fn create_test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");

    crate::migrator().run(&pool).await.expect("Failed to run migrations");

    pool
}

/// Config for tests: uploads go to `upload_dir`, everything else uses defaults.
pub fn create_test_config(upload_dir: &Path) -> Config {
    let mut config = Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        ..Default::default()
    };
    config.database.url = "sqlite::memory:".to_string();
    config.database.pool = PoolSettings {
        max_connections: 1,
        min_connections: 1,
        idle_timeout_secs: 0,
        max_lifetime_secs: 0,
        ..Default::default()
    };
    config.uploads.dir = upload_dir.to_path_buf();
    config
}

/// Full application router backed by a fresh in-memory database.
pub async fn create_test_app(config: Config) -> TestServer {
    let pool = create_test_pool().await;

    let app = crate::Application::new_with_pool(config, Some(pool))
        .await
        .expect("Failed to create application");

    app.into_test_server()
}
