pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod models;
pub mod rbac;
pub mod routes;
pub mod services;
pub mod storefront;
pub mod telemetry;

use axum::{extract::DefaultBodyLimit, middleware, routing::get, Router};
use sqlx::SqlitePool;
use std::path::PathBuf;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::config::Config;
use crate::rbac::SessionKeys;
use crate::services::upload_service::UploadStore;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub uploads: UploadStore,
    pub keys: SessionKeys,
    pub public_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: &Config) -> Self {
        Self {
            pool,
            uploads: UploadStore::new(&config.public_dir),
            keys: SessionKeys::new(&config.session_secret),
            public_dir: config.public_dir.clone(),
            max_upload_bytes: config.max_upload_bytes,
        }
    }
}

impl axum::extract::FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl axum::extract::FromRef<AppState> for UploadStore {
    fn from_ref(state: &AppState) -> Self {
        state.uploads.clone()
    }
}

impl axum::extract::FromRef<AppState> for SessionKeys {
    fn from_ref(state: &AppState) -> Self {
        state.keys.clone()
    }
}

/// The full application: api, health check and the public directory
/// (pages and `/uploads`), all behind the access gate.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .merge(routes::api_routes())
        .fallback_service(ServeDir::new(&state.public_dir))
        .layer(middleware::from_fn_with_state(state.clone(), rbac::access_gate))
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
