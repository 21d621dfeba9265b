//! The reporting service. Keeps per-user aggregates in a flat-file document store and
//! exposes them over a small JSON API.

use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::storage::document_store::JsonFileStore;

pub mod args;
pub mod error;
pub mod handlers;
pub mod users;

use args::ServerArgs;
use users::UserRepository;

#[derive(Clone)]
pub struct AppState {
    pub users: UserRepository,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/save-data", post(handlers::save_data))
        .route("/api/get-data/{user_id}", get(handlers::get_data))
        .route("/api/weekly-report/{user_id}", get(handlers::weekly_report))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds the listener and serves until ctrl-c.
pub async fn start_server(args: &ServerArgs, db_path: std::path::PathBuf) -> Result<()> {
    info!("Using document store {db_path:?}");
    let store = JsonFileStore::new(db_path);
    let app = router(AppState {
        users: UserRepository::new(Arc::new(store)),
    });

    let addr = SocketAddr::new(args.host, args.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Server running on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;
    Ok(())
}
