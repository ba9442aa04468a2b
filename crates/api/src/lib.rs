//! `api` crate — HTTP REST API layer.
//!
//! Every table in [`entities`] is mounted through the generic
//! [`crud::crud_router`] under `/api/v1/<table>`:
//!   GET    /api/v1/{table}
//!   GET    /api/v1/{table}/{id}
//!   POST   /api/v1/{table}
//!   PATCH  /api/v1/{table}/{id}
//!   DELETE /api/v1/{table}/{id}

pub mod crud;
pub mod entities;
pub mod error;
pub mod query;
pub mod schema;
pub mod state;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub use crud::crud_router;
pub use error::ApiError;
pub use schema::{Column, TableSchema, ValidationError};
pub use state::Backend;

/// Path prefix every table is mounted under.
pub const API_PREFIX: &str = "/api/v1";

/// Mount each table's CRUD router under `/api/v1/<table>`.
pub fn build_router(backend: Backend, tables: Vec<TableSchema>) -> Router {
    let router = tables.into_iter().fold(Router::new(), |router, schema| {
        let path = format!("{API_PREFIX}/{}", schema.name());
        info!("Mounting {path}");
        router.nest(&path, crud_router(backend.clone(), schema))
    });

    router.layer(TraceLayer::new_for_http())
}

/// The application router with the departments and employees tables.
pub fn app(backend: Backend) -> Router {
    build_router(backend, entities::all())
}

/// Serve `app` on `bind` until Ctrl+C or SIGTERM.
pub async fn serve(bind: &str, backend: Backend) -> std::io::Result<()> {
    let listener = TcpListener::bind(bind).await?;
    info!("Server running on {}", listener.local_addr()?);

    axum::serve(listener, app(backend))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown"),
        _ = terminate => info!("Received SIGTERM, starting shutdown"),
    }
}
