//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum router with the liveness handlers
//! - Wire up tracing middleware
//! - Serve until the shutdown coordinator fires

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::lifecycle::Shutdown;

/// Identity reported by the liveness handlers.
#[derive(Clone)]
pub struct AppState {
    pub app_name: String,
    pub host_name: String,
}

/// Host server answering the registry's and siblings' liveness requests.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(state: AppState) -> Self {
        Self {
            router: Self::build_router(state),
        }
    }

    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/", get(root_handler))
            .route("/health", get(health_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// The router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` is triggered.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: Shutdown,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn root_handler(State(state): State<AppState>) -> impl IntoResponse {
    format!("{} on {}\n", state.app_name, state.host_name)
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "UP",
        "app": state.app_name,
        "host": state.host_name,
    }))
}
