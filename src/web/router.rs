//! Web router configuration.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use super::handlers::{
    download, expired, index, login, logout, problem, problem_page, submit_answer, success,
};
use super::state::AppState;
use crate::error::GateError;

/// Create the router with all routes configured.
pub fn create_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.settings.public_dir);

    Router::new()
        .route("/", get(index))
        .route("/login", post(login))
        .route("/problem", get(problem))
        .route("/problem-page", get(problem_page))
        .route("/submit-answer", post(submit_answer))
        .route("/success", get(success))
        .route("/download", get(download))
        .route("/logout", get(logout))
        .route("/expired", get(expired))
        .nest_service("/static", static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Finish in-flight requests on Ctrl-C instead of dropping them.
    pub graceful_shutdown: bool,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            graceful_shutdown: true,
        }
    }

    pub fn without_graceful_shutdown(mut self) -> Self {
        self.graceful_shutdown = false;
        self
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new("127.0.0.1", 3000)
    }
}

/// Start the web server.
pub async fn serve(config: ServerConfig, state: AppState) -> crate::Result<()> {
    let addr = config.bind_address();
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server running at http://{}", addr);

    let server = axum::serve(listener, router);
    let result = if config.graceful_shutdown {
        server.with_graceful_shutdown(shutdown_signal()).await
    } else {
        server.await
    };

    result.map_err(|e| GateError::Server(e.to_string()))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
