use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::info;

use weft_core::Result;

use crate::routes;
use crate::state::AppState;

/// HTTP transport for one agent, built on axum: the discovery document
/// plus the JSON-RPC endpoint.
pub struct A2aServer {
    state: Arc<AppState>,
}

impl A2aServer {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/.well-known/agent.json", get(routes::agent_card))
            .route("/", post(routes::rpc))
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone())
    }

    /// Run the server until the cancellation token is triggered.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<()> {
        let addr = format!(
            "{}:{}",
            self.state.descriptor.host, self.state.descriptor.port
        );
        let listener = TcpListener::bind(&addr).await?;
        info!(addr = %addr, agent = %self.state.descriptor.name, "agent listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        info!("server shut down");
        Ok(())
    }
}
