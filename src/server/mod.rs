//! HTTP surface over the graph store and the completion service.

pub mod error;
pub mod handlers;

use std::net::SocketAddr;
use std::time::Instant;

use axum::body::Body;
use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::completion::CompletionGateway;
use crate::store::StoreGateway;

#[derive(Debug, Clone)]
pub struct AppState {
    pub store: StoreGateway,
    pub completion: CompletionGateway,
}

impl AppState {
    pub fn new(store: StoreGateway, completion: CompletionGateway) -> Self {
        Self { store, completion }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/recipes", get(handlers::list_recipes))
        .route("/recipes/diet", get(handlers::recipes_by_diet))
        .route("/alternatives", get(handlers::alternatives))
        .route("/ingredients/calories", get(handlers::ingredient_calories))
        .route("/ingredients/nutrition", get(handlers::ingredient_nutrition))
        .route("/gemini", get(handlers::completion))
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
}

async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = start.elapsed().as_millis();
    if status.is_client_error() || status.is_server_error() {
        warn!(%method, %uri, %status, elapsed_ms, "request failed");
    } else {
        info!(%method, %uri, %status, elapsed_ms, "request served");
    }
    response
}

/// Serves the router on `addr` until `shutdown` is cancelled.
pub async fn serve(
    addr: SocketAddr,
    state: AppState,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, store = state.store.endpoint(), "recipe server listening");
    axum::serve(listener, build_router(state).into_make_service())
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}
