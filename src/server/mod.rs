use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use crate::pipeline::IngestPipeline;
use crate::query::Explainer;
use crate::storage::GraphStore;

pub mod routes;

/// Largest accepted upload body
pub const UPLOAD_LIMIT: usize = 1024 * 1024 * 1024;

/// Server state
pub struct AppState {
    pub store: Arc<dyn GraphStore>,
    pub pipeline: IngestPipeline,
    pub explainer: Explainer,
}

impl AppState {
    pub fn new(store: Arc<dyn GraphStore>, explainer: Explainer) -> Self {
        Self {
            store,
            pipeline: IngestPipeline::default(),
            explainer,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/projects/upload", post(routes::upload_project))
        .route("/graph/nodes", get(routes::get_nodes))
        .route("/graph/edges", get(routes::get_edges))
        .route("/graph/search", get(routes::search))
        .route("/graph/module/{id}", get(routes::get_module))
        .route("/explain/module/{id}", post(routes::explain_module))
        .route("/health", get(routes::health))
        .layer(DefaultBodyLimit::max(UPLOAD_LIMIT))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(port: u16, state: AppState) -> anyhow::Result<()> {
    state.store.ensure_schema()?;
    let app = router(Arc::new(state));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting server on {}", addr);
    println!("🌍 Server running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
