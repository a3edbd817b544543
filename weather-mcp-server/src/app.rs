use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use weather_mcp_core::{
    McpRouter, OutboundEnvelope,
    protocol::{self, Capabilities},
};

/// Build the HTTP application around a request router.
pub fn app(router: McpRouter) -> Router {
    Router::new()
        .route("/", get(capabilities))
        .route("/mcp", post(mcp))
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(router)
}

/// GET /: static description of the server and its tools.
async fn capabilities() -> Json<Capabilities> {
    Json(protocol::capabilities())
}

/// POST /mcp: always 200; failures travel in the envelope's `error` field.
async fn mcp(State(router): State<McpRouter>, body: Bytes) -> Json<OutboundEnvelope> {
    Json(router.handle_bytes(&body).await)
}
