//! Router setup with all API routes and middleware.
//!
//! Configures the axum Router with CORS for the portal's localhost origins,
//! request tracing, and all endpoint handlers.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState, port: u16) -> Router {
    // CORS: the widget is served from the portal dev server on localhost.
    let dev_port = port.saturating_add(1);
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list([
            format!("http://127.0.0.1:{}", port)
                .parse::<HeaderValue>()
                .unwrap(),
            format!("http://localhost:{}", port)
                .parse::<HeaderValue>()
                .unwrap(),
            format!("http://127.0.0.1:{}", dev_port)
                .parse::<HeaderValue>()
                .unwrap(),
            format!("http://localhost:{}", dev_port)
                .parse::<HeaderValue>()
                .unwrap(),
        ]))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/chat/sessions", post(handlers::create_session))
        .route(
            "/chat/sessions/{id}",
            axum::routing::delete(handlers::delete_session),
        )
        .route("/chat/sessions/{id}/message", post(handlers::post_message))
        .route("/chat/sessions/{id}/option", post(handlers::post_option))
        .route("/chat/sessions/{id}/ai-mode", post(handlers::set_ai_mode))
        .route("/chat/sessions/{id}/feedback", post(handlers::post_feedback))
        .route("/metrics/summary", get(handlers::metrics_summary))
        .route("/metrics/export", get(handlers::metrics_export))
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server on 127.0.0.1 (localhost only) at the given port.
pub async fn start_server(state: AppState, port: u16) -> Result<(), std::io::Error> {
    let addr = format!("127.0.0.1:{}", port);
    let router = create_router(state, port);

    tracing::info!("Starting API server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await
}
