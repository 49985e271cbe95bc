mod handlers;
mod state;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post, put};
use axum::Router;
use state::AppState;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;

use crate::book::CustomerBook;
use crate::location::LocationPipeline;

/// Room for a full-size photo once base64-encoded, plus the JSON around it.
const BODY_LIMIT: usize = crate::book::photo::MAX_PHOTO_BYTES * 4 / 3 + 64 * 1024;

pub fn build_router(pipeline: LocationPipeline, book: CustomerBook, phone_prefix: String) -> Router {
    let state = Arc::new(AppState {
        pipeline,
        book: Mutex::new(book),
        phone_prefix,
    });

    Router::new()
        .route("/api/resolve", get(handlers::resolve))
        .route("/api/locate", get(handlers::locate))
        .route(
            "/api/customers",
            get(handlers::list_customers).post(handlers::add_customer),
        )
        .route(
            "/api/customers/{id}",
            put(handlers::update_customer).delete(handlers::delete_customer),
        )
        .route("/api/customers/{id}/photos", post(handlers::add_photo))
        .route("/api/customers/{id}/photos/{photo_id}", delete(handlers::delete_photo))
        .route("/api/customers/{id}/share", get(handlers::share_customer))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start(host: &str, port: u16, router: Router) -> std::io::Result<()> {
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("pinbook server listening on http://{}", addr);
    eprintln!("  pinbook server listening on http://{}", addr);
    eprintln!("  Press Ctrl+C to stop.");

    axum::serve(listener, router).await
}
