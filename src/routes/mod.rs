use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware::from_fn,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{make_span_with_request_id, request_id_middleware};

pub mod auth;
pub mod movies;
pub mod state;

pub use state::AppState;

/// Creates the application router with all routes and middleware
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/auth", auth_routes())
        .nest("/api/movies", movie_routes())
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

fn auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/profile", get(auth::profile))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/change-password", put(auth::change_password))
}

fn movie_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/search", post(movies::search))
        .route("/home", get(movies::home))
        .route("/movie/:movie_id", get(movies::movie))
        .route("/recommended", get(movies::recommended))
        .route("/history", get(movies::history).post(movies::touch_history))
}

async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
