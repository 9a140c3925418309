use crate::state::AppState;
use axum::Router;
use axum::routing::{get, post};

pub mod handlers;
pub mod responses;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::get_health))
        .route("/api/ai/log", post(handlers::post_log))
        .route("/api/ai/predict", post(handlers::post_predict))
        .route("/api/ai/calculate-points", post(handlers::post_calculate_points))
        .route("/api/ai/train", post(handlers::post_train))
        .route("/api/ai/chat", post(handlers::post_chat))
        .with_state(state)
}
