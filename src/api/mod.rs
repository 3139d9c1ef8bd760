use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{config::GenerationSettings, generation::GenerationClient};

pub mod error;
pub mod handlers;
pub mod types;

#[derive(Clone)]
pub struct AppState {
    pub generation: Arc<GenerationClient>,
}

impl AppState {
    pub fn new(settings: GenerationSettings) -> Self {
        Self {
            generation: Arc::new(GenerationClient::new(settings)),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/generate-roadmap", post(handlers::generate_roadmap))
        .route("/code-feedback", post(handlers::code_feedback))
        .route("/api/generate", post(handlers::quiz_question))
        .fallback(handlers::not_found)
        // CORS for frontend
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
