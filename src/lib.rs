//! Interview-prep backend: validates learning requests, renders prompts and
//! proxies them to a hosted text-generation API.

use std::net::SocketAddr;

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

pub mod api;
pub mod config;
pub mod feedback;
pub mod generation;
pub mod prompts;
pub mod quiz;
pub mod roadmap;
pub mod validation;

pub use api::AppState;
pub use config::{AppConfig, GenerationSettings, KeyPlacement};

pub fn build_app(settings: GenerationSettings) -> Router {
    api::router(AppState::new(settings))
}

pub async fn run_server(config: AppConfig) -> Result<()> {
    if config.generation.api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY is not set; generation requests will fail");
    }

    let addr = SocketAddr::new(config.bind_addr, config.port);
    let app = build_app(config.generation);

    let listener = TcpListener::bind(addr).await?;
    info!("HTTP listening on http://{addr}");
    info!("Roadmap endpoint at http://{addr}/generate-roadmap");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
