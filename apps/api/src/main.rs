mod config;
mod errors;
mod evaluation;
mod model;
mod routes;
mod state;
mod summarization;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tokio::task::JoinError;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::evaluation::{RougeScorer, SummaryScorer};
use crate::model::LoadError;
use crate::routes::build_router;
use crate::state::AppState;
use crate::summarization::Summarizer;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http=info",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Summarizer API v{}", env!("CARGO_PKG_VERSION"));

    // Load model + tokenizer. Failure leaves the service up but not ready.
    let load_config = config.clone();
    let outcome = tokio::task::spawn_blocking(move || model::load(&load_config)).await;
    if let Ok(Ok(loaded)) = &outcome {
        info!(
            "Model and tokenizer loaded successfully on {}",
            model::device::device_label(loaded.device())
        );
    }
    let summarizer = summarizer_or_not_ready(outcome);

    let scorer: Arc<dyn SummaryScorer> = Arc::new(RougeScorer::new());
    info!("ROUGE scorer initialized (rouge1, rouge2, rougeL)");

    let state = AppState::new(summarizer, Some(scorer));

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Any load failure, including a panic in the loader task, leaves the
/// service up with no summarizer installed.
fn summarizer_or_not_ready<S: Summarizer + 'static>(
    outcome: Result<Result<S, LoadError>, JoinError>,
) -> Option<Arc<dyn Summarizer>> {
    match outcome {
        Ok(Ok(loaded)) => Some(Arc::new(loaded)),
        Ok(Err(e)) => {
            error!("Error loading model: {e}");
            None
        }
        Err(e) => {
            error!("Model loader task failed: {e}");
            None
        }
    }
}
