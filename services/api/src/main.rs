mod config;
mod error;
mod routes;

use crate::config::Config;
use anyhow::{Context, Result};
use interview_core::InterviewService;
use interview_core::prompt_loader::load_prompt_set;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load application configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .init();

    tracing::info!(
        "Configuration loaded successfully. Using {:?} provider with model {}",
        config.provider.provider,
        config.provider.chat_model
    );

    // --- 3. Load Prompts ---
    let prompts = load_prompt_set(config.provider.prompts_dir.as_deref())
        .context("Failed to load interviewer prompts")?;

    // --- 4. Initialize Collaborators ---
    let model = config
        .provider
        .build_model()
        .context("Failed to build completion model")?;
    let mut service = InterviewService::new(model, prompts, config.interview.clone());
    match config.provider.build_speech() {
        Some(speech) => {
            tracing::info!("Speech transcription and synthesis enabled");
            service = service
                .with_transcriber(speech.clone())
                .with_synthesizer(speech);
        }
        None => tracing::info!("Speech disabled; voice turns will be rejected"),
    }
    let service = Arc::new(service);
    let sweeper = service.spawn_sweeper();

    // Configure a permissive CORS policy so a separately served frontend can call the API.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::router(service)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // --- 5. Serve ---
    let listener = tokio::net::TcpListener::bind(config.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address))?;
    tracing::info!("Mock interview API listening on {}", config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Ctrl-C received, shutting down");
        })
        .await?;

    sweeper.abort();
    Ok(())
}
