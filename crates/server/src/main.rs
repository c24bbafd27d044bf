use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use edapt_core::content::{ContentGenerator, LlmContentGenerator};
use edapt_core::media::{FfprobeProber, MediaProber};
use edapt_core::mux::{FfmpegMuxer, Muxer};
use edapt_core::narration::{GoogleTtsSynthesizer, Synthesizer};
use edapt_core::render::{ManimRenderer, Renderer};
use edapt_core::{
    load_config, validate_config, InMemorySessionStore, JobDispatcher, PipelineController,
    Publisher, SessionStore, StageAdapters,
};

use edapt_server::api::create_router;
use edapt_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("edapt v{}", VERSION);

    // Determine config path
    let config_path = std::env::var("EDAPT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Output directory: {:?}", config.storage.output_dir);
    info!(
        "Public directory: {:?} served under {}",
        config.storage.public_dir, config.storage.public_url_prefix
    );

    tokio::fs::create_dir_all(&config.storage.output_dir)
        .await
        .with_context(|| format!("Failed to create {:?}", config.storage.output_dir))?;
    tokio::fs::create_dir_all(&config.storage.public_dir)
        .await
        .with_context(|| format!("Failed to create {:?}", config.storage.public_dir))?;

    // Stage adapters
    let prober: Arc<dyn MediaProber> = Arc::new(FfprobeProber::new(&config.media.ffprobe_path));

    let llm_client = config
        .content
        .build_client()
        .context("Failed to create LLM client")?;
    let generator: Arc<dyn ContentGenerator> =
        Arc::new(LlmContentGenerator::new(llm_client, config.content.clone()));
    info!(
        "Content generation: {} ({:?})",
        generator.name(),
        config.content.provider
    );

    let synthesizer: Arc<dyn Synthesizer> = Arc::new(GoogleTtsSynthesizer::new(
        config.narration.clone(),
        Arc::clone(&prober),
    ));
    info!("Narration: {}", synthesizer.name());

    let renderer: Arc<dyn Renderer> = Arc::new(ManimRenderer::new(
        config.renderer.clone(),
        Arc::clone(&prober),
    ));
    match renderer.validate().await {
        Ok(()) => info!("Renderer available: {}", renderer.name()),
        Err(e) => warn!("Renderer unavailable, videos will fail: {}", e),
    }

    let muxer: Arc<dyn Muxer> = Arc::new(FfmpegMuxer::new(
        config.media.clone(),
        Arc::clone(&prober),
    ));
    match muxer.validate().await {
        Ok(()) => info!("Muxer available: {}", muxer.name()),
        Err(e) => warn!("Muxer unavailable, videos will fail: {}", e),
    }

    // Pipeline
    let store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
    let controller = Arc::new(PipelineController::new(
        config.pipeline.clone(),
        config.storage.output_dir.clone(),
        Arc::clone(&store),
        StageAdapters {
            generator,
            synthesizer,
            renderer,
            muxer,
        },
    ));
    let publisher = Arc::new(Publisher::new(config.storage.clone()));

    let mut dispatcher = JobDispatcher::new(Arc::clone(&store), controller);
    if config.pipeline.auto_publish {
        info!("Auto-publish enabled");
        dispatcher = dispatcher.with_publisher(Arc::clone(&publisher));
    }

    let addr = SocketAddr::new(config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, store, dispatcher, publisher));

    // Create router
    let app = create_router(state);

    // Start server
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
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
