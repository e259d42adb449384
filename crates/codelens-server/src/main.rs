mod config;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use codelens_ai::{AiGateway, AnalysisMode, GeminiProvider, GenerationConfig};
use codelens_api::AppStateInner;
use codelens_db::Database;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "codelens=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;
    if config.uses_dev_secret() {
        warn!("CODELENS_SESSION_SECRET not set, using the development secret");
    }

    let db = Database::open(&config.db_path)?;

    let gateway = match &config.google_api_key {
        Some(key) => {
            let provider = GeminiProvider::new(
                key.clone(),
                config.gemini_model.clone(),
                config.gemini_base_url.clone(),
                AnalysisMode::Full.timeout(),
                GenerationConfig::default(),
            )?;
            AiGateway::new(Arc::new(provider))
        }
        None => {
            warn!("GOOGLE_API_KEY not set, every analysis will use the fallback result");
            AiGateway::disabled()
        }
    };
    info!(
        provider = gateway.provider(),
        model = gateway.model_name(),
        "AI gateway ready"
    );

    let state = AppStateInner::new(db, config.session_secret.clone(), gateway)?;

    let app = codelens_api::router(state)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(TraceLayer::new_for_http());

    let addr = config.addr()?;
    info!("CodeLens listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("SIGTERM handler unavailable: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
