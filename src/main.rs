//! MindMate - HTTP gateway for the MindMate mental wellness API

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mindmate_gateway::{config::Args, server::AppState, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing/logging
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("mindmate_gateway={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration
    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    // Print startup banner
    info!("======================================");
    info!("  MindMate API Gateway");
    info!("======================================");
    info!("Node ID: {}", args.node_id);
    info!("Listen: {}", args.listen);
    info!(
        "Mode: {}",
        if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" }
    );
    info!("Supabase: {}", args.supabase_url);
    info!("Gemini model: {}", args.gemini_model);
    info!("Allowed origins: {}", args.allowed_origin_list().len());
    info!("======================================");

    if args.dev_mode && args.supabase_service_key.is_none() {
        warn!("No SUPABASE_SERVICE_KEY set, using dev fallback key");
    }

    let state = Arc::new(AppState::new(args)?);

    server::run(state).await?;

    Ok(())
}
