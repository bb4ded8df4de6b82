use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use model_serve::config::{Cli, Config};
use model_serve::inference::engine::InferenceEngine;
use model_serve::model::load_model;
use model_serve::server::auth::BearerAuth;
use model_serve::server::{build_router, AppState};
use model_serve::telemetry::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments.
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.log_format);

    info!("model-serve v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration. Refuses to continue without an auth token.
    let config = Config::from_cli(&cli)?;

    info!(
        model = %config.model.model_path.display(),
        listen = config.server.listen,
        max_body_bytes = config.server.max_body_bytes,
        "Configuration loaded"
    );

    // The model must be in memory before the listener is bound.
    let model = load_model(&config.model)?;

    let state = Arc::new(AppState::new(
        InferenceEngine::new(model),
        BearerAuth::new(&config.auth.token),
    ));

    let app = build_router(state, &config.server);

    let listener = TcpListener::bind(&config.server.listen).await?;
    info!("Listening on {}", config.server.listen);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {e}");
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

    info!("Shutdown signal received");
}
