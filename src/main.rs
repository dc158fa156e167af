//! Tiny Space Battles server - authoritative two-player match server
//!
//! Serves a WebSocket endpoint at `/ws` (one socket per participant) and a
//! health check at `/health`. All match state lives in a single tick loop.

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tiny_space_battles::app::AppState;
use tiny_space_battles::config::{parse_listen, Config};
use tiny_space_battles::game::GameServer;
use tiny_space_battles::http::build_router;

#[derive(Debug, Parser)]
#[command(name = "tiny-space-battles-server", about = "Authoritative Tiny Space Battles server")]
struct Cli {
    /// Address to listen on, e.g. localhost:31425
    #[arg(value_name = "HOST:PORT", value_parser = parse_listen)]
    listen: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Malformed arguments print usage and exit non-zero
    let cli = Cli::parse();
    let config = Config::load(cli.listen)?;

    init_tracing(&config.log_level);

    info!("Starting Tiny Space Battles server");

    let listener = TcpListener::bind(&config.listen).await?;
    let addr = listener.local_addr()?;

    let (game_server, handle) = GameServer::new(config.game.clone());
    let game_task = tokio::spawn(game_server.run());

    let state = AppState::new(config, handle);
    let router = build_router(state);

    info!("Server listening on {}", addr);
    info!("Health check: http://{}/health", addr);
    info!("WebSocket endpoint: ws://{}/ws", addr);

    let server = async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    };

    tokio::select! {
        result = server => result?,
        result = game_task => {
            // the loop only returns early on an invariant violation
            result??;
            anyhow::bail!("game loop stopped unexpectedly");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}
