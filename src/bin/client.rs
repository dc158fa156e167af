//! Tiny Space Battles terminal client
//!
//! Reads key presses from stdin (one line at a time, each character is a key)
//! and logs the match as the server reports it.

use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tiny_space_battles::client::{
    ClientState, Connection, ConnectionStatus, InputMap, InputTag, TransportEvent,
};
use tiny_space_battles::config::{parse_listen, GameConfig};

const FRAME: Duration = Duration::from_millis(16);

#[derive(Debug, Parser)]
#[command(name = "tiny-space-battles-client", about = "Tiny Space Battles client")]
struct Cli {
    /// Server address, e.g. localhost:31425
    #[arg(value_name = "HOST:PORT", value_parser = parse_listen)]
    server: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let mut connection = Connection::open(&cli.server).await?;
    let mut state = ClientState::new(GameConfig::default());
    state.on_connected();

    let (keys_tx, mut keys_rx) = mpsc::unbounded_channel::<InputTag>();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            for key in line.chars() {
                if keys_tx.send(InputTag::Key(key)).is_err() {
                    return;
                }
            }
        }
    });

    let input = InputMap::keyboard();
    let mut frame = tokio::time::interval(FRAME);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut last_labels = (String::new(), String::new());

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Received Ctrl+C, leaving");
                break;
            }
            _ = frame.tick() => {}
        }

        while let Some(event) = connection.poll() {
            match event {
                TransportEvent::Message(msg) => state.apply(msg),
                TransportEvent::Closed => {
                    state.on_disconnected();
                    break;
                }
            }
        }

        while let Ok(key) = keys_rx.try_recv() {
            if let Some(intent) = input.resolve(key) {
                state.on_intent(intent);
            }
        }

        for msg in state.take_outgoing() {
            if let Err(e) = connection.send(msg) {
                warn!(error = %e, "Failed to queue message");
                state.on_disconnected();
                break;
            }
        }

        let snapshot = state.snapshot();
        let labels = (snapshot.status_label, snapshot.players_label);
        if labels != last_labels {
            let local = snapshot.ships.iter().find(|ship| ship.is_local);
            info!(
                status = %labels.0,
                players = %labels.1,
                health = ?local.map(|ship| ship.health),
                "Match update"
            );
            last_labels = labels;
        }

        if state.status() == ConnectionStatus::Disconnected {
            break;
        }
    }

    Ok(())
}
