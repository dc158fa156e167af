//! HTTP route definitions

use axum::{extract::State, response::Json, routing::get, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::app::AppState;
use crate::ws::handler::ws_handler;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    active_players: usize,
    waiting_players: usize,
    ready: bool,
    game_over: bool,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = state.server.status_rx.borrow().clone();

    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.uptime_secs(),
        active_players: status.active_players,
        waiting_players: status.waiting_players,
        ready: status.ready,
        game_over: status.game_over,
    })
}
