//! HTTP API for the card-lobby service
//!
//! # Endpoints
//!
//! - `POST /create_lobby` - open a lobby around a fresh deck
//! - `POST /join_lobby` - `{lobby_code, player_name}`
//! - `POST /start_game` - `{lobby_code}`, deals two cards to every player
//! - `GET  /get_hand/{player}` - hand lookup across lobbies, oldest first
//! - `GET  /get_hand/{lobby_code}/{player}` - hand lookup in one lobby
//! - `POST /draw_card` - `{lobby_code, player_name}`
//! - `POST /next_phase` - `{lobby_code}`, reveals community cards
//! - `GET  /lobby/{code}` - lobby overview
//!
//! Monitoring routes (`/health`, `/ready`, `/alive`, `/metrics`, `/stats`)
//! are served by the same router. Failures come back as `{"error": "..."}`.

pub mod error;
pub mod handlers;
pub mod models;

use crate::metrics::health::{monitoring_router, HealthServerState};
use crate::service::app::AppState;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

pub use error::ApiError;
pub use models::{
    CreateLobbyResponse, DrawCardResponse, ErrorResponse, LobbyRequest, LobbyView,
    MessageResponse, NextPhaseResponse, PlayerRequest,
};

/// Lobby game routes only
pub fn lobby_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/create_lobby", post(handlers::create_lobby))
        .route("/join_lobby", post(handlers::join_lobby))
        .route("/start_game", post(handlers::start_game))
        .route("/get_hand/{player}", get(handlers::get_hand))
        .route(
            "/get_hand/{lobby_code}/{player}",
            get(handlers::get_hand_in_lobby),
        )
        .route("/draw_card", post(handlers::draw_card))
        .route("/next_phase", post(handlers::next_phase))
        .route("/lobby/{code}", get(handlers::get_lobby))
        .with_state(state)
}

/// Complete router: lobby routes plus monitoring endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    let monitoring =
        HealthServerState::new(state.metrics_collector()).with_app_state(state.clone());

    lobby_routes(state).merge(monitoring_router(monitoring))
}
