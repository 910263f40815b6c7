//! Lobby API handlers
//!
//! Each handler validates its body, calls into the `LobbyManager` and turns
//! the outcome into a JSON response.

use crate::api::error::ApiError;
use crate::api::models::{
    CreateLobbyResponse, DrawCardResponse, LobbyRequest, LobbyView, MessageResponse,
    NextPhaseResponse, PlayerRequest,
};
use crate::service::app::AppState;
use crate::types::Card;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use std::sync::Arc;
use tracing::debug;

type ApiResult<T> = Result<Json<T>, ApiError>;

/// POST /create_lobby
pub async fn create_lobby(State(state): State<Arc<AppState>>) -> ApiResult<CreateLobbyResponse> {
    let lobby_code = state.lobby_manager().create_lobby().await?;
    Ok(Json(CreateLobbyResponse { lobby_code }))
}

/// POST /join_lobby
pub async fn join_lobby(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PlayerRequest>, JsonRejection>,
) -> ApiResult<MessageResponse> {
    let Json(request) = payload?;
    state
        .lobby_manager()
        .join_lobby(&request.lobby_code, &request.player_name)
        .await?;

    Ok(Json(MessageResponse::new(format!(
        "{} joined lobby {}",
        request.player_name, request.lobby_code
    ))))
}

/// POST /start_game
pub async fn start_game(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LobbyRequest>, JsonRejection>,
) -> ApiResult<MessageResponse> {
    let Json(request) = payload?;
    state.lobby_manager().start_game(&request.lobby_code).await?;
    Ok(Json(MessageResponse::new("Game started")))
}

/// GET /get_hand/{player}
pub async fn get_hand(
    State(state): State<Arc<AppState>>,
    Path(player_name): Path<String>,
) -> ApiResult<Vec<Card>> {
    debug!("Hand lookup for '{}'", player_name);
    let hand = state.lobby_manager().get_hand(&player_name).await?;
    Ok(Json(hand))
}

/// GET /get_hand/{lobby_code}/{player}
pub async fn get_hand_in_lobby(
    State(state): State<Arc<AppState>>,
    Path((lobby_code, player_name)): Path<(String, String)>,
) -> ApiResult<Vec<Card>> {
    let hand = state
        .lobby_manager()
        .get_hand_in_lobby(&lobby_code, &player_name)
        .await?;
    Ok(Json(hand))
}

/// POST /draw_card
pub async fn draw_card(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PlayerRequest>, JsonRejection>,
) -> ApiResult<DrawCardResponse> {
    let Json(request) = payload?;
    let card_drawn = state
        .lobby_manager()
        .draw_card(&request.lobby_code, &request.player_name)
        .await?;
    Ok(Json(DrawCardResponse { card_drawn }))
}

/// POST /next_phase
pub async fn next_phase(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LobbyRequest>, JsonRejection>,
) -> ApiResult<NextPhaseResponse> {
    let Json(request) = payload?;
    let update = state
        .lobby_manager()
        .advance_phase(&request.lobby_code)
        .await?;

    Ok(Json(NextPhaseResponse {
        state: update.phase,
        community_cards: update.community_cards,
    }))
}

/// GET /lobby/{code}
pub async fn get_lobby(
    State(state): State<Arc<AppState>>,
    Path(lobby_code): Path<String>,
) -> ApiResult<LobbyView> {
    let snapshot = state.lobby_manager().get_lobby(&lobby_code).await?;
    Ok(Json(LobbyView::from(snapshot)))
}
