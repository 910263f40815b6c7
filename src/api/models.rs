//! Request and response bodies for the lobby API

use crate::lobby::LobbySnapshot;
use crate::types::{Card, LobbyCode, Phase, PlayerName};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateLobbyResponse {
    pub lobby_code: LobbyCode,
}

/// Body for endpoints that act on a seated player
///
/// Older clients send the name as `player`; both keys are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRequest {
    pub lobby_code: LobbyCode,
    #[serde(alias = "player")]
    pub player_name: PlayerName,
}

/// Body for endpoints that act on a whole lobby
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LobbyRequest {
    pub lobby_code: LobbyCode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawCardResponse {
    pub card_drawn: Card,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextPhaseResponse {
    pub state: Phase,
    pub community_cards: Vec<Card>,
}

/// Public view of a lobby; hands are reported by size only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LobbyView {
    pub lobby_code: LobbyCode,
    pub players: Vec<PlayerName>,
    pub started: bool,
    pub phase: Phase,
    pub community_cards: Vec<Card>,
    pub current_player_index: usize,
    pub hand_sizes: BTreeMap<PlayerName, usize>,
    pub created_at: DateTime<Utc>,
}

impl From<LobbySnapshot> for LobbyView {
    fn from(snapshot: LobbySnapshot) -> Self {
        let hand_sizes = snapshot
            .hands
            .iter()
            .map(|(player, hand)| (player.clone(), hand.len()))
            .collect();

        Self {
            lobby_code: snapshot.lobby_code,
            players: snapshot.players,
            started: snapshot.started,
            phase: snapshot.phase,
            community_cards: snapshot.community_cards,
            current_player_index: snapshot.current_player_index,
            hand_sizes,
            created_at: snapshot.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
