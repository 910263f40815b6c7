//! Common types used throughout the lobby service

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Short hex identifier for a lobby
pub type LobbyCode = String;

/// Player identifier, compared by exact match
pub type PlayerName = String;

/// Handle for a shuffled deck held by the deck service
pub type DeckId = String;

/// A card as returned by the deck service
///
/// The service never inspects cards beyond storing and forwarding them.
/// Fields other than `code`, `value` and `suit` (images and the like) are kept
/// in `extra` so they survive serialization unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub code: String,
    pub value: String,
    pub suit: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Card {
    /// Create a card with no extra fields
    pub fn new(code: impl Into<String>, value: impl Into<String>, suit: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            value: value.into(),
            suit: suit.into(),
            extra: Map::new(),
        }
    }
}

/// Betting round of a lobby
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Preflop,
    Flop,
    Turn,
    River,
    Showdown,
}

impl Phase {
    /// All phases in play order
    pub const ALL: [Phase; 5] = [
        Phase::Preflop,
        Phase::Flop,
        Phase::Turn,
        Phase::River,
        Phase::Showdown,
    ];

    /// The phase that follows this one and the number of community cards
    /// revealed on the way there. Showdown maps to itself with no draw.
    pub fn transition(self) -> (Phase, usize) {
        match self {
            Phase::Preflop => (Phase::Flop, 3),
            Phase::Flop => (Phase::Turn, 1),
            Phase::Turn => (Phase::River, 1),
            Phase::River => (Phase::Showdown, 0),
            Phase::Showdown => (Phase::Showdown, 0),
        }
    }

    /// Number of community cards on the table while in this phase
    pub fn community_card_count(self) -> usize {
        match self {
            Phase::Preflop => 0,
            Phase::Flop => 3,
            Phase::Turn => 4,
            Phase::River | Phase::Showdown => 5,
        }
    }

    /// Whether no further transitions are possible
    pub fn is_terminal(self) -> bool {
        self == Phase::Showdown
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Preflop => "preflop",
            Phase::Flop => "flop",
            Phase::Turn => "turn",
            Phase::River => "river",
            Phase::Showdown => "showdown",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why cards were pulled from a deck, used for logging and metrics labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawPurpose {
    Deal,
    PlayerDraw,
    Community,
}

impl DrawPurpose {
    pub fn as_str(self) -> &'static str {
        match self {
            DrawPurpose::Deal => "deal",
            DrawPurpose::PlayerDraw => "player_draw",
            DrawPurpose::Community => "community",
        }
    }
}
