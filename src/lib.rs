//! Card Lobby - HTTP coordinator for multiplayer card-game lobbies
//!
//! This crate creates lobbies backed by a remote shuffled-deck service,
//! admits players, deals hands and walks each lobby through the community
//! card phases of a hold'em style game.

pub mod api;
pub mod config;
pub mod deck;
pub mod error;
pub mod lobby;
pub mod metrics;
pub mod service;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{LobbyError, Result};
pub use types::*;

// Re-export key components
pub use deck::{DeckClient, HttpDeckClient, InMemoryDeckClient};
pub use lobby::{LobbyManager, LobbyStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
