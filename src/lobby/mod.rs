//! Lobby management for the card-lobby service
//!
//! This module holds the lobby record, the concurrent lobby store and the
//! manager that drives each game from creation to showdown.

pub mod instance;
pub mod manager;
pub mod store;

// Re-export commonly used types
pub use instance::{Lobby, LobbySnapshot};
pub use manager::{LobbyManager, LobbyManagerStats, PhaseUpdate, HAND_SIZE};
pub use store::{LobbyGuard, LobbyStore, StoreSummary};
