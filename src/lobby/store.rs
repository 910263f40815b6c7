//! Concurrency-safe lobby store
//!
//! The store owns every live lobby. The code-to-lobby map sits behind a
//! short-lived `RwLock`. Each lobby carries two locks:
//!
//! - an operation lock (async mutex) that serializes multi-step updates of
//!   one lobby and may be held across deck service calls;
//! - a state lock (`RwLock`) that guards the lobby record itself and is only
//!   ever held for an in-memory read or write.
//!
//! Readers (snapshots, hand lookups, summaries) take only state locks, so a
//! lobby waiting on the deck service never stalls reads of any lobby.

use crate::error::{LobbyError, Result};
use crate::lobby::instance::{Lobby, LobbySnapshot};
use crate::types::{Card, DeckId, LobbyCode, Phase};
use crate::utils::generate_lobby_code;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

/// Default number of codes tried before giving up on lobby creation
pub const DEFAULT_CODE_GENERATION_ATTEMPTS: u32 = 8;

/// Held while a multi-step update of one lobby is in progress
pub type LobbyGuard = OwnedMutexGuard<()>;

#[derive(Clone)]
struct StoredLobby {
    /// Insertion order, used to make cross-lobby lookups deterministic
    sequence: u64,
    operation: Arc<Mutex<()>>,
    state: Arc<RwLock<Lobby>>,
}

/// Aggregate counts across all lobbies
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSummary {
    pub lobbies: usize,
    pub players: usize,
    pub started_games: usize,
    pub finished_games: usize,
}

/// Exclusive owner of the lobby collection
pub struct LobbyStore {
    lobbies: RwLock<HashMap<LobbyCode, StoredLobby>>,
    next_sequence: AtomicU64,
    code_generation_attempts: u32,
    code_generator: fn() -> String,
}

impl LobbyStore {
    /// Create an empty store using random hex codes
    pub fn new() -> Self {
        Self::with_code_generator(DEFAULT_CODE_GENERATION_ATTEMPTS, generate_lobby_code)
    }

    /// Create an empty store with a custom retry budget for code collisions
    pub fn with_attempts(code_generation_attempts: u32) -> Self {
        Self::with_code_generator(code_generation_attempts, generate_lobby_code)
    }

    /// Create an empty store with a custom code generator
    pub fn with_code_generator(code_generation_attempts: u32, code_generator: fn() -> String) -> Self {
        Self {
            lobbies: RwLock::new(HashMap::new()),
            next_sequence: AtomicU64::new(0),
            code_generation_attempts: code_generation_attempts.max(1),
            code_generator,
        }
    }

    /// Insert a fresh lobby for `deck_id` and return its code
    ///
    /// A generated code that is already live is discarded and regenerated, up
    /// to the configured number of attempts.
    pub fn create_lobby(&self, deck_id: DeckId) -> Result<LobbyCode> {
        let mut lobbies = self.write_map()?;

        for attempt in 1..=self.code_generation_attempts {
            let code = (self.code_generator)();
            if lobbies.contains_key(&code) {
                warn!(
                    "Lobby code collision on attempt {}/{}: {}",
                    attempt, self.code_generation_attempts, code
                );
                continue;
            }

            let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
            let lobby = Lobby::new(code.clone(), deck_id);
            lobbies.insert(
                code.clone(),
                StoredLobby {
                    sequence,
                    operation: Arc::new(Mutex::new(())),
                    state: Arc::new(RwLock::new(lobby)),
                },
            );

            info!("Created lobby {} (total lobbies: {})", code, lobbies.len());
            return Ok(code);
        }

        Err(LobbyError::InternalError {
            message: format!(
                "Could not generate a unique lobby code after {} attempts",
                self.code_generation_attempts
            ),
        }
        .into())
    }

    /// Read a consistent snapshot of one lobby
    pub fn get(&self, code: &str) -> Result<LobbySnapshot> {
        self.read_lobby(code, Lobby::snapshot)
    }

    pub fn contains(&self, code: &str) -> Result<bool> {
        Ok(self.read_map()?.contains_key(code))
    }

    /// Take the operation lock of one lobby for a multi-step update
    ///
    /// The guard may be held across deck service calls. It excludes other
    /// operations on this lobby only; reads are never blocked by it.
    pub async fn lock(&self, code: &str) -> Result<LobbyGuard> {
        let operation = self.entry(code)?.operation;
        Ok(operation.lock_owned().await)
    }

    /// Run `f` against the current state of one lobby
    pub fn read_lobby<T, F>(&self, code: &str, f: F) -> Result<T>
    where
        F: FnOnce(&Lobby) -> T,
    {
        let state = self.entry(code)?.state;
        let lobby = read_state(&state)?;
        Ok(f(&lobby))
    }

    /// Apply `f` to one lobby as a single atomic write
    pub fn update_lobby<T, F>(&self, code: &str, f: F) -> Result<T>
    where
        F: FnOnce(&mut Lobby) -> Result<T>,
    {
        let state = self.entry(code)?.state;
        let mut lobby = write_state(&state)?;
        f(&mut lobby)
    }

    /// Seat a player, waiting for any in-flight operation on the lobby
    pub async fn add_player(&self, code: &str, player_name: &str) -> Result<()> {
        let _guard = self.lock(code).await?;
        self.update_lobby(code, |lobby| lobby.add_player(player_name))
    }

    pub fn set_hand(&self, code: &str, player_name: &str, cards: Vec<Card>) -> Result<()> {
        self.update_lobby(code, |lobby| lobby.set_hand(player_name, cards))
    }

    pub fn append_to_hand(&self, code: &str, player_name: &str, cards: Vec<Card>) -> Result<()> {
        self.update_lobby(code, |lobby| lobby.append_to_hand(player_name, cards))
    }

    pub fn set_started(&self, code: &str) -> Result<()> {
        self.update_lobby(code, |lobby| {
            lobby.mark_started();
            Ok(())
        })
    }

    /// Append community cards and advance the phase in one step
    pub fn advance_phase(&self, code: &str, cards: Vec<Card>) -> Result<Phase> {
        self.update_lobby(code, |lobby| lobby.advance_phase(cards))
    }

    /// Find a player's hand in any lobby, oldest lobby first
    pub fn find_hand(&self, player_name: &str) -> Result<Vec<Card>> {
        for (code, stored) in self.ordered_entries()? {
            let lobby = read_state(&stored.state)?;
            if let Some(hand) = lobby.hand(player_name) {
                debug!("Found hand for '{}' in lobby {}", player_name, code);
                return Ok(hand.to_vec());
            }
        }

        Err(LobbyError::PlayerNotFound {
            player_name: player_name.to_string(),
        }
        .into())
    }

    /// Number of live lobbies
    pub fn len(&self) -> Result<usize> {
        Ok(self.read_map()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Live lobby codes, oldest first
    pub fn codes(&self) -> Result<Vec<LobbyCode>> {
        Ok(self
            .ordered_entries()?
            .into_iter()
            .map(|(code, _)| code)
            .collect())
    }

    /// Count lobbies and players across the store
    pub fn summary(&self) -> Result<StoreSummary> {
        let mut summary = StoreSummary::default();

        for (_, stored) in self.ordered_entries()? {
            let lobby = read_state(&stored.state)?;
            summary.lobbies += 1;
            summary.players += lobby.players().len();
            if lobby.started() {
                summary.started_games += 1;
            }
            if lobby.phase().is_terminal() {
                summary.finished_games += 1;
            }
        }

        Ok(summary)
    }

    fn entry(&self, code: &str) -> Result<StoredLobby> {
        self.read_map()?.get(code).cloned().ok_or_else(|| {
            LobbyError::LobbyNotFound {
                lobby_code: code.to_string(),
            }
            .into()
        })
    }

    fn ordered_entries(&self) -> Result<Vec<(LobbyCode, StoredLobby)>> {
        let lobbies = self.read_map()?;
        let mut entries: Vec<_> = lobbies
            .iter()
            .map(|(code, stored)| (code.clone(), stored.clone()))
            .collect();
        drop(lobbies);

        entries.sort_by_key(|(_, stored)| stored.sequence);
        Ok(entries)
    }

    fn read_map(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<LobbyCode, StoredLobby>>> {
        self.lobbies.read().map_err(|_| {
            LobbyError::InternalError {
                message: "Failed to acquire lobbies lock".to_string(),
            }
            .into()
        })
    }

    fn write_map(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<LobbyCode, StoredLobby>>> {
        self.lobbies.write().map_err(|_| {
            LobbyError::InternalError {
                message: "Failed to acquire lobbies lock".to_string(),
            }
            .into()
        })
    }
}

fn read_state(state: &RwLock<Lobby>) -> Result<std::sync::RwLockReadGuard<'_, Lobby>> {
    state.read().map_err(|_| {
        LobbyError::InternalError {
            message: "Failed to acquire lobby state lock".to_string(),
        }
        .into()
    })
}

fn write_state(state: &RwLock<Lobby>) -> Result<std::sync::RwLockWriteGuard<'_, Lobby>> {
    state.write().map_err(|_| {
        LobbyError::InternalError {
            message: "Failed to acquire lobby state lock".to_string(),
        }
        .into()
    })
}

impl Default for LobbyStore {
    fn default() -> Self {
        Self::new()
    }
}
