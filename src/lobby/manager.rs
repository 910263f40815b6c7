//! Lobby manager implementation: the game-progression state machine
//!
//! This module provides the LobbyManager that drives lobby creation, player
//! admission, dealing, single-card draws and phase advancement. Cards come
//! from the injected `DeckClient`; state lives in the `LobbyStore`.

use crate::config::LobbySettings;
use crate::deck::DeckClient;
use crate::error::{LobbyError, Result};
use crate::lobby::instance::LobbySnapshot;
use crate::lobby::store::LobbyStore;
use crate::metrics::MetricsCollector;
use crate::types::{Card, DrawPurpose, LobbyCode, Phase};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Cards dealt to each player when a game starts
pub const HAND_SIZE: usize = 2;

/// Deck call timeout used when none is configured
pub const DEFAULT_DECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Statistics about lobby manager operations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LobbyManagerStats {
    /// Total number of lobbies created
    pub lobbies_created: u64,
    /// Total number of successful joins
    pub players_joined: u64,
    /// Total number of games started, re-deals included
    pub games_started: u64,
    /// Total number of phase changes (showdown no-ops excluded)
    pub phase_transitions: u64,
    /// Total number of cards drawn from deck services
    pub cards_drawn: u64,
    /// Total number of failed deck service calls
    pub deck_failures: u64,
    /// Current number of live lobbies
    pub active_lobbies: usize,
    /// Current number of players seated across all lobbies
    pub seated_players: usize,
}

/// Result of a phase advance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseUpdate {
    pub phase: Phase,
    pub community_cards: Vec<Card>,
}

/// The lobby state machine
#[derive(Clone)]
pub struct LobbyManager {
    /// Live lobbies
    store: Arc<LobbyStore>,
    /// Source of shuffled decks and cards
    deck_client: Arc<dyn DeckClient>,
    /// Lobby behaviour settings
    settings: LobbySettings,
    /// Upper bound on each deck service call
    deck_timeout: Duration,
    /// Manager statistics
    stats: Arc<RwLock<LobbyManagerStats>>,
    /// Metrics collector for recording performance data
    metrics_collector: Arc<MetricsCollector>,
}

impl LobbyManager {
    /// Create a new lobby manager with default settings
    pub fn new(deck_client: Arc<dyn DeckClient>) -> Result<Self> {
        Self::with_settings(deck_client, LobbySettings::default(), DEFAULT_DECK_TIMEOUT)
    }

    /// Create a new lobby manager with explicit settings and its own metrics
    pub fn with_settings(
        deck_client: Arc<dyn DeckClient>,
        settings: LobbySettings,
        deck_timeout: Duration,
    ) -> Result<Self> {
        let metrics_collector = Arc::new(MetricsCollector::new()?);
        Ok(Self::with_metrics(
            deck_client,
            settings,
            deck_timeout,
            metrics_collector,
        ))
    }

    /// Create a new lobby manager with metrics collector
    pub fn with_metrics(
        deck_client: Arc<dyn DeckClient>,
        settings: LobbySettings,
        deck_timeout: Duration,
        metrics_collector: Arc<MetricsCollector>,
    ) -> Self {
        let store = Arc::new(LobbyStore::with_attempts(settings.code_generation_attempts));

        Self {
            store,
            deck_client,
            settings,
            deck_timeout,
            stats: Arc::new(RwLock::new(LobbyManagerStats::default())),
            metrics_collector,
        }
    }

    /// Get the underlying store
    pub fn store(&self) -> Arc<LobbyStore> {
        self.store.clone()
    }

    pub fn settings(&self) -> &LobbySettings {
        &self.settings
    }

    /// Shuffle a new deck and open a lobby around it
    pub async fn create_lobby(&self) -> Result<LobbyCode> {
        let start_time = Instant::now();

        let deck_id = self
            .call_deck("new_deck", self.deck_client.new_shuffled_deck())
            .await
            .map_err(|e| {
                error!("Lobby creation aborted, no deck available: {}", e);
                e
            })?;

        let code = self.store.create_lobby(deck_id.clone())?;

        self.update_stats(|stats| stats.lobbies_created += 1);
        self.metrics_collector.record_lobby_created();
        self.metrics_collector
            .record_lobby_operation("create_lobby", start_time.elapsed());

        info!("Created lobby {} with deck {}", code, deck_id);
        Ok(code)
    }

    /// Admit a player into a lobby
    pub async fn join_lobby(&self, code: &str, player_name: &str) -> Result<()> {
        let start_time = Instant::now();

        if let Err(e) = self.store.add_player(code, player_name).await {
            self.record_rejection(&e);
            debug!(
                "Join rejected - lobby: {}, player: '{}', reason: {}",
                code, player_name, e
            );
            return Err(e);
        }

        self.update_stats(|stats| stats.players_joined += 1);
        self.metrics_collector.record_player_joined();
        self.metrics_collector
            .record_lobby_operation("join_lobby", start_time.elapsed());

        info!("Player '{}' joined lobby {}", player_name, code);
        Ok(())
    }

    /// Start the game and deal every player a fresh hand
    ///
    /// Each player's hand is a separate deck call. If one fails, players
    /// dealt before it keep their new cards and the error is returned; there
    /// is no rollback.
    pub async fn start_game(&self, code: &str) -> Result<()> {
        let start_time = Instant::now();

        let _guard = self.store.lock(code).await.map_err(|e| {
            self.record_rejection(&e);
            e
        })?;

        let (started, deck_id, players) = self.store.read_lobby(code, |lobby| {
            (
                lobby.started(),
                lobby.deck_id().to_string(),
                lobby.players().to_vec(),
            )
        })?;

        if started && !self.settings.allow_redeal {
            let err: anyhow::Error = LobbyError::GameAlreadyStarted {
                lobby_code: code.to_string(),
            }
            .into();
            self.record_rejection(&err);
            return Err(err);
        }

        if started {
            warn!("Lobby {} already started, dealing fresh hands", code);
        }

        self.store.set_started(code)?;

        info!(
            "Starting game in lobby {} - players: {}, deck: {}",
            code,
            players.len(),
            deck_id
        );

        for (dealt, player_name) in players.iter().enumerate() {
            let cards = match self.draw_cards(&deck_id, HAND_SIZE, DrawPurpose::Deal).await {
                Ok(cards) => cards,
                Err(e) => {
                    error!(
                        "Dealing aborted in lobby {} after {}/{} players: {}",
                        code,
                        dealt,
                        players.len(),
                        e
                    );
                    return Err(e);
                }
            };
            self.store.set_hand(code, player_name, cards)?;
            debug!("Dealt {} cards to '{}' in lobby {}", HAND_SIZE, player_name, code);
        }

        self.update_stats(|stats| stats.games_started += 1);
        self.metrics_collector.record_game_started();
        self.metrics_collector
            .record_lobby_operation("start_game", start_time.elapsed());

        info!("Game started in lobby {}", code);
        Ok(())
    }

    /// Look up a player's hand in any lobby
    ///
    /// The same name may be seated in several lobbies; the oldest lobby wins.
    /// Use [`LobbyManager::get_hand_in_lobby`] for an unambiguous lookup.
    pub async fn get_hand(&self, player_name: &str) -> Result<Vec<Card>> {
        self.store.find_hand(player_name).map_err(|e| {
            self.record_rejection(&e);
            e
        })
    }

    /// Look up a player's hand within one lobby
    pub async fn get_hand_in_lobby(&self, code: &str, player_name: &str) -> Result<Vec<Card>> {
        let result = self
            .store
            .read_lobby(code, |lobby| lobby.hand(player_name).map(<[Card]>::to_vec))
            .and_then(|hand| {
                hand.ok_or_else(|| {
                    LobbyError::PlayerNotFound {
                        player_name: player_name.to_string(),
                    }
                    .into()
                })
            });

        if let Err(e) = &result {
            self.record_rejection(e);
        }
        result
    }

    /// Draw one card into a seated player's hand and return it
    pub async fn draw_card(&self, code: &str, player_name: &str) -> Result<Card> {
        let start_time = Instant::now();

        let _guard = self.store.lock(code).await.map_err(|e| {
            self.record_rejection(&e);
            e
        })?;

        let (seated, deck_id) = self.store.read_lobby(code, |lobby| {
            (lobby.has_player(player_name), lobby.deck_id().to_string())
        })?;

        if !seated {
            let err: anyhow::Error = LobbyError::PlayerNotFound {
                player_name: player_name.to_string(),
            }
            .into();
            self.record_rejection(&err);
            return Err(err);
        }

        let card = self
            .draw_cards(&deck_id, 1, DrawPurpose::PlayerDraw)
            .await?
            .pop()
            .ok_or_else(|| LobbyError::external("deck service returned no card"))?;

        self.store
            .append_to_hand(code, player_name, vec![card.clone()])?;

        self.metrics_collector
            .record_lobby_operation("draw_card", start_time.elapsed());

        info!(
            "Player '{}' drew {} in lobby {}",
            player_name, card.code, code
        );
        Ok(card)
    }

    /// Reveal community cards and move the lobby to its next phase
    ///
    /// The lobby's operation lock is held from the draw until the phase is
    /// written, so concurrent calls each advance exactly one step. Showdown is terminal
    /// and further calls return the unchanged state.
    pub async fn advance_phase(&self, code: &str) -> Result<PhaseUpdate> {
        let start_time = Instant::now();

        let _guard = self.store.lock(code).await.map_err(|e| {
            self.record_rejection(&e);
            e
        })?;

        let (from, count, deck_id) = self.store.read_lobby(code, |lobby| {
            (
                lobby.phase(),
                lobby.pending_draw_count(),
                lobby.deck_id().to_string(),
            )
        })?;
        let cards = if count > 0 {
            self.draw_cards(&deck_id, count, DrawPurpose::Community)
                .await?
        } else {
            Vec::new()
        };

        let phase = self.store.advance_phase(code, cards)?;
        let community_cards = self
            .store
            .read_lobby(code, |lobby| lobby.community_cards().to_vec())?;

        if phase != from {
            self.update_stats(|stats| stats.phase_transitions += 1);
            self.metrics_collector.record_phase_transition(phase);
            info!(
                "Lobby {} advanced {} -> {} ({} community cards)",
                code,
                from,
                phase,
                community_cards.len()
            );
        } else {
            debug!("Lobby {} already at {}, nothing to advance", code, phase);
        }

        self.metrics_collector
            .record_lobby_operation("advance_phase", start_time.elapsed());

        Ok(PhaseUpdate {
            phase,
            community_cards,
        })
    }

    /// Snapshot of one lobby
    pub async fn get_lobby(&self, code: &str) -> Result<LobbySnapshot> {
        self.store.get(code)
    }

    /// Current statistics, with live counts taken from the store
    pub async fn get_stats(&self) -> Result<LobbyManagerStats> {
        let timer = self.metrics_collector.start_timer();
        let summary = self.store.summary()?;
        self.metrics_collector
            .performance()
            .store_scan_duration
            .observe(timer.stop().as_secs_f64());

        let mut stats = self
            .stats
            .read()
            .map_err(|_| LobbyError::InternalError {
                message: "Failed to acquire stats lock".to_string(),
            })?
            .clone();
        stats.active_lobbies = summary.lobbies;
        stats.seated_players = summary.players;
        Ok(stats)
    }

    /// Draw cards and record what they were for
    async fn draw_cards(
        &self,
        deck_id: &str,
        count: usize,
        purpose: DrawPurpose,
    ) -> Result<Vec<Card>> {
        let cards = self
            .call_deck("draw", self.deck_client.draw(deck_id, count))
            .await?;

        if cards.len() != count {
            self.update_stats(|stats| stats.deck_failures += 1);
            return Err(LobbyError::external(format!(
                "asked for {} cards from deck {}, received {}",
                count,
                deck_id,
                cards.len()
            ))
            .into());
        }

        self.update_stats(|stats| stats.cards_drawn += cards.len() as u64);
        self.metrics_collector
            .record_cards_drawn(purpose, cards.len());
        debug!(
            "Drew {} cards from deck {} for {}",
            cards.len(),
            deck_id,
            purpose.as_str()
        );
        Ok(cards)
    }

    /// Run one deck service call under the configured timeout
    ///
    /// Every failure, including a timeout or an error the client did not
    /// classify, comes back as `LobbyError::ExternalService`.
    async fn call_deck<T, F>(&self, operation: &str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let start_time = Instant::now();

        let result = match tokio::time::timeout(self.deck_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => match LobbyError::from_anyhow(&e) {
                Some(LobbyError::ExternalService { .. }) => Err(e),
                _ => Err(LobbyError::external(e.to_string()).into()),
            },
            Err(_) => Err(LobbyError::external(format!(
                "{} timed out after {}ms",
                operation,
                self.deck_timeout.as_millis()
            ))
            .into()),
        };

        let elapsed = start_time.elapsed();
        self.metrics_collector
            .record_deck_request(operation, result.is_ok(), elapsed);

        if let Err(e) = &result {
            self.update_stats(|stats| stats.deck_failures += 1);
            warn!(
                "Deck service {} failed after {:.2}ms: {}",
                operation,
                elapsed.as_secs_f64() * 1000.0,
                e
            );
        }

        result
    }

    fn record_rejection(&self, error: &anyhow::Error) {
        let reason = match LobbyError::from_anyhow(error) {
            Some(LobbyError::LobbyNotFound { .. }) => "lobby_not_found",
            Some(LobbyError::PlayerNotFound { .. }) => "player_not_found",
            Some(LobbyError::AlreadyJoined { .. }) => "already_joined",
            Some(LobbyError::GameAlreadyStarted { .. }) => "already_started",
            _ => return,
        };
        self.metrics_collector.record_rejection(reason);
    }

    fn update_stats(&self, update: impl FnOnce(&mut LobbyManagerStats)) {
        match self.stats.write() {
            Ok(mut stats) => update(&mut stats),
            Err(_) => warn!("Failed to acquire stats lock, dropping stats update"),
        }
    }
}
