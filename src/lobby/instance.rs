//! Lobby entity and its in-place transitions
//!
//! This module contains the per-lobby game state: membership, hands,
//! community cards and the betting-round phase. Everything here is pure; the
//! store provides locking and the manager provides cards.

use crate::error::{LobbyError, Result};
use crate::types::{Card, DeckId, LobbyCode, Phase, PlayerName};
use crate::utils::current_timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One game session
#[derive(Debug, Clone)]
pub struct Lobby {
    code: LobbyCode,
    deck_id: DeckId,
    players: Vec<PlayerName>,
    hands: HashMap<PlayerName, Vec<Card>>,
    started: bool,
    phase: Phase,
    community_cards: Vec<Card>,
    current_player_index: usize,
    created_at: DateTime<Utc>,
}

/// Serializable view of a lobby at one instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LobbySnapshot {
    pub lobby_code: LobbyCode,
    pub deck_id: DeckId,
    pub players: Vec<PlayerName>,
    pub hands: HashMap<PlayerName, Vec<Card>>,
    pub started: bool,
    pub phase: Phase,
    pub community_cards: Vec<Card>,
    pub current_player_index: usize,
    pub created_at: DateTime<Utc>,
}

impl Lobby {
    /// Create an empty lobby in the preflop phase
    pub fn new(code: LobbyCode, deck_id: DeckId) -> Self {
        Self {
            code,
            deck_id,
            players: Vec::new(),
            hands: HashMap::new(),
            started: false,
            phase: Phase::Preflop,
            community_cards: Vec::new(),
            current_player_index: 0,
            created_at: current_timestamp(),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn deck_id(&self) -> &str {
        &self.deck_id
    }

    pub fn players(&self) -> &[PlayerName] {
        &self.players
    }

    pub fn started(&self) -> bool {
        self.started
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn community_cards(&self) -> &[Card] {
        &self.community_cards
    }

    pub fn current_player_index(&self) -> usize {
        self.current_player_index
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn has_player(&self, player_name: &str) -> bool {
        self.hands.contains_key(player_name)
    }

    /// Cards held by a player, if they joined this lobby
    pub fn hand(&self, player_name: &str) -> Option<&[Card]> {
        self.hands.get(player_name).map(Vec::as_slice)
    }

    /// Admit a player with an empty hand
    ///
    /// Names are compared by exact match; no trimming or case folding.
    pub fn add_player(&mut self, player_name: &str) -> Result<()> {
        if self.has_player(player_name) {
            return Err(LobbyError::AlreadyJoined {
                player_name: player_name.to_string(),
            }
            .into());
        }

        self.players.push(player_name.to_string());
        self.hands.insert(player_name.to_string(), Vec::new());
        Ok(())
    }

    /// Replace a player's whole hand
    pub fn set_hand(&mut self, player_name: &str, cards: Vec<Card>) -> Result<()> {
        let hand = self.hand_mut(player_name)?;
        *hand = cards;
        Ok(())
    }

    /// Add cards to the end of a player's hand
    pub fn append_to_hand(&mut self, player_name: &str, cards: Vec<Card>) -> Result<()> {
        self.hand_mut(player_name)?.extend(cards);
        Ok(())
    }

    /// Mark the game as started; never reset
    pub fn mark_started(&mut self) {
        self.started = true;
    }

    /// Reveal community cards and move to the next phase
    ///
    /// `cards` must be exactly the number the transition table asks for from
    /// the current phase. Advancing from showdown is a no-op.
    pub fn advance_phase(&mut self, cards: Vec<Card>) -> Result<Phase> {
        let (next, expected) = self.phase.transition();
        if cards.len() != expected {
            return Err(LobbyError::InternalError {
                message: format!(
                    "Transition {} -> {} needs {} cards, got {}",
                    self.phase,
                    next,
                    expected,
                    cards.len()
                ),
            }
            .into());
        }

        self.community_cards.extend(cards);
        self.phase = next;
        Ok(next)
    }

    /// Number of community cards the next transition will draw
    pub fn pending_draw_count(&self) -> usize {
        self.phase.transition().1
    }

    pub fn snapshot(&self) -> LobbySnapshot {
        LobbySnapshot {
            lobby_code: self.code.clone(),
            deck_id: self.deck_id.clone(),
            players: self.players.clone(),
            hands: self.hands.clone(),
            started: self.started,
            phase: self.phase,
            community_cards: self.community_cards.clone(),
            current_player_index: self.current_player_index,
            created_at: self.created_at,
        }
    }

    fn hand_mut(&mut self, player_name: &str) -> Result<&mut Vec<Card>> {
        self.hands.get_mut(player_name).ok_or_else(|| {
            LobbyError::PlayerNotFound {
                player_name: player_name.to_string(),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cards(n: usize) -> Vec<Card> {
        (0..n)
            .map(|i| Card::new(format!("{}H", i + 2), (i + 2).to_string(), "HEARTS"))
            .collect()
    }

    #[test]
    fn test_new_lobby_is_empty() {
        let lobby = Lobby::new("abc123".to_string(), "deck-1".to_string());
        assert_eq!(lobby.code(), "abc123");
        assert_eq!(lobby.deck_id(), "deck-1");
        assert!(lobby.players().is_empty());
        assert!(!lobby.started());
        assert_eq!(lobby.phase(), Phase::Preflop);
        assert!(lobby.community_cards().is_empty());
        assert_eq!(lobby.current_player_index(), 0);
    }

    #[test]
    fn test_add_player_rejects_exact_duplicates_only() {
        let mut lobby = Lobby::new("abc123".to_string(), "deck-1".to_string());
        lobby.add_player("Alice").unwrap();
        lobby.add_player("alice").unwrap();
        lobby.add_player("Alice ").unwrap();

        let err = lobby.add_player("Alice").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LobbyError>(),
            Some(LobbyError::AlreadyJoined { .. })
        ));
        assert_eq!(lobby.players().len(), 3);
        assert_eq!(lobby.hand("Alice"), Some(&[][..]));
    }

    #[test]
    fn test_hand_updates_require_membership() {
        let mut lobby = Lobby::new("abc123".to_string(), "deck-1".to_string());
        let err = lobby.append_to_hand("Ghost", cards(1)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LobbyError>(),
            Some(LobbyError::PlayerNotFound { .. })
        ));
        assert!(lobby.hand("Ghost").is_none());

        lobby.add_player("Bob").unwrap();
        lobby.set_hand("Bob", cards(2)).unwrap();
        lobby.set_hand("Bob", cards(2)).unwrap();
        assert_eq!(lobby.hand("Bob").unwrap().len(), 2);

        lobby.append_to_hand("Bob", cards(1)).unwrap();
        assert_eq!(lobby.hand("Bob").unwrap().len(), 3);
    }

    #[test]
    fn test_phase_progression() {
        let mut lobby = Lobby::new("abc123".to_string(), "deck-1".to_string());
        let expected = [
            (Phase::Flop, 3),
            (Phase::Turn, 4),
            (Phase::River, 5),
            (Phase::Showdown, 5),
            (Phase::Showdown, 5),
        ];

        for (phase, total) in expected {
            let draw = lobby.pending_draw_count();
            assert_eq!(lobby.advance_phase(cards(draw)).unwrap(), phase);
            assert_eq!(lobby.community_cards().len(), total);
        }
    }

    #[test]
    fn test_advance_rejects_wrong_card_count() {
        let mut lobby = Lobby::new("abc123".to_string(), "deck-1".to_string());
        assert!(lobby.advance_phase(cards(1)).is_err());
        assert_eq!(lobby.phase(), Phase::Preflop);
        assert!(lobby.community_cards().is_empty());
    }

    #[test]
    fn test_snapshot_reflects_state() {
        let mut lobby = Lobby::new("abc123".to_string(), "deck-1".to_string());
        lobby.add_player("Alice").unwrap();
        lobby.mark_started();

        let snapshot = lobby.snapshot();
        assert_eq!(snapshot.lobby_code, "abc123");
        assert_eq!(snapshot.players, vec!["Alice".to_string()]);
        assert!(snapshot.started);
        assert_eq!(snapshot.phase, Phase::Preflop);
    }
}
