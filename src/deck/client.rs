//! Deck service capability and an in-memory implementation

use crate::error::{LobbyError, Result};
use crate::types::{Card, DeckId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[cfg(test)]
use mockall::automock;

/// Access to an external shuffled-deck service
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DeckClient: Send + Sync {
    /// Ask the service for a freshly shuffled deck
    async fn new_shuffled_deck(&self) -> Result<DeckId>;

    /// Draw `count` cards (at least one) from an existing deck
    async fn draw(&self, deck_id: &str, count: usize) -> Result<Vec<Card>>;
}

const SUITS: [(&str, char); 4] = [
    ("SPADES", 'S'),
    ("HEARTS", 'H'),
    ("DIAMONDS", 'D'),
    ("CLUBS", 'C'),
];

const VALUES: [(&str, &str); 13] = [
    ("ACE", "A"),
    ("2", "2"),
    ("3", "3"),
    ("4", "4"),
    ("5", "5"),
    ("6", "6"),
    ("7", "7"),
    ("8", "8"),
    ("9", "9"),
    ("10", "0"),
    ("JACK", "J"),
    ("QUEEN", "Q"),
    ("KING", "K"),
];

/// A standard 52-card deck in a fixed order, using the deck service's
/// card codes (`"0S"` is the ten of spades).
pub fn standard_deck() -> Vec<Card> {
    SUITS
        .iter()
        .flat_map(|(suit, suit_code)| {
            VALUES.iter().map(move |(value, value_code)| {
                Card::new(format!("{}{}", value_code, suit_code), *value, *suit)
            })
        })
        .collect()
}

/// Deterministic, unshuffled in-process deck service
///
/// Used for tests, benchmarks and offline runs. Every deck starts as
/// [`standard_deck`] and is drawn from the top. Failures and latency can be
/// injected.
#[derive(Debug, Default)]
pub struct InMemoryDeckClient {
    decks: Mutex<HashMap<DeckId, Vec<Card>>>,
    decks_created: AtomicUsize,
    draw_calls: AtomicUsize,
    /// Draw calls that succeed before every later draw fails
    fail_draws_after: Option<usize>,
    fail_new_deck: bool,
    latency: Option<Duration>,
}

impl InMemoryDeckClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Let `successful_draws` draw calls through, then fail the rest
    pub fn failing_draws_after(mut self, successful_draws: usize) -> Self {
        self.fail_draws_after = Some(successful_draws);
        self
    }

    /// Fail every deck creation request
    pub fn failing_new_deck(mut self) -> Self {
        self.fail_new_deck = true;
        self
    }

    /// Sleep this long inside every call
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of `draw` calls seen so far, including failed ones
    pub fn draw_calls(&self) -> usize {
        self.draw_calls.load(Ordering::SeqCst)
    }

    pub fn decks_created(&self) -> usize {
        self.decks_created.load(Ordering::SeqCst)
    }

    /// Cards left in a deck
    pub fn remaining(&self, deck_id: &str) -> Option<usize> {
        self.decks
            .lock()
            .ok()
            .and_then(|decks| decks.get(deck_id).map(Vec::len))
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl DeckClient for InMemoryDeckClient {
    async fn new_shuffled_deck(&self) -> Result<DeckId> {
        self.simulate_latency().await;

        if self.fail_new_deck {
            return Err(LobbyError::external("deck creation unavailable").into());
        }

        let index = self.decks_created.fetch_add(1, Ordering::SeqCst);
        let deck_id = format!("deck-{}", index + 1);

        let mut decks = self.decks.lock().map_err(|_| LobbyError::InternalError {
            message: "Failed to acquire decks lock".to_string(),
        })?;
        let mut cards = standard_deck();
        // Draw from the end of the vector, so keep the top card last
        cards.reverse();
        decks.insert(deck_id.clone(), cards);

        Ok(deck_id)
    }

    async fn draw(&self, deck_id: &str, count: usize) -> Result<Vec<Card>> {
        self.simulate_latency().await;

        let call = self.draw_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(limit) = self.fail_draws_after {
            if call >= limit {
                return Err(LobbyError::external(format!(
                    "injected failure on draw call {}",
                    call + 1
                ))
                .into());
            }
        }

        if count == 0 {
            return Err(LobbyError::InvalidRequest {
                reason: "draw count must be at least 1".to_string(),
            }
            .into());
        }

        let mut decks = self.decks.lock().map_err(|_| LobbyError::InternalError {
            message: "Failed to acquire decks lock".to_string(),
        })?;
        let deck = decks
            .get_mut(deck_id)
            .ok_or_else(|| LobbyError::external(format!("unknown deck {}", deck_id)))?;

        if deck.len() < count {
            return Err(LobbyError::external(format!(
                "not enough cards remaining to draw {} (remaining: {})",
                count,
                deck.len()
            ))
            .into());
        }

        let drawn = (0..count).filter_map(|_| deck.pop()).collect();
        Ok(drawn)
    }
}
