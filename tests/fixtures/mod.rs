//! Test fixtures and deck clients for integration testing

#![allow(dead_code)]

use async_trait::async_trait;
use card_lobby::config::AppConfig;
use card_lobby::deck::{DeckClient, InMemoryDeckClient};
use card_lobby::error::Result;
use card_lobby::lobby::LobbyManager;
use card_lobby::service::AppState;
use card_lobby::types::{Card, DeckId};
use std::sync::{Arc, Mutex};

/// A deck service call seen by [`RecordingDeckClient`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeckCall {
    NewDeck,
    Draw { deck_id: DeckId, count: usize },
}

/// In-memory deck client that records every call it receives
#[derive(Debug, Default)]
pub struct RecordingDeckClient {
    inner: InMemoryDeckClient,
    calls: Mutex<Vec<DeckCall>>,
}

impl RecordingDeckClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wrapping(inner: InMemoryDeckClient) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// All calls so far, oldest first
    pub fn calls(&self) -> Vec<DeckCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Draw sizes requested so far, oldest first
    pub fn draw_sizes(&self) -> Vec<usize> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                DeckCall::Draw { count, .. } => Some(count),
                DeckCall::NewDeck => None,
            })
            .collect()
    }

    pub fn remaining(&self, deck_id: &str) -> Option<usize> {
        self.inner.remaining(deck_id)
    }

    fn record(&self, call: DeckCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

#[async_trait]
impl DeckClient for RecordingDeckClient {
    async fn new_shuffled_deck(&self) -> Result<DeckId> {
        self.record(DeckCall::NewDeck);
        self.inner.new_shuffled_deck().await
    }

    async fn draw(&self, deck_id: &str, count: usize) -> Result<Vec<Card>> {
        self.record(DeckCall::Draw {
            deck_id: deck_id.to_string(),
            count,
        });
        self.inner.draw(deck_id, count).await
    }
}

/// Lobby manager over a recording in-memory deck
pub fn create_test_system() -> (LobbyManager, Arc<RecordingDeckClient>) {
    let deck = Arc::new(RecordingDeckClient::new());
    let manager = LobbyManager::new(deck.clone()).expect("Failed to create lobby manager");
    (manager, deck)
}

/// Running application state over the given deck client
pub async fn create_app_state(
    config: AppConfig,
    deck: Arc<dyn DeckClient>,
) -> Arc<AppState> {
    let state =
        Arc::new(AppState::with_deck_client(config, deck).expect("Failed to build app state"));
    state.start().await.expect("Failed to start app state");
    state
}

/// Lobby with the given players already seated
pub async fn lobby_with_players(manager: &LobbyManager, players: &[&str]) -> String {
    let code = manager
        .create_lobby()
        .await
        .expect("Failed to create lobby");
    for player in players {
        manager
            .join_lobby(&code, player)
            .await
            .expect("Failed to join lobby");
    }
    code
}
