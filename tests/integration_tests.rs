//! Integration tests for the card-lobby service
//!
//! These tests drive the lobby manager end to end against an in-memory deck:
//! - Complete lobby lifecycle from creation to showdown
//! - Deck call patterns for dealing and community cards
//! - Hand lookup across and within lobbies
//! - Error handling and partial failures

mod fixtures;

use card_lobby::config::LobbySettings;
use card_lobby::deck::InMemoryDeckClient;
use card_lobby::error::LobbyError;
use card_lobby::lobby::manager::DEFAULT_DECK_TIMEOUT;
use card_lobby::lobby::{LobbyManager, HAND_SIZE};
use card_lobby::types::Phase;
use std::collections::HashSet;
use std::sync::Arc;

use fixtures::{create_test_system, lobby_with_players, DeckCall, RecordingDeckClient};

fn lobby_error(err: &anyhow::Error) -> LobbyError {
    LobbyError::from_anyhow(err)
        .cloned()
        .expect("expected a LobbyError")
}

#[tokio::test]
async fn test_complete_game_workflow() {
    let (manager, deck) = create_test_system();

    // Step 1: Create and fill the lobby
    let code = lobby_with_players(&manager, &["Alice", "Bob"]).await;
    assert_eq!(code.len(), 6);

    // Step 2: Start and deal
    manager.start_game(&code).await.unwrap();
    let alice = manager.get_hand("Alice").await.unwrap();
    let bob = manager.get_hand("Bob").await.unwrap();
    assert_eq!(alice.len(), HAND_SIZE);
    assert_eq!(bob.len(), HAND_SIZE);

    // Step 3: Alice draws
    let drawn = manager.draw_card(&code, "Alice").await.unwrap();
    let alice = manager.get_hand("Alice").await.unwrap();
    assert_eq!(alice.len(), 3);
    assert_eq!(alice[2], drawn);

    // Step 4: Walk every phase
    let mut counts = Vec::new();
    for _ in 0..4 {
        let update = manager.advance_phase(&code).await.unwrap();
        counts.push((update.phase, update.community_cards.len()));
    }
    assert_eq!(
        counts,
        vec![
            (Phase::Flop, 3),
            (Phase::Turn, 4),
            (Phase::River, 5),
            (Phase::Showdown, 5)
        ]
    );

    // Every card handed out is distinct and came off the same deck
    let snapshot = manager.get_lobby(&code).await.unwrap();
    let mut seen = HashSet::new();
    for card in snapshot
        .hands
        .values()
        .flatten()
        .chain(snapshot.community_cards.iter())
    {
        assert!(seen.insert(card.code.clone()), "duplicate card {}", card.code);
    }
    assert_eq!(seen.len(), 2 + 2 + 1 + 5);
    assert_eq!(deck.remaining(&snapshot.deck_id), Some(52 - seen.len()));

    // One deck per lobby, two per-player deals, one draw, three reveals
    assert_eq!(deck.calls()[0], DeckCall::NewDeck);
    assert_eq!(deck.draw_sizes(), vec![2, 2, 1, 3, 1, 1]);
}

#[tokio::test]
async fn test_fresh_lobby_shape() {
    let (manager, _deck) = create_test_system();
    let code = manager.create_lobby().await.unwrap();

    let lobby = manager.get_lobby(&code).await.unwrap();
    assert_eq!(lobby.lobby_code, code);
    assert!(lobby.players.is_empty());
    assert!(lobby.hands.is_empty());
    assert!(!lobby.started);
    assert_eq!(lobby.phase, Phase::Preflop);
    assert!(lobby.community_cards.is_empty());
    assert_eq!(lobby.current_player_index, 0);
}

#[tokio::test]
async fn test_each_lobby_gets_its_own_deck() {
    let (manager, deck) = create_test_system();
    let first = manager.create_lobby().await.unwrap();
    let second = manager.create_lobby().await.unwrap();

    assert_ne!(first, second);
    let first_deck = manager.get_lobby(&first).await.unwrap().deck_id;
    let second_deck = manager.get_lobby(&second).await.unwrap().deck_id;
    assert_ne!(first_deck, second_deck);
    assert_eq!(
        deck.calls(),
        vec![DeckCall::NewDeck, DeckCall::NewDeck]
    );
}

#[tokio::test]
async fn test_duplicate_join_leaves_lobby_unchanged() {
    let (manager, _deck) = create_test_system();
    let code = lobby_with_players(&manager, &["Alice"]).await;

    let err = manager.join_lobby(&code, "Alice").await.unwrap_err();
    assert!(matches!(lobby_error(&err), LobbyError::AlreadyJoined { .. }));

    // Names are exact-match: different case is a different player
    manager.join_lobby(&code, "alice").await.unwrap();

    let lobby = manager.get_lobby(&code).await.unwrap();
    assert_eq!(lobby.players, vec!["Alice".to_string(), "alice".to_string()]);
}

#[tokio::test]
async fn test_start_with_no_players_only_marks_started() {
    let (manager, deck) = create_test_system();
    let code = manager.create_lobby().await.unwrap();

    manager.start_game(&code).await.unwrap();

    assert!(manager.get_lobby(&code).await.unwrap().started);
    assert!(deck.draw_sizes().is_empty());
}

#[tokio::test]
async fn test_join_after_start_gets_empty_hand() {
    let (manager, _deck) = create_test_system();
    let code = lobby_with_players(&manager, &["Alice"]).await;
    manager.start_game(&code).await.unwrap();

    manager.join_lobby(&code, "Late").await.unwrap();
    assert!(manager.get_hand("Late").await.unwrap().is_empty());
    assert_eq!(manager.get_hand("Alice").await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_showdown_is_idempotent() {
    let (manager, deck) = create_test_system();
    let code = manager.create_lobby().await.unwrap();

    for _ in 0..4 {
        manager.advance_phase(&code).await.unwrap();
    }
    let calls_at_showdown = deck.calls().len();

    for _ in 0..3 {
        let update = manager.advance_phase(&code).await.unwrap();
        assert_eq!(update.phase, Phase::Showdown);
        assert_eq!(update.community_cards.len(), 5);
    }
    assert_eq!(deck.calls().len(), calls_at_showdown);
}

#[tokio::test]
async fn test_phase_advance_does_not_require_start() {
    let (manager, _deck) = create_test_system();
    let code = manager.create_lobby().await.unwrap();

    let update = manager.advance_phase(&code).await.unwrap();
    assert_eq!(update.phase, Phase::Flop);
    assert!(!manager.get_lobby(&code).await.unwrap().started);
}

#[tokio::test]
async fn test_hand_lookup_prefers_oldest_lobby() {
    let (manager, _deck) = create_test_system();
    let older = lobby_with_players(&manager, &["Sam"]).await;
    let newer = lobby_with_players(&manager, &["Sam"]).await;

    manager.start_game(&newer).await.unwrap();

    // The older lobby never started, so the global lookup sees its empty hand
    assert!(manager.get_hand("Sam").await.unwrap().is_empty());
    assert!(manager
        .get_hand_in_lobby(&older, "Sam")
        .await
        .unwrap()
        .is_empty());
    assert_eq!(
        manager.get_hand_in_lobby(&newer, "Sam").await.unwrap().len(),
        2
    );
}

#[tokio::test]
async fn test_unknown_lookups_are_not_found() {
    let (manager, _deck) = create_test_system();
    let code = lobby_with_players(&manager, &["Alice"]).await;

    let err = manager.get_hand("Nobody").await.unwrap_err();
    assert!(matches!(lobby_error(&err), LobbyError::PlayerNotFound { .. }));

    let err = manager.get_hand_in_lobby(&code, "Nobody").await.unwrap_err();
    assert!(matches!(lobby_error(&err), LobbyError::PlayerNotFound { .. }));

    for result in [
        manager.start_game("ffffff").await,
        manager.join_lobby("ffffff", "Alice").await,
        manager.advance_phase("ffffff").await.map(|_| ()),
        manager.draw_card("ffffff", "Alice").await.map(|_| ()),
        manager.get_lobby("ffffff").await.map(|_| ()),
    ] {
        let err = result.unwrap_err();
        assert!(matches!(lobby_error(&err), LobbyError::LobbyNotFound { .. }));
    }
}

#[tokio::test]
async fn test_deck_failure_on_create_leaves_no_lobby() {
    let deck = Arc::new(InMemoryDeckClient::new().failing_new_deck());
    let manager = LobbyManager::new(deck).unwrap();

    let err = manager.create_lobby().await.unwrap_err();
    assert!(matches!(lobby_error(&err), LobbyError::ExternalService { .. }));
    assert_eq!(manager.store().len().unwrap(), 0);
}

#[tokio::test]
async fn test_failed_reveal_can_be_retried() {
    let deck = Arc::new(RecordingDeckClient::wrapping(
        InMemoryDeckClient::new().failing_draws_after(0),
    ));
    let manager = LobbyManager::new(deck.clone()).unwrap();
    let code = manager.create_lobby().await.unwrap();

    let err = manager.advance_phase(&code).await.unwrap_err();
    assert!(matches!(lobby_error(&err), LobbyError::ExternalService { .. }));

    let lobby = manager.get_lobby(&code).await.unwrap();
    assert_eq!(lobby.phase, Phase::Preflop);
    assert!(lobby.community_cards.is_empty());
    assert_eq!(deck.draw_sizes(), vec![3]);
}

#[tokio::test]
async fn test_deck_exhaustion_is_reported() {
    let (manager, _deck) = create_test_system();
    let code = lobby_with_players(&manager, &["Greedy"]).await;

    for _ in 0..52 {
        manager.draw_card(&code, "Greedy").await.unwrap();
    }

    let err = manager.draw_card(&code, "Greedy").await.unwrap_err();
    assert!(matches!(lobby_error(&err), LobbyError::ExternalService { .. }));
    assert_eq!(manager.get_hand("Greedy").await.unwrap().len(), 52);
}

#[tokio::test]
async fn test_redeal_toggle() {
    let deck = Arc::new(RecordingDeckClient::new());
    let settings = LobbySettings {
        allow_redeal: false,
        ..LobbySettings::default()
    };
    let manager = LobbyManager::with_settings(deck.clone(), settings, DEFAULT_DECK_TIMEOUT).unwrap();
    let code = lobby_with_players(&manager, &["Alice", "Bob"]).await;

    manager.start_game(&code).await.unwrap();
    let before = manager.get_lobby(&code).await.unwrap();

    let err = manager.start_game(&code).await.unwrap_err();
    assert!(matches!(
        lobby_error(&err),
        LobbyError::GameAlreadyStarted { .. }
    ));
    assert_eq!(manager.get_lobby(&code).await.unwrap(), before);
    assert_eq!(deck.draw_sizes(), vec![2, 2]);
}

#[tokio::test]
async fn test_stats_after_full_game() {
    let (manager, _deck) = create_test_system();
    let code = lobby_with_players(&manager, &["Alice", "Bob", "Carol"]).await;
    manager.start_game(&code).await.unwrap();
    for _ in 0..5 {
        manager.advance_phase(&code).await.unwrap();
    }

    let stats = manager.get_stats().await.unwrap();
    assert_eq!(stats.lobbies_created, 1);
    assert_eq!(stats.players_joined, 3);
    assert_eq!(stats.games_started, 1);
    assert_eq!(stats.phase_transitions, 4);
    assert_eq!(stats.cards_drawn, 6 + 5);
    assert_eq!(stats.deck_failures, 0);
    assert_eq!(stats.active_lobbies, 1);
    assert_eq!(stats.seated_players, 3);
}
