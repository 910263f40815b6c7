//! Concurrency tests for the lobby manager
//!
//! These tests fire many operations at once and check that every mutation
//! lands exactly once and that no lobby skips or repeats a phase.

mod fixtures;

use card_lobby::config::LobbySettings;
use card_lobby::deck::InMemoryDeckClient;
use card_lobby::lobby::LobbyManager;
use card_lobby::types::Phase;
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use fixtures::{create_test_system, lobby_with_players};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_distinct_joins_all_land() {
    let (manager, _deck) = create_test_system();
    let manager = Arc::new(manager);
    let code = manager.create_lobby().await.unwrap();

    let joins = (0..100).map(|i| {
        let manager = manager.clone();
        let code = code.clone();
        tokio::spawn(async move { manager.join_lobby(&code, &format!("player-{}", i)).await })
    });

    for result in join_all(joins).await {
        result.unwrap().unwrap();
    }

    let lobby = manager.get_lobby(&code).await.unwrap();
    assert_eq!(lobby.players.len(), 100);
    let unique: HashSet<_> = lobby.players.iter().collect();
    assert_eq!(unique.len(), 100);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_duplicate_joins_admit_one() {
    let (manager, _deck) = create_test_system();
    let manager = Arc::new(manager);
    let code = manager.create_lobby().await.unwrap();

    let joins = (0..20).map(|_| {
        let manager = manager.clone();
        let code = code.clone();
        tokio::spawn(async move { manager.join_lobby(&code, "Alice").await })
    });

    let successes = join_all(joins)
        .await
        .into_iter()
        .filter(|result| matches!(result, Ok(Ok(()))))
        .count();

    assert_eq!(successes, 1);
    assert_eq!(manager.get_lobby(&code).await.unwrap().players.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_advances_step_one_phase_each() {
    let deck = Arc::new(InMemoryDeckClient::new().with_latency(Duration::from_millis(5)));
    let manager = Arc::new(LobbyManager::new(deck.clone()).unwrap());
    let code = manager.create_lobby().await.unwrap();

    let advances = (0..3).map(|_| {
        let manager = manager.clone();
        let code = code.clone();
        tokio::spawn(async move { manager.advance_phase(&code).await })
    });

    let mut phases: Vec<Phase> = join_all(advances)
        .await
        .into_iter()
        .map(|result| result.unwrap().unwrap().phase)
        .collect();
    phases.sort();

    assert_eq!(phases, vec![Phase::Flop, Phase::Turn, Phase::River]);

    let lobby = manager.get_lobby(&code).await.unwrap();
    assert_eq!(lobby.phase, Phase::River);
    assert_eq!(lobby.community_cards.len(), 5);
    assert_eq!(deck.remaining(&lobby.deck_id), Some(47));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_draws_never_share_a_card() {
    let (manager, _deck) = create_test_system();
    let manager = Arc::new(manager);
    let players: Vec<String> = (0..10).map(|i| format!("p{}", i)).collect();
    let names: Vec<&str> = players.iter().map(String::as_str).collect();
    let code = lobby_with_players(&manager, &names).await;

    let draws = players.iter().flat_map(|player| {
        let manager = manager.clone();
        let code = code.clone();
        let player = player.clone();
        (0..3).map(move |_| {
            let manager = manager.clone();
            let code = code.clone();
            let player = player.clone();
            tokio::spawn(async move { manager.draw_card(&code, &player).await })
        })
    });

    let cards: Vec<String> = join_all(draws)
        .await
        .into_iter()
        .map(|result| result.unwrap().unwrap().code)
        .collect();

    let unique: HashSet<_> = cards.iter().collect();
    assert_eq!(cards.len(), 30);
    assert_eq!(unique.len(), 30);

    for player in &players {
        assert_eq!(
            manager.get_hand_in_lobby(&code, player).await.unwrap().len(),
            3
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_slow_lobby_does_not_block_others() {
    let deck = Arc::new(InMemoryDeckClient::new());
    let manager = Arc::new(
        LobbyManager::with_settings(
            deck,
            LobbySettings::default(),
            Duration::from_secs(5),
        )
        .unwrap(),
    );
    let busy = manager.create_lobby().await.unwrap();
    let idle = manager.create_lobby().await.unwrap();

    // Hold the busy lobby's lock as a long deck call would
    let guard = manager.store().lock(&busy).await.unwrap();

    let start = Instant::now();
    manager.join_lobby(&idle, "Alice").await.unwrap();
    manager.advance_phase(&idle).await.unwrap();
    assert!(start.elapsed() < Duration::from_secs(1));

    drop(guard);
    manager.join_lobby(&busy, "Bob").await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cross_lobby_reads_ignore_busy_lobby() {
    let (manager, _deck) = create_test_system();
    let manager = Arc::new(manager);
    let busy = lobby_with_players(&manager, &["Bob"]).await;
    let idle = lobby_with_players(&manager, &["Alice"]).await;
    manager.start_game(&idle).await.unwrap();

    // The busy lobby is older, so a global hand lookup scans it first
    let guard = manager.store().lock(&busy).await.unwrap();
    let deadline = Duration::from_millis(500);

    let hand = tokio::time::timeout(deadline, manager.get_hand("Alice"))
        .await
        .expect("hand lookup waited on another lobby")
        .unwrap();
    assert_eq!(hand.len(), 2);

    let stats = tokio::time::timeout(deadline, manager.get_stats())
        .await
        .expect("stats waited on another lobby")
        .unwrap();
    assert_eq!(stats.active_lobbies, 2);
    assert_eq!(stats.seated_players, 2);

    let snapshot = tokio::time::timeout(deadline, manager.get_lobby(&busy))
        .await
        .expect("snapshot waited on the operation lock")
        .unwrap();
    assert_eq!(snapshot.players, vec!["Bob".to_string()]);

    drop(guard);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_lobbies_created_concurrently() {
    let (manager, deck) = create_test_system();
    let manager = Arc::new(manager);

    let creates = (0..50).map(|_| {
        let manager = manager.clone();
        tokio::spawn(async move { manager.create_lobby().await })
    });

    let codes: HashSet<String> = join_all(creates)
        .await
        .into_iter()
        .map(|result| result.unwrap().unwrap())
        .collect();

    assert_eq!(codes.len(), 50);
    assert_eq!(manager.store().len().unwrap(), 50);
    assert_eq!(deck.calls().len(), 50);
}
