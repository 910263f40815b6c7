//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for the card-lobby service using
//! Prometheus metrics.

use crate::lobby::manager::LobbyManagerStats;
use crate::types::{DrawPurpose, Phase};
use anyhow::Result;
use prometheus::{
    Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the lobby service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Service-level metrics
    service_metrics: ServiceMetrics,

    /// Lobby-related metrics
    lobby_metrics: LobbyMetrics,

    /// Deck service metrics
    deck_metrics: DeckMetrics,

    /// Performance metrics
    performance_metrics: PerformanceMetrics,
}

/// Service-level metrics
#[derive(Clone)]
pub struct ServiceMetrics {
    /// Service uptime in seconds
    pub uptime_seconds: IntGauge,

    /// Health check status (0=unhealthy, 1=degraded, 2=healthy)
    pub health_status: IntGauge,

    /// Component health status
    pub component_health: IntGaugeVec,
}

/// Lobby-related metrics
#[derive(Clone)]
pub struct LobbyMetrics {
    /// Number of live lobbies
    pub active_lobbies: IntGauge,

    /// Players currently seated across all lobbies
    pub seated_players: IntGauge,

    /// Total lobbies created
    pub lobbies_created_total: IntCounter,

    /// Total successful joins
    pub players_joined_total: IntCounter,

    /// Rejected operations by reason
    pub rejections_total: IntCounterVec,

    /// Total games started (re-deals included)
    pub games_started_total: IntCounter,

    /// Phase transitions by target phase
    pub phase_transitions_total: IntCounterVec,
}

/// Deck service metrics
#[derive(Clone)]
pub struct DeckMetrics {
    /// Deck service calls by operation and outcome
    pub requests_total: IntCounterVec,

    /// Cards drawn by purpose
    pub cards_drawn_total: IntCounterVec,

    /// Deck service call latency
    pub request_duration: HistogramVec,
}

/// Performance metrics
#[derive(Clone)]
pub struct PerformanceMetrics {
    /// Lobby operation durations, deck calls included
    pub lobby_operation_duration: HistogramVec,

    /// Lobby store summary scan time
    pub store_scan_duration: Histogram,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let service_metrics = ServiceMetrics::new(&registry)?;
        let lobby_metrics = LobbyMetrics::new(&registry)?;
        let deck_metrics = DeckMetrics::new(&registry)?;
        let performance_metrics = PerformanceMetrics::new(&registry)?;

        Ok(Self {
            registry,
            service_metrics,
            lobby_metrics,
            deck_metrics,
            performance_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Get service metrics
    pub fn service(&self) -> &ServiceMetrics {
        &self.service_metrics
    }

    /// Get lobby metrics
    pub fn lobby(&self) -> &LobbyMetrics {
        &self.lobby_metrics
    }

    /// Get deck metrics
    pub fn deck(&self) -> &DeckMetrics {
        &self.deck_metrics
    }

    /// Get performance metrics
    pub fn performance(&self) -> &PerformanceMetrics {
        &self.performance_metrics
    }

    /// Refresh gauges from lobby manager stats
    pub fn update_from_lobby_stats(&self, stats: &LobbyManagerStats) {
        self.lobby_metrics
            .active_lobbies
            .set(stats.active_lobbies as i64);
        self.lobby_metrics
            .seated_players
            .set(stats.seated_players as i64);
    }

    /// Record a lobby being created
    pub fn record_lobby_created(&self) {
        self.lobby_metrics.lobbies_created_total.inc();
        self.lobby_metrics.active_lobbies.inc();
    }

    /// Record a player joining a lobby
    pub fn record_player_joined(&self) {
        self.lobby_metrics.players_joined_total.inc();
        self.lobby_metrics.seated_players.inc();
    }

    /// Record an operation rejected for a domain reason
    pub fn record_rejection(&self, reason: &str) {
        self.lobby_metrics
            .rejections_total
            .with_label_values(&[reason])
            .inc();
    }

    /// Record a game starting
    pub fn record_game_started(&self) {
        self.lobby_metrics.games_started_total.inc();
    }

    /// Record a phase transition
    pub fn record_phase_transition(&self, phase: Phase) {
        self.lobby_metrics
            .phase_transitions_total
            .with_label_values(&[phase.as_str()])
            .inc();
    }

    /// Record cards pulled from a deck
    pub fn record_cards_drawn(&self, purpose: DrawPurpose, count: usize) {
        self.deck_metrics
            .cards_drawn_total
            .with_label_values(&[purpose.as_str()])
            .inc_by(count as u64);
    }

    /// Record a deck service call
    pub fn record_deck_request(&self, operation: &str, success: bool, duration: Duration) {
        let status = if success { "success" } else { "error" };

        self.deck_metrics
            .requests_total
            .with_label_values(&[operation, status])
            .inc();

        self.deck_metrics
            .request_duration
            .with_label_values(&[operation])
            .observe(duration.as_secs_f64());
    }

    /// Record lobby operation duration
    pub fn record_lobby_operation(&self, operation: &str, duration: Duration) {
        self.performance_metrics
            .lobby_operation_duration
            .with_label_values(&[operation])
            .observe(duration.as_secs_f64());
    }

    /// Update health status
    pub fn update_health_status(&self, status: u8) {
        self.service_metrics.health_status.set(status as i64);
    }

    /// Update component health
    pub fn update_component_health(&self, component: &str, healthy: bool) {
        let status = if healthy { 1 } else { 0 };
        self.service_metrics
            .component_health
            .with_label_values(&[component])
            .set(status);
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl ServiceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let uptime_seconds =
            IntGauge::new("card_lobby_uptime_seconds", "Service uptime in seconds")?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        let health_status = IntGauge::new(
            "card_lobby_health_status",
            "Health status (0=unhealthy, 1=degraded, 2=healthy)",
        )?;
        registry.register(Box::new(health_status.clone()))?;

        let component_health = IntGaugeVec::new(
            Opts::new("card_lobby_component_health", "Component health status"),
            &["component"],
        )?;
        registry.register(Box::new(component_health.clone()))?;

        Ok(Self {
            uptime_seconds,
            health_status,
            component_health,
        })
    }
}

impl LobbyMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let active_lobbies = IntGauge::new("card_lobby_active_lobbies", "Number of live lobbies")?;
        registry.register(Box::new(active_lobbies.clone()))?;

        let seated_players = IntGauge::new(
            "card_lobby_seated_players",
            "Players seated across all lobbies",
        )?;
        registry.register(Box::new(seated_players.clone()))?;

        let lobbies_created_total =
            IntCounter::new("card_lobby_lobbies_created_total", "Total lobbies created")?;
        registry.register(Box::new(lobbies_created_total.clone()))?;

        let players_joined_total =
            IntCounter::new("card_lobby_players_joined_total", "Total players joined")?;
        registry.register(Box::new(players_joined_total.clone()))?;

        let rejections_total = IntCounterVec::new(
            Opts::new("card_lobby_rejections_total", "Rejected lobby operations"),
            &["reason"],
        )?;
        registry.register(Box::new(rejections_total.clone()))?;

        let games_started_total =
            IntCounter::new("card_lobby_games_started_total", "Total games started")?;
        registry.register(Box::new(games_started_total.clone()))?;

        let phase_transitions_total = IntCounterVec::new(
            Opts::new(
                "card_lobby_phase_transitions_total",
                "Phase transitions by target phase",
            ),
            &["phase"],
        )?;
        registry.register(Box::new(phase_transitions_total.clone()))?;

        Ok(Self {
            active_lobbies,
            seated_players,
            lobbies_created_total,
            players_joined_total,
            rejections_total,
            games_started_total,
            phase_transitions_total,
        })
    }
}

impl DeckMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let requests_total = IntCounterVec::new(
            Opts::new("card_lobby_deck_requests_total", "Deck service calls"),
            &["operation", "status"],
        )?;
        registry.register(Box::new(requests_total.clone()))?;

        let cards_drawn_total = IntCounterVec::new(
            Opts::new("card_lobby_cards_drawn_total", "Cards drawn from decks"),
            &["purpose"],
        )?;
        registry.register(Box::new(cards_drawn_total.clone()))?;

        let request_duration = HistogramVec::new(
            HistogramOpts::new(
                "card_lobby_deck_request_duration_seconds",
                "Deck service call duration",
            )
            .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
            &["operation"],
        )?;
        registry.register(Box::new(request_duration.clone()))?;

        Ok(Self {
            requests_total,
            cards_drawn_total,
            request_duration,
        })
    }
}

impl PerformanceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let lobby_operation_duration = HistogramVec::new(
            HistogramOpts::new(
                "card_lobby_operation_duration_seconds",
                "Lobby operation duration",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["operation"],
        )?;
        registry.register(Box::new(lobby_operation_duration.clone()))?;

        let store_scan_duration = Histogram::with_opts(
            HistogramOpts::new(
                "card_lobby_store_scan_duration_seconds",
                "Lobby store summary scan time",
            )
            .buckets(vec![0.0001, 0.001, 0.005, 0.01, 0.05, 0.1]),
        )?;
        registry.register(Box::new(store_scan_duration.clone()))?;

        Ok(Self {
            lobby_operation_duration,
            store_scan_duration,
        })
    }
}
