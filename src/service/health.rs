//! Health check functionality
//!
//! This module provides health checks for the card-lobby service, including
//! readiness and liveness probes.

use crate::lobby::LobbyManager;
use crate::metrics::MetricsCollector;
use crate::service::app::AppState;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

/// Health check status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "✅ healthy"),
            HealthStatus::Degraded => write!(f, "⚠️  degraded"),
            HealthStatus::Unhealthy => write!(f, "❌ unhealthy"),
        }
    }
}

impl HealthStatus {
    /// Numeric value for the health gauge (0 = unhealthy, 2 = healthy)
    pub fn as_gauge(&self) -> u8 {
        match self {
            HealthStatus::Healthy => 2,
            HealthStatus::Degraded => 1,
            HealthStatus::Unhealthy => 0,
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    /// Overall service status
    pub status: HealthStatus,
    /// Service name
    pub service: String,
    /// Crate version
    pub version: String,
    /// Current timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Detailed component checks
    pub checks: Vec<ComponentCheck>,
    /// Service statistics
    pub stats: ServiceStats,
}

/// Individual component health check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentCheck {
    /// Component name
    pub name: String,
    /// Component status
    pub status: HealthStatus,
    /// Optional error message if unhealthy
    pub message: Option<String>,
    /// Check duration in milliseconds
    pub duration_ms: u64,
}

/// Service statistics for health reporting
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceStats {
    /// Number of live lobbies
    pub active_lobbies: usize,
    /// Players seated across all lobbies
    pub seated_players: usize,
    /// Total lobbies created since service start
    pub lobbies_created: u64,
    /// Total games started since service start
    pub games_started: u64,
    /// Total failed deck service calls
    pub deck_failures: u64,
    /// Seconds since the service state was built
    pub uptime_seconds: u64,
}

impl HealthCheck {
    /// Perform a comprehensive health check of the service
    pub async fn check(app_state: Arc<AppState>) -> Result<Self> {
        let lobby_manager = app_state.lobby_manager();
        Ok(Self::evaluate(
            &app_state.config().service.name,
            app_state.is_running().await,
            &lobby_manager,
            app_state.uptime(),
        )
        .await)
    }

    /// Build a health report from the individual service components
    pub async fn evaluate(
        service: &str,
        is_running: bool,
        lobby_manager: &LobbyManager,
        uptime: Duration,
    ) -> Self {
        let mut checks = Vec::new();
        let mut overall_status = HealthStatus::Healthy;

        // Check if service is running
        let service_check = Self::check_service_running(is_running);
        if service_check.status != HealthStatus::Healthy {
            overall_status = HealthStatus::Unhealthy;
        }
        checks.push(service_check);

        // Check lobby store
        let store_check = Self::check_lobby_store(lobby_manager).await;
        if store_check.status == HealthStatus::Unhealthy {
            overall_status = HealthStatus::Unhealthy;
        } else if store_check.status == HealthStatus::Degraded
            && overall_status == HealthStatus::Healthy
        {
            overall_status = HealthStatus::Degraded;
        }
        checks.push(store_check);

        let stats = Self::gather_service_stats(lobby_manager, uptime).await;

        HealthCheck {
            status: overall_status,
            service: service.to_string(),
            version: crate::VERSION.to_string(),
            timestamp: chrono::Utc::now(),
            checks,
            stats,
        }
    }

    /// Publish this report to the health gauges
    pub fn record(&self, metrics_collector: &MetricsCollector) {
        metrics_collector.update_health_status(self.status.as_gauge());
        for check in &self.checks {
            metrics_collector
                .update_component_health(&check.name, check.status != HealthStatus::Unhealthy);
        }
    }

    /// Simple liveness check - just verify service is running
    pub async fn liveness_check(app_state: Arc<AppState>) -> Result<HealthStatus> {
        if app_state.is_running().await {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Unhealthy)
        }
    }

    /// Readiness check - verify service can handle requests
    pub async fn readiness_check(app_state: Arc<AppState>) -> Result<HealthStatus> {
        if !app_state.is_running().await {
            return Ok(HealthStatus::Unhealthy);
        }

        Ok(Self::check_lobby_store(&app_state.lobby_manager()).await.status)
    }

    fn check_service_running(is_running: bool) -> ComponentCheck {
        let (status, message) = if is_running {
            (HealthStatus::Healthy, None)
        } else {
            (
                HealthStatus::Unhealthy,
                Some("Service is not running".to_string()),
            )
        };

        ComponentCheck {
            name: "service_running".to_string(),
            status,
            message,
            duration_ms: 0,
        }
    }

    /// Check that the lobby store can be scanned
    async fn check_lobby_store(lobby_manager: &LobbyManager) -> ComponentCheck {
        let start = std::time::Instant::now();

        let (status, message) = match lobby_manager.get_stats().await {
            Ok(_) => (HealthStatus::Healthy, None),
            Err(e) => {
                error!("Lobby store check failed: {}", e);
                (
                    HealthStatus::Unhealthy,
                    Some(format!("Lobby store unavailable: {}", e)),
                )
            }
        };

        ComponentCheck {
            name: "lobby_store".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    /// Gather current service statistics
    async fn gather_service_stats(lobby_manager: &LobbyManager, uptime: Duration) -> ServiceStats {
        let uptime_seconds = uptime.as_secs();

        match lobby_manager.get_stats().await {
            Ok(lobby_stats) => ServiceStats {
                active_lobbies: lobby_stats.active_lobbies,
                seated_players: lobby_stats.seated_players,
                lobbies_created: lobby_stats.lobbies_created,
                games_started: lobby_stats.games_started,
                deck_failures: lobby_stats.deck_failures,
                uptime_seconds,
            },
            Err(e) => {
                debug!("Failed to get lobby stats for health check: {}", e);
                ServiceStats {
                    uptime_seconds,
                    ..ServiceStats::default()
                }
            }
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| anyhow::anyhow!("Failed to serialize health check: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::deck::InMemoryDeckClient;

    fn test_state() -> Arc<AppState> {
        Arc::new(
            AppState::with_deck_client(AppConfig::default(), Arc::new(InMemoryDeckClient::new()))
                .expect("Failed to build app state"),
        )
    }

    #[tokio::test]
    async fn test_not_running_is_unhealthy() {
        let state = test_state();
        let health = HealthCheck::check(state.clone()).await.unwrap();
        assert_eq!(health.status, HealthStatus::Unhealthy);
        assert_eq!(
            HealthCheck::readiness_check(state).await.unwrap(),
            HealthStatus::Unhealthy
        );
    }

    #[tokio::test]
    async fn test_running_service_reports_stats() {
        let state = test_state();
        state.start().await.unwrap();

        let code = state.lobby_manager().create_lobby().await.unwrap();
        state.lobby_manager().join_lobby(&code, "Alice").await.unwrap();

        let health = HealthCheck::check(state.clone()).await.unwrap();
        assert_eq!(health.status, HealthStatus::Healthy);
        assert_eq!(health.service, "card-lobby");
        assert_eq!(health.checks.len(), 2);
        assert_eq!(health.stats.active_lobbies, 1);
        assert_eq!(health.stats.seated_players, 1);
        assert!(health.to_json().unwrap().contains("lobby_store"));

        state.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_record_publishes_report() {
        let state = test_state();
        let metrics = state.metrics_collector();

        let health = HealthCheck::check(state.clone()).await.unwrap();
        health.record(&metrics);
        assert_eq!(metrics.service().health_status.get(), 0);
        assert_eq!(
            metrics
                .service()
                .component_health
                .with_label_values(&["service_running"])
                .get(),
            0
        );
        assert_eq!(
            metrics
                .service()
                .component_health
                .with_label_values(&["lobby_store"])
                .get(),
            1
        );

        state.start().await.unwrap();
        HealthCheck::check(state.clone()).await.unwrap().record(&metrics);
        assert_eq!(metrics.service().health_status.get(), 2);

        state.shutdown().await.unwrap();
    }

    #[test]
    fn test_gauge_values() {
        assert_eq!(HealthStatus::Healthy.as_gauge(), 2);
        assert_eq!(HealthStatus::Degraded.as_gauge(), 1);
        assert_eq!(HealthStatus::Unhealthy.as_gauge(), 0);
    }
}
