//! Main application state and service coordination
//!
//! This module contains the AppState that wires the deck client, lobby
//! manager and metrics together and owns the background maintenance tasks.

use crate::config::AppConfig;
use crate::deck::{DeckClient, HttpDeckClient};
use crate::lobby::manager::LobbyManager;
use crate::metrics::MetricsCollector;
use crate::service::health::HealthCheck;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Interval between lobby gauge refreshes
const METRICS_UPDATE_INTERVAL: Duration = Duration::from_secs(15);

/// Interval between uptime and health gauge refreshes
const HEALTH_METRICS_INTERVAL: Duration = Duration::from_secs(60);

/// Service-level errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Deck service error: {message}")]
    DeckService { message: String },

    #[error("Service initialization error: {message}")]
    Initialization { message: String },

    #[error("Background task error: {message}")]
    BackgroundTask { message: String },
}

/// Main application state containing all service components
pub struct AppState {
    /// Application configuration
    config: AppConfig,

    /// Game progression and lobby storage
    lobby_manager: Arc<LobbyManager>,

    /// Prometheus metrics shared with the lobby manager
    metrics_collector: Arc<MetricsCollector>,

    /// Background task handles
    background_tasks: Mutex<Vec<JoinHandle<()>>>,

    /// Service status
    is_running: Arc<RwLock<bool>>,

    started_at: Instant,
}

impl AppState {
    /// Initialize the application against the configured deck service
    pub async fn new(config: AppConfig) -> Result<Self, ServiceError> {
        info!("Initializing card-lobby service");
        info!(
            "Configuration: service={}, deck_api={}, allow_redeal={}",
            config.service.name, config.deck.base_url, config.lobby.allow_redeal
        );

        let deck_client =
            HttpDeckClient::new(&config.deck).map_err(|e| ServiceError::DeckService {
                message: format!("Failed to create deck client: {}", e),
            })?;

        Self::with_deck_client(config, Arc::new(deck_client))
    }

    /// Initialize the application with an explicit deck client
    pub fn with_deck_client(
        config: AppConfig,
        deck_client: Arc<dyn DeckClient>,
    ) -> Result<Self, ServiceError> {
        let metrics_collector =
            Arc::new(
                MetricsCollector::new().map_err(|e| ServiceError::Initialization {
                    message: format!("Failed to create metrics collector: {}", e),
                })?,
            );

        let lobby_manager = Arc::new(LobbyManager::with_metrics(
            deck_client,
            config.lobby.clone(),
            config.deck_timeout(),
            metrics_collector.clone(),
        ));

        Ok(Self {
            config,
            lobby_manager,
            metrics_collector,
            background_tasks: Mutex::new(Vec::new()),
            is_running: Arc::new(RwLock::new(false)),
            started_at: Instant::now(),
        })
    }

    /// Mark the service running and start background tasks
    pub async fn start(&self) -> Result<(), ServiceError> {
        info!("Starting card-lobby service");

        *self.is_running.write().await = true;
        self.start_background_tasks().await?;

        info!("✅ Card-lobby service started successfully");
        Ok(())
    }

    /// Perform graceful shutdown
    pub async fn shutdown(&self) -> Result<(), ServiceError> {
        info!("Starting graceful shutdown of card-lobby service");

        *self.is_running.write().await = false;
        self.stop_background_tasks().await;

        HealthCheck::evaluate(
            &self.config.service.name,
            false,
            &self.lobby_manager,
            self.uptime(),
        )
        .await
        .record(&self.metrics_collector);

        let final_stats =
            self.lobby_manager
                .get_stats()
                .await
                .map_err(|e| ServiceError::BackgroundTask {
                    message: format!("Failed to get final stats: {}", e),
                })?;

        info!("Final service statistics: {:?}", final_stats);
        info!("✅ Card-lobby service shutdown completed");

        Ok(())
    }

    /// Get service configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Check if service is running
    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    /// Get lobby manager for operations
    pub fn lobby_manager(&self) -> Arc<LobbyManager> {
        self.lobby_manager.clone()
    }

    pub fn metrics_collector(&self) -> Arc<MetricsCollector> {
        self.metrics_collector.clone()
    }

    /// Time since the state was built
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Start background maintenance tasks
    async fn start_background_tasks(&self) -> Result<(), ServiceError> {
        let mut tasks = self.background_tasks.lock().await;
        if !tasks.is_empty() {
            return Err(ServiceError::BackgroundTask {
                message: "Background tasks already running".to_string(),
            });
        }

        info!(
            "Starting lobby metrics update task ({}s interval)...",
            METRICS_UPDATE_INTERVAL.as_secs()
        );
        let metrics_task = {
            let lobby_manager = self.lobby_manager.clone();
            let metrics_collector = self.metrics_collector.clone();
            let is_running = self.is_running.clone();

            tokio::spawn(async move {
                let mut interval = tokio::time::interval(METRICS_UPDATE_INTERVAL);
                info!("Metrics update task started");

                while *is_running.read().await {
                    interval.tick().await;

                    match lobby_manager.get_stats().await {
                        Ok(stats) => {
                            debug!(
                                "Updating metrics - lobbies: {}, players: {}, games: {}",
                                stats.active_lobbies, stats.seated_players, stats.games_started
                            );
                            metrics_collector.update_from_lobby_stats(&stats);
                        }
                        Err(e) => {
                            warn!("Failed to get lobby stats for metrics update: {}", e);
                        }
                    }
                }

                info!("Metrics update task stopped");
            })
        };

        info!(
            "Starting health metrics task ({}s interval)...",
            HEALTH_METRICS_INTERVAL.as_secs()
        );
        let health_metrics_task = {
            let lobby_manager = self.lobby_manager.clone();
            let metrics_collector = self.metrics_collector.clone();
            let is_running = self.is_running.clone();
            let service_name = self.config.service.name.clone();
            let started_at = self.started_at;

            tokio::spawn(async move {
                let mut interval = tokio::time::interval(HEALTH_METRICS_INTERVAL);
                info!("Health metrics task started");

                while *is_running.read().await {
                    interval.tick().await;

                    let uptime = started_at.elapsed();
                    metrics_collector
                        .service()
                        .uptime_seconds
                        .set(uptime.as_secs() as i64);

                    let running = *is_running.read().await;
                    let health =
                        HealthCheck::evaluate(&service_name, running, &lobby_manager, uptime).await;
                    health.record(&metrics_collector);

                    debug!(
                        "Updated service health metrics - uptime: {}s, status: {}",
                        uptime.as_secs(),
                        health.status
                    );
                }

                info!("Health metrics task stopped");
            })
        };

        tasks.push(metrics_task);
        tasks.push(health_metrics_task);

        info!("{} background maintenance tasks started", tasks.len());
        Ok(())
    }

    /// Stop all background tasks
    async fn stop_background_tasks(&self) {
        let mut tasks = self.background_tasks.lock().await;
        let task_count = tasks.len();
        if task_count == 0 {
            info!("No background tasks to stop");
            return;
        }

        info!("Stopping {} background tasks...", task_count);
        for (i, task) in tasks.drain(..).enumerate() {
            debug!("Aborting background task {}/{}", i + 1, task_count);
            task.abort();
        }

        info!("✅ All {} background tasks stopped", task_count);
    }
}
