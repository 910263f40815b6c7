//! Metrics and monitoring for the card-lobby service
//!
//! This module provides Prometheus metrics collection and the health,
//! readiness and metrics endpoints.

pub mod collector;
pub mod health;

pub use collector::{
    DeckMetrics, LobbyMetrics, MetricsCollector, MetricsTimer, PerformanceMetrics, ServiceMetrics,
};
pub use health::{monitoring_router, render_metrics, HealthServerState};
