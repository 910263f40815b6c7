//! Main application configuration
//!
//! This module defines the primary configuration structures for the card-lobby
//! service, including file and environment variable loading and validation.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub deck: DeckSettings,
    pub lobby: LobbySettings,
}

/// Service-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and health reports
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Address the HTTP server binds to
    pub host: String,
    /// Port for the lobby API, health and metrics endpoints
    pub http_port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

/// Deck service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckSettings {
    /// Base URL of the deck API, without trailing slash
    pub base_url: String,
    /// Number of 52-card decks shuffled together per lobby
    pub deck_count: u32,
    /// Upper bound on any single deck service call, in milliseconds
    pub request_timeout_ms: u64,
}

/// Lobby behaviour settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LobbySettings {
    /// Whether starting an already started game deals fresh hands.
    /// When false the second start is rejected.
    pub allow_redeal: bool,
    /// Codes tried before lobby creation gives up on collisions
    pub code_generation_attempts: u32,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "card-lobby".to_string(),
            log_level: "info".to_string(),
            host: "0.0.0.0".to_string(),
            http_port: 8000,
            shutdown_timeout_seconds: 30,
        }
    }
}

impl Default for DeckSettings {
    fn default() -> Self {
        Self {
            base_url: "https://deckofcardsapi.com/api/deck".to_string(),
            deck_count: 1,
            request_timeout_ms: 5000,
        }
    }
}

impl DeckSettings {
    /// Get the per-request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for LobbySettings {
    fn default() -> Self {
        Self {
            allow_redeal: true,
            code_generation_attempts: 8,
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| anyhow!("Invalid {} value: {}", name, value))
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file; environment variables still win
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config = Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Parse configuration from TOML text, filling gaps with defaults
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }
        if let Ok(host) = env::var("HTTP_HOST") {
            self.service.host = host;
        }
        if let Ok(port) = env::var("HTTP_PORT") {
            self.service.http_port = parse_env("HTTP_PORT", &port)?;
        }
        if let Ok(timeout) = env::var("SHUTDOWN_TIMEOUT_SECONDS") {
            self.service.shutdown_timeout_seconds =
                parse_env("SHUTDOWN_TIMEOUT_SECONDS", &timeout)?;
        }

        // Deck settings
        if let Ok(url) = env::var("DECK_API_BASE") {
            self.deck.base_url = url;
        }
        if let Ok(count) = env::var("DECK_COUNT") {
            self.deck.deck_count = parse_env("DECK_COUNT", &count)?;
        }
        if let Ok(timeout) = env::var("DECK_REQUEST_TIMEOUT_MS") {
            self.deck.request_timeout_ms = parse_env("DECK_REQUEST_TIMEOUT_MS", &timeout)?;
        }

        // Lobby settings
        if let Ok(redeal) = env::var("LOBBY_ALLOW_REDEAL") {
            self.lobby.allow_redeal = parse_env("LOBBY_ALLOW_REDEAL", &redeal)?;
        }
        if let Ok(attempts) = env::var("LOBBY_CODE_GENERATION_ATTEMPTS") {
            self.lobby.code_generation_attempts =
                parse_env("LOBBY_CODE_GENERATION_ATTEMPTS", &attempts)?;
        }

        Ok(())
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }

    /// Get the deck service timeout as Duration
    pub fn deck_timeout(&self) -> Duration {
        self.deck.request_timeout()
    }

    /// Address string for the HTTP listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.service.host, self.service.http_port)
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    // Validate listener
    if config.service.host.is_empty() {
        return Err(anyhow!("HTTP host cannot be empty"));
    }
    if config.service.http_port == 0 {
        return Err(anyhow!("HTTP port cannot be 0"));
    }

    // Validate timeouts
    if config.service.shutdown_timeout_seconds == 0 {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }
    if config.deck.request_timeout_ms == 0 {
        return Err(anyhow!("Deck request timeout must be greater than 0"));
    }

    // Validate deck settings
    if !(config.deck.base_url.starts_with("http://")
        || config.deck.base_url.starts_with("https://"))
    {
        return Err(anyhow!(
            "Deck API base must be an http(s) URL: {}",
            config.deck.base_url
        ));
    }
    if config.deck.deck_count == 0 {
        return Err(anyhow!("Deck count must be greater than 0"));
    }

    // Validate lobby settings
    if config.lobby.code_generation_attempts == 0 {
        return Err(anyhow!("Code generation attempts must be greater than 0"));
    }

    Ok(())
}
