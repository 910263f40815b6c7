//! HTTP client for a deckofcardsapi.com-compatible deck service

use crate::config::DeckSettings;
use crate::deck::client::DeckClient;
use crate::error::{LobbyError, Result};
use crate::types::{Card, DeckId};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Instant;
use tracing::{debug, warn};

fn default_success() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct NewDeckResponse {
    #[serde(default = "default_success")]
    success: bool,
    deck_id: String,
    #[serde(default)]
    remaining: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct DrawResponse {
    #[serde(default = "default_success")]
    success: bool,
    #[serde(default)]
    cards: Vec<Card>,
    #[serde(default)]
    remaining: Option<u32>,
    #[serde(default)]
    error: Option<String>,
}

/// Deck client backed by the remote HTTP API
#[derive(Debug, Clone)]
pub struct HttpDeckClient {
    client: reqwest::Client,
    base_url: String,
    deck_count: u32,
}

impl HttpDeckClient {
    /// Build a client with the configured base URL and request timeout
    pub fn new(settings: &DeckSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .map_err(|e| LobbyError::ConfigurationError {
                message: format!("Failed to build deck service client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            deck_count: settings.deck_count,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let start = Instant::now();
        debug!("Deck service request: GET {}", url);

        let response = self.client.get(url).send().await.map_err(|e| {
            warn!("Deck service request failed: {}", e);
            LobbyError::external(if e.is_timeout() {
                format!("request to {} timed out", url)
            } else {
                format!("request to {} failed: {}", url, e)
            })
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!("Deck service returned {} for {}", status, url);
            return Err(LobbyError::external(format!("deck service returned {}", status)).into());
        }

        let body = response.json::<T>().await.map_err(|e| {
            LobbyError::external(format!("malformed deck service response: {}", e))
        })?;

        debug!(
            "Deck service responded in {:.2}ms",
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(body)
    }
}

#[async_trait]
impl DeckClient for HttpDeckClient {
    async fn new_shuffled_deck(&self) -> Result<DeckId> {
        let url = format!(
            "{}/new/shuffle/?deck_count={}",
            self.base_url, self.deck_count
        );
        let body: NewDeckResponse = self.get_json(&url).await?;

        if !body.success || body.deck_id.is_empty() {
            return Err(LobbyError::external("deck service refused to create a deck").into());
        }

        debug!(
            "Shuffled new deck {} ({} cards)",
            body.deck_id,
            body.remaining.unwrap_or_default()
        );
        Ok(body.deck_id)
    }

    async fn draw(&self, deck_id: &str, count: usize) -> Result<Vec<Card>> {
        if count == 0 {
            return Err(LobbyError::InvalidRequest {
                reason: "draw count must be at least 1".to_string(),
            }
            .into());
        }

        let url = format!("{}/{}/draw/?count={}", self.base_url, deck_id, count);
        let body: DrawResponse = self.get_json(&url).await?;

        if !body.success {
            return Err(LobbyError::external(
                body.error
                    .unwrap_or_else(|| format!("draw from deck {} was refused", deck_id)),
            )
            .into());
        }

        if body.cards.len() != count {
            return Err(LobbyError::external(format!(
                "asked for {} cards from deck {}, received {}",
                count,
                deck_id,
                body.cards.len()
            ))
            .into());
        }

        debug!(
            "Drew {} cards from deck {} ({} remaining)",
            count,
            deck_id,
            body.remaining.unwrap_or_default()
        );
        Ok(body.cards)
    }
}
