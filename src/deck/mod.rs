//! Deck service integration
//!
//! The lobby logic only sees the `DeckClient` capability. The HTTP client
//! talks to the real service; the in-memory client stands in for it in tests
//! and offline runs.

pub mod client;
pub mod http;

pub use client::{standard_deck, DeckClient, InMemoryDeckClient};
pub use http::HttpDeckClient;
