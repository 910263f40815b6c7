//! Error types for the lobby service
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the application. Domain failures are raised as `LobbyError` and
//! recovered at the HTTP boundary with `downcast_ref`.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific lobby scenarios
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LobbyError {
    #[error("Lobby not found: {lobby_code}")]
    LobbyNotFound { lobby_code: String },

    #[error("Player not found: {player_name}")]
    PlayerNotFound { player_name: String },

    #[error("Player already joined: {player_name}")]
    AlreadyJoined { player_name: String },

    #[error("Game already started in lobby {lobby_code}")]
    GameAlreadyStarted { lobby_code: String },

    #[error("Deck service error: {message}")]
    ExternalService { message: String },

    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Internal service error: {message}")]
    InternalError { message: String },
}

impl LobbyError {
    /// Shorthand for deck service failures
    pub fn external(message: impl Into<String>) -> Self {
        LobbyError::ExternalService {
            message: message.into(),
        }
    }

    /// Find the `LobbyError` carried by an `anyhow::Error`, if any
    pub fn from_anyhow(error: &anyhow::Error) -> Option<&LobbyError> {
        error.downcast_ref::<LobbyError>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = LobbyError::LobbyNotFound {
            lobby_code: "abc123".to_string(),
        };
        assert_eq!(err.to_string(), "Lobby not found: abc123");

        let err = LobbyError::external("timed out");
        assert_eq!(err.to_string(), "Deck service error: timed out");
    }

    #[test]
    fn test_downcast_through_anyhow() {
        let err: anyhow::Error = LobbyError::AlreadyJoined {
            player_name: "Alice".to_string(),
        }
        .into();

        assert_eq!(
            LobbyError::from_anyhow(&err),
            Some(&LobbyError::AlreadyJoined {
                player_name: "Alice".to_string()
            })
        );

        let other = anyhow::anyhow!("plain failure");
        assert!(LobbyError::from_anyhow(&other).is_none());
    }
}
