//! Mapping from lobby errors to HTTP responses

use crate::api::models::ErrorResponse;
use crate::error::LobbyError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{error, warn};

/// Error returned by every lobby API handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl From<&LobbyError> for ApiError {
    fn from(err: &LobbyError) -> Self {
        match err {
            LobbyError::LobbyNotFound { .. } => Self::new(StatusCode::NOT_FOUND, "Lobby not found"),
            LobbyError::PlayerNotFound { .. } => {
                Self::new(StatusCode::NOT_FOUND, "Player not found")
            }
            LobbyError::AlreadyJoined { .. } => Self::bad_request("Player already joined"),
            LobbyError::GameAlreadyStarted { .. } => {
                Self::new(StatusCode::CONFLICT, "Game already started")
            }
            LobbyError::ExternalService { .. } => {
                warn!("Deck service failure surfaced to client: {}", err);
                Self::new(StatusCode::BAD_GATEWAY, err.to_string())
            }
            LobbyError::InvalidRequest { reason } => Self::bad_request(reason.clone()),
            LobbyError::ConfigurationError { .. } | LobbyError::InternalError { .. } => {
                error!("Internal failure: {}", err);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match LobbyError::from_anyhow(&err) {
            Some(lobby_error) => Self::from(lobby_error),
            None => {
                error!("Unclassified failure: {:#}", err);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(format!("Malformed request body: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}
