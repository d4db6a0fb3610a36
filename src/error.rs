//! Error types for letterd.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, thiserror::Error)]
pub enum CollabError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("room not found: {0}")]
    RoomNotFound(String),

    #[error("draft not found: {0}")]
    DraftNotFound(i64),

    #[error("protocol error: {0}")]
    Protocol(String),
}

impl IntoResponse for CollabError {
    fn into_response(self) -> Response {
        let status = match &self {
            CollabError::Auth(_) => StatusCode::UNAUTHORIZED,
            CollabError::RoomNotFound(_) => StatusCode::NOT_FOUND,
            CollabError::DraftNotFound(_) => StatusCode::NOT_FOUND,
            CollabError::Protocol(_) => StatusCode::BAD_REQUEST,
            CollabError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}
