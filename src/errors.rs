use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Booking or session store failed mid-conversation. This is the one
    /// fatal class: it must surface as a failure, never as a reply that
    /// could read like a confirmed booking. Covers rusqlite errors too,
    /// which reach here through the store traits' anyhow results.
    #[error("store unavailable: {0}")]
    Store(#[from] anyhow::Error),

    #[error("not found: {0}")]
    NotFound(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        };

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
