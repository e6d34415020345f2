use axum::{http::StatusCode, response::IntoResponse, Json};
use log::error;

use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Invalid request body")]
    InvalidBody(#[source] serde_json::Error),
    #[error("{message}")]
    Store {
        message: &'static str,
        #[source]
        source: StoreError,
    },
}

impl FlowError {
    /// Maps a store failure into a generic error, logging the underlying cause.
    pub fn store(message: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| {
            error!("{message}: {source}");
            Self::Store { message, source }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::InvalidBody(_) => "invalid_body",
            Self::Store { .. } => "store_failure",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for FlowError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({
            "error": self.to_string(),
            "kind": self.kind(),
        });
        (self.status(), Json(body)).into_response()
    }
}
