use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use cart_types::ports::cart_api::ApiError;
use serde::Serialize;
use thiserror::Error;

/// Failures surfaced by the cart store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    #[error("no signed-in user")]
    Unauthenticated,

    #[error("cart is empty")]
    EmptyCart,

    #[error("{0}")]
    Remote(#[from] ApiError),

    #[error("failed to remove {failed} of {total} cart items: {first}")]
    PartialClear {
        failed: usize,
        total: usize,
        first: ApiError,
    },

    #[error("invalid order: {0}")]
    InvalidOrder(String),

    #[error("quantity {0} out of range")]
    InvalidQuantity(i64),
}

/// Errors returned by the HTTP adapter.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl From<ApiError> for AppError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::NotFound(m) => AppError::NotFound(m),
            ApiError::Rejected(m) => AppError::BadRequest(m),
            ApiError::Transport(m) => AppError::Internal(anyhow::anyhow!(m)),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (code, msg) = match &self {
            AppError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            AppError::Internal(e) => {
                tracing::error!(error = %e, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".into())
            }
        };

        let body = serde_json::to_string(&ErrorBody { error: msg })
            .unwrap_or_else(|_| "{\"error\":\"internal serialization\"}".into());
        (code, [("content-type", "application/json")], body).into_response()
    }
}
