use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use common::DecodeError;
use serde::Serialize;

use crate::backend::ResponseCapture;
use crate::store::StoreError;

/// Structured error response produced by the proxy itself. Errors relayed
/// from the storage node keep the node's own body instead.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `AUTH_MISSING`, `VALIDATION_ERROR`,
    /// `NOT_FOUND`, `BAD_GATEWAY`, `DECODE_ERROR`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "invalid query parameter: 'pin'")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Unauthorized,
    Validation(String),
    NotFound(String),
    /// Non-success response from the storage node, relayed verbatim.
    Backend(ResponseCapture),
    BackendUnavailable(String),
    Decode(String),
    Store(StoreError),
}

impl AppError {
    /// Status and JSON body for errors produced by the proxy. A relayed
    /// backend error is handed back unchanged.
    fn status_and_body(self) -> Result<(StatusCode, ErrorBody), ResponseCapture> {
        let pair = match self {
            AppError::Backend(capture) => return Err(capture),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "AUTH_MISSING",
                    message: "Basic authentication required".into(),
                },
            ),
            AppError::Validation(msg) => {
                tracing::warn!("Rejected request: {}", msg);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorBody {
                        code: "VALIDATION_ERROR",
                        message: msg,
                    },
                )
            }
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::BackendUnavailable(detail) => {
                tracing::error!("Backend unavailable: {}", detail);
                (
                    StatusCode::BAD_GATEWAY,
                    ErrorBody {
                        code: "BAD_GATEWAY",
                        message: "Storage node is unavailable".into(),
                    },
                )
            }
            AppError::Decode(msg) => {
                tracing::error!("Failed to process backend response: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "DECODE_ERROR",
                        message: msg,
                    },
                )
            }
            AppError::Store(err) => {
                tracing::error!("Store error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        };
        Ok(pair)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let challenge = matches!(self, AppError::Unauthorized);

        match self.status_and_body() {
            Ok((status, body)) if challenge => (
                status,
                [(header::WWW_AUTHENTICATE, "Basic realm=\"pin-proxy\"")],
                Json(body),
            )
                .into_response(),
            Ok((status, body)) => (status, Json(body)).into_response(),
            Err(capture) => {
                let status = capture.status();
                if status.is_client_error() {
                    tracing::warn!(status = status.as_u16(), "Backend rejected request");
                } else if status != StatusCode::BAD_GATEWAY {
                    tracing::error!(status = status.as_u16(), "Backend request failed");
                }
                capture.into_response()
            }
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Store(err)
    }
}

impl From<DecodeError> for AppError {
    fn from(err: DecodeError) -> Self {
        AppError::Decode(err.to_string())
    }
}
