//! HTTP error mapping.
//!
//! Every error body has the shape `{"detail": "..."}`.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::memory::ServiceError;

pub const GENERIC_ERROR_DETAIL: &str = "Internal server error";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 409 with a user-facing message.
    #[error("{0}")]
    Conflict(String),
    /// 500 echoing the error text.
    #[error("{0:#}")]
    Internal(anyhow::Error),
    /// 500 with a generic message; the cause is only logged.
    #[error("Internal server error")]
    InternalOpaque(anyhow::Error),
}

impl ApiError {
    /// Same as `From<ServiceError>` but hides internal error text from the caller.
    pub fn opaque(err: ServiceError) -> Self {
        match err {
            ServiceError::Conflict(msg) => Self::Conflict(msg),
            ServiceError::Internal(e) => Self::InternalOpaque(e),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) | Self::InternalOpaque(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Conflict(msg) => Self::Conflict(msg),
            ServiceError::Internal(e) => Self::Internal(e),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Internal(anyhow::anyhow!(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Internal(anyhow::anyhow!(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Internal(e) | Self::InternalOpaque(e) => {
                tracing::error!("request failed: {e:#}");
            }
            Self::Conflict(msg) => tracing::debug!(detail = %msg, "request conflict"),
        }
        (self.status(), Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn conflict_maps_to_409() {
        let err = ApiError::from(ServiceError::Conflict("already there".into()));
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.to_string(), "already there");
    }

    #[test]
    fn internal_echoes_full_chain() {
        let cause: anyhow::Result<()> = Err(anyhow::anyhow!("connection refused"));
        let err = cause.context("vector search failed").unwrap_err();
        let api = ApiError::from(ServiceError::Internal(err));
        assert_eq!(api.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.to_string(), "vector search failed: connection refused");
    }

    #[test]
    fn opaque_hides_internal_text() {
        let api = ApiError::opaque(ServiceError::Internal(anyhow::anyhow!("disk I/O error")));
        assert_eq!(api.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.to_string(), GENERIC_ERROR_DETAIL);

        let conflict = ApiError::opaque(ServiceError::Conflict("dup".into()));
        assert_eq!(conflict.status(), StatusCode::CONFLICT);
    }
}
