use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;

use crate::domain::ingest::ReconcileError;
use crate::domain::search::SearchError;

/// Stable machine-readable codes; callers branch on these, not on the
/// detail text.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    MissingDocument,
    MissingParentOrgId,
    MissingUserEmail,
    InvalidWebhookSecret,
    UpstreamError,
}

#[derive(Serialize)]
struct ErrorBody {
    ok: bool,
    error: ErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

pub struct ApiError {
    status: StatusCode,
    code: ErrorCode,
    detail: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: ErrorCode) -> Self {
        Self {
            status,
            code,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn bad_request(code: ErrorCode) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code)
    }

    pub fn unauthorized(code: ErrorCode) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, code)
    }

    pub fn internal(code: ErrorCode) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, code)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:?}", self.status, self.code)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            ok: false,
            error: self.code,
            detail: self.detail,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<ReconcileError> for ApiError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::MissingDocumentId => {
                Self::bad_request(ErrorCode::MissingDocument).with_detail(err.to_string())
            }
            ReconcileError::MissingParentOrgId => {
                Self::bad_request(ErrorCode::MissingParentOrgId).with_detail(err.to_string())
            }
            ReconcileError::Store(ref e) => {
                tracing::error!("Store error during reconciliation: {:?}", e);
                Self::internal(ErrorCode::UpstreamError)
            }
        }
    }
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::MissingUserEmail => {
                Self::bad_request(ErrorCode::MissingUserEmail).with_detail(err.to_string())
            }
            SearchError::Store(ref e) => {
                tracing::error!("Store error during search: {:?}", e);
                Self::internal(ErrorCode::UpstreamError)
            }
        }
    }
}
