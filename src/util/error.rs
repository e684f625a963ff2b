use axum::{http::StatusCode, response::{IntoResponse, Response}};
use serde::Serialize;
use tracing::{error, warn};

use crate::model::parcel::TransitionError;
use crate::repository::repository_error::RepositoryError;
use crate::util::jwt::JwtError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HandlerErrorKind {
    NotFound,
    Validation,
    Internal,
    Unauthorized,
    Forbidden,
    Conflict,
    BadRequest,
    BadGateway,
}

impl std::fmt::Display for HandlerErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HandlerErrorKind::NotFound => "NotFound",
            HandlerErrorKind::Validation => "Validation",
            HandlerErrorKind::Internal => "Internal",
            HandlerErrorKind::Unauthorized => "Unauthorized",
            HandlerErrorKind::Forbidden => "Forbidden",
            HandlerErrorKind::Conflict => "Conflict",
            HandlerErrorKind::BadRequest => "BadRequest",
            HandlerErrorKind::BadGateway => "BadGateway",
        };
        write!(f, "{}", s)
    }
}

impl HandlerErrorKind {
    pub fn status_code(&self) -> StatusCode {
        match self {
            HandlerErrorKind::NotFound => StatusCode::NOT_FOUND,
            HandlerErrorKind::Validation | HandlerErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            HandlerErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            HandlerErrorKind::Forbidden => StatusCode::FORBIDDEN,
            HandlerErrorKind::Conflict => StatusCode::CONFLICT,
            HandlerErrorKind::BadGateway => StatusCode::BAD_GATEWAY,
            HandlerErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HandlerError {
    pub error: HandlerErrorKind,
    pub message: String,
    pub details: Option<String>,
}

impl HandlerError {
    pub fn new<T: Into<String>>(error: HandlerErrorKind, message: T) -> Self {
        HandlerError { error, message: message.into(), details: None }
    }

    pub fn bad_request<T: Into<String>>(message: T) -> Self {
        HandlerError::new(HandlerErrorKind::BadRequest, message)
    }

    pub fn unauthorized<T: Into<String>>(message: T) -> Self {
        HandlerError::new(HandlerErrorKind::Unauthorized, message)
    }

    pub fn with_details<T: Into<String>>(mut self, details: T) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl std::fmt::Display for HandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for HandlerError {}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let status = self.error.status_code();
        if status.is_server_error() {
            error!(
                kind = %self.error,
                status = status.as_u16(),
                message = %self.message,
                "Request failed"
            );
        } else {
            warn!(
                kind = %self.error,
                status = status.as_u16(),
                message = %self.message,
                "Request rejected"
            );
        }
        let body = axum::Json(self);
        (status, body).into_response()
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ServiceError {
    #[error("Not Found: {0}")]
    NotFound(String),
    #[error("Invalid Input: {0}")]
    InvalidInput(String),
    #[error("Already Exists: {0}")]
    AlreadyExists(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Terminal State: {0}")]
    TerminalState(String),
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Invalid Amount: {0}")]
    InvalidAmount(String),
    #[error("Provider Error: {0}")]
    ProviderError(String),
    #[error("Internal Error: {0}")]
    InternalError(String),
}

// Allow conversion from RepositoryError to ServiceError
impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(msg) => ServiceError::NotFound(msg),
            RepositoryError::ValidationError(msg) => ServiceError::InvalidInput(msg),
            RepositoryError::AlreadyExists(msg) => ServiceError::AlreadyExists(msg),
            RepositoryError::DatabaseError(msg) => ServiceError::InternalError(msg),
            RepositoryError::ConnectionError(msg) => ServiceError::InternalError(msg),
            RepositoryError::SerializationError(msg) => ServiceError::InternalError(msg),
        }
    }
}

impl From<TransitionError> for ServiceError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::Terminal(_) => ServiceError::TerminalState(err.to_string()),
            TransitionError::Backward { .. } => ServiceError::InvalidInput(err.to_string()),
        }
    }
}

impl From<JwtError> for ServiceError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::EncodingFailed(msg) => {
                ServiceError::InternalError(format!("JWT error: {}", msg))
            }
            other => ServiceError::Unauthenticated(other.to_string()),
        }
    }
}

impl From<ServiceError> for HandlerError {
    fn from(err: ServiceError) -> Self {
        let kind = match &err {
            ServiceError::NotFound(_) => HandlerErrorKind::NotFound,
            ServiceError::InvalidInput(_) | ServiceError::InvalidAmount(_) => {
                HandlerErrorKind::BadRequest
            }
            ServiceError::AlreadyExists(_)
            | ServiceError::Conflict(_)
            | ServiceError::TerminalState(_) => HandlerErrorKind::Conflict,
            ServiceError::Unauthenticated(_) => HandlerErrorKind::Unauthorized,
            ServiceError::Forbidden(_) => HandlerErrorKind::Forbidden,
            ServiceError::ProviderError(_) => HandlerErrorKind::BadGateway,
            ServiceError::InternalError(_) => HandlerErrorKind::Internal,
        };
        // Store internals stay in the logs, not in the response body.
        let message = match &err {
            ServiceError::InternalError(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };
        if let ServiceError::InternalError(msg) = &err {
            error!("Internal error: {}", msg);
        }
        HandlerError::new(kind, message)
    }
}
