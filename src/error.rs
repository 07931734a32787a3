//! Error taxonomy of the request pipeline and its mapping onto HTTP status codes.

use hyper::{Response, StatusCode};
use thiserror::Error;

use crate::http::range::RangeError;
use crate::http::response::{self, Body};

/// Errors that can occur while serving a request.
///
/// The `Display` text is for logs only; responses carry nothing but the status line
/// reason, so internal paths never reach the client.
#[derive(Debug, Error)]
pub enum FilemanError {
    /// The request path could not be decoded.
    #[error("invalid request path: {0}")]
    InvalidPath(String),

    /// The request path resolves outside the served root.
    #[error("path escapes the served root: {0}")]
    PathEscape(String),

    /// The Range header was malformed or unsatisfiable.
    #[error(transparent)]
    Range(#[from] RangeError),

    /// Nothing exists at the requested path.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request expects a file where a folder exists, or the reverse.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The request cannot be carried out as sent.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// No installed extractor supports the requested ranges.
    #[error("no extractor supports range {0}")]
    UnsupportedRange(String),

    /// The verb is neither built in nor registered as an extension.
    #[error("method not allowed: {0}")]
    MethodNotAllowed(String),

    /// The request body exceeds the configured limit.
    #[error("payload exceeds {0} bytes")]
    PayloadTooLarge(u64),

    /// Multipart body decoding failed.
    #[error("multipart error: {0}")]
    Multipart(#[from] multer::Error),

    /// Underlying read, write or delete failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FilemanError {
    /// HTTP status the error is answered with
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidPath(_) | Self::BadRequest(_) | Self::Multipart(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Range(RangeError::Malformed(_)) => StatusCode::BAD_REQUEST,
            Self::Range(RangeError::Unsatisfiable { .. }) => StatusCode::RANGE_NOT_SATISFIABLE,
            Self::PathEscape(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::UnsupportedRange(_) => StatusCode::NOT_IMPLEMENTED,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Render the error as a response
    ///
    /// `allow` is the verb list sent with 405 responses.
    pub fn into_response(self, allow: &str) -> Response<Body> {
        match self {
            Self::Range(RangeError::Unsatisfiable { length }) => {
                response::build_416_response(length)
            }
            Self::MethodNotAllowed(_) => response::build_405_response(allow),
            other => response::build_error_response(other.status()),
        }
    }
}
