//! Error types.

use std::io;

use hyper::header::InvalidHeaderValue;
use hyper::StatusCode;
use thiserror::Error;

/// Result type used by handlers and the application layer.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors returned from handlers and context helpers.
///
/// Every variant maps onto a response status through [`Error::status_code`],
/// which is what the default error handler uses.
#[derive(Debug, Error)]
pub enum Error {
    #[error("bad request")]
    BadRequest,

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("not found")]
    NotFound,

    #[error("invalid redirect code {0}")]
    InvalidRedirect(u16),

    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] InvalidHeaderValue),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Hyper(#[from] hyper::Error),
}

impl Error {
    /// The response status this error is reported with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest => StatusCode::BAD_REQUEST,
            Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::Forbidden => StatusCode::FORBIDDEN,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Error::InvalidRedirect(_)
            | Error::InvalidHeader(_)
            | Error::Json(_)
            | Error::Io(_)
            | Error::Hyper(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// A route could not be inserted into the router.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InsertError {
    #[error("expect path beginning with '/', found: '{0}'")]
    MissingLeadingSlash(String),

    #[error("parameters in '{0}' must be named")]
    UnnamedParam(String),

    #[error("parameter names in '{0}' may not contain ':' or '*'")]
    InvalidParamName(String),

    #[error("catch-all parameters are only allowed at the end of a path, found: '{0}'")]
    CatchAllNotLast(String),

    #[error("'{route}' conflicts with the existing segment '{existing}'")]
    Conflict { route: String, existing: String },
}
