use std::path::PathBuf;

use crate::config::ConfigError;
use crate::http::{IntoResponse, Json, Response, StatusCode};

/// Helper to create a JSON error response with a standard `{ "error": message }` body.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = serde_json::json!({ "error": message.into() });
    (status, Json(body)).into_response()
}

/// Request-time error that middleware and actions can return to short-circuit
/// a handler chain.
pub enum HttpError {
    NotFound(String),
    Unauthorized(String),
    Forbidden(String),
    BadRequest(String),
    Internal(String),
}

impl HttpError {
    pub fn status(&self) -> StatusCode {
        match self {
            HttpError::NotFound(_) => StatusCode::NOT_FOUND,
            HttpError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            HttpError::Forbidden(_) => StatusCode::FORBIDDEN,
            HttpError::BadRequest(_) => StatusCode::BAD_REQUEST,
            HttpError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            HttpError::NotFound(msg)
            | HttpError::Unauthorized(msg)
            | HttpError::Forbidden(msg)
            | HttpError::BadRequest(msg)
            | HttpError::Internal(msg) => msg,
        };
        error_response(status, message)
    }
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpError::NotFound(msg) => write!(f, "Not Found: {msg}"),
            HttpError::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            HttpError::Forbidden(msg) => write!(f, "Forbidden: {msg}"),
            HttpError::BadRequest(msg) => write!(f, "Bad Request: {msg}"),
            HttpError::Internal(msg) => write!(f, "Internal Error: {msg}"),
        }
    }
}

impl std::fmt::Debug for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        <Self as std::fmt::Display>::fmt(self, f)
    }
}

/// Error aborting a [`Loader::load`](crate::Loader::load) pass.
///
/// Expected skips (unregistered module, missing annotation, opt-out
/// constructor, collector veto) are not errors and never surface here.
#[derive(Debug)]
pub enum LoadError {
    /// The scan root or one of its entries could not be read.
    Walk {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The router has no registration function for this verb.
    UnsupportedMethod { method: String, path: String },
    /// The router refused the path (e.g. no leading `/`).
    InvalidPath(String),
    /// The same verb and path were registered twice.
    DuplicateRoute { method: String, path: String },
    /// `path` names a capture differently from an already registered route
    /// at the same position.
    ConflictingRoute { path: String, existing: String },
    /// An action was declared against a different controller type than the
    /// one it was registered on.
    HandlerMismatch { controller: String, action: String },
    /// Loader settings could not be applied.
    Config(ConfigError),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Walk { path, source } => {
                write!(f, "Failed to read {}: {source}", path.display())
            }
            LoadError::UnsupportedMethod { method, path } => {
                write!(f, "Router does not support method '{method}' (route {path})")
            }
            LoadError::InvalidPath(path) => write!(f, "Invalid route path: '{path}'"),
            LoadError::DuplicateRoute { method, path } => {
                write!(f, "Route already registered: {method} {path}")
            }
            LoadError::ConflictingRoute { path, existing } => {
                write!(f, "Route {path} conflicts with registered route {existing}")
            }
            LoadError::HandlerMismatch { controller, action } => {
                write!(
                    f,
                    "Action '{action}' cannot be bound to an instance of controller '{controller}'"
                )
            }
            LoadError::Config(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Walk { source, .. } => Some(source),
            LoadError::Config(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for LoadError {
    fn from(err: ConfigError) -> Self {
        LoadError::Config(err)
    }
}
