//! Error types for registration and request handling.
//!
//! Two families exist and they never mix:
//!
//! - [`RouterError`] is raised while a handler tree is being built. It is
//!   fatal for the provider being registered and is returned from
//!   [`crate::router::new_handler`].
//! - [`ResourceError`] is raised while a request is being handled. It is
//!   scoped to that single request and is handed back to the caller through
//!   the request's future.

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

/// Category of a request-time failure.
///
/// Each kind maps onto the HTTP status code a transport would most likely
/// use to report it, so that adapters sitting above this crate do not need
/// their own translation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    BadRequest,
    Forbidden,
    NotFound,
    Conflict,
    PreconditionFailed,
    NotSupported,
    ServiceUnavailable,
    Internal,
}

impl ErrorKind {
    /// HTTP-style status code for this kind
    #[must_use]
    pub fn code(self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::PreconditionFailed => 412,
            ErrorKind::Internal => 500,
            ErrorKind::NotSupported => 501,
            ErrorKind::ServiceUnavailable => 503,
        }
    }

    /// Short human readable reason phrase
    #[must_use]
    pub fn reason(self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "Bad Request",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::NotFound => "Not Found",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::PreconditionFailed => "Precondition Failed",
            ErrorKind::Internal => "Internal Server Error",
            ErrorKind::NotSupported => "Not Implemented",
            ErrorKind::ServiceUnavailable => "Service Unavailable",
        }
    }
}

/// Typed failure of a single resource operation.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}: {}", .kind.reason(), .message)]
pub struct ResourceError {
    kind: ErrorKind,
    message: String,
    detail: Option<Value>,
}

impl ResourceError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: None,
        }
    }

    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    #[must_use]
    pub fn precondition_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PreconditionFailed, message)
    }

    #[must_use]
    pub fn not_supported(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotSupported, message)
    }

    #[must_use]
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServiceUnavailable, message)
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Attach structured detail, replacing any previous detail
    #[must_use]
    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = Some(detail);
        self
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[must_use]
    pub fn code(&self) -> u16 {
        self.kind.code()
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn detail(&self) -> Option<&Value> {
        self.detail.as_ref()
    }

    /// Render as the JSON error body transports send to clients
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "code": self.code(),
            "reason": self.kind.reason(),
            "message": self.message,
        });
        if let (Some(detail), Some(obj)) = (&self.detail, body.as_object_mut()) {
            obj.insert("detail".to_string(), detail.clone());
        }
        body
    }
}

/// Failure while building a handler tree from a provider.
#[derive(Debug, Error)]
pub enum RouterError {
    /// The provider declares no variant and implements no capability.
    #[error("cannot deduce provider variant for '{provider}'")]
    CannotDeduceVariant { provider: String },

    /// A sub-path accessor failed while the tree was being assembled.
    #[error("could not construct handler tree at '{path}'")]
    HandlerTree {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// Sub-path nesting exceeded the configured maximum depth.
    #[error("handler tree at '{path}' exceeds the maximum depth of {max_depth}")]
    TooDeep { path: String, max_depth: usize },

    /// A route pattern could not be parsed.
    #[error("invalid route pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

impl RouterError {
    pub(crate) fn handler_tree(path: &str, source: anyhow::Error) -> Self {
        RouterError::HandlerTree {
            path: path.to_string(),
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_codes() {
        assert_eq!(ErrorKind::BadRequest.code(), 400);
        assert_eq!(ErrorKind::NotFound.code(), 404);
        assert_eq!(ErrorKind::NotSupported.code(), 501);
        assert_eq!(ErrorKind::ServiceUnavailable.code(), 503);
    }

    #[test]
    fn test_display_includes_reason_and_message() {
        let err = ResourceError::not_found("Resource 'users/7' not found");
        assert_eq!(err.to_string(), "Not Found: Resource 'users/7' not found");
    }

    #[test]
    fn test_to_json_includes_detail_only_when_present() {
        let plain = ResourceError::conflict("revision mismatch").to_json();
        assert_eq!(plain["code"], 409);
        assert!(plain.get("detail").is_none());

        let detailed = ResourceError::bad_request("bad field")
            .with_detail(json!({"field": "age"}))
            .to_json();
        assert_eq!(detailed["detail"]["field"], "age");
        assert_eq!(detailed["reason"], "Bad Request");
    }

    #[test]
    fn test_handler_tree_keeps_source() {
        let err = RouterError::handler_tree("users/roles", anyhow::anyhow!("accessor exploded"));
        assert_eq!(
            err.to_string(),
            "could not construct handler tree at 'users/roles'"
        );
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("accessor exploded"));
    }
}
