//! Transport-agnostic failures raised by the domain services.
//!
//! The HTTP adapter picks a status code from [`ErrorCode`] and serialises the
//! error as `{ "error", "code", "traceId"?, "details"? }`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::TraceId;

/// Failure category shared by every service operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Malformed input or a value outside the accepted set.
    InvalidRequest,
    /// No caller identity on the request.
    Unauthorized,
    /// The caller's role does not allow the action.
    Forbidden,
    /// Unknown vehicle, deposit, user or notification.
    NotFound,
    /// Reserved vehicle or an illegal status transition.
    Conflict,
    /// Collaborator missing from configuration or unreachable.
    ServiceUnavailable,
    /// The payment gateway refused the call or answered nonsense.
    UpstreamFailure,
    /// Anything else.
    InternalError,
}

impl ErrorCode {
    /// Message used when a caller supplies a blank one.
    pub const fn fallback_message(self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid request",
            Self::Unauthorized => "login required",
            Self::Forbidden => "action not permitted",
            Self::NotFound => "not found",
            Self::Conflict => "conflicting state",
            Self::ServiceUnavailable => "service unavailable",
            Self::UpstreamFailure => "payment gateway failure",
            Self::InternalError => "internal server error",
        }
    }
}

/// A payload read from the wire broke the error invariants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorPayloadError {
    /// `error` was blank.
    #[error("error message must not be empty")]
    EmptyMessage,
    /// `traceId` was present but blank.
    #[error("trace identifier must not be empty")]
    EmptyTraceId,
}

/// A domain failure with an optional correlation id and structured details.
///
/// The message is never blank: constructors substitute
/// [`ErrorCode::fallback_message`] for whitespace-only input.
///
/// ```
/// use showroom::domain::{Error, ErrorCode};
///
/// let err = Error::conflict("vehicle 7 is already reserved");
/// assert_eq!(err.code(), ErrorCode::Conflict);
/// assert_eq!(Error::forbidden("  ").message(), "action not permitted");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireError", into = "WireError")]
pub struct Error {
    code: ErrorCode,
    message: String,
    trace_id: Option<String>,
    details: Option<Value>,
}

macro_rules! error_constructors {
    ($($name:ident => $code:ident),+ $(,)?) => {
        $(
            #[doc = concat!("Shorthand for [`ErrorCode::", stringify!($code), "`].")]
            pub fn $name(message: impl Into<String>) -> Self {
                Self::new(ErrorCode::$code, message)
            }
        )+
    };
}

impl Error {
    /// Build an error, tagging it with the trace id of the current request.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        let mut message = message.into();
        if message.trim().is_empty() {
            message = code.fallback_message().to_owned();
        }
        Self {
            code,
            message,
            trace_id: TraceId::current().map(|id| id.to_string()),
            details: None,
        }
    }

    error_constructors! {
        invalid_request => InvalidRequest,
        unauthorized => Unauthorized,
        forbidden => Forbidden,
        not_found => NotFound,
        conflict => Conflict,
        service_unavailable => ServiceUnavailable,
        upstream_failure => UpstreamFailure,
        internal => InternalError,
    }

    /// Failure category.
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// Client-facing message; never blank.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Correlation id of the request that raised the error.
    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    /// Structured context such as the offending vehicle.
    pub const fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Replace the trace id. Blank ids leave the error untouched.
    #[must_use]
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        let trace_id = trace_id.into();
        if !trace_id.trim().is_empty() {
            self.trace_id = Some(trace_id);
        }
        self
    }

    /// Attach structured details, e.g. the accepted deposit percentages.
    ///
    /// ```
    /// use serde_json::json;
    /// use showroom::domain::Error;
    ///
    /// let err = Error::invalid_request("unsupported deposit percentage")
    ///     .with_details(json!({ "allowed": [10, 20, 30, 40, 50, 100] }));
    /// assert!(err.details().is_some());
    /// ```
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for Error {}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireError {
    error: String,
    code: ErrorCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    trace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl From<Error> for WireError {
    fn from(err: Error) -> Self {
        Self {
            error: err.message,
            code: err.code,
            trace_id: err.trace_id,
            details: err.details,
        }
    }
}

impl TryFrom<WireError> for Error {
    type Error = ErrorPayloadError;

    fn try_from(wire: WireError) -> Result<Self, Self::Error> {
        if wire.error.trim().is_empty() {
            return Err(ErrorPayloadError::EmptyMessage);
        }
        if wire.trace_id.as_deref().is_some_and(|id| id.trim().is_empty()) {
            return Err(ErrorPayloadError::EmptyTraceId);
        }
        Ok(Self {
            code: wire.code,
            message: wire.error,
            trace_id: wire.trace_id,
            details: wire.details,
        })
    }
}

#[cfg(test)]
mod tests;
