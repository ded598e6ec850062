//! Transport errors and failure classification.

/// How the gateway should react to a failed remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum FailureClass {
    /// The server is throttling us. Retry on the long backoff curve and enter cooldown.
    #[display("rate-limited")]
    RateLimited,
    /// Anything else that may succeed on a later attempt.
    #[display("transient")]
    Transient,
    /// Retrying cannot help (bad request, authentication, missing resource).
    #[display("fatal")]
    Fatal,
}

impl FailureClass {
    /// Check if failures of this class should be retried.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FailureClass::Fatal)
    }
}

/// Trait for errors that know how the gateway should treat them.
///
/// # Examples
///
/// ```
/// use bomgate_error::{ClassifyFailure, FailureClass, TransportError, TransportErrorKind};
///
/// let err = TransportError::new(TransportErrorKind::Status {
///     status_code: 429,
///     message: "slow down".to_string(),
/// });
///
/// assert_eq!(err.failure_class(), FailureClass::RateLimited);
/// assert!(err.failure_class().is_retryable());
/// ```
pub trait ClassifyFailure {
    /// Classify this failure.
    fn failure_class(&self) -> FailureClass;
}

/// Message fragments that mark a throttling response when no status code is available.
const RATE_LIMIT_MARKERS: [&str; 4] = ["toomanyrequests", "too many requests", "429", "rate limit"];

/// Failure conditions reported by a catalog transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum TransportErrorKind {
    /// The server answered with a non-success status code
    #[display("HTTP {} error: {}", status_code, message)]
    Status {
        /// HTTP status code
        status_code: u16,
        /// Error message
        message: String,
    },
    /// The server explicitly signalled throttling
    #[display("Rate limited: {}", _0)]
    RateLimited(String),
    /// The request did not complete in time
    #[display("Request timed out: {}", _0)]
    Timeout(String),
    /// Connection-level failure
    #[display("Network failure: {}", _0)]
    Network(String),
    /// The response could not be decoded
    #[display("Malformed response: {}", _0)]
    Decode(String),
    /// Anything the transport could not categorize
    #[display("{}", _0)]
    Other(String),
}

impl TransportErrorKind {
    /// Classify this failure.
    ///
    /// Status codes are authoritative. Message matching is only consulted for
    /// failures that carry no status code at all.
    pub fn failure_class(&self) -> FailureClass {
        match self {
            TransportErrorKind::RateLimited(_) => FailureClass::RateLimited,
            TransportErrorKind::Status { status_code, .. } => match *status_code {
                429 => FailureClass::RateLimited,
                400 | 401 | 403 | 404 | 405 | 409 | 410 | 422 => FailureClass::Fatal,
                _ => FailureClass::Transient,
            },
            TransportErrorKind::Timeout(_) => FailureClass::Transient,
            TransportErrorKind::Network(msg)
            | TransportErrorKind::Decode(msg)
            | TransportErrorKind::Other(msg) => {
                if mentions_rate_limit(msg) {
                    FailureClass::RateLimited
                } else {
                    FailureClass::Transient
                }
            }
        }
    }
}

fn mentions_rate_limit(message: &str) -> bool {
    let lowered = message.to_lowercase();
    RATE_LIMIT_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

/// Transport error with source location tracking.
///
/// # Examples
///
/// ```
/// use bomgate_error::{TransportError, TransportErrorKind};
///
/// let err = TransportError::new(TransportErrorKind::Network("connection reset".to_string()));
/// assert!(format!("{}", err).contains("connection reset"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Transport Error: {} at line {} in {}", kind, line, file)]
pub struct TransportError {
    /// The kind of error that occurred
    pub kind: TransportErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl TransportError {
    /// Create a new TransportError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: TransportErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Shorthand for a status-code failure.
    #[track_caller]
    pub fn status(status_code: u16, message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Status {
            status_code,
            message: message.into(),
        })
    }

    /// Get the error kind.
    pub fn kind(&self) -> &TransportErrorKind {
        &self.kind
    }
}

impl ClassifyFailure for TransportError {
    fn failure_class(&self) -> FailureClass {
        self.kind.failure_class()
    }
}
