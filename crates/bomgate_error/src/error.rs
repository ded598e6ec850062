//! Top-level error wrapper types.

use crate::{
    ClassifyFailure, ConfigError, ExhaustedError, FailureClass, InvalidInputError, TransportError,
};

/// Everything a gateway call can fail with.
///
/// The three transport variants carry the original error returned by the
/// wrapped call, so callers always see what the server actually said.
///
/// # Examples
///
/// ```
/// use bomgate_error::{GatewayError, InvalidInputError};
///
/// let err: GatewayError = InvalidInputError::new("empty id").into();
/// assert!(format!("{}", err).contains("Invalid Input"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum GatewayErrorKind {
    /// Server-side throttling that outlasted the retry budget
    RateLimited(TransportError),
    /// Retryable failure that outlasted the retry budget
    Transient(TransportError),
    /// Non-retryable failure reported by the transport
    Fatal(TransportError),
    /// Attempts ran out without a more specific error
    #[from(ExhaustedError)]
    Exhausted(ExhaustedError),
    /// Malformed caller input, rejected before any network call
    #[from(InvalidInputError)]
    InvalidInput(InvalidInputError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
}

/// Gateway error with kind discrimination.
///
/// # Examples
///
/// ```
/// use bomgate_error::{GatewayError, GatewayResult, ConfigError};
///
/// fn might_fail() -> GatewayResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// match might_fail() {
///     Ok(_) => println!("Success"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Gateway Error: {}", _0)]
pub struct GatewayError(Box<GatewayErrorKind>);

impl GatewayError {
    /// Create a new error from a kind.
    pub fn new(kind: GatewayErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Wrap a transport failure in the variant matching its classification.
    pub fn from_transport(err: TransportError) -> Self {
        let kind = match err.failure_class() {
            FailureClass::RateLimited => GatewayErrorKind::RateLimited(err),
            FailureClass::Transient => GatewayErrorKind::Transient(err),
            FailureClass::Fatal => GatewayErrorKind::Fatal(err),
        };
        Self::new(kind)
    }

    /// Get the error kind.
    pub fn kind(&self) -> &GatewayErrorKind {
        &self.0
    }

    /// The underlying transport error, if this failure came from the remote service.
    pub fn transport(&self) -> Option<&TransportError> {
        match self.kind() {
            GatewayErrorKind::RateLimited(err)
            | GatewayErrorKind::Transient(err)
            | GatewayErrorKind::Fatal(err) => Some(err),
            _ => None,
        }
    }

    /// Check whether the server was throttling us when we gave up.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self.kind(), GatewayErrorKind::RateLimited(_))
    }
}

// Generic From implementation for any type that converts to GatewayErrorKind
impl<T> From<T> for GatewayError
where
    T: Into<GatewayErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for gateway operations.
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;
