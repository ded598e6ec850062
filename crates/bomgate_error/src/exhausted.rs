//! Retry exhaustion error.

/// Synthetic failure for an operation that ran out of attempts without
/// recording a more specific error.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display(
    "Retries Exhausted: operation '{}' gave up after {} attempts at line {} in {}",
    operation,
    attempts,
    line,
    file
)]
pub struct ExhaustedError {
    /// Name of the operation that gave up
    pub operation: String,
    /// Number of attempts made
    pub attempts: u32,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ExhaustedError {
    /// Create a new ExhaustedError at the current location.
    #[track_caller]
    pub fn new(operation: impl Into<String>, attempts: u32) -> Self {
        let location = std::panic::Location::caller();
        Self {
            operation: operation.into(),
            attempts,
            line: location.line(),
            file: location.file(),
        }
    }
}
