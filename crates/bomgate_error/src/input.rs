//! Caller input validation errors.

/// Raised when a caller hands the gateway malformed input, such as an empty
/// resource identifier. These are never retried.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Invalid Input: {} at line {} in {}", message, line, file)]
pub struct InvalidInputError {
    /// What was wrong with the input
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl InvalidInputError {
    /// Create a new InvalidInputError at the current location.
    ///
    /// # Examples
    ///
    /// ```
    /// use bomgate_error::InvalidInputError;
    ///
    /// let err = InvalidInputError::new("resource id is empty");
    /// assert!(format!("{}", err).contains("resource id is empty"));
    /// ```
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
