//! Error types for the bomgate catalog gateway.
//!
//! This crate provides the error types shared by every bomgate crate.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! Failures coming back from the remote catalog service are represented by
//! [`TransportError`], which classifies itself as rate-limited, transient or
//! fatal through the [`ClassifyFailure`] trait. The gateway maps that class onto
//! the matching [`GatewayErrorKind`] variant when it gives up on an operation.
//!
//! # Examples
//!
//! ```
//! use bomgate_error::{GatewayResult, InvalidInputError};
//!
//! fn check_id(id: &str) -> GatewayResult<()> {
//!     if id.trim().is_empty() {
//!         Err(InvalidInputError::new("resource id is empty"))?
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_id("  ").is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod exhausted;
mod input;
mod transport;

pub use config::ConfigError;
pub use error::{GatewayError, GatewayErrorKind, GatewayResult};
pub use exhausted::ExhaustedError;
pub use input::InvalidInputError;
pub use transport::{ClassifyFailure, FailureClass, TransportError, TransportErrorKind};
