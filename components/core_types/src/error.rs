//! JavaScript error types and error handling.
//!
//! This module provides the error objects the runtime itself creates. They
//! never escape as Rust failures from the promise machinery; instead they are
//! wrapped into a [`Value`](crate::Value) and used as rejection reasons.

use std::fmt;
use thiserror::Error;

/// The kind of JavaScript error.
///
/// These correspond to JavaScript's built-in error constructors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Type error (e.g., resolving a promise with itself)
    TypeError,
    /// Value out of allowed range
    RangeError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::TypeError => "TypeError",
            ErrorKind::RangeError => "RangeError",
        };
        f.write_str(name)
    }
}

/// A JavaScript error with a kind and message.
///
/// # Examples
///
/// ```
/// use core_types::{JsError, ErrorKind};
///
/// let error = JsError::new(ErrorKind::TypeError, "undefined is not a function");
///
/// assert_eq!(error.message, "undefined is not a function");
/// assert_eq!(error.to_string(), "TypeError: undefined is not a function");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct JsError {
    /// The type of error
    pub kind: ErrorKind,
    /// Human-readable error message
    pub message: String,
}

impl JsError {
    /// Creates an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Creates a `TypeError`.
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeError, message)
    }

    /// The error a promise is rejected with when it is resolved with itself.
    pub fn self_resolution() -> Self {
        Self::type_error("promise and its resolution value are identical")
    }

    /// The error a promise is rejected with when thenable adoption loops.
    pub fn thenable_cycle() -> Self {
        Self::type_error("thenable cycle detected during resolution")
    }

    /// The error a promise is rejected with when an adoption chain runs past
    /// the configured step limit.
    pub fn adoption_limit(limit: usize) -> Self {
        Self::new(
            ErrorKind::RangeError,
            format!("thenable adoption chain exceeded {} steps", limit),
        )
    }

    /// Returns true if this is the self-resolution error.
    pub fn is_self_resolution(&self) -> bool {
        *self == Self::self_resolution()
    }

    /// Returns true if this is the thenable cycle error.
    pub fn is_thenable_cycle(&self) -> bool {
        *self == Self::thenable_cycle()
    }
}
