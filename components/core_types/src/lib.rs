//! Core JavaScript value types and error handling.
//!
//! This crate provides the foundational types shared by the runtime
//! components: the dynamic value model and the error objects the runtime
//! creates.
//!
//! # Overview
//!
//! - [`Value`] - Tagged representation of JavaScript values
//! - [`JsObject`] / [`JsFunction`] - Reference-identity objects and callables
//! - [`JsError`] - Errors created by the runtime
//! - [`ErrorKind`] - Types of JavaScript errors
//!
//! # Examples
//!
//! ```
//! use core_types::{ErrorKind, JsError, JsObject, Value};
//!
//! // Create JavaScript values
//! let num = Value::Smi(42);
//! assert!(num.is_truthy());
//! assert_eq!(num.type_of(), "number");
//!
//! let obj = Value::Object(JsObject::new().with("then", 1));
//! assert!(obj.is_object_like());
//!
//! // Create an error
//! let error = JsError::new(ErrorKind::TypeError, "undefined is not a function");
//! assert_eq!(error.kind, ErrorKind::TypeError);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod value;

pub use error::{ErrorKind, JsError};
pub use value::{HostObject, JsFunction, JsObject, JsResult, Property, Value};
