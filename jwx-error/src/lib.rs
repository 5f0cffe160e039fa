//! Error utilities for jwx.
//!
//! The [`BoxError`] type is a type-erased error type that can be used to represent any error that
//! implements the `std::error::Error` trait. It is used for cases where it is usually not
//! that important what specific error type is returned, but rather that an error occurred.
//!
//! [`ErrorContext`] adds a human readable layer on top of an error (or a missing `Option` value),
//! and [`ErrorExt`] gives access to the chain of causes behind an error.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(test, allow(clippy::float_cmp))]
#![cfg_attr(not(test), warn(clippy::print_stdout, clippy::dbg_macro))]

/// Alias for a type-erased error type.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

mod ext;
pub use ext::{ErrorContext, ErrorExt, OpaqueError};
