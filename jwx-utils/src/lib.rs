//! utilities crate for jwx
//!
//! `jwx-utils` contains the declarative macros shared by the jwx crates:
//! builder setter families and strict, string-backed symbol enums.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(test, allow(clippy::float_cmp))]
#![cfg_attr(not(test), warn(clippy::print_stdout, clippy::dbg_macro))]

#[doc(hidden)]
#[macro_use]
pub mod macros;
