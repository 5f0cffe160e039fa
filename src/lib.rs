//! JSON Object Signing for the 🦀 Rust language.
//!
//! jwx parses, builds and verifies the signing half of the JOSE family:
//!
//! | category | support list |
//! |-|-|
//! | ✅ [algorithms](crate::jose::jwa) | ✅ `HS256`..`HS512` ⸱ ✅ `RS256`..`RS512` ⸱ ✅ `PS256`..`PS512` ⸱ ✅ `ES256`..`ES512` ⸱ ✅ `none` <sup>(1)</sup> |
//! | ✅ [keys](crate::jose::jwk) | ✅ RSA ⸱ ✅ EC (P-256, P-384, P-521) ⸱ ✅ symmetric ⸱ ✅ [key sets](crate::jose::KeySet) ⸱ ✅ RFC 7638 thumbprints |
//! | ✅ [signatures](crate::jose::jws) | ✅ compact ⸱ ✅ flattened JSON ⸱ ✅ general JSON ⸱ ✅ multiple signatures |
//! | ✅ [tokens](crate::jose::jwt) | ✅ typed claims ⸱ ✅ expiry with clock skew ⸱ ✅ issuer, subject, audience and id checks |
//! | ❌ encryption | ❌ JWE <sup>(2)</sup> |
//!
//! > 🗒️ _Footnotes_
//! >
//! > * <sup>(1)</sup> `none` can be produced, but never verifies.
//! > * <sup>(2)</sup> Not planned.
//!
//! All cryptography is delegated to [`aws-lc-rs`](https://docs.rs/aws-lc-rs).
//!
//! # Example
//!
//! ```
//! use jwx::jose::{jws, jwt, NumericDate, SignatureAlgorithm, SymmetricKey, Token, VerifyOptions};
//!
//! let key = SymmetricKey::generate(32).unwrap().into();
//! let token = Token::new()
//!     .with_issuer("https://issuer.example".to_owned())
//!     .with_issued_at(NumericDate::now());
//!
//! let compact = token.sign(SignatureAlgorithm::HS256, &key).unwrap();
//! let parsed = jwt::parse_verify(compact.as_str(), SignatureAlgorithm::HS256, &key).unwrap();
//! parsed
//!     .verify(&VerifyOptions::new().with_issuer("https://issuer.example".to_owned()))
//!     .unwrap();
//!
//! // any other algorithm is refused, whatever the header says
//! assert!(jws::verify(compact.as_str(), SignatureAlgorithm::HS512, &key).is_err());
//! ```

#![doc(
    html_favicon_url = "https://raw.githubusercontent.com/jwx-rs/jwx/main/docs/img/logo.png"
)]
#![doc(html_logo_url = "https://raw.githubusercontent.com/jwx-rs/jwx/main/docs/img/logo.png")]
#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(test, allow(clippy::float_cmp))]
#![cfg_attr(not(test), warn(clippy::print_stdout, clippy::dbg_macro))]

#[doc(inline)]
pub use ::jwx_crypto::jose;

pub mod error {
    //! Error types of jwx.
    //!
    //! [`Error`] is what every jose operation returns, [`ErrorKind`] the
    //! stable category to match on. The generic helpers used to build
    //! and inspect error chains come from `jwx-error`.

    #[doc(inline)]
    pub use ::jwx_crypto::error::{Error, ErrorKind, Result};

    #[doc(inline)]
    pub use ::jwx_error::{BoxError, ErrorContext, ErrorExt, OpaqueError};
}

pub mod utils {
    //! Utilities used by the jwx crates.

    #[doc(inline)]
    pub use ::jwx_utils::*;
}

pub mod crypto {
    //! The `jwx-crypto` crate, including its dependency re-exports.

    #[doc(inline)]
    pub use ::jwx_crypto::*;
}
