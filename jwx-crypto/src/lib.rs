//! Crypto primitives used by jwx.
//!
//! This includes:
//! - Javascript object signing (JOSE): JWA, JWK, JWS and JWT
//! - Public, private and symmetric keys with their JSON wire encoding
//! - Signing and verification backed by [`aws-lc-rs`]
//!
//! [`aws-lc-rs`]: https://docs.rs/aws-lc-rs

#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(test, allow(clippy::float_cmp))]
#![cfg_attr(not(test), warn(clippy::print_stdout, clippy::dbg_macro))]

pub mod error;
pub mod jose;

pub mod dep {
    //! Dependencies for jwx crypto modules.
    //!
    //! Exported for your convenience

    pub mod aws_lc_rs {
        //! Re-export of the [`aws-lc-rs`] crate.
        //!
        //! [`aws-lc-rs`]: https://docs.rs/aws-lc-rs

        #[doc(inline)]
        pub use aws_lc_rs::*;
    }

    pub mod num_bigint {
        //! Re-export of the [`num-bigint`] crate.
        //!
        //! [`num-bigint`]: https://docs.rs/num-bigint

        #[doc(inline)]
        pub use num_bigint::*;
    }

    pub mod serde_json {
        //! Re-export of the [`serde_json`] crate.
        //!
        //! [`serde_json`]: https://docs.rs/serde_json

        #[doc(inline)]
        pub use serde_json::*;
    }
}
