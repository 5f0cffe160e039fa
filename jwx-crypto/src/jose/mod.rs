//! # JOSE: JSON Object Signing and Encryption
//!
//! JOSE is an IETF standard for securely transferring data between parties using JSON.
//! This module implements the signing half of it:
//!
//! * JWA (JSON Web Algorithms): the closed registry of key types, curves and
//!   signature algorithms. See [`rfc7518`].
//!
//! * JWK (JSON Web Key): a JSON format for representing cryptographic keys,
//!   and key sets of them. See [`rfc7517`].
//!
//! * JWS (JSON Web Signature): how to create and verify a digital signature for
//!   any data, in compact or JSON serialization. See [`rfc7515`].
//!
//! * JWT (JSON Web Token): a claims set carried as the payload of a JWS.
//!   See [`rfc7519`].
//!
//! The headers of all of these share one attribute container, [`Headers`],
//! with typed slots for the registered names and an open bag for everything else.
//!
//! Encryption (JWE) is not supported.
//!
//! [`rfc7515`]: https://datatracker.ietf.org/doc/html/rfc7515
//! [`rfc7517`]: https://datatracker.ietf.org/doc/html/rfc7517
//! [`rfc7518`]: https://datatracker.ietf.org/doc/html/rfc7518
//! [`rfc7519`]: https://datatracker.ietf.org/doc/html/rfc7519

mod constants;
mod der;
mod encoding;

pub mod header;
pub use header::{HeaderFields, Headers};

pub mod jwa;
pub use jwa::{EllipticCurve, KeyOperation, KeyType, SignatureAlgorithm};

pub mod jwk;
pub use jwk::{
    EcPrivateKey, EcPublicKey, Key, KeyHeaders, KeyMaterial, KeySet, RawKey, RsaPrivateKey,
    RsaPublicKey, SymmetricKey,
};

pub mod jws;
pub use jws::{
    JWS, JWSBuilder, JWSCompact, JWSFlattened, KeySetVerifier, KeySigner, KeyVerifier, Message,
    Signature, SignatureHeaders, Signer, Verifier,
};

pub mod jwt;
pub use jwt::{NumericDate, Token, VerifyOptions};
