//! [`JWS`] or JSON Web Signature as defined in [`rfc7515`]
//!
//! A signed message is built with a [`JWSBuilder`] and a [`Signer`],
//! which produces one of the three wire forms: [`JWSCompact`],
//! [`JWSFlattened`] or the general [`JWS`]. Any of these forms can be
//! parsed back into a [`Message`] and checked with a [`Verifier`].
//!
//! Verification fails closed: whatever went wrong (unknown algorithm,
//! wrong or missing key, tampered data), the caller only ever sees a
//! single [`ErrorKind::VerificationFailed`] error.
//!
//! [`JWS`]: https://datatracker.ietf.org/doc/html/rfc7515
//! [`rfc7515`]: https://datatracker.ietf.org/doc/html/rfc7515
//! [`ErrorKind::VerificationFailed`]: crate::error::ErrorKind::VerificationFailed

use jwx_utils::macros::generate_set_and_with;

use super::header::{Headers, header_fields};
use super::jwa::SignatureAlgorithm;
use super::jwk::{Key, KeySet};
use crate::error::Result;

mod algorithm;
mod builder;
mod message;
mod serialization;
mod verify;

pub use algorithm::AlgorithmBinding;
pub use builder::{ChainedJWSBuilder, JWSBuilder, KeySigner, Signer};
pub use message::{Message, Signature};
pub use serialization::{JWS, JWSCompact, JWSFlattened};
pub use verify::{DefaultKeyAcceptor, KeyAcceptor, KeySetVerifier, KeyVerifier, Verifier};

header_fields! {
    /// Registered header parameters of a JWS, see section 4.1 of [`rfc7515`].
    ///
    /// [`rfc7515`]: https://datatracker.ietf.org/doc/html/rfc7515#section-4.1
    pub struct SignatureFields {
        alg: SignatureAlgorithm => "alg",
        cty: String => "cty",
        crit: Vec<String> => "crit",
        jwk: Box<Key> => "jwk",
        jku: String => "jku",
        kid: String => "kid",
        typ: String => "typ",
    }
}

/// The protected or unprotected headers of a JWS [`Signature`].
pub type SignatureHeaders = Headers<SignatureFields>;

impl Headers<SignatureFields> {
    /// The "alg" (algorithm) header.
    pub fn algorithm(&self) -> Option<SignatureAlgorithm> {
        self.fields.alg
    }

    /// The "cty" (content type) header.
    pub fn content_type(&self) -> Option<&str> {
        self.fields.cty.as_deref()
    }

    /// The "crit" (critical) header.
    pub fn critical(&self) -> Option<&[String]> {
        self.fields.crit.as_deref()
    }

    /// The "jwk" (json web key) header.
    pub fn jwk(&self) -> Option<&Key> {
        self.fields.jwk.as_deref()
    }

    /// The "jku" (jwk set url) header.
    pub fn jwk_set_url(&self) -> Option<&str> {
        self.fields.jku.as_deref()
    }

    /// The "kid" (key id) header.
    pub fn key_id(&self) -> Option<&str> {
        self.fields.kid.as_deref()
    }

    /// The "typ" (type) header.
    pub fn typ(&self) -> Option<&str> {
        self.fields.typ.as_deref()
    }

    generate_set_and_with! {
        /// Set the "alg" header
        pub fn algorithm(mut self, alg: Option<SignatureAlgorithm>) -> Self {
            self.fields.alg = alg;
            self
        }
    }

    generate_set_and_with! {
        /// Set the "cty" header
        pub fn content_type(mut self, cty: Option<String>) -> Self {
            self.fields.cty = cty;
            self
        }
    }

    generate_set_and_with! {
        /// Set the "crit" header
        pub fn critical(mut self, crit: Option<Vec<String>>) -> Self {
            self.fields.crit = crit;
            self
        }
    }

    generate_set_and_with! {
        /// Set the "jwk" header
        ///
        /// Only embed public keys here, this header is sent along with the signature.
        pub fn jwk(mut self, jwk: Option<Key>) -> Self {
            self.fields.jwk = jwk.map(Box::new);
            self
        }
    }

    generate_set_and_with! {
        /// Set the "jku" header
        pub fn jwk_set_url(mut self, jku: Option<String>) -> Self {
            self.fields.jku = jku;
            self
        }
    }

    generate_set_and_with! {
        /// Set the "kid" header
        pub fn key_id(mut self, kid: Option<String>) -> Self {
            self.fields.kid = kid;
            self
        }
    }

    generate_set_and_with! {
        /// Set the "typ" header
        pub fn typ(mut self, typ: Option<String>) -> Self {
            self.fields.typ = typ;
            self
        }
    }
}

/// Sign `payload` with `alg` and `key` into its compact serialization.
///
/// Use a [`JWSBuilder`] to set more headers, or for the JSON serializations.
pub fn sign(payload: impl AsRef<[u8]>, alg: SignatureAlgorithm, key: &Key) -> Result<JWSCompact> {
    JWSBuilder::new()
        .with_payload(payload)
        .build_compact(&KeySigner::new(alg, key.clone()))
}

/// Verify a JWS in any serialization with `alg` and `key`, returning its payload.
///
/// The message verifies if at least one of its signatures does.
pub fn verify(src: &str, alg: SignatureAlgorithm, key: &Key) -> Result<Vec<u8>> {
    let message = Message::parse(src)?;
    message.verify(&KeyVerifier::new(alg, key.clone()))?;
    Ok(message.into_payload())
}

/// Verify a JWS in any serialization against the keys of `keys`, returning its payload.
///
/// Candidate keys are filtered by the [`DefaultKeyAcceptor`] and by key id,
/// see [`KeySetVerifier`] to use another acceptor.
pub fn verify_with_key_set(src: &str, keys: &KeySet) -> Result<Vec<u8>> {
    let message = Message::parse(src)?;
    message.verify(&KeySetVerifier::new(keys.clone()))?;
    Ok(message.into_payload())
}
