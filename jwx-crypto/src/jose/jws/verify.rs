use std::fmt;

use jwx_error::BoxError;
use jwx_utils::macros::generate_set_and_with;

use super::{AlgorithmBinding, Signature};
use crate::error::{Error, Result};
use crate::jose::jwa::SignatureAlgorithm;
use crate::jose::jwk::{Key, KeySet, USE_ENCRYPTION, USE_SIGNATURE};

/// Checks the signatures of a decoded [`Message`].
///
/// [`Message`]: super::Message
pub trait Verifier {
    type Error: Into<BoxError>;

    /// Verify the `signatures` over the decoded `payload`.
    ///
    /// Each [`Signature`] carries its own signing input,
    /// the payload is given for verifiers that look at its content.
    fn verify(&self, payload: &[u8], signatures: &[Signature]) -> Result<(), Self::Error>;
}

#[derive(Debug, Clone, PartialEq)]
/// [`Verifier`] for one known [`SignatureAlgorithm`] and [`Key`].
///
/// A message passes if any of its signatures is made with exactly that
/// algorithm and verifies with the key. The "alg" header is never trusted
/// to pick another algorithm.
pub struct KeyVerifier {
    alg: SignatureAlgorithm,
    key: Key,
}

impl KeyVerifier {
    /// Create a verifier for signatures made with `alg` and `key`.
    #[must_use]
    pub fn new(alg: SignatureAlgorithm, key: Key) -> Self {
        Self { alg, key }
    }

    /// The required algorithm.
    pub fn algorithm(&self) -> SignatureAlgorithm {
        self.alg
    }

    /// The key signatures are verified with.
    pub fn key(&self) -> &Key {
        &self.key
    }
}

impl Verifier for KeyVerifier {
    type Error = Error;

    fn verify(&self, _payload: &[u8], signatures: &[Signature]) -> Result<()> {
        let binding = AlgorithmBinding::new(self.alg);
        for (index, signature) in signatures.iter().enumerate() {
            if signature.verifiable_algorithm() != Some(self.alg) {
                tracing::trace!(
                    index,
                    alg = self.alg.as_str(),
                    "skip jws signature with other or unverifiable algorithm"
                );
                continue;
            }
            if binding
                .verify(
                    signature.signing_input().as_bytes(),
                    signature.signature(),
                    Some(&self.key),
                )
                .is_ok()
            {
                tracing::trace!(index, alg = self.alg.as_str(), "jws signature verified");
                return Ok(());
            }
        }

        tracing::debug!(
            alg = self.alg.as_str(),
            signatures = signatures.len(),
            "no jws signature verified with key"
        );
        Err(Error::verification_failed())
    }
}

/// Decides which keys of a [`KeySet`] may be used by a [`KeySetVerifier`].
pub trait KeyAcceptor {
    /// Returns true if `key` may be used to verify a signature.
    fn accept(&self, key: &Key) -> bool;
}

impl<F> KeyAcceptor for F
where
    F: Fn(&Key) -> bool,
{
    fn accept(&self, key: &Key) -> bool {
        self(key)
    }
}

#[derive(Debug, Clone, Copy, Default)]
/// Accepts keys without a "use" parameter or with "sig" or "enc".
///
/// Keys declaring any other use are skipped.
pub struct DefaultKeyAcceptor;

impl KeyAcceptor for DefaultKeyAcceptor {
    fn accept(&self, key: &Key) -> bool {
        matches!(
            key.headers().key_use(),
            None | Some(USE_SIGNATURE | USE_ENCRYPTION)
        )
    }
}

#[derive(Clone)]
/// [`Verifier`] that looks up its keys in a [`KeySet`].
///
/// For each signature the algorithm comes from its "alg" header, and the
/// candidate keys are those that:
///
/// * have the same "kid" as the signature, if the signature has one;
/// * are accepted by the [`KeyAcceptor`];
/// * declare no "alg", or the same one as the signature.
///
/// A message passes if any signature verifies with any of its candidates.
pub struct KeySetVerifier<A = DefaultKeyAcceptor> {
    keys: KeySet,
    acceptor: A,
}

impl KeySetVerifier {
    /// Create a verifier for `keys` using the [`DefaultKeyAcceptor`].
    #[must_use]
    pub fn new(keys: KeySet) -> Self {
        Self {
            keys,
            acceptor: DefaultKeyAcceptor,
        }
    }
}

impl<A> KeySetVerifier<A> {
    /// Replace the [`KeyAcceptor`] of this verifier.
    pub fn with_acceptor<B: KeyAcceptor>(self, acceptor: B) -> KeySetVerifier<B> {
        KeySetVerifier {
            keys: self.keys,
            acceptor,
        }
    }

    /// The keys candidates are taken from.
    pub fn key_set(&self) -> &KeySet {
        &self.keys
    }

    generate_set_and_with! {
        /// Replace the [`KeySet`] of this verifier.
        pub fn key_set(mut self, keys: KeySet) -> Self {
            self.keys = keys;
            self
        }
    }
}

impl<A> fmt::Debug for KeySetVerifier<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeySetVerifier")
            .field("keys", &self.keys)
            .field("acceptor", &std::any::type_name::<A>())
            .finish()
    }
}

impl<A: KeyAcceptor> KeySetVerifier<A> {
    fn is_candidate(&self, key: &Key, kid: Option<&str>, alg: SignatureAlgorithm) -> bool {
        if kid.is_some() && key.key_id() != kid {
            return false;
        }
        if !self.acceptor.accept(key) {
            tracing::trace!(kid = key.key_id(), "key rejected by acceptor");
            return false;
        }
        match key.headers().algorithm() {
            Some(declared) if declared != alg.as_str() => {
                tracing::trace!(
                    kid = key.key_id(),
                    declared,
                    alg = alg.as_str(),
                    "key declared for another algorithm"
                );
                false
            }
            _ => true,
        }
    }
}

impl<A: KeyAcceptor> Verifier for KeySetVerifier<A> {
    type Error = Error;

    fn verify(&self, _payload: &[u8], signatures: &[Signature]) -> Result<()> {
        for (index, signature) in signatures.iter().enumerate() {
            let Some(alg) = signature.verifiable_algorithm() else {
                tracing::trace!(index, "skip jws signature without verifiable algorithm");
                continue;
            };
            let binding = AlgorithmBinding::new(alg);
            let kid = signature.key_id();

            for key in self
                .keys
                .iter()
                .filter(|key| self.is_candidate(key, kid, alg))
            {
                if binding
                    .verify(
                        signature.signing_input().as_bytes(),
                        signature.signature(),
                        Some(key),
                    )
                    .is_ok()
                {
                    tracing::trace!(
                        index,
                        alg = alg.as_str(),
                        kid = key.key_id(),
                        "jws signature verified with key set"
                    );
                    return Ok(());
                }
            }
        }

        tracing::debug!(
            keys = self.keys.len(),
            signatures = signatures.len(),
            "no jws signature verified with key set"
        );
        Err(Error::verification_failed())
    }
}
