use aws_lc_rs::{
    hmac,
    rand::SystemRandom,
    signature::{
        RSA_PKCS1_2048_8192_SHA256, RSA_PKCS1_2048_8192_SHA384, RSA_PKCS1_2048_8192_SHA512,
        RSA_PKCS1_SHA256, RSA_PKCS1_SHA384, RSA_PKCS1_SHA512, RSA_PSS_2048_8192_SHA256,
        RSA_PSS_2048_8192_SHA384, RSA_PSS_2048_8192_SHA512, RSA_PSS_SHA256, RSA_PSS_SHA384,
        RSA_PSS_SHA512, RsaEncoding, RsaParameters,
    },
};
use jwx_error::ErrorContext as _;

use crate::error::{Error, Result};
use crate::jose::jwa::{EllipticCurve, SignatureAlgorithm};
use crate::jose::jwk::{EcPublicKey, Key, RsaPublicKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// The signer and verifier of one [`SignatureAlgorithm`].
///
/// Every algorithm of the registry has a binding, it holds no state
/// apart from the algorithm itself.
pub struct AlgorithmBinding {
    alg: SignatureAlgorithm,
}

impl AlgorithmBinding {
    /// The binding for `alg`.
    #[must_use]
    pub const fn new(alg: SignatureAlgorithm) -> Self {
        Self { alg }
    }

    /// The algorithm of this binding.
    #[must_use]
    pub const fn algorithm(self) -> SignatureAlgorithm {
        self.alg
    }

    /// Sign `payload` with `key`.
    ///
    /// HMAC algorithms need a symmetric key, RSA and ECDSA algorithms a private
    /// key of their type (and curve). `none` takes no key and signs as empty.
    /// Any other combination is a [`ErrorKind::TypeMismatch`].
    ///
    /// [`ErrorKind::TypeMismatch`]: crate::error::ErrorKind::TypeMismatch
    pub fn sign(self, payload: &[u8], key: Option<&Key>) -> Result<Vec<u8>> {
        let key = match (self.alg, key) {
            (SignatureAlgorithm::NoSignature, None) => return Ok(Vec::new()),
            (SignatureAlgorithm::NoSignature, Some(_)) => {
                return Err(Error::type_mismatch("`none` signatures take no key"));
            }
            (alg, None) => return Err(Error::type_mismatch(format!("{alg} requires a key"))),
            (_, Some(key)) => key,
        };

        match key {
            Key::Symmetric(key) => {
                let alg = self.hmac_algorithm()?;
                let tag = hmac::sign(&hmac::Key::new(alg, key.as_bytes()), payload);
                Ok(tag.as_ref().to_vec())
            }
            Key::RsaPrivate(key) => {
                let encoding = self.rsa_encoding()?;
                let key_pair = key.materialize()?;
                let mut signature = vec![0u8; key_pair.public_modulus_len()];
                key_pair
                    .sign(encoding, &SystemRandom::new(), payload, &mut signature)
                    .context("rsa sign payload")
                    .map_err(Error::crypto)?;
                Ok(signature)
            }
            Key::EcPrivate(key) => {
                self.check_curve(key.curve())?;
                let signature = key
                    .materialize()?
                    .sign(&SystemRandom::new(), payload)
                    .context("ecdsa sign payload")
                    .map_err(Error::crypto)?;
                Ok(signature.as_ref().to_vec())
            }
            Key::RsaPublic(_) | Key::EcPublic(_) => Err(Error::type_mismatch(format!(
                "{} cannot sign with a public key",
                self.alg
            ))),
        }
    }

    /// Verify `signature` over `payload` with `key`.
    ///
    /// Every failure, including a missing or unfit key, is reported as
    /// the same [`ErrorKind::VerificationFailed`] error. `none` never verifies.
    ///
    /// [`ErrorKind::VerificationFailed`]: crate::error::ErrorKind::VerificationFailed
    pub fn verify(self, payload: &[u8], signature: &[u8], key: Option<&Key>) -> Result<()> {
        self.check(payload, signature, key).map_err(|err| {
            tracing::trace!(alg = self.alg.as_str(), "signature check failed; err = {err:?}");
            Error::verification_failed()
        })
    }

    fn check(self, payload: &[u8], signature: &[u8], key: Option<&Key>) -> Result<()> {
        if self.alg == SignatureAlgorithm::NoSignature {
            return Err(Error::unsupported_algorithm(
                "`none` signatures are never verified",
            ));
        }
        let key = key.ok_or_else(|| Error::type_mismatch("no key to verify with"))?;

        match key {
            Key::Symmetric(key) => {
                let alg = self.hmac_algorithm()?;
                // constant time comparison of the recomputed tag
                hmac::verify(&hmac::Key::new(alg, key.as_bytes()), payload, signature)
                    .context("hmac verify")
                    .map_err(Error::crypto)
            }
            Key::RsaPublic(key) => self.check_rsa(key, payload, signature),
            Key::RsaPrivate(key) => self.check_rsa(&key.public_key(), payload, signature),
            Key::EcPublic(key) => self.check_ecdsa(key, payload, signature),
            Key::EcPrivate(key) => self.check_ecdsa(&key.public_key(), payload, signature),
        }
    }

    fn check_rsa(self, key: &RsaPublicKey, payload: &[u8], signature: &[u8]) -> Result<()> {
        let params = self.rsa_parameters()?;
        key.materialize()
            .verify(params, payload, signature)
            .context("rsa verify")
            .map_err(Error::crypto)
    }

    fn check_ecdsa(self, key: &EcPublicKey, payload: &[u8], signature: &[u8]) -> Result<()> {
        self.check_curve(key.curve())?;
        key.materialize()
            .verify(payload, signature)
            .context("ecdsa verify")
            .map_err(Error::crypto)
    }

    fn check_curve(self, curve: EllipticCurve) -> Result<()> {
        if self.alg.curve() == Some(curve) {
            Ok(())
        } else {
            Err(self.unfit_key(curve.as_str()))
        }
    }

    fn hmac_algorithm(self) -> Result<hmac::Algorithm> {
        match self.alg {
            SignatureAlgorithm::HS256 => Ok(hmac::HMAC_SHA256),
            SignatureAlgorithm::HS384 => Ok(hmac::HMAC_SHA384),
            SignatureAlgorithm::HS512 => Ok(hmac::HMAC_SHA512),
            _ => Err(self.unfit_key("symmetric")),
        }
    }

    fn rsa_encoding(self) -> Result<&'static dyn RsaEncoding> {
        match self.alg {
            SignatureAlgorithm::RS256 => Ok(&RSA_PKCS1_SHA256),
            SignatureAlgorithm::RS384 => Ok(&RSA_PKCS1_SHA384),
            SignatureAlgorithm::RS512 => Ok(&RSA_PKCS1_SHA512),
            SignatureAlgorithm::PS256 => Ok(&RSA_PSS_SHA256),
            SignatureAlgorithm::PS384 => Ok(&RSA_PSS_SHA384),
            SignatureAlgorithm::PS512 => Ok(&RSA_PSS_SHA512),
            _ => Err(self.unfit_key("RSA")),
        }
    }

    fn rsa_parameters(self) -> Result<&'static RsaParameters> {
        match self.alg {
            SignatureAlgorithm::RS256 => Ok(&RSA_PKCS1_2048_8192_SHA256),
            SignatureAlgorithm::RS384 => Ok(&RSA_PKCS1_2048_8192_SHA384),
            SignatureAlgorithm::RS512 => Ok(&RSA_PKCS1_2048_8192_SHA512),
            SignatureAlgorithm::PS256 => Ok(&RSA_PSS_2048_8192_SHA256),
            SignatureAlgorithm::PS384 => Ok(&RSA_PSS_2048_8192_SHA384),
            SignatureAlgorithm::PS512 => Ok(&RSA_PSS_2048_8192_SHA512),
            _ => Err(self.unfit_key("RSA")),
        }
    }

    fn unfit_key(self, kind: &str) -> Error {
        Error::type_mismatch(format!("{} cannot be used with a {kind} key", self.alg))
    }
}

impl From<SignatureAlgorithm> for AlgorithmBinding {
    fn from(alg: SignatureAlgorithm) -> Self {
        Self::new(alg)
    }
}

#[cfg(test)]
mod tests {
    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::jose::jwk::{EcPrivateKey, SymmetricKey};

    #[test]
    fn none_signs_empty_and_never_verifies() {
        let binding = AlgorithmBinding::new(SignatureAlgorithm::NoSignature);
        assert_eq!(assert_ok!(binding.sign(b"data", None)), Vec::<u8>::new());
        assert!(assert_err!(binding.verify(b"data", b"", None)).is_verification_failed());

        let key = Key::from(SymmetricKey::new(vec![1; 32]));
        assert!(assert_err!(binding.sign(b"data", Some(&key))).is_type_mismatch());
    }

    #[test]
    fn unfit_keys_are_type_mismatches() {
        let hmac = Key::from(SymmetricKey::new(vec![7; 32]));
        let p256 = Key::from(EcPrivateKey::generate(EllipticCurve::P256).unwrap());

        for (alg, key) in [
            (SignatureAlgorithm::RS256, Some(&hmac)),
            (SignatureAlgorithm::HS256, Some(&p256)),
            (SignatureAlgorithm::ES384, Some(&p256)),
            (SignatureAlgorithm::HS512, None),
        ] {
            let err = assert_err!(AlgorithmBinding::new(alg).sign(b"data", key));
            assert!(err.is_type_mismatch(), "{alg}");
        }

        let err = assert_err!(
            AlgorithmBinding::new(SignatureAlgorithm::ES256).sign(b"data", Some(&p256.public_key()))
        );
        assert!(err.is_type_mismatch());
    }

    #[test]
    fn hmac_detects_any_changed_byte() {
        let key = Key::from(SymmetricKey::new(b"a shared secret of some length".to_vec()));
        let binding = AlgorithmBinding::new(SignatureAlgorithm::HS384);
        let signature = binding.sign(b"payload", Some(&key)).unwrap();
        assert_eq!(signature.len(), 48);
        assert_ok!(binding.verify(b"payload", &signature, Some(&key)));

        for i in 0..signature.len() {
            let mut altered = signature.clone();
            altered[i] ^= 0x01;
            assert_err!(binding.verify(b"payload", &altered, Some(&key)));
        }
        assert_err!(binding.verify(b"Payload", &signature, Some(&key)));

        let other = Key::from(SymmetricKey::new(b"a shared secret of some lengtH".to_vec()));
        assert_err!(binding.verify(b"payload", &signature, Some(&other)));
    }

    #[test]
    fn ecdsa_signatures_have_fixed_width() {
        for curve in EllipticCurve::ALL.iter().copied() {
            let key = Key::from(EcPrivateKey::generate(curve).unwrap());
            let binding = AlgorithmBinding::new(curve.signature_algorithm());
            let signature = binding.sign(b"payload", Some(&key)).unwrap();
            assert_eq!(signature.len(), 2 * curve.coordinate_size());
            assert_ok!(binding.verify(b"payload", &signature, Some(&key.public_key())));
            assert_ok!(binding.verify(b"payload", &signature, Some(&key)));
        }
    }
}
