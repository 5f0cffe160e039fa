use jwx_error::{BoxError, ErrorContext as _};
use jwx_utils::macros::generate_set_and_with;
use serde::Serialize;

use super::serialization::EncodedSignature;
use super::{AlgorithmBinding, JWS, JWSCompact, JWSFlattened, SignatureHeaders};
use crate::error::{Error, Result};
use crate::jose::encoding::encode;
use crate::jose::jwa::SignatureAlgorithm;
use crate::jose::jwk::Key;

#[derive(Default, Debug, Clone, PartialEq)]
/// [`JWSBuilder`] should be used when manually creating a [`JWS`], [`JWSCompact`] or [`JWSFlattened`]
pub struct JWSBuilder {
    protected_headers: SignatureHeaders,
    unprotected_headers: SignatureHeaders,
    payload: String,
}

#[derive(Clone, Debug, PartialEq)]
/// [`ChainedJWSBuilder`] will be used to create a [`JWS`] with multiple signatures
pub struct ChainedJWSBuilder {
    signatures: Vec<EncodedSignature>,
    payload: String,
    protected_headers: SignatureHeaders,
    unprotected_headers: SignatureHeaders,
}

impl JWSBuilder {
    /// Create a new builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    generate_set_and_with! {
        /// Add the provided payload to this [`JWSBuilder`]
        pub fn payload(mut self, payload: impl AsRef<[u8]>) -> Self {
            self.payload = encode(payload);
            self
        }
    }

    generate_set_and_with! {
        /// Set provided header in the protected headers
        ///
        /// Warning: this function will replace already existing headers
        /// If more control is needed, use [`Self::protected_headers_mut`] to get access
        /// to the underlying header store
        pub fn protected_header(
            mut self,
            name: impl Into<String>,
            value: impl Serialize,
        ) -> Result<Self, Error> {
            self.protected_headers.try_set_header(name, value)?;
            Ok(self)
        }
    }

    generate_set_and_with! {
        /// Set all members of the provided object in the protected headers
        ///
        /// Warning: this function will replace already existing headers
        /// If more control is needed, use [`Self::protected_headers_mut`] to get access
        /// to the underlying header store
        pub fn protected_headers(mut self, headers: impl Serialize) -> Result<Self, Error> {
            self.protected_headers.try_set_headers(headers)?;
            Ok(self)
        }
    }

    /// Get mutable reference to the underlying protected header store
    ///
    /// This can be used in cases where more granular control is needed
    pub fn protected_headers_mut(&mut self) -> &mut SignatureHeaders {
        &mut self.protected_headers
    }

    generate_set_and_with! {
        /// Set provided header in the unprotected headers
        ///
        /// Warning: this function will replace already existing headers
        /// If more control is needed, use [`Self::unprotected_headers_mut`] to get access
        /// to the underlying header store
        pub fn unprotected_header(
            mut self,
            name: impl Into<String>,
            value: impl Serialize,
        ) -> Result<Self, Error> {
            self.unprotected_headers.try_set_header(name, value)?;
            Ok(self)
        }
    }

    generate_set_and_with! {
        /// Set all members of the provided object in the unprotected headers
        ///
        /// Warning: this function will replace already existing headers
        /// If more control is needed, use [`Self::unprotected_headers_mut`] to get access
        /// to the underlying header store
        pub fn unprotected_headers(mut self, headers: impl Serialize) -> Result<Self, Error> {
            self.unprotected_headers.try_set_headers(headers)?;
            Ok(self)
        }
    }

    /// Get mutable reference to the underlying unprotected header store
    ///
    /// This can be used in cases where more granular control is needed
    pub fn unprotected_headers_mut(&mut self) -> &mut SignatureHeaders {
        &mut self.unprotected_headers
    }

    /// Generate compact serialization of this `JWS`
    ///
    /// This only available if there is no unprotected header set,
    /// neither by the caller nor by the [`Signer`].
    pub fn build_compact(self, signer: &impl Signer) -> Result<JWSCompact> {
        let signature = sign_encoded(
            &self.payload,
            self.protected_headers,
            self.unprotected_headers,
            signer,
        )?;
        if !signature.unprotected.is_empty() {
            return Err(Error::schema_violation(
                "compact jws does not support unprotected headers",
            ));
        }

        Ok(JWSCompact(format!(
            "{}.{}.{}",
            signature.protected, self.payload, signature.signature
        )))
    }

    /// Build a [`JWSFlattened`]
    pub fn build_flattened(self, signer: &impl Signer) -> Result<JWSFlattened> {
        let signature = sign_encoded(
            &self.payload,
            self.protected_headers,
            self.unprotected_headers,
            signer,
        )?;

        Ok(JWSFlattened {
            signature,
            payload: self.payload,
        })
    }

    /// Build a [`JWS`]
    pub fn build_jws(self, signer: &impl Signer) -> Result<JWS> {
        let signature = sign_encoded(
            &self.payload,
            self.protected_headers,
            self.unprotected_headers,
            signer,
        )?;

        Ok(JWS {
            signatures: vec![signature],
            payload: self.payload,
        })
    }

    /// Create a [`ChainedJWSBuilder`] with the same payload but that can add a new set of headers
    /// and which will be signed again. This is needed to create a [`JWS`] with multiple signatures.
    pub fn add_signature(self, signer: &impl Signer) -> Result<ChainedJWSBuilder> {
        let signature = sign_encoded(
            &self.payload,
            self.protected_headers,
            self.unprotected_headers,
            signer,
        )?;

        Ok(ChainedJWSBuilder {
            signatures: vec![signature],
            protected_headers: SignatureHeaders::default(),
            unprotected_headers: SignatureHeaders::default(),
            payload: self.payload,
        })
    }
}

impl ChainedJWSBuilder {
    generate_set_and_with! {
        /// Set provided header in the protected headers of the next signature
        pub fn protected_header(
            mut self,
            name: impl Into<String>,
            value: impl Serialize,
        ) -> Result<Self, Error> {
            self.protected_headers.try_set_header(name, value)?;
            Ok(self)
        }
    }

    generate_set_and_with! {
        /// Set all members of the provided object in the protected headers of the next signature
        pub fn protected_headers(mut self, headers: impl Serialize) -> Result<Self, Error> {
            self.protected_headers.try_set_headers(headers)?;
            Ok(self)
        }
    }

    /// Get mutable reference to the protected headers of the next signature
    pub fn protected_headers_mut(&mut self) -> &mut SignatureHeaders {
        &mut self.protected_headers
    }

    generate_set_and_with! {
        /// Set provided header in the unprotected headers of the next signature
        pub fn unprotected_header(
            mut self,
            name: impl Into<String>,
            value: impl Serialize,
        ) -> Result<Self, Error> {
            self.unprotected_headers.try_set_header(name, value)?;
            Ok(self)
        }
    }

    generate_set_and_with! {
        /// Set all members of the provided object in the unprotected headers of the next signature
        pub fn unprotected_headers(mut self, headers: impl Serialize) -> Result<Self, Error> {
            self.unprotected_headers.try_set_headers(headers)?;
            Ok(self)
        }
    }

    /// Get mutable reference to the unprotected headers of the next signature
    pub fn unprotected_headers_mut(&mut self) -> &mut SignatureHeaders {
        &mut self.unprotected_headers
    }

    /// Sign with the current headers and start a new set of headers for yet another signature
    pub fn add_signature(mut self, signer: &impl Signer) -> Result<Self> {
        let signature = sign_encoded(
            &self.payload,
            self.protected_headers,
            self.unprotected_headers,
            signer,
        )?;
        self.signatures.push(signature);

        Ok(Self {
            signatures: self.signatures,
            protected_headers: SignatureHeaders::default(),
            unprotected_headers: SignatureHeaders::default(),
            payload: self.payload,
        })
    }

    /// Build the final [`JWS`] containing all provided signatures
    pub fn build(mut self, signer: &impl Signer) -> Result<JWS> {
        let signature = sign_encoded(
            &self.payload,
            self.protected_headers,
            self.unprotected_headers,
            signer,
        )?;
        self.signatures.push(signature);

        Ok(JWS {
            payload: self.payload,
            signatures: self.signatures,
        })
    }
}

/// Let the [`Signer`] complete the headers, then sign `protected.payload`.
fn sign_encoded(
    payload: &str,
    mut protected: SignatureHeaders,
    mut unprotected: SignatureHeaders,
    signer: &impl Signer,
) -> Result<EncodedSignature> {
    signer
        .set_headers(&mut protected, &mut unprotected)
        .map_err(signer_error)?;

    let protected = if protected.is_empty() {
        String::new()
    } else {
        let json = serde_json::to_vec(&protected)
            .context("serialize protected headers")
            .map_err(Error::type_mismatch)?;
        encode(json)
    };
    let signing_input = format!("{protected}.{payload}");

    let signature = signer.sign(&signing_input).map_err(signer_error)?;

    Ok(EncodedSignature {
        protected,
        unprotected,
        signature: encode(signature),
    })
}

/// Errors of this crate pass through unchanged, anything else is a provider failure.
fn signer_error(err: impl Into<BoxError>) -> Error {
    let err: BoxError = err.into();
    match err.downcast::<Error>() {
        Ok(err) => *err,
        Err(err) => Error::crypto(err),
    }
}

/// [`Signer`] implements all methods which are needed to sign our JWS requests,
/// and add the needed info to our JOSE headers (JOSE headers = protected + unprotected headers)
pub trait Signer {
    type Signature: AsRef<[u8]>;
    type Error: Into<BoxError>;

    /// Set headers which are needed to verify the final `Signature`
    ///
    /// Example headers are: `alg`, `kid`
    fn set_headers(
        &self,
        protected_headers: &mut SignatureHeaders,
        unprotected_headers: &mut SignatureHeaders,
    ) -> Result<(), Self::Error>;

    /// Sign the str encoded signing input, `protected.payload`
    fn sign(&self, data: &str) -> Result<Self::Signature, Self::Error>;
}

#[derive(Debug, Clone, PartialEq)]
/// A [`Signer`] binding a [`SignatureAlgorithm`] to a [`Key`].
///
/// It sets the "alg" protected header and, if the key has an id and
/// no "kid" header is set yet, the "kid" protected header.
pub struct KeySigner {
    alg: SignatureAlgorithm,
    key: Option<Key>,
}

impl KeySigner {
    /// Sign with `alg` using `key`.
    #[must_use]
    pub fn new(alg: SignatureAlgorithm, key: Key) -> Self {
        Self {
            alg,
            key: Some(key),
        }
    }

    /// A signer for unsecured messages, `"alg": "none"` with an empty signature.
    #[must_use]
    pub fn unsecured() -> Self {
        Self {
            alg: SignatureAlgorithm::NoSignature,
            key: None,
        }
    }

    /// The algorithm of this signer.
    pub fn algorithm(&self) -> SignatureAlgorithm {
        self.alg
    }

    /// The key of this signer, `None` for unsecured messages.
    pub fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }
}

impl Signer for KeySigner {
    type Signature = Vec<u8>;
    type Error = Error;

    fn set_headers(
        &self,
        protected_headers: &mut SignatureHeaders,
        _unprotected_headers: &mut SignatureHeaders,
    ) -> Result<()> {
        protected_headers.set_algorithm(self.alg);
        if protected_headers.key_id().is_none() {
            let kid = self.key.as_ref().and_then(Key::key_id).map(ToOwned::to_owned);
            protected_headers.maybe_set_key_id(kid);
        }
        Ok(())
    }

    fn sign(&self, data: &str) -> Result<Vec<u8>> {
        AlgorithmBinding::new(self.alg).sign(data.as_bytes(), self.key.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::jose::jwk::SymmetricKey;
    use crate::jose::jws::{KeyVerifier, Message, Signature, Verifier};

    #[derive(Clone, Serialize, Debug)]
    struct AcmeProtected<'a> {
        nonce: &'a str,
        url: &'a str,
    }

    #[derive(Clone, Serialize, Debug)]
    struct Random<'a> {
        data: &'a str,
    }

    fn signer_and_verifier() -> (KeySigner, KeyVerifier) {
        let key = Key::from(SymmetricKey::new(b"a very secret shared key".to_vec()))
            .try_with_header("kid", "hmac")
            .unwrap();
        (
            KeySigner::new(SignatureAlgorithm::HS512, key.clone()),
            KeyVerifier::new(SignatureAlgorithm::HS512, key),
        )
    }

    #[test]
    fn can_serialize_and_deserialize() {
        let protected = AcmeProtected {
            nonce: "random",
            url: "https://example.com/acme/new-order",
        };
        let header = Random {
            data: "something_random",
        };
        let (signer, verifier) = signer_and_verifier();

        let jws = JWSBuilder::new()
            .with_payload("something")
            .try_with_protected_headers(protected.clone())
            .unwrap()
            .try_with_unprotected_headers(header.clone())
            .unwrap()
            .build_flattened(&signer)
            .unwrap();

        let serialized = serde_json::to_string(&jws).unwrap();
        let received = serde_json::from_str::<JWSFlattened>(&serialized).unwrap();
        assert_eq!(jws, received);

        let message = received.decode(&verifier).unwrap();
        assert_eq!(message.payload(), b"something");

        let signature = &message.signatures()[0];
        let protected_headers = signature.protected_headers();
        assert_eq!(protected_headers.algorithm(), Some(SignatureAlgorithm::HS512));
        assert_eq!(protected_headers.key_id(), Some("hmac"));
        assert_eq!(protected_headers.get("nonce"), Some("random".into()));
        assert_eq!(
            signature.unprotected_headers().get("data"),
            Some("something_random".into())
        );
    }

    #[test]
    fn tampering_should_be_detected() {
        let (signer, verifier) = signer_and_verifier();

        let jws = JWSFlattened::builder()
            .with_payload("something")
            .try_with_protected_header("nonce", "random")
            .unwrap()
            .build_flattened(&signer)
            .unwrap();

        let serialized = serde_json::to_string(&jws).unwrap();

        // Something should fail in this part
        let server = move |serialized: String| {
            let received = Message::parse(&serialized)?;
            received.verify(&verifier)
        };

        for i in 0..serialized.len() - 1 {
            let mut serialized: String = serialized.clone();
            serialized.insert(i, 't');
            assert_err!(server(serialized), "failed at {i}");
        }
    }

    #[test]
    fn compact_rejects_unprotected_headers() {
        let (signer, _) = signer_and_verifier();
        let err = assert_err!(
            JWSCompact::builder()
                .with_payload("something")
                .try_with_unprotected_header("kid", "k")
                .unwrap()
                .build_compact(&signer)
        );
        assert!(err.is_schema_violation());
    }

    #[test]
    fn unsecured_messages_do_not_verify() {
        let jws = JWSBuilder::new()
            .with_payload("open")
            .build_compact(&KeySigner::unsecured())
            .unwrap();
        assert!(jws.as_str().ends_with('.'));

        let message = assert_ok!(Message::parse(jws.as_str()));
        assert_eq!(message.payload(), b"open");
        let (_, verifier) = signer_and_verifier();
        assert!(assert_err!(message.verify(&verifier)).is_verification_failed());
    }

    #[test]
    fn can_create_multi_signature_jws() {
        let (signer, verifier) = signer_and_verifier();

        struct SecondSigner;

        impl Signer for SecondSigner {
            type Signature = Vec<u8>;
            type Error = BoxError;

            fn sign(&self, data: &str) -> Result<Self::Signature, BoxError> {
                Ok(data.as_bytes().to_owned())
            }

            fn set_headers(
                &self,
                protected_headers: &mut SignatureHeaders,
                _unprotected_headers: &mut SignatureHeaders,
            ) -> Result<(), BoxError> {
                protected_headers.try_set_header("data", "very protected")?;
                Ok(())
            }
        }

        let jws = JWSBuilder::new()
            .with_payload("something")
            .try_with_unprotected_header("first", true)
            .unwrap()
            .add_signature(&signer)
            .unwrap()
            .try_with_unprotected_header("second", "something second")
            .unwrap()
            .try_with_protected_header("app specific", "will not be used by verifier")
            .unwrap()
            .build(&SecondSigner)
            .unwrap();

        let serialized = serde_json::to_string(&jws).unwrap();

        struct MultiVerifier {
            first: KeyVerifier,
        }

        impl Verifier for MultiVerifier {
            type Error = Error;

            fn verify(&self, payload: &[u8], signatures: &[Signature]) -> Result<()> {
                self.first.verify(payload, &signatures[..1])?;
                let second = &signatures[1];
                if second.signature() == second.signing_input().as_bytes()
                    && second.protected_headers().get("data") == Some("very protected".into())
                {
                    Ok(())
                } else {
                    Err(Error::verification_failed())
                }
            }
        }

        let received = serde_json::from_str::<JWS>(&serialized).unwrap();
        let message = received.decode(&MultiVerifier { first: verifier }).unwrap();
        assert_eq!(message.payload(), b"something");
        assert_eq!(message.signatures().len(), 2);
        assert_eq!(
            message.signatures()[1].unprotected_headers().get("second"),
            Some("something second".into())
        );
    }

    #[test]
    fn foreign_signer_errors_are_crypto_errors() {
        struct Failing;

        impl Signer for Failing {
            type Signature = Vec<u8>;
            type Error = std::io::Error;

            fn sign(&self, _data: &str) -> Result<Vec<u8>, std::io::Error> {
                Err(std::io::Error::other("hsm unavailable"))
            }

            fn set_headers(
                &self,
                _protected_headers: &mut SignatureHeaders,
                _unprotected_headers: &mut SignatureHeaders,
            ) -> Result<(), std::io::Error> {
                Ok(())
            }
        }

        let err = assert_err!(JWSBuilder::new().build_jws(&Failing));
        assert!(err.is_crypto());

        let key = Key::from(SymmetricKey::new(vec![1; 32]));
        let err = assert_err!(
            JWSBuilder::new().build_jws(&KeySigner::new(SignatureAlgorithm::ES256, key))
        );
        assert!(err.is_type_mismatch());
    }
}
