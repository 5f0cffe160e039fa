use jwx_error::{BoxError, ErrorContext as _};
use serde_json::{Map, Value};

use super::serialization::EncodedSignature;
use super::{JWS, JWSFlattened, SignatureHeaders, Verifier};
use crate::error::{Error, Result};
use crate::jose::encoding::decode;
use crate::jose::jwa::SignatureAlgorithm;

#[derive(Clone, Debug, PartialEq)]
/// A decoded JWS: the payload and one or more [`Signature`]s over it.
///
/// A [`Message`] can be parsed from any serialization with [`Message::parse`],
/// which decodes but does not verify. Use [`Message::verify`] before
/// trusting the payload.
pub struct Message {
    payload: Vec<u8>,
    signatures: Vec<Signature>,
}

#[derive(Clone, Debug, PartialEq)]
/// Decoded version of a signature
///
/// It includes a String representation of the signing input
/// so this doesn't need to be re-encoded when verifying.
pub struct Signature {
    protected: SignatureHeaders,
    unprotected: SignatureHeaders,
    signature: Vec<u8>,
    signing_input: String,
}

impl Message {
    /// Parse a JWS in compact, general or flattened JSON serialization.
    ///
    /// Input starting with `{` is read as JSON: general if it has a
    /// `signatures` member, flattened otherwise.
    pub fn parse(src: &str) -> Result<Self> {
        let src = src.trim();
        if src.starts_with('{') {
            Self::parse_json(src)
        } else {
            Self::parse_compact(src)
        }
    }

    pub(super) fn parse_compact(src: &str) -> Result<Self> {
        let mut segments = src.split('.');
        let (Some(protected), Some(payload), Some(signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(Error::malformed_input(
                "compact jws: expected three segments separated by `.`",
            ));
        };

        Self::from_encoded(
            payload,
            vec![EncodedSignature {
                protected: protected.to_owned(),
                unprotected: SignatureHeaders::new(),
                signature: signature.to_owned(),
            }],
        )
    }

    fn parse_json(src: &str) -> Result<Self> {
        let map: Map<String, Value> = serde_json::from_str(src)
            .context("parse jws json object")
            .map_err(Error::malformed_input)?;
        if map.contains_key("signatures") {
            JWS::from_json_map(map)?.into_message()
        } else {
            JWSFlattened::from_json_map(map)?.into_message()
        }
    }

    pub(super) fn from_encoded(payload: &str, signatures: Vec<EncodedSignature>) -> Result<Self> {
        let signatures = signatures
            .into_iter()
            .map(|signature| {
                Signature::from_encoded(signature, payload).inspect_err(|err| {
                    tracing::debug!("failed to decode jws signature; err = {err:?}");
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let payload = decode("payload", payload).inspect_err(|err| {
            tracing::debug!("failed to decode jws payload; err = {err:?}");
        })?;
        Ok(Self {
            payload,
            signatures,
        })
    }

    /// The decoded payload.
    ///
    /// Unless [`Self::verify`] succeeded, nothing vouches for it.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Consume the message into its decoded payload.
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// All signatures, in their serialized order.
    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    /// Check the signatures of this message with `verifier`.
    ///
    /// Any failure of the verifier is reported as a single
    /// [`ErrorKind::VerificationFailed`] error without cause.
    ///
    /// [`ErrorKind::VerificationFailed`]: crate::error::ErrorKind::VerificationFailed
    pub fn verify(&self, verifier: &impl Verifier) -> Result<()> {
        verifier
            .verify(&self.payload, &self.signatures)
            .map_err(|err| {
                let err: BoxError = err.into();
                tracing::debug!("jws verification failed; err = {err:?}");
                Error::verification_failed()
            })
    }
}

impl Signature {
    fn from_encoded(encoded: EncodedSignature, payload: &str) -> Result<Self> {
        let protected = if encoded.protected.is_empty() {
            SignatureHeaders::new()
        } else {
            let json = decode("protected", &encoded.protected)?;
            let map: Map<String, Value> = serde_json::from_slice(&json)
                .context("parse protected header json object")
                .map_err(Error::malformed_input)?;
            SignatureHeaders::from_json_map(map)?
        };

        protected.walk(|name, _| {
            if encoded.unprotected.get(name).is_some() {
                Err(Error::schema_violation(format!(
                    "jws: header `{name}` is both protected and unprotected"
                )))
            } else {
                Ok(())
            }
        })?;

        let signature = decode("signature", &encoded.signature)?;
        Ok(Self {
            signing_input: format!("{}.{payload}", encoded.protected),
            protected,
            unprotected: encoded.unprotected,
            signature,
        })
    }

    /// Reference to the protected [`SignatureHeaders`]
    pub fn protected_headers(&self) -> &SignatureHeaders {
        &self.protected
    }

    /// Reference to the unprotected [`SignatureHeaders`]
    pub fn unprotected_headers(&self) -> &SignatureHeaders {
        &self.unprotected
    }

    /// The raw signature bytes.
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Encoded `protected.payload` as it was signed.
    pub fn signing_input(&self) -> &str {
        &self.signing_input
    }

    /// The "alg" header, protected or not.
    pub fn algorithm(&self) -> Option<SignatureAlgorithm> {
        self.protected
            .algorithm()
            .or_else(|| self.unprotected.algorithm())
    }

    /// The "kid" header, protected or not.
    pub fn key_id(&self) -> Option<&str> {
        self.protected.key_id().or_else(|| self.unprotected.key_id())
    }

    /// The algorithm to verify this signature with, `None` if it cannot be verified.
    ///
    /// No extensions are understood, so a signature with a "crit" header never verifies.
    pub(super) fn verifiable_algorithm(&self) -> Option<SignatureAlgorithm> {
        if self.protected.critical().is_some() || self.unprotected.critical().is_some() {
            tracing::trace!("jws signature with critical header extensions");
            return None;
        }
        self.algorithm()
    }
}
