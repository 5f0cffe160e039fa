use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, de::Error as _};
use serde_json::{Map, Value};

use super::{JWSBuilder, Message, SignatureHeaders, Verifier};
use crate::error::{Error, Result};
use crate::jose::encoding::take_str;
use crate::jose::header::{describe, type_mismatch};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
/// [`JWSCompact`] is a compact `JWS` representation as defined in [`rfc7515, section 7.1`]
///
/// [`rfc7515, section 7.1`]: https://datatracker.ietf.org/doc/html/rfc7515#section-7.1
pub struct JWSCompact(pub(super) String);

#[derive(Serialize, Debug, Clone, PartialEq)]
/// [`JWSFlattened`] is a `JWS` which is optimized for a single signature, as defined in [`rfc7515, section 7.2.2`]
///
/// It does this by setting protected, header and signature at the root,
/// vs setting it in the signatures array
///
/// [`rfc7515, section 7.2.2`]: https://datatracker.ietf.org/doc/html/rfc7515#section-7.2.2
pub struct JWSFlattened {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub(super) payload: String,
    #[serde(flatten)]
    pub(super) signature: EncodedSignature,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
/// [`JWS`] is the general serialization format as defined in [`rfc7515, section 7.2.1`]
///
/// [`rfc7515, section 7.2.1`]: https://datatracker.ietf.org/doc/html/rfc7515#section-7.2.1
pub struct JWS {
    pub(super) payload: String,
    pub(super) signatures: Vec<EncodedSignature>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
/// One signature as found on the wire, everything still base64url encoded
/// except for the unprotected header.
pub(super) struct EncodedSignature {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub(super) protected: String,
    #[serde(rename = "header", skip_serializing_if = "SignatureHeaders::is_empty")]
    pub(super) unprotected: SignatureHeaders,
    pub(super) signature: String,
}

impl EncodedSignature {
    /// Take the signature members out of a json object,
    /// leaving any other member in place.
    fn take_from(map: &mut Map<String, Value>) -> Result<Self> {
        let protected = take_str(map, "protected")?.unwrap_or_default();
        let unprotected = match map.remove("header") {
            None => SignatureHeaders::new(),
            Some(Value::Object(header)) => SignatureHeaders::from_json_map(header)?,
            Some(other) => return Err(type_mismatch("header", "a json object", &other)),
        };
        let signature = take_str(map, "signature")?
            .ok_or_else(|| Error::schema_violation("jws: missing member `signature`"))?;
        Ok(Self {
            protected,
            unprotected,
            signature,
        })
    }
}

impl JWSCompact {
    /// Create a builder which can be used to create a [`JWSCompact`]
    pub fn builder() -> JWSBuilder {
        JWSBuilder::new()
    }

    /// The dot separated serialization.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the dot separated serialization.
    pub fn into_string(self) -> String {
        self.0
    }

    /// Decode this [`JWSCompact`] into a [`Message`] and check it with the [`Verifier`].
    pub fn decode(&self, verifier: &impl Verifier) -> Result<Message> {
        let message = Message::parse_compact(&self.0)?;
        message.verify(verifier)?;
        Ok(message)
    }
}

impl AsRef<str> for JWSCompact {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JWSCompact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<JWSCompact> for String {
    fn from(jws: JWSCompact) -> Self {
        jws.0
    }
}

impl JWSFlattened {
    /// Create a builder which can be used to create a [`JWSFlattened`]
    pub fn builder() -> JWSBuilder {
        JWSBuilder::new()
    }

    /// Create a [`JWSCompact`] from this [`JWSFlattened`]
    ///
    /// Fails if an unprotected header is set, the compact form has no room for it.
    pub fn as_compact(&self) -> Result<JWSCompact> {
        if !self.signature.unprotected.is_empty() {
            return Err(Error::schema_violation(
                "compact jws does not support unprotected headers",
            ));
        }

        Ok(JWSCompact(format!(
            "{}.{}.{}",
            self.signature.protected, self.payload, self.signature.signature
        )))
    }

    /// Decode this [`JWSFlattened`] into a [`Message`] and check it with the [`Verifier`].
    pub fn decode(self, verifier: &impl Verifier) -> Result<Message> {
        let message = self.into_message()?;
        message.verify(verifier)?;
        Ok(message)
    }

    /// Decode all members without verifying the signature.
    pub fn into_message(self) -> Result<Message> {
        Message::from_encoded(&self.payload, vec![self.signature])
    }

    /// Read a flattened serialization from its json object.
    ///
    /// A missing payload is read as an empty one.
    pub fn from_json_map(mut map: Map<String, Value>) -> Result<Self> {
        let payload = take_str(&mut map, "payload")?.unwrap_or_default();
        let signature = EncodedSignature::take_from(&mut map)?;
        Ok(Self { payload, signature })
    }
}

impl JWS {
    /// Create a builder which can be used to create a [`JWS`]
    pub fn builder() -> JWSBuilder {
        JWSBuilder::new()
    }

    /// Decode this [`JWS`] into a [`Message`] and check it with the [`Verifier`].
    pub fn decode(self, verifier: &impl Verifier) -> Result<Message> {
        let message = self.into_message()?;
        message.verify(verifier)?;
        Ok(message)
    }

    /// Decode all members without verifying any signature.
    pub fn into_message(self) -> Result<Message> {
        Message::from_encoded(&self.payload, self.signatures)
    }

    /// Read a general serialization from its json object.
    pub fn from_json_map(mut map: Map<String, Value>) -> Result<Self> {
        let payload = take_str(&mut map, "payload")?.unwrap_or_default();
        let signatures = match map.remove("signatures") {
            Some(Value::Array(signatures)) => signatures,
            Some(other) => return Err(type_mismatch("signatures", "a list", &other)),
            None => return Err(Error::schema_violation("jws: missing member `signatures`")),
        };
        if signatures.is_empty() {
            return Err(Error::schema_violation("jws: `signatures` is empty"));
        }

        let signatures = signatures
            .into_iter()
            .map(|signature| match signature {
                Value::Object(mut signature) => EncodedSignature::take_from(&mut signature),
                other => Err(type_mismatch("signatures", "a list of objects", &other)),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            payload,
            signatures,
        })
    }
}

impl<'de> Deserialize<'de> for JWSFlattened {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::deserialize(deserializer)?;
        Self::from_json_map(map).map_err(|err| D::Error::custom(describe(&err)))
    }
}

impl<'de> Deserialize<'de> for JWS {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::deserialize(deserializer)?;
        Self::from_json_map(map).map_err(|err| D::Error::custom(describe(&err)))
    }
}
