//! [`JWK`] or JSON Web Key as defined in [`rfc7517`]
//!
//! A [`Key`] is one of five variants, selected once by the `kty` parameter
//! (and the presence of `d` for RSA and EC keys) when it is constructed.
//! Each variant owns its [`KeyHeaders`] and its key material.
//!
//! [`JWK`]: https://datatracker.ietf.org/doc/html/rfc7517
//! [`rfc7517`]: https://datatracker.ietf.org/doc/html/rfc7517

use std::fmt;

use aws_lc_rs::{
    digest::{Digest, SHA256, digest},
    signature::{EcdsaKeyPair, RsaKeyPair, RsaPublicKeyComponents, UnparsedPublicKey},
};
use jwx_error::ErrorContext as _;
use jwx_utils::macros::generate_set_and_with;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error as _, ser::SerializeStruct};
use serde_json::{Map, Value};

use super::header::{HeaderValue, Headers, describe, header_fields};
use super::jwa::{KeyOperation, KeyType, SignatureAlgorithm};
use crate::error::{Error, Result};

mod ec;
mod raw;
mod rsa;
mod set;
mod symmetric;

pub use ec::{EcPrivateKey, EcPublicKey};
pub use raw::RawKey;
pub use rsa::{RsaPrivateKey, RsaPublicKey};
pub use set::KeySet;
pub use symmetric::SymmetricKey;

#[doc(inline)]
pub use aws_lc_rs::rsa::KeySize as RsaKeySize;

/// Value of the "use" parameter for keys meant for signatures.
pub const USE_SIGNATURE: &str = "sig";
/// Value of the "use" parameter for keys meant for encryption.
pub const USE_ENCRYPTION: &str = "enc";

header_fields! {
    /// Registered parameters shared by every [`Key`], see section 4 of [`rfc7517`].
    ///
    /// [`rfc7517`]: https://datatracker.ietf.org/doc/html/rfc7517#section-4
    pub struct KeyFields {
        kty: KeyType => "kty",
        key_use: String => "use",
        key_ops: Vec<KeyOperation> => "key_ops",
        alg: String => "alg",
        kid: String => "kid",
    }
}

/// The headers of a [`Key`].
pub type KeyHeaders = Headers<KeyFields>;

impl Headers<KeyFields> {
    pub(crate) fn for_key_type(kty: KeyType) -> Self {
        let mut headers = Self::default();
        headers.fields.kty = Some(kty);
        headers
    }

    /// The "kty" (key type) parameter.
    pub fn key_type(&self) -> Option<KeyType> {
        self.fields.kty
    }

    /// The "use" (public key use) parameter.
    pub fn key_use(&self) -> Option<&str> {
        self.fields.key_use.as_deref()
    }

    /// The "key_ops" (key operations) parameter.
    pub fn key_ops(&self) -> Option<&[KeyOperation]> {
        self.fields.key_ops.as_deref()
    }

    /// The "alg" (algorithm) parameter, as found on the wire.
    pub fn algorithm(&self) -> Option<&str> {
        self.fields.alg.as_deref()
    }

    /// The "alg" parameter if it names a known [`SignatureAlgorithm`].
    pub fn signature_algorithm(&self) -> Option<SignatureAlgorithm> {
        self.algorithm()
            .and_then(|alg| SignatureAlgorithm::accept(alg).ok())
    }

    /// The "kid" (key id) parameter.
    pub fn key_id(&self) -> Option<&str> {
        self.fields.kid.as_deref()
    }

    generate_set_and_with! {
        /// Set the "use" parameter
        pub fn key_use(mut self, key_use: Option<String>) -> Self {
            self.fields.key_use = key_use;
            self
        }
    }

    generate_set_and_with! {
        /// Set the "key_ops" parameter
        pub fn key_ops(mut self, key_ops: Option<Vec<KeyOperation>>) -> Self {
            self.fields.key_ops = key_ops;
            self
        }
    }

    generate_set_and_with! {
        /// Set the "alg" parameter
        pub fn algorithm(mut self, alg: Option<String>) -> Self {
            self.fields.alg = alg;
            self
        }
    }

    generate_set_and_with! {
        /// Set the "kid" parameter
        pub fn key_id(mut self, kid: Option<String>) -> Self {
            self.fields.kid = kid;
            self
        }
    }
}

/// Set a header on the headers of a key of type `kty`.
///
/// The key type is decided by the kind of key, `kty` may only be
/// "set" to the value it already has.
fn set_key_header(
    headers: &mut KeyHeaders,
    kty: KeyType,
    name: String,
    value: impl Serialize,
) -> Result<()> {
    let value = serde_json::to_value(value)
        .with_context(|| format!("serialize value of key parameter `{name}`"))
        .map_err(Error::type_mismatch)?;
    if name == "kty" {
        let requested = KeyType::from_header_value("kty", value)?;
        if requested != kty {
            return Err(Error::type_mismatch(format!(
                "key type of a {kty} key cannot be changed to {requested}"
            )));
        }
        return Ok(());
    }
    headers.insert(name, value)
}

/// Header accessors shared by all key variants.
macro_rules! impl_key_headers {
    ($ty:ident, $kty:expr, $($headers:ident).+) => {
        impl $ty {
            /// The [`KeyHeaders`](crate::jose::jwk::KeyHeaders) of this key.
            pub fn headers(&self) -> &$crate::jose::jwk::KeyHeaders {
                &self.$($headers).+
            }

            ::jwx_utils::macros::generate_set_and_with! {
                /// Set a key parameter by name, see
                /// [`Headers::try_set_header`](crate::jose::Headers::try_set_header).
                ///
                /// The key type is fixed by the kind of key and cannot be changed.
                pub fn header(
                    mut self,
                    name: impl Into<String>,
                    value: impl ::serde::Serialize,
                ) -> Result<Self, $crate::error::Error> {
                    $crate::jose::jwk::set_key_header(&mut self.$($headers).+, $kty, name.into(), value)?;
                    Ok(self)
                }
            }
        }
    };
}

pub(crate) use impl_key_headers;

#[derive(Clone, PartialEq)]
/// A JSON Web Key.
pub enum Key {
    /// RSA public key, `"kty": "RSA"` without `d`
    RsaPublic(RsaPublicKey),
    /// RSA private key, `"kty": "RSA"` with `d`
    RsaPrivate(RsaPrivateKey),
    /// Elliptic curve public key, `"kty": "EC"` without `d`
    EcPublic(EcPublicKey),
    /// Elliptic curve private key, `"kty": "EC"` with `d`
    EcPrivate(EcPrivateKey),
    /// Symmetric key, `"kty": "oct"`
    Symmetric(SymmetricKey),
}

/// A [`Key`] in the form used by the cryptographic provider.
pub enum KeyMaterial {
    /// RSA public modulus and exponent, unsigned big endian
    RsaPublic(RsaPublicKeyComponents<Vec<u8>>),
    /// RSA key pair
    RsaPrivate(RsaKeyPair),
    /// Uncompressed elliptic curve point, bound to the curve's verification algorithm
    EcPublic(UnparsedPublicKey<Vec<u8>>),
    /// ECDSA key pair
    EcPrivate(EcdsaKeyPair),
    /// Secret octets
    Symmetric(Vec<u8>),
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RsaPublic(_) => "RsaPublic",
            Self::RsaPrivate(_) => "RsaPrivate",
            Self::EcPublic(_) => "EcPublic",
            Self::EcPrivate(_) => "EcPrivate",
            Self::Symmetric(_) => "Symmetric",
        };
        f.debug_tuple(name).finish_non_exhaustive()
    }
}

impl Key {
    /// The [`KeyHeaders`] of this key.
    pub fn headers(&self) -> &KeyHeaders {
        match self {
            Self::RsaPublic(key) => key.headers(),
            Self::RsaPrivate(key) => key.headers(),
            Self::EcPublic(key) => key.headers(),
            Self::EcPrivate(key) => key.headers(),
            Self::Symmetric(key) => key.headers(),
        }
    }

    /// The [`KeyType`] of this key, decided by its variant.
    pub fn key_type(&self) -> KeyType {
        match self {
            Self::RsaPublic(_) | Self::RsaPrivate(_) => KeyType::Rsa,
            Self::EcPublic(_) | Self::EcPrivate(_) => KeyType::Ec,
            Self::Symmetric(_) => KeyType::OctetSeq,
        }
    }

    /// The "kid" parameter of this key, if any.
    pub fn key_id(&self) -> Option<&str> {
        self.headers().key_id()
    }

    /// Returns true for private and symmetric keys.
    pub fn is_secret(&self) -> bool {
        !matches!(self, Self::RsaPublic(_) | Self::EcPublic(_))
    }

    fn headers_mut(&mut self) -> &mut KeyHeaders {
        match self {
            Self::RsaPublic(key) => &mut key.headers,
            Self::RsaPrivate(key) => &mut key.public.headers,
            Self::EcPublic(key) => &mut key.headers,
            Self::EcPrivate(key) => &mut key.public.headers,
            Self::Symmetric(key) => &mut key.headers,
        }
    }

    generate_set_and_with! {
        /// Set a key parameter by name, see [`Headers::try_set_header`].
        ///
        /// The key type is fixed by the variant and cannot be changed.
        pub fn header(
            mut self,
            name: impl Into<String>,
            value: impl Serialize,
        ) -> Result<Self, Error> {
            let kty = self.key_type();
            let headers = self.headers_mut();
            set_key_header(headers, kty, name.into(), value)?;
            Ok(self)
        }
    }

    /// The public half of this key.
    ///
    /// Public keys are returned as is, and so are symmetric keys,
    /// which have no public counterpart.
    pub fn public_key(&self) -> Self {
        match self {
            Self::RsaPrivate(key) => Self::RsaPublic(key.public_key()),
            Self::EcPrivate(key) => Self::EcPublic(key.public_key()),
            Self::RsaPublic(_) | Self::EcPublic(_) | Self::Symmetric(_) => self.clone(),
        }
    }

    /// Convert this key into [`KeyMaterial`] usable by the cryptographic provider.
    pub fn materialize(&self) -> Result<KeyMaterial> {
        Ok(match self {
            Self::RsaPublic(key) => KeyMaterial::RsaPublic(key.materialize()),
            Self::RsaPrivate(key) => KeyMaterial::RsaPrivate(key.materialize()?),
            Self::EcPublic(key) => KeyMaterial::EcPublic(key.materialize()),
            Self::EcPrivate(key) => KeyMaterial::EcPrivate(key.materialize()?),
            Self::Symmetric(key) => KeyMaterial::Symmetric(key.materialize()),
        })
    }

    /// Write the flat json object of this key into `map`.
    pub fn populate(&self, map: &mut Map<String, Value>) {
        match self {
            Self::RsaPublic(key) => key.populate(map),
            Self::RsaPrivate(key) => key.populate(map),
            Self::EcPublic(key) => key.populate(map),
            Self::EcPrivate(key) => key.populate(map),
            Self::Symmetric(key) => key.populate(map),
        }
    }

    /// The flat json object of this key.
    pub fn to_json_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        self.populate(&mut map);
        map
    }

    /// Create a key from its flat json object, dispatching on `kty`.
    pub fn from_json_map(map: Map<String, Value>) -> Result<Self> {
        Self::from_raw(RawKey::from_json_map(map)?)
    }

    /// Create a key from a [`RawKey`] document.
    ///
    /// `RSA` and `EC` keys are private when `d` is present,
    /// any parameter that does not belong to the resolved key type
    /// is kept as a private header parameter.
    pub fn from_raw(raw: RawKey) -> Result<Self> {
        let kty = raw
            .headers
            .key_type()
            .ok_or_else(|| Error::schema_violation("key: missing field `kty`"))?;
        Ok(match kty {
            KeyType::Rsa if raw.d.is_some() => Self::RsaPrivate(RsaPrivateKey::from_raw(raw)?),
            KeyType::Rsa => Self::RsaPublic(RsaPublicKey::from_raw(raw)?),
            KeyType::Ec if raw.d.is_some() => Self::EcPrivate(EcPrivateKey::from_raw(raw)?),
            KeyType::Ec => Self::EcPublic(EcPublicKey::from_raw(raw)?),
            KeyType::OctetSeq => Self::Symmetric(SymmetricKey::from_raw(raw)?),
        })
    }

    /// Parse a single key from its json text.
    pub fn parse(src: &str) -> Result<Self> {
        let map: Map<String, Value> = serde_json::from_str(src)
            .context("parse key json object")
            .map_err(Error::malformed_input)?;
        Self::from_json_map(map)
    }

    /// The [`rfc7638`] thumbprint of this key, using SHA-256.
    ///
    /// Only the required members are hashed, in lexicographic order,
    /// so the thumbprint of a private key equals that of its public key.
    ///
    /// [`rfc7638`]: https://datatracker.ietf.org/doc/html/rfc7638
    pub fn thumbprint_sha256(&self) -> Result<Digest> {
        let members = match self {
            Self::RsaPublic(key) => ThumbprintMembers::Rsa {
                e: super::encoding::encode_uint(key.exponent()),
                n: super::encoding::encode_uint(key.modulus()),
            },
            Self::RsaPrivate(key) => ThumbprintMembers::Rsa {
                e: super::encoding::encode_uint(key.public.exponent()),
                n: super::encoding::encode_uint(key.public.modulus()),
            },
            Self::EcPublic(key) => key.thumbprint_members(),
            Self::EcPrivate(key) => key.public.thumbprint_members(),
            Self::Symmetric(key) => ThumbprintMembers::Oct {
                k: super::encoding::encode(key.as_bytes()),
            },
        };
        let json = serde_json::to_vec(&members)
            .context("serialize thumbprint members")
            .map_err(Error::malformed_input)?;
        Ok(digest(&SHA256, &json))
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RsaPublic(key) => key.fmt(f),
            Self::RsaPrivate(key) => key.fmt(f),
            Self::EcPublic(key) => key.fmt(f),
            Self::EcPrivate(key) => key.fmt(f),
            Self::Symmetric(key) => key.fmt(f),
        }
    }
}

impl From<RsaPublicKey> for Key {
    fn from(key: RsaPublicKey) -> Self {
        Self::RsaPublic(key)
    }
}

impl From<RsaPrivateKey> for Key {
    fn from(key: RsaPrivateKey) -> Self {
        Self::RsaPrivate(key)
    }
}

impl From<EcPublicKey> for Key {
    fn from(key: EcPublicKey) -> Self {
        Self::EcPublic(key)
    }
}

impl From<EcPrivateKey> for Key {
    fn from(key: EcPrivateKey) -> Self {
        Self::EcPrivate(key)
    }
}

impl From<SymmetricKey> for Key {
    fn from(key: SymmetricKey) -> Self {
        Self::Symmetric(key)
    }
}

impl TryFrom<RawKey> for Key {
    type Error = Error;

    fn try_from(raw: RawKey) -> Result<Self> {
        Self::from_raw(raw)
    }
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json_map().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::deserialize(deserializer)?;
        Self::from_json_map(map).map_err(|err| D::Error::custom(describe(&err)))
    }
}

/// A key embedded in a header, such as the "jwk" header of a JWS.
impl HeaderValue for Box<Key> {
    fn from_header_value(name: &str, value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Key::from_json_map(map).map(Box::new),
            other => Err(super::header::type_mismatch(name, "a json web key", &other)),
        }
    }

    fn to_header_value(&self) -> Value {
        Value::Object(self.to_json_map())
    }
}

/// Required members of a key for its thumbprint.
///
/// Order here is important as this output is hashed.
enum ThumbprintMembers {
    Ec {
        crv: &'static str,
        x: String,
        y: String,
    },
    Rsa {
        e: String,
        n: String,
    },
    Oct {
        k: String,
    },
}

impl Serialize for ThumbprintMembers {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Ec { crv, x, y } => {
                let mut state = serializer.serialize_struct("ThumbprintMembers", 4)?;
                state.serialize_field("crv", crv)?;
                state.serialize_field("kty", KeyType::Ec.as_str())?;
                state.serialize_field("x", x)?;
                state.serialize_field("y", y)?;
                state.end()
            }
            Self::Rsa { e, n } => {
                let mut state = serializer.serialize_struct("ThumbprintMembers", 3)?;
                state.serialize_field("e", e)?;
                state.serialize_field("kty", KeyType::Rsa.as_str())?;
                state.serialize_field("n", n)?;
                state.end()
            }
            Self::Oct { k } => {
                let mut state = serializer.serialize_struct("ThumbprintMembers", 2)?;
                state.serialize_field("k", k)?;
                state.serialize_field("kty", KeyType::OctetSeq.as_str())?;
                state.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::jose::jwa::EllipticCurve;

    pub(super) const RFC_RSA_N: &str = "0vx7agoebGcQSuuPiLJXZptN9nndrQmbXEps2aiAFbWhM78LhWx4cbbfAAtVT86zwu1RK7aPFFxuhDR1L6tSoc_BJECPebWKRXjBZCiFV4n3oknjhMstn64tZ_2W-5JsGY4Hc5n9yBXArwl93lqt7_RN5w6Cf0h4QyQ5v-65YGjQR0_FDW2QvzqY368QQMicAtaSqzs8KJZgnYb9c7d0zgdAZHzu6qMQvRL5hajrn1n91CbOpbISD08qNLyrdkt-bFTWhAI4vMQFh6WeZu0fM4lFd2NcRwr3XPksINHaQ-G_xBniIqbw0Ls1jF44-csFCur-kEgU8awapJzKnqDKgw";

    fn object(value: Value) -> Map<String, Value> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn thumbprint_member_order() {
        let members = ThumbprintMembers::Ec {
            crv: "P-256",
            x: "x".into(),
            y: "y".into(),
        };
        assert_eq!(
            serde_json::to_string(&members).unwrap(),
            r#"{"crv":"P-256","kty":"EC","x":"x","y":"y"}"#
        );

        let members = ThumbprintMembers::Rsa {
            e: "e".into(),
            n: "n".into(),
        };
        assert_eq!(
            serde_json::to_string(&members).unwrap(),
            r#"{"e":"e","kty":"RSA","n":"n"}"#
        );

        let members = ThumbprintMembers::Oct { k: "k".into() };
        assert_eq!(
            serde_json::to_string(&members).unwrap(),
            r#"{"k":"k","kty":"oct"}"#
        );
    }

    #[test]
    fn rfc7638_thumbprint() {
        // example of section 3.1 of rfc7638
        let key = assert_ok!(Key::from_json_map(object(json!({
            "kty": "RSA",
            "n": RFC_RSA_N,
            "e": "AQAB",
            "alg": "RS256",
            "kid": "2011-04-29",
        }))));
        let thumbprint = key.thumbprint_sha256().unwrap();
        assert_eq!(
            super::super::encoding::encode(thumbprint.as_ref()),
            "NzbLsXh8uDCcd-6MNwXF4W_7noWXFZAfHkxZsRGC9Xs"
        );
    }

    #[test]
    fn kty_dispatch() {
        let rsa = RsaPrivateKey::generate(RsaKeySize::Rsa2048).unwrap();
        let map = Key::from(rsa).to_json_map();
        assert!(map.contains_key("d"));
        assert!(matches!(
            assert_ok!(Key::from_json_map(map.clone())),
            Key::RsaPrivate(_)
        ));

        let mut public = map;
        for name in ["d", "p", "q", "dp", "dq", "qi"] {
            public.remove(name);
        }
        assert!(matches!(
            assert_ok!(Key::from_json_map(public)),
            Key::RsaPublic(_)
        ));

        let oct = assert_ok!(Key::from_json_map(object(json!({"kty": "oct", "k": "c2VjcmV0"}))));
        assert_eq!(oct.key_type(), KeyType::OctetSeq);
    }

    #[test]
    fn ec_requires_curve_and_coordinates() {
        let ec = EcPrivateKey::generate(EllipticCurve::P256).unwrap();
        let map = Key::from(ec.public_key()).to_json_map();
        for name in ["crv", "x", "y"] {
            let mut incomplete = map.clone();
            incomplete.remove(name);
            let err = assert_err!(Key::from_json_map(incomplete));
            assert!(err.is_schema_violation(), "missing {name}: {err:?}");
        }
    }

    #[test]
    fn unknown_or_missing_kty_is_rejected() {
        let err = assert_err!(Key::from_json_map(object(json!({"kty": "OKP", "x": "AQAB"}))));
        assert!(err.is_unknown_symbol());

        let err = assert_err!(Key::from_json_map(object(json!({"k": "AQAB"}))));
        assert!(err.is_schema_violation());

        let err = assert_err!(Key::from_json_map(object(json!({"kty": 1, "k": "AQAB"}))));
        assert!(err.is_type_mismatch());

        let err = assert_err!(Key::parse("{not json"));
        assert!(err.is_malformed_input());
    }

    #[test]
    fn key_type_cannot_be_changed() {
        let key = Key::from(SymmetricKey::new(b"0123456789abcdef".to_vec()));
        let key = assert_ok!(key.try_with_header("kty", "oct"));
        let err = assert_err!(key.clone().try_with_header("kty", "RSA"));
        assert!(err.is_type_mismatch());

        let key = assert_ok!(key.try_with_header("kid", "my-key"));
        assert_eq!(key.key_id(), Some("my-key"));
        assert_eq!(key.headers().key_type(), Some(KeyType::OctetSeq));
    }

    #[test]
    fn foreign_parameters_round_trip_as_private() {
        let map = object(json!({
            "kty": "oct",
            "k": "c2VjcmV0",
            "crv": "P-256",
            "x5t": "abc",
        }));
        let key = assert_ok!(Key::from_json_map(map.clone()));
        assert_eq!(key.headers().get("crv"), Some(json!("P-256")));
        assert_eq!(key.to_json_map(), map);
    }

    #[test]
    fn secrets_are_not_printed() {
        let key = Key::from(SymmetricKey::new(b"super secret bytes".to_vec()));
        let debug = format!("{key:?}");
        assert!(!debug.contains("super"));
        assert!(!debug.contains(&super::super::encoding::encode(b"super secret bytes")));
    }

    #[test]
    fn key_headers_typed_setters() {
        let headers = KeyHeaders::default()
            .with_key_id("k1".to_owned())
            .with_key_use(USE_SIGNATURE.to_owned())
            .with_algorithm("ES256".to_owned())
            .with_key_ops(vec![KeyOperation::Sign, KeyOperation::Verify]);

        assert_eq!(headers.signature_algorithm(), Some(SignatureAlgorithm::ES256));
        assert_eq!(
            headers.to_json_map(),
            object(json!({
                "use": "sig",
                "key_ops": ["sign", "verify"],
                "alg": "ES256",
                "kid": "k1",
            }))
        );

        let headers = headers.with_algorithm("RSA-OAEP".to_owned());
        assert_eq!(headers.algorithm(), Some("RSA-OAEP"));
        assert_eq!(headers.signature_algorithm(), None);
    }
}
