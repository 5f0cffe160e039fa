use std::fmt;

use aws_lc_rs::{
    encoding::{AsDer as _, Pkcs8V1Der},
    rsa::KeySize,
    signature::{RsaKeyPair, RsaPublicKeyComponents},
};
use jwx_error::ErrorContext as _;
use num_bigint::BigUint;
use serde_json::{Map, Value};

use super::{KeyHeaders, RawKey, impl_key_headers};
use crate::error::{Error, Result};
use crate::jose::der::{self, RsaPrivateComponents};
use crate::jose::encoding::{decode_uint, encode_uint};
use crate::jose::jwa::KeyType;

#[derive(Clone, PartialEq)]
/// An RSA public key: modulus `n` and public exponent `e`.
pub struct RsaPublicKey {
    pub(super) headers: KeyHeaders,
    n: BigUint,
    e: BigUint,
}

#[derive(Clone, PartialEq)]
/// An RSA private key with two primes.
///
/// The CRT parameters are optional, missing ones are
/// derived from `d`, `p` and `q` when the key is materialized.
pub struct RsaPrivateKey {
    pub(super) public: RsaPublicKey,
    d: BigUint,
    p: BigUint,
    q: BigUint,
    dp: Option<BigUint>,
    dq: Option<BigUint>,
    qi: Option<BigUint>,
}

impl_key_headers!(RsaPublicKey, KeyType::Rsa, headers);
impl_key_headers!(RsaPrivateKey, KeyType::Rsa, public.headers);

fn required(name: &'static str, value: Option<String>) -> Result<BigUint> {
    let value =
        value.ok_or_else(|| Error::schema_violation(format!("rsa key: missing field `{name}`")))?;
    decode_uint(name, &value)
}

fn optional(name: &'static str, value: Option<String>) -> Result<Option<BigUint>> {
    value.map(|value| decode_uint(name, &value)).transpose()
}

impl RsaPublicKey {
    /// Create an [`RsaPublicKey`] from its modulus and exponent.
    ///
    /// The headers only carry the key type.
    #[must_use]
    pub fn new(n: BigUint, e: BigUint) -> Self {
        Self {
            headers: KeyHeaders::for_key_type(KeyType::Rsa),
            n,
            e,
        }
    }

    pub(super) fn from_raw(mut raw: RawKey) -> Result<Self> {
        let n = required("n", raw.n.take())?;
        let e = required("e", raw.e.take())?;
        Ok(Self {
            headers: raw.into_headers(),
            n,
            e,
        })
    }

    /// The modulus `n`.
    pub fn modulus(&self) -> &BigUint {
        &self.n
    }

    /// The public exponent `e`.
    pub fn exponent(&self) -> &BigUint {
        &self.e
    }

    /// Big endian modulus and exponent, as used by aws-lc to verify signatures.
    pub fn materialize(&self) -> RsaPublicKeyComponents<Vec<u8>> {
        RsaPublicKeyComponents {
            n: self.n.to_bytes_be(),
            e: self.e.to_bytes_be(),
        }
    }

    /// The DER encoded `SubjectPublicKeyInfo` of this key.
    pub fn public_key_der(&self) -> Vec<u8> {
        der::rsa_subject_public_key_info(&self.n, &self.e)
    }

    /// Write the headers followed by `n` and `e` into `map`.
    pub fn populate(&self, map: &mut Map<String, Value>) {
        self.headers.populate(map);
        map.insert("n".to_owned(), Value::String(encode_uint(&self.n)));
        map.insert("e".to_owned(), Value::String(encode_uint(&self.e)));
    }
}

impl RsaPrivateKey {
    fn from_components(headers: KeyHeaders, key: RsaPrivateComponents) -> Result<Self> {
        if key.p <= BigUint::from(1u8) || key.q <= BigUint::from(1u8) {
            return Err(Error::malformed_input("rsa private key: primes must be larger than one"));
        }
        Ok(Self {
            public: RsaPublicKey {
                headers,
                n: key.n,
                e: key.e,
            },
            d: key.d,
            p: key.p,
            q: key.q,
            dp: Some(key.dp),
            dq: Some(key.dq),
            qi: Some(key.qi),
        })
    }

    /// Create an [`RsaPrivateKey`] from a PKCS #1 `RSAPrivateKey`
    /// or a PKCS #8 document wrapping one.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let key = der::read_rsa_private_key(der)?;
        Self::from_components(KeyHeaders::for_key_type(KeyType::Rsa), key)
    }

    /// Create an [`RsaPrivateKey`] from an aws-lc [`RsaKeyPair`].
    pub fn from_key_pair(key_pair: &RsaKeyPair) -> Result<Self> {
        let pkcs8: Pkcs8V1Der<'static> = key_pair
            .as_der()
            .context("export rsa key pair as pkcs8")
            .map_err(Error::crypto)?;
        Self::from_der(pkcs8.as_ref())
    }

    /// Generate a new [`RsaPrivateKey`] of the given size.
    pub fn generate(size: KeySize) -> Result<Self> {
        let key_pair = RsaKeyPair::generate(size)
            .context("generate rsa key pair")
            .map_err(Error::crypto)?;
        Self::from_key_pair(&key_pair)
    }

    pub(super) fn from_raw(mut raw: RawKey) -> Result<Self> {
        let d = required("d", raw.d.take())?;
        let p = required("p", raw.p.take())?;
        let q = required("q", raw.q.take())?;
        if p <= BigUint::from(1u8) || q <= BigUint::from(1u8) {
            return Err(Error::malformed_input("rsa private key: primes must be larger than one"));
        }
        let dp = optional("dp", raw.dp.take())?;
        let dq = optional("dq", raw.dq.take())?;
        let qi = optional("qi", raw.qi.take())?;
        let public = RsaPublicKey::from_raw(raw)?;
        Ok(Self {
            public,
            d,
            p,
            q,
            dp,
            dq,
            qi,
        })
    }

    /// The public half of this key, with the same headers.
    pub fn public_key(&self) -> RsaPublicKey {
        self.public.clone()
    }

    /// The `RSAPrivateKey` components, deriving missing CRT parameters.
    fn components(&self) -> Result<RsaPrivateComponents> {
        let one = BigUint::from(1u8);
        let dp = match &self.dp {
            Some(dp) => dp.clone(),
            None => &self.d % (&self.p - &one),
        };
        let dq = match &self.dq {
            Some(dq) => dq.clone(),
            None => &self.d % (&self.q - &one),
        };
        let qi = match &self.qi {
            Some(qi) => qi.clone(),
            None => self.q.modinv(&self.p).ok_or_else(|| {
                Error::crypto("rsa private key: q has no inverse modulo p")
            })?,
        };
        Ok(RsaPrivateComponents {
            n: self.public.n.clone(),
            e: self.public.e.clone(),
            d: self.d.clone(),
            p: self.p.clone(),
            q: self.q.clone(),
            dp,
            dq,
            qi,
        })
    }

    /// The PKCS #1 `RSAPrivateKey` DER encoding of this key.
    pub fn to_pkcs1_der(&self) -> Result<Vec<u8>> {
        Ok(der::rsa_private_key(&self.components()?))
    }

    /// Convert this key into an aws-lc [`RsaKeyPair`].
    ///
    /// aws-lc validates the key, inconsistent components fail here.
    pub fn materialize(&self) -> Result<RsaKeyPair> {
        RsaKeyPair::from_der(&self.to_pkcs1_der()?)
            .context("load rsa private key")
            .map_err(Error::crypto)
    }

    /// Write the public parameters followed by the private ones into `map`.
    ///
    /// CRT parameters are only written when present.
    pub fn populate(&self, map: &mut Map<String, Value>) {
        self.public.populate(map);
        let params = [
            ("d", Some(&self.d)),
            ("p", Some(&self.p)),
            ("q", Some(&self.q)),
            ("dp", self.dp.as_ref()),
            ("dq", self.dq.as_ref()),
            ("qi", self.qi.as_ref()),
        ];
        for (name, value) in params {
            if let Some(value) = value {
                map.insert(name.to_owned(), Value::String(encode_uint(value)));
            }
        }
    }
}

impl fmt::Debug for RsaPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaPublicKey")
            .field("headers", &self.headers)
            .field("bits", &self.n.bits())
            .finish()
    }
}

impl fmt::Debug for RsaPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaPrivateKey")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}
