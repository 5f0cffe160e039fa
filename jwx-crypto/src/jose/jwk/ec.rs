use std::fmt;

use aws_lc_rs::signature::{EcdsaKeyPair, KeyPair as _, UnparsedPublicKey};
use jwx_error::ErrorContext as _;
use serde_json::{Map, Value};

use super::{KeyHeaders, RawKey, ThumbprintMembers, impl_key_headers};
use crate::error::{Error, Result};
use crate::jose::der;
use crate::jose::encoding::{decode, encode, pad_to};
use crate::jose::jwa::{EllipticCurve, KeyType};

/// Prefix of an uncompressed elliptic curve point.
const UNCOMPRESSED_POINT_TAG: u8 = 0x04;

#[derive(Clone, PartialEq)]
/// An elliptic curve public key on one of the supported named curves.
///
/// Coordinates are kept at the full width of the curve.
pub struct EcPublicKey {
    pub(super) headers: KeyHeaders,
    curve: EllipticCurve,
    x: Vec<u8>,
    y: Vec<u8>,
}

#[derive(Clone, PartialEq)]
/// An elliptic curve private key, the public point plus the private scalar `d`.
pub struct EcPrivateKey {
    pub(super) public: EcPublicKey,
    d: Vec<u8>,
}

impl_key_headers!(EcPublicKey, KeyType::Ec, headers);
impl_key_headers!(EcPrivateKey, KeyType::Ec, public.headers);

/// Decode a coordinate or scalar, which must fit the curve.
fn curve_param(name: &'static str, encoded: &str, curve: EllipticCurve) -> Result<Vec<u8>> {
    let bytes = decode(name, encoded)?;
    if bytes.is_empty() {
        return Err(Error::malformed_input(format!("`{name}` is empty")));
    }
    pad_to(name, &bytes, curve.coordinate_size())
}

fn required(name: &'static str, value: Option<String>) -> Result<String> {
    value.ok_or_else(|| Error::schema_violation(format!("ec key: missing field `{name}`")))
}

impl EcPublicKey {
    /// Create an [`EcPublicKey`] from its big endian coordinates.
    ///
    /// Shorter coordinates are left padded, longer ones are rejected.
    pub fn new(curve: EllipticCurve, x: &[u8], y: &[u8]) -> Result<Self> {
        let size = curve.coordinate_size();
        Ok(Self {
            headers: KeyHeaders::for_key_type(KeyType::Ec),
            curve,
            x: pad_to("x", x, size)?,
            y: pad_to("y", y, size)?,
        })
    }

    /// Create an [`EcPublicKey`] from an uncompressed point, `0x04 || x || y`.
    pub fn from_point(curve: EllipticCurve, point: &[u8]) -> Result<Self> {
        let size = curve.coordinate_size();
        match point.split_first() {
            Some((&UNCOMPRESSED_POINT_TAG, coordinates)) if coordinates.len() == 2 * size => {
                let (x, y) = coordinates.split_at(size);
                Self::new(curve, x, y)
            }
            _ => Err(Error::malformed_input(format!(
                "expected an uncompressed {curve} point of {} bytes",
                1 + 2 * size
            ))),
        }
    }

    pub(super) fn from_raw(mut raw: RawKey) -> Result<Self> {
        let crv = required("crv", raw.crv.take())?;
        let x = required("x", raw.x.take())?;
        let y = required("y", raw.y.take())?;
        let curve = EllipticCurve::accept(crv)?;
        let x = curve_param("x", &x, curve)?;
        let y = curve_param("y", &y, curve)?;
        Ok(Self {
            headers: raw.into_headers(),
            curve,
            x,
            y,
        })
    }

    /// The named curve of this key.
    pub fn curve(&self) -> EllipticCurve {
        self.curve
    }

    /// The x coordinate, big endian at the full width of the curve.
    pub fn x(&self) -> &[u8] {
        &self.x
    }

    /// The y coordinate, big endian at the full width of the curve.
    pub fn y(&self) -> &[u8] {
        &self.y
    }

    /// The uncompressed point, `0x04 || x || y`.
    pub fn point(&self) -> Vec<u8> {
        let mut point = Vec::with_capacity(1 + self.x.len() + self.y.len());
        point.push(UNCOMPRESSED_POINT_TAG);
        point.extend_from_slice(&self.x);
        point.extend_from_slice(&self.y);
        point
    }

    /// Convert this key to an unparsed public key which can be used to verify signatures
    ///
    /// Warning no verification is done on this key until `.verify()` is called,
    /// a point that is not on the curve fails there.
    pub fn materialize(&self) -> UnparsedPublicKey<Vec<u8>> {
        UnparsedPublicKey::new(self.curve.verification_algorithm(), self.point())
    }

    /// Write the headers followed by `crv`, `x` and `y` into `map`.
    pub fn populate(&self, map: &mut Map<String, Value>) {
        self.headers.populate(map);
        map.insert("crv".to_owned(), Value::String(self.curve.as_str().to_owned()));
        map.insert("x".to_owned(), Value::String(encode(&self.x)));
        map.insert("y".to_owned(), Value::String(encode(&self.y)));
    }

    pub(super) fn thumbprint_members(&self) -> ThumbprintMembers {
        ThumbprintMembers::Ec {
            crv: self.curve.as_str(),
            x: encode(&self.x),
            y: encode(&self.y),
        }
    }
}

impl EcPrivateKey {
    /// Create an [`EcPrivateKey`] from a PKCS #8 v1 document.
    ///
    /// The curve is read from the document.
    pub fn from_pkcs8_der(pkcs8: &[u8]) -> Result<Self> {
        let (curve, d) = der::read_ec_private_key_pkcs8(pkcs8)?;
        let key_pair = EcdsaKeyPair::from_pkcs8(curve.signing_algorithm(), pkcs8)
            .context("load ec private key from pkcs8")
            .map_err(Error::crypto)?;
        Ok(Self {
            public: EcPublicKey::from_point(curve, key_pair.public_key().as_ref())?,
            d: pad_to("d", &d, curve.coordinate_size())?,
        })
    }

    /// Create an [`EcPrivateKey`] from an aws-lc [`EcdsaKeyPair`].
    pub fn from_key_pair(key_pair: &EcdsaKeyPair) -> Result<Self> {
        let pkcs8 = key_pair
            .to_pkcs8v1()
            .context("export ec key pair as pkcs8")
            .map_err(Error::crypto)?;
        Self::from_pkcs8_der(pkcs8.as_ref())
    }

    /// Generate a new [`EcPrivateKey`] on the given curve.
    pub fn generate(curve: EllipticCurve) -> Result<Self> {
        let key_pair = EcdsaKeyPair::generate(curve.signing_algorithm())
            .context("generate ec key pair")
            .map_err(Error::crypto)?;
        Self::from_key_pair(&key_pair)
    }

    pub(super) fn from_raw(mut raw: RawKey) -> Result<Self> {
        let d = required("d", raw.d.take())?;
        let public = EcPublicKey::from_raw(raw)?;
        let d = curve_param("d", &d, public.curve)?;
        Ok(Self { public, d })
    }

    /// The named curve of this key.
    pub fn curve(&self) -> EllipticCurve {
        self.public.curve
    }

    /// The public half of this key, with the same headers.
    pub fn public_key(&self) -> EcPublicKey {
        self.public.clone()
    }

    /// The PKCS #8 v1 DER encoding of this key.
    pub fn to_pkcs8_der(&self) -> Vec<u8> {
        der::ec_private_key_pkcs8(self.public.curve, &self.d, &self.public.point())
    }

    /// Convert this key into an aws-lc [`EcdsaKeyPair`].
    ///
    /// aws-lc checks that the point is on the curve and belongs to `d`.
    pub fn materialize(&self) -> Result<EcdsaKeyPair> {
        EcdsaKeyPair::from_pkcs8(self.public.curve.signing_algorithm(), &self.to_pkcs8_der())
            .context("load ec private key")
            .map_err(Error::crypto)
    }

    /// Write the public parameters followed by `d` into `map`.
    pub fn populate(&self, map: &mut Map<String, Value>) {
        self.public.populate(map);
        map.insert("d".to_owned(), Value::String(encode(&self.d)));
    }
}

impl fmt::Debug for EcPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EcPublicKey")
            .field("headers", &self.headers)
            .field("curve", &self.curve)
            .field("x", &encode(&self.x))
            .field("y", &encode(&self.y))
            .finish()
    }
}

impl fmt::Debug for EcPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EcPrivateKey")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}
