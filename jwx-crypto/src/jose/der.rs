//! Minimal DER support for the key encodings handed to and received from aws-lc.
//!
//! Only the handful of structures we need are covered:
//! `SubjectPublicKeyInfo` for RSA ([RFC 5280]), `RSAPrivateKey` ([RFC 8017]),
//! `ECPrivateKey` ([RFC 5915]) and the `PrivateKeyInfo` wrapper of
//! [PKCS #8] around the latter two.
//!
//! This must ***NOT*** be used as a general ASN.1 parser.
//!
//! [RFC 5280]: https://datatracker.ietf.org/doc/rfc5280/
//! [RFC 8017]: https://datatracker.ietf.org/doc/rfc8017/
//! [RFC 5915]: https://datatracker.ietf.org/doc/rfc5915/
//! [PKCS #8]: https://datatracker.ietf.org/doc/rfc5208/

use jwx_error::OpaqueError;
use num_bigint::BigUint;

use super::constants::{
    BIT_STRING_NO_UNUSED_BITS, DER_LENGTH_SHORT_FORM_MAX, DER_TAG_BIT_STRING, DER_TAG_CONTEXT_1,
    DER_TAG_INTEGER, DER_TAG_OBJECT_IDENTIFIER, DER_TAG_OCTET_STRING, DER_TAG_SEQUENCE,
    INTEGER_SIGN_BIT_MASK, OID_CURVE_P256, OID_CURVE_P384, OID_CURVE_P521, OID_EC_PUBLIC_KEY,
    OID_RSA_ENCRYPTION, RSA_ALGORITHM_IDENTIFIER,
};
use super::jwa::EllipticCurve;
use crate::error::{Error, Result};

/// Components of an `RSAPrivateKey`, all as unsigned big endian integers.
#[cfg_attr(test, derive(Debug))]
pub(super) struct RsaPrivateComponents {
    pub(super) n: BigUint,
    pub(super) e: BigUint,
    pub(super) d: BigUint,
    pub(super) p: BigUint,
    pub(super) q: BigUint,
    pub(super) dp: BigUint,
    pub(super) dq: BigUint,
    pub(super) qi: BigUint,
}

/// The `SubjectPublicKeyInfo` of an RSA public key:
///
///```text
/// SubjectPublicKeyInfo = SEQUENCE {
///     algorithm AlgorithmIdentifier,
///     subjectPublicKey BIT STRING  -- RSAPublicKey = SEQUENCE { modulus INTEGER, exponent INTEGER }
/// }
///```
pub(super) fn rsa_subject_public_key_info(n: &BigUint, e: &BigUint) -> Vec<u8> {
    let rsa_public_key = encode_sequence(&[encode_uint(n), encode_uint(e)]);

    let mut bit_string = Vec::with_capacity(1 + rsa_public_key.len());
    bit_string.push(BIT_STRING_NO_UNUSED_BITS);
    bit_string.extend_from_slice(&rsa_public_key);

    encode_sequence(&[
        RSA_ALGORITHM_IDENTIFIER.to_vec(),
        encode_tlv(DER_TAG_BIT_STRING, &bit_string),
    ])
}

/// The two-prime `RSAPrivateKey` structure of section A.1.2 of RFC 8017.
pub(super) fn rsa_private_key(key: &RsaPrivateComponents) -> Vec<u8> {
    encode_sequence(&[
        encode_tlv(DER_TAG_INTEGER, &[0]),
        encode_uint(&key.n),
        encode_uint(&key.e),
        encode_uint(&key.d),
        encode_uint(&key.p),
        encode_uint(&key.q),
        encode_uint(&key.dp),
        encode_uint(&key.dq),
        encode_uint(&key.qi),
    ])
}

/// A PKCS #8 v1 `PrivateKeyInfo` wrapping an `ECPrivateKey`.
///
/// `private_scalar` must already be padded to the curve size and
/// `public_point` is the uncompressed `0x04 || x || y` point.
pub(super) fn ec_private_key_pkcs8(
    curve: EllipticCurve,
    private_scalar: &[u8],
    public_point: &[u8],
) -> Vec<u8> {
    let mut public_bits = Vec::with_capacity(1 + public_point.len());
    public_bits.push(BIT_STRING_NO_UNUSED_BITS);
    public_bits.extend_from_slice(public_point);

    let ec_private_key = encode_sequence(&[
        encode_tlv(DER_TAG_INTEGER, &[1]),
        encode_tlv(DER_TAG_OCTET_STRING, private_scalar),
        encode_tlv(
            DER_TAG_CONTEXT_1,
            &encode_tlv(DER_TAG_BIT_STRING, &public_bits),
        ),
    ]);

    let algorithm = encode_sequence(&[
        encode_tlv(DER_TAG_OBJECT_IDENTIFIER, OID_EC_PUBLIC_KEY),
        encode_tlv(DER_TAG_OBJECT_IDENTIFIER, curve_oid(curve)),
    ]);

    encode_sequence(&[
        encode_tlv(DER_TAG_INTEGER, &[0]),
        algorithm,
        encode_tlv(DER_TAG_OCTET_STRING, &ec_private_key),
    ])
}

/// Read an `RSAPrivateKey`, either bare (PKCS #1) or wrapped in PKCS #8.
pub(super) fn read_rsa_private_key(der: &[u8]) -> Result<RsaPrivateComponents> {
    let mut outer = DerReader::new(der).read_sequence()?;
    let _version = outer.read_integer()?;

    if outer.peek_tag() == Some(DER_TAG_SEQUENCE) {
        // PKCS #8: AlgorithmIdentifier followed by the wrapped key
        let mut algorithm = outer.read_sequence()?;
        let oid = algorithm.read_expected(DER_TAG_OBJECT_IDENTIFIER)?;
        if oid != OID_RSA_ENCRYPTION {
            return Err(malformed("pkcs8: algorithm is not rsaEncryption"));
        }
        let inner = outer.read_expected(DER_TAG_OCTET_STRING)?;
        return read_rsa_private_key(inner);
    }

    let key = RsaPrivateComponents {
        n: outer.read_integer()?,
        e: outer.read_integer()?,
        d: outer.read_integer()?,
        p: outer.read_integer()?,
        q: outer.read_integer()?,
        dp: outer.read_integer()?,
        dq: outer.read_integer()?,
        qi: outer.read_integer()?,
    };
    Ok(key)
}

/// Read the curve and private scalar of a PKCS #8 wrapped `ECPrivateKey`.
pub(super) fn read_ec_private_key_pkcs8(der: &[u8]) -> Result<(EllipticCurve, Vec<u8>)> {
    let mut outer = DerReader::new(der).read_sequence()?;
    let _version = outer.read_integer()?;

    let mut algorithm = outer.read_sequence()?;
    if algorithm.read_expected(DER_TAG_OBJECT_IDENTIFIER)? != OID_EC_PUBLIC_KEY {
        return Err(malformed("pkcs8: algorithm is not id-ecPublicKey"));
    }
    let curve_oid = algorithm.read_expected(DER_TAG_OBJECT_IDENTIFIER)?;
    let curve = EllipticCurve::ALL
        .iter()
        .copied()
        .find(|curve| self::curve_oid(*curve) == curve_oid)
        .ok_or_else(|| malformed("pkcs8: unsupported named curve"))?;

    let mut ec_private_key =
        DerReader::new(outer.read_expected(DER_TAG_OCTET_STRING)?).read_sequence()?;
    let _version = ec_private_key.read_integer()?;
    let scalar = ec_private_key.read_expected(DER_TAG_OCTET_STRING)?;

    Ok((curve, scalar.to_vec()))
}

fn curve_oid(curve: EllipticCurve) -> &'static [u8] {
    match curve {
        EllipticCurve::P256 => OID_CURVE_P256,
        EllipticCurve::P384 => OID_CURVE_P384,
        EllipticCurve::P521 => OID_CURVE_P521,
    }
}

fn malformed(msg: &'static str) -> Error {
    Error::malformed_input(OpaqueError::from_display(msg))
}

/// Sequential reader over DER encoded TLV values.
struct DerReader<'a> {
    input: &'a [u8],
}

impl<'a> DerReader<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self { input }
    }

    fn peek_tag(&self) -> Option<u8> {
        self.input.first().copied()
    }

    fn read_tlv(&mut self) -> Result<(u8, &'a [u8])> {
        let (&tag, rest) = self
            .input
            .split_first()
            .ok_or_else(|| malformed("der: unexpected end of input"))?;
        let (&first, mut rest) = rest
            .split_first()
            .ok_or_else(|| malformed("der: missing length"))?;

        let len = if usize::from(first) <= DER_LENGTH_SHORT_FORM_MAX {
            usize::from(first)
        } else {
            let octets = usize::from(first & !INTEGER_SIGN_BIT_MASK);
            if octets == 0 || octets > 4 || rest.len() < octets {
                return Err(malformed("der: invalid long form length"));
            }
            let (len_bytes, remainder) = rest.split_at(octets);
            rest = remainder;
            len_bytes
                .iter()
                .fold(0usize, |acc, byte| (acc << 8) | usize::from(*byte))
        };

        if rest.len() < len {
            return Err(malformed("der: value exceeds input"));
        }
        let (value, remainder) = rest.split_at(len);
        self.input = remainder;
        Ok((tag, value))
    }

    fn read_expected(&mut self, expected: u8) -> Result<&'a [u8]> {
        match self.read_tlv()? {
            (tag, value) if tag == expected => Ok(value),
            _ => Err(malformed("der: unexpected tag")),
        }
    }

    fn read_sequence(&mut self) -> Result<Self> {
        self.read_expected(DER_TAG_SEQUENCE).map(DerReader::new)
    }

    fn read_integer(&mut self) -> Result<BigUint> {
        let value = self.read_expected(DER_TAG_INTEGER)?;
        if value.first().is_some_and(|b| b & INTEGER_SIGN_BIT_MASK != 0) {
            return Err(malformed("der: negative integer"));
        }
        Ok(BigUint::from_bytes_be(value))
    }
}

fn encode_sequence(items: &[Vec<u8>]) -> Vec<u8> {
    encode_tlv(DER_TAG_SEQUENCE, &items.concat())
}

fn encode_tlv(tag: u8, value: &[u8]) -> Vec<u8> {
    let len = encode_length(value.len());
    let mut result = Vec::with_capacity(1 + len.len() + value.len());
    result.push(tag);
    result.extend_from_slice(&len);
    result.extend_from_slice(value);
    result
}

/// Length encoding as defined in section 8.1.3 of
/// [ITU X.690](https://www.itu.int/ITU-T/studygroups/com17/languages/X.690-0207.pdf).
fn encode_length(len: usize) -> Vec<u8> {
    if len <= DER_LENGTH_SHORT_FORM_MAX {
        return vec![len as u8];
    }
    let len_bytes: Vec<u8> = len
        .to_be_bytes()
        .into_iter()
        .skip_while(|byte| *byte == 0)
        .collect();
    let mut result = Vec::with_capacity(1 + len_bytes.len());
    result.push(INTEGER_SIGN_BIT_MASK | len_bytes.len() as u8);
    result.extend_from_slice(&len_bytes);
    result
}

/// A positive DER `INTEGER` in minimal form, with a leading zero
/// octet when the most significant bit is set.
fn encode_uint(value: &BigUint) -> Vec<u8> {
    let bytes = value.to_bytes_be();
    let needs_leading_zero = bytes[0] & INTEGER_SIGN_BIT_MASK != 0;
    if needs_leading_zero {
        let mut padded = Vec::with_capacity(bytes.len() + 1);
        padded.push(0);
        padded.extend_from_slice(&bytes);
        encode_tlv(DER_TAG_INTEGER, &padded)
    } else {
        encode_tlv(DER_TAG_INTEGER, &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_encoding() {
        assert_eq!(encode_length(0), vec![0x00]);
        assert_eq!(encode_length(127), vec![0x7f]);
        assert_eq!(encode_length(128), vec![0x81, 0x80]);
        assert_eq!(encode_length(256), vec![0x82, 0x01, 0x00]);
    }

    #[test]
    fn integer_encoding_adds_sign_octet() {
        assert_eq!(encode_uint(&BigUint::from(0u8)), vec![0x02, 0x01, 0x00]);
        assert_eq!(encode_uint(&BigUint::from(0x7fu8)), vec![0x02, 0x01, 0x7f]);
        assert_eq!(encode_uint(&BigUint::from(0x80u8)), vec![0x02, 0x02, 0x00, 0x80]);
        assert_eq!(
            encode_uint(&BigUint::from(65537u32)),
            vec![0x02, 0x03, 0x01, 0x00, 0x01]
        );
    }

    #[test]
    fn rsa_private_key_read_back() {
        let key = RsaPrivateComponents {
            n: BigUint::from(3233u32),
            e: BigUint::from(17u32),
            d: BigUint::from(413u32),
            p: BigUint::from(61u32),
            q: BigUint::from(53u32),
            dp: BigUint::from(53u32),
            dq: BigUint::from(49u32),
            qi: BigUint::from(38u32),
        };
        let der = rsa_private_key(&key);
        let read = read_rsa_private_key(&der).unwrap();
        assert_eq!(read.n, key.n);
        assert_eq!(read.d, key.d);
        assert_eq!(read.qi, key.qi);
    }

    #[test]
    fn rsa_spki_layout() {
        let spki = rsa_subject_public_key_info(&BigUint::from(0xc5u8), &BigUint::from(3u8));
        let mut reader = DerReader::new(&spki).read_sequence().unwrap();
        assert_eq!(reader.read_tlv().unwrap().0, DER_TAG_SEQUENCE);
        let bits = reader.read_expected(DER_TAG_BIT_STRING).unwrap();
        assert_eq!(bits[0], BIT_STRING_NO_UNUSED_BITS);
        let mut rsa = DerReader::new(&bits[1..]).read_sequence().unwrap();
        assert_eq!(rsa.read_integer().unwrap(), BigUint::from(0xc5u8));
        assert_eq!(rsa.read_integer().unwrap(), BigUint::from(3u8));
    }

    #[test]
    fn ec_pkcs8_read_back() {
        let scalar = [7u8; 48];
        let point = [4u8; 97];
        let der = ec_private_key_pkcs8(EllipticCurve::P384, &scalar, &point);
        let (curve, read) = read_ec_private_key_pkcs8(&der).unwrap();
        assert_eq!(curve, EllipticCurve::P384);
        assert_eq!(read, scalar.to_vec());
    }

    #[test]
    fn truncated_input_is_malformed() {
        let der = rsa_subject_public_key_info(&BigUint::from(0xc5u8), &BigUint::from(3u8));
        let err = read_rsa_private_key(&der[..der.len() - 1]).unwrap_err();
        assert!(err.is_malformed_input());
        assert!(read_rsa_private_key(&[]).unwrap_err().is_malformed_input());
    }
}
