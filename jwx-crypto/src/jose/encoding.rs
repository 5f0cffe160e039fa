//! base64url helpers for key parameters and JWS segments.
//!
//! Everything uses the url safe alphabet without padding.

use base64::{Engine as _, prelude::BASE64_URL_SAFE_NO_PAD};
use jwx_error::ErrorContext as _;
use num_bigint::BigUint;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

pub(super) fn encode(data: impl AsRef<[u8]>) -> String {
    BASE64_URL_SAFE_NO_PAD.encode(data)
}

pub(super) fn decode(name: &'static str, encoded: &str) -> Result<Vec<u8>> {
    BASE64_URL_SAFE_NO_PAD
        .decode(encoded)
        .with_context(|| format!("decode base64url value of `{name}`"))
        .map_err(Error::malformed_input)
}

/// Unsigned big-endian integer, as used for RSA and EC key parameters.
pub(super) fn encode_uint(value: &BigUint) -> String {
    encode(value.to_bytes_be())
}

/// An encoded integer must not be empty.
pub(super) fn decode_uint(name: &'static str, encoded: &str) -> Result<BigUint> {
    let bytes = decode(name, encoded)?;
    if bytes.is_empty() {
        return Err(Error::malformed_input(format!(
            "`{name}` is an empty integer encoding"
        )));
    }
    Ok(BigUint::from_bytes_be(&bytes))
}

/// Left pad `bytes` to exactly `size` bytes, failing if it is longer.
pub(super) fn pad_to(name: &'static str, bytes: &[u8], size: usize) -> Result<Vec<u8>> {
    let offset = size.checked_sub(bytes.len()).ok_or_else(|| {
        Error::malformed_input(format!(
            "`{name}` is {} bytes, expected at most {size}",
            bytes.len()
        ))
    })?;
    let mut padded = vec![0u8; size];
    padded[offset..].copy_from_slice(bytes);
    Ok(padded)
}

/// Fixed width unsigned big-endian encoding, used for EC coordinates.
pub(super) fn uint_to_fixed(name: &'static str, value: &BigUint, size: usize) -> Result<Vec<u8>> {
    pad_to(name, &value.to_bytes_be(), size)
}

/// Take a string parameter out of a json object.
pub(super) fn take_str(map: &mut Map<String, Value>, name: &'static str) -> Result<Option<String>> {
    match map.remove(name) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(Error::type_mismatch(format!(
            "`{name}` must be a string, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use tokio_test::assert_err;

    use super::*;

    #[test]
    fn uint_round_trip_without_leading_zeros() {
        let value = BigUint::from(65537u32);
        assert_eq!(encode_uint(&value), "AQAB");
        assert_eq!(decode_uint("e", "AQAB").unwrap(), value);
        // leading zero octets are tolerated on input
        assert_eq!(decode_uint("e", "AAEAAQ").unwrap(), value);
    }

    #[test]
    fn empty_and_padded_input_is_malformed() {
        assert!(assert_err!(decode_uint("n", "")).is_malformed_input());
        assert!(assert_err!(decode("n", "AQAB==")).is_malformed_input());
        assert!(assert_err!(decode("n", "AQ+B")).is_malformed_input());
    }

    #[test]
    fn fixed_width_padding() {
        assert_eq!(pad_to("x", &[1, 2], 4).unwrap(), vec![0, 0, 1, 2]);
        assert!(assert_err!(pad_to("x", &[1, 2, 3], 2)).is_malformed_input());
    }

    #[test]
    fn take_str_requires_strings() {
        let mut map = Map::new();
        map.insert("k".to_owned(), Value::from(42));
        assert!(assert_err!(take_str(&mut map, "k")).is_type_mismatch());
        assert_eq!(take_str(&mut map, "k").unwrap(), None);
    }
}
