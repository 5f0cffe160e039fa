use std::fmt;

use aws_lc_rs::rand::{SecureRandom as _, SystemRandom};
use jwx_error::ErrorContext as _;
use serde_json::{Map, Value};

use super::{KeyHeaders, RawKey, impl_key_headers};
use crate::error::{Error, Result};
use crate::jose::encoding::{decode, encode};
use crate::jose::jwa::KeyType;

#[derive(Clone, PartialEq)]
/// A symmetric key, the secret octets `k`.
pub struct SymmetricKey {
    pub(super) headers: KeyHeaders,
    key: Vec<u8>,
}

impl_key_headers!(SymmetricKey, KeyType::OctetSeq, headers);

impl SymmetricKey {
    /// Create a [`SymmetricKey`] from its secret octets.
    #[must_use]
    pub fn new(key: Vec<u8>) -> Self {
        Self {
            headers: KeyHeaders::for_key_type(KeyType::OctetSeq),
            key,
        }
    }

    /// Generate a random [`SymmetricKey`] of `len` bytes.
    pub fn generate(len: usize) -> Result<Self> {
        let mut key = vec![0u8; len];
        SystemRandom::new()
            .fill(&mut key)
            .context("fill symmetric key with random bytes")
            .map_err(Error::crypto)?;
        Ok(Self::new(key))
    }

    pub(super) fn from_raw(mut raw: RawKey) -> Result<Self> {
        let k = raw
            .k
            .take()
            .ok_or_else(|| Error::schema_violation("symmetric key: missing field `k`"))?;
        let key = decode("k", &k)?;
        if key.is_empty() {
            return Err(Error::malformed_input("symmetric key: `k` is empty"));
        }
        Ok(Self {
            headers: raw.into_headers(),
            key,
        })
    }

    /// The secret octets.
    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }

    /// A copy of the secret octets.
    pub fn materialize(&self) -> Vec<u8> {
        self.key.clone()
    }

    /// Write the headers followed by `k` into `map`.
    pub fn populate(&self, map: &mut Map<String, Value>) {
        self.headers.populate(map);
        map.insert("k".to_owned(), Value::String(encode(&self.key)));
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("headers", &self.headers)
            .field("len", &self.key.len())
            .finish_non_exhaustive()
    }
}
