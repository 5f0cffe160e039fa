use std::fmt;

use jwx_error::ErrorContext as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error as _};
use serde_json::{Map, Value};

use super::{Key, KeyHeaders};
use crate::error::{Error, Result};
use crate::jose::encoding::take_str;
use crate::jose::header::describe;
use crate::jose::jwa::KeyType;

#[derive(Clone, Default, PartialEq)]
/// A single key document before its variant is decided.
///
/// Holds the [`KeyHeaders`] plus every key parameter this crate knows of,
/// still base64url encoded as found on the wire. [`Key::from_raw`] picks the
/// variant from `kty` (and `d`) and decodes the parameters it needs.
pub struct RawKey {
    pub(crate) headers: KeyHeaders,
    pub(crate) n: Option<String>,
    pub(crate) e: Option<String>,
    pub(crate) d: Option<String>,
    pub(crate) p: Option<String>,
    pub(crate) q: Option<String>,
    pub(crate) dp: Option<String>,
    pub(crate) dq: Option<String>,
    pub(crate) qi: Option<String>,
    pub(crate) crv: Option<String>,
    pub(crate) x: Option<String>,
    pub(crate) y: Option<String>,
    pub(crate) k: Option<String>,
}

impl RawKey {
    fn params_mut(&mut self) -> [(&'static str, &mut Option<String>); 12] {
        [
            ("n", &mut self.n),
            ("e", &mut self.e),
            ("d", &mut self.d),
            ("p", &mut self.p),
            ("q", &mut self.q),
            ("dp", &mut self.dp),
            ("dq", &mut self.dq),
            ("qi", &mut self.qi),
            ("crv", &mut self.crv),
            ("x", &mut self.x),
            ("y", &mut self.y),
            ("k", &mut self.k),
        ]
    }

    fn params(&self) -> [(&'static str, Option<&String>); 12] {
        [
            ("n", self.n.as_ref()),
            ("e", self.e.as_ref()),
            ("d", self.d.as_ref()),
            ("p", self.p.as_ref()),
            ("q", self.q.as_ref()),
            ("dp", self.dp.as_ref()),
            ("dq", self.dq.as_ref()),
            ("qi", self.qi.as_ref()),
            ("crv", self.crv.as_ref()),
            ("x", self.x.as_ref()),
            ("y", self.y.as_ref()),
            ("k", self.k.as_ref()),
        ]
    }

    /// Read a key document from its flat json object.
    ///
    /// Key parameters must be strings, everything else is extracted
    /// into the [`KeyHeaders`].
    pub fn from_json_map(mut map: Map<String, Value>) -> Result<Self> {
        let mut raw = Self::default();
        for (name, slot) in raw.params_mut() {
            *slot = take_str(&mut map, name)?;
        }
        raw.headers.extract(map)?;
        Ok(raw)
    }

    /// Parse a key document from its json text.
    pub fn parse(src: &str) -> Result<Self> {
        let map: Map<String, Value> = serde_json::from_str(src)
            .context("parse key json object")
            .map_err(Error::malformed_input)?;
        Self::from_json_map(map)
    }

    /// The headers of this document.
    pub fn headers(&self) -> &KeyHeaders {
        &self.headers
    }

    /// The "kty" parameter, which decides the [`Key`] variant.
    pub fn key_type(&self) -> Option<KeyType> {
        self.headers.key_type()
    }

    /// Returns true if a key parameter with the given name is present.
    pub fn has_param(&self, name: &str) -> bool {
        self.params()
            .iter()
            .any(|(param, value)| *param == name && value.is_some())
    }

    /// Write the headers and all present key parameters into `map`.
    pub fn populate(&self, map: &mut Map<String, Value>) {
        self.headers.populate(map);
        for (name, value) in self.params() {
            if let Some(value) = value {
                map.insert(name.to_owned(), Value::String(value.clone()));
            }
        }
    }

    /// The flat json object of this document.
    pub fn to_json_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        self.populate(&mut map);
        map
    }

    /// Resolve this document into a [`Key`], see [`Key::from_raw`].
    pub fn into_key(self) -> Result<Key> {
        Key::from_raw(self)
    }

    /// The headers, with every parameter not consumed by the
    /// resolved key moved into the private parameters.
    pub(super) fn into_headers(mut self) -> KeyHeaders {
        let mut leftovers = Vec::new();
        for (name, slot) in self.params_mut() {
            if let Some(value) = slot.take() {
                leftovers.push((name, value));
            }
        }
        let mut headers = self.headers;
        if !leftovers.is_empty() {
            let private = headers.private.get_or_insert_default();
            for (name, value) in leftovers {
                private.insert(name.to_owned(), Value::String(value));
            }
        }
        headers
    }
}

impl fmt::Debug for RawKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let present: Vec<&str> = self
            .params()
            .into_iter()
            .filter_map(|(name, value)| value.map(|_| name))
            .collect();
        f.debug_struct("RawKey")
            .field("headers", &self.headers)
            .field("params", &present)
            .finish()
    }
}

impl Serialize for RawKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json_map().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RawKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::deserialize(deserializer)?;
        Self::from_json_map(map).map_err(|err| D::Error::custom(describe(&err)))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    use super::*;

    #[test]
    fn parameters_are_split_from_headers() {
        let raw = assert_ok!(RawKey::parse(
            r#"{"kty":"EC","crv":"P-256","x":"AQ","y":"Ag","d":"Aw","kid":"a","foo":1}"#
        ));
        assert_eq!(raw.key_type(), Some(KeyType::Ec));
        assert!(raw.has_param("d"));
        assert!(!raw.has_param("n"));
        assert!(!raw.has_param("kid"));
        assert_eq!(raw.headers().key_id(), Some("a"));
        assert_eq!(raw.headers().get("foo"), Some(json!(1)));

        let debug = format!("{raw:?}");
        assert!(debug.contains(r#""d""#));
        assert!(!debug.contains("Aw"));
    }

    #[test]
    fn parameters_must_be_strings() {
        let err = assert_err!(RawKey::parse(r#"{"kty":"RSA","n":12,"e":"AQAB"}"#));
        assert!(err.is_type_mismatch());
    }

    #[test]
    fn leftovers_become_private_params() {
        let raw = assert_ok!(RawKey::parse(r#"{"kty":"oct","k":"AQ","x":"Ag"}"#));
        let mut raw_without_k = raw.clone();
        raw_without_k.k = None;
        let headers = raw_without_k.into_headers();
        assert_eq!(headers.get("x"), Some(json!("Ag")));
        assert_eq!(headers.get("k"), None);

        assert_eq!(
            assert_ok!(serde_json::to_value(&raw)),
            json!({"kty": "oct", "k": "AQ", "x": "Ag"})
        );
    }
}
