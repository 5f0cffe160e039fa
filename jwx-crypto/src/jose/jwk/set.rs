use jwx_error::ErrorContext as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error as _, ser::SerializeStruct};
use serde_json::{Map, Value};

use super::Key;
use crate::error::{Error, Result};
use crate::jose::header::describe;

#[derive(Debug, Clone, Default, PartialEq)]
/// An ordered set of keys, the `{"keys": [...]}` document of section 5 of [`rfc7517`].
///
/// [`rfc7517`]: https://datatracker.ietf.org/doc/html/rfc7517#section-5
pub struct KeySet {
    keys: Vec<Key>,
}

impl KeySet {
    /// Create an empty [`KeySet`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key at the end of the set.
    pub fn push(&mut self, key: Key) {
        self.keys.push(key);
    }

    /// All keys, in order.
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Iterate over all keys, in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Key> {
        self.keys.iter()
    }

    /// Number of keys in the set.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if the set has no keys.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// All keys with the given key id.
    ///
    /// A set may contain more than one key with the same id,
    /// no match gives an empty result.
    pub fn lookup_key_id(&self, kid: &str) -> Vec<&Key> {
        self.keys
            .iter()
            .filter(|key| key.key_id() == Some(kid))
            .collect()
    }

    /// Parse either a key set document or a single key.
    ///
    /// The first key that fails aborts the parse, no partial set is returned.
    /// A document with an empty `keys` list is an empty set; it is never
    /// re-read as a single key, so an empty set written by [`Serialize`]
    /// reads back unchanged.
    pub fn parse(src: &str) -> Result<Self> {
        let map: Map<String, Value> = serde_json::from_str(src)
            .context("parse key set json object")
            .map_err(Error::malformed_input)?;
        Self::from_json_map(map)
    }

    /// Create a key set from a json object, see [`Self::parse`].
    pub fn from_json_map(mut map: Map<String, Value>) -> Result<Self> {
        let Some(keys) = map.remove("keys") else {
            return Ok(Self {
                keys: vec![Key::from_json_map(map)?],
            });
        };

        let Value::Array(keys) = keys else {
            return Err(Error::type_mismatch("key set: `keys` must be a list"));
        };

        let keys = keys
            .into_iter()
            .enumerate()
            .map(|(index, key)| match key {
                Value::Object(key) => Key::from_json_map(key).inspect_err(|err| {
                    tracing::debug!(index, "failed to parse key set member; err = {err:?}");
                }),
                _ => Err(Error::type_mismatch(format!(
                    "key set: member {index} is not an object"
                ))),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { keys })
    }
}

impl From<Vec<Key>> for KeySet {
    fn from(keys: Vec<Key>) -> Self {
        Self { keys }
    }
}

impl FromIterator<Key> for KeySet {
    fn from_iter<T: IntoIterator<Item = Key>>(iter: T) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

impl Extend<Key> for KeySet {
    fn extend<T: IntoIterator<Item = Key>>(&mut self, iter: T) {
        self.keys.extend(iter);
    }
}

impl<'a> IntoIterator for &'a KeySet {
    type Item = &'a Key;
    type IntoIter = std::slice::Iter<'a, Key>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}

impl IntoIterator for KeySet {
    type Item = Key;
    type IntoIter = std::vec::IntoIter<Key>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.into_iter()
    }
}

impl Serialize for KeySet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("KeySet", 1)?;
        state.serialize_field("keys", &self.keys)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for KeySet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::deserialize(deserializer)?;
        Self::from_json_map(map).map_err(|err| D::Error::custom(describe(&err)))
    }
}

#[cfg(test)]
mod tests {
    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::jose::jwa::KeyType;
    use crate::jose::jwk::tests::RFC_RSA_N;

    fn rfc_set() -> String {
        format!(
            r#"{{"keys":[
                {{"kty":"EC","crv":"P-256","x":"MKBCTNIcKUSDii11ySs3526iDZ8AiTo7Tu6KPAqv7D4","y":"4Etl6SRW2YiLUrN5vfvVHuhp7x8PxltmWWlbbM4IFyM","use":"enc","kid":"1"}},
                {{"kty":"RSA","n":"{RFC_RSA_N}","e":"AQAB","alg":"RS256","kid":"2011-04-29"}}
            ]}}"#
        )
    }

    #[test]
    fn lookup_by_key_id() {
        let set = assert_ok!(KeySet::parse(&rfc_set()));
        assert_eq!(set.len(), 2);

        let found = set.lookup_key_id("1");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].key_type(), KeyType::Ec);

        assert_eq!(set.lookup_key_id("2011-04-29")[0].key_type(), KeyType::Rsa);
        assert!(set.lookup_key_id("does-not-exist").is_empty());
    }

    #[test]
    fn single_key_document() {
        let set = assert_ok!(KeySet::parse(r#"{"kty":"oct","k":"AQAB","kid":"only"}"#));
        assert_eq!(set.len(), 1);
        assert_eq!(set.keys()[0].key_id(), Some("only"));
    }

    #[test]
    fn first_bad_member_aborts() {
        let err = assert_err!(KeySet::parse(
            r#"{"keys":[{"kty":"oct","k":"AQAB"},{"kty":"EC","crv":"P-256"}]}"#
        ));
        assert!(err.is_schema_violation());

        let err = assert_err!(KeySet::parse(r#"{"keys":[{"kty":"oct","k":"AQAB"}, 7]}"#));
        assert!(err.is_type_mismatch());

        let err = assert_err!(KeySet::parse(r#"{"keys":{}}"#));
        assert!(err.is_type_mismatch());
    }

    #[test]
    fn empty_keys_list_is_an_empty_set() {
        let set = assert_ok!(KeySet::parse(r#"{"keys":[]}"#));
        assert!(set.is_empty());
        assert!(set.lookup_key_id("1").is_empty());

        let json = assert_ok!(serde_json::to_string(&KeySet::new()));
        assert_eq!(json, r#"{"keys":[]}"#);
        assert_eq!(assert_ok!(KeySet::parse(&json)), KeySet::new());

        // without a `keys` member the document must be a key
        assert!(assert_err!(KeySet::parse("{}")).is_schema_violation());
    }

    #[test]
    fn serde_round_trip() {
        let set = assert_ok!(KeySet::parse(&rfc_set()));
        let json = assert_ok!(serde_json::to_string(&set));
        assert!(json.starts_with(r#"{"keys":["#));
        let back: KeySet = assert_ok!(serde_json::from_str(&json));
        assert_eq!(back, set);
    }
}
