//! Attribute container shared by keys, signatures and tokens.
//!
//! A [`Headers`] value is a fixed record of typed, optional fields (a
//! [`HeaderFields`] schema such as [`KeyFields`](super::jwk::KeyFields) or
//! [`SignatureFields`](super::jws::SignatureFields)) next to an open bag of
//! "private" parameters for every name the schema does not recognize.
//!
//! A name is never present in both: setting a recognized name always goes
//! through the typed conversion of its field, any other name lands in the bag.

use std::fmt;

use jwx_error::{ErrorContext as _, ErrorExt as _};
use jwx_utils::macros::generate_set_and_with;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error as _};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// A schema of recognized header names and their typed slots.
///
/// Implementations are generated for the JOSE schemas of this crate,
/// but nothing stops you from defining one for your own protocol.
pub trait HeaderFields: Default + Clone + PartialEq + fmt::Debug {
    /// Recognized wire names, in the order they are walked.
    const NAMES: &'static [&'static str];

    /// Get the wire value of a recognized field, `None` if it is unset
    /// or `name` is not recognized.
    fn get(&self, name: &str) -> Option<Value>;

    /// Set a recognized field from its wire value.
    ///
    /// On error the field keeps its previous value.
    fn set(&mut self, name: &str, value: Value) -> Result<()>;

    /// Returns true if `name` is one of [`Self::NAMES`].
    fn is_recognized(name: &str) -> bool {
        Self::NAMES.contains(&name)
    }
}

/// Conversion between a typed header slot and its json wire value.
pub(crate) trait HeaderValue: Sized {
    fn from_header_value(name: &str, value: Value) -> Result<Self>;

    fn to_header_value(&self) -> Value;
}

/// Define a [`HeaderFields`] schema struct.
///
/// Every field is optional and listed with its wire name, the order
/// of the list is the walk order.
macro_rules! header_fields {
    (
        $(#[$m:meta])*
        $vis:vis struct $name:ident {
            $( $(#[$field_meta:meta])* $field:ident: $ty:ty => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$m])*
        #[derive(Debug, Clone, Default, PartialEq)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                pub(crate) $field: Option<$ty>,
            )+
        }

        impl $crate::jose::header::HeaderFields for $name {
            const NAMES: &'static [&'static str] = &[$($wire),+];

            fn get(&self, name: &str) -> Option<::serde_json::Value> {
                match name {
                    $( $wire => self.$field.as_ref().map($crate::jose::header::HeaderValue::to_header_value), )+
                    _ => None,
                }
            }

            fn set(&mut self, name: &str, value: ::serde_json::Value) -> $crate::error::Result<()> {
                match name {
                    $(
                        $wire => {
                            self.$field = Some($crate::jose::header::HeaderValue::from_header_value($wire, value)?);
                            Ok(())
                        }
                    )+
                    _ => Err($crate::error::Error::type_mismatch(format!(
                        "`{name}` is not a field of {}",
                        stringify!($name),
                    ))),
                }
            }
        }
    };
}

pub(crate) use header_fields;

/// Typed header fields plus the open bag of private parameters.
///
/// Equality treats an absent private bag and an empty one as the same.
#[derive(Clone, Default)]
pub struct Headers<F> {
    pub(crate) fields: F,
    pub(crate) private: Option<Map<String, Value>>,
}

impl<F: HeaderFields> Headers<F> {
    /// Create empty [`Headers`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reference to the typed fields.
    pub fn fields(&self) -> &F {
        &self.fields
    }

    /// Reference to the private parameters, if any were set.
    pub fn private_params(&self) -> Option<&Map<String, Value>> {
        self.private.as_ref()
    }

    /// Returns true if neither a typed field nor a private parameter is set.
    pub fn is_empty(&self) -> bool {
        self.private.as_ref().is_none_or(Map::is_empty)
            && F::NAMES.iter().all(|name| self.fields.get(name).is_none())
    }

    /// Get the wire value of a header by name.
    ///
    /// Recognized names return their typed value (if set),
    /// anything else is looked up in the private parameters.
    pub fn get(&self, name: &str) -> Option<Value> {
        if F::is_recognized(name) {
            self.fields.get(name)
        } else {
            self.private.as_ref().and_then(|map| map.get(name)).cloned()
        }
    }

    generate_set_and_with! {
        /// Set a header by name.
        ///
        /// Recognized names must convert into their typed field,
        /// on failure the headers are left unchanged.
        /// Any other name is stored verbatim as a private parameter.
        pub fn header(
            mut self,
            name: impl Into<String>,
            value: impl Serialize,
        ) -> Result<Self, Error> {
            let name = name.into();
            let value = serde_json::to_value(value)
                .with_context(|| format!("serialize value of header `{name}`"))
                .map_err(Error::type_mismatch)?;
            self.insert(name, value)?;
            Ok(self)
        }
    }

    generate_set_and_with! {
        /// Set every member of a serializable object as a header,
        /// see [`Self::try_set_header`].
        ///
        /// Either all members are set or, on error, none are.
        pub fn headers(mut self, headers: impl Serialize) -> Result<Self, Error> {
            let value = serde_json::to_value(headers)
                .context("serialize headers")
                .map_err(Error::type_mismatch)?;
            let map = match value {
                Value::Object(map) => map,
                other => return Err(type_mismatch("headers", "a json object", &other)),
            };
            let mut staged = self.clone();
            for (name, value) in map {
                staged.insert(name, value)?;
            }
            self.fields = staged.fields;
            self.private = staged.private;
            Ok(self)
        }
    }

    /// Set a header from its json value, see [`Self::try_set_header`].
    pub fn insert(&mut self, name: String, value: Value) -> Result<()> {
        if F::is_recognized(&name) {
            self.fields.set(&name, value)
        } else {
            self.private.get_or_insert_default().insert(name, value);
            Ok(())
        }
    }

    /// Remove a private parameter.
    ///
    /// Recognized fields cannot be removed this way, they are unset
    /// through their typed setters instead.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.private.as_mut().and_then(|map| map.remove(name))
    }

    /// Write all private parameters and then all set fields into `map`.
    pub fn populate(&self, map: &mut Map<String, Value>) {
        if let Some(private) = &self.private {
            map.extend(private.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        for name in F::NAMES {
            if let Some(value) = self.fields.get(name) {
                map.insert((*name).to_owned(), value);
            }
        }
    }

    /// Consume a json object into these headers.
    ///
    /// Every recognized name is removed from `map` and set on its typed field.
    /// What is left becomes the private parameters, replacing any existing ones.
    /// The first field that fails aborts the extraction and leaves these
    /// headers unchanged.
    pub fn extract(&mut self, mut map: Map<String, Value>) -> Result<()> {
        let mut fields = self.fields.clone();
        for name in F::NAMES {
            if let Some(value) = map.remove(*name) {
                fields.set(name, value)?;
            }
        }
        self.fields = fields;
        self.private = (!map.is_empty()).then_some(map);
        Ok(())
    }

    /// Create [`Headers`] from a json object, see [`Self::extract`].
    pub fn from_json_map(map: Map<String, Value>) -> Result<Self> {
        let mut headers = Self::default();
        headers.extract(map)?;
        Ok(headers)
    }

    /// Create a json object of these headers, see [`Self::populate`].
    pub fn to_json_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        self.populate(&mut map);
        map
    }

    /// Visit every set field in declared order, followed by every private parameter.
    ///
    /// The first error returned by `visitor` stops the walk.
    pub fn walk<E>(&self, mut visitor: impl FnMut(&str, Value) -> Result<(), E>) -> Result<(), E> {
        for name in F::NAMES {
            if let Some(value) = self.fields.get(name) {
                visitor(name, value)?;
            }
        }
        if let Some(private) = &self.private {
            for (name, value) in private {
                visitor(name, value.clone())?;
            }
        }
        Ok(())
    }
}

impl<F: HeaderFields> PartialEq for Headers<F> {
    fn eq(&self, other: &Self) -> bool {
        let empty = Map::new();
        self.fields == other.fields
            && self.private.as_ref().unwrap_or(&empty) == other.private.as_ref().unwrap_or(&empty)
    }
}

impl<F: fmt::Debug> fmt::Debug for Headers<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Headers")
            .field("fields", &self.fields)
            .field("private", &self.private)
            .finish()
    }
}

impl<F: HeaderFields> Serialize for Headers<F> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json_map().serialize(serializer)
    }
}

impl<'de, F: HeaderFields> Deserialize<'de> for Headers<F> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::deserialize(deserializer)?;
        Self::from_json_map(map).map_err(|err| D::Error::custom(describe(&err)))
    }
}

/// The kind of `err` followed by its causes, for errors that leave the crate as text.
pub(crate) fn describe(err: &Error) -> String {
    err.chain()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(": ")
}

pub(crate) fn type_mismatch(name: &str, expected: &str, value: &Value) -> Error {
    Error::type_mismatch(format!("header `{name}`: expected {expected}, got {value}"))
}

impl HeaderValue for String {
    fn from_header_value(name: &str, value: Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(type_mismatch(name, "a string", &other)),
        }
    }

    fn to_header_value(&self) -> Value {
        Value::String(self.clone())
    }
}

/// A single string is accepted as a list of one.
impl HeaderValue for Vec<String> {
    fn from_header_value(name: &str, value: Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(vec![s]),
            Value::Array(items) => items
                .into_iter()
                .map(|item| String::from_header_value(name, item))
                .collect(),
            other => Err(type_mismatch(name, "a string or list of strings", &other)),
        }
    }

    fn to_header_value(&self) -> Value {
        Value::Array(self.iter().cloned().map(Value::String).collect())
    }
}

macro_rules! impl_symbol_header_value {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl HeaderValue for $ty {
                fn from_header_value(name: &str, value: Value) -> Result<Self> {
                    match value {
                        Value::String(s) => Self::accept(s),
                        other => Err(type_mismatch(name, "a string", &other)),
                    }
                }

                fn to_header_value(&self) -> Value {
                    Value::String(self.as_str().to_owned())
                }
            }
        )+
    };
}

impl_symbol_header_value!(
    super::jwa::KeyType,
    super::jwa::SignatureAlgorithm,
    super::jwa::KeyOperation,
);

impl HeaderValue for Vec<super::jwa::KeyOperation> {
    fn from_header_value(name: &str, value: Value) -> Result<Self> {
        match value {
            Value::Array(items) => items
                .into_iter()
                .map(|item| super::jwa::KeyOperation::from_header_value(name, item))
                .collect(),
            other => Err(type_mismatch(name, "a list of strings", &other)),
        }
    }

    fn to_header_value(&self) -> Value {
        Value::Array(self.iter().map(HeaderValue::to_header_value).collect())
    }
}
