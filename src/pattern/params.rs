//! Extracted path parameter values.
//!
//! Most routes carry a handful of parameters, so the map is a `SmallVec` of
//! `(name, value)` pairs that stays on the stack up to [`MAX_INLINE_PARAMS`].
//! Names are `Arc<str>` shared with the compiled matcher, so building a
//! result only clones a refcount per key.

use std::collections::HashMap;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};
use smallvec::SmallVec;

/// Parameters stored inline before spilling to the heap
pub const MAX_INLINE_PARAMS: usize = 8;

/// A single captured value or the pieces of a repeated capture
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Single(String),
    Repeated(Vec<String>),
}

impl ParamValue {
    /// The value if it is a single string
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Single(s) => Some(s),
            ParamValue::Repeated(_) => None,
        }
    }

    /// The pieces if it is a repeated value
    #[must_use]
    pub fn as_slice(&self) -> Option<&[String]> {
        match self {
            ParamValue::Single(_) => None,
            ParamValue::Repeated(v) => Some(v),
        }
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Single(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Single(value.to_string())
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(value: Vec<String>) -> Self {
        ParamValue::Repeated(value)
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(value: Vec<&str>) -> Self {
        ParamValue::Repeated(value.into_iter().map(str::to_string).collect())
    }
}

type ParamVec = SmallVec<[(Arc<str>, ParamValue); MAX_INLINE_PARAMS]>;

/// Ordered parameter-name → value mapping
///
/// Absent optional parameters are simply missing; there is no null entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    entries: ParamVec,
}

impl PathParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing an existing entry with the same name in place
    pub fn insert(&mut self, name: impl Into<Arc<str>>, value: impl Into<ParamValue>) {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == name) {
            slot.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v)
    }

    /// Shorthand for a single-valued parameter
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ParamValue::as_str)
    }

    /// Shorthand for a repeated parameter
    #[must_use]
    pub fn get_all(&self, name: &str) -> Option<&[String]> {
        self.get(name).and_then(ParamValue::as_slice)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_ref(), v))
    }

    /// Copy into a `HashMap`, e.g. for handlers that want owned keys
    #[must_use]
    pub fn to_map(&self) -> HashMap<String, ParamValue> {
        self.entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

impl<K, V> FromIterator<(K, V)> for PathParams
where
    K: Into<Arc<str>>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = PathParams::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

impl Serialize for PathParams {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k.as_ref(), v)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_overwrites_in_place() {
        let mut params = PathParams::new();
        params.insert("a", "1");
        params.insert("b", "2");
        params.insert("a", "3");
        let keys: Vec<&str> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(params.get_str("a"), Some("3"));
    }

    #[test]
    fn test_shape_accessors() {
        let params: PathParams = [
            ("id", ParamValue::from("42")),
            ("path", ParamValue::from(vec!["a", "b"])),
        ]
        .into_iter()
        .collect();
        assert_eq!(params.get_str("id"), Some("42"));
        assert!(params.get_all("id").is_none());
        assert_eq!(params.get_all("path").unwrap(), &["a", "b"]);
        assert!(!params.contains("missing"));
    }

    #[test]
    fn test_serializes_as_object() {
        let params: PathParams = [
            ("id", ParamValue::from("42")),
            ("path", ParamValue::from(vec!["a", "b"])),
        ]
        .into_iter()
        .collect();
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json, serde_json::json!({"id": "42", "path": ["a", "b"]}));
    }
}
