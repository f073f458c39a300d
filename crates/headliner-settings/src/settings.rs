//! The settings object
//!
//! A bag of named configuration values. Each attribute holds an untyped
//! JSON value; nested mappings are reached by further key lookup.

use std::ops::Index;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::merge::merge;

static NULL: Value = Value::Null;

/// Named configuration values with recursive merge on update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SettingsObj {
    attributes: Map<String, Value>,
}

impl SettingsObj {
    /// Create an empty settings object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a settings object from named initial values.
    ///
    /// Every value is set directly, without merging. If a name is given
    /// twice the later value wins.
    pub fn with_values<I, K>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let attributes = values
            .into_iter()
            .map(|(name, value)| (name.into(), value))
            .collect();
        Self { attributes }
    }

    /// Merge named values into the object.
    ///
    /// A name that is not set yet is adopted as-is. Otherwise the current
    /// value and the incoming one are combined with [`merge`]. This never
    /// fails: incompatible shapes are resolved by replacement.
    pub fn update<I, K>(&mut self, values: I)
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        for (name, value) in values {
            let name = name.into();
            let merged = match self.attributes.remove(&name) {
                Some(current) => {
                    debug!(attribute = %name, "merging settings attribute");
                    merge(current, value)
                }
                None => {
                    debug!(attribute = %name, "setting settings attribute");
                    value
                }
            };
            self.attributes.insert(name, merged);
        }
    }

    /// Get an attribute by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Whether an attribute with this name is set.
    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Look up a value by dot-separated path, e.g. `deploy.path`.
    ///
    /// The first segment names the attribute, the rest are keys into
    /// nested mappings.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.attributes.get(parts.next()?)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    /// Look up a string value by path
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.lookup(path).and_then(Value::as_str)
    }

    /// Look up an unsigned integer value by path
    pub fn get_u64(&self, path: &str) -> Option<u64> {
        self.lookup(path).and_then(Value::as_u64)
    }

    /// Look up a boolean value by path
    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.lookup(path).and_then(Value::as_bool)
    }

    /// Names of all attributes, in key order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attributes.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// Attribute access. Absent attributes index as `Value::Null`, so lookups
/// chain the same way they do on a `serde_json::Value`.
impl Index<&str> for SettingsObj {
    type Output = Value;

    fn index(&self, name: &str) -> &Value {
        self.attributes.get(name).unwrap_or(&NULL)
    }
}

impl From<Map<String, Value>> for SettingsObj {
    fn from(attributes: Map<String, Value>) -> Self {
        Self { attributes }
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for SettingsObj {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self::with_values(iter)
    }
}

impl IntoIterator for SettingsObj {
    type Item = (String, Value);
    type IntoIter = serde_json::map::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.attributes.into_iter()
    }
}

/// Build a [`SettingsObj`] from `name: value` pairs, where each value is
/// a single JSON token tree as accepted by [`serde_json::json!`].
///
/// A negative number such as `-1` is two token trees and does not match;
/// wrap it in parentheses, `retries: (-1)`. Negative numbers nested inside
/// a `{...}` or `[...]` value need no wrapping.
///
/// ```
/// use headliner_settings::settings;
///
/// let obj = settings! {
///     foo: {"bar": {"baz": "baz"}},
///     retries: 3,
/// };
/// assert_eq!(obj["foo"]["bar"]["baz"], "baz");
/// ```
#[macro_export]
macro_rules! settings {
    () => {
        $crate::SettingsObj::new()
    };
    ($($name:ident : $value:tt),+ $(,)?) => {
        $crate::SettingsObj::with_values([
            $((stringify!($name), $crate::__private::json!($value))),+
        ])
    };
}
