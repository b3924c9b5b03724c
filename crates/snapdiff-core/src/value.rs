use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value as JsonValue;
use serde_yaml::Value as YamlValue;

use crate::{CanonicalizeError, Number};

/// Canonical document model compared by the diff engine.
///
/// Mapping keys are kept in a `BTreeMap`, so every traversal visits them in
/// sorted order and diff output is deterministic.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Explicit null.
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Integer or finite floating point scalar.
    Number(Number),
    /// Text scalar. Timestamps arrive here as ISO-8601 strings.
    Text(String),
    /// Field name to value mapping.
    Mapping(BTreeMap<String, Value>),
    /// Ordered sequence of values.
    Sequence(Vec<Value>),
}

impl Value {
    /// Parses a JSON string into the canonical value representation.
    ///
    /// ```
    /// # use snapdiff_core::Value;
    /// let value = Value::from_json_str("{\"hello\":\"world\"}")?;
    /// assert!(matches!(value, Value::Mapping(_)));
    /// # Ok::<(), snapdiff_core::CanonicalizeError>(())
    /// ```
    pub fn from_json_str(input: &str) -> Result<Self, CanonicalizeError> {
        let value: JsonValue = serde_json::from_str(input)?;
        Self::from_json_value(value)
    }

    /// Parses a YAML string into the canonical value representation.
    ///
    /// ```
    /// # use snapdiff_core::Value;
    /// let value = Value::from_yaml_str("---\nanswer: 42\n")?;
    /// assert!(matches!(value, Value::Mapping(_)));
    /// # Ok::<(), snapdiff_core::CanonicalizeError>(())
    /// ```
    pub fn from_yaml_str(input: &str) -> Result<Self, CanonicalizeError> {
        let value: YamlValue = serde_yaml::from_str(input)?;
        Self::from_yaml_value(value)
    }

    /// Converts a serde JSON value into a [`Value`].
    pub fn from_json_value(value: JsonValue) -> Result<Self, CanonicalizeError> {
        match value {
            JsonValue::Null => Ok(Self::Null),
            JsonValue::Bool(v) => Ok(Self::Bool(v)),
            JsonValue::Number(num) => {
                if let Some(i) = num.as_i64() {
                    return Ok(Self::Number(Number::Integer(i)));
                }
                let Some(as_f64) = num.as_f64() else {
                    return Err(CanonicalizeError::NumberOutOfRange { value: num.to_string() });
                };
                Ok(Self::Number(Number::from_f64(as_f64)?))
            }
            JsonValue::String(s) => Ok(Self::Text(s)),
            JsonValue::Array(values) => {
                let mut items = Vec::with_capacity(values.len());
                for value in values {
                    items.push(Self::from_json_value(value)?);
                }
                Ok(Self::Sequence(items))
            }
            JsonValue::Object(map) => {
                let mut mapping = BTreeMap::new();
                for (key, value) in map {
                    mapping.insert(key, Self::from_json_value(value)?);
                }
                Ok(Self::Mapping(mapping))
            }
        }
    }

    fn from_yaml_value(value: YamlValue) -> Result<Self, CanonicalizeError> {
        match value {
            YamlValue::Null => Ok(Self::Null),
            YamlValue::Bool(v) => Ok(Self::Bool(v)),
            YamlValue::Number(num) => {
                if let Some(i) = num.as_i64() {
                    return Ok(Self::Number(Number::Integer(i)));
                }
                if let Some(f) = num.as_f64() {
                    return Ok(Self::Number(Number::from_f64(f)?));
                }
                Err(CanonicalizeError::NumberOutOfRange { value: num.to_string() })
            }
            YamlValue::String(s) => Ok(Self::Text(s)),
            YamlValue::Sequence(seq) => {
                let mut items = Vec::with_capacity(seq.len());
                for value in seq {
                    items.push(Self::from_yaml_value(value)?);
                }
                Ok(Self::Sequence(items))
            }
            YamlValue::Mapping(map) => {
                let mut mapping = BTreeMap::new();
                for (key, value) in map {
                    let key = match key {
                        YamlValue::String(s) => s,
                        other => {
                            return Err(CanonicalizeError::NonStringYamlKey {
                                found: format!("{other:?}"),
                            });
                        }
                    };
                    mapping.insert(key, Self::from_yaml_value(value)?);
                }
                Ok(Self::Mapping(mapping))
            }
            YamlValue::Tagged(tagged) => {
                Err(CanonicalizeError::UnsupportedYamlTag { tag: tagged.tag.to_string() })
            }
        }
    }

    /// Converts the value back into a serde JSON value.
    #[must_use]
    pub fn to_json_value(&self) -> JsonValue {
        match self {
            Self::Null => JsonValue::Null,
            Self::Bool(v) => JsonValue::Bool(*v),
            // Floats are finite by construction, so the fallback is unreachable.
            Self::Number(n) => n.to_json_number().map_or(JsonValue::Null, JsonValue::Number),
            Self::Text(s) => JsonValue::String(s.clone()),
            Self::Sequence(values) => {
                JsonValue::Array(values.iter().map(Self::to_json_value).collect())
            }
            Self::Mapping(map) => {
                let mut object = serde_json::Map::new();
                for (key, value) in map {
                    object.insert(key.clone(), value.to_json_value());
                }
                JsonValue::Object(object)
            }
        }
    }

    /// Renders the value the way it is stored in a diff record.
    ///
    /// Text is emitted raw, other scalars in their JSON spelling, and
    /// containers as compact JSON.
    ///
    /// ```
    /// # use snapdiff_core::Value;
    /// assert_eq!(Value::from_json_str("\"x\"")?.render(), "x");
    /// assert_eq!(Value::from_json_str("2")?.render(), "2");
    /// assert_eq!(Value::from_json_str("{\"b\":[1,null]}")?.render(), "{\"b\":[1,null]}");
    /// # Ok::<(), snapdiff_core::CanonicalizeError>(())
    /// ```
    #[must_use]
    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Computes the structural diff from `self` to `other` at the root path.
    ///
    /// ```
    /// # use snapdiff_core::Value;
    /// let old = Value::from_json_str("1").unwrap();
    /// let new = Value::from_json_str("2").unwrap();
    /// assert_eq!(old.diff(&new).len(), 1);
    /// assert!(old.diff(&old).is_empty());
    /// ```
    #[must_use]
    pub fn diff(&self, other: &Self) -> crate::Diff {
        crate::diff::diff_values(self, other, &crate::diff::Path::new())
    }

    /// Short name of the variant, used in log events.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::Text(_) => "text",
            Self::Mapping(_) => "mapping",
            Self::Sequence(_) => "sequence",
        }
    }

    /// Looks up a field when the value is a mapping.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        match self {
            Self::Mapping(map) => map.get(field),
            _ => None,
        }
    }

    /// Returns `true` for [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::Mapping(_) | Self::Sequence(_) => write!(f, "{}", self.to_json_value()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Number(Number::Integer(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}
