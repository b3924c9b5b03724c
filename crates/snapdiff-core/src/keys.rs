use std::collections::BTreeMap;
use std::fs;
use std::path::Path as FsPath;

use serde::Serialize;

use crate::{ConfigError, OptionsError};

/// Identity-key configuration for list-like top-level fields.
///
/// Maps a top-level field name to the ordered identity keys used to align
/// the elements of the sequence stored under it. The usual source is a small
/// JSON or YAML file shaped like `{"items": ["id"]}`.
///
/// ```
/// # use snapdiff_core::KeyFieldMap;
/// let keys = KeyFieldMap::from_json_str("{\"items\":[\"id\"],\"offers\":[\"sku\",\"seller\"]}")?;
/// assert_eq!(keys.get("offers").unwrap(), ["sku", "seller"]);
/// assert!(!keys.contains("price"));
/// # Ok::<(), snapdiff_core::ConfigError>(())
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct KeyFieldMap(BTreeMap<String, Vec<String>>);

impl KeyFieldMap {
    /// Creates an empty configuration: every field is compared as a tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `field` as list-like with the given identity keys.
    ///
    /// ```
    /// # use snapdiff_core::{KeyFieldMap, OptionsError};
    /// let keys = KeyFieldMap::new().with_field("items", ["id"])?;
    /// assert_eq!(keys.get("items").unwrap(), ["id"]);
    ///
    /// let err = KeyFieldMap::new().with_field("items", [" "]).unwrap_err();
    /// assert_eq!(err, OptionsError::EmptyIdentityKey { field: "items".into() });
    /// # Ok::<(), OptionsError>(())
    /// ```
    pub fn with_field<F, I, S>(mut self, field: F, keys: I) -> Result<Self, OptionsError>
    where
        F: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let field = field.into();
        let keys = validate_keys(&field, keys.into_iter().map(Into::into).collect())?;
        self.0.insert(field, keys);
        Ok(self)
    }

    /// Returns the identity keys registered for `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Indicates whether `field` is registered as list-like.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Iterates over registered fields and their keys in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(field, keys)| (field.as_str(), keys.as_slice()))
    }

    /// Number of registered fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Indicates whether no field is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parses a JSON key configuration.
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        let raw: BTreeMap<String, Vec<String>> = serde_json::from_str(input)?;
        Ok(Self::try_from(raw)?)
    }

    /// Parses a YAML key configuration.
    ///
    /// ```
    /// # use snapdiff_core::KeyFieldMap;
    /// let keys = KeyFieldMap::from_yaml_str("items:\n  - id\n")?;
    /// assert_eq!(keys.get("items").unwrap(), ["id"]);
    /// # Ok::<(), snapdiff_core::ConfigError>(())
    /// ```
    pub fn from_yaml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: BTreeMap<String, Vec<String>> = serde_yaml::from_str(input)?;
        Ok(Self::try_from(raw)?)
    }

    /// Loads a key configuration file, choosing the format by extension.
    pub fn load<P>(path: P) -> Result<Self, ConfigError>
    where
        P: AsRef<FsPath>,
    {
        let path = path.as_ref();
        let extension = path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase);
        let parse: fn(&str) -> Result<Self, ConfigError> = match extension.as_deref() {
            Some("json") => Self::from_json_str,
            Some("yaml" | "yml") => Self::from_yaml_str,
            _ => return Err(ConfigError::UnsupportedFormat { path: path.to_path_buf() }),
        };
        let text = fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        let keys = parse(&text)?;
        tracing::debug!(path = %path.display(), fields = keys.len(), "loaded identity-key configuration");
        Ok(keys)
    }
}

impl TryFrom<BTreeMap<String, Vec<String>>> for KeyFieldMap {
    type Error = OptionsError;

    fn try_from(raw: BTreeMap<String, Vec<String>>) -> Result<Self, Self::Error> {
        let mut validated = BTreeMap::new();
        for (field, keys) in raw {
            let keys = validate_keys(&field, keys)?;
            validated.insert(field, keys);
        }
        Ok(Self(validated))
    }
}

fn validate_keys(field: &str, keys: Vec<String>) -> Result<Vec<String>, OptionsError> {
    if field.trim().is_empty() {
        return Err(OptionsError::EmptyFieldName);
    }
    if keys.is_empty() {
        return Err(OptionsError::NoIdentityKeys { field: field.to_owned() });
    }
    if keys.iter().any(|key| key.trim().is_empty()) {
        return Err(OptionsError::EmptyIdentityKey { field: field.to_owned() });
    }
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn key_order_is_preserved() {
        let keys = KeyFieldMap::from_json_str("{\"items\":[\"sku\",\"id\"]}").unwrap();
        assert_eq!(keys.get("items").unwrap(), ["sku", "id"]);
    }

    #[test]
    fn empty_key_list_is_rejected() {
        let err = KeyFieldMap::from_json_str("{\"items\":[]}").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid(OptionsError::NoIdentityKeys { ref field }) if field == "items"
        ));
    }

    #[test]
    fn blank_field_name_is_rejected() {
        let err = KeyFieldMap::new().with_field("", ["id"]).unwrap_err();
        assert_eq!(err, OptionsError::EmptyFieldName);
    }

    #[test]
    fn non_list_values_fail_to_parse() {
        let err = KeyFieldMap::from_json_str("{\"items\":\"id\"}").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn load_reads_json_and_yaml_files() {
        let mut json = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(json, "{{\"items\":[\"id\"]}}").unwrap();
        let mut yaml = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        write!(yaml, "items:\n  - id\n").unwrap();

        let from_json = KeyFieldMap::load(json.path()).unwrap();
        let from_yaml = KeyFieldMap::load(yaml.path()).unwrap();
        assert_eq!(from_json, from_yaml);
    }

    #[test]
    fn load_rejects_unknown_extensions() {
        let file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        let err = KeyFieldMap::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat { .. }));
    }
}
