use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while canonicalizing external data into [`Value`](crate::Value).
#[derive(Debug, Error)]
pub enum CanonicalizeError {
    /// The provided JSON input was invalid.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The provided YAML input was invalid.
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// Encountered a number that cannot be represented as `i64` or `f64`.
    #[error("number {value} cannot be represented as i64 or f64")]
    NumberOutOfRange {
        /// The textual representation of the offending number.
        value: String,
    },
    /// YAML maps may only contain string keys.
    #[error("unsupported YAML key type: {found}")]
    NonStringYamlKey {
        /// A description of the key that triggered the error.
        found: String,
    },
    /// YAML tags carry no meaning in the document model and are rejected.
    #[error("unsupported YAML tag: {tag}")]
    UnsupportedYamlTag {
        /// The tag identifier encountered in the document.
        tag: String,
    },
    /// Attempted to construct a [`Number`](crate::Number) that is not finite.
    #[error("non-finite number encountered: {value}")]
    NotFinite {
        /// The offending numeric value.
        value: f64,
    },
}

/// Errors emitted when building identity-key configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionsError {
    /// A list-like field was registered with a blank name.
    #[error("key field names must be non-empty strings")]
    EmptyFieldName,
    /// A list-like field was registered without any identity key.
    #[error("field {field} must declare at least one identity key")]
    NoIdentityKeys {
        /// The field missing identity keys.
        field: String,
    },
    /// Identity keys must be non-empty strings.
    #[error("identity keys for field {field} must be non-empty strings")]
    EmptyIdentityKey {
        /// The field declaring the blank key.
        field: String,
    },
}

/// Errors raised while loading the identity-key configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Location of the configuration file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The configuration was not valid JSON.
    #[error("invalid JSON key configuration: {0}")]
    Json(#[from] serde_json::Error),
    /// The configuration was not valid YAML.
    #[error("invalid YAML key configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// The file extension does not name a supported format.
    #[error("unsupported key configuration format: {path} (expected .json, .yaml or .yml)")]
    UnsupportedFormat {
        /// Location of the configuration file.
        path: PathBuf,
    },
    /// The configuration parsed but violates identity-key rules.
    #[error(transparent)]
    Invalid(#[from] OptionsError),
}

/// Errors raised by the snapshot pipeline collaborators.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Reading snapshot rows failed.
    #[error("failed to read snapshots: {0}")]
    SourceIo(#[source] std::io::Error),
    /// A snapshot row could not be decoded.
    #[error("malformed snapshot row at line {line}: {source}")]
    MalformedRow {
        /// 1-based line number of the row.
        line: usize,
        /// Decoding failure.
        #[source]
        source: serde_json::Error,
    },
    /// A snapshot document could not be canonicalized.
    #[error("snapshot for product {product} is not a valid document: {source}")]
    Document {
        /// Identifier of the affected product.
        product: String,
        /// Canonicalization failure.
        #[source]
        source: CanonicalizeError,
    },
    /// Writing results failed.
    #[error("failed to write results: {0}")]
    SinkIo(#[source] std::io::Error),
    /// Results could not be serialized.
    #[error("failed to serialize results: {0}")]
    Serialize(#[source] serde_json::Error),
}
