//! Structural diffing of document snapshots.
//!
//! `snapdiff-core` compares two versions of a semi-structured document and
//! reports a flat list of path-addressed changes. Sequences stored under
//! configured top-level fields are aligned by identity keys instead of by
//! position, so reordering a list does not show up as a change.
//!
//! ```
//! use snapdiff_core::{compare_documents, CompareOptions, KeyFieldMap, Operation, Value};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let keys = KeyFieldMap::from_json_str("{\"items\":[\"id\"]}")?;
//!     let options = CompareOptions::default().with_key_fields(keys);
//!
//!     let previous = Value::from_json_str(
//!         "{\"title\":\"Lamp\",\"items\":[{\"id\":1,\"v\":\"x\"},{\"id\":2,\"v\":\"z\"}]}",
//!     )?;
//!     let current = Value::from_json_str(
//!         "{\"title\":\"Desk lamp\",\"items\":[{\"id\":2,\"v\":\"z\"},{\"id\":1,\"v\":\"y\"}]}",
//!     )?;
//!
//!     let diff = compare_documents(&previous, &current, &options);
//!     let paths: Vec<_> = diff.iter().map(|record| record.path.as_str()).collect();
//!     assert_eq!(paths, ["title", "items.1.v"]);
//!     assert!(diff.iter().all(|record| record.operation == Operation::Modified));
//!     Ok(())
//! }
//! ```
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod compare;
pub mod diff;
mod error;
mod keys;
mod number;
mod options;
pub mod pipeline;
mod value;

pub use compare::compare_documents;
pub use diff::{Diff, DiffRecord, KeyMode, Operation, Path, PathSegment};
pub use error::{CanonicalizeError, ConfigError, OptionsError, PipelineError};
pub use keys::KeyFieldMap;
pub use number::Number;
pub use options::{CompareOptions, RecordOrder};
pub use value::Value;

/// Returns the semantic version of the `snapdiff-core` crate.
///
/// ```
/// assert!(!snapdiff_core::version().is_empty());
/// ```
#[must_use]
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
