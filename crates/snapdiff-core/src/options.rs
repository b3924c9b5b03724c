use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{KeyFieldMap, KeyMode};

/// Order of records returned by a document comparison.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordOrder {
    /// Order in which differences are found (sorted keys, depth first).
    #[default]
    Traversal,
    /// Stable sort by path text after the comparison.
    SortedByPath,
}

impl fmt::Display for RecordOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordOrder::Traversal => f.write_str("traversal"),
            RecordOrder::SortedByPath => f.write_str("sorted_by_path"),
        }
    }
}

/// Configuration passed to [`compare_documents`](crate::compare_documents).
///
/// ```
/// # use snapdiff_core::{CompareOptions, KeyFieldMap, KeyMode, RecordOrder};
/// let keys = KeyFieldMap::new().with_field("items", ["id"])?;
/// let opts = CompareOptions::default()
///     .with_key_fields(keys)
///     .with_key_mode(KeyMode::Fallback)
///     .with_record_order(RecordOrder::SortedByPath);
/// assert_eq!(opts.key_mode(), KeyMode::Fallback);
/// assert!(opts.key_fields().contains("items"));
/// assert!(opts.unmatched_top_level_fields());
/// # Ok::<(), snapdiff_core::OptionsError>(())
/// ```
#[derive(Clone, Debug)]
pub struct CompareOptions {
    key_fields: KeyFieldMap,
    key_mode: KeyMode,
    record_order: RecordOrder,
    unmatched_top_level_fields: bool,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            key_fields: KeyFieldMap::default(),
            key_mode: KeyMode::default(),
            record_order: RecordOrder::default(),
            unmatched_top_level_fields: true,
        }
    }
}

impl CompareOptions {
    /// Identity-key configuration for list-like top-level fields.
    #[must_use]
    pub fn key_fields(&self) -> &KeyFieldMap {
        &self.key_fields
    }

    /// How several identity keys for one field are applied.
    #[must_use]
    pub fn key_mode(&self) -> KeyMode {
        self.key_mode
    }

    /// Order of the returned records.
    #[must_use]
    pub fn record_order(&self) -> RecordOrder {
        self.record_order
    }

    /// Whether unregistered top-level fields present on one side only are
    /// reported as added or removed. Enabled by default.
    #[must_use]
    pub fn unmatched_top_level_fields(&self) -> bool {
        self.unmatched_top_level_fields
    }

    /// Sets the identity-key configuration.
    #[must_use]
    pub fn with_key_fields(mut self, key_fields: KeyFieldMap) -> Self {
        self.key_fields = key_fields;
        self
    }

    /// Sets the multi-key mode.
    #[must_use]
    pub fn with_key_mode(mut self, mode: KeyMode) -> Self {
        self.key_mode = mode;
        self
    }

    /// Sets the record order.
    #[must_use]
    pub fn with_record_order(mut self, order: RecordOrder) -> Self {
        self.record_order = order;
        self
    }

    /// Enables or disables reporting of one-sided top-level fields.
    #[must_use]
    pub fn with_unmatched_top_level_fields(mut self, enabled: bool) -> Self {
        self.unmatched_top_level_fields = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_report_every_change() {
        let opts = CompareOptions::default();
        assert!(opts.key_fields().is_empty());
        assert_eq!(opts.key_mode(), KeyMode::Independent);
        assert_eq!(opts.record_order(), RecordOrder::Traversal);
        assert!(opts.unmatched_top_level_fields());
    }

    #[test]
    fn record_order_display_matches_serde_names() {
        let json = serde_json::to_string(&RecordOrder::SortedByPath).unwrap();
        assert_eq!(json, format!("\"{}\"", RecordOrder::SortedByPath));
    }
}
