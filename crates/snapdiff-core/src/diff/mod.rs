//! Diff records and the structural tree differ.
//!
//! [`diff_values`] compares two [`Value`] trees and reports one
//! [`DiffRecord`] per changed leaf, per added or removed mapping field, and
//! per whole-value replacement. Sequences are compared positionally unless
//! they are routed through [`diff_keyed_list`], which aligns elements by an
//! identity field instead.

mod keyed;
mod mapping;
mod path;
mod primitives;
mod sequence;

pub use keyed::{diff_keyed_list, KeyMode};
pub(crate) use keyed::keyed_into;
pub use path::{Path, PathSegment};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Value;

/// Kind of change reported by a [`DiffRecord`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// The path exists only in the new value.
    Added,
    /// The path exists only in the old value.
    Removed,
    /// The path exists on both sides with different values.
    Modified,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added => f.write_str("added"),
            Self::Removed => f.write_str("removed"),
            Self::Modified => f.write_str("modified"),
        }
    }
}

/// A single reported change.
///
/// Values are stored as their rendered text (see [`Value::render`]), not as
/// typed values. `added` records carry no `old_value`, `removed` records carry
/// no `new_value`, and `modified` records carry both; the constructors uphold
/// this.
///
/// ```
/// # use snapdiff_core::diff::{DiffRecord, Operation, Path, PathSegment};
/// # use snapdiff_core::Value;
/// let record = DiffRecord::added(&Path::from(PathSegment::key("b")), &Value::from(2));
/// assert_eq!(record.operation, Operation::Added);
/// assert_eq!(
///     serde_json::to_string(&record)?,
///     "{\"path\":\"b\",\"operation\":\"added\",\"old_value\":null,\"new_value\":\"2\"}"
/// );
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffRecord {
    /// Display form of the changed location.
    pub path: String,
    /// Kind of change.
    pub operation: Operation,
    /// Rendering of the previous value, if any.
    pub old_value: Option<String>,
    /// Rendering of the new value, if any.
    pub new_value: Option<String>,
}

impl DiffRecord {
    /// Record for a value that only exists on the new side.
    #[must_use]
    pub fn added(path: &Path, new: &Value) -> Self {
        Self {
            path: path.to_string(),
            operation: Operation::Added,
            old_value: None,
            new_value: Some(new.render()),
        }
    }

    /// Record for a value that only exists on the old side.
    #[must_use]
    pub fn removed(path: &Path, old: &Value) -> Self {
        Self {
            path: path.to_string(),
            operation: Operation::Removed,
            old_value: Some(old.render()),
            new_value: None,
        }
    }

    /// Record for a value replaced in place.
    #[must_use]
    pub fn modified(path: &Path, old: &Value, new: &Value) -> Self {
        Self {
            path: path.to_string(),
            operation: Operation::Modified,
            old_value: Some(old.render()),
            new_value: Some(new.render()),
        }
    }
}

/// Ordered collection of diff records.
///
/// ```
/// # use snapdiff_core::{Diff, Value};
/// let old = Value::from_json_str("{\"a\":1}")?;
/// let new = Value::from_json_str("{\"a\":1,\"b\":2}")?;
/// let diff = old.diff(&new);
/// assert_eq!(diff.len(), 1);
/// assert_eq!(
///     diff.render_json()?,
///     "[{\"path\":\"b\",\"operation\":\"added\",\"old_value\":null,\"new_value\":\"2\"}]"
/// );
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diff {
    records: Vec<DiffRecord>,
}

impl Diff {
    /// Builds a diff from the provided records.
    #[must_use]
    pub fn from_records(records: Vec<DiffRecord>) -> Self {
        Self { records }
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Indicates whether the diff is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns an iterator over the records.
    pub fn iter(&self) -> std::slice::Iter<'_, DiffRecord> {
        self.records.iter()
    }

    /// Borrows the records as a slice.
    #[must_use]
    pub fn records(&self) -> &[DiffRecord] {
        &self.records
    }

    /// Consumes the diff and returns the records.
    #[must_use]
    pub fn into_records(self) -> Vec<DiffRecord> {
        self.records
    }

    /// Counts the records with the given operation.
    #[must_use]
    pub fn count(&self, operation: Operation) -> usize {
        self.records.iter().filter(|record| record.operation == operation).count()
    }

    /// Stable-sorts the records by their path text.
    ///
    /// ```
    /// # use snapdiff_core::Value;
    /// let old = Value::from_json_str("{\"b\":1,\"c\":1}")?;
    /// let new = Value::from_json_str("{\"a\":1,\"c\":2}")?;
    /// let mut diff = old.diff(&new);
    /// diff.sort_by_path();
    /// let paths: Vec<_> = diff.iter().map(|r| r.path.as_str()).collect();
    /// assert_eq!(paths, ["a", "b", "c"]);
    /// # Ok::<(), snapdiff_core::CanonicalizeError>(())
    /// ```
    pub fn sort_by_path(&mut self) {
        self.records.sort_by(|a, b| a.path.cmp(&b.path));
    }

    /// Serializes the records as a compact JSON array.
    pub fn render_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.records)
    }

    /// Serializes the records as an indented JSON array.
    pub fn render_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.records)
    }
}

impl IntoIterator for Diff {
    type Item = DiffRecord;
    type IntoIter = std::vec::IntoIter<DiffRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diff {
    type Item = &'a DiffRecord;
    type IntoIter = std::slice::Iter<'a, DiffRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Computes the structural diff between two values rooted at `path`.
///
/// ```
/// # use snapdiff_core::diff::{diff_values, Operation, Path};
/// # use snapdiff_core::Value;
/// let old = Value::from_json_str("[1,2]")?;
/// let new = Value::from_json_str("[1,2,3]")?;
/// let diff = diff_values(&old, &new, &Path::new());
/// assert_eq!(diff.len(), 1);
/// assert_eq!(diff.records()[0].operation, Operation::Modified);
/// # Ok::<(), snapdiff_core::CanonicalizeError>(())
/// ```
#[must_use]
pub fn diff_values(old: &Value, new: &Value, path: &Path) -> Diff {
    let mut records = Vec::new();
    diff_into(old, new, path, &mut records);
    Diff::from_records(records)
}

pub(crate) fn diff_into(old: &Value, new: &Value, path: &Path, records: &mut Vec<DiffRecord>) {
    if old == new {
        return;
    }

    match (old, new) {
        (Value::Mapping(left), Value::Mapping(right)) => {
            mapping::diff_mappings(left, right, path, records);
        }
        (Value::Sequence(left), Value::Sequence(right)) if left.len() == right.len() => {
            sequence::diff_sequences(left, right, path, records);
        }
        _ => primitives::diff_primitives(old, new, path, records),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn value(json: &str) -> Value {
        Value::from_json_str(json).unwrap()
    }

    fn key_path(key: &str) -> Path {
        Path::from(PathSegment::key(key))
    }

    #[test]
    fn differing_scalars_produce_one_modification() {
        let diff = diff_values(&value("1"), &value("2"), &Path::new());
        let expected = Diff::from_records(vec![DiffRecord::modified(
            &Path::new(),
            &value("1"),
            &value("2"),
        )]);
        assert_eq!(diff, expected);
        assert_eq!(diff.records()[0].path, "");
    }

    #[test]
    fn mappings_report_common_then_added_then_removed() {
        let old = value("{\"a\":1,\"b\":2,\"d\":{\"x\":1}}");
        let new = value("{\"b\":3,\"c\":4,\"d\":{\"x\":1}}");
        let diff = diff_values(&old, &new, &Path::new());
        let expected = Diff::from_records(vec![
            DiffRecord::modified(&key_path("b"), &value("2"), &value("3")),
            DiffRecord::added(&key_path("c"), &value("4")),
            DiffRecord::removed(&key_path("a"), &value("1")),
        ]);
        assert_eq!(diff, expected);
    }

    #[test]
    fn equal_length_sequences_diff_per_index() {
        let old = value("{\"tags\":[\"a\",\"b\",\"c\"]}");
        let new = value("{\"tags\":[\"a\",\"x\",\"c\"]}");
        let diff = diff_values(&old, &new, &Path::new());
        assert_eq!(diff.len(), 1);
        let record = &diff.records()[0];
        assert_eq!(record.path, "tags[1]");
        assert_eq!(record.old_value.as_deref(), Some("b"));
        assert_eq!(record.new_value.as_deref(), Some("x"));
    }

    #[test]
    fn sequence_length_change_replaces_whole_sequence() {
        let old = value("{\"tags\":[\"a\"]}");
        let new = value("{\"tags\":[\"a\",\"b\"]}");
        let diff = diff_values(&old, &new, &Path::new());
        assert_eq!(
            diff.into_records(),
            vec![DiffRecord::modified(&key_path("tags"), &value("[\"a\"]"), &value("[\"a\",\"b\"]"))]
        );
    }

    #[test]
    fn type_mismatch_never_recovers_structure() {
        let old = value("{\"a\":null}");
        let new = value("{\"a\":{\"b\":1}}");
        let diff = diff_values(&old, &new, &Path::new());
        assert_eq!(diff.len(), 1);
        assert_eq!(diff.records()[0].old_value.as_deref(), Some("null"));
        assert_eq!(diff.records()[0].new_value.as_deref(), Some("{\"b\":1}"));
    }

    #[test]
    fn nested_paths_mix_keys_and_indices() {
        let old = value("{\"a\":[{\"b\":1}]}");
        let new = value("{\"a\":[{\"b\":2}]}");
        let diff = diff_values(&old, &new, &Path::new());
        assert_eq!(diff.records()[0].path, "a[0].b");
    }

    #[test]
    fn root_sequences_start_with_an_index() {
        let diff = diff_values(&value("[1,2]"), &value("[1,3]"), &Path::new());
        assert_eq!(diff.records()[0].path, "[1]");
    }

    #[test]
    fn empty_mapping_against_populated_one_is_all_added() {
        let diff = diff_values(&value("{}"), &value("{\"x\":1,\"y\":[2]}"), &Path::new());
        assert_eq!(diff.count(Operation::Added), 2);
        assert_eq!(diff.records()[1].new_value.as_deref(), Some("[2]"));
    }

    #[test]
    fn integral_float_equals_integer() {
        assert!(diff_values(&value("{\"n\":1}"), &value("{\"n\":1.0}"), &Path::new()).is_empty());
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        use proptest::{collection::btree_map, collection::vec, string::string_regex};

        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::from),
            string_regex("[a-z0-9]{0,6}").unwrap().prop_map(Value::Text),
        ];
        leaf.prop_recursive(4, 16, 4, move |inner| {
            prop_oneof![
                vec(inner.clone(), 0..4).prop_map(Value::Sequence),
                btree_map(string_regex("[a-z]{1,4}").unwrap(), inner, 0..4)
                    .prop_map(Value::Mapping),
            ]
        })
    }

    fn leaf_pair() -> impl Strategy<Value = (Value, Value)> {
        prop_oneof![
            (any::<bool>(), any::<bool>()).prop_map(|(a, b)| (Value::Bool(a), Value::Bool(b))),
            (any::<i64>(), any::<i64>()).prop_map(|(a, b)| (Value::from(a), Value::from(b))),
            ("[a-z]{0,6}", "[a-z]{0,6}").prop_map(|(a, b)| (Value::Text(a), Value::Text(b))),
        ]
    }

    proptest! {
        #[test]
        fn identical_values_produce_empty_diff(v in arb_value(), segment in "[a-z]{0,4}") {
            let path = if segment.is_empty() { Path::new() } else { Path::from(PathSegment::key(segment)) };
            prop_assert!(diff_values(&v, &v.clone(), &path).is_empty());
        }

        #[test]
        fn distinct_leaves_of_one_kind_yield_single_modification((a, b) in leaf_pair()) {
            prop_assume!(a != b);
            let diff = diff_values(&a, &b, &Path::new());
            prop_assert_eq!(diff.len(), 1);
            let record = &diff.records()[0];
            prop_assert_eq!(record.operation, Operation::Modified);
            prop_assert_eq!(record.old_value.clone(), Some(a.render()));
            prop_assert_eq!(record.new_value.clone(), Some(b.render()));
        }

        #[test]
        fn populating_an_empty_mapping_adds_every_key(
            map in proptest::collection::btree_map("[a-z]{1,4}", arb_value(), 0..6)
        ) {
            let expected = map.len();
            let diff = diff_values(&Value::Mapping(Default::default()), &Value::Mapping(map), &Path::new());
            prop_assert_eq!(diff.len(), expected);
            prop_assert_eq!(diff.count(Operation::Added), expected);
            prop_assert!(diff.iter().all(|r| r.old_value.is_none()));
        }

        #[test]
        fn length_mismatch_is_one_modification(
            a in proptest::collection::vec(arb_value(), 0..4),
            extra in arb_value(),
        ) {
            let mut b = a.clone();
            b.push(extra);
            let path = Path::from(PathSegment::key("list"));
            let diff = diff_values(&Value::Sequence(a), &Value::Sequence(b), &path);
            prop_assert_eq!(diff.len(), 1);
            prop_assert_eq!(diff.records()[0].path.as_str(), "list");
            prop_assert_eq!(diff.records()[0].operation, Operation::Modified);
        }
    }
}
