use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::diff::{diff_into, keyed_into, DiffRecord, Path, PathSegment};
use crate::{CompareOptions, Diff, RecordOrder, Value};

/// Compares two versions of a document.
///
/// Top-level fields registered in the options' [`KeyFieldMap`](crate::KeyFieldMap)
/// are compared as keyed lists, a missing or null side counting as an empty
/// list. Every other field present on both sides is compared structurally,
/// and unregistered fields present on one side only are reported as added or
/// removed unless [`CompareOptions::with_unmatched_top_level_fields`] turns
/// that off. Documents whose roots are not mappings are compared structurally
/// as a whole.
///
/// ```
/// # use snapdiff_core::{compare_documents, CompareOptions, KeyFieldMap, Value};
/// let keys = KeyFieldMap::new().with_field("items", ["id"])?;
/// let options = CompareOptions::default().with_key_fields(keys);
/// let old = Value::from_json_str("{\"items\":[{\"id\":1,\"v\":\"x\"}]}")?;
/// let new = Value::from_json_str("{\"items\":[{\"id\":1,\"v\":\"y\"}]}")?;
/// let diff = compare_documents(&old, &new, &options);
/// assert_eq!(diff.records()[0].path, "items.1.v");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[must_use]
pub fn compare_documents(old: &Value, new: &Value, options: &CompareOptions) -> Diff {
    let mut records = Vec::new();
    match (old, new) {
        (Value::Mapping(left), Value::Mapping(right)) => {
            compare_fields(left, right, options, &mut records);
        }
        _ => diff_into(old, new, &Path::new(), &mut records),
    }

    let mut diff = Diff::from_records(records);
    if options.record_order() == RecordOrder::SortedByPath {
        diff.sort_by_path();
    }
    debug!(records = diff.len(), "document comparison complete");
    diff
}

fn compare_fields(
    old: &BTreeMap<String, Value>,
    new: &BTreeMap<String, Value>,
    options: &CompareOptions,
    records: &mut Vec<DiffRecord>,
) {
    let key_fields = options.key_fields();

    for (field, old_value) in old {
        if key_fields.contains(field) {
            continue;
        }
        if let Some(new_value) = new.get(field) {
            diff_into(old_value, new_value, &field_path(field), records);
        }
    }

    for (field, identity_keys) in key_fields.iter() {
        let path = field_path(field);
        let old_value = old.get(field);
        let new_value = new.get(field);
        match (as_list(old_value), as_list(new_value)) {
            (Some(old_items), Some(new_items)) => {
                keyed_into(identity_keys, old_items, new_items, &path, options.key_mode(), records);
            }
            _ => {
                warn!(
                    field = %field,
                    old_kind = old_value.map_or("absent", |value| value.kind()),
                    new_kind = new_value.map_or("absent", |value| value.kind()),
                    "registered list field does not hold a sequence; comparing it as a tree"
                );
                match (old_value, new_value) {
                    (Some(old_value), Some(new_value)) => {
                        diff_into(old_value, new_value, &path, records);
                    }
                    (None, Some(new_value)) => records.push(DiffRecord::added(&path, new_value)),
                    (Some(old_value), None) => records.push(DiffRecord::removed(&path, old_value)),
                    // both absent means both are empty lists
                    (None, None) => {}
                }
            }
        }
    }

    if options.unmatched_top_level_fields() {
        for (field, new_value) in new {
            if !old.contains_key(field) && !key_fields.contains(field) {
                records.push(DiffRecord::added(&field_path(field), new_value));
            }
        }
        for (field, old_value) in old {
            if !new.contains_key(field) && !key_fields.contains(field) {
                records.push(DiffRecord::removed(&field_path(field), old_value));
            }
        }
    }
}

fn field_path(field: &str) -> Path {
    Path::from(PathSegment::key(field))
}

/// Sequence view of a registered field. Absent and null count as empty.
fn as_list(value: Option<&Value>) -> Option<&[Value]> {
    match value {
        None | Some(Value::Null) => Some(&[] as &[Value]),
        Some(Value::Sequence(items)) => Some(items),
        Some(_) => None,
    }
}
