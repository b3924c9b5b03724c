use std::collections::BTreeMap;

use super::{diff_into, DiffRecord, Path};
use crate::Value;

/// Recurses into shared fields, then reports fields only in `new`, then
/// fields only in `old`. Each group follows sorted key order.
pub(super) fn diff_mappings(
    old: &BTreeMap<String, Value>,
    new: &BTreeMap<String, Value>,
    path: &Path,
    records: &mut Vec<DiffRecord>,
) {
    for (key, old_value) in old {
        if let Some(new_value) = new.get(key) {
            diff_into(old_value, new_value, &path.child_key(key.as_str()), records);
        }
    }

    for (key, new_value) in new {
        if !old.contains_key(key) {
            records.push(DiffRecord::added(&path.child_key(key.as_str()), new_value));
        }
    }

    for (key, old_value) in old {
        if !new.contains_key(key) {
            records.push(DiffRecord::removed(&path.child_key(key.as_str()), old_value));
        }
    }
}
