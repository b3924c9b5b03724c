use super::{diff_into, DiffRecord, Path};
use crate::Value;

/// Positional comparison of two sequences of equal length.
pub(super) fn diff_sequences(
    old: &[Value],
    new: &[Value],
    path: &Path,
    records: &mut Vec<DiffRecord>,
) {
    debug_assert_eq!(old.len(), new.len(), "length mismatches are whole-value replacements");
    for (index, (old_item, new_item)) in old.iter().zip(new).enumerate() {
        diff_into(old_item, new_item, &path.child_index(index), records);
    }
}
