use super::{DiffRecord, Path};
use crate::Value;

/// Produces a replacement record for scalars, kind mismatches, and sequences
/// whose lengths differ.
pub(super) fn diff_primitives(old: &Value, new: &Value, path: &Path, records: &mut Vec<DiffRecord>) {
    records.push(DiffRecord::modified(path, old, new));
}
