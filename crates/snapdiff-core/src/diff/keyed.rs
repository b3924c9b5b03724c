use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{diff_into, Diff, DiffRecord, Path};
use crate::Value;

/// How several identity keys configured for one field are applied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyMode {
    /// Align the lists once per key and concatenate the results. Records are
    /// not deduplicated, so overlapping keys can report the same change twice.
    #[default]
    Independent,
    /// Align the lists once; each element is identified by the first key it
    /// carries with a non-null value.
    Fallback,
}

impl fmt::Display for KeyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Independent => f.write_str("independent"),
            Self::Fallback => f.write_str("fallback"),
        }
    }
}

/// Identity of a keyed list element.
///
/// Values of different kinds never collide, even when their renderings do.
/// Numbers are compared through their identity text so `1` and `1.0` align.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Identity {
    Null,
    Bool(bool),
    Number(String),
    Text(String),
    Container(String),
}

impl Identity {
    fn of(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => Self::Null,
            Some(Value::Bool(b)) => Self::Bool(*b),
            Some(Value::Number(n)) => Self::Number(n.identity_text()),
            Some(Value::Text(s)) => Self::Text(s.clone()),
            Some(other @ (Value::Mapping(_) | Value::Sequence(_))) => {
                Self::Container(other.render())
            }
        }
    }

    fn segment(&self) -> String {
        match self {
            Self::Null => "null".to_owned(),
            Self::Bool(b) => b.to_string(),
            Self::Number(text) | Self::Text(text) | Self::Container(text) => text.clone(),
        }
    }
}

/// Compares two sequences by aligning their elements on identity keys.
///
/// Each element is addressed by `path.<identity>` rather than by position, so
/// reordering a list or inserting elsewhere does not disturb unrelated
/// elements. Elements that are not mappings, or lack the key, share the
/// `null` identity; when several elements share an identity the last one
/// wins. An empty key list compares nothing.
///
/// ```
/// # use snapdiff_core::diff::{diff_keyed_list, KeyMode, Path, PathSegment};
/// # use snapdiff_core::Value;
/// let Value::Sequence(old) = Value::from_json_str("[{\"id\":1,\"v\":\"x\"},{\"id\":2,\"v\":\"z\"}]")? else {
///     unreachable!()
/// };
/// let Value::Sequence(new) = Value::from_json_str("[{\"id\":2,\"v\":\"z\"},{\"id\":1,\"v\":\"y\"}]")? else {
///     unreachable!()
/// };
/// let keys = vec!["id".to_string()];
/// let path = Path::from(PathSegment::key("items"));
/// let diff = diff_keyed_list(&keys, &old, &new, &path, KeyMode::Independent);
/// assert_eq!(diff.len(), 1);
/// assert_eq!(diff.records()[0].path, "items.1.v");
/// # Ok::<(), snapdiff_core::CanonicalizeError>(())
/// ```
#[must_use]
pub fn diff_keyed_list(
    identity_keys: &[String],
    old: &[Value],
    new: &[Value],
    path: &Path,
    mode: KeyMode,
) -> Diff {
    let mut records = Vec::new();
    keyed_into(identity_keys, old, new, path, mode, &mut records);
    Diff::from_records(records)
}

pub(crate) fn keyed_into(
    identity_keys: &[String],
    old: &[Value],
    new: &[Value],
    path: &Path,
    mode: KeyMode,
    records: &mut Vec<DiffRecord>,
) {
    if identity_keys.is_empty() {
        return;
    }

    match mode {
        KeyMode::Independent => {
            for key in identity_keys {
                align(old, new, path, |item| (0, Identity::of(item.get(key))), records);
            }
        }
        KeyMode::Fallback => {
            // Identities found through different keys live apart.
            let identify = |item: &Value| {
                identity_keys
                    .iter()
                    .enumerate()
                    .find_map(|(rank, key)| {
                        let value = item.get(key).filter(|v| !v.is_null())?;
                        Some((rank, Identity::of(Some(value))))
                    })
                    .unwrap_or((0, Identity::Null))
            };
            align(old, new, path, identify, records);
        }
    }
}

/// Rank of the identity key that matched, then the identity it produced.
type Slot = (usize, Identity);

fn align<F>(old: &[Value], new: &[Value], path: &Path, identify: F, records: &mut Vec<DiffRecord>)
where
    F: Fn(&Value) -> Slot,
{
    let old_by_id = index_by(old, &identify);
    let new_by_id = index_by(new, &identify);

    for (slot, old_item) in &old_by_id {
        if let Some(new_item) = new_by_id.get(slot) {
            diff_into(old_item, new_item, &path.child_key(slot.1.segment()), records);
        }
    }

    for (slot, new_item) in &new_by_id {
        if !old_by_id.contains_key(slot) {
            records.push(DiffRecord::added(&path.child_key(slot.1.segment()), new_item));
        }
    }

    for (slot, old_item) in &old_by_id {
        if !new_by_id.contains_key(slot) {
            records.push(DiffRecord::removed(&path.child_key(slot.1.segment()), old_item));
        }
    }
}

fn index_by<'a, F>(items: &'a [Value], identify: &F) -> BTreeMap<Slot, &'a Value>
where
    F: Fn(&Value) -> Slot,
{
    let mut indexed = BTreeMap::new();
    for item in items {
        indexed.insert(identify(item), item);
    }
    indexed
}
