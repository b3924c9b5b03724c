//! Fuzzing harnesses for the snapdiff engine.
//!
//! Each public function accepts raw bytes, derives documents from them, and
//! drives one part of the engine while checking the invariants that must
//! hold for any input. Decoding failures are ignored so fuzzers can keep
//! exploring; invariant violations panic.
//!
//! # Examples
//!
//! ```
//! snapdiff_fuzz::fuzz_canonicalization(b"{\"a\":1}");
//! snapdiff_fuzz::fuzz_diff(&[1, 2, 3, 4]);
//! snapdiff_fuzz::fuzz_keyed_diff(b"keyed");
//! ```
#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::collections::BTreeMap;

use arbitrary::Unstructured;
use snapdiff_core::{
    compare_documents, CompareOptions, Diff, KeyFieldMap, KeyMode, Number, Operation, Value,
};

const MAX_DEPTH: usize = 4;
const MAX_SEQUENCE_LEN: u8 = 6;
const MAX_MAPPING_LEN: u8 = 6;
const MAX_TEXT_LEN: u8 = 12;
const MAX_KEYED_ELEMENTS: u8 = 8;
const KEYED_FIELD: &str = "items";

/// Feeds arbitrary bytes through the JSON and YAML parsers.
///
/// Containers that parse must survive a trip through their own rendering.
///
/// ```
/// snapdiff_fuzz::fuzz_canonicalization(b"{\"key\":\"value\"}");
/// ```
pub fn fuzz_canonicalization(data: &[u8]) {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    for parsed in [Value::from_json_str(text), Value::from_yaml_str(text)] {
        let Ok(value) = parsed else {
            continue;
        };
        if matches!(value, Value::Mapping(_) | Value::Sequence(_)) {
            let reparsed = Value::from_json_str(&value.render())
                .expect("rendered container is valid JSON");
            assert_eq!(reparsed, value, "rendering changed the document");
        }
    }
}

/// Drives the tree differ with two randomly generated documents.
///
/// ```
/// snapdiff_fuzz::fuzz_diff(b"seed");
/// ```
pub fn fuzz_diff(data: &[u8]) {
    let mut unstructured = Unstructured::new(data);
    let Ok(old) = random_value(&mut unstructured, 0) else {
        return;
    };
    let Ok(new) = random_value(&mut unstructured, 0) else {
        return;
    };

    assert!(old.diff(&old).is_empty(), "a document differs from itself");
    let diff = old.diff(&new);
    assert_eq!(diff.is_empty(), old == new, "empty diff must mean equal documents");
    check_records(&diff);
}

/// Drives the keyed list aligner with a list and a shuffled, edited copy.
///
/// Every element carries a distinct integer `id`, so a pure reordering must
/// compare empty.
///
/// ```
/// snapdiff_fuzz::fuzz_keyed_diff(b"keyed fuzz");
/// ```
pub fn fuzz_keyed_diff(data: &[u8]) {
    let mut unstructured = Unstructured::new(data);
    let Ok(scenario) = keyed_scenario(&mut unstructured) else {
        return;
    };
    let KeyedScenario { old, shuffled, edited, mode } = scenario;

    let Ok(keys) = KeyFieldMap::new().with_field(KEYED_FIELD, ["id"]) else {
        return;
    };
    let options = CompareOptions::default().with_key_fields(keys).with_key_mode(mode);
    let wrap = |items: Vec<Value>| {
        Value::Mapping(BTreeMap::from([(KEYED_FIELD.to_owned(), Value::Sequence(items))]))
    };
    let old = wrap(old);

    assert!(
        compare_documents(&old, &wrap(shuffled), &options).is_empty(),
        "reordering a keyed list reported changes"
    );
    let diff = compare_documents(&old, &wrap(edited), &options);
    check_records(&diff);
    for record in &diff {
        assert!(record.path.starts_with("items."), "keyed record outside its field: {}", record.path);
    }
}

struct KeyedScenario {
    old: Vec<Value>,
    shuffled: Vec<Value>,
    edited: Vec<Value>,
    mode: KeyMode,
}

fn keyed_scenario(unstructured: &mut Unstructured<'_>) -> arbitrary::Result<KeyedScenario> {
    let len = unstructured.int_in_range::<u8>(0..=MAX_KEYED_ELEMENTS)?;
    let mut old = Vec::with_capacity(usize::from(len));
    for id in 0..i64::from(len) {
        let mut element = BTreeMap::new();
        element.insert("id".to_owned(), Value::from(id));
        element.insert("payload".to_owned(), random_value(unstructured, 2)?);
        old.push(Value::Mapping(element));
    }

    let mut shuffled = old.clone();
    for i in (1..shuffled.len()).rev() {
        let j = unstructured.choose_index(i + 1)?;
        shuffled.swap(i, j);
    }

    let mut edited = Vec::with_capacity(shuffled.len());
    for element in &shuffled {
        match unstructured.int_in_range::<u8>(0..=3)? {
            0 => {}
            1 => {
                let Value::Mapping(mut fields) = element.clone() else {
                    continue;
                };
                fields.insert("payload".to_owned(), random_value(unstructured, 2)?);
                edited.push(Value::Mapping(fields));
            }
            _ => edited.push(element.clone()),
        }
    }
    if unstructured.arbitrary()? {
        let mut element = BTreeMap::new();
        element.insert("id".to_owned(), Value::from(i64::from(len)));
        edited.push(Value::Mapping(element));
    }

    let mode = if unstructured.arbitrary()? { KeyMode::Fallback } else { KeyMode::Independent };
    Ok(KeyedScenario { old, shuffled, edited, mode })
}

fn check_records(diff: &Diff) {
    for record in diff {
        match record.operation {
            Operation::Added => {
                assert!(record.old_value.is_none() && record.new_value.is_some());
            }
            Operation::Removed => {
                assert!(record.old_value.is_some() && record.new_value.is_none());
            }
            Operation::Modified => {
                assert!(record.old_value.is_some() && record.new_value.is_some());
            }
        }
    }
}

fn random_value(unstructured: &mut Unstructured<'_>, depth: usize) -> arbitrary::Result<Value> {
    let upper = if depth >= MAX_DEPTH { 3 } else { 5 };
    match unstructured.int_in_range::<u8>(0..=upper)? {
        0 => Ok(Value::Null),
        1 => Ok(Value::Bool(unstructured.arbitrary()?)),
        2 => Ok(Value::Number(random_number(unstructured)?)),
        3 => Ok(Value::Text(random_text(unstructured)?)),
        4 => {
            let len = unstructured.int_in_range::<u8>(0..=MAX_SEQUENCE_LEN)?;
            let mut items = Vec::with_capacity(usize::from(len));
            for _ in 0..len {
                items.push(random_value(unstructured, depth + 1)?);
            }
            Ok(Value::Sequence(items))
        }
        _ => {
            let len = unstructured.int_in_range::<u8>(0..=MAX_MAPPING_LEN)?;
            let mut fields = BTreeMap::new();
            for _ in 0..len {
                let key = random_text(unstructured)?;
                fields.insert(key, random_value(unstructured, depth + 1)?);
            }
            Ok(Value::Mapping(fields))
        }
    }
}

fn random_number(unstructured: &mut Unstructured<'_>) -> arbitrary::Result<Number> {
    if unstructured.arbitrary()? {
        return Ok(Number::Integer(unstructured.arbitrary()?));
    }
    let numerator = f64::from(unstructured.arbitrary::<i32>()?);
    let denominator = f64::from(unstructured.int_in_range::<u16>(1..=1024)?);
    Number::from_f64(numerator / denominator).map_err(|_| arbitrary::Error::IncorrectFormat)
}

fn random_text(unstructured: &mut Unstructured<'_>) -> arbitrary::Result<String> {
    let len = unstructured.int_in_range::<u8>(0..=MAX_TEXT_LEN)?;
    (0..len)
        .map(|_| unstructured.int_in_range::<u8>(0x20..=0x7e).map(char::from))
        .collect()
}
