//! Benchmark corpora for the snapdiff engine.
//!
//! Documents are generated rather than read from disk: each corpus is a
//! product document with a keyed `offers` list and a positional `attributes`
//! list, plus a second version where the offers are reordered, some prices
//! change, one offer is dropped and one is added.
//!
//! # Examples
//!
//! ```
//! let corpus = snapdiff_benches::available_corpora()
//!     .iter()
//!     .find(|corpus| corpus.name() == "small")
//!     .unwrap();
//! let dataset = corpus.build();
//! assert!(!dataset.compare().is_empty());
//! ```
#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::collections::BTreeMap;

use snapdiff_core::{compare_documents, CompareOptions, Diff, KeyFieldMap, Value};

const KEYED_FIELD: &str = "offers";

/// A named corpus size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Corpus {
    name: &'static str,
    elements: usize,
}

const CORPORA: [Corpus; 3] = [
    Corpus { name: "small", elements: 8 },
    Corpus { name: "catalog", elements: 128 },
    Corpus { name: "wide", elements: 2048 },
];

/// Returns every registered corpus, smallest first.
#[must_use]
pub fn available_corpora() -> &'static [Corpus] {
    &CORPORA
}

impl Corpus {
    /// Name used as the benchmark parameter.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Number of elements in each generated list.
    #[must_use]
    pub fn elements(&self) -> usize {
        self.elements
    }

    /// Generates both versions of the document.
    #[must_use]
    pub fn build(&self) -> Dataset {
        let offers: Vec<Value> = (0..self.elements).map(|i| offer(i, price(i))).collect();
        let attributes: Vec<Value> = (0..self.elements).map(attribute).collect();

        let mut changed: Vec<Value> = (1..self.elements)
            .rev()
            .map(|i| if i % 7 == 0 { offer(i, price(i) + 1) } else { offer(i, price(i)) })
            .collect();
        changed.push(offer(self.elements, price(self.elements)));

        let before = document("v1", offers, attributes.clone());
        let after = document("v2", changed, attributes);
        Dataset { before, after, options: keyed_options() }
    }
}

/// Two versions of a generated document and the options to compare them.
#[derive(Clone, Debug)]
pub struct Dataset {
    before: Value,
    after: Value,
    options: CompareOptions,
}

impl Dataset {
    /// Previous version.
    #[must_use]
    pub fn before(&self) -> &Value {
        &self.before
    }

    /// Current version.
    #[must_use]
    pub fn after(&self) -> &Value {
        &self.after
    }

    /// Compares the versions with `offers` aligned by `sku`.
    #[must_use]
    pub fn compare(&self) -> Diff {
        compare_documents(&self.before, &self.after, &self.options)
    }

    /// Compares the versions with every list aligned by position.
    #[must_use]
    pub fn compare_positional(&self) -> Diff {
        self.before.diff(&self.after)
    }
}

fn keyed_options() -> CompareOptions {
    let mut fields = BTreeMap::new();
    fields.insert(KEYED_FIELD.to_owned(), vec!["sku".to_owned()]);
    let keys = KeyFieldMap::try_from(fields).unwrap_or_default();
    CompareOptions::default().with_key_fields(keys)
}

fn price(index: usize) -> i64 {
    i64::try_from(index % 1000).unwrap_or_default() * 3 + 10
}

fn offer(index: usize, price: i64) -> Value {
    Value::Mapping(BTreeMap::from([
        ("sku".to_owned(), Value::from(format!("SKU-{index:05}"))),
        ("price".to_owned(), Value::from(price)),
        ("available".to_owned(), Value::from(index % 3 != 0)),
    ]))
}

fn attribute(index: usize) -> Value {
    Value::Mapping(BTreeMap::from([
        ("name".to_owned(), Value::from(format!("attr-{index}"))),
        ("value".to_owned(), Value::from(format!("value-{}", index % 17))),
    ]))
}

fn document(revision: &str, offers: Vec<Value>, attributes: Vec<Value>) -> Value {
    Value::Mapping(BTreeMap::from([
        ("title".to_owned(), Value::from("Generated product")),
        ("revision".to_owned(), Value::from(revision)),
        (KEYED_FIELD.to_owned(), Value::Sequence(offers)),
        ("attributes".to_owned(), Value::Sequence(attributes)),
    ]))
}
