//! Batch comparison of document snapshots.
//!
//! A [`SnapshotSource`] supplies the current and previous version of each
//! product, [`compare_batch`] diffs them, and a [`ResultSink`] receives the
//! products that changed. [`run_pipeline`] wires the three together and wraps
//! only the two I/O collaborators in [`retry`]; the comparison itself is
//! deterministic and never retried.

mod ndjson;
mod retry;

pub use ndjson::{read_snapshots, NdjsonSink, NdjsonSource};
pub use retry::{retry, RetryPolicy};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{compare_documents, CompareOptions, Diff, PipelineError, Value};

/// Current and previous version of one product's document.
#[derive(Clone, Debug, PartialEq)]
pub struct SnapshotPair {
    /// Product identifier.
    pub product: String,
    /// Publish time of the current version.
    pub publish_time: String,
    /// Publish time of the previous version, when known.
    pub previous_publish_time: Option<String>,
    /// Current document.
    pub current: Value,
    /// Previous document; `None` for products seen for the first time.
    pub previous: Option<Value>,
}

/// Changes detected for one product.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordUpdate {
    /// Product identifier.
    pub product: String,
    /// Publish time of the current version.
    #[serde(rename = "publishTime")]
    pub publish_time: String,
    /// Records describing how the previous version became the current one.
    pub updates: Diff,
}

/// Supplies snapshot pairs to compare.
pub trait SnapshotSource {
    /// Retrieves every snapshot pair of the batch.
    fn fetch(&mut self) -> Result<Vec<SnapshotPair>, PipelineError>;
}

/// Persists the detected updates.
pub trait ResultSink {
    /// Writes one batch of updates.
    fn write(&mut self, batch: &[RecordUpdate]) -> Result<(), PipelineError>;
}

/// Counters describing one pipeline run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PipelineSummary {
    /// Snapshot pairs fetched from the source.
    pub snapshots: usize,
    /// Pairs that had a previous version to compare against.
    pub compared: usize,
    /// Products with at least one change.
    pub changed: usize,
    /// Total number of diff records written.
    pub records: usize,
}

/// Compares every pair and keeps the products that changed.
///
/// Pairs without a previous version produce nothing, and so do pairs whose
/// comparison is empty.
///
/// ```
/// # use snapdiff_core::pipeline::{compare_batch, SnapshotPair};
/// # use snapdiff_core::{CompareOptions, Value};
/// let pair = |previous: Option<&str>| SnapshotPair {
///     product: "p".into(),
///     publish_time: "t".into(),
///     previous_publish_time: None,
///     current: Value::from_json_str("{\"a\":2}").unwrap(),
///     previous: previous.map(|json| Value::from_json_str(json).unwrap()),
/// };
/// let batch = [pair(None), pair(Some("{\"a\":2}")), pair(Some("{\"a\":1}"))];
/// let updates = compare_batch(&batch, &CompareOptions::default());
/// assert_eq!(updates.len(), 1);
/// assert_eq!(updates[0].updates.len(), 1);
/// ```
#[must_use]
pub fn compare_batch(pairs: &[SnapshotPair], options: &CompareOptions) -> Vec<RecordUpdate> {
    let mut updates = Vec::new();
    for pair in pairs {
        let Some(previous) = &pair.previous else {
            debug!(product = %pair.product, "no previous version; nothing to compare");
            continue;
        };
        let diff = compare_documents(previous, &pair.current, options);
        if diff.is_empty() {
            continue;
        }
        updates.push(RecordUpdate {
            product: pair.product.clone(),
            publish_time: pair.publish_time.clone(),
            updates: diff,
        });
    }
    updates
}

/// Fetches a batch, compares it, and writes the changed products.
///
/// The sink is not called when nothing changed. Fetch and write failures are
/// retried according to `policy`; the final failure is returned as is.
pub fn run_pipeline<S, K>(
    source: &mut S,
    sink: &mut K,
    options: &CompareOptions,
    policy: &RetryPolicy,
) -> Result<PipelineSummary, PipelineError>
where
    S: SnapshotSource + ?Sized,
    K: ResultSink + ?Sized,
{
    let pairs = retry(policy, "fetch snapshots", || source.fetch())?;
    debug!(snapshots = pairs.len(), "fetched snapshot batch");

    let updates = compare_batch(&pairs, options);
    let summary = PipelineSummary {
        snapshots: pairs.len(),
        compared: pairs.iter().filter(|pair| pair.previous.is_some()).count(),
        changed: updates.len(),
        records: updates.iter().map(|update| update.updates.len()).sum(),
    };

    if updates.is_empty() {
        info!(snapshots = summary.snapshots, "no changes detected");
    } else {
        retry(policy, "write results", || sink.write(&updates))?;
        info!(
            snapshots = summary.snapshots,
            compared = summary.compared,
            changed = summary.changed,
            records = summary.records,
            "changes written"
        );
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::KeyFieldMap;

    struct FixedSource {
        pairs: Vec<SnapshotPair>,
        failures_left: usize,
        calls: usize,
    }

    impl SnapshotSource for FixedSource {
        fn fetch(&mut self) -> Result<Vec<SnapshotPair>, PipelineError> {
            self.calls += 1;
            if self.failures_left > 0 {
                self.failures_left -= 1;
                return Err(PipelineError::SourceIo(std::io::Error::other("unavailable")));
            }
            Ok(self.pairs.clone())
        }
    }

    #[derive(Default)]
    struct MemorySink {
        batches: Vec<Vec<RecordUpdate>>,
    }

    impl ResultSink for MemorySink {
        fn write(&mut self, batch: &[RecordUpdate]) -> Result<(), PipelineError> {
            self.batches.push(batch.to_vec());
            Ok(())
        }
    }

    fn pair(product: &str, previous: Option<&str>, current: &str) -> SnapshotPair {
        SnapshotPair {
            product: product.into(),
            publish_time: "2024-05-02T00:00:00".into(),
            previous_publish_time: previous.map(|_| "2024-05-01T00:00:00".into()),
            current: Value::from_json_str(current).unwrap(),
            previous: previous.map(|json| Value::from_json_str(json).unwrap()),
        }
    }

    fn quick_policy() -> RetryPolicy {
        RetryPolicy::new(2, Duration::ZERO)
    }

    #[test]
    fn only_changed_products_reach_the_sink() {
        let mut source = FixedSource {
            pairs: vec![
                pair("new", None, "{\"a\":1}"),
                pair("same", Some("{\"a\":1}"), "{\"a\":1}"),
                pair("changed", Some("{\"items\":[{\"id\":1,\"v\":\"x\"}]}"), "{\"items\":[{\"id\":1,\"v\":\"y\"}]}"),
            ],
            failures_left: 0,
            calls: 0,
        };
        let mut sink = MemorySink::default();
        let options = CompareOptions::default()
            .with_key_fields(KeyFieldMap::new().with_field("items", ["id"]).unwrap());

        let summary = run_pipeline(&mut source, &mut sink, &options, &quick_policy()).unwrap();

        assert_eq!(summary, PipelineSummary { snapshots: 3, compared: 2, changed: 1, records: 1 });
        assert_eq!(sink.batches.len(), 1);
        assert_eq!(sink.batches[0][0].product, "changed");
        assert_eq!(sink.batches[0][0].updates.records()[0].path, "items.1.v");
    }

    #[test]
    fn sink_is_skipped_when_nothing_changed() {
        let mut source = FixedSource {
            pairs: vec![pair("same", Some("{\"a\":1}"), "{\"a\":1}")],
            failures_left: 0,
            calls: 0,
        };
        let mut sink = MemorySink::default();
        run_pipeline(&mut source, &mut sink, &CompareOptions::default(), &quick_policy()).unwrap();
        assert!(sink.batches.is_empty());
    }

    #[test]
    fn transient_source_failures_are_retried() {
        let mut source = FixedSource {
            pairs: vec![pair("p", Some("{\"a\":1}"), "{\"a\":2}")],
            failures_left: 2,
            calls: 0,
        };
        let mut sink = MemorySink::default();
        let summary =
            run_pipeline(&mut source, &mut sink, &CompareOptions::default(), &quick_policy()).unwrap();
        assert_eq!(source.calls, 3);
        assert_eq!(summary.changed, 1);
    }

    #[test]
    fn persistent_source_failure_propagates() {
        let mut source = FixedSource { pairs: Vec::new(), failures_left: 10, calls: 0 };
        let mut sink = MemorySink::default();
        let err = run_pipeline(&mut source, &mut sink, &CompareOptions::default(), &quick_policy())
            .unwrap_err();
        assert!(matches!(err, PipelineError::SourceIo(_)));
        assert_eq!(source.calls, 3);
    }

    #[test]
    fn record_update_serializes_with_publish_time_key() {
        let update = RecordUpdate {
            product: "p".into(),
            publish_time: "t".into(),
            updates: Value::from_json_str("{\"a\":1}")
                .unwrap()
                .diff(&Value::from_json_str("{\"a\":1,\"b\":2}").unwrap()),
        };
        assert_eq!(
            serde_json::to_string(&update).unwrap(),
            "{\"product\":\"p\",\"publishTime\":\"t\",\"updates\":[{\"path\":\"b\",\"operation\":\"added\",\"old_value\":null,\"new_value\":\"2\"}]}"
        );
    }
}
