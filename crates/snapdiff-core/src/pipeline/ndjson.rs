use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path as FsPath, PathBuf};

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use super::{RecordUpdate, ResultSink, SnapshotPair, SnapshotSource};
use crate::{PipelineError, Value};

/// One snapshot row as produced by the snapshot query.
///
/// The documents come wrapped in arrays; the first element of each array is
/// the document of that version. Product ids and publish times may be any
/// JSON scalar; they are carried as their text.
#[derive(Debug, Deserialize)]
struct SnapshotRow {
    #[serde(deserialize_with = "scalar_text")]
    product: String,
    #[serde(rename = "publishTime", deserialize_with = "scalar_text")]
    publish_time: String,
    #[serde(rename = "previous_publishTime", default, deserialize_with = "optional_scalar_text")]
    previous_publish_time: Option<String>,
    #[serde(default)]
    current_data: Option<Vec<JsonValue>>,
    #[serde(default)]
    old_data: Option<Vec<JsonValue>>,
}

fn scalar_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    text_of(JsonValue::deserialize(deserializer)?)
}

fn optional_scalar_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<JsonValue>::deserialize(deserializer)? {
        None | Some(JsonValue::Null) => Ok(None),
        Some(value) => text_of(value).map(Some),
    }
}

fn text_of<E: de::Error>(value: JsonValue) -> Result<String, E> {
    match value {
        JsonValue::String(text) => Ok(text),
        scalar @ (JsonValue::Number(_) | JsonValue::Bool(_)) => Ok(scalar.to_string()),
        other => Err(E::custom(format!("expected a string or number, found {other}"))),
    }
}

/// Reads snapshot rows from newline-delimited JSON.
///
/// Blank lines are skipped, as are rows without a current document.
///
/// ```
/// # use snapdiff_core::pipeline::read_snapshots;
/// let rows = concat!(
///     "{\"product\":\"p1\",\"publishTime\":\"2024-05-02T00:00:00\",",
///     "\"current_data\":[{\"a\":2}],\"old_data\":[{\"a\":1}]}\n",
///     "\n",
///     "{\"product\":\"p2\",\"publishTime\":\"2024-05-02T00:00:00\",",
///     "\"current_data\":[{\"a\":1}],\"old_data\":[]}\n",
/// );
/// let pairs = read_snapshots(rows.as_bytes())?;
/// assert_eq!(pairs.len(), 2);
/// assert!(pairs[0].previous.is_some());
/// assert!(pairs[1].previous.is_none());
/// # Ok::<(), snapdiff_core::PipelineError>(())
/// ```
pub fn read_snapshots<R>(reader: R) -> Result<Vec<SnapshotPair>, PipelineError>
where
    R: BufRead,
{
    let mut pairs = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(PipelineError::SourceIo)?;
        if line.trim().is_empty() {
            continue;
        }
        let row: SnapshotRow = serde_json::from_str(&line)
            .map_err(|source| PipelineError::MalformedRow { line: index + 1, source })?;
        if let Some(pair) = pair_from_row(row)? {
            pairs.push(pair);
        }
    }
    Ok(pairs)
}

fn pair_from_row(row: SnapshotRow) -> Result<Option<SnapshotPair>, PipelineError> {
    let SnapshotRow { product, publish_time, previous_publish_time, current_data, old_data } = row;

    let Some(current) = current_data.and_then(|docs| docs.into_iter().next()) else {
        warn!(product = %product, "snapshot row has no current document; skipping");
        return Ok(None);
    };
    let canonicalize = |doc: JsonValue| {
        Value::from_json_value(doc)
            .map_err(|source| PipelineError::Document { product: product.clone(), source })
    };
    let current = canonicalize(current)?;
    let previous = match old_data.and_then(|docs| docs.into_iter().next()) {
        Some(doc) => Some(canonicalize(doc)?),
        None => None,
    };

    Ok(Some(SnapshotPair { product, publish_time, previous_publish_time, current, previous }))
}

/// Snapshot source backed by an NDJSON file.
///
/// The file is re-read on every fetch, so a retried fetch starts from the
/// beginning.
#[derive(Clone, Debug)]
pub struct NdjsonSource {
    path: PathBuf,
}

impl NdjsonSource {
    /// Creates a source reading from `path`.
    #[must_use]
    pub fn new<P>(path: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self { path: path.into() }
    }
}

impl SnapshotSource for NdjsonSource {
    fn fetch(&mut self) -> Result<Vec<SnapshotPair>, PipelineError> {
        let file = File::open(&self.path).map_err(PipelineError::SourceIo)?;
        let pairs = read_snapshots(BufReader::new(file))?;
        debug!(path = %self.path.display(), snapshots = pairs.len(), "read snapshot file");
        Ok(pairs)
    }
}

/// Result sink writing one JSON object per line.
///
/// ```
/// # use snapdiff_core::pipeline::{NdjsonSink, RecordUpdate, ResultSink};
/// # use snapdiff_core::Value;
/// let old = Value::from_json_str("{\"a\":1}")?;
/// let new = Value::from_json_str("{\"a\":2}")?;
/// let update = RecordUpdate {
///     product: "p1".into(),
///     publish_time: "2024-05-02T00:00:00".into(),
///     updates: old.diff(&new),
/// };
/// let mut sink = NdjsonSink::new(Vec::new());
/// sink.write(&[update])?;
/// let written = String::from_utf8(sink.into_inner()).unwrap();
/// assert!(written.starts_with("{\"product\":\"p1\",\"publishTime\":"));
/// assert!(written.ends_with("}\n"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct NdjsonSink<W> {
    writer: W,
}

impl<W> NdjsonSink<W>
where
    W: Write,
{
    /// Wraps an arbitrary writer.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl NdjsonSink<BufWriter<File>> {
    /// Opens `path` for appending, creating it when missing.
    pub fn append<P>(path: P) -> Result<Self, PipelineError>
    where
        P: AsRef<FsPath>,
    {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())
            .map_err(PipelineError::SinkIo)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W> ResultSink for NdjsonSink<W>
where
    W: Write,
{
    fn write(&mut self, batch: &[RecordUpdate]) -> Result<(), PipelineError> {
        for update in batch {
            let line = serde_json::to_string(update).map_err(PipelineError::Serialize)?;
            self.writer.write_all(line.as_bytes()).map_err(PipelineError::SinkIo)?;
            self.writer.write_all(b"\n").map_err(PipelineError::SinkIo)?;
        }
        self.writer.flush().map_err(PipelineError::SinkIo)?;
        debug!(updates = batch.len(), "wrote result batch");
        Ok(())
    }
}
