use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::Write;
use tempfile::NamedTempFile;

const OLD_PRODUCT: &str =
    r#"{"title":"Lamp","items":[{"id":1,"v":"x"},{"id":2,"v":"z"}],"extra":true}"#;
const NEW_PRODUCT: &str = r#"{"title":"Lamp","items":[{"id":2,"v":"z"},{"id":1,"v":"y"}]}"#;

fn write_tempfile(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create tempfile");
    write!(file, "{contents}").expect("write tempfile");
    file
}

fn write_keys(contents: &str, extension: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(extension)
        .tempfile()
        .expect("create key file");
    write!(file, "{contents}").expect("write key file");
    file
}

fn snapdiff() -> Command {
    let mut cmd = Command::cargo_bin("snapdiff").expect("binary snapdiff should be built");
    cmd.env_remove("SNAPDIFF_LOG");
    cmd
}

#[test]
fn help_succeeds() {
    snapdiff()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("diff"))
        .stdout(predicate::str::contains("batch"));
}

#[test]
fn version_prints_package_version() {
    snapdiff()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn equal_documents_exit_zero_with_empty_array() {
    let old = write_tempfile(OLD_PRODUCT);
    let new = write_tempfile(OLD_PRODUCT);

    snapdiff()
        .arg("diff")
        .arg(old.path())
        .arg(new.path())
        .assert()
        .code(0)
        .stdout("[]\n")
        .stderr(predicate::str::is_empty());
}

#[test]
fn keyed_diff_reports_identity_paths() {
    let old = write_tempfile(OLD_PRODUCT);
    let new = write_tempfile(NEW_PRODUCT);
    let keys = write_keys(r#"{"items":["id"]}"#, ".json");

    snapdiff()
        .arg("diff")
        .arg(old.path())
        .arg(new.path())
        .arg("--keys")
        .arg(keys.path())
        .arg("--skip-unmatched-fields")
        .assert()
        .code(1)
        .stdout(
            "[{\"path\":\"items.1.v\",\"operation\":\"modified\",\"old_value\":\"x\",\"new_value\":\"y\"}]\n",
        )
        .stderr(predicate::str::is_empty());
}

#[test]
fn yaml_key_file_reports_one_sided_fields() {
    let old = write_tempfile(OLD_PRODUCT);
    let new = write_tempfile(NEW_PRODUCT);
    let keys = write_keys("items:\n  - id\n", ".yaml");

    snapdiff()
        .arg("diff")
        .arg(old.path())
        .arg(new.path())
        .arg("--keys")
        .arg(keys.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"path\":\"extra\",\"operation\":\"removed\""))
        .stdout(predicate::str::contains("\"path\":\"items.1.v\""));
}

#[test]
fn positional_comparison_without_keys() {
    let old = write_tempfile(OLD_PRODUCT);
    let new = write_tempfile(NEW_PRODUCT);

    snapdiff()
        .arg("diff")
        .arg(old.path())
        .arg(new.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"path\":\"items[0].id\""))
        .stdout(predicate::str::contains("\"path\":\"items[1].v\""));
}

#[test]
fn output_flag_writes_file() {
    let old = write_tempfile(r#"{"a":1}"#);
    let new = write_tempfile(r#"{"a":1,"b":2}"#);
    let dir = tempfile::tempdir().expect("create tempdir");
    let out = dir.path().join("diff.json");

    snapdiff()
        .arg("diff")
        .arg(old.path())
        .arg(new.path())
        .arg("-o")
        .arg(&out)
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty());

    let written = fs::read_to_string(&out).expect("output written");
    assert_eq!(
        written,
        "[{\"path\":\"b\",\"operation\":\"added\",\"old_value\":null,\"new_value\":\"2\"}]\n"
    );
}

#[test]
fn invalid_document_exits_two() {
    let old = write_tempfile("{not json");
    let new = write_tempfile("{}");

    snapdiff()
        .arg("diff")
        .arg(old.path())
        .arg(new.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("failed to parse"));
}

#[test]
fn invalid_key_file_exits_two() {
    let old = write_tempfile("{}");
    let new = write_tempfile("{}");
    let keys = write_keys(r#"{"items":[]}"#, ".json");

    snapdiff()
        .arg("diff")
        .arg(old.path())
        .arg(new.path())
        .arg("--keys")
        .arg(keys.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("failed to load key configuration"));
}

#[test]
fn batch_writes_one_line_per_changed_product() {
    let rows = concat!(
        r#"{"product":"p1","publishTime":"2024-05-02T10:00:00","current_data":[{"items":[{"id":1,"v":"y"}]}],"old_data":[{"items":[{"id":1,"v":"x"}]}]}"#,
        "\n",
        r#"{"product":"p2","publishTime":"2024-05-02T10:00:00","current_data":[{"a":1}],"old_data":[{"a":1}]}"#,
        "\n",
        r#"{"product":"p3","publishTime":"2024-05-02T10:00:00","current_data":[{"a":1}],"old_data":null}"#,
        "\n",
    );
    let input = write_tempfile(rows);
    let keys = write_keys(r#"{"items":["id"]}"#, ".json");
    let dir = tempfile::tempdir().expect("create tempdir");
    let out = dir.path().join("updates.ndjson");

    snapdiff()
        .arg("batch")
        .arg("--input")
        .arg(input.path())
        .arg("--keys")
        .arg(keys.path())
        .arg("--output")
        .arg(&out)
        .assert()
        .success();

    let written = fs::read_to_string(&out).expect("updates written");
    let lines: Vec<serde_json::Value> = written
        .lines()
        .map(|line| serde_json::from_str(line).expect("valid NDJSON line"))
        .collect();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["product"], "p1");
    assert_eq!(lines[0]["publishTime"], "2024-05-02T10:00:00");
    assert_eq!(lines[0]["updates"][0]["path"], "items.1.v");
}

#[test]
fn batch_missing_input_fails_without_retrying_forever() {
    let dir = tempfile::tempdir().expect("create tempdir");

    snapdiff()
        .arg("batch")
        .arg("--input")
        .arg(dir.path().join("absent.ndjson"))
        .arg("--max-retries")
        .arg("1")
        .arg("--retry-delay-secs")
        .arg("0")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("batch over"));
}

#[test]
fn json_log_format_emits_structured_events() {
    let dir = tempfile::tempdir().expect("create tempdir");

    snapdiff()
        .env("SNAPDIFF_LOG", "warn")
        .arg("--log-format")
        .arg("json")
        .arg("batch")
        .arg("--input")
        .arg(dir.path().join("absent.ndjson"))
        .arg("--max-retries")
        .arg("1")
        .arg("--retry-delay-secs")
        .arg("0")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("\"level\":\"WARN\""));
}
