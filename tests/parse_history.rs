//! End-to-end parses of history files written to a temp dir.

use dag_history::log::RECORD_SEPARATOR;
use dag_history::{HistoryError, HistoryParser, ParseOptions, parse};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::path::PathBuf;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn write_log(dir: &TempDir, records: &[Value]) -> PathBuf {
    let path = dir.path().join("history.txt");
    let mut text = String::new();
    for r in records {
        text.push_str(&r.to_string());
        text.push_str(RECORD_SEPARATOR);
    }
    std::fs::write(&path, text).unwrap();
    path
}

fn record(entity: &str, kind: &str, other_info: Value) -> Value {
    json!({"entity": entity, "entitytype": kind, "otherinfo": other_info})
}

fn small_run() -> Vec<Value> {
    vec![
        record("dag_1", "DAG_ID", json!({"dagName": "wordcount", "status": "RUNNING"})),
        record("dag_1_vertex_1", "VERTEX_ID", json!({"vertexName": "Tokenizer"})),
        record("dag_1_vertex_1_task_1", "TASK_ID", json!({"status": "RUNNING"})),
        json!({
            "entity": "dag_1_vertex_1_task_1_attempt_1",
            "entitytype": "TASK_ATTEMPT_ID",
            "otherinfo": {"status": "RUNNING"},
            "relatedEntities": [
                {"entity": "host1", "entitytype": "nodeId"},
                {"entity": "c1", "entitytype": "containerId"}
            ]
        }),
        record("dag_1", "DAG_ID", json!({"status": "SUCCEEDED", "endTime": 99})),
    ]
}

// ---------------------------------------------------------------------------
// Happy paths
// ---------------------------------------------------------------------------

#[test]
fn builds_linked_tree() {
    let dir = TempDir::new().unwrap();
    let path = write_log(&dir, &small_run());

    let dag = parse(&path, "dag_1").unwrap();

    assert_eq!(dag.common().entity(), "dag_1");
    assert_eq!(dag.name(), Some("wordcount"));
    assert_eq!(dag.common().status(), Some("SUCCEEDED"));
    assert_eq!(dag.common().end_time(), Some(99));

    assert_eq!(dag.vertices().len(), 1);
    let vertex = dag.vertex_by_name("Tokenizer").unwrap();
    assert_eq!(vertex.tasks().len(), 1);
    let task = &vertex.tasks()[0];
    assert_eq!(task.common().entity(), "dag_1_vertex_1_task_1");
    assert_eq!(task.attempts().len(), 1);

    let attempt = &task.attempts()[0];
    assert_eq!(attempt.node_id(), Some("host1"));
    assert_eq!(attempt.container_id(), Some("c1"));
}

#[test]
fn dag_without_children_is_enough() {
    let dir = TempDir::new().unwrap();
    let path = write_log(&dir, &[record("dag_1", "TEZ_DAG_ID", json!({}))]);

    let dag = parse(&path, "dag_1").unwrap();
    assert!(dag.vertices().is_empty());
    assert_eq!(dag.tasks().count(), 0);
}

#[test]
fn run_id_is_trimmed() {
    let dir = TempDir::new().unwrap();
    let path = write_log(&dir, &small_run());
    assert!(parse(&path, "  dag_1\n").is_ok());
}

#[test]
fn foreign_records_never_reach_the_model() {
    let dir = TempDir::new().unwrap();
    let mut records = small_run();
    for n in 2..6 {
        records.push(record(&format!("dag_{n}"), "DAG_ID", json!({})));
        records.push(record(&format!("dag_{n}_vertex_1"), "VERTEX_ID", json!({})));
        records.push(record(&format!("dag_{n}_vertex_1_task_1"), "TASK_ID", json!({})));
        records.push(record(
            &format!("dag_{n}_vertex_1_task_1_attempt_1"),
            "TASK_ATTEMPT_ID",
            json!({}),
        ));
    }
    let path = write_log(&dir, &records);

    let dag = parse(&path, "dag_1").unwrap();
    assert_eq!(dag.vertices().len(), 1);
    assert_eq!(dag.tasks().count(), 1);
    assert_eq!(dag.attempts().count(), 1);
    assert!(
        dag.attempts()
            .all(|a| a.common().entity().starts_with("dag_1_"))
    );
}

#[test]
fn unknown_record_kinds_are_ignored() {
    let dir = TempDir::new().unwrap();
    let mut records = small_run();
    records.insert(
        0,
        record("application_1438652049951_0008", "TEZ_APPLICATION", json!({})),
    );
    let path = write_log(&dir, &records);
    assert!(parse(&path, "dag_1").is_ok());
}

#[test]
fn later_records_override_earlier_ones() {
    let dir = TempDir::new().unwrap();
    let path = write_log(
        &dir,
        &[
            record("dag_1", "DAG_ID", json!({})),
            record("dag_1_vertex_1", "VERTEX_ID", json!({"status": "RUNNING", "numTasks": 2})),
            record("dag_1_vertex_1", "VERTEX_ID", json!({"status": "FAILED"})),
        ],
    );

    let dag = parse(&path, "dag_1").unwrap();
    let vertex = &dag.vertices()[0];
    assert_eq!(vertex.common().status(), Some("FAILED"));
    assert_eq!(vertex.common().attributes()["numTasks"], json!(2));
}

#[test]
fn sink_notation_ids_link_up() {
    let dir = TempDir::new().unwrap();
    let path = write_log(
        &dir,
        &[
            record("dag_1438652049951_0008_1", "TEZ_DAG_ID", json!({})),
            record("vertex_1438652049951_0008_1_00", "TEZ_VERTEX_ID", json!({})),
            record(
                "task_1438652049951_0008_1_00_000000",
                "TEZ_TASK_ID",
                json!({"successfulAttemptId": "attempt_1438652049951_0008_1_00_000000_1"}),
            ),
            record("attempt_1438652049951_0008_1_00_000000_0", "TEZ_TASK_ATTEMPT_ID", json!({})),
            record("attempt_1438652049951_0008_1_00_000000_1", "TEZ_TASK_ATTEMPT_ID", json!({})),
            record("vertex_1438652049951_0009_1_00", "TEZ_VERTEX_ID", json!({})),
        ],
    );

    let dag = parse(&path, "dag_1438652049951_0008_1").unwrap();
    assert_eq!(dag.vertices().len(), 1);
    let task = dag.tasks().next().unwrap();
    assert_eq!(task.attempts().len(), 2);
    assert_eq!(
        task.successful_attempt().map(|a| a.common().entity()),
        Some("attempt_1438652049951_0008_1_00_000000_1")
    );
}

#[test]
fn json_lines_with_custom_separator() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("history.jsonl");
    let text: Vec<String> = small_run().iter().map(Value::to_string).collect();
    std::fs::write(&path, text.join("\n")).unwrap();

    let parser = HistoryParser::new(
        &path,
        ParseOptions {
            separator: "\n".to_string(),
        },
    );
    let dag = parser.dag_data("dag_1").unwrap();
    assert_eq!(dag.attempts().count(), 1);
}

#[test]
fn model_serializes_for_reports() {
    let dir = TempDir::new().unwrap();
    let path = write_log(&dir, &small_run());
    let dag = parse(&path, "dag_1").unwrap();

    let value = serde_json::to_value(&dag).unwrap();
    assert_eq!(value["entity"], json!("dag_1"));
    assert_eq!(value["vertices"][0]["name"], json!("Tokenizer"));
    assert_eq!(
        value["vertices"][0]["tasks"][0]["attempts"][0]["node_id"],
        json!("host1")
    );
}

#[test]
fn both_spellings_on_one_record_prefer_lowercase() {
    let dir = TempDir::new().unwrap();
    let path = write_log(
        &dir,
        &[
            json!({
                "entity": "dag_1",
                "entitytype": "TEZ_DAG_ID",
                "entityType": "TEZ_VERTEX_ID",
                "otherinfo": {"dagName": "wordcount"},
                "otherInfo": {"dagName": "ignored", "status": "KILLED"}
            }),
            json!({
                "entity": "dag_1_vertex_1",
                "entityType": "TEZ_VERTEX_ID",
                "otherInfo": {"vertexName": "Tokenizer"}
            }),
        ],
    );

    let dag = parse(&path, "dag_1").unwrap();
    assert_eq!(dag.name(), Some("wordcount"));
    assert_eq!(dag.common().status(), None);
    assert_eq!(dag.vertices()[0].name(), Some("Tokenizer"));
}

#[test]
fn top_level_fields_survive_into_the_model() {
    let dir = TempDir::new().unwrap();
    let path = write_log(
        &dir,
        &[
            json!({
                "entity": "dag_1",
                "entitytype": "TEZ_DAG_ID",
                "otherinfo": {"status": "RUNNING"},
                "events": [{"eventtype": "DAG_SUBMITTED", "timestamp": 10}],
                "primaryfilters": {"user": ["alice"]},
                "relatedEntities": [{"entity": "application_1", "entitytype": "applicationId"}]
            }),
            json!({
                "entity": "dag_1",
                "entitytype": "TEZ_DAG_ID",
                "otherinfo": {"status": "SUCCEEDED"},
                "events": [{"eventtype": "DAG_FINISHED", "timestamp": 20}]
            }),
        ],
    );

    let dag = parse(&path, "dag_1").unwrap();
    let common = dag.common();
    assert_eq!(common.status(), Some("SUCCEEDED"));
    assert_eq!(
        common.events(),
        &[json!({"eventtype": "DAG_SUBMITTED", "timestamp": 10})]
    );
    assert_eq!(common.fields()["primaryfilters"], json!({"user": ["alice"]}));
    assert_eq!(common.related_entities().len(), 1);

    let value = serde_json::to_value(&dag).unwrap();
    assert_eq!(value["events"][0]["eventtype"], json!("DAG_SUBMITTED"));
    assert_eq!(value["fields"]["primaryfilters"]["user"][0], json!("alice"));
    assert_eq!(value["related_entities"][0]["entity"], json!("application_1"));
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn other_run_id_is_incomplete() {
    let dir = TempDir::new().unwrap();
    let path = write_log(&dir, &small_run());

    let err = parse(&path, "dag_2").unwrap_err();
    assert!(matches!(err, HistoryError::IncompleteLog(_)));
}

#[test]
fn empty_run_id_is_rejected_before_io() {
    // The file does not exist; the run id check must fire first.
    let err = parse("/definitely/not/here.txt", "   ").unwrap_err();
    assert!(matches!(err, HistoryError::InvalidArgument(ref m) if m.contains("dag id")));
}

#[test]
fn missing_file_is_invalid_argument() {
    let dir = TempDir::new().unwrap();
    let err = parse(dir.path().join("nope.txt"), "dag_1").unwrap_err();
    assert!(matches!(err, HistoryError::InvalidArgument(ref m) if m.contains("does not exist")));
}

#[test]
fn directory_is_io_failure() {
    let dir = TempDir::new().unwrap();
    let err = parse(dir.path(), "dag_1").unwrap_err();
    assert!(matches!(err, HistoryError::IoFailure { .. }));
}

#[test]
fn undecodable_record_aborts_the_parse() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("history.txt");
    let good = record("dag_1", "DAG_ID", json!({})).to_string();
    std::fs::write(&path, format!("{good}{RECORD_SEPARATOR}{{\"entity\": {RECORD_SEPARATOR}")).unwrap();

    let err = parse(&path, "dag_1").unwrap_err();
    assert!(matches!(err, HistoryError::MalformedInput(ref m) if m.contains("record #2")));
}

#[test]
fn unparsable_identifier_aborts_the_parse() {
    let dir = TempDir::new().unwrap();
    let path = write_log(
        &dir,
        &[
            record("dag_1", "DAG_ID", json!({})),
            record("vertex-one", "VERTEX_ID", json!({})),
        ],
    );

    let err = parse(&path, "dag_1").unwrap_err();
    assert!(matches!(err, HistoryError::MalformedInput(ref m) if m.contains("vertex-one")));
}

#[test]
fn orphan_attempt_is_incomplete() {
    let dir = TempDir::new().unwrap();
    let path = write_log(
        &dir,
        &[
            record("dag_1", "DAG_ID", json!({})),
            record("dag_1_vertex_1_task_1_attempt_1", "TASK_ATTEMPT_ID", json!({})),
        ],
    );

    let err = parse(&path, "dag_1").unwrap_err();
    assert!(matches!(err, HistoryError::IncompleteLog(_)));
}
