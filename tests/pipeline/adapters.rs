use std::fs;

use serde_json::{Value, json};
use uuid::Uuid;

use reflexwork::pipeline::{
    ExecutionIntent, PipelineErrorKind,
    adapters::{CharterBriefWriter, InMemoryTracker, JsonlAuditLog},
    ports::{AuditPort, BriefWriterPort, SubtaskSpec, TrackerPort},
};

use crate::support::sample_payload;

#[tokio::test]
async fn jsonl_audit_log_appends_parseable_lines() {
    let dir = std::env::temp_dir().join(format!("reflexwork-audit-test-{}", Uuid::now_v7()));
    let path = dir.join("custodian_hub.log");
    let log = JsonlAuditLog::new(&path).expect("audit log should initialize");

    let first = json!({"event": "teamwork_pipeline_dispatch", "task_id": "task-1"});
    let second = json!({"event": "teamwork_pipeline_dispatch", "task_id": "task-2"});
    log.record(first.as_object().cloned().expect("object"))
        .await
        .expect("first record should append");
    log.record(second.as_object().cloned().expect("object"))
        .await
        .expect("second record should append");

    let contents = fs::read_to_string(&path).expect("log file should exist");
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 2);
    let parsed: Value = serde_json::from_str(lines[1]).expect("line should be JSON");
    assert_eq!(parsed["task_id"], json!("task-2"));

    let _ = fs::remove_file(&path);
    let _ = fs::remove_dir(&dir);
}

#[tokio::test]
async fn in_memory_tracker_rejects_subtasks_for_unknown_parent() {
    let tracker = InMemoryTracker::new();

    let err = tracker
        .create_subtask(SubtaskSpec {
            parent_id: "task:missing".to_string(),
            name: "orphan".to_string(),
            project_id: "proj-1".to_string(),
        })
        .await
        .expect_err("unknown parent must fail");

    assert_eq!(err.kind, PipelineErrorKind::Collaborator);
    assert!(err.message.contains("task:missing"));
}

#[tokio::test]
async fn charter_brief_carries_reflex_context_and_payload() {
    let intent = ExecutionIntent::from_payload(&sample_payload()).expect("payload is valid");

    let brief = CharterBriefWriter
        .render(&intent)
        .await
        .expect("brief should render");

    assert!(brief.starts_with("## Charter Brief"));
    assert!(brief.contains("**Reflex:** competitor_reflex"));
    assert!(brief.contains("**Urgency:** 4"));
    assert!(brief.contains("**Source Event:** event_id:maos.competitor.signal:abc123"));
    assert!(brief.contains("Competitor X adjusted pricing by 7%."));
    assert!(brief.contains("### Operational Payload"));
    assert!(brief.contains("Run Pricing Impact Model"));
}
