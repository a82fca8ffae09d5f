use serde_json::json;

use reflexwork::pipeline::{ExecutionIntent, PipelineErrorKind};

use crate::support::sample_payload;

fn payload_with(key: &str, value: serde_json::Value) -> serde_json::Value {
    let mut payload = sample_payload();
    payload[key] = value;
    payload
}

#[test]
fn valid_payload_constructs_intent() {
    let intent = ExecutionIntent::from_payload(&sample_payload()).expect("payload is valid");

    assert_eq!(intent.client_id(), "wilson_case");
    assert_eq!(intent.reflex(), "competitor_reflex");
    assert_eq!(intent.urgency(), 4);
    assert_eq!(intent.actions().len(), 3);
    assert_eq!(intent.due_date(), Some("2025-11-02"));
    assert!(intent.metadata().is_empty());
}

#[test]
fn missing_fields_are_all_named() {
    let mut payload = sample_payload();
    let object = payload.as_object_mut().expect("payload is an object");
    object.remove("client_id");
    object.remove("confidence");

    let err = ExecutionIntent::from_payload(&payload).expect_err("missing keys must fail");
    assert_eq!(err.kind, PipelineErrorKind::InvalidIntent);
    assert!(err.message.contains("client_id"), "message: {}", err.message);
    assert!(err.message.contains("confidence"), "message: {}", err.message);
}

#[test]
fn non_object_payload_is_rejected() {
    let err = ExecutionIntent::from_payload(&json!("not an object"))
        .expect_err("scalar payload must fail");
    assert_eq!(err.kind, PipelineErrorKind::InvalidIntent);
}

#[test]
fn urgency_boundaries() {
    assert!(ExecutionIntent::from_payload(&payload_with("urgency", json!(-1))).is_err());
    assert!(ExecutionIntent::from_payload(&payload_with("urgency", json!(0))).is_ok());
    assert!(ExecutionIntent::from_payload(&payload_with("urgency", json!(5))).is_ok());
    assert!(ExecutionIntent::from_payload(&payload_with("urgency", json!(6))).is_err());
    assert!(ExecutionIntent::from_payload(&payload_with("urgency", json!("3"))).is_ok());
    assert!(ExecutionIntent::from_payload(&payload_with("urgency", json!([]))).is_err());
}

#[test]
fn confidence_boundaries() {
    assert!(ExecutionIntent::from_payload(&payload_with("confidence", json!(0.0))).is_ok());
    assert!(ExecutionIntent::from_payload(&payload_with("confidence", json!(1.0))).is_ok());
    assert!(ExecutionIntent::from_payload(&payload_with("confidence", json!(1.01))).is_err());
    assert!(ExecutionIntent::from_payload(&payload_with("confidence", json!(-0.01))).is_err());
}

#[test]
fn actions_must_normalize_to_nonempty() {
    let err = ExecutionIntent::from_payload(&payload_with("actions", json!([])))
        .expect_err("empty actions must fail");
    assert!(err.message.contains("actions"));

    let err = ExecutionIntent::from_payload(&payload_with("actions", json!(["  ", ""])))
        .expect_err("blank-only actions must fail");
    assert!(err.message.contains("actions"));

    let intent = ExecutionIntent::from_payload(&payload_with("actions", json!([" a "])))
        .expect("one non-blank action suffices");
    assert_eq!(intent.actions(), ["a".to_string()]);
}

#[test]
fn actions_must_be_a_list_of_scalars() {
    let err = ExecutionIntent::from_payload(&payload_with("actions", json!("run")))
        .expect_err("bare string is not a list");
    assert!(err.message.contains("actions"));

    let err = ExecutionIntent::from_payload(&payload_with("actions", json!([{"op": "run"}])))
        .expect_err("object entries are rejected");
    assert!(err.message.contains("actions"));
}

#[test]
fn due_date_must_be_iso_when_present() {
    assert!(ExecutionIntent::from_payload(&payload_with("due_date", json!("2025-13-40"))).is_err());
    assert!(ExecutionIntent::from_payload(&payload_with("due_date", json!("next week"))).is_err());

    let intent = ExecutionIntent::from_payload(&payload_with("due_date", json!(null)))
        .expect("null due_date is allowed");
    assert_eq!(intent.due_date(), None);

    let intent = ExecutionIntent::from_payload(&payload_with("due_date", json!("")))
        .expect("blank due_date is treated as unset");
    assert_eq!(intent.due_date(), None);
}

#[test]
fn metadata_must_be_a_mapping() {
    let err = ExecutionIntent::from_payload(&payload_with("metadata", json!([1, 2])))
        .expect_err("array metadata must fail");
    assert!(err.message.contains("metadata"));

    let intent = ExecutionIntent::from_payload(&payload_with("metadata", json!({"k": "v"})))
        .expect("object metadata is accepted");
    assert_eq!(intent.metadata()["k"], json!("v"));
}

#[test]
fn merged_tags_contain_reflex_markers_sorted_and_deduped() {
    let payload = payload_with("tags", json!(["pricing", "auto", "pricing"]));
    let intent = ExecutionIntent::from_payload(&payload).expect("payload is valid");

    let merged = intent.merged_tags();
    assert!(merged.contains(&"reflex".to_string()));
    assert!(merged.contains(&"auto".to_string()));
    assert!(merged.contains(&"competitor_reflex".to_string()));

    let mut sorted = merged.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(merged, sorted, "merged tags must be sorted and deduplicated");
}

#[test]
fn fingerprint_is_stable_under_key_reorder() {
    let first = ExecutionIntent::from_payload(&sample_payload()).expect("payload is valid");

    // Same fields, keys declared in a different order.
    let reordered = json!({
        "confidence": 0.91,
        "source_event": "event_id:maos.competitor.signal:abc123",
        "evidence_urls": ["https://example.com/source"],
        "tags": ["pricing"],
        "due_date": "2025-11-02",
        "actions": [
            "Run Pricing Impact Model",
            "Update Competitor Watch",
            "Generate Positioning Brief",
        ],
        "description": "Competitor X adjusted pricing by 7%.",
        "title": "Competitor Price Change Detected",
        "urgency": 4,
        "reflex": "competitor_reflex",
        "client_id": "wilson_case",
    });
    let second = ExecutionIntent::from_payload(&reordered).expect("payload is valid");

    assert_eq!(first.content_fingerprint(), second.content_fingerprint());
    assert_eq!(first.content_fingerprint().len(), 64);
}

#[test]
fn fingerprint_tracks_content_changes() {
    let first = ExecutionIntent::from_payload(&sample_payload()).expect("payload is valid");
    let second = ExecutionIntent::from_payload(&payload_with("title", json!("Something Else")))
        .expect("payload is valid");

    assert_ne!(first.content_fingerprint(), second.content_fingerprint());
}
