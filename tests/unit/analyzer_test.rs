//! Unit tests for the analysis pipeline

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use fieldcat::analyzer::{
    encode_event, parse_field_metadata, AnalysisError, AnalysisOrchestrator, AnalyzeOptions,
    AnalyzerService, EventFormat, OrchestratorConfig, ProgressEvent, RetryPolicy,
};

use crate::helpers::{
    load_fixture, load_json_fixture, stages, BrokenBackend, ClosingSink, EchoBackend,
};

fn config(batch_size: usize, retries: usize) -> OrchestratorConfig {
    OrchestratorConfig {
        batch_size,
        retry: RetryPolicy::with_retries(retries, 0),
        timeout: Duration::from_secs(5),
        ..Default::default()
    }
}

fn complete(events: &[ProgressEvent]) -> &ProgressEvent {
    events.last().expect("no events emitted")
}

// ============================================
// Orchestrator
// ============================================

#[test]
fn catalogues_every_analyzable_field() {
    let doc = load_json_fixture("quote_response.json");
    let backend = EchoBackend::new();
    let orchestrator = AnalysisOrchestrator::new(&backend, config(40, 0));

    let mut events: Vec<ProgressEvent> = Vec::new();
    let usage = orchestrator.run(Some(&doc), &mut events).unwrap();

    // One batch per section with analyzable fields
    assert_eq!(backend.calls(), 6);
    assert_eq!(usage.batches_processed, 6);
    assert_eq!(usage.fallback_batches, 0);

    match complete(&events) {
        ProgressEvent::Complete { results, stats, .. } => {
            assert_eq!(results.len(), 15);
            assert_eq!(stats.flattened_count, 15);
            assert!(results.iter().all(|r| !r.path.ends_with("._length")));
            let price = results.iter().find(|r| r.path == "quote.price").unwrap();
            assert_eq!(price.data_name, "Described quote.price");
            assert_eq!(price.depth, 1);
            assert!(price.is_important);
        }
        other => panic!("expected complete, got {:?}", other),
    }
}

#[test]
fn event_sequence_is_ordered() {
    let doc = serde_json::json!({"a": {"x": 1, "y": 2}, "b": true});
    let backend = EchoBackend::new();
    let orchestrator = AnalysisOrchestrator::new(&backend, config(40, 0));

    let mut events: Vec<ProgressEvent> = Vec::new();
    orchestrator.run(Some(&doc), &mut events).unwrap();

    assert_eq!(
        stages(&events),
        [
            "flatten",
            "flatten_complete",
            "analyze_start",
            "analyzing",
            "section_complete",
            "analyzing",
            "section_complete",
            "complete",
        ]
    );
}

#[test]
fn large_sections_are_split_into_batches() {
    let doc = load_json_fixture("quote_response.json");
    let backend = EchoBackend::new();
    let orchestrator = AnalysisOrchestrator::new(&backend, config(4, 0));

    let mut events: Vec<ProgressEvent> = Vec::new();
    orchestrator.run(Some(&doc), &mut events).unwrap();

    // quote (6 fields) needs two batches of at most 4
    assert_eq!(backend.calls(), 7);
    let quote_batches: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            ProgressEvent::Analyzing {
                current_section,
                current_batch,
                ..
            } if current_section == "quote" => Some(*current_batch),
            _ => None,
        })
        .collect();
    assert_eq!(quote_batches, [3, 4]);
}

#[test]
fn transient_failures_are_retried() {
    let doc = serde_json::json!({"price": 10.5});
    let backend = EchoBackend::failing_first(2);
    let orchestrator = AnalysisOrchestrator::new(&backend, config(40, 2));

    let mut events: Vec<ProgressEvent> = Vec::new();
    let usage = orchestrator.run(Some(&doc), &mut events).unwrap();

    assert_eq!(backend.calls(), 3);
    assert_eq!(usage.total_attempts, 3);
    assert_eq!(usage.total_retries, 2);
    assert_eq!(usage.fallback_batches, 0);
}

#[test]
fn unusable_replies_fall_back_to_templates() {
    let doc = load_json_fixture("quote_response.json");
    let orchestrator = AnalysisOrchestrator::new(&BrokenBackend, config(40, 1));

    let mut events: Vec<ProgressEvent> = Vec::new();
    let usage = orchestrator.run(Some(&doc), &mut events).unwrap();

    assert_eq!(usage.fallback_batches, 6);
    assert_eq!(usage.fallback_fields, 15);
    match complete(&events) {
        ProgressEvent::Complete { results, .. } => {
            assert_eq!(results.len(), 15);
            let open = results
                .iter()
                .find(|r| r.path == "quote.marketOpen")
                .unwrap();
            assert_eq!(open.data_name, "marketOpen");
            assert_eq!(open.description, "boolean field");
            assert!(!open.is_important);
        }
        other => panic!("expected complete, got {:?}", other),
    }
}

#[test]
fn missing_document_is_an_error_event() {
    let backend = EchoBackend::new();
    let orchestrator = AnalysisOrchestrator::new(&backend, config(40, 0));

    let mut events: Vec<ProgressEvent> = Vec::new();
    let err = orchestrator.run(None, &mut events).unwrap_err();

    assert!(matches!(err, AnalysisError::NoDocument));
    assert_eq!(events, [ProgressEvent::error("No JSON data provided")]);
    assert_eq!(backend.calls(), 0);
}

#[test]
fn cancelled_run_stops_before_the_first_batch() {
    let doc = load_json_fixture("quote_response.json");
    let backend = EchoBackend::new();
    let flag = Arc::new(AtomicBool::new(false));
    flag.store(true, Ordering::SeqCst);
    let orchestrator =
        AnalysisOrchestrator::new(&backend, config(40, 0)).with_cancel_flag(Arc::clone(&flag));

    let mut events: Vec<ProgressEvent> = Vec::new();
    let err = orchestrator.run(Some(&doc), &mut events).unwrap_err();

    assert!(matches!(err, AnalysisError::Cancelled));
    assert_eq!(backend.calls(), 0);
    assert_eq!(
        events.last(),
        Some(&ProgressEvent::error("Analysis cancelled"))
    );
}

#[test]
fn results_follow_flattened_order_across_sections_and_batches() {
    let doc = serde_json::json!({
        "user": {
            "id": 1,
            "name": "Ada",
            "address": {"city": "London", "zip": "N1"}
        },
        "orders": [
            {"id": 7, "total": 9.5, "items": [{"sku": "a-1", "qty": 2}]},
            {"id": 8, "total": 1.0, "items": []}
        ],
        "tags": [],
        "ok": true
    });
    // First batch falls back, every later one is described
    let backend = EchoBackend::failing_first(1);
    let orchestrator = AnalysisOrchestrator::new(&backend, config(2, 0));

    let mut events: Vec<ProgressEvent> = Vec::new();
    let usage = orchestrator.run(Some(&doc), &mut events).unwrap();

    let expected: Vec<String> = fieldcat::flatten(&doc)
        .into_iter()
        .filter(|f| !f.is_length_meta())
        .map(|f| f.path)
        .collect();
    assert!(usage.batches_processed > 4);
    assert_eq!(usage.fallback_batches, 1);

    match complete(&events) {
        ProgressEvent::Complete { results, .. } => {
            let paths: Vec<&str> = results.iter().map(|r| r.path.as_str()).collect();
            assert_eq!(paths, expected);

            assert_eq!(results[0].description, "number field");
            assert_eq!(results[1].description, "string field");
            assert!(results[..2].iter().all(|r| !r.is_important));
            assert!(results[2..]
                .iter()
                .all(|r| r.description == "Generated description"));
        }
        other => panic!("expected complete, got {:?}", other),
    }
}

#[test]
fn observer_disconnect_stops_the_run() {
    let doc = serde_json::json!({"a": {"x": 1}, "b": {"y": 2}, "c": {"z": 3}});
    let backend = EchoBackend::new();
    let orchestrator = AnalysisOrchestrator::new(&backend, config(40, 0));

    // flatten, flatten_complete, analyze_start, analyzing for the first batch
    let mut sink = ClosingSink::after(4);
    let err = orchestrator.run(Some(&doc), &mut sink).unwrap_err();

    assert!(matches!(err, AnalysisError::ChannelClosed));
    assert_eq!(backend.calls(), 1);
    assert_eq!(
        stages(&sink.events),
        ["flatten", "flatten_complete", "analyze_start", "analyzing"]
    );
    assert!(sink.events.iter().all(|e| !e.is_terminal()));
}

#[test]
fn observer_gone_before_analysis_makes_no_calls() {
    let doc = serde_json::json!({"a": 1, "b": 2});
    let backend = EchoBackend::new();
    let orchestrator = AnalysisOrchestrator::new(&backend, config(40, 0));

    let mut sink = ClosingSink::after(3);
    let err = orchestrator.run(Some(&doc), &mut sink).unwrap_err();

    assert!(matches!(err, AnalysisError::ChannelClosed));
    assert_eq!(backend.calls(), 0);
    assert_eq!(sink.events.len(), 3);
}

// ============================================
// Service
// ============================================

#[test]
fn service_writes_ndjson_records() {
    let backend = Box::new(EchoBackend::new());
    let options = AnalyzeOptions::default().retry_delay(0).quiet();
    let service = AnalyzerService::with_backend(options, backend);

    let mut out = Vec::new();
    service
        .analyze_input(r#"{"user": {"id": 7, "name": "Ada"}}"#, &mut out)
        .unwrap();

    let text = String::from_utf8(out).unwrap();
    let records: Vec<serde_json::Value> = text
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(records.first().unwrap()["event"], "progress");
    let last = records.last().unwrap();
    assert_eq!(last["event"], "complete");
    assert_eq!(last["data"]["results"].as_array().unwrap().len(), 2);
    assert_eq!(last["data"]["results"][1]["path"], "user.name");
}

#[test]
fn service_reports_invalid_json() {
    let service = AnalyzerService::with_backend(
        AnalyzeOptions::default().quiet(),
        Box::new(EchoBackend::new()),
    );

    let mut out = Vec::new();
    let err = service.analyze_input("{oops", &mut out).unwrap_err();

    assert!(matches!(err, AnalysisError::InvalidJson { .. }));
    let text = String::from_utf8(out).unwrap();
    let record: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
    assert_eq!(record["event"], "error");
    assert!(record["data"]["message"]
        .as_str()
        .unwrap()
        .starts_with("Invalid JSON input"));
}

#[test]
fn service_writes_sse_frames() {
    let options = AnalyzeOptions::default()
        .format(EventFormat::Sse)
        .retry_delay(0)
        .quiet();
    let service = AnalyzerService::with_backend(options, Box::new(EchoBackend::new()));

    let mut out = Vec::new();
    service.analyze_input(r#"{"ok": true}"#, &mut out).unwrap();

    let text = String::from_utf8(out).unwrap();
    let frames: Vec<&str> = text.split("\n\n").filter(|f| !f.is_empty()).collect();
    assert!(frames.iter().all(|f| f.starts_with("data: ")));
    assert!(frames.last().unwrap().contains("\"event\":\"complete\""));
}

// ============================================
// Wire format and reply parsing
// ============================================

#[test]
fn error_event_wire_shape() {
    let line = encode_event(&ProgressEvent::error("boom"), EventFormat::Ndjson).unwrap();
    assert_eq!(
        line,
        "{\"event\":\"error\",\"data\":{\"stage\":\"error\",\"message\":\"boom\"}}\n"
    );
}

#[test]
fn messy_agent_reply_is_repaired() {
    let fields = parse_field_metadata(&load_fixture("agent_reply.txt")).unwrap();

    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].data_name.as_deref(), Some("Last Price"));
    assert_eq!(fields[0].sample_value.as_deref(), Some("182.35"));
    assert_eq!(fields[0].is_important, Some(true));
}
