use super::*;
use serde_json::json;

use shared::protocol::StepCheck;

fn sample_check_json() -> serde_json::Value {
    json!({
        "completed": true,
        "state": { "completed": true, "explanation": "onions are translucent" },
        "action": { "completed": false, "explanation": "still stirring" }
    })
}

#[test]
fn decodes_structured_object_payload() {
    let check = decode_step_check(&sample_check_json()).expect("decode");
    assert!(check.completed);
    assert_eq!(check.state.explanation, "onions are translucent");
    assert!(!check.action.completed);
    assert!(check.hint.is_none());
}

#[test]
fn decodes_plain_json_string_payload() {
    let data = serde_json::Value::String(sample_check_json().to_string());
    let check = decode_step_check(&data).expect("decode");
    assert!(check.completed);
}

#[test]
fn decodes_fenced_string_with_language_tag() {
    let fenced = format!("```json\n{}\n```", sample_check_json());
    let data = serde_json::Value::String(fenced);
    let check = decode_step_check(&data).expect("decode");
    assert!(check.completed);
}

#[test]
fn decodes_fenced_string_without_language_tag() {
    let fenced = format!("```\n{}\n```", sample_check_json());
    let data = serde_json::Value::String(fenced);
    assert!(decode_step_check(&data).is_some());
}

#[test]
fn rejects_garbage_payloads() {
    assert!(decode_step_check(&json!("the pan is on fire")).is_none());
    assert!(decode_step_check(&json!(42)).is_none());
    assert!(decode_step_check(&json!(null)).is_none());
    assert!(decode_step_check(&json!({ "unexpected": "shape" })).is_none());
}

#[test]
fn strip_code_fences_passes_plain_text_through() {
    assert_eq!(strip_code_fences("  hello  "), "hello");
    assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
}

#[test]
fn strip_code_fences_handles_unterminated_fence() {
    // An opening fence with no closing fence is left alone.
    assert_eq!(strip_code_fences("```json\n{\"a\":1}"), "```json\n{\"a\":1}");
}

#[test]
fn speech_filter_drops_json_looking_prefixes() {
    let filter = SpeechFilter::default();
    assert!(filter.looks_like_step_check("{\"completed\": true}"));
    assert!(filter.looks_like_step_check("  [1, 2, 3]"));
    assert!(filter.looks_like_step_check("```json\n{}\n```"));
}

#[test]
fn speech_filter_drops_payloads_with_check_keys() {
    let filter = SpeechFilter {
        payload_prefixes: Vec::new(),
        payload_keys: vec!["completed".into()],
    };
    assert!(filter.looks_like_step_check("{\"completed\": false}"));
    assert!(!filter.looks_like_step_check("{\"greeting\": \"hi\"}"));
}

#[test]
fn speech_filter_passes_real_narration() {
    let filter = SpeechFilter::default();
    assert!(!filter.looks_like_step_check("Nice knife work, keep the pieces even."));
    assert!(!filter.looks_like_step_check("Careful, the pan looks very hot."));
}

#[test]
fn decoded_check_round_trips_equality() {
    let a: StepCheck = serde_json::from_value(sample_check_json()).expect("decode");
    let b = decode_step_check(&sample_check_json()).expect("decode");
    assert_eq!(a, b);
}
