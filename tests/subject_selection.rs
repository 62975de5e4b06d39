use qrattend::api::{handle_request, AppState, Request};
use qrattend::config::Config;
use serde_json::json;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn request(state: &AppState, method: &str, params: serde_json::Value) -> serde_json::Value {
    handle_request(state, Request::new(method, params))
}

fn request_ok(state: &AppState, method: &str, params: serde_json::Value) -> serde_json::Value {
    let value = request(state, method, params);
    assert_eq!(
        value.get("success").and_then(|v| v.as_bool()),
        Some(true),
        "{} failed: {}",
        method,
        value
            .get("error")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown error")
    );
    value
}

#[test]
fn subjects_are_listed_by_name_with_default_current() {
    let root = temp_dir("qrattend-subjects-list");
    let state = AppState::initialize(Config::rooted_at(&root)).expect("init state");

    let resp = request_ok(&state, "get-subjects", json!({}));
    let names: Vec<&str> = resp["subjects"]
        .as_array()
        .expect("subjects array")
        .iter()
        .filter_map(|s| s["subject_name"].as_str())
        .collect();
    assert_eq!(names, vec!["CN", "DBMS", "DBMS-LAB", "JAVA", "JAVA-LAB"]);
    assert_eq!(
        resp["current"],
        json!({ "subject_id": "BCA-501", "subject_name": "DBMS" })
    );

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn set_subject_replaces_current() {
    let root = temp_dir("qrattend-subjects-set");
    let state = AppState::initialize(Config::rooted_at(&root)).expect("init state");

    let resp = request_ok(&state, "set-subject", json!({ "subject_id": "BCA-504" }));
    assert_eq!(
        resp["current"],
        json!({ "subject_id": "BCA-504", "subject_name": "DBMS-LAB" })
    );
    let listed = request_ok(&state, "get-subjects", json!({}));
    assert_eq!(listed["current"]["subject_id"], json!("BCA-504"));

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn unknown_subject_leaves_current_unchanged() {
    let root = temp_dir("qrattend-subjects-unknown");
    let state = AppState::initialize(Config::rooted_at(&root)).expect("init state");
    request_ok(&state, "set-subject", json!({ "subject_id": "BCA-505" }));

    let resp = request(&state, "set-subject", json!({ "subject_id": "MTH-101" }));
    assert_eq!(resp["success"], json!(false));
    assert_eq!(resp["code"], json!("not_found"));
    assert_eq!(resp["error"], json!("Subject not found"));

    let listed = request_ok(&state, "get-subjects", json!({}));
    assert_eq!(
        listed["current"],
        json!({ "subject_id": "BCA-505", "subject_name": "JAVA-LAB" })
    );

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn configured_default_subject_must_exist() {
    let root = temp_dir("qrattend-subjects-default");
    let mut config = Config::rooted_at(&root);
    config.default_subject = "BCA-503".to_string();
    let state = AppState::initialize(config).expect("init state");
    let listed = request_ok(&state, "get-subjects", json!({}));
    assert_eq!(listed["current"]["subject_name"], json!("CN"));

    let mut bad = Config::rooted_at(&root);
    bad.default_subject = "XYZ".to_string();
    assert!(AppState::initialize(bad).is_err());

    let _ = std::fs::remove_dir_all(root);
}
