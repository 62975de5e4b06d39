use base64::Engine;
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

fn student_rows(state: &AppState) -> Vec<serde_json::Value> {
    request_ok(state, "data", json!({}))
        .get("database1_student_data")
        .and_then(|v| v.get("students"))
        .and_then(|v| v.as_array())
        .cloned()
        .expect("students array")
}

#[test]
fn register_returns_decodable_png_and_writes_qr_file() {
    let root = temp_dir("qrattend-register");
    let state = AppState::initialize(Config::rooted_at(&root)).expect("init state");

    let resp = request_ok(
        &state,
        "register",
        json!({ "roll_no": "BCA001", "name": "Asha" }),
    );
    let encoded = resp
        .get("qr_code")
        .and_then(|v| v.as_str())
        .expect("qr_code");
    assert!(!encoded.is_empty());

    let png = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .expect("qr_code is base64");
    let img = image::load_from_memory(&png).expect("qr_code decodes as an image");
    assert!(img.width() > 0 && img.width() == img.height());

    let on_disk = std::fs::read(root.join("qr_codes").join("BCA001.png")).expect("qr file");
    assert_eq!(on_disk, png);

    let students = student_rows(&state);
    assert_eq!(
        students,
        vec![json!({ "roll_no": "BCA001", "name": "Asha" })]
    );

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn duplicate_roll_no_is_rejected_and_keeps_one_row() {
    let root = temp_dir("qrattend-register-dup");
    let state = AppState::initialize(Config::rooted_at(&root)).expect("init state");

    request_ok(
        &state,
        "register",
        json!({ "roll_no": "BCA002", "name": "Ravi" }),
    );
    let second = request(
        &state,
        "register",
        json!({ "roll_no": "BCA002", "name": "Someone Else" }),
    );
    assert_eq!(second["success"], json!(false));
    assert_eq!(second["code"], json!("duplicate_key"));
    assert_eq!(second["error"], json!("Roll number already exists"));

    let students = student_rows(&state);
    assert_eq!(students.len(), 1);
    assert_eq!(students[0]["name"], json!("Ravi"));

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn invalid_registration_params_are_bad_params() {
    let root = temp_dir("qrattend-register-invalid");
    let state = AppState::initialize(Config::rooted_at(&root)).expect("init state");

    for params in [
        json!({ "roll_no": "BCA003" }),
        json!({ "roll_no": "  ", "name": "Asha" }),
        json!({ "roll_no": "../escape", "name": "Asha" }),
        json!(null),
    ] {
        let resp = request(&state, "register", params.clone());
        assert_eq!(resp["success"], json!(false), "{params} should fail");
        assert_eq!(resp["code"], json!("bad_params"), "{params} should be bad_params");
    }
    assert!(student_rows(&state).is_empty());
    assert!(!root.join("escape.png").exists());

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn failed_qr_write_rolls_back_the_student_row() {
    let root = temp_dir("qrattend-register-rollback");
    let mut state = AppState::initialize(Config::rooted_at(&root)).expect("init state");

    // A regular file where the QR directory should be makes every write fail.
    let blocker = root.join("not-a-dir");
    std::fs::write(&blocker, b"x").expect("write blocker");
    state.config.qr_dir = blocker;

    let resp = request(
        &state,
        "register",
        json!({ "roll_no": "BCA004", "name": "Meera" }),
    );
    assert_eq!(resp["success"], json!(false));
    assert_eq!(resp["code"], json!("internal"));
    assert!(student_rows(&state).is_empty());

    let _ = std::fs::remove_dir_all(root);
}
