use crate::api::error::{respond, ServiceError};
use crate::api::helpers::get_required_str;
use crate::api::types::{AppState, Request};
use crate::db::{self, Student};
use crate::qr;
use serde_json::json;
use tracing::{error, info};

const DUPLICATE_ROLL_NO: &str = "Roll number already exists";

/// Roll numbers double as QR file names, so anything that could escape the
/// QR directory is refused.
fn validate_roll_no(roll_no: &str) -> Result<(), ServiceError> {
    if roll_no == "." || roll_no == ".." {
        return Err(ServiceError::BadParams(
            "roll_no must not be a relative path component".to_string(),
        ));
    }
    if roll_no
        .chars()
        .any(|c| c == '/' || c == '\\' || c.is_control())
    {
        return Err(ServiceError::BadParams(
            "roll_no must not contain path separators or control characters".to_string(),
        ));
    }
    Ok(())
}

fn handle_register(
    state: &AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, ServiceError> {
    let roll_no = get_required_str(params, "roll_no")?;
    let name = get_required_str(params, "name")?;
    validate_roll_no(&roll_no)?;

    let conn = state.directory()?;
    let student = Student {
        roll_no: roll_no.clone(),
        name,
    };
    if let Err(e) = db::student_insert(&conn, &student) {
        if db::is_unique_violation(&e) {
            return Err(ServiceError::DuplicateKey(DUPLICATE_ROLL_NO.to_string()));
        }
        return Err(e.into());
    }

    let rendered = match qr::generate_for_student(&state.config.qr_dir, &roll_no) {
        Ok(r) => r,
        Err(e) => {
            // Undo the insert so the student can register again.
            if let Err(undo) = db::student_delete(&conn, &roll_no) {
                error!(roll_no = %roll_no, error = %undo, "failed to roll back student insert");
            }
            return Err(e.into());
        }
    };

    info!(
        roll_no = %roll_no,
        qr_path = %rendered.path.display(),
        "student registered"
    );
    Ok(json!({ "qr_code": rendered.to_base64() }))
}

pub fn try_handle(state: &AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "register" => handle_register(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.method, result))
}
