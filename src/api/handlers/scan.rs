use crate::api::error::{respond, ServiceError};
use crate::api::handlers::subjects::SUBJECT_NOT_FOUND;
use crate::api::helpers::{get_optional_str, get_required_str, now_timestamp};
use crate::api::types::{AppState, Request};
use crate::db::{self, AttendanceStatus};
use serde_json::json;
use tracing::info;

const STUDENT_NOT_FOUND: &str = "Student not found";

/// Marks the scanned student present. The optional `subject_id` param
/// applies to this scan only; without it the active subject is used.
fn handle_scan(
    state: &AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, ServiceError> {
    let roll_no = get_required_str(params, "roll_no")?;
    let requested_subject = get_optional_str(params, "subject_id")?;

    let directory = state.directory()?;
    let Some(student) = db::student_get(&directory, &roll_no)? else {
        return Err(ServiceError::NotFound(STUDENT_NOT_FOUND.to_string()));
    };

    let subject_id = match requested_subject {
        Some(id) => id,
        None => state.active_subject()?.subject_id,
    };
    let Some(subject) = db::subject_get(&directory, &subject_id)? else {
        return Err(ServiceError::NotFound(SUBJECT_NOT_FOUND.to_string()));
    };
    drop(directory);

    let status = AttendanceStatus::Present;
    let ledger = state.ledger()?;
    let log_id = db::attendance_upsert(
        &ledger,
        &student.roll_no,
        &subject.subject_id,
        status,
        &now_timestamp(),
    )?;

    info!(
        roll_no = %student.roll_no,
        subject_id = %subject.subject_id,
        log_id,
        "attendance recorded"
    );
    Ok(json!({
        "student": {
            "roll_no": student.roll_no,
            "name": student.name,
            "subject_id": subject.subject_id,
            "status": status,
        }
    }))
}

pub fn try_handle(state: &AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "scan" => handle_scan(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.method, result))
}
