use crate::api::error::{respond, ServiceError};
use crate::api::types::{AppState, Request};
use crate::db;
use serde_json::json;

/// Everything in both stores, grouped by store.
fn handle_data(state: &AppState) -> Result<serde_json::Value, ServiceError> {
    let directory = state.directory()?;
    let students = db::students_list(&directory)?;
    let subjects = db::subjects_list(&directory)?;
    drop(directory);

    let ledger = state.ledger()?;
    let attendance = db::attendance_list(&ledger)?;

    Ok(json!({
        "database1_student_data": {
            "students": students,
            "subjects": subjects,
        },
        "database2_attendance": {
            "attendance": attendance,
        }
    }))
}

pub fn try_handle(state: &AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "data" => handle_data(state),
        _ => return None,
    };
    Some(respond(&req.method, result))
}
