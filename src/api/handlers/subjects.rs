use crate::api::error::{respond, ServiceError};
use crate::api::helpers::get_required_str;
use crate::api::types::{AppState, Request};
use crate::db;
use serde_json::json;
use tracing::info;

pub const SUBJECT_NOT_FOUND: &str = "Subject not found";

fn handle_list(state: &AppState) -> Result<serde_json::Value, ServiceError> {
    let conn = state.directory()?;
    let subjects = db::subjects_list(&conn)?;
    let current = state.active_subject()?;
    Ok(json!({
        "subjects": subjects,
        "current": current,
    }))
}

fn handle_set(
    state: &AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, ServiceError> {
    let subject_id = get_required_str(params, "subject_id")?;
    let conn = state.directory()?;
    let Some(subject) = db::subject_get(&conn, &subject_id)? else {
        return Err(ServiceError::NotFound(SUBJECT_NOT_FOUND.to_string()));
    };

    state.replace_active_subject(subject.clone())?;
    info!(
        subject_id = %subject.subject_id,
        subject_name = %subject.subject_name,
        "active subject changed"
    );
    Ok(json!({ "current": subject }))
}

pub fn try_handle(state: &AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "get-subjects" => handle_list(state),
        "set-subject" => handle_set(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.method, result))
}
