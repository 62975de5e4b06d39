use crate::api::error::{respond, ServiceError};
use crate::api::types::{AppState, Request};
use serde_json::json;

fn handle_health(state: &AppState) -> Result<serde_json::Value, ServiceError> {
    let active = state.active_subject()?;
    Ok(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "data_dir": state.config.data_dir.to_string_lossy(),
        "active_subject": active,
    }))
}

pub fn try_handle(state: &AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "health" => handle_health(state),
        _ => return None,
    };
    Some(respond(&req.method, result))
}
