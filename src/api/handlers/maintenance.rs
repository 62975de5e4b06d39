use crate::api::error::{respond, ServiceError};
use crate::api::types::{AppState, Request};
use crate::backup;
use crate::db;
use serde_json::json;
use tracing::info;

fn handle_clear(state: &AppState) -> Result<serde_json::Value, ServiceError> {
    let directory = state.directory()?;
    let students_removed = db::students_clear(&directory)?;
    drop(directory);

    let ledger = state.ledger()?;
    let attendance_removed = db::attendance_clear(&ledger)?;

    info!(students_removed, attendance_removed, "data cleared");
    Ok(json!({ "message": "All data cleared successfully" }))
}

fn handle_export(state: &AppState) -> Result<serde_json::Value, ServiceError> {
    let out_path = backup::default_export_path(&state.config.export_dir);
    let summary = backup::export_bundle(&state.config.data_dir, &state.config.qr_dir, &out_path)?;
    info!(
        path = %out_path.display(),
        entry_count = summary.entry_count,
        "export bundle written"
    );
    Ok(json!({
        "path": out_path.to_string_lossy(),
        "bundle_format": summary.bundle_format,
        "entry_count": summary.entry_count,
    }))
}

pub fn try_handle(state: &AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "clear-data" => handle_clear(state),
        "export" => handle_export(state),
        _ => return None,
    };
    Some(respond(&req.method, result))
}
