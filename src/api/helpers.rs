use crate::api::error::ServiceError;

/// Reads a required string param, trimmed. Empty values are rejected.
pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, ServiceError> {
    let raw = params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ServiceError::BadParams(format!("missing {key}")))?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::BadParams(format!("{key} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// Reads an optional string param. Null, absent and blank all mean `None`.
pub fn get_optional_str(
    params: &serde_json::Value,
    key: &str,
) -> Result<Option<String>, ServiceError> {
    match params.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => {
            let t = s.trim();
            Ok((!t.is_empty()).then(|| t.to_string()))
        }
        Some(_) => Err(ServiceError::BadParams(format!("{key} must be a string"))),
    }
}

/// Current UTC time in the Ledger's timestamp layout.
pub fn now_timestamp() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%d %H:%M:%S%.3f")
        .to_string()
}
