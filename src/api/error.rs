use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Builds a success envelope. Object results are flattened next to `success`.
pub fn ok(result: serde_json::Value) -> serde_json::Value {
    let mut resp = json!({ "success": true });
    match result {
        serde_json::Value::Object(fields) => {
            for (k, v) in fields {
                resp[k.as_str()] = v;
            }
        }
        serde_json::Value::Null => {}
        other => resp["result"] = other,
    }
    resp
}

pub fn err(code: &str, message: impl Into<String>) -> serde_json::Value {
    json!({
        "success": false,
        "error": message.into(),
        "code": code,
    })
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    BadParams(String),
    #[error("{0}")]
    DuplicateKey(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unclassified(String),
}

impl ServiceError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadParams(_) => "bad_params",
            Self::DuplicateKey(_) => "duplicate_key",
            Self::NotFound(_) => "not_found",
            Self::Unclassified(_) => "internal",
        }
    }

    pub fn response(&self) -> serde_json::Value {
        err(self.code(), self.to_string())
    }
}

/// Turns a handler outcome into its envelope, logging failures.
pub fn respond(
    method: &str,
    result: Result<serde_json::Value, ServiceError>,
) -> serde_json::Value {
    match result {
        Ok(v) => ok(v),
        Err(e @ ServiceError::Unclassified(_)) => {
            error!(method, error = %e, "request failed");
            e.response()
        }
        Err(e) => {
            warn!(method, code = e.code(), error = %e, "request rejected");
            e.response()
        }
    }
}

impl From<rusqlite::Error> for ServiceError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Unclassified(e.to_string())
    }
}

impl From<anyhow::Error> for ServiceError {
    fn from(e: anyhow::Error) -> Self {
        Self::Unclassified(format!("{e:#}"))
    }
}
