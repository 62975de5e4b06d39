use anyhow::anyhow;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

pub const DEFAULT_SUBJECT_ID: &str = "BCA-501";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub qr_dir: PathBuf,
    pub export_dir: PathBuf,
    pub default_subject: String,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let data_dir: PathBuf = try_load(&lookup, "QRATTEND_DATA_DIR", "data")?;
        let default_export = data_dir.join("exports");
        let export_dir = match lookup("QRATTEND_EXPORT_DIR") {
            Some(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
            _ => default_export,
        };

        Ok(Self {
            host: try_load(&lookup, "QRATTEND_HOST", "0.0.0.0")?,
            port: try_load(&lookup, "QRATTEND_PORT", "5000")?,
            qr_dir: try_load(&lookup, "QRATTEND_QR_DIR", "qr_codes")?,
            default_subject: try_load(&lookup, "QRATTEND_DEFAULT_SUBJECT", DEFAULT_SUBJECT_ID)?,
            data_dir,
            export_dir,
        })
    }

    /// Keeps every on-disk artifact under `root`.
    pub fn rooted_at(root: &Path) -> Self {
        let data_dir = root.join("data");
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            export_dir: data_dir.join("exports"),
            data_dir,
            qr_dir: root.join("qr_codes"),
            default_subject: DEFAULT_SUBJECT_ID.to_string(),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn try_load<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> anyhow::Result<T>
where
    T::Err: Display,
{
    let raw = match lookup(key) {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => {
            info!("{key} not set, using default: {default}");
            default.to_string()
        }
    };
    raw.parse().map_err(|e| {
        warn!("Invalid {key} value: {e}");
        anyhow!("invalid {key} value {raw:?}: {e}")
    })
}
