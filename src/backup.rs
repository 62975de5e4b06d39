use crate::db::{DIRECTORY_FILE, LEDGER_FILE};
use anyhow::{anyhow, Context};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const MANIFEST_ENTRY: &str = "manifest.json";
pub const BUNDLE_FORMAT_V1: &str = "qrattend-export-v1";

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub bundle_format: String,
    pub entry_count: usize,
}

struct BundleEntry {
    name: String,
    bytes: Vec<u8>,
}

/// `attendance-export-<unix_millis>.zip`; millisecond stamps keep two
/// exports in the same second apart.
pub fn default_export_path(export_dir: &Path) -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    export_dir.join(format!("attendance-export-{stamp}.zip"))
}

/// Writes a zip bundle holding both stores and every QR image, with a
/// manifest listing the SHA-256 of each entry.
pub fn export_bundle(
    data_dir: &Path,
    qr_dir: &Path,
    out_path: &Path,
) -> anyhow::Result<ExportSummary> {
    let mut entries = Vec::new();
    for file_name in [DIRECTORY_FILE, LEDGER_FILE] {
        let src = data_dir.join(file_name);
        if !src.is_file() {
            return Err(anyhow!("store not found: {}", src.to_string_lossy()));
        }
        entries.push(BundleEntry {
            name: format!("db/{file_name}"),
            bytes: std::fs::read(&src)
                .with_context(|| format!("failed to read store {}", src.to_string_lossy()))?,
        });
    }
    entries.extend(collect_qr_images(qr_dir)?);

    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }
    let out_file = File::create(out_path).with_context(|| {
        format!(
            "failed to create output file {}",
            out_path.to_string_lossy()
        )
    })?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let exported_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let listed: Vec<serde_json::Value> = entries
        .iter()
        .map(|e| {
            json!({
                "name": e.name,
                "size": e.bytes.len(),
                "sha256": sha256_hex(&e.bytes),
            })
        })
        .collect();
    let manifest = json!({
        "format": BUNDLE_FORMAT_V1,
        "version": 1,
        "appVersion": env!("CARGO_PKG_VERSION"),
        "exportedAt": exported_at,
        "entries": listed,
    });
    zip.start_file(MANIFEST_ENTRY, opts)
        .context("failed to start manifest entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&manifest)
            .context("failed to serialize manifest")?
            .as_bytes(),
    )
    .context("failed to write manifest entry")?;

    for entry in &entries {
        zip.start_file(entry.name.as_str(), opts)
            .with_context(|| format!("failed to start entry {}", entry.name))?;
        zip.write_all(&entry.bytes)
            .with_context(|| format!("failed to write entry {}", entry.name))?;
    }

    zip.finish().context("failed to finalize zip bundle")?;

    Ok(ExportSummary {
        bundle_format: BUNDLE_FORMAT_V1.to_string(),
        entry_count: entries.len() + 1,
    })
}

fn collect_qr_images(qr_dir: &Path) -> anyhow::Result<Vec<BundleEntry>> {
    if !qr_dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut paths = Vec::new();
    for ent in std::fs::read_dir(qr_dir)
        .with_context(|| format!("failed to list {}", qr_dir.to_string_lossy()))?
    {
        let p = ent?.path();
        if p.is_file() && p.extension().and_then(|s| s.to_str()) == Some("png") {
            paths.push(p);
        }
    }
    // Deterministic order inside the bundle.
    paths.sort();

    let mut out = Vec::with_capacity(paths.len());
    for p in paths {
        let Some(file_name) = p.file_name().and_then(|s| s.to_str()) else {
            continue;
        };
        out.push(BundleEntry {
            name: format!("qr_codes/{file_name}"),
            bytes: std::fs::read(&p)
                .with_context(|| format!("failed to read {}", p.to_string_lossy()))?,
        });
    }
    Ok(out)
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::{default_export_path, sha256_hex};
    use std::path::Path;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn export_name_carries_unix_millis() {
        let before = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_millis();
        let path = default_export_path(Path::new("/exports"));
        let after = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_millis();

        assert_eq!(path.parent(), Some(Path::new("/exports")));
        let name = path.file_name().and_then(|s| s.to_str()).expect("file name");
        let stamp: u128 = name
            .strip_prefix("attendance-export-")
            .and_then(|s| s.strip_suffix(".zip"))
            .expect("export name layout")
            .parse()
            .expect("numeric stamp");
        assert!(before <= stamp && stamp <= after, "{stamp} not in [{before}, {after}]");
    }

    #[test]
    fn sha256_hex_of_empty_input() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
