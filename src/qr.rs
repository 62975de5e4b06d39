//! QR rendering for student roll numbers.
//!
//! Each code is a black-on-white PNG with 10px modules and a 5-module white
//! border, saved as `<qr_dir>/<roll_no>.png` and returned inline as base64.

use anyhow::Context;
use base64::Engine;
use image::{imageops, ImageBuffer, ImageFormat, Luma};
use qrcode::QrCode;
use std::io::Cursor;
use std::path::{Path, PathBuf};

const MODULE_PX: u32 = 10;
const BORDER_MODULES: u32 = 5;

#[derive(Debug, Clone)]
pub struct RenderedQr {
    pub png: Vec<u8>,
    pub path: PathBuf,
}

impl RenderedQr {
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.png)
    }
}

pub fn qr_file_path(qr_dir: &Path, roll_no: &str) -> PathBuf {
    qr_dir.join(format!("{roll_no}.png"))
}

/// Encodes `payload` as a PNG QR code.
pub fn render_png(payload: &str) -> anyhow::Result<Vec<u8>> {
    let code = QrCode::new(payload.as_bytes()).context("failed to encode QR payload")?;
    let modules = code
        .render::<Luma<u8>>()
        .quiet_zone(false)
        .module_dimensions(MODULE_PX, MODULE_PX)
        .build();

    let border = BORDER_MODULES * MODULE_PX;
    let mut canvas = ImageBuffer::from_pixel(
        modules.width() + 2 * border,
        modules.height() + 2 * border,
        Luma([255u8]),
    );
    imageops::overlay(&mut canvas, &modules, i64::from(border), i64::from(border));

    let mut png = Vec::new();
    canvas
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .context("failed to encode QR image as PNG")?;
    Ok(png)
}

/// Renders the QR code for `roll_no` and writes it under `qr_dir`.
pub fn generate_for_student(qr_dir: &Path, roll_no: &str) -> anyhow::Result<RenderedQr> {
    let png = render_png(roll_no)?;
    std::fs::create_dir_all(qr_dir)
        .with_context(|| format!("failed to create QR directory {}", qr_dir.display()))?;
    let path = qr_file_path(qr_dir, roll_no);
    std::fs::write(&path, &png)
        .with_context(|| format!("failed to write QR image {}", path.display()))?;
    Ok(RenderedQr { png, path })
}
