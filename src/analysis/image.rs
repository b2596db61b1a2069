//! Base64 images returned by the analysis service

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::{Path, PathBuf};

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

/// A validated base64 image payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    data: String,
    byte_len: usize,
    dimensions: Option<(u32, u32)>,
}

impl EncodedImage {
    /// Validate base64 text; the decoded bytes are inspected once and dropped
    pub fn parse(data: impl Into<String>) -> Result<Self, String> {
        let data = data.into();
        let trimmed = data.trim();
        if trimmed.is_empty() {
            return Err("image data is empty".to_string());
        }
        let bytes = STANDARD
            .decode(trimmed)
            .map_err(|e| format!("image data is not base64: {e}"))?;
        Ok(Self {
            byte_len: bytes.len(),
            dimensions: png_dimensions(&bytes),
            data: trimmed.to_string(),
        })
    }

    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.data)
    }

    /// Short human description, e.g. `640x480 PNG, 12.5 KiB`
    pub fn describe(&self) -> String {
        let size = format_size(self.byte_len);
        match self.dimensions {
            Some((w, h)) => format!("{w}x{h} PNG, {size}"),
            None => format!("image, {size}"),
        }
    }

    /// Write the decoded image into `dir` as `file_name`
    pub fn write_to(&self, dir: &Path, file_name: &str) -> std::io::Result<PathBuf> {
        let bytes = self
            .decode()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::create_dir_all(dir)?;
        let path = dir.join(file_name);
        std::fs::write(&path, bytes)?;
        Ok(path)
    }
}

fn png_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    if bytes.len() < 24 || bytes[..8] != PNG_SIGNATURE || bytes[12..16] != *b"IHDR" {
        return None;
    }
    let width = u32::from_be_bytes(bytes[16..20].try_into().ok()?);
    let height = u32::from_be_bytes(bytes[20..24].try_into().ok()?);
    Some((width, height))
}

#[allow(clippy::cast_precision_loss)]
fn format_size(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else {
        format!("{:.1} KiB", bytes as f64 / 1024.0)
    }
}
