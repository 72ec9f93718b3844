use image::{ImageFormat, RgbImage};
use std::process::Command;
use std::time::Instant;
use tempfile::TempDir;
use tracing::debug;

use super::process::command_stdout;
use super::ExtractError;

/// Optical character recognition over an opaque, three-channel image.
///
/// Implementations hold no per-call mutable state and may be shared across
/// worker threads.
pub trait OcrEngine: Send + Sync {
    fn name(&self) -> &'static str;

    fn recognize(&self, image: &RgbImage) -> Result<String, ExtractError>;
}

/// OCR through the `tesseract` command-line tool.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    binary: String,
    language: String,
}

impl TesseractOcr {
    pub fn new(binary: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            language: language.into(),
        }
    }
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self::new("tesseract", "eng")
    }
}

impl OcrEngine for TesseractOcr {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn recognize(&self, image: &RgbImage) -> Result<String, ExtractError> {
        let start = Instant::now();
        let temp_dir = TempDir::new()?;
        let image_path = temp_dir.path().join("input.png");
        image
            .save_with_format(&image_path, ImageFormat::Png)
            .map_err(|err| ExtractError::Ocr(format!("failed to stage image for OCR: {}", err)))?;

        let output = Command::new(&self.binary)
            .arg(&image_path)
            .arg("stdout")
            .args(["-l", &self.language])
            .output();
        let text = command_stdout(output, &self.binary, ExtractError::Ocr)?;

        debug!(
            width = image.width(),
            height = image.height(),
            chars = text.chars().count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Tesseract OCR complete"
        );
        Ok(text)
    }
}
