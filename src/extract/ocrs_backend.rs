//! Pure-Rust OCR through `ocrs`, enabled with the `ocr-ocrs` feature.
//!
//! The engine expects `text-detection.rten` and `text-recognition.rten` in
//! its model directory. Without an explicit directory it looks in
//! `$XDG_CACHE_HOME/ocrs`, then `~/.cache/ocrs`, which is where `ocrs-cli`
//! downloads them.

use image::RgbImage;
use ocrs::{ImageSource, OcrEngine as OcrsInner, OcrEngineParams};
use rten::Model;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{ExtractError, OcrEngine};

const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

pub struct OcrsEngine {
    engine: OcrsInner,
}

impl OcrsEngine {
    /// Loads both models once; keep the engine and reuse it for every page.
    pub fn from_model_dir(dir: Option<&Path>) -> Result<Self, ExtractError> {
        let dir = dir.map(Path::to_path_buf).unwrap_or_else(default_model_dir);
        let detection_model = load_model(&dir.join(DETECTION_MODEL_FILENAME))?;
        let recognition_model = load_model(&dir.join(RECOGNITION_MODEL_FILENAME))?;

        let engine = OcrsInner::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|err| ExtractError::Ocr(format!("failed to initialise ocrs: {}", err)))?;

        info!(model_dir = %dir.display(), "ocrs engine initialised");
        Ok(Self { engine })
    }
}

fn load_model(path: &Path) -> Result<Model, ExtractError> {
    if !path.exists() {
        return Err(ExtractError::Ocr(format!(
            "OCR model not found at {}; run `ocrs-cli` once to download models",
            path.display()
        )));
    }
    Model::load_file(path)
        .map_err(|err| ExtractError::Ocr(format!("failed to load {}: {}", path.display(), err)))
}

impl OcrEngine for OcrsEngine {
    fn name(&self) -> &'static str {
        "ocrs"
    }

    fn recognize(&self, image: &RgbImage) -> Result<String, ExtractError> {
        let (width, height) = image.dimensions();
        let source = ImageSource::from_bytes(image.as_raw(), (width, height)).map_err(|err| {
            ExtractError::Ocr(format!("failed to create image source ({}x{}): {}", width, height, err))
        })?;
        let input = self
            .engine
            .prepare_input(source)
            .map_err(|err| ExtractError::Ocr(format!("OCR preprocessing failed: {}", err)))?;
        let text = self
            .engine
            .get_text(&input)
            .map_err(|err| ExtractError::Ocr(format!("OCR text recognition failed: {}", err)))?;

        debug!(lines = text.lines().count(), "ocrs recognition complete");
        Ok(text)
    }
}
