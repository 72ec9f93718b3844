//! Document-to-text extraction.
//!
//! PDFs are read page by page through their text layer; pages without a
//! usable text layer are rasterized and sent through OCR. Images are
//! normalized to opaque RGB and sent through OCR directly.

mod pdf;
mod process;
mod raster;
mod render;

pub mod ocr;
#[cfg(feature = "ocr-ocrs")]
pub mod ocrs_backend;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::config::{ExtractionConfig, OcrBackendKind};

pub use ocr::{OcrEngine, TesseractOcr};
pub use pdf::PageText;
pub use raster::normalize_image;
pub use render::{PageRasterizer, PdftoppmRasterizer};

pub const NO_TEXT_WARNING: &str = "No text detected.";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("corrupt document: {0}")]
    CorruptDocument(String),

    #[error("page rendering failed: {0}")]
    Render(String),

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("external tool not found: {0}")]
    ToolNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Pdf,
    Image,
    RawText,
}

impl SourceKind {
    pub fn label(self) -> &'static str {
        match self {
            SourceKind::Pdf => "pdf",
            SourceKind::Image => "image",
            SourceKind::RawText => "raw_text",
        }
    }

    /// Maps an upload filename onto the extraction path it should take.
    ///
    /// Returns `None` for anything outside the accepted extensions.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let lower = filename.to_lowercase();
        let extension = std::path::Path::new(&lower)
            .extension()
            .and_then(|ext| ext.to_str())?;
        match extension {
            "pdf" => Some(SourceKind::Pdf),
            "png" | "jpg" | "jpeg" | "webp" | "bmp" | "tiff" => Some(SourceKind::Image),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    pub source_kind: SourceKind,
    pub text: String,
    pub warning: Option<String>,
}

impl ExtractionResult {
    pub fn new(source_kind: SourceKind, text: String) -> Self {
        let warning = if text.trim().is_empty() {
            Some(NO_TEXT_WARNING.to_string())
        } else {
            None
        };
        Self {
            source_kind,
            text,
            warning,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[derive(Clone)]
pub struct Extractor {
    rasterizer: Arc<dyn PageRasterizer>,
    ocr: Arc<dyn OcrEngine>,
    render_dpi: u32,
}

impl Extractor {
    pub fn new(
        rasterizer: Arc<dyn PageRasterizer>,
        ocr: Arc<dyn OcrEngine>,
        render_dpi: u32,
    ) -> Self {
        Self {
            rasterizer,
            ocr,
            render_dpi,
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Result<Self, ExtractError> {
        let rasterizer = Arc::new(PdftoppmRasterizer::new(config.pdftoppm_bin.clone()));
        let ocr: Arc<dyn OcrEngine> = match config.ocr_backend {
            OcrBackendKind::Tesseract => Arc::new(TesseractOcr::new(
                config.tesseract_bin.clone(),
                config.ocr_language.clone(),
            )),
            #[cfg(feature = "ocr-ocrs")]
            OcrBackendKind::Ocrs => Arc::new(ocrs_backend::OcrsEngine::from_model_dir(
                config.ocrs_model_dir.as_deref(),
            )?),
            #[cfg(not(feature = "ocr-ocrs"))]
            OcrBackendKind::Ocrs => {
                return Err(ExtractError::Ocr(
                    "ocrs backend requested but built without the `ocr-ocrs` feature".to_string(),
                ))
            }
        };
        info!(
            backend = ocr.name(),
            render_dpi = config.render_dpi,
            "Extractor ready"
        );
        Ok(Self::new(rasterizer, ocr, config.render_dpi))
    }

    #[instrument(skip_all, fields(kind = kind.label(), bytes_len = bytes.len()))]
    pub fn extract(&self, bytes: &[u8], kind: SourceKind) -> Result<ExtractionResult, ExtractError> {
        let text = match kind {
            SourceKind::Pdf => pdf::extract_pdf(
                bytes,
                self.rasterizer.as_ref(),
                self.ocr.as_ref(),
                self.render_dpi,
            )?,
            SourceKind::Image => raster::extract_image(bytes, self.ocr.as_ref())?,
            SourceKind::RawText => {
                return Err(ExtractError::UnsupportedFormat(kind.label().to_string()))
            }
        };
        debug!(chars = text.chars().count(), "Extraction complete");
        Ok(ExtractionResult::new(kind, text))
    }
}

/// Reports which external binaries the default backends can reach.
pub fn check_tools(config: &ExtractionConfig) -> Vec<(String, bool)> {
    [&config.pdftoppm_bin, &config.tesseract_bin]
        .iter()
        .map(|tool| (tool.to_string(), process::check_binary(tool)))
        .collect()
}
