use image::{ColorType, DynamicImage, RgbImage};
use tracing::debug;

use super::{ExtractError, OcrEngine};

/// Flattens any decoded image to opaque 8-bit RGB.
///
/// Alpha is dropped rather than composited, so transparent regions take the
/// colour stored underneath them.
pub fn normalize_image(image: DynamicImage) -> RgbImage {
    let color = image.color();
    if color != ColorType::Rgb8 {
        debug!(?color, "Converting image to RGB8 before OCR");
    }
    image.into_rgb8()
}

pub(crate) fn extract_image(bytes: &[u8], ocr: &dyn OcrEngine) -> Result<String, ExtractError> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|err| ExtractError::CorruptDocument(format!("failed to decode image: {}", err)))?;
    let rgb = normalize_image(decoded);
    let text = ocr.recognize(&rgb)?;
    Ok(text.trim().to_string())
}
