use image::DynamicImage;
use std::process::Command;
use tempfile::TempDir;
use tracing::debug;

use super::process::command_stdout;
use super::ExtractError;

/// Renders a single PDF page to a raster image.
pub trait PageRasterizer: Send + Sync {
    /// `page_number` is 1-indexed, matching PDF page numbering.
    fn render_page(&self, pdf: &[u8], page_number: u32, dpi: u32)
        -> Result<DynamicImage, ExtractError>;
}

/// Rasterizer backed by Poppler's `pdftoppm`.
#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    binary: String,
}

impl PdftoppmRasterizer {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self::new("pdftoppm")
    }
}

impl PageRasterizer for PdftoppmRasterizer {
    fn render_page(
        &self,
        pdf: &[u8],
        page_number: u32,
        dpi: u32,
    ) -> Result<DynamicImage, ExtractError> {
        let temp_dir = TempDir::new()?;
        let input_path = temp_dir.path().join("input.pdf");
        std::fs::write(&input_path, pdf)?;

        let output_prefix = temp_dir.path().join("page");
        let page = page_number.to_string();
        let resolution = dpi.to_string();
        let output = Command::new(&self.binary)
            .args(["-png", "-singlefile", "-r", &resolution, "-f", &page, "-l", &page])
            .arg(&input_path)
            .arg(&output_prefix)
            .output();
        command_stdout(output, &self.binary, ExtractError::Render)?;

        // -singlefile writes exactly `<prefix>.png`
        let image_path = output_prefix.with_extension("png");
        let image = image::open(&image_path).map_err(|err| {
            ExtractError::Render(format!("page {} produced no readable image: {}", page_number, err))
        })?;
        debug!(
            page_number,
            width = image.width(),
            height = image.height(),
            "Page rasterized"
        );
        Ok(image)
    }
}
