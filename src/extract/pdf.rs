use lopdf::Document;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, info, warn};

use super::{normalize_image, ExtractError, OcrEngine, PageRasterizer};

/// Outcome of reading one page's embedded text layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageText {
    Extracted(String),
    /// No usable text layer; the reason is kept for logging.
    NeedsOcr(String),
}

pub(crate) fn read_text_layer(document: &Document, page_number: u32) -> PageText {
    // lopdf can panic on malformed content streams; treat that like any other
    // unreadable text layer.
    let attempt = catch_unwind(AssertUnwindSafe(|| document.extract_text(&[page_number])));
    match attempt {
        Ok(Ok(text)) if !text.trim().is_empty() => PageText::Extracted(text),
        Ok(Ok(_)) => PageText::NeedsOcr("no text layer".to_string()),
        Ok(Err(err)) => PageText::NeedsOcr(err.to_string()),
        Err(_) => PageText::NeedsOcr("text layer parser panicked".to_string()),
    }
}

pub(crate) fn extract_pdf(
    bytes: &[u8],
    rasterizer: &dyn PageRasterizer,
    ocr: &dyn OcrEngine,
    dpi: u32,
) -> Result<String, ExtractError> {
    let document = Document::load_mem(bytes)
        .map_err(|err| ExtractError::CorruptDocument(format!("failed to open PDF: {}", err)))?;
    let pages = document.get_pages();
    info!(pages = pages.len(), "PDF opened");

    let mut page_texts = Vec::with_capacity(pages.len());
    let mut ocr_pages = 0usize;
    for &page_number in pages.keys() {
        let text = match read_text_layer(&document, page_number) {
            PageText::Extracted(text) => text,
            PageText::NeedsOcr(reason) => {
                debug!(page_number, %reason, "Falling back to OCR");
                ocr_pages += 1;
                match ocr_page(bytes, page_number, rasterizer, ocr, dpi) {
                    Ok(text) => text,
                    Err(err) => {
                        warn!(page_number, %err, "Page unreadable, recording empty text");
                        String::new()
                    }
                }
            }
        };
        page_texts.push(text);
    }

    debug!(ocr_pages, "PDF pages processed");
    Ok(join_pages(page_texts))
}

fn ocr_page(
    bytes: &[u8],
    page_number: u32,
    rasterizer: &dyn PageRasterizer,
    ocr: &dyn OcrEngine,
    dpi: u32,
) -> Result<String, ExtractError> {
    let rendered = rasterizer.render_page(bytes, page_number, dpi)?;
    ocr.recognize(&normalize_image(rendered))
}

fn join_pages(pages: Vec<String>) -> String {
    pages
        .iter()
        .map(|text| text.trim())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_drops_empty_pages_and_trims() {
        let joined = join_pages(vec![
            "  first page".to_string(),
            String::new(),
            " \n".to_string(),
            "third page\n\n".to_string(),
        ]);
        assert_eq!(joined, "first page\nthird page");
    }

    #[test]
    fn join_of_nothing_is_empty() {
        assert_eq!(join_pages(vec![String::new(), String::new()]), "");
        assert_eq!(join_pages(Vec::new()), "");
    }
}
