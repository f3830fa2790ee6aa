//! OCR fallback seams for PDFs without a text layer
//!
//! Rendering a page and recognizing text in it are separate steps so either
//! backend can be swapped. The default rasterizer decodes the images embedded
//! in each page, which is how scanners store their output: JPEG streams as
//! well as raw or Flate-compressed samples.

use crate::error::ExtractorError;
use crate::pdf::{guarded, load_document, page_images};
use anyhow::Context;
use image::DynamicImage;
use tracing::debug;

/// Turns the first pages of a PDF into raster images
pub trait PageRasterizer: Send + Sync {
    /// Render at most `max_pages` pages of `pdf`
    fn rasterize(&self, pdf: &[u8], max_pages: usize) -> anyhow::Result<Vec<DynamicImage>>;
}

/// Recognizes text in a raster image
pub trait OcrEngine: Send + Sync {
    /// Return the recognized text, possibly empty
    fn recognize(&self, image: &DynamicImage) -> anyhow::Result<String>;
}

/// Rasterizer that decodes images embedded in each page
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedImageRasterizer;

impl PageRasterizer for EmbeddedImageRasterizer {
    fn rasterize(&self, pdf: &[u8], max_pages: usize) -> anyhow::Result<Vec<DynamicImage>> {
        let doc = load_document(pdf).context("failed to parse PDF for rasterization")?;
        let images = guarded(|| Ok(page_images(&doc, max_pages)), ExtractorError::Ocr)?;
        debug!(images = images.len(), "Decoded embedded page images");
        Ok(images)
    }
}

/// OCR engine used when no recognizer is available; always yields empty text
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOcr;

impl OcrEngine for NoOcr {
    fn recognize(&self, _image: &DynamicImage) -> anyhow::Result<String> {
        debug!("OCR support not compiled in; returning empty text");
        Ok(String::new())
    }
}

/// Tesseract-backed OCR via `leptess`
#[cfg(feature = "ocr")]
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    datapath: Option<String>,
    language: String,
}

#[cfg(feature = "ocr")]
impl TesseractOcr {
    /// Create an engine for the given tesseract language (e.g. `eng`)
    pub fn new(datapath: Option<String>, language: impl Into<String>) -> Self {
        Self {
            datapath,
            language: language.into(),
        }
    }
}

#[cfg(feature = "ocr")]
impl Default for TesseractOcr {
    fn default() -> Self {
        Self::new(None, "eng")
    }
}

#[cfg(feature = "ocr")]
impl OcrEngine for TesseractOcr {
    fn recognize(&self, image: &DynamicImage) -> anyhow::Result<String> {
        let mut png = Vec::new();
        image
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .context("failed to encode page image")?;

        let mut tess = leptess::LepTess::new(self.datapath.as_deref(), &self.language)
            .map_err(|e| anyhow::anyhow!("tesseract init failed: {:?}", e))?;
        tess.set_image_from_mem(&png)
            .map_err(|e| anyhow::anyhow!("tesseract rejected image: {:?}", e))?;
        let text = tess
            .get_utf8_text()
            .map_err(|e| anyhow::anyhow!("tesseract output was not UTF-8: {}", e))?;
        Ok(text)
    }
}

/// The OCR engine used when none is configured explicitly
pub fn default_ocr_engine() -> Box<dyn OcrEngine> {
    #[cfg(feature = "ocr")]
    {
        Box::new(TesseractOcr::default())
    }
    #[cfg(not(feature = "ocr"))]
    {
        Box::new(NoOcr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_ocr_returns_empty_text() {
        let image = DynamicImage::new_rgb8(4, 4);
        assert_eq!(NoOcr.recognize(&image).unwrap(), "");
    }

    #[test]
    fn test_rasterizer_rejects_garbage() {
        let result = EmbeddedImageRasterizer.rasterize(b"definitely not a pdf", 3);
        assert!(result.is_err());
    }
}
