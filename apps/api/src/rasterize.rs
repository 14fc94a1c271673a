use std::io::Cursor;

use image::ImageFormat;
use pdfium_render::prelude::*;
use thiserror::Error;

/// Rendered pages are scaled to this width; height follows the page aspect.
const TARGET_WIDTH: i32 = 1024;

#[derive(Debug, Error)]
pub enum RasterizeError {
    #[error("PDF runtime unavailable: {0}")]
    Bindings(String),

    #[error("Unreadable document: {0}")]
    Parse(String),

    #[error("Document has no pages")]
    EmptyDocument,

    #[error("Page rendering failed: {0}")]
    Render(String),

    #[error("Image encoding failed: {0}")]
    Encode(String),
}

/// A rasterized first page, PNG-encoded.
#[derive(Debug, Clone)]
pub struct RasterPage {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Converts the first page of a PDF-like document into a raster image at a
/// fixed resolution. Pure and deterministic: no I/O beyond the input bytes.
///
/// Rendering is CPU-bound and blocking; async callers go through
/// `tokio::task::spawn_blocking`.
pub trait DocumentRasterizer: Send + Sync {
    fn rasterize_first_page(&self, document: &[u8]) -> Result<RasterPage, RasterizeError>;
}

/// Pdfium-backed rasterizer. Binds the system pdfium library per call; the
/// bindings are not Sync so no handle is cached across invocations.
pub struct PdfRasterizer;

impl DocumentRasterizer for PdfRasterizer {
    fn rasterize_first_page(&self, document: &[u8]) -> Result<RasterPage, RasterizeError> {
        let bindings = Pdfium::bind_to_system_library()
            .map_err(|e| RasterizeError::Bindings(e.to_string()))?;
        let pdfium = Pdfium::new(bindings);

        let document = pdfium
            .load_pdf_from_byte_slice(document, None)
            .map_err(|e| RasterizeError::Parse(e.to_string()))?;

        if document.pages().len() == 0 {
            return Err(RasterizeError::EmptyDocument);
        }

        let page = document
            .pages()
            .get(0)
            .map_err(|e| RasterizeError::Parse(e.to_string()))?;

        let bitmap = page
            .render_with_config(&PdfRenderConfig::new().set_target_width(TARGET_WIDTH))
            .map_err(|e| RasterizeError::Render(e.to_string()))?;
        let rendered = bitmap.as_image();

        let mut png = Vec::new();
        rendered
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| RasterizeError::Encode(e.to_string()))?;

        Ok(RasterPage {
            png,
            width: rendered.width(),
            height: rendered.height(),
        })
    }
}
