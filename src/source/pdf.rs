//! PDF page source
//!
//! Document structure (page count, page sizes) is read with `lopdf`;
//! rasterization goes through Pdfium. The raw file bytes are kept around
//! because the lossless vector output path re-embeds them directly.

use std::path::Path;
use std::sync::Arc;

use ::image::RgbaImage;
use lopdf::{Dictionary, Document, Object, ObjectId};
use pdfium_render::prelude::*;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::geom::{PixelSize, Size};
use crate::source::{PageSource, RenderCache, VectorPageRef};
use crate::units::Unit;

/// Halving the render resolution this many times is far past unusable;
/// the dpi floor normally terminates the loop first.
const MAX_DEGRADE_STEPS: u32 = 32;

/// A loaded PDF file, handing out per-page sources
pub struct PdfFileSource {
    bytes: Arc<Vec<u8>>,
    doc: Document,
}

impl PdfFileSource {
    /// Read and parse a PDF file from disk
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_bytes(std::fs::read(path)?)
    }

    /// Parse a PDF held in memory
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let doc = Document::load_mem(&bytes)
            .map_err(|e| Error::source_format(format!("failed to load PDF: {e}")))?;
        if doc.is_encrypted() {
            return Err(Error::source_format("PDF is encrypted"));
        }
        Ok(Self {
            bytes: Arc::new(bytes),
            doc,
        })
    }

    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// The page at the given zero-based index
    pub fn page(&self, page_index: u32) -> Result<PdfPageSource> {
        let pages = self.doc.get_pages();
        let page_id = pages
            .get(&(page_index + 1))
            .copied()
            .ok_or_else(|| {
                Error::source_format(format!(
                    "page {page_index} out of bounds (document has {} pages)",
                    pages.len()
                ))
            })?;

        let media_box = inherited_media_box(&self.doc, page_id)?;
        let native_size = Size::new(media_box[2] - media_box[0], media_box[3] - media_box[1]);

        Ok(PdfPageSource {
            bytes: Arc::clone(&self.bytes),
            page_index,
            native_size,
            cache: RenderCache::new(),
        })
    }
}

/// One page of a PDF document
pub struct PdfPageSource {
    bytes: Arc<Vec<u8>>,
    page_index: u32,
    native_size: Size,
    cache: RenderCache,
}

impl PdfPageSource {
    fn init_pdfium() -> Result<Pdfium> {
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name()))
            .map_err(|e| Error::source_format(format!("failed to bind to Pdfium library: {e}")))?;
        Ok(Pdfium::new(bindings))
    }

    /// Render the page, halving the resolution on failure until either a
    /// render succeeds or the dpi collapses below one
    fn render_at(&self, hint: PixelSize) -> Result<RgbaImage> {
        // Pdfium addresses pages with a u16; refuse rather than truncate
        let page_number = u16::try_from(self.page_index).map_err(|_| {
            Error::source_format(format!(
                "page {} is beyond the renderable page range",
                self.page_index
            ))
        })?;

        let pdfium = Self::init_pdfium()?;
        let doc = pdfium
            .load_pdf_from_byte_slice(&self.bytes, None)
            .map_err(|e| Error::source_format(format!("failed to load PDF: {e}")))?;
        let page = doc
            .pages()
            .get(page_number)
            .map_err(|e| Error::source_format(format!("page {}: {e}", self.page_index)))?;

        let mut x_dpi = (f64::from(hint.width) * 72.0) / self.native_size.width;
        let mut y_dpi = (f64::from(hint.height) * 72.0) / self.native_size.height;

        let mut steps = 0;
        while x_dpi > 1.0 && y_dpi > 1.0 && steps < MAX_DEGRADE_STEPS {
            steps += 1;

            let w = (self.native_size.width * x_dpi / 72.0).round();
            let h = (self.native_size.height * y_dpi / 72.0).round();
            if w < 1.0 || h < 1.0 {
                break;
            }
            if w > f64::from(i32::MAX) || h > f64::from(i32::MAX) {
                x_dpi /= 2.0;
                y_dpi /= 2.0;
                continue;
            }

            let config = PdfRenderConfig::new()
                .set_target_width(w as i32)
                .set_maximum_height(h as i32);

            match page.render_with_config(&config) {
                Ok(bitmap) => {
                    let bw = bitmap.width() as u32;
                    let bh = bitmap.height() as u32;
                    let data = bitmap.as_rgba_bytes().to_vec();
                    match RgbaImage::from_raw(bw, bh, data) {
                        Some(image) => return Ok(image),
                        None => {
                            warn!(width = bw, height = bh, "bitmap allocation failed, halving dpi");
                            x_dpi /= 2.0;
                            y_dpi /= 2.0;
                        }
                    }
                }
                Err(e) => {
                    warn!(
                        x_dpi,
                        y_dpi,
                        error = %e,
                        "render failed, halving dpi"
                    );
                    x_dpi /= 2.0;
                    y_dpi /= 2.0;
                }
            }
        }

        Err(Error::allocation(format!(
            "page {} render failed down to {x_dpi:.2}x{y_dpi:.2} dpi",
            self.page_index
        )))
    }
}

impl PageSource for PdfPageSource {
    fn size_in_native_units(&self) -> Size {
        self.native_size
    }

    fn native_unit(&self) -> Unit {
        Unit::Points
    }

    fn allowed_units(&self) -> &[Unit] {
        &[Unit::Inches, Unit::Points]
    }

    fn rasterize(&self, size_hint: PixelSize) -> Result<Arc<RgbaImage>> {
        let hint = if size_hint.is_native() {
            PixelSize::new(
                self.native_size.width.round() as u32,
                self.native_size.height.round() as u32,
            )
        } else {
            size_hint
        };

        let key = hint.cache_key();
        if let Some(image) = self.cache.get(key) {
            return Ok(image);
        }

        // Render outside the cache lock; a concurrent request for the same
        // size may do the same work, which the cache tolerates.
        debug!(width = hint.width, height = hint.height, "rasterizing PDF page");
        let image = Arc::new(self.render_at(hint)?);
        self.cache.put(key, Arc::clone(&image));
        Ok(image)
    }

    fn vector_content(&self) -> Option<VectorPageRef<'_>> {
        Some(VectorPageRef {
            bytes: &self.bytes,
            page_index: self.page_index,
        })
    }
}

/// Resolve a possibly-indirect object
fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Result<&'a Object> {
    match obj {
        Object::Reference(id) => Ok(doc.get_object(*id)?),
        other => Ok(other),
    }
}

fn as_number(obj: &Object) -> Result<f64> {
    match obj {
        Object::Integer(i) => Ok(*i as f64),
        Object::Real(r) => Ok(f64::from(*r)),
        other => Err(Error::source_format(format!(
            "expected number in MediaBox, got {other:?}"
        ))),
    }
}

/// MediaBox of a page, following Parent links for inherited attributes
pub(crate) fn inherited_media_box(doc: &Document, page_id: ObjectId) -> Result<[f64; 4]> {
    let mut id = page_id;
    loop {
        let dict: &Dictionary = doc.get_object(id)?.as_dict()?;
        if let Ok(obj) = dict.get(b"MediaBox") {
            let arr = resolve(doc, obj)?.as_array()?;
            if arr.len() != 4 {
                return Err(Error::source_format("malformed MediaBox"));
            }
            let mut out = [0.0; 4];
            for (slot, item) in out.iter_mut().zip(arr.iter()) {
                *slot = as_number(resolve(doc, item)?)?;
            }
            return Ok(out);
        }
        match dict.get(b"Parent") {
            Ok(Object::Reference(parent)) => id = *parent,
            _ => return Err(Error::source_format("page has no MediaBox")),
        }
    }
}
