//! Page sources
//!
//! A page source supplies one logical page of content: its native size and
//! unit, and a rasterized bitmap on demand. The compositors consume nothing
//! beyond this contract; new kinds of source are added by implementing
//! [`PageSource`], never by type checks inside the rendering code.

pub mod cache;
pub mod image;
pub mod pdf;

use std::sync::Arc;

use ::image::RgbaImage;

use crate::error::Result;
use crate::geom::{PixelSize, Size};
use crate::units::Unit;

pub use cache::RenderCache;
pub use image::ImagePageSource;
pub use pdf::{PdfFileSource, PdfPageSource};

/// Borrowed view of a source's native vector document content
///
/// Only sources that are themselves pages of a vector document format
/// return this; it is what the lossless embedding path consumes.
#[derive(Debug, Clone, Copy)]
pub struct VectorPageRef<'a> {
    /// Raw bytes of the whole source document
    pub bytes: &'a [u8],
    /// Zero-based page index within the document
    pub page_index: u32,
}

/// One logical page of input content
pub trait PageSource {
    /// Page size in the source's native unit
    fn size_in_native_units(&self) -> Size;

    /// The unit [`Self::size_in_native_units`] is expressed in
    fn native_unit(&self) -> Unit;

    /// Units a caller may meaningfully use with this source
    fn allowed_units(&self) -> &[Unit];

    /// Rasterize the page at roughly the hinted pixel size
    ///
    /// A hint of `(0, 0)` means native resolution. Implementations may
    /// return a different size than hinted (a fixed image ignores the hint
    /// entirely; a degraded render may be smaller) and should cache by
    /// pixel size where rendering is expensive.
    fn rasterize(&self, size_hint: PixelSize) -> Result<Arc<RgbaImage>>;

    /// Native vector content, for sources backed by a vector document
    fn vector_content(&self) -> Option<VectorPageRef<'_>> {
        None
    }
}
