//! Raster image page source

use std::path::Path;
use std::sync::Arc;

use ::image::RgbaImage;

use crate::error::Result;
use crate::geom::{PixelSize, Size};
use crate::source::{PageSource, VectorPageRef};
use crate::units::Unit;

/// A page source backed by a decoded raster image
///
/// The image is decoded once at load time and returned as-is for every
/// rasterization request; scaling a bitmap up would not add detail, so the
/// size hint is ignored.
pub struct ImagePageSource {
    image: Arc<RgbaImage>,
}

impl ImagePageSource {
    /// Decode an image file from disk
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let image = ::image::open(path)?.into_rgba8();
        Ok(Self {
            image: Arc::new(image),
        })
    }

    /// Wrap an already-decoded image
    pub fn from_image(image: RgbaImage) -> Self {
        Self {
            image: Arc::new(image),
        }
    }
}

impl PageSource for ImagePageSource {
    fn size_in_native_units(&self) -> Size {
        let (w, h) = self.image.dimensions();
        Size::new(f64::from(w), f64::from(h))
    }

    fn native_unit(&self) -> Unit {
        Unit::Pixels
    }

    fn allowed_units(&self) -> &[Unit] {
        &[Unit::Pixels]
    }

    fn rasterize(&self, _size_hint: PixelSize) -> Result<Arc<RgbaImage>> {
        Ok(Arc::clone(&self.image))
    }

    fn vector_content(&self) -> Option<VectorPageRef<'_>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_size_is_pixel_dimensions() {
        let source = ImagePageSource::from_image(RgbaImage::new(320, 240));
        let size = source.size_in_native_units();
        assert_eq!(size.width, 320.0);
        assert_eq!(size.height, 240.0);
        assert_eq!(source.native_unit(), Unit::Pixels);
    }

    #[test]
    fn test_rasterize_ignores_hint() {
        let source = ImagePageSource::from_image(RgbaImage::new(10, 10));
        let a = source.rasterize(PixelSize::NATIVE).unwrap();
        let b = source.rasterize(PixelSize::new(5000, 5000)).unwrap();
        assert_eq!(a.dimensions(), (10, 10));
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_no_vector_content() {
        let source = ImagePageSource::from_image(RgbaImage::new(1, 1));
        assert!(source.vector_content().is_none());
    }
}
