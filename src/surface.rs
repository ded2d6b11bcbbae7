//! Output surfaces for the raster path
//!
//! A [`PrintSurface`] is what the raster compositor draws against: a paged
//! device with a fixed sheet layout, painted in top-left-origin point
//! coordinates. [`PdfPrintSurface`] is the built-in implementation that
//! spools those draws into a PDF file, one page per sheet.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::RgbaImage;
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect as PdfRect, Ref};
use tracing::debug;

use crate::error::{Error, Result};
use crate::geom::{Line, Matrix, Rect};
use crate::layout::PageGeometry;

/// A paged output device painted in top-left point coordinates
///
/// `begin` must be called before any drawing and `finish` after the last
/// page; both may fail, and a failure from `new_page` is fatal for the job
/// while leaving earlier pages committed.
pub trait PrintSurface {
    /// Sheet size and margins of every page this surface produces
    fn page_layout(&self) -> PageGeometry;

    /// Device resolution in dots per inch, used to size raster requests
    fn physical_dpi(&self) -> (f64, f64);

    /// Acquire the underlying target; nothing may be drawn before this
    fn begin(&mut self) -> Result<()>;

    /// Flush the current page and start the next one
    fn new_page(&mut self) -> Result<()>;

    fn save_state(&mut self) -> Result<()>;

    fn restore_state(&mut self) -> Result<()>;

    /// Restrict subsequent drawing (until the matching restore) to a rect
    fn clip_rect(&mut self, rect: Rect) -> Result<()>;

    /// Stroke a thin black line, used for registration marks
    fn stroke_line(&mut self, line: Line) -> Result<()>;

    /// Blit a bitmap through `transform`; the bitmap occupies one unit per
    /// pixel at the local origin, extending down and to the right
    fn draw_image(&mut self, transform: &Matrix, image: &Arc<RgbaImage>) -> Result<()>;

    /// Finalize and release the target
    fn finish(&mut self) -> Result<()>;
}

/// Flate-compressed RGB pixels ready to become an image XObject
struct EncodedImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
    source: Arc<RgbaImage>,
}

/// A [`PrintSurface`] that writes a PDF file
///
/// Pages are spooled as content streams in memory and serialized once on
/// `finish`. Bitmaps are deduplicated by identity, so the one bitmap the
/// raster compositor reuses across tiles is embedded exactly once.
pub struct PdfPrintSurface {
    path: PathBuf,
    geometry: PageGeometry,
    dpi: f64,
    file: Option<File>,
    pages: Vec<Vec<u8>>,
    current: Option<Content>,
    images: Vec<EncodedImage>,
}

impl PdfPrintSurface {
    /// Default device resolution; matches a common photo-print density
    pub const DEFAULT_DPI: f64 = 300.0;

    pub fn new<P: AsRef<Path>>(path: P, geometry: PageGeometry) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            geometry,
            dpi: Self::DEFAULT_DPI,
            file: None,
            pages: Vec::new(),
            current: None,
            images: Vec::new(),
        }
    }

    /// Override the device resolution used for raster size hints
    pub fn with_dpi(mut self, dpi: f64) -> Self {
        self.dpi = dpi;
        self
    }

    /// Fresh page content with the painter's top-left coordinate flip
    fn new_page_content(&self) -> Content {
        let mut content = Content::new();
        content.transform([1.0, 0.0, 0.0, -1.0, 0.0, self.geometry.height as f32]);
        content
    }

    fn content(&mut self) -> Result<&mut Content> {
        self.current
            .as_mut()
            .ok_or_else(|| Error::surface("surface has not been opened"))
    }

    /// Index of the XObject for this bitmap, encoding it on first use
    fn image_index(&mut self, image: &Arc<RgbaImage>) -> usize {
        if let Some(idx) = self
            .images
            .iter()
            .position(|e| Arc::ptr_eq(&e.source, image))
        {
            return idx;
        }

        let (width, height) = image.dimensions();
        // Composite over white and drop alpha; print output has no
        // transparency
        let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
        for pixel in image.pixels() {
            let [r, g, b, a] = pixel.0;
            let a16 = u16::from(a);
            rgb.push(((u16::from(r) * a16 + 255 * (255 - a16)) / 255) as u8);
            rgb.push(((u16::from(g) * a16 + 255 * (255 - a16)) / 255) as u8);
            rgb.push(((u16::from(b) * a16 + 255 * (255 - a16)) / 255) as u8);
        }

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        // Writing to a Vec cannot fail
        let _ = encoder.write_all(&rgb);
        let data = encoder.finish().unwrap_or_default();
        debug!(width, height, bytes = data.len(), "encoded page bitmap");

        self.images.push(EncodedImage {
            width,
            height,
            data,
            source: Arc::clone(image),
        });
        self.images.len() - 1
    }

    fn serialize(&mut self) -> Vec<u8> {
        let mut alloc = 1;
        let mut next_ref = || {
            let r = Ref::new(alloc);
            alloc += 1;
            r
        };

        let catalog_id = next_ref();
        let pages_id = next_ref();
        let image_ids: Vec<Ref> = self.images.iter().map(|_| next_ref()).collect();
        let page_ids: Vec<Ref> = self.pages.iter().map(|_| next_ref()).collect();
        let content_ids: Vec<Ref> = self.pages.iter().map(|_| next_ref()).collect();

        let mut pdf = Pdf::new();
        pdf.catalog(catalog_id).pages(pages_id);
        pdf.pages(pages_id)
            .kids(page_ids.iter().copied())
            .count(page_ids.len() as i32);

        let media_box = PdfRect::new(
            0.0,
            0.0,
            self.geometry.width as f32,
            self.geometry.height as f32,
        );

        for (i, content) in self.pages.iter().enumerate() {
            let mut page = pdf.page(page_ids[i]);
            page.media_box(media_box);
            page.parent(pages_id);
            page.contents(content_ids[i]);
            let mut resources = page.resources();
            let mut xobjects = resources.x_objects();
            for (n, image_id) in image_ids.iter().enumerate() {
                xobjects.pair(Name(format!("Im{n}").as_bytes()), *image_id);
            }
            xobjects.finish();
            resources.finish();
            page.finish();

            pdf.stream(content_ids[i], content);
        }

        for (i, encoded) in self.images.iter().enumerate() {
            let mut xobject = pdf.image_xobject(image_ids[i], &encoded.data);
            xobject.filter(Filter::FlateDecode);
            xobject.width(encoded.width as i32);
            xobject.height(encoded.height as i32);
            xobject.color_space().device_rgb();
            xobject.bits_per_component(8);
            xobject.finish();
        }

        pdf.finish()
    }
}

impl PrintSurface for PdfPrintSurface {
    fn page_layout(&self) -> PageGeometry {
        self.geometry
    }

    fn physical_dpi(&self) -> (f64, f64) {
        (self.dpi, self.dpi)
    }

    fn begin(&mut self) -> Result<()> {
        let file = File::create(&self.path)
            .map_err(|e| Error::surface(format!("failed to open {}: {e}", self.path.display())))?;
        self.file = Some(file);
        self.current = Some(self.new_page_content());
        Ok(())
    }

    fn new_page(&mut self) -> Result<()> {
        let finished = self
            .current
            .take()
            .ok_or_else(|| Error::surface("surface has not been opened"))?;
        self.pages.push(finished.finish());
        self.current = Some(self.new_page_content());
        Ok(())
    }

    fn save_state(&mut self) -> Result<()> {
        self.content()?.save_state();
        Ok(())
    }

    fn restore_state(&mut self) -> Result<()> {
        self.content()?.restore_state();
        Ok(())
    }

    fn clip_rect(&mut self, rect: Rect) -> Result<()> {
        let content = self.content()?;
        content.rect(
            rect.x as f32,
            rect.y as f32,
            rect.width as f32,
            rect.height as f32,
        );
        content.clip_nonzero();
        content.end_path();
        Ok(())
    }

    fn stroke_line(&mut self, line: Line) -> Result<()> {
        let content = self.content()?;
        content.save_state();
        content.set_line_width(1.0);
        content.set_stroke_gray(0.0);
        content.move_to(line.x1 as f32, line.y1 as f32);
        content.line_to(line.x2 as f32, line.y2 as f32);
        content.stroke();
        content.restore_state();
        Ok(())
    }

    fn draw_image(&mut self, transform: &Matrix, image: &Arc<RgbaImage>) -> Result<()> {
        let index = self.image_index(image);
        let (iw, ih) = image.dimensions();

        let content = self.content()?;
        content.save_state();
        let [a, b, c, d, e, f] = transform.coefficients();
        content.transform([a as f32, b as f32, c as f32, d as f32, e as f32, f as f32]);
        // Unit image square to a y-down pixel box at the local origin
        content.transform([iw as f32, 0.0, 0.0, -(ih as f32), 0.0, ih as f32]);
        content.x_object(Name(format!("Im{index}").as_bytes()));
        content.restore_state();
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let finished = self
            .current
            .take()
            .ok_or_else(|| Error::surface("surface has not been opened"))?;
        self.pages.push(finished.finish());

        let bytes = self.serialize();
        let mut file = self
            .file
            .take()
            .ok_or_else(|| Error::surface("surface has not been opened"))?;
        file.write_all(&bytes)
            .map_err(|e| Error::surface(format!("failed to write {}: {e}", self.path.display())))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_before_begin_fails() {
        let mut surface = PdfPrintSurface::new("/nonexistent/out.pdf", PageGeometry::letter(36.0));
        assert!(surface.save_state().is_err());
    }

    #[test]
    fn test_begin_unwritable_path_fails() {
        let mut surface = PdfPrintSurface::new(
            "/nonexistent-dir/deeper/out.pdf",
            PageGeometry::letter(36.0),
        );
        assert!(surface.begin().is_err());
    }

    #[test]
    fn test_single_page_pdf_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.pdf");

        let mut surface = PdfPrintSurface::new(&path, PageGeometry::letter(36.0));
        surface.begin().unwrap();
        surface
            .stroke_line(Line::new(0.0, 36.0, 32.4, 36.0))
            .unwrap();
        // Qualified call: pdf-writer's blanket `Finish` trait is in scope
        // here and would otherwise shadow the surface method
        PrintSurface::finish(&mut surface).unwrap();

        let doc = lopdf::Document::load(&path).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_image_deduplicated_across_pages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiles.pdf");

        let image = Arc::new(RgbaImage::new(4, 4));
        let mut surface = PdfPrintSurface::new(&path, PageGeometry::letter(36.0));
        surface.begin().unwrap();
        surface.draw_image(&Matrix::IDENTITY, &image).unwrap();
        surface.new_page().unwrap();
        surface.draw_image(&Matrix::IDENTITY, &image).unwrap();
        PrintSurface::finish(&mut surface).unwrap();

        assert_eq!(surface.images.len(), 1);

        let doc = lopdf::Document::load(&path).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }
}
