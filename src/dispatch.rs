//! Compositor dispatch
//!
//! Chooses between the vector and raster paths for a job. The vector path
//! needs both a PDF file destination and a source that can hand over its
//! native vector content; every other combination rasterizes.

use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::layout::{CropRegion, OutputSpec, PageGeometry};
use crate::raster::{self, TileOptions};
use crate::source::PageSource;
use crate::surface::{PdfPrintSurface, PrintSurface};
use crate::vector;

/// Which compositor a job will run through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositorKind {
    /// Embed the source's vector content directly into the output PDF
    Vector,
    /// Rasterize once and stamp the bitmap onto every sheet
    Raster,
}

/// Pick the compositor for a destination and source pairing
///
/// `pdf_file_output` is true when the destination is a PDF file rather
/// than some other print surface. Vector embedding needs both that and a
/// vector-capable source.
pub fn choose_compositor(pdf_file_output: bool, source: &dyn PageSource) -> CompositorKind {
    if pdf_file_output && source.vector_content().is_some() {
        CompositorKind::Vector
    } else {
        CompositorKind::Raster
    }
}

/// Render the tiled poster to a PDF file at `path`
///
/// PDF-backed sources are embedded losslessly; image sources go through
/// the raster surface.
pub fn generate_pdf<P: AsRef<Path>>(
    path: P,
    geometry: &PageGeometry,
    source: &dyn PageSource,
    crop: &CropRegion,
    output: &OutputSpec,
    options: &TileOptions,
) -> Result<()> {
    let path = path.as_ref();
    match choose_compositor(true, source) {
        CompositorKind::Vector => {
            info!(path = %path.display(), "generating poster via vector embedding");
            vector::render(path, geometry, source, crop, output, options)
        }
        CompositorKind::Raster => {
            info!(path = %path.display(), "generating poster via rasterization");
            let mut surface = PdfPrintSurface::new(path, *geometry);
            raster::render(&mut surface, source, crop, output, options)
        }
    }
}

/// Render the tiled poster onto an already-constructed surface
///
/// Surfaces other than a PDF file cannot take embedded vector content, so
/// this always rasterizes.
pub fn render_to_surface(
    surface: &mut dyn PrintSurface,
    source: &dyn PageSource,
    crop: &CropRegion,
    output: &OutputSpec,
    options: &TileOptions,
) -> Result<()> {
    raster::render(surface, source, crop, output, options)
}
