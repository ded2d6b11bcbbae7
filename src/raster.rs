//! Raster tile compositor
//!
//! Renders the cropped source once as a bitmap and draws it, suitably
//! transformed, onto every sheet of the tile grid. Works against any
//! [`PrintSurface`]; the bitmap is requested at a pixel density matched to
//! the surface so each sheet prints at full device resolution.

use tracing::debug;

use crate::error::{Error, Result};
use crate::geom::{Matrix, PixelSize, Rect};
use crate::layout::{self, CropRegion, OutputSpec};
use crate::marks::registration_mark_lines;
use crate::source::PageSource;
use crate::surface::PrintSurface;

/// Per-job sheet decoration switches
///
/// Both default to off; a bare job prints the image edge to edge of each
/// sheet's printable area with no cut guides.
#[derive(Debug, Clone, Copy, Default)]
pub struct TileOptions {
    /// Mask the unprintable border so overlapping content is not doubled
    pub trim: bool,
    /// Stroke alignment guides in the margins of every sheet
    pub registration_marks: bool,
}

impl TileOptions {
    #[must_use]
    pub fn trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    #[must_use]
    pub fn registration_marks(mut self, marks: bool) -> Self {
        self.registration_marks = marks;
        self
    }
}

/// Render every sheet of the poster onto `surface`
///
/// The surface is opened, drawn to one page per tile in row-major order,
/// and finalized. A failure to open or to advance a page aborts the job;
/// pages already emitted stay with the surface.
pub fn render(
    surface: &mut dyn PrintSurface,
    source: &dyn PageSource,
    crop: &CropRegion,
    output: &OutputSpec,
    options: &TileOptions,
) -> Result<()> {
    crop.validate()?;
    output.validate()?;

    surface.begin()?;

    let geometry = surface.page_layout();
    let printable = geometry.printable_area();
    let (tiles_x, tiles_y) = layout::tile_count(output, printable)?;

    // Ask for a bitmap whose density matches the device resolution after
    // the crop is blown up to the output size, so the one render carries
    // enough detail for every sheet
    let (dpi_x, dpi_y) = surface.physical_dpi();
    let native = source.size_in_native_units();
    let hint = PixelSize::new(
        (native.width * dpi_x * output.width / (crop.width * 72.0)).round() as u32,
        (native.height * dpi_y * output.height / (crop.height * 72.0)).round() as u32,
    );
    let image = source.rasterize(hint)?;
    let (image_w, image_h) = image.dimensions();

    debug!(
        tiles_x,
        tiles_y,
        hint_w = hint.width,
        hint_h = hint.height,
        bitmap_w = image_w,
        bitmap_h = image_h,
        "rendering raster tiles"
    );

    for tile in layout::tiles(tiles_x, tiles_y) {
        if tile.x > 0 || tile.y > 0 {
            surface.new_page().map_err(|e| {
                Error::surface(format!("failed to flush sheet ({}, {}): {e}", tile.x, tile.y))
            })?;
        }

        if options.registration_marks {
            for line in registration_mark_lines(&geometry) {
                surface.stroke_line(line)?;
            }
        }

        surface.save_state()?;

        if options.trim {
            surface.clip_rect(Rect::new(
                geometry.margin_left,
                geometry.margin_top,
                printable.0,
                printable.1,
            ))?;
        }

        // The bitmap may not be exactly the hinted size (degraded renders,
        // fixed images), so lead with a pixel-to-native-unit scale and let
        // the tile transform see native coordinates
        let pixel_to_native = Matrix::scale(
            native.width / f64::from(image_w),
            native.height / f64::from(image_h),
        );
        let transform =
            pixel_to_native.concat(&layout::tile_transform(tile, crop, output, &geometry));

        surface.draw_image(&transform, &image)?;
        surface.restore_state()?;
    }

    surface.finish()
}
