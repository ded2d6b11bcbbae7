//! Tile layout math
//!
//! Maps a crop region of the source page onto a grid of physical sheets.
//! All computation here is in top-left-origin point coordinates; the vector
//! output path gets a bottom-left variant of the per-tile transform because
//! PDF page space has its origin at the bottom-left.

use crate::error::{Error, Result};
use crate::geom::Matrix;

/// A printable area narrower than this is treated as a caller error rather
/// than allowed to produce an unbounded tile count.
const MIN_PRINTABLE_EXTENT: f64 = 1.0;

/// Full sheet size and margins, in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
    pub margin_left: f64,
    pub margin_right: f64,
    pub margin_top: f64,
    pub margin_bottom: f64,
}

impl PageGeometry {
    /// US Letter with the given uniform margin in points
    pub fn letter(margin: f64) -> Self {
        Self::new(612.0, 792.0, margin)
    }

    /// A sheet with a uniform margin on all four sides
    pub fn new(width: f64, height: f64, margin: f64) -> Self {
        Self {
            width,
            height,
            margin_left: margin,
            margin_right: margin,
            margin_top: margin,
            margin_bottom: margin,
        }
    }

    /// Sheet size minus margins on each axis, clamped so oversized margins
    /// collapse the printable area to zero instead of going negative
    pub fn printable_area(&self) -> (f64, f64) {
        let w = (self.width - self.margin_left - self.margin_right).max(0.0);
        let h = (self.height - self.margin_top - self.margin_bottom).max(0.0);
        (w, h)
    }
}

/// The sub-rectangle of the source page selected for output, in the
/// source's native units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRegion {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The transform math divides by the crop extent, so a degenerate crop
    /// must be rejected before any drawing is issued
    pub fn validate(&self) -> Result<()> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(Error::geometry(format!(
                "crop region must have positive extent, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

/// Desired physical size of the assembled poster, in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputSpec {
    pub width: f64,
    pub height: f64,
}

impl OutputSpec {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn validate(&self) -> Result<()> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(Error::geometry(format!(
                "output size must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

/// One physical sheet's position in the tile grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub x: u32,
    pub y: u32,
}

impl Tile {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Number of sheets needed per axis: ceiling of output over printable
pub fn tile_count(output: &OutputSpec, printable: (f64, f64)) -> Result<(u32, u32)> {
    let (pw, ph) = printable;
    if pw < MIN_PRINTABLE_EXTENT || ph < MIN_PRINTABLE_EXTENT {
        return Err(Error::geometry(format!(
            "printable area {pw}x{ph}pt is too small to tile onto"
        )));
    }
    output.validate()?;

    let nx = (output.width / pw).ceil() as u32;
    let ny = (output.height / ph).ceil() as u32;
    Ok((nx.max(1), ny.max(1)))
}

/// Row-major iteration over the tile grid (y outer, x inner)
pub fn tiles(nx: u32, ny: u32) -> impl Iterator<Item = Tile> {
    (0..ny).flat_map(move |y| (0..nx).map(move |x| Tile::new(x, y)))
}

/// Per-tile transform for the raster path, in top-left painter coordinates
///
/// Point-order composition: crop origin to local origin, crop space scaled
/// to output space, shift by this tile's offset into the poster, then shift
/// into the printable area. The constant term for tile (0,0) is therefore
/// exactly (margin_left, margin_top).
pub fn tile_transform(
    tile: Tile,
    crop: &CropRegion,
    output: &OutputSpec,
    geometry: &PageGeometry,
) -> Matrix {
    let (pw, ph) = geometry.printable_area();
    let xt = f64::from(tile.x) * pw;
    let yt = f64::from(tile.y) * ph;

    Matrix::translate(-crop.x, -crop.y)
        .concat(&Matrix::scale(
            output.width / crop.width,
            output.height / crop.height,
        ))
        .concat(&Matrix::translate(-xt, -yt))
        .concat(&Matrix::translate(geometry.margin_left, geometry.margin_top))
}

/// Per-tile transform for the vector path
///
/// Same composition as [`tile_transform`] except the tile row offset is
/// flipped into bottom-left page space and the margin translation uses the
/// bottom margin, because PDF pages put their origin at the bottom-left
/// while the tile grid is ordered top-down.
pub fn tile_transform_pdf(
    tile: Tile,
    crop: &CropRegion,
    output: &OutputSpec,
    geometry: &PageGeometry,
) -> Matrix {
    let (pw, ph) = geometry.printable_area();
    let xt = f64::from(tile.x) * pw;
    let yt = output.height - f64::from(tile.y) * ph - ph;

    Matrix::translate(-crop.x, -crop.y)
        .concat(&Matrix::scale(
            output.width / crop.width,
            output.height / crop.height,
        ))
        .concat(&Matrix::translate(-xt, -yt))
        .concat(&Matrix::translate(
            geometry.margin_left,
            geometry.margin_bottom,
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Point;

    #[test]
    fn test_printable_area_letter() {
        let geometry = PageGeometry::letter(36.0);
        assert_eq!(geometry.printable_area(), (540.0, 720.0));
    }

    #[test]
    fn test_printable_area_clamps_oversized_margins() {
        let geometry = PageGeometry::new(100.0, 100.0, 60.0);
        assert_eq!(geometry.printable_area(), (0.0, 0.0));
    }

    #[test]
    fn test_tile_count_example() {
        // Letter minus 0.5" margins leaves 550x700pt of printable area in
        // the reference scenario
        let output = OutputSpec::new(1600.0, 1200.0);
        let (nx, ny) = tile_count(&output, (550.0, 700.0)).unwrap();
        assert_eq!((nx, ny), (3, 2));
    }

    #[test]
    fn test_tile_count_exact_fit() {
        let output = OutputSpec::new(540.0, 720.0);
        let (nx, ny) = tile_count(&output, (540.0, 720.0)).unwrap();
        assert_eq!((nx, ny), (1, 1));
    }

    #[test]
    fn test_tile_count_rejects_collapsed_printable_area() {
        let output = OutputSpec::new(1000.0, 1000.0);
        assert!(tile_count(&output, (0.0, 720.0)).is_err());
        assert!(tile_count(&output, (540.0, 0.5)).is_err());
    }

    #[test]
    fn test_tile_count_rejects_bad_output() {
        assert!(tile_count(&OutputSpec::new(0.0, 10.0), (540.0, 720.0)).is_err());
    }

    #[test]
    fn test_tiles_row_major() {
        let order: Vec<_> = tiles(2, 2).collect();
        assert_eq!(
            order,
            vec![
                Tile::new(0, 0),
                Tile::new(1, 0),
                Tile::new(0, 1),
                Tile::new(1, 1)
            ]
        );
    }

    #[test]
    fn test_single_tile_identity() {
        // When output size equals crop size the transform is a pure
        // translation by the crop origin (plus the margin shift)
        let geometry = PageGeometry::letter(36.0);
        let crop = CropRegion::new(10.0, 20.0, 540.0, 720.0);
        let output = OutputSpec::new(540.0, 720.0);

        let m = tile_transform(Tile::new(0, 0), &crop, &output, &geometry);
        assert_eq!(m.a, 1.0);
        assert_eq!(m.d, 1.0);
        assert!(m.is_axis_aligned());
        assert_eq!(m.e, 36.0 - 10.0);
        assert_eq!(m.f, 36.0 - 20.0);
    }

    #[test]
    fn test_tile_zero_constant_term_is_margin() {
        let geometry = PageGeometry::letter(36.0);
        let crop = CropRegion::new(0.0, 0.0, 612.0, 792.0);
        let output = OutputSpec::new(612.0, 792.0);

        let m = tile_transform(Tile::new(0, 0), &crop, &output, &geometry);
        let p = m.transform_point(Point::ORIGIN);
        assert_eq!(p, Point::new(36.0, 36.0));
    }

    #[test]
    fn test_tile_offsets_shift_by_printable_area() {
        let geometry = PageGeometry::letter(36.0);
        let crop = CropRegion::new(0.0, 0.0, 1000.0, 1000.0);
        let output = OutputSpec::new(1000.0, 1000.0);
        let (pw, ph) = geometry.printable_area();

        // The crop point that lands at the printable origin of tile (1,1)
        // is the one (pw, ph) into the poster
        let m = tile_transform(Tile::new(1, 1), &crop, &output, &geometry);
        let p = m.transform_point(Point::new(pw, ph));
        assert_eq!(p, Point::new(36.0, 36.0));
    }

    #[test]
    fn test_scale_maps_crop_to_output() {
        let geometry = PageGeometry::letter(36.0);
        let crop = CropRegion::new(0.0, 0.0, 300.0, 400.0);
        let output = OutputSpec::new(600.0, 1200.0);

        let m = tile_transform(Tile::new(0, 0), &crop, &output, &geometry);
        assert_eq!(m.a, 2.0);
        assert_eq!(m.d, 3.0);
    }

    #[test]
    fn test_pdf_transform_flips_rows() {
        let geometry = PageGeometry::letter(36.0);
        let (pw, ph) = geometry.printable_area();
        let crop = CropRegion::new(0.0, 0.0, 1200.0, 1500.0);
        let output = OutputSpec::new(1200.0, 1500.0);
        let (nx, ny) = tile_count(&output, (pw, ph)).unwrap();
        assert_eq!((nx, ny), (3, 3));

        // The top-left grid tile shows the top of the poster, which in
        // bottom-left page space is the largest y offset
        let top = tile_transform_pdf(Tile::new(0, 0), &crop, &output, &geometry);
        let bottom = tile_transform_pdf(Tile::new(0, 2), &crop, &output, &geometry);
        assert!(top.f < bottom.f);
        assert_eq!(top.e, bottom.e);
    }

    #[test]
    fn test_crop_validate() {
        assert!(CropRegion::new(0.0, 0.0, 0.0, 10.0).validate().is_err());
        assert!(CropRegion::new(0.0, 0.0, 10.0, -1.0).validate().is_err());
        assert!(CropRegion::new(5.0, 5.0, 10.0, 10.0).validate().is_ok());
    }
}
