//! Registration mark generation
//!
//! Each sheet gets eight short tick marks framing the corners of the
//! printable area so the tiles can be aligned by hand when the poster is
//! assembled. Marks live entirely inside the margins.

use crate::geom::Line;
use crate::layout::PageGeometry;

/// Marks stop at 90% of the margin so they never run into the print area
const CAUTION_FACTOR: f64 = 0.9;

/// The eight registration segments for a sheet, in top-left coordinates
///
/// Pure function of the geometry; identical input gives identical output.
pub fn registration_mark_lines(geometry: &PageGeometry) -> [Line; 8] {
    let pw = geometry.width;
    let ph = geometry.height;
    let ml = geometry.margin_left;
    let mr = geometry.margin_right;
    let mt = geometry.margin_top;
    let mb = geometry.margin_bottom;
    let cf = CAUTION_FACTOR;

    [
        Line::new(0.0, mt, ml * cf, mt),
        Line::new(ml, 0.0, ml, mt * cf),
        Line::new(pw, mt, pw - mr * cf, mt),
        Line::new(pw - mr, 0.0, pw - mr, mt * cf),
        Line::new(0.0, ph - mb, ml * cf, ph - mb),
        Line::new(ml, ph, ml, ph - mb * cf),
        Line::new(pw, ph - mb, pw - mr * cf, ph - mb),
        Line::new(pw - mr, ph, pw - mr, ph - mb * cf),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn test_eight_segments() {
        let lines = registration_mark_lines(&PageGeometry::letter(36.0));
        assert_eq!(lines.len(), 8);
    }

    #[test]
    fn test_marks_stay_inside_margins() {
        let geometry = PageGeometry::letter(36.0);
        let (pw, ph) = (geometry.width, geometry.height);
        for line in registration_mark_lines(&geometry) {
            for (x, y) in [(line.x1, line.y1), (line.x2, line.y2)] {
                // Every endpoint is either inside a margin band or on the
                // sheet edge, never inside the printable area
                let in_x_band = x <= geometry.margin_left || x >= pw - geometry.margin_right;
                let in_y_band = y <= geometry.margin_top || y >= ph - geometry.margin_bottom;
                assert!(in_x_band || in_y_band);
            }
        }
    }

    #[test]
    fn test_point_symmetry_with_equal_margins() {
        // With equal margins the mark set maps onto itself under a 180-deg
        // rotation about the sheet center
        let geometry = PageGeometry::new(612.0, 792.0, 36.0);
        let lines = registration_mark_lines(&geometry);
        let (cx, cy) = (geometry.width / 2.0, geometry.height / 2.0);

        for line in &lines {
            let rx1 = 2.0 * cx - line.x1;
            let ry1 = 2.0 * cy - line.y1;
            let rx2 = 2.0 * cx - line.x2;
            let ry2 = 2.0 * cy - line.y2;

            let found = lines.iter().any(|other| {
                let fwd = (other.x1 - rx1).abs() < 1e-9
                    && (other.y1 - ry1).abs() < 1e-9
                    && (other.x2 - rx2).abs() < 1e-9
                    && (other.y2 - ry2).abs() < 1e-9;
                let rev = (other.x1 - rx2).abs() < 1e-9
                    && (other.y1 - ry2).abs() < 1e-9
                    && (other.x2 - rx1).abs() < 1e-9
                    && (other.y2 - ry1).abs() < 1e-9;
                fwd || rev
            });
            assert!(found, "no rotated partner for {line:?}");
        }
    }

    #[test]
    fn test_caution_factor_shortens_marks() {
        let geometry = PageGeometry::letter(40.0);
        let lines = registration_mark_lines(&geometry);
        // First segment runs from the left edge toward the left margin
        assert_close(lines[0].x2, 36.0);
        assert_close(lines[0].y1, 40.0);
    }
}
