//! Poster tiling for oversized prints
//!
//! Takes one page of input (a raster image or a page of a PDF), crops a
//! region of it, scales the crop to a requested physical size, and splits
//! the result across however many printable sheets it takes. Each sheet can
//! carry registration marks for assembly and a margin mask so overlapping
//! content is not printed twice.
//!
//! # Modules
//!
//! - `source` - Page inputs: raster images and PDF pages, with render caching
//! - `layout` - Tile grid math and per-tile transforms
//! - `surface` - Output abstraction and the PDF-writing implementation
//! - `raster` - The bitmap-stamping compositor, usable with any surface
//! - `vector` - Lossless PDF-to-PDF embedding compositor
//! - `dispatch` - Picks the right compositor for a job
//!
//! The usual entry point is [`generate_pdf`]:
//!
//! ```no_run
//! use postertile::{generate_pdf, CropRegion, OutputSpec, PageGeometry, TileOptions};
//! use postertile::source::ImagePageSource;
//!
//! # fn main() -> postertile::Result<()> {
//! let source = ImagePageSource::open("photo.png")?;
//! let options = TileOptions::default().trim(true).registration_marks(true);
//! generate_pdf(
//!     "poster.pdf",
//!     &PageGeometry::letter(36.0),
//!     &source,
//!     &CropRegion::new(0.0, 0.0, 1920.0, 1080.0),
//!     &OutputSpec::new(1600.0, 900.0),
//!     &options,
//! )?;
//! # Ok(())
//! # }
//! ```

pub mod dispatch;
pub mod error;
pub mod geom;
pub mod layout;
pub mod marks;
pub mod raster;
pub mod source;
pub mod surface;
pub mod units;
pub mod vector;

pub use dispatch::{choose_compositor, generate_pdf, render_to_surface, CompositorKind};
pub use error::{Error, Result};
pub use geom::{Line, Matrix, PixelSize, Point, Rect, Size};
pub use layout::{CropRegion, OutputSpec, PageGeometry, Tile};
pub use raster::TileOptions;
pub use source::{PageSource, VectorPageRef};
pub use surface::{PdfPrintSurface, PrintSurface};
pub use units::Unit;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
