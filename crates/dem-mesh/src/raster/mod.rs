//! Raster sources.
//!
//! The pipeline never decodes raster formats itself. It talks to a
//! [`RasterReader`], which exposes the header (dimensions and bounds) and the
//! cell values of a single band:
//! - [`GeoTiffReader`]: GeoTIFF files, georeferenced through the model tie
//!   point, pixel scale or transformation tags
//! - [`AsciiGridReader`]: ESRI ASCII grids (`.asc`)
//! - [`MemoryRaster`]: values already held in memory
//! - [`PerlinRaster`]: synthetic fBm terrain, useful for demos and tests

mod ascii_grid;
mod geotiff;
mod memory;
mod synthetic;

use std::path::Path;

use geo::{Rect, coord};

use crate::error::SourceReadError;

pub use ascii_grid::AsciiGridReader;
pub use geotiff::GeoTiffReader;
pub use memory::MemoryRaster;
pub use synthetic::PerlinRaster;

/// The only band a DEM carries.
pub const FIRST_BAND: usize = 1;

/// Dimensions and spatial extent of a raster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterHeader {
    /// Width in cells.
    pub width: usize,
    /// Height in cells.
    pub height: usize,
    /// Spatial extent in source units. `min` is the bottom-left corner.
    pub bounds: Rect<f64>,
}

/// One band of cell values in row-major order, row 0 being the northern edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    pub width: usize,
    pub height: usize,
    pub values: Vec<f64>,
}

impl Band {
    /// Value at `(col, row)`.
    pub fn value(&self, col: usize, row: usize) -> f64 {
        self.values[row * self.width + col]
    }
}

/// A readable single-band raster.
///
/// Each call opens the underlying source and releases it before returning,
/// so no handle outlives a read, even when the read fails.
pub trait RasterReader {
    /// Identifier used in progress messages and errors.
    fn source_name(&self) -> String;

    /// Reads width, height and bounds.
    fn read_header(&self) -> Result<RasterHeader, SourceReadError>;

    /// Reads a full band into memory. Bands are numbered from 1.
    fn read_band(&self, band: usize) -> Result<Band, SourceReadError>;
}

/// Picks a reader for `path` based on its extension.
pub fn open_reader(path: &Path) -> Result<Box<dyn RasterReader>, SourceReadError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "tif" | "tiff" | "geotiff" => Ok(Box::new(GeoTiffReader::new(path))),
        "asc" | "grd" => Ok(Box::new(AsciiGridReader::new(path))),
        _ => Err(SourceReadError::UnsupportedFormat { extension }),
    }
}

/// Builds bounds from edge coordinates, rejecting empty or inverted extents.
///
/// `Rect::new` silently reorders its corners, so the orientation check has to
/// happen here.
pub fn bounds_from_edges(
    source_name: &str,
    left: f64,
    right: f64,
    top: f64,
    bottom: f64,
) -> Result<Rect<f64>, SourceReadError> {
    let invalid = |message: String| SourceReadError::InvalidExtent {
        source_name: source_name.to_string(),
        message,
    };

    if ![left, right, top, bottom].iter().all(|v| v.is_finite()) {
        return Err(invalid(format!(
            "non-finite bounds (left={left}, right={right}, top={top}, bottom={bottom})"
        )));
    }
    if right <= left {
        return Err(invalid(format!("right ({right}) must exceed left ({left})")));
    }
    if top <= bottom {
        return Err(invalid(format!("top ({top}) must exceed bottom ({bottom})")));
    }

    Ok(Rect::new(
        coord! { x: left, y: bottom },
        coord! { x: right, y: top },
    ))
}

/// Rejects band numbers other than [`FIRST_BAND`].
pub(crate) fn ensure_first_band(source_name: String, band: usize) -> Result<(), SourceReadError> {
    if band == FIRST_BAND {
        Ok(())
    } else {
        Err(SourceReadError::MissingBand { source_name, band })
    }
}
