//! Raster metadata and unit normalization.

use geo::Rect;
use tracing::{debug, info};

use crate::error::SourceReadError;
use crate::raster::{RasterHeader, RasterReader, bounds_from_edges};

/// Approximate meters per degree used to turn angular cell sizes into meters.
///
/// This is the length of a degree of latitude. It is applied to both axes
/// without any latitude correction, so east-west distances are overstated
/// away from the equator.
pub const METERS_PER_DEGREE: f64 = 110_000.0;

/// Dimensions, extent and cell size of the source raster.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterMetadata {
    /// Source identifier, e.g. the input path.
    pub source_name: String,
    /// Width in cells.
    pub width: usize,
    /// Height in cells.
    pub height: usize,
    /// Extent in source units (degrees or meters). Never rescaled.
    pub bounds: Rect<f64>,
    /// East-west size of one cell in meters (after normalization).
    pub cell_size_x: f64,
    /// North-south size of one cell in meters (after normalization).
    pub cell_size_y: f64,
}

impl RasterMetadata {
    /// Derives metadata from a raster header.
    ///
    /// Cell sizes are always the extent divided by the cell count; any
    /// per-pixel resolution the format carries is ignored.
    pub fn from_header(
        source_name: impl Into<String>,
        header: &RasterHeader,
    ) -> Result<Self, SourceReadError> {
        let source_name = source_name.into();
        if header.width == 0 || header.height == 0 {
            return Err(SourceReadError::InvalidExtent {
                source_name,
                message: format!("empty raster ({}x{})", header.width, header.height),
            });
        }
        // Readers may hand over any `Rect`, including zero-extent ones.
        let (min, max) = (header.bounds.min(), header.bounds.max());
        bounds_from_edges(&source_name, min.x, max.x, max.y, min.y)?;

        let cell_size_x = header.bounds.width() / header.width as f64;
        let cell_size_y = header.bounds.height() / header.height as f64;

        Ok(Self {
            source_name,
            width: header.width,
            height: header.height,
            bounds: header.bounds,
            cell_size_x,
            cell_size_y,
        })
    }

    pub fn left(&self) -> f64 {
        self.bounds.min().x
    }

    pub fn right(&self) -> f64 {
        self.bounds.max().x
    }

    pub fn top(&self) -> f64 {
        self.bounds.max().y
    }

    pub fn bottom(&self) -> f64 {
        self.bounds.min().y
    }

    /// Total east-west extent in meters.
    pub fn total_width_m(&self) -> f64 {
        self.cell_size_x * self.width as f64
    }

    /// Total north-south extent in meters.
    pub fn total_height_m(&self) -> f64 {
        self.cell_size_y * self.height as f64
    }

    /// Number of grid cells, which is also the number of mesh vertices.
    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }
}

/// Reads the raster header and derives [`RasterMetadata`].
pub fn read_metadata(reader: &dyn RasterReader) -> Result<RasterMetadata, SourceReadError> {
    let source_name = reader.source_name();
    info!("Reading image metadata from {}", source_name);

    let header = reader.read_header()?;
    let metadata = RasterMetadata::from_header(source_name, &header)?;

    debug!(
        width = metadata.width,
        height = metadata.height,
        cell_size_x = metadata.cell_size_x,
        cell_size_y = metadata.cell_size_y,
        "Derived raster metadata"
    );
    Ok(metadata)
}

/// Converts cell sizes to meters when the source coordinates are in degrees.
///
/// With `angular == false` the metadata is returned unchanged.
pub fn normalize_units(mut metadata: RasterMetadata, angular: bool) -> RasterMetadata {
    info!("Adjusting scales, if needed");
    if angular {
        metadata.cell_size_x *= METERS_PER_DEGREE;
        metadata.cell_size_y *= METERS_PER_DEGREE;
    }
    metadata
}
