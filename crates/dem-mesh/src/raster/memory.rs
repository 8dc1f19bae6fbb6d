//! In-memory raster.

use geo::Rect;

use super::{Band, RasterHeader, RasterReader, ensure_first_band};
use crate::error::SourceReadError;

/// A raster whose cell values are already in memory.
#[derive(Debug, Clone)]
pub struct MemoryRaster {
    name: String,
    width: usize,
    height: usize,
    bounds: Rect<f64>,
    values: Vec<f64>,
}

impl MemoryRaster {
    /// Creates a raster from row-major `values`, row 0 being the northern edge.
    ///
    /// Fails if `values` does not hold exactly `width * height` cells.
    pub fn new(
        name: impl Into<String>,
        width: usize,
        height: usize,
        bounds: Rect<f64>,
        values: Vec<f64>,
    ) -> Result<Self, SourceReadError> {
        let name = name.into();
        if values.len() != width * height {
            return Err(SourceReadError::decode(
                name.as_str(),
                format!(
                    "expected {} cells for a {width}x{height} raster, got {}",
                    width * height,
                    values.len()
                ),
            ));
        }

        Ok(Self {
            name,
            width,
            height,
            bounds,
            values,
        })
    }

    /// Creates a raster from nested rows.
    pub fn from_rows(
        name: impl Into<String>,
        bounds: Rect<f64>,
        rows: &[Vec<f64>],
    ) -> Result<Self, SourceReadError> {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.len());
        let values = rows.iter().flatten().copied().collect();
        Self::new(name, width, height, bounds, values)
    }
}

impl RasterReader for MemoryRaster {
    fn source_name(&self) -> String {
        self.name.clone()
    }

    fn read_header(&self) -> Result<RasterHeader, SourceReadError> {
        Ok(RasterHeader {
            width: self.width,
            height: self.height,
            bounds: self.bounds,
        })
    }

    fn read_band(&self, band: usize) -> Result<Band, SourceReadError> {
        ensure_first_band(self.source_name(), band)?;
        Ok(Band {
            width: self.width,
            height: self.height,
            values: self.values.clone(),
        })
    }
}
