//! Perlin noise terrain exposed as a raster.

use geo::{Rect, coord};
use noise::{NoiseFn, Perlin};

use super::{Band, RasterHeader, RasterReader, ensure_first_band};
use crate::error::SourceReadError;

/// Synthesises a DEM over a longitude/latitude box using Perlin noise.
///
/// Several octaves are summed (fractal Brownian motion) so the surface has
/// both large-scale ridges and small-scale variation. Bounds are in degrees,
/// so pipelines reading this source should normalize units as WGS84.
#[derive(Debug, Clone)]
pub struct PerlinRaster {
    perlin: Perlin,
    bounds: Rect<f64>,
    width: usize,
    height: usize,
    /// Base elevation in meters (e.g., valley floor).
    base_elevation: f64,
    /// Amplitude of the variation around the base.
    height_scale: f64,
    /// Spatial frequency in cycles per degree.
    frequency: f64,
    octaves: u32,
}

impl PerlinRaster {
    /// Creates a `width` x `height` raster covering `bounds` (x = longitude,
    /// y = latitude).
    pub fn new(seed: u32, bounds: Rect<f64>, width: usize, height: usize) -> Self {
        Self {
            perlin: Perlin::new(seed),
            bounds,
            width,
            height,
            base_elevation: 1500.0,
            height_scale: 500.0,
            frequency: 8.0,
            octaves: 4,
        }
    }

    /// Foothills around Boulder, CO.
    pub fn boulder(seed: u32, width: usize, height: usize) -> Self {
        let bounds = Rect::new(
            coord! { x: -105.5, y: 39.9 },
            coord! { x: -105.2, y: 40.1 },
        );
        Self::new(seed, bounds, width, height)
            .with_base_elevation(1650.0)
            .with_height_scale(600.0)
    }

    /// Sierra Nevada terrain around Lake Tahoe.
    pub fn reno_tahoe(seed: u32, width: usize, height: usize) -> Self {
        let bounds = Rect::new(
            coord! { x: -120.5, y: 39.0 },
            coord! { x: -119.5, y: 39.6 },
        );
        Self::new(seed, bounds, width, height)
            .with_base_elevation(1900.0)
            .with_height_scale(800.0)
            .with_octaves(5)
    }

    pub fn with_base_elevation(mut self, elevation: f64) -> Self {
        self.base_elevation = elevation;
        self
    }

    pub fn with_height_scale(mut self, scale: f64) -> Self {
        self.height_scale = scale;
        self
    }

    pub fn with_frequency(mut self, freq: f64) -> Self {
        self.frequency = freq;
        self
    }

    pub fn with_octaves(mut self, octaves: u32) -> Self {
        self.octaves = octaves;
        self
    }

    /// Elevation at a longitude/latitude coordinate.
    pub fn elevation_at(&self, lon: f64, lat: f64) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = self.frequency;
        let mut max_amplitude = 0.0;

        for _ in 0..self.octaves {
            total += self.perlin.get([lon * frequency, lat * frequency]) * amplitude;
            max_amplitude += amplitude;
            amplitude *= 0.5;
            frequency *= 2.0;
        }

        let normalized = if max_amplitude > 0.0 {
            total / max_amplitude
        } else {
            0.0
        };
        self.base_elevation + normalized * self.height_scale
    }

    /// Longitude/latitude of the centre of cell `(col, row)`.
    fn cell_center(&self, col: usize, row: usize) -> (f64, f64) {
        let cell_w = self.bounds.width() / self.width as f64;
        let cell_h = self.bounds.height() / self.height as f64;
        let lon = self.bounds.min().x + (col as f64 + 0.5) * cell_w;
        let lat = self.bounds.max().y - (row as f64 + 0.5) * cell_h;
        (lon, lat)
    }
}

impl RasterReader for PerlinRaster {
    fn source_name(&self) -> String {
        format!("perlin:{}x{}", self.width, self.height)
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

        let mut values = Vec::with_capacity(self.width * self.height);
        for row in 0..self.height {
            for col in 0..self.width {
                let (lon, lat) = self.cell_center(col, row);
                values.push(self.elevation_at(lon, lat));
            }
        }

        Ok(Band {
            width: self.width,
            height: self.height,
            values,
        })
    }
}
