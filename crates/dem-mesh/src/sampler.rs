//! Elevation sampling: raster cells to 3D vertex positions.
//!
//! Every cell `(col, row)` becomes one position. X grows eastwards with the
//! column, Y grows northwards (so it is the negated row offset), and Z is the
//! elevation, all divided by the global scale. Z is additionally multiplied
//! by the vertical exaggeration.

use rand::Rng;
use rand_distr::{Distribution, Uniform};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::SourceReadError;
use crate::metadata::RasterMetadata;
use crate::raster::{Band, RasterReader};

/// A mesh vertex position in output units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vertex {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vertex {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Immutable settings for [`sample_band`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    /// Real-world meters per output unit. Must be positive.
    pub global_scale: f64,
    /// Multiplier applied to Z only.
    pub vertical_exaggeration: f64,
    /// Elevations below this are raised to it.
    pub min_elevation: f64,
    /// Jitter as a fraction of the north-south cell size, if enabled.
    pub jitter_amount: Option<f64>,
    /// Whether the minimum elevation also applies to jittered vertices.
    pub clamp_jittered: bool,
    /// Sample unjittered grids on the rayon pool.
    pub parallel: bool,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            global_scale: 1.0,
            vertical_exaggeration: 1.0,
            min_elevation: 0.0,
            jitter_amount: None,
            clamp_jittered: true,
            parallel: false,
        }
    }
}

/// Vertex positions for every raster cell, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationGrid {
    width: usize,
    height: usize,
    positions: Vec<Vertex>,
}

impl ElevationGrid {
    /// Wraps row-major positions. `positions.len()` must equal `width * height`.
    pub fn new(
        width: usize,
        height: usize,
        positions: Vec<Vertex>,
    ) -> Result<Self, SourceReadError> {
        // A wrong-length run is reported as a single row of that length.
        if positions.len() != width * height {
            return Err(SourceReadError::DimensionMismatch {
                expected_width: width,
                expected_height: height,
                width: positions.len(),
                height: 1,
            });
        }
        Ok(Self {
            width,
            height,
            positions,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Linear index of `(col, row)`.
    pub fn index(&self, col: usize, row: usize) -> usize {
        row * self.width + col
    }

    /// Position of cell `(col, row)`, or `None` outside the grid.
    pub fn get(&self, col: usize, row: usize) -> Option<Vertex> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.positions.get(self.index(col, row)).copied()
    }

    /// Positions in row-major order.
    pub fn positions(&self) -> &[Vertex] {
        &self.positions
    }

    pub fn into_positions(self) -> Vec<Vertex> {
        self.positions
    }
}

/// Reads `band` from `reader` and samples it into an [`ElevationGrid`].
///
/// The band dimensions must match `metadata`, which was read earlier from
/// the same source.
pub fn sample_elevations<R: Rng + ?Sized>(
    reader: &dyn RasterReader,
    metadata: &RasterMetadata,
    band: usize,
    params: &SamplingParams,
    rng: &mut R,
) -> Result<ElevationGrid, SourceReadError> {
    info!("Reading in raster data from {}", metadata.source_name);
    let band = reader.read_band(band)?;
    sample_band(&band, metadata, params, rng)
}

/// Computes vertex positions for every cell of an in-memory band.
///
/// `rng` is only drawn from when jitter is enabled: one draw for X, then one
/// for Y, per vertex in row-major order.
pub fn sample_band<R: Rng + ?Sized>(
    band: &Band,
    metadata: &RasterMetadata,
    params: &SamplingParams,
    rng: &mut R,
) -> Result<ElevationGrid, SourceReadError> {
    if band.width != metadata.width
        || band.height != metadata.height
        || band.values.len() != band.width * band.height
    {
        return Err(SourceReadError::DimensionMismatch {
            expected_width: metadata.width,
            expected_height: metadata.height,
            width: band.width,
            height: band.height,
        });
    }

    let positions = match params.jitter_amount {
        Some(amount) => sample_jittered(band, metadata, params, amount, rng),
        None if params.parallel => sample_plain_parallel(band, metadata, params),
        None => sample_plain(band, metadata, params),
    };

    debug!("Sampled {} vertex positions", positions.len());
    ElevationGrid::new(band.width, band.height, positions)
}

/// Unjittered position of one cell.
fn plain_position(
    col: usize,
    row: usize,
    elevation: f64,
    metadata: &RasterMetadata,
    params: &SamplingParams,
) -> Vertex {
    let gs = 1.0 / params.global_scale;
    let x = col as f64 * metadata.cell_size_x * gs;
    // Adding +0.0 turns the row-0 negative zero into a positive one.
    let y = -(row as f64 * metadata.cell_size_y) * gs + 0.0;
    let z = elevation.max(params.min_elevation) * gs * params.vertical_exaggeration;
    Vertex::new(x, y, z)
}

fn sample_plain(band: &Band, metadata: &RasterMetadata, params: &SamplingParams) -> Vec<Vertex> {
    let mut positions = Vec::with_capacity(band.values.len());
    for row in 0..band.height {
        for col in 0..band.width {
            positions.push(plain_position(col, row, band.value(col, row), metadata, params));
        }
    }
    positions
}

fn sample_plain_parallel(
    band: &Band,
    metadata: &RasterMetadata,
    params: &SamplingParams,
) -> Vec<Vertex> {
    let width = band.width;
    band.values
        .par_iter()
        .enumerate()
        .map(|(i, &elevation)| plain_position(i % width, i / width, elevation, metadata, params))
        .collect()
}

fn sample_jittered<R: Rng + ?Sized>(
    band: &Band,
    metadata: &RasterMetadata,
    params: &SamplingParams,
    amount: f64,
    rng: &mut R,
) -> Vec<Vertex> {
    let gs = 1.0 / params.global_scale;
    let jitter = amount * metadata.cell_size_y * 2.0;
    let half_jitter = jitter * 0.5;
    let unit = Uniform::new(0.0, 1.0);

    let mut positions = Vec::with_capacity(band.values.len());
    for row in 0..band.height {
        for col in 0..band.width {
            // X is drawn before Y for each vertex.
            let x = (col as f64 * metadata.cell_size_x - half_jitter + unit.sample(rng) * jitter) * gs;
            let y =
                (-(row as f64 * metadata.cell_size_y) - half_jitter + unit.sample(rng) * jitter) * gs;

            let raw = band.value(col, row);
            let elevation = if params.clamp_jittered {
                raw.max(params.min_elevation)
            } else {
                raw
            };
            let z = elevation * gs * params.vertical_exaggeration;
            positions.push(Vertex::new(x, y, z));
        }
    }
    positions
}
