//! Convert digital elevation models into terrain meshes.
//!
//! A single-band raster is read through a [`raster::RasterReader`], each cell
//! becomes one vertex, and neighbouring cells are joined into quads or
//! triangle pairs. The result is written as a Wavefront OBJ file meant to be
//! imported as Y forward, Z up.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use dem_mesh::prelude::*;
//!
//! let config = MeshConfig {
//!     input: "srtm_38_03.tif".into(),
//!     output: "alps.obj".into(),
//!     is_wgs84: true,
//!     global_scale: 1000.0,
//!     faces: FaceMode::Triangles,
//!     ..Default::default()
//! };
//! let report = convert(&config)?;
//! println!("{} vertices, {} faces", report.vertex_count, report.face_count);
//! ```
//!
//! The stages are also usable on their own: [`metadata::read_metadata`],
//! [`metadata::normalize_units`], [`sampler::sample_elevations`],
//! [`mesh::Mesh::from_grid`] and [`obj::save_obj`].

pub mod config;
pub mod error;
pub mod mesh;
pub mod metadata;
pub mod obj;
pub mod pipeline;
pub mod raster;
pub mod sampler;

pub use error::{Error, Result};

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::config::MeshConfig;
    pub use crate::error::{ConfigError, DestinationWriteError, Error, SourceReadError};
    pub use crate::mesh::{Face, FaceMode, Mesh, build_faces, build_vertices};
    pub use crate::metadata::{METERS_PER_DEGREE, RasterMetadata, normalize_units, read_metadata};
    pub use crate::obj::{FaceEncoding, save_obj, write_obj};
    pub use crate::pipeline::{ConversionReport, convert, run};
    pub use crate::raster::{
        AsciiGridReader, Band, GeoTiffReader, MemoryRaster, PerlinRaster, RasterHeader,
        RasterReader, open_reader,
    };
    pub use crate::sampler::{ElevationGrid, SamplingParams, Vertex, sample_band, sample_elevations};
}
