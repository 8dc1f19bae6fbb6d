//! Error types for the DEM to mesh pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Failures while opening or decoding the elevation raster.
#[derive(Debug, Error)]
pub enum SourceReadError {
    #[error("Failed to open raster {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode raster {path}: {message}")]
    Decode { path: PathBuf, message: String },

    #[error("Raster {source_name} has no band {band}")]
    MissingBand { source_name: String, band: usize },

    #[error(
        "Raster dimensions do not match: expected {expected_width}x{expected_height}, got {width}x{height}"
    )]
    DimensionMismatch {
        expected_width: usize,
        expected_height: usize,
        width: usize,
        height: usize,
    },

    #[error("Raster {source_name} has an invalid extent: {message}")]
    InvalidExtent { source_name: String, message: String },

    #[error("Unsupported raster format: .{extension}")]
    UnsupportedFormat { extension: String },
}

impl SourceReadError {
    pub fn decode(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Failures while writing the mesh file.
#[derive(Debug, Error)]
pub enum DestinationWriteError {
    #[error("Failed to create output file {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write output file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures while loading or validating the static configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    SourceRead(#[from] SourceReadError),

    #[error(transparent)]
    DestinationWrite(#[from] DestinationWriteError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, Error>;
