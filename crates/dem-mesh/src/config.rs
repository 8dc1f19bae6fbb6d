//! Static conversion settings.
//!
//! Settings are read once before the pipeline starts, either from defaults
//! or from a JSON file, and handed to each stage as immutable values.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ConfigError;
use crate::mesh::FaceMode;
use crate::metadata::RasterMetadata;
use crate::obj::FaceEncoding;
use crate::sampler::SamplingParams;

/// Jitter amounts at or above this visibly tear the surface.
pub const RECOMMENDED_MAX_JITTER: f64 = 0.3;

/// Settings for one DEM to OBJ conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    /// Raster to read.
    pub input: PathBuf,

    /// Mesh file to write. Overwritten if it exists.
    pub output: PathBuf,

    /// Source X/Y are in degrees while Z is in meters.
    pub is_wgs84: bool,

    /// Quads, or two triangles per quad.
    pub faces: FaceMode,

    /// Repeat the first index at the end of each face record.
    pub close_faces: bool,

    /// Real-world meters per output unit (1000 means 1 unit = 1 km).
    pub global_scale: f64,

    /// Multiplier applied to elevations only.
    pub vertical_exaggeration: f64,

    /// Randomly offset X/Y of each vertex.
    pub enable_jitter: bool,

    /// Jitter as a fraction of the cell size, e.g. 0.05 = 1/20th of a cell.
    pub jitter_amount: f64,

    /// Fixed seed for reproducible jitter.
    pub jitter_seed: Option<u64>,

    /// Elevations below this are raised to it. Zero removes bathymetry.
    pub min_elevation: f64,

    /// Apply `min_elevation` to jittered vertices too.
    pub clamp_jittered: bool,

    /// Sample unjittered grids in parallel.
    pub parallel: bool,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("./dem.tif"),
            output: PathBuf::from("./dem.obj"),
            is_wgs84: false,
            faces: FaceMode::Quads,
            close_faces: false,
            global_scale: 100.0,
            vertical_exaggeration: 1.0,
            enable_jitter: false,
            jitter_amount: 0.1,
            jitter_seed: None,
            min_elevation: 0.0,
            clamp_jittered: true,
            parallel: true,
        }
    }
}

impl MeshConfig {
    /// Loads settings from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Rejects settings that would produce a meaningless mesh.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.global_scale.is_finite() || self.global_scale <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "global_scale must be a positive number, got {}",
                self.global_scale
            )));
        }
        if !self.vertical_exaggeration.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "vertical_exaggeration must be finite, got {}",
                self.vertical_exaggeration
            )));
        }
        if !self.min_elevation.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "min_elevation must be finite, got {}",
                self.min_elevation
            )));
        }
        if self.enable_jitter {
            if !self.jitter_amount.is_finite() || self.jitter_amount < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "jitter_amount must be a non-negative number, got {}",
                    self.jitter_amount
                )));
            }
            if self.jitter_amount >= RECOMMENDED_MAX_JITTER {
                warn!(
                    "jitter_amount {} is large, keep it below {}",
                    self.jitter_amount, RECOMMENDED_MAX_JITTER
                );
            }
        }
        Ok(())
    }

    /// The sampler's view of these settings.
    pub fn sampling_params(&self) -> SamplingParams {
        SamplingParams {
            global_scale: self.global_scale,
            vertical_exaggeration: self.vertical_exaggeration,
            min_elevation: self.min_elevation,
            jitter_amount: self.enable_jitter.then_some(self.jitter_amount),
            clamp_jittered: self.clamp_jittered,
            parallel: self.parallel,
        }
    }

    pub fn face_encoding(&self) -> FaceEncoding {
        if self.close_faces {
            FaceEncoding::Closed
        } else {
            FaceEncoding::Open
        }
    }

    /// Logs a summary of the settings for this run.
    pub fn log_settings(&self, metadata: &RasterMetadata) {
        info!("Source image {}", metadata.source_name);
        info!("Image is {} by {}", metadata.width, metadata.height);
        info!("Cell size in m is {}", metadata.cell_size_x);
        if self.enable_jitter {
            info!("Jittering vertices by a factor of {}", self.jitter_amount);
        }
        match self.faces {
            FaceMode::Quads => info!("Output a quad mesh"),
            FaceMode::Triangles => info!("Output a tri mesh"),
        }
        info!("Global scale, {}m is one output unit", self.global_scale);
        info!("Vertical exaggeration factor is {}", self.vertical_exaggeration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MeshConfig::default();
        assert_eq!(config.input, PathBuf::from("./dem.tif"));
        assert_eq!(config.output, PathBuf::from("./dem.obj"));
        assert_eq!(config.global_scale, 100.0);
        assert_eq!(config.faces, FaceMode::Quads);
        assert!(!config.enable_jitter);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: MeshConfig = serde_json::from_str(
            r#"{ "input": "srtm.tif", "faces": "triangles", "is_wgs84": true, "global_scale": 1000.0 }"#,
        )
        .unwrap();

        assert_eq!(config.input, PathBuf::from("srtm.tif"));
        assert_eq!(config.faces, FaceMode::Triangles);
        assert!(config.is_wgs84);
        assert_eq!(config.global_scale, 1000.0);
        assert_eq!(config.output, PathBuf::from("./dem.obj"));
        assert_eq!(config.vertical_exaggeration, 1.0);
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "enable_jitter": true, "jitter_seed": 42 }"#).unwrap();

        let config = MeshConfig::from_json_file(&path).unwrap();
        assert!(config.enable_jitter);
        assert_eq!(config.jitter_seed, Some(42));
    }

    #[test]
    fn test_from_json_file_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = MeshConfig::from_json_file(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(missing, ConfigError::Read { .. }));

        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        let bad = MeshConfig::from_json_file(&path).unwrap_err();
        assert!(matches!(bad, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_validate_rejects_bad_scale() {
        for scale in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = MeshConfig {
                global_scale: scale,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "scale {scale} accepted");
        }
    }

    #[test]
    fn test_validate_jitter_amount() {
        let negative = MeshConfig {
            enable_jitter: true,
            jitter_amount: -0.1,
            ..Default::default()
        };
        assert!(negative.validate().is_err());

        let large = MeshConfig {
            enable_jitter: true,
            jitter_amount: 0.5,
            ..Default::default()
        };
        assert!(large.validate().is_ok());

        let ignored = MeshConfig {
            enable_jitter: false,
            jitter_amount: -0.1,
            ..Default::default()
        };
        assert!(ignored.validate().is_ok());
    }

    #[test]
    fn test_sampling_params() {
        let config = MeshConfig {
            enable_jitter: true,
            jitter_amount: 0.05,
            global_scale: 10.0,
            ..Default::default()
        };
        let params = config.sampling_params();
        assert_eq!(params.jitter_amount, Some(0.05));
        assert_eq!(params.global_scale, 10.0);

        let params = MeshConfig::default().sampling_params();
        assert_eq!(params.jitter_amount, None);
    }

    #[test]
    fn test_face_encoding() {
        assert_eq!(MeshConfig::default().face_encoding(), FaceEncoding::Open);
        let closed = MeshConfig {
            close_faces: true,
            ..Default::default()
        };
        assert_eq!(closed.face_encoding(), FaceEncoding::Closed);
    }
}
