//! End-to-end conversion: raster in, OBJ file out.

use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::config::MeshConfig;
use crate::error::Result;
use crate::mesh::Mesh;
use crate::metadata::{normalize_units, read_metadata};
use crate::obj::save_obj;
use crate::raster::{FIRST_BAND, RasterReader, open_reader};
use crate::sampler::sample_elevations;

/// Summary of a finished conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionReport {
    pub source_name: String,
    pub width: usize,
    pub height: usize,
    /// Cell sizes in meters, after unit normalization.
    pub cell_size: (f64, f64),
    pub vertex_count: usize,
    pub face_count: usize,
    pub output: PathBuf,
}

/// Runs the conversion described by `config`.
///
/// The raster reader is chosen from the input extension. Jitter draws come
/// from `config.jitter_seed` when set, otherwise from OS entropy.
pub fn convert(config: &MeshConfig) -> Result<ConversionReport> {
    config.validate()?;
    let reader = open_reader(&config.input)?;

    let mut rng = match config.jitter_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let (_, report) = run(config, reader.as_ref(), &mut rng)?;
    Ok(report)
}

/// Runs every stage against an explicit reader and random source, writing
/// the mesh to `config.output`. Returns the mesh alongside the report.
pub fn run<R: Rng + ?Sized>(
    config: &MeshConfig,
    reader: &dyn RasterReader,
    rng: &mut R,
) -> Result<(Mesh, ConversionReport)> {
    info!("{}", "=".repeat(80));
    info!("DEM to OBJ running");

    let metadata = read_metadata(reader)?;
    let metadata = normalize_units(metadata, config.is_wgs84);
    config.log_settings(&metadata);

    let grid = sample_elevations(
        reader,
        &metadata,
        FIRST_BAND,
        &config.sampling_params(),
        rng,
    )?;
    let mesh = Mesh::from_grid(&grid, config.faces);
    drop(grid);

    save_obj(&mesh, &config.output, config.face_encoding())?;

    info!("Job complete");
    info!("{}", "=".repeat(80));

    let report = ConversionReport {
        source_name: metadata.source_name,
        width: metadata.width,
        height: metadata.height,
        cell_size: (metadata.cell_size_x, metadata.cell_size_y),
        vertex_count: mesh.vertex_count(),
        face_count: mesh.face_count(),
        output: config.output.clone(),
    };
    Ok((mesh, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigError, Error, SourceReadError};
    use crate::mesh::FaceMode;
    use crate::raster::{MemoryRaster, bounds_from_edges};

    fn scenario_raster() -> MemoryRaster {
        let bounds = bounds_from_edges("scenario", 0.0, 2.0, 2.0, 0.0).unwrap();
        MemoryRaster::from_rows("scenario", bounds, &[vec![10.0, 20.0], vec![30.0, 40.0]])
            .unwrap()
    }

    #[test]
    fn test_run_two_by_two_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let config = MeshConfig {
            output: dir.path().join("scenario.obj"),
            global_scale: 1.0,
            parallel: false,
            ..Default::default()
        };

        let (mesh, report) =
            run(&config, &scenario_raster(), &mut StdRng::seed_from_u64(0)).unwrap();

        assert_eq!(report.vertex_count, 4);
        assert_eq!(report.face_count, 1);
        assert_eq!(report.cell_size, (1.0, 1.0));
        assert_eq!(mesh.faces.len(), 1);

        let text = std::fs::read_to_string(&config.output).unwrap();
        assert_eq!(
            text,
            "#verts\nv 0 0 10\nv 1 0 20\nv 0 -1 30\nv 1 -1 40\n#faces\nf 1 3 4 2\n"
        );
    }

    #[test]
    fn test_run_wgs84_scales_cells() {
        let dir = tempfile::tempdir().unwrap();
        let config = MeshConfig {
            output: dir.path().join("wgs84.obj"),
            is_wgs84: true,
            faces: FaceMode::Triangles,
            ..Default::default()
        };

        let (_, report) = run(&config, &scenario_raster(), &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(report.cell_size, (110_000.0, 110_000.0));
        assert_eq!(report.face_count, 2);
    }

    #[test]
    fn test_convert_rejects_invalid_config() {
        let config = MeshConfig {
            global_scale: 0.0,
            ..Default::default()
        };
        let err = convert(&config).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_convert_unsupported_input() {
        let config = MeshConfig {
            input: PathBuf::from("dem.png"),
            ..Default::default()
        };
        let err = convert(&config).unwrap_err();
        assert!(matches!(
            err,
            Error::SourceRead(SourceReadError::UnsupportedFormat { .. })
        ));
    }
}
