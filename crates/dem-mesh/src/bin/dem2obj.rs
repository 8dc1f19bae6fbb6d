//! Convert a DEM raster to an OBJ terrain mesh.
//!
//! Run with:
//! ```
//! cargo run -p dem-mesh --bin dem2obj -- [config.json]
//! ```
//!
//! Without a config file the defaults apply (`./dem.tif` -> `./dem.obj`).

use anyhow::Context;
use dem_mesh::config::MeshConfig;
use dem_mesh::pipeline::convert;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::args_os().nth(1) {
        Some(path) => MeshConfig::from_json_file(&path)
            .with_context(|| format!("loading settings from {}", path.to_string_lossy()))?,
        None => MeshConfig::default(),
    };

    let report = convert(&config)
        .with_context(|| format!("converting {}", config.input.display()))?;

    tracing::info!("Conversion finished");
    tracing::info!("  Source: {}", report.source_name);
    tracing::info!("  Grid: {} x {}", report.width, report.height);
    tracing::info!("  Vertices: {}", report.vertex_count);
    tracing::info!("  Faces: {}", report.face_count);
    tracing::info!("  Output: {}", report.output.display());

    Ok(())
}
