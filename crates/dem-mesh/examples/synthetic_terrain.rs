//! Build a mesh from synthetic Perlin terrain, no input file needed.
//!
//! Run with:
//! ```
//! cargo run -p dem-mesh --example synthetic_terrain -- [output.obj]
//! ```

use dem_mesh::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let output = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tahoe.obj".to_string());

    let raster = PerlinRaster::reno_tahoe(12345, 256, 160);

    let config = MeshConfig {
        output: output.into(),
        is_wgs84: true,
        global_scale: 1000.0,
        vertical_exaggeration: 2.0,
        faces: FaceMode::Triangles,
        enable_jitter: true,
        jitter_amount: 0.05,
        ..Default::default()
    };
    config.validate()?;

    let mut rng = StdRng::seed_from_u64(12345);
    let (_, report) = run(&config, &raster, &mut rng)?;

    tracing::info!(
        "Wrote {} vertices and {} faces to {}",
        report.vertex_count,
        report.face_count,
        report.output.display()
    );
    Ok(())
}
