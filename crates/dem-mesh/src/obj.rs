//! Wavefront OBJ output.
//!
//! ```text
//! #verts
//! v 0 0 10
//! v 1 0 20
//! ...
//! #faces
//! f 1 3 4 2
//! ...
//! ```
//!
//! Coordinates use the shortest text that round-trips the `f64`. Face
//! indices are 1-based positions among the `v` lines.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::DestinationWriteError;
use crate::mesh::Mesh;

/// How face records are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceEncoding {
    /// Each index once: `f 1 3 4 2`.
    #[default]
    Open,
    /// First index repeated to close the polygon: `f 1 3 4 2 1`.
    Closed,
}

/// Writes `mesh` as OBJ text to `writer`.
pub fn write_obj<W: Write>(
    mesh: &Mesh,
    writer: &mut W,
    encoding: FaceEncoding,
) -> std::io::Result<()> {
    writeln!(writer, "#verts")?;
    for v in &mesh.vertices {
        writeln!(writer, "v {} {} {}", v.x, v.y, v.z)?;
    }

    writeln!(writer, "#faces")?;
    for face in &mesh.faces {
        let indices = face.indices();
        write!(writer, "f")?;
        for index in indices {
            write!(writer, " {index}")?;
        }
        if encoding == FaceEncoding::Closed {
            if let Some(first) = indices.first() {
                write!(writer, " {first}")?;
            }
        }
        writeln!(writer)?;
    }

    Ok(())
}

/// Writes `mesh` to `path`, replacing any existing file.
pub fn save_obj<P: AsRef<Path>>(
    mesh: &Mesh,
    path: P,
    encoding: FaceEncoding,
) -> Result<(), DestinationWriteError> {
    let path = path.as_ref();
    info!("Writing to OBJ file {}", path.display());

    let file = File::create(path).map_err(|source| DestinationWriteError::Create {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);

    write_obj(mesh, &mut writer, encoding)
        .and_then(|()| writer.flush())
        .map_err(|source| DestinationWriteError::Write {
            path: path.to_path_buf(),
            source,
        })
}
