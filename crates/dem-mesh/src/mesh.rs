//! Grid mesh construction.
//!
//! Vertices are emitted in row-major scan order, which fixes the 1-based
//! index of cell `(col, row)` at `row * width + col + 1`. Faces are derived
//! from the grid dimensions alone: each interior quad spans
//!
//! ```text
//! v0 = (col,   row)      v3 = (col+1, row)
//! v1 = (col,   row+1)    v2 = (col+1, row+1)
//! ```
//!
//! and is emitted either as the quad `v0 v1 v2 v3` or as the triangles
//! `v0 v1 v2` and `v0 v2 v3`. The last column and last row open no quads, so
//! no face wraps from one row to the next.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::sampler::{ElevationGrid, Vertex};

/// Face topology of the generated mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceMode {
    /// One four-sided face per grid quad.
    #[default]
    Quads,
    /// Two triangles per grid quad, split along the `v0`-`v2` diagonal.
    Triangles,
}

/// A polygon referencing vertices by 1-based index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Quad([usize; 4]),
    Triangle([usize; 3]),
}

impl Face {
    pub fn indices(&self) -> &[usize] {
        match self {
            Face::Quad(indices) => indices,
            Face::Triangle(indices) => indices,
        }
    }
}

/// A terrain mesh ready for serialization.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub faces: Vec<Face>,
}

impl Mesh {
    /// Builds vertices and faces from a sampled grid.
    pub fn from_grid(grid: &ElevationGrid, mode: FaceMode) -> Self {
        info!("Generating vertices");
        let vertices = build_vertices(grid);
        info!("Generated {} vertices", vertices.len());

        info!("Generating faces");
        let faces = build_faces(grid.width(), grid.height(), mode);
        info!("Generated {} faces", faces.len());

        Self { vertices, faces }
    }

    /// Number of faces a `width` x `height` grid produces.
    pub fn face_count_for(width: usize, height: usize, mode: FaceMode) -> usize {
        let quads = width.saturating_sub(1) * height.saturating_sub(1);
        match mode {
            FaceMode::Quads => quads,
            FaceMode::Triangles => quads * 2,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }
}

/// Vertices in row-major scan order.
pub fn build_vertices(grid: &ElevationGrid) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity(grid.len());
    for row in 0..grid.height() {
        for col in 0..grid.width() {
            vertices.push(grid.positions()[grid.index(col, row)]);
        }
    }
    vertices
}

/// Faces for a `width` x `height` grid, using 1-based vertex indices.
pub fn build_faces(width: usize, height: usize, mode: FaceMode) -> Vec<Face> {
    let mut faces = Vec::with_capacity(Mesh::face_count_for(width, height, mode));

    for row in 0..height.saturating_sub(1) {
        let top = row * width;
        let bottom = (row + 1) * width;
        for col in 0..width.saturating_sub(1) {
            let v0 = top + col + 1;
            let v1 = bottom + col + 1;
            let v2 = bottom + col + 2;
            let v3 = top + col + 2;

            match mode {
                FaceMode::Quads => faces.push(Face::Quad([v0, v1, v2, v3])),
                FaceMode::Triangles => {
                    faces.push(Face::Triangle([v0, v1, v2]));
                    faces.push(Face::Triangle([v0, v2, v3]));
                }
            }
        }
    }

    faces
}
