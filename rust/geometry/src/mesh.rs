// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh data structures

use nalgebra::{Matrix4, Point3};

use crate::bounds::Aabb;

/// Triangle mesh buffers in element-local space
#[derive(Debug, Clone, Default)]
pub struct MeshBuffers {
    /// Vertex positions (x, y, z)
    pub positions: Vec<f32>,
    /// Triangle indices (i0, i1, i2)
    pub indices: Vec<u32>,
}

impl MeshBuffers {
    /// Create mesh buffers from raw vectors
    pub fn new(positions: Vec<f32>, indices: Vec<u32>) -> Self {
        Self { positions, indices }
    }

    /// Get vertex count
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Get triangle count
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Local-space vertex `i` widened to f64
    #[inline]
    pub fn vertex(&self, i: usize) -> Point3<f64> {
        let c = &self.positions[i * 3..i * 3 + 3];
        Point3::new(c[0] as f64, c[1] as f64, c[2] as f64)
    }

    /// Vertices mapped through `transform`, in buffer order
    pub fn world_vertices<'a>(
        &'a self,
        transform: &'a Matrix4<f64>,
    ) -> impl Iterator<Item = Point3<f64>> + 'a {
        self.positions.chunks_exact(3).map(move |c| {
            transform.transform_point(&Point3::new(c[0] as f64, c[1] as f64, c[2] as f64))
        })
    }

    /// World-space bounds under `transform`
    pub fn world_bounds(&self, transform: &Matrix4<f64>) -> Aabb {
        let mut bounds = Aabb::new();
        for p in self.world_vertices(transform) {
            bounds.expand(&p);
        }
        bounds
    }
}
