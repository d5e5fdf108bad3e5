// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Gridstage Scene Geometry
//!
//! Primitive storage, storey assignment, model alignment with orientation
//! estimation, and the camera math behind pointer picking. Built on nalgebra
//! with rayon for per-primitive bounds.

pub mod align;
pub mod bounds;
pub mod camera;
pub mod error;
pub mod mesh;
pub mod scene;
pub mod storeys;

// Re-export nalgebra types for convenience
pub use nalgebra::{Matrix4, Point2, Point3, Vector2, Vector3};

pub use align::{
    dominant_orientation, Alignment, ModelAligner, Orientation, DEFAULT_ORIENTATION_SAMPLES,
};
pub use bounds::Aabb;
pub use camera::{Camera, Ray, Viewport};
pub use error::{Error, Result};
pub use mesh::MeshBuffers;
pub use scene::{Primitive, Scene};
pub use storeys::{
    ResolutionStats, Storey, StoreyResolver, DEFAULT_STOREY_BUFFER, UNASSIGNED_STOREY,
};
