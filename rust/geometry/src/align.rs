// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Model alignment and dominant-orientation estimation.
//!
//! Alignment moves the model so the horizontal minimum of its bounds sits at
//! the local origin; elevation is left untouched so storey elevations keep
//! their meaning. The orientation estimate is a diagnostic: the principal
//! axis of the horizontal vertex distribution.

use nalgebra::{Point3, Vector3};
use serde::Serialize;

use crate::bounds::Aabb;
use crate::error::{Error, Result};
use crate::scene::Scene;

/// Default cap on vertices sampled for orientation.
pub const DEFAULT_ORIENTATION_SAMPLES: usize = 2000;

/// Dominant planar orientation of the model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Orientation {
    /// Angle of the principal axis in the x/z plane, measured from +x.
    pub radians: f64,
    pub degrees: f64,
    pub samples: usize,
}

impl Orientation {
    fn from_radians(radians: f64, samples: usize) -> Self {
        Self {
            radians,
            degrees: radians.to_degrees(),
            samples,
        }
    }
}

/// Result of aligning a scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alignment {
    /// Translation applied to every primitive, `(-min.x, 0, -min.z)`.
    pub offset: Vector3<f64>,
    pub bounds_before: Aabb,
    pub bounds_after: Aabb,
    pub orientation: Orientation,
}

impl Alignment {
    /// Alignment of an empty or already-aligned model.
    pub fn identity(bounds: Aabb) -> Self {
        Self {
            offset: Vector3::zeros(),
            bounds_before: bounds,
            bounds_after: bounds,
            orientation: Orientation::from_radians(0.0, 0),
        }
    }

    /// Model coordinate of an aligned world point.
    #[inline]
    pub fn to_model(&self, world: &Point3<f64>) -> Point3<f64> {
        world - self.offset
    }

    /// Aligned world coordinate of a model point.
    #[inline]
    pub fn to_world(&self, model: &Point3<f64>) -> Point3<f64> {
        model + self.offset
    }
}

/// Translates a scene into local coordinates.
#[derive(Debug, Clone, Copy)]
pub struct ModelAligner {
    sample_cap: usize,
}

impl Default for ModelAligner {
    fn default() -> Self {
        Self::new(DEFAULT_ORIENTATION_SAMPLES)
    }
}

impl ModelAligner {
    pub fn new(sample_cap: usize) -> Self {
        Self {
            sample_cap: sample_cap.max(2),
        }
    }

    /// Translate every primitive, helpers included, by `(-min.x, 0, -min.z)`.
    ///
    /// Running it again on an aligned scene yields a near-zero offset.
    pub fn align(&self, scene: &mut Scene) -> Result<Alignment> {
        let bounds_before = scene.model_bounds();
        if !bounds_before.is_valid() {
            return Err(Error::EmptyBounds(
                "scene has no model geometry to align".to_string(),
            ));
        }

        let offset = Vector3::new(-bounds_before.min.x, 0.0, -bounds_before.min.z);
        if offset.x != 0.0 || offset.z != 0.0 {
            for primitive in scene.iter_mut() {
                primitive.translate(&offset);
            }
        }
        let bounds_after = bounds_before.translated(&offset);
        let orientation = dominant_orientation(scene, self.sample_cap);

        tracing::info!(
            offset_x = offset.x,
            offset_z = offset.z,
            width = bounds_after.size().x,
            depth = bounds_after.size().z,
            height = bounds_after.size().y,
            orientation_deg = orientation.degrees,
            samples = orientation.samples,
            "Aligned model"
        );

        Ok(Alignment {
            offset,
            bounds_before,
            bounds_after,
            orientation,
        })
    }
}

/// Estimate the principal horizontal axis of the model.
///
/// Samples at most `cap` world vertices with an even stride over all model
/// primitives, so cost is bounded regardless of model size. Fewer than two
/// samples give an angle of zero.
pub fn dominant_orientation(scene: &Scene, cap: usize) -> Orientation {
    let total: usize = scene
        .iter()
        .filter(|p| !p.helper)
        .map(|p| p.mesh.vertex_count())
        .sum();
    if total == 0 || cap == 0 {
        return Orientation::from_radians(0.0, 0);
    }
    let stride = total.div_ceil(cap).max(1);

    let mut samples: Vec<(f64, f64)> = Vec::with_capacity(cap.min(total));
    let mut cursor = 0usize;
    'outer: for primitive in scene.iter().filter(|p| !p.helper) {
        let count = primitive.mesh.vertex_count();
        // First vertex of this primitive that lands on the stride
        let mut local = (stride - cursor % stride) % stride;
        while local < count {
            if samples.len() >= cap {
                break 'outer;
            }
            let p = primitive.transform.transform_point(&primitive.mesh.vertex(local));
            samples.push((p.x, p.z));
            local += stride;
        }
        cursor += count;
    }

    Orientation::from_radians(principal_angle(&samples), samples.len())
}

/// `0.5 * atan2(2 cov_xz, cov_xx - cov_zz)` over centered samples.
fn principal_angle(samples: &[(f64, f64)]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let n = samples.len() as f64;
    let (sx, sz) = samples
        .iter()
        .fold((0.0, 0.0), |(ax, az), (x, z)| (ax + x, az + z));
    let (mx, mz) = (sx / n, sz / n);

    let (mut cxx, mut czz, mut cxz) = (0.0, 0.0, 0.0);
    for (x, z) in samples {
        let dx = x - mx;
        let dz = z - mz;
        cxx += dx * dx;
        czz += dz * dz;
        cxz += dx * dz;
    }
    cxx /= n;
    czz /= n;
    cxz /= n;

    0.5 * (2.0 * cxz).atan2(cxx - czz)
}
