// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pointer picking against the grid hit-plane.
//!
//! The hit-plane is an invisible rectangle the size of the aligned model
//! footprint at ground level. Every failure on the way from pixel to cell is
//! reported as "no cell" so hover state is cleared rather than left stale.

use gridstage_geometry::{Camera, Point2, Point3, Viewport};

use crate::mapper::{CellIndex, GridMapper};

/// Resolves device pixels to grid cells.
#[derive(Debug, Clone, Copy)]
pub struct PointerResolver<'a> {
    mapper: &'a GridMapper,
}

impl<'a> PointerResolver<'a> {
    pub fn new(mapper: &'a GridMapper) -> Self {
        Self { mapper }
    }

    /// Cell under the pointer, or `None` when the pointer is off the grid
    /// or the projection cannot be evaluated.
    pub fn resolve(
        &self,
        pointer_px: Point2<f64>,
        viewport: &Viewport,
        camera: &Camera,
    ) -> Option<CellIndex> {
        let world = self.ground_hit(pointer_px, viewport, camera)?;
        self.mapper.world_point_to_cell(world.x, world.z)
    }

    /// World-space point on the hit-plane under the pointer.
    pub fn ground_hit(
        &self,
        pointer_px: Point2<f64>,
        viewport: &Viewport,
        camera: &Camera,
    ) -> Option<Point3<f64>> {
        let ray = viewport
            .to_ndc(pointer_px.x, pointer_px.y)
            .and_then(|ndc| camera.ray_from_ndc(&ndc));
        let ray = match ray {
            Ok(ray) => ray,
            Err(e) => {
                tracing::debug!(error = %e, "Pointer projection failed");
                return None;
            }
        };

        let plane_height = self.mapper.bounds().min.y;
        let hit = ray.intersect_horizontal_plane(plane_height)?;

        let local = self.mapper.world_to_local(&hit);
        let uv = self.normalize(&local)?;
        tracing::trace!(u = uv.x, v = uv.y, "Pointer over grid");
        Some(self.mapper.local_to_world(&local))
    }

    /// Plane-local point to `[0, 1] x [0, 1]`, rejecting points off the plane.
    fn normalize(&self, local: &Point2<f64>) -> Option<Point2<f64>> {
        let half = self.mapper.half_extent();
        let u = unit_coord(local.x, half.x)?;
        let v = unit_coord(local.y, half.y)?;
        Some(Point2::new(u, v))
    }
}

/// Distance from a zero-width plane axis still counted as on the plane.
const FLAT_TOLERANCE: f64 = 1e-6;

/// Fraction along one plane axis. A zero-width axis only accepts hits on
/// the line itself.
fn unit_coord(local: f64, half: f64) -> Option<f64> {
    if half <= f64::EPSILON {
        return (local.abs() <= FLAT_TOLERANCE).then_some(0.5);
    }
    let t = (local + half) / (2.0 * half);
    (0.0..=1.0).contains(&t).then_some(t)
}

/// A pointer move waiting to be resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub position: Point2<f64>,
    pub viewport: Viewport,
}

/// Keeps only the most recent pointer move between frames.
#[derive(Debug, Default)]
pub struct PointerQueue {
    latest: Option<PointerEvent>,
    dropped: u64,
}

impl PointerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: PointerEvent) {
        if self.latest.replace(event).is_some() {
            self.dropped += 1;
        }
    }

    pub fn take(&mut self) -> Option<PointerEvent> {
        self.latest.take()
    }

    /// Moves superseded before they were resolved.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}
