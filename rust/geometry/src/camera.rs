// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Camera rays for pointer picking.
//!
//! Uses OpenGL clip conventions: NDC in `[-1, 1]` on all axes, `-1` is the
//! near plane, pointer y grows downward in pixel space.

use nalgebra::{Matrix4, Perspective3, Point2, Point3, Vector3};

use crate::error::{Error, Result};

/// Drawing surface size in device pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Pixel position to normalized device coordinates.
    pub fn to_ndc(&self, x: f64, y: f64) -> Result<Point2<f64>> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(Error::DegenerateViewport {
                width: self.width,
                height: self.height,
            });
        }
        Ok(Point2::new(
            (x / self.width) * 2.0 - 1.0,
            -((y / self.height) * 2.0 - 1.0),
        ))
    }
}

/// Half-line in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Point3<f64>,
    /// Unit direction.
    pub direction: Vector3<f64>,
}

impl Ray {
    /// Hit point with the horizontal plane `y = height`, if in front of the origin.
    pub fn intersect_horizontal_plane(&self, height: f64) -> Option<Point3<f64>> {
        let denom = self.direction.y;
        if denom.abs() < 1e-9 {
            return None;
        }
        let t = (height - self.origin.y) / denom;
        if t < 0.0 || !t.is_finite() {
            return None;
        }
        Some(self.origin + self.direction * t)
    }
}

/// View and projection of the active camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub view: Matrix4<f64>,
    pub projection: Matrix4<f64>,
}

impl Camera {
    pub fn new(view: Matrix4<f64>, projection: Matrix4<f64>) -> Self {
        Self { view, projection }
    }

    /// Y-up perspective camera looking from `eye` at `target`.
    ///
    /// A zero or non-finite aspect (minimized canvas) is an error rather than
    /// a panic inside the projection constructor.
    pub fn perspective(
        eye: Point3<f64>,
        target: Point3<f64>,
        fovy: f64,
        aspect: f64,
        near: f64,
        far: f64,
    ) -> Result<Self> {
        let far = far.max(near + 1.0);
        let frustum_ok = aspect.is_finite()
            && aspect.abs() > f64::EPSILON
            && fovy.is_finite()
            && near.is_finite()
            && far.is_finite();
        if !frustum_ok {
            return Err(Error::DegenerateFrustum { aspect, near, far });
        }
        let view = Matrix4::look_at_rh(&eye, &target, &Vector3::y());
        let projection = Perspective3::new(aspect, fovy, near, far).to_homogeneous();
        Ok(Self { view, projection })
    }

    /// Ray through a point given in normalized device coordinates.
    pub fn ray_from_ndc(&self, ndc: &Point2<f64>) -> Result<Ray> {
        let inverse = (self.projection * self.view)
            .try_inverse()
            .ok_or(Error::SingularProjection)?;
        let near = inverse.transform_point(&Point3::new(ndc.x, ndc.y, -1.0));
        let far = inverse.transform_point(&Point3::new(ndc.x, ndc.y, 1.0));
        let direction = far - near;
        let length = direction.norm();
        if !length.is_finite() || length <= f64::EPSILON {
            return Err(Error::SingularProjection);
        }
        Ok(Ray {
            origin: near,
            direction: direction / length,
        })
    }
}
