// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Axis-aligned bounding boxes in f64 precision.
//!
//! World space is Y-up: `x`/`z` span the ground plane, `y` is elevation.

use nalgebra::{Point3, Vector3};
use serde::Serialize;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Aabb {
    /// Minimum corner
    pub min: Point3<f64>,
    /// Maximum corner
    pub max: Point3<f64>,
    /// Number of points folded into the box
    pub sample_count: usize,
}

impl Aabb {
    /// Create new bounds initialized to invalid state
    pub fn new() -> Self {
        Self {
            min: Point3::new(f64::MAX, f64::MAX, f64::MAX),
            max: Point3::new(f64::MIN, f64::MIN, f64::MIN),
            sample_count: 0,
        }
    }

    /// Bounds spanning two corners.
    pub fn from_corners(a: Point3<f64>, b: Point3<f64>) -> Self {
        let mut bounds = Self::new();
        bounds.expand(&a);
        bounds.expand(&b);
        bounds
    }

    /// Check if bounds are valid (at least one point added)
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.sample_count > 0
    }

    /// Expand bounds to include a point
    #[inline]
    pub fn expand(&mut self, p: &Point3<f64>) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
        self.sample_count += 1;
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &Aabb) -> Aabb {
        match (self.is_valid(), other.is_valid()) {
            (false, _) => *other,
            (_, false) => *self,
            _ => Aabb {
                min: self.min.inf(&other.min),
                max: self.max.sup(&other.max),
                sample_count: self.sample_count + other.sample_count,
            },
        }
    }

    /// Center of the box, origin for invalid bounds
    #[inline]
    pub fn center(&self) -> Point3<f64> {
        if !self.is_valid() {
            return Point3::origin();
        }
        nalgebra::center(&self.min, &self.max)
    }

    /// Edge lengths, zero for invalid bounds
    #[inline]
    pub fn size(&self) -> Vector3<f64> {
        if !self.is_valid() {
            return Vector3::zeros();
        }
        self.max - self.min
    }

    /// Vertical (Y) midpoint
    #[inline]
    pub fn vertical_center(&self) -> f64 {
        self.center().y
    }

    /// Box moved by `offset`.
    pub fn translated(&self, offset: &Vector3<f64>) -> Aabb {
        if !self.is_valid() {
            return *self;
        }
        Aabb {
            min: self.min + offset,
            max: self.max + offset,
            sample_count: self.sample_count,
        }
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::new()
    }
}
