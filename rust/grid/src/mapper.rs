// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Grid coordinate mapping.
//!
//! The overlay is a horizontal frame centered on the aligned model bounds,
//! with `u` along world x and `v` along world z. Row axes sit at constant `u`,
//! column axes at constant `v`. Axis positions are model coordinates, so the
//! alignment offset is applied on the way in and undone on the way out.

use gridstage_core::{AxisKind, SelectionRect};
use gridstage_geometry::{Aabb, Point2, Point3, Vector2, Vector3};
use serde::Serialize;

use crate::axes::AxisSet;
use crate::error::{Error, Result};

/// Presentation knobs for overlay geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapperConfig {
    /// Axes further than this fraction of the extent outside the bounds are not drawn.
    pub margin: f64,
    /// Every n-th axis (ascending index) is drawn as a major line.
    pub major_every: usize,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            margin: 0.1,
            major_every: 5,
        }
    }
}

/// One grid line in overlay-local coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayLine {
    pub tag: String,
    pub kind: AxisKind,
    /// Ascending index within its kind.
    pub index: usize,
    pub from: Point2<f64>,
    pub to: Point2<f64>,
    pub major: bool,
}

/// Realized selection rectangle in overlay-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayRect {
    pub center: Point2<f64>,
    pub size: Vector2<f64>,
}

impl OverlayRect {
    pub fn contains(&self, p: &Point2<f64>) -> bool {
        let half = self.size / 2.0;
        (p.x - self.center.x).abs() <= half.x && (p.y - self.center.y).abs() <= half.y
    }
}

/// Cell addressed by ascending axis indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellIndex {
    pub row: usize,
    pub col: usize,
}

/// Forward and inverse mapping between axis tags and overlay space.
#[derive(Debug, Clone)]
pub struct GridMapper {
    axes: AxisSet,
    bounds: Aabb,
    offset: Vector3<f64>,
    config: MapperConfig,
    row_midpoints: Vec<f64>,
    col_midpoints: Vec<f64>,
}

impl GridMapper {
    /// `bounds` are the aligned model bounds, `offset` the alignment translation.
    pub fn new(
        axes: AxisSet,
        bounds: Aabb,
        offset: Vector3<f64>,
        config: MapperConfig,
    ) -> Result<Self> {
        if !bounds.is_valid() {
            return Err(Error::DegenerateBounds("model bounds are empty".to_string()));
        }
        let row_midpoints = midpoints(&axes, AxisKind::Row);
        let col_midpoints = midpoints(&axes, AxisKind::Column);
        Ok(Self {
            axes,
            bounds,
            offset,
            config,
            row_midpoints,
            col_midpoints,
        })
    }

    pub fn axes(&self) -> &AxisSet {
        &self.axes
    }

    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    pub fn offset(&self) -> &Vector3<f64> {
        &self.offset
    }

    /// World-space center of the overlay frame, on the model's ground level.
    pub fn center(&self) -> Point3<f64> {
        let c = self.bounds.center();
        Point3::new(c.x, self.bounds.min.y, c.z)
    }

    /// Half of the width (x) and depth (z) of the bounds.
    pub fn half_extent(&self) -> Vector2<f64> {
        let size = self.bounds.size();
        Vector2::new(size.x / 2.0, size.z / 2.0)
    }

    /// Overlay-local coordinate of an axis position:
    /// `-halfExtent + (position + offset)` relative to the aligned minimum.
    pub fn local_coord(&self, kind: AxisKind, position: f64) -> f64 {
        let half = self.half_extent();
        match kind {
            AxisKind::Row => -half.x + (position + self.offset.x - self.bounds.min.x),
            AxisKind::Column => -half.y + (position + self.offset.z - self.bounds.min.z),
        }
    }

    /// Overlay-local point to aligned world space.
    pub fn local_to_world(&self, local: &Point2<f64>) -> Point3<f64> {
        let c = self.center();
        Point3::new(local.x + c.x, c.y, local.y + c.z)
    }

    /// Aligned world point to overlay-local space.
    pub fn world_to_local(&self, world: &Point3<f64>) -> Point2<f64> {
        let c = self.center();
        Point2::new(world.x - c.x, world.z - c.z)
    }

    /// Lines for every axis inside the culling margin.
    pub fn lines(&self) -> Vec<OverlayLine> {
        let half = self.half_extent();
        let size = self.bounds.size();
        let capacity = self.axes.len(AxisKind::Row) + self.axes.len(AxisKind::Column);
        let mut lines = Vec::with_capacity(capacity);

        for kind in [AxisKind::Row, AxisKind::Column] {
            let (limit, span) = match kind {
                AxisKind::Row => (half.x + self.config.margin * size.x, half.y),
                AxisKind::Column => (half.y + self.config.margin * size.z, half.x),
            };
            for (index, axis) in self.axes.sorted_ascending(kind).iter().enumerate() {
                let at = self.local_coord(kind, axis.position);
                if at.abs() > limit {
                    tracing::debug!(
                        tag = %axis.tag,
                        %kind,
                        local = at,
                        "Axis outside model bounds, not drawn"
                    );
                    continue;
                }
                let (from, to) = match kind {
                    AxisKind::Row => (Point2::new(at, -span), Point2::new(at, span)),
                    AxisKind::Column => (Point2::new(-span, at), Point2::new(span, at)),
                };
                lines.push(OverlayLine {
                    tag: axis.tag.clone(),
                    kind,
                    index,
                    from,
                    to,
                    major: self.is_major(index),
                });
            }
        }
        lines
    }

    #[inline]
    pub fn is_major(&self, index: usize) -> bool {
        self.config.major_every > 0 && index % self.config.major_every == 0
    }

    /// Realize a tag-space rectangle. Zero-width spans get the default cell
    /// width of their axis kind so the rectangle stays visible.
    pub fn cell_rect(&self, selection: &SelectionRect) -> Result<OverlayRect> {
        let (u_min, u_max) = self.span(AxisKind::Row, &selection.row_start, &selection.row_end)?;
        let (v_min, v_max) = self.span(AxisKind::Column, &selection.col_start, &selection.col_end)?;

        let mut width = u_max - u_min;
        let mut depth = v_max - v_min;
        if width <= f64::EPSILON {
            width = self.default_cell_size(AxisKind::Row);
        }
        if depth <= f64::EPSILON {
            depth = self.default_cell_size(AxisKind::Column);
        }

        Ok(OverlayRect {
            center: Point2::new((u_min + u_max) / 2.0, (v_min + v_max) / 2.0),
            size: Vector2::new(width, depth),
        })
    }

    fn span(&self, kind: AxisKind, start: &str, end: &str) -> Result<(f64, f64)> {
        if self.axes.len(kind) == 0 {
            return Err(Error::NoAxes(kind));
        }
        let position = |tag: &str| {
            self.axes
                .position_of(kind, tag)
                .ok_or_else(|| Error::UnknownAxisTag {
                    kind,
                    tag: tag.to_string(),
                })
        };
        let a = self.local_coord(kind, position(start)?);
        let b = self.local_coord(kind, position(end)?);
        Ok((a.min(b), a.max(b)))
    }

    /// Mean axis spacing, falling back to a tenth of the model extent.
    pub fn default_cell_size(&self, kind: AxisKind) -> f64 {
        let axes = self.axes.sorted_ascending(kind);
        if axes.len() >= 2 {
            let spread = axes[axes.len() - 1].position - axes[0].position;
            if spread > f64::EPSILON {
                return spread / (axes.len() - 1) as f64;
            }
        }
        let size = self.bounds.size();
        let extent = match kind {
            AxisKind::Row => size.x,
            AxisKind::Column => size.z,
        };
        if extent > f64::EPSILON {
            extent * 0.1
        } else {
            1.0
        }
    }

    /// Cell nearest to an aligned world point.
    ///
    /// Each index counts the midpoints between consecutive axes that the
    /// model coordinate exceeds. Indices are ascending.
    pub fn world_point_to_cell(&self, x: f64, z: f64) -> Option<CellIndex> {
        if self.axes.len(AxisKind::Row) == 0 || self.axes.len(AxisKind::Column) == 0 {
            return None;
        }
        let model_x = x - self.offset.x;
        let model_z = z - self.offset.z;
        Some(CellIndex {
            row: nearest_axis_index(&self.row_midpoints, model_x),
            col: nearest_axis_index(&self.col_midpoints, model_z),
        })
    }

    /// Row index in the descending display convention.
    pub fn display_row_index(&self, ascending: usize) -> Option<usize> {
        self.axes.ascending_to_display(ascending)
    }

    /// Tags addressed by a cell.
    pub fn cell_tags(&self, cell: CellIndex) -> Option<(&str, &str)> {
        Some((
            self.axes.tag_at(AxisKind::Row, cell.row)?,
            self.axes.tag_at(AxisKind::Column, cell.col)?,
        ))
    }
}

fn midpoints(axes: &AxisSet, kind: AxisKind) -> Vec<f64> {
    axes.sorted_ascending(kind)
        .windows(2)
        .map(|w| (w[0].position + w[1].position) / 2.0)
        .collect()
}

/// Number of ascending midpoints strictly below `value`.
#[inline]
fn nearest_axis_index(midpoints: &[f64], value: f64) -> usize {
    midpoints.partition_point(|&m| m < value)
}
