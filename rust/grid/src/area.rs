// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Elements inside a grid rectangle.
//!
//! An element belongs to an area when the horizontal center of its world
//! bounds, taken back to model coordinates, falls inside the rectangle
//! spanned by the selection's axes plus a tolerance. Grids whose selected
//! axes sit almost on top of each other carry no usable positions; those
//! fall back to dividing the model footprint proportionally by axis index.

use gridstage_core::{AxisKind, ElementCategory, ElementId, SelectionRect};
use gridstage_geometry::{Point2, Scene};

use crate::axes::AxisSet;
use crate::mapper::GridMapper;

/// Default slack around the selected axes, in model units.
pub const DEFAULT_AREA_TOLERANCE: f64 = 500.0;

/// Selected axes closer than this are treated as unpositioned.
pub const MIN_AXIS_SPREAD: f64 = 1000.0;

/// Parameters of a grid-area query.
#[derive(Debug, Clone)]
pub struct AreaQuery<'a> {
    pub selection: &'a SelectionRect,
    /// Empty means every category.
    pub categories: &'a [ElementCategory],
    pub tolerance: f64,
}

impl<'a> AreaQuery<'a> {
    pub fn new(selection: &'a SelectionRect) -> Self {
        Self {
            selection,
            categories: &[],
            tolerance: DEFAULT_AREA_TOLERANCE,
        }
    }

    pub fn with_categories(mut self, categories: &'a [ElementCategory]) -> Self {
        self.categories = categories;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    fn accepts(&self, element_type: &str) -> bool {
        self.categories.is_empty() || self.categories.iter().any(|c| c.matches(element_type))
    }
}

/// Model-space rectangle: `x` bounds from row axes, `z` bounds from column axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaBounds {
    pub min: Point2<f64>,
    pub max: Point2<f64>,
}

impl AreaBounds {
    #[inline]
    pub fn contains(&self, x: f64, z: f64) -> bool {
        self.min.x <= x && x <= self.max.x && self.min.y <= z && z <= self.max.y
    }
}

/// Ids of the model elements inside the selected area, ascending.
pub fn elements_in_area(
    scene: &Scene,
    mapper: &GridMapper,
    query: &AreaQuery<'_>,
) -> Vec<ElementId> {
    let offset = mapper.offset();
    let centers: Vec<(ElementId, f64, f64)> = scene
        .world_bounds_by_element()
        .into_iter()
        .filter(|(_, b)| b.is_valid())
        .map(|(id, b)| {
            let c = b.center();
            (id, c.x - offset.x, c.z - offset.z)
        })
        .collect();

    let area = match positioned_bounds(mapper.axes(), query) {
        Some(area) => area,
        None => match proportional_bounds(mapper.axes(), query.selection, &centers) {
            Some(area) => {
                tracing::debug!(selection = %query.selection, "Grid area resolved proportionally");
                area
            }
            None => {
                tracing::warn!(selection = %query.selection, "No axes to resolve grid area");
                return Vec::new();
            }
        },
    };

    let mut ids: Vec<ElementId> = centers
        .iter()
        .filter(|(_, x, z)| area.contains(*x, *z))
        .filter_map(|&(id, _, _)| {
            let primitive = scene.primitive(id)?;
            query.accepts(&primitive.element_type).then_some(id)
        })
        .collect();
    ids.sort_unstable();
    ids
}

/// Area from the selected axes' positions, if both spans are usable.
fn positioned_bounds(axes: &AxisSet, query: &AreaQuery<'_>) -> Option<AreaBounds> {
    let s = query.selection;
    let rows = span(axes, AxisKind::Row, &s.row_start, &s.row_end)?;
    let cols = span(axes, AxisKind::Column, &s.col_start, &s.col_end)?;
    if rows.1 - rows.0 < MIN_AXIS_SPREAD || cols.1 - cols.0 < MIN_AXIS_SPREAD {
        return None;
    }
    let t = query.tolerance;
    Some(AreaBounds {
        min: Point2::new(rows.0 - t, cols.0 - t),
        max: Point2::new(rows.1 + t, cols.1 + t),
    })
}

fn span(axes: &AxisSet, kind: AxisKind, start: &str, end: &str) -> Option<(f64, f64)> {
    let a = axes.position_of(kind, start)?;
    let b = axes.position_of(kind, end)?;
    Some((a.min(b), a.max(b)))
}

/// Area as a fraction of the element-center footprint, by ascending axis
/// index, widened by half a division on each side.
fn proportional_bounds(
    axes: &AxisSet,
    selection: &SelectionRect,
    centers: &[(ElementId, f64, f64)],
) -> Option<AreaBounds> {
    if centers.is_empty() {
        return None;
    }
    let (mut x_min, mut x_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut z_min, mut z_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(_, x, z) in centers {
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        z_min = z_min.min(z);
        z_max = z_max.max(z);
    }

    let (x0, x1) = proportional_span(
        axes,
        AxisKind::Row,
        &selection.row_start,
        &selection.row_end,
        x_min,
        x_max,
    )?;
    let (z0, z1) = proportional_span(
        axes,
        AxisKind::Column,
        &selection.col_start,
        &selection.col_end,
        z_min,
        z_max,
    )?;
    Some(AreaBounds {
        min: Point2::new(x0, z0),
        max: Point2::new(x1, z1),
    })
}

fn proportional_span(
    axes: &AxisSet,
    kind: AxisKind,
    start: &str,
    end: &str,
    min: f64,
    max: f64,
) -> Option<(f64, f64)> {
    let count = axes.len(kind);
    if count == 0 {
        return None;
    }
    // Unknown tags widen to the first and last division
    let i0 = axes.index_of(kind, start).unwrap_or(0);
    let i1 = axes.index_of(kind, end).unwrap_or(count - 1);
    let (i0, i1) = (i0.min(i1), i0.max(i1));

    let range = if max > min { max - min } else { 1.0 };
    let n = count as f64;
    let division = range / n;
    Some((
        min + (i0 as f64 / n) * range - division / 2.0,
        min + ((i1 + 1) as f64 / n) * range + division / 2.0,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::MapperConfig;
    use gridstage_core::{GridAxis, IngestElement, Rgb, IDENTITY_TRANSFORM};
    use gridstage_geometry::Vector3;

    /// Flat 100x100 footprint centered on (x, z).
    fn pad(id: u32, element_type: &str, x: f32, z: f32) -> IngestElement {
        IngestElement {
            element_id: id,
            element_type: element_type.to_string(),
            positions: vec![
                x - 50.0, 0.0, z - 50.0, //
                x + 50.0, 0.0, z - 50.0, //
                x + 50.0, 300.0, z + 50.0,
            ],
            indices: vec![0, 1, 2],
            transform: IDENTITY_TRANSFORM,
            color: Rgb::WHITE,
            opacity: 1.0,
            helper: false,
        }
    }

    fn setup(axes: Vec<GridAxis>) -> (Scene, GridMapper) {
        let scene = Scene::from_ingest(vec![
            pad(1, "IfcColumn", 0.0, 0.0),
            pad(2, "IfcBeam", 5000.0, 4000.0),
            pad(3, "IfcColumn", 10_000.0, 8000.0),
            pad(4, "IfcSlab", 20_000.0, 8000.0),
            pad(5, "IfcColumn", 10_400.0, 8300.0),
        ]);
        let bounds = scene.model_bounds();
        let mapper = GridMapper::new(
            AxisSet::new(axes),
            bounds,
            Vector3::zeros(),
            MapperConfig::default(),
        )
        .unwrap();
        (scene, mapper)
    }

    fn spaced_axes() -> Vec<GridAxis> {
        vec![
            GridAxis::row("A", 0.0),
            GridAxis::row("B", 10_000.0),
            GridAxis::row("C", 20_000.0),
            GridAxis::column("1", 0.0),
            GridAxis::column("2", 8000.0),
        ]
    }

    #[test]
    fn test_area_includes_tolerance() {
        let (scene, mapper) = setup(spaced_axes());
        let selection = SelectionRect::new("A", "B", "1", "2");
        let ids = elements_in_area(&scene, &mapper, &AreaQuery::new(&selection));
        // 5 sits 400 past B and 300 past 2
        assert_eq!(ids, vec![1, 2, 3, 5]);

        let query = AreaQuery::new(&selection).with_tolerance(0.0);
        let tight = elements_in_area(&scene, &mapper, &query);
        assert_eq!(tight, vec![1, 2, 3]);
    }

    #[test]
    fn test_category_filter() {
        let (scene, mapper) = setup(spaced_axes());
        let selection = SelectionRect::new("A", "C", "1", "2");
        let columns = [ElementCategory::Columns];
        let query = AreaQuery::new(&selection).with_categories(&columns);
        let ids = elements_in_area(&scene, &mapper, &query);
        assert_eq!(ids, vec![1, 3, 5]);

        let framing = [ElementCategory::Beams, ElementCategory::Slabs];
        let query = AreaQuery::new(&selection).with_categories(&framing);
        let ids = elements_in_area(&scene, &mapper, &query);
        assert_eq!(ids, vec![2, 4]);
    }

    #[test]
    fn test_collapsed_axes_fall_back_to_proportional_division() {
        // Every axis at the same position
        let (scene, mapper) = setup(vec![
            GridAxis::row("A", 0.0),
            GridAxis::row("B", 0.0),
            GridAxis::column("1", 0.0),
            GridAxis::column("2", 0.0),
        ]);
        let selection = SelectionRect::cell("A", "1");
        let ids = elements_in_area(&scene, &mapper, &AreaQuery::new(&selection));
        // x range 0..20000 in two divisions: A covers -5000..15000; z 0..8300: 1 covers -2075..6225
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_no_axes_yields_nothing() {
        let (scene, mapper) = setup(Vec::new());
        let selection = SelectionRect::cell("A", "1");
        assert!(elements_in_area(&scene, &mapper, &AreaQuery::new(&selection)).is_empty());
    }
}
