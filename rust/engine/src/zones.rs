// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Erection zones.
//!
//! The structural footprint is cut into equal bands of roughly `zone_size`
//! in each plan direction, at most [`MAX_ZONES_PER_AXIS`] per direction.
//! Zones are numbered band by band along the row direction, skipping empty
//! ones. Work happens in model coordinates, the space grid axes live in.

use gridstage_core::{AxisKind, ElementCategory, ElementId, SelectionRect};
use gridstage_geometry::{Scene, Vector3};
use gridstage_grid::AxisSet;
use serde::Serialize;

/// Target zone edge length.
pub const DEFAULT_ZONE_SIZE: f64 = 30_000.0;

/// Upper bound on bands per plan direction.
pub const MAX_ZONES_PER_AXIS: usize = 6;

/// A rectangular part of the building erected as a unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    /// 1-based, in detection order.
    pub id: u32,
    /// `Grid c0-c1 / r0-r1` when the zone holds grid cells, else `Zone n`.
    pub name: String,
    pub selection: Option<SelectionRect>,
    /// Model-space x range.
    pub row_range: (f64, f64),
    /// Model-space z range.
    pub col_range: (f64, f64),
    pub element_ids: Vec<ElementId>,
    /// Element count per category, in erection order.
    pub category_counts: Vec<(ElementCategory, usize)>,
}

/// Splits a loaded model into erection zones.
#[derive(Debug, Clone, Copy)]
pub struct ZoneDetector {
    zone_size: f64,
}

impl Default for ZoneDetector {
    fn default() -> Self {
        Self::new(DEFAULT_ZONE_SIZE)
    }
}

impl ZoneDetector {
    pub fn new(zone_size: f64) -> Self {
        Self { zone_size }
    }

    /// Zones over every structural element of `scene`.
    ///
    /// `offset` maps model to world coordinates. Without `axes` zones are
    /// only numbered.
    pub fn detect(
        &self,
        scene: &Scene,
        offset: &Vector3<f64>,
        axes: Option<&AxisSet>,
    ) -> Vec<Zone> {
        let bounds = scene.world_bounds_by_element();
        let placed: Vec<Placed> = scene
            .iter()
            .filter(|p| !p.helper)
            .filter_map(|p| {
                let category = ElementCategory::classify(&p.element_type)?;
                let b = bounds.get(&p.element_id).filter(|b| b.is_valid())?;
                let c = b.center();
                Some(Placed {
                    id: p.element_id,
                    category,
                    x: c.x - offset.x,
                    z: c.z - offset.z,
                })
            })
            .collect();
        if placed.is_empty() {
            return Vec::new();
        }

        let (mut x_min, mut x_max) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut z_min, mut z_max) = (f64::INFINITY, f64::NEG_INFINITY);
        for e in &placed {
            x_min = x_min.min(e.x);
            x_max = x_max.max(e.x);
            z_min = z_min.min(e.z);
            z_max = z_max.max(e.z);
        }
        let rows = Bands::new(x_min, x_max, self.zone_size);
        let cols = Bands::new(z_min, z_max, self.zone_size);

        let mut zones = Vec::new();
        for i in 0..rows.count {
            for j in 0..cols.count {
                let members: Vec<&Placed> = placed
                    .iter()
                    .filter(|e| rows.band_of(e.x) == Some(i) && cols.band_of(e.z) == Some(j))
                    .collect();
                if members.is_empty() {
                    continue;
                }

                let id = zones.len() as u32 + 1;
                let selection = axes.and_then(|axes| {
                    let (r0, r1) = covered_span(axes, AxisKind::Row, &rows, i)?;
                    let (c0, c1) = covered_span(axes, AxisKind::Column, &cols, j)?;
                    Some(SelectionRect::new(r0, r1, c0, c1))
                });
                let name = match &selection {
                    Some(selection) => selection.to_string(),
                    None => format!("Zone {id}"),
                };

                let mut element_ids: Vec<ElementId> = members.iter().map(|e| e.id).collect();
                element_ids.sort_unstable();
                let category_counts = ElementCategory::ERECTION_ORDER
                    .into_iter()
                    .filter_map(|category| {
                        let n = members.iter().filter(|e| e.category == category).count();
                        (n > 0).then_some((category, n))
                    })
                    .collect();

                zones.push(Zone {
                    id,
                    name,
                    selection,
                    row_range: rows.range(i),
                    col_range: cols.range(j),
                    element_ids,
                    category_counts,
                });
            }
        }

        tracing::debug!(
            zones = zones.len(),
            elements = placed.len(),
            row_bands = rows.count,
            col_bands = cols.count,
            "Detected erection zones"
        );
        zones
    }
}

struct Placed {
    id: ElementId,
    category: ElementCategory,
    x: f64,
    z: f64,
}

/// Equal-width bands over `[min, max]`.
#[derive(Debug, Clone, Copy)]
struct Bands {
    min: f64,
    max: f64,
    width: f64,
    count: usize,
}

impl Bands {
    fn new(min: f64, max: f64, zone_size: f64) -> Self {
        let extent = max - min;
        let count = ((extent / zone_size).ceil() as usize).clamp(1, MAX_ZONES_PER_AXIS);
        Self {
            min,
            max,
            width: extent / count as f64,
            count,
        }
    }

    /// Band holding `value`; the upper edge belongs to the last band.
    fn band_of(&self, value: f64) -> Option<usize> {
        if value < self.min || value > self.max {
            return None;
        }
        if self.width <= 0.0 {
            return Some(0);
        }
        let band = ((value - self.min) / self.width).floor() as usize;
        Some(band.min(self.count - 1))
    }

    fn range(&self, band: usize) -> (f64, f64) {
        let start = self.min + band as f64 * self.width;
        (start, start + self.width)
    }
}

/// First and last axis tags of the grid cells centered in `band`. A cell is
/// named after its lower axis.
fn covered_span<'a>(
    axes: &'a AxisSet,
    kind: AxisKind,
    bands: &Bands,
    band: usize,
) -> Option<(&'a str, &'a str)> {
    let sorted = axes.sorted_ascending(kind);
    let mut covered = sorted
        .windows(2)
        .filter(|w| bands.band_of((w[0].position + w[1].position) / 2.0) == Some(band))
        .map(|w| w[0].tag.as_str());
    let first = covered.next()?;
    let last = covered.last().unwrap_or(first);
    Some((first, last))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridstage_core::{GridAxis, IngestElement, Rgb, IDENTITY_TRANSFORM};

    fn pad(id: u32, element_type: &str, x: f32, z: f32) -> IngestElement {
        IngestElement {
            element_id: id,
            element_type: element_type.to_string(),
            positions: vec![
                x - 10.0, 0.0, z - 10.0, //
                x + 10.0, 0.0, z - 10.0, //
                x + 10.0, 100.0, z + 10.0,
            ],
            indices: vec![0, 1, 2],
            transform: IDENTITY_TRANSFORM,
            color: Rgb::WHITE,
            opacity: 1.0,
            helper: false,
        }
    }

    /// 40 m along x, 20 m along z: two row bands, one column band.
    fn scene() -> Scene {
        Scene::from_ingest(vec![
            pad(1, "IfcColumn", 0.0, 0.0),
            pad(2, "IfcBeam", 15_000.0, 20_000.0),
            pad(3, "IfcColumn", 40_000.0, 0.0),
            pad(4, "IfcSlab", 30_000.0, 10_000.0),
            pad(5, "IfcWindow", 5000.0, 5000.0),
        ])
    }

    #[test]
    fn test_bands_follow_zone_size() {
        let zones = ZoneDetector::default().detect(&scene(), &Vector3::zeros(), None);
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0].name, "Zone 1");
        assert_eq!(zones[0].element_ids, vec![1, 2]);
        // The far edge falls into the last band
        assert_eq!(zones[1].element_ids, vec![3, 4]);
        assert_eq!(zones[0].row_range, (0.0, 20_000.0));
        assert_eq!(
            zones[1].category_counts,
            vec![(ElementCategory::Columns, 1), (ElementCategory::Slabs, 1)]
        );
    }

    #[test]
    fn test_zone_names_from_grid_cells() {
        let axes = AxisSet::new(vec![
            GridAxis::row("A", 0.0),
            GridAxis::row("B", 10_000.0),
            GridAxis::row("C", 20_000.0),
            GridAxis::row("D", 30_000.0),
            GridAxis::row("E", 40_000.0),
            GridAxis::column("1", 0.0),
            GridAxis::column("2", 10_000.0),
            GridAxis::column("3", 20_000.0),
        ]);
        let zones = ZoneDetector::default().detect(&scene(), &Vector3::zeros(), Some(&axes));
        let names: Vec<_> = zones.iter().map(|z| z.name.as_str()).collect();
        assert_eq!(names, vec!["Grid 1-2 / A-B", "Grid 1-2 / C-D"]);
        assert_eq!(zones[1].selection, Some(SelectionRect::new("C", "D", "1", "2")));
    }

    #[test]
    fn test_band_count_is_capped() {
        let elements = (0..10)
            .map(|i| pad(i + 1, "IfcColumn", i as f32 * 100_000.0, 0.0))
            .collect();
        let zones = ZoneDetector::new(1000.0).detect(
            &Scene::from_ingest(elements),
            &Vector3::zeros(),
            None,
        );
        assert_eq!(zones.len(), MAX_ZONES_PER_AXIS);
        let total: usize = zones.iter().map(|z| z.element_ids.len()).sum();
        assert_eq!(total, 10);
    }

    #[test]
    fn test_offset_maps_back_to_model_space() {
        let mut scene = scene();
        let shift = Vector3::new(-500.0, 0.0, 250.0);
        for p in scene.iter_mut() {
            p.translate(&shift);
        }
        let zones = ZoneDetector::default().detect(&scene, &shift, None);
        assert_eq!(zones[0].row_range.0, 0.0);
    }

    #[test]
    fn test_no_structural_elements() {
        let scene = Scene::from_ingest(vec![pad(1, "IfcWindow", 0.0, 0.0)]);
        assert!(ZoneDetector::default()
            .detect(&scene, &Vector3::zeros(), None)
            .is_empty());
    }
}
