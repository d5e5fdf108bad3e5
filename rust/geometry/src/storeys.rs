// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Storey assignment.
//!
//! Every model primitive is assigned to a storey, first through the spatial
//! containment relation and otherwise by the elevation band its vertical
//! center falls in. Primitives matching neither join a synthesized
//! `Unassigned` storey that always sorts last.

use gridstage_core::{ElementId, SpatialStructure};
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::scene::Scene;

/// Name of the storey collecting primitives no rule could place.
pub const UNASSIGNED_STOREY: &str = "Unassigned";

/// Default margin below a floor level that still counts as that floor.
pub const DEFAULT_STOREY_BUFFER: f64 = 500.0;

/// A building level after resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Storey {
    pub name: String,
    /// `-inf` for the unassigned storey.
    pub elevation: f64,
    /// Position in ascending elevation order.
    pub index: usize,
    pub mesh_count: usize,
}

impl Storey {
    pub fn is_unassigned(&self) -> bool {
        self.elevation == f64::NEG_INFINITY && self.name == UNASSIGNED_STOREY
    }
}

/// How a primitive got its storey; kept for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionStats {
    pub by_containment: usize,
    pub by_elevation: usize,
    pub unassigned: usize,
}

/// Assigns `storey_name` on every model primitive.
#[derive(Debug, Clone, Copy)]
pub struct StoreyResolver {
    buffer: f64,
}

impl Default for StoreyResolver {
    fn default() -> Self {
        Self::new(DEFAULT_STOREY_BUFFER)
    }
}

impl StoreyResolver {
    pub fn new(buffer: f64) -> Self {
        Self {
            buffer: buffer.max(0.0),
        }
    }

    /// Resolve storeys for `scene`, returning them ascending by elevation
    /// with per-storey mesh counts.
    pub fn resolve(&self, scene: &mut Scene, spatial: &SpatialStructure) -> Vec<Storey> {
        let (storeys, stats) = self.resolve_with_stats(scene, spatial);
        tracing::info!(
            storeys = storeys.len(),
            by_containment = stats.by_containment,
            by_elevation = stats.by_elevation,
            unassigned = stats.unassigned,
            "Resolved storeys"
        );
        storeys
    }

    pub fn resolve_with_stats(
        &self,
        scene: &mut Scene,
        spatial: &SpatialStructure,
    ) -> (Vec<Storey>, ResolutionStats) {
        let mut records: Vec<(String, f64, u32)> = spatial
            .storeys
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let name = s
                    .name
                    .as_deref()
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Storey_{}", i + 1));
                (name, s.elevation, s.storey_id)
            })
            .collect();
        records.sort_by(|a, b| a.1.total_cmp(&b.1));

        let mut storeys: Vec<Storey> = records
            .iter()
            .enumerate()
            .map(|(index, (name, elevation, _))| Storey {
                name: name.clone(),
                elevation: *elevation,
                index,
                mesh_count: 0,
            })
            .collect();

        let storey_by_id: FxHashMap<u32, usize> = records
            .iter()
            .enumerate()
            .map(|(index, (_, _, id))| (*id, index))
            .collect();

        // First relation naming an element wins; relations to non-storey
        // structures (sites, spaces) are ignored.
        let mut contained: FxHashMap<ElementId, usize> = FxHashMap::default();
        for rel in &spatial.containment {
            let Some(&storey_index) = storey_by_id.get(&rel.structure_id) else {
                continue;
            };
            for &element_id in &rel.related_element_ids {
                contained.entry(element_id).or_insert(storey_index);
            }
        }

        let elevations: Vec<f64> = storeys.iter().map(|s| s.elevation).collect();
        let bounds = scene.world_bounds_by_element();

        let mut stats = ResolutionStats::default();
        let mut counts = vec![0usize; storeys.len()];
        for primitive in scene.iter_mut() {
            if primitive.helper {
                continue;
            }

            let resolved = match contained.get(&primitive.element_id) {
                Some(&index) => {
                    stats.by_containment += 1;
                    Some(index)
                }
                None => {
                    let by_band = bounds
                        .get(&primitive.element_id)
                        .filter(|b| b.is_valid())
                        .and_then(|b| self.band_index(&elevations, b.vertical_center()));
                    if by_band.is_some() {
                        stats.by_elevation += 1;
                    }
                    by_band
                }
            };

            match resolved {
                Some(index) => {
                    counts[index] += 1;
                    primitive.storey_name = storeys[index].name.clone();
                }
                None => {
                    stats.unassigned += 1;
                    primitive.storey_name = UNASSIGNED_STOREY.to_string();
                    tracing::debug!(
                        element_id = primitive.element_id,
                        "No storey for element, using {}",
                        UNASSIGNED_STOREY
                    );
                }
            }
        }

        for (storey, count) in storeys.iter_mut().zip(counts) {
            storey.mesh_count = count;
        }
        if stats.unassigned > 0 {
            storeys.push(Storey {
                name: UNASSIGNED_STOREY.to_string(),
                elevation: f64::NEG_INFINITY,
                index: storeys.len(),
                mesh_count: stats.unassigned,
            });
        }

        (storeys, stats)
    }

    /// Index of the storey whose band `[elevation - buffer, next_elevation)`
    /// holds `y`. Bands overlap by the buffer; the upper storey wins there.
    /// The top band is unbounded above.
    fn band_index(&self, elevations: &[f64], y: f64) -> Option<usize> {
        (0..elevations.len()).rev().find(|&i| {
            let lower = elevations[i] - self.buffer;
            let upper = elevations.get(i + 1).copied().unwrap_or(f64::INFINITY);
            lower <= y && y < upper
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::test_support::box_element;
    use gridstage_core::{ContainmentRelation, StoreyRecord};

    fn three_storeys() -> SpatialStructure {
        SpatialStructure {
            storeys: vec![
                StoreyRecord { storey_id: 30, name: Some("Level 2".into()), elevation: 6000.0 },
                StoreyRecord { storey_id: 10, name: Some("Ground".into()), elevation: 0.0 },
                StoreyRecord { storey_id: 20, name: Some("Level 1".into()), elevation: 3000.0 },
            ],
            containment: vec![],
        }
    }

    #[test]
    fn test_storeys_sorted_by_elevation() {
        let mut scene = Scene::from_ingest(vec![]);
        let storeys = StoreyResolver::default().resolve(&mut scene, &three_storeys());
        let names: Vec<_> = storeys.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Ground", "Level 1", "Level 2"]);
        assert_eq!(storeys[2].index, 2);
    }

    #[test]
    fn test_elevation_fallback_picks_band_below() {
        // Centered at 3500: inside [3000, 6000) so storey 1, not storey 2
        let mut scene = Scene::from_ingest(vec![box_element(
            1,
            "IfcColumn",
            [0.0, 3200.0, 0.0],
            [100.0, 3800.0, 100.0],
        )]);
        let storeys = StoreyResolver::default().resolve(&mut scene, &three_storeys());
        assert_eq!(scene.primitive(1).unwrap().storey_name, "Level 1");
        assert_eq!(storeys[1].mesh_count, 1);
        assert_eq!(storeys[2].mesh_count, 0);
    }

    #[test]
    fn test_buffer_below_floor_belongs_to_upper_storey() {
        // Beam hanging 200 under the Level 1 slab
        let mut scene = Scene::from_ingest(vec![box_element(
            1,
            "IfcBeam",
            [0.0, 2700.0, 0.0],
            [100.0, 2900.0, 100.0],
        )]);
        StoreyResolver::new(500.0).resolve(&mut scene, &three_storeys());
        assert_eq!(scene.primitive(1).unwrap().storey_name, "Level 1");
    }

    #[test]
    fn test_top_storey_is_unbounded() {
        let mut scene = Scene::from_ingest(vec![box_element(
            1,
            "IfcRoof",
            [0.0, 90_000.0, 0.0],
            [10.0, 91_000.0, 10.0],
        )]);
        StoreyResolver::default().resolve(&mut scene, &three_storeys());
        assert_eq!(scene.primitive(1).unwrap().storey_name, "Level 2");
    }

    #[test]
    fn test_containment_overrides_elevation() {
        let mut spatial = three_storeys();
        spatial.containment.push(ContainmentRelation {
            structure_id: 30,
            related_element_ids: vec![1],
        });
        let mut scene = Scene::from_ingest(vec![box_element(
            1,
            "IfcColumn",
            [0.0, 0.0, 0.0],
            [100.0, 100.0, 100.0],
        )]);
        let (_, stats) = StoreyResolver::default().resolve_with_stats(&mut scene, &spatial);
        assert_eq!(scene.primitive(1).unwrap().storey_name, "Level 2");
        assert_eq!(stats.by_containment, 1);
    }

    #[test]
    fn test_unknown_structure_falls_back_to_elevation() {
        let mut spatial = three_storeys();
        spatial.containment.push(ContainmentRelation {
            structure_id: 999,
            related_element_ids: vec![1],
        });
        let mut scene = Scene::from_ingest(vec![box_element(
            1,
            "IfcColumn",
            [0.0, 6100.0, 0.0],
            [100.0, 6500.0, 100.0],
        )]);
        let (_, stats) = StoreyResolver::default().resolve_with_stats(&mut scene, &spatial);
        assert_eq!(scene.primitive(1).unwrap().storey_name, "Level 2");
        assert_eq!(stats.by_elevation, 1);
    }

    #[test]
    fn test_unmatched_elements_join_unassigned_last() {
        let mut scene = Scene::from_ingest(vec![
            box_element(1, "IfcPile", [0.0, -9000.0, 0.0], [10.0, -8000.0, 10.0]),
            box_element(2, "IfcSlab", [0.0, 0.0, 0.0], [10.0, 10.0, 10.0]),
        ]);
        let storeys = StoreyResolver::default().resolve(&mut scene, &three_storeys());
        let last = storeys.last().unwrap();
        assert!(last.is_unassigned());
        assert_eq!(last.index, 3);
        assert_eq!(last.mesh_count, 1);
        assert_eq!(scene.primitive(1).unwrap().storey_name, UNASSIGNED_STOREY);
    }

    #[test]
    fn test_no_storeys_means_everything_unassigned() {
        let mut scene = Scene::from_ingest(vec![box_element(1, "IfcSlab", [0.0; 3], [1.0; 3])]);
        let storeys = StoreyResolver::default().resolve(&mut scene, &SpatialStructure::default());
        assert_eq!(storeys.len(), 1);
        assert!(storeys[0].is_unassigned());
    }

    #[test]
    fn test_unnamed_storey_gets_positional_name() {
        let spatial = SpatialStructure {
            storeys: vec![StoreyRecord { storey_id: 1, name: None, elevation: 0.0 }],
            containment: vec![],
        };
        let mut scene = Scene::from_ingest(vec![]);
        let storeys = StoreyResolver::default().resolve(&mut scene, &spatial);
        assert_eq!(storeys[0].name, "Storey_1");
    }
}
