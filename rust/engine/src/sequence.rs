// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Erection stages.
//!
//! User sequences name a grid rectangle and optional column tags at which to
//! split it. Every sub-range yields up to three stages in erection order:
//! footings, columns, then beams together with bracing.
//!
//! Automatic stages walk detected zones instead. Within a zone the load
//! bearing frame goes up storey by storey, one stage per category, and walls,
//! stairs and railings follow once the frame is complete.

use gridstage_core::{AxisKind, ElementCategory, ElementId, SelectionRect};
use gridstage_geometry::{Scene, Storey};
use gridstage_grid::{elements_in_area, AreaQuery, GridMapper};
use serde::{Deserialize, Serialize};

use crate::playback::Stage;
use crate::zones::Zone;

/// One user-defined erection area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSequence {
    pub sequence_number: u32,
    #[serde(default)]
    pub name: Option<String>,
    pub selection: SelectionRect,
    /// Column tags splitting the area into sub-ranges.
    #[serde(default)]
    pub splits: Vec<String>,
}

/// Stage kinds in the order they are generated for each sub-range.
const STAGE_KINDS: [(&str, &[ElementCategory]); 3] = [
    ("Footings", &[ElementCategory::Footings]),
    ("Columns", &[ElementCategory::Columns]),
    ("Beams", &[ElementCategory::Beams, ElementCategory::Bracing]),
];

/// Generates stages over a loaded scene and grid.
pub struct StageGenerator<'a> {
    scene: &'a Scene,
    mapper: &'a GridMapper,
    tolerance: f64,
    include_footings: bool,
}

impl<'a> StageGenerator<'a> {
    pub fn new(scene: &'a Scene, mapper: &'a GridMapper, tolerance: f64) -> Self {
        Self {
            scene,
            mapper,
            tolerance,
            include_footings: true,
        }
    }

    pub fn include_footings(mut self, include: bool) -> Self {
        self.include_footings = include;
        self
    }

    /// Stages of every sequence, in order. Empty stages are skipped and do
    /// not consume a stage number.
    pub fn generate(&self, sequences: &[UserSequence]) -> Vec<Stage> {
        let mut stages = Vec::new();
        for sequence in sequences {
            let mut sub_stage = 1;
            for range in self.sub_ranges(sequence) {
                for (kind, categories) in STAGE_KINDS {
                    if !self.include_footings && categories.contains(&ElementCategory::Footings) {
                        continue;
                    }
                    let query = AreaQuery::new(&range)
                        .with_categories(categories)
                        .with_tolerance(self.tolerance);
                    let element_ids = elements_in_area(self.scene, self.mapper, &query);
                    if element_ids.is_empty() {
                        continue;
                    }
                    let id = format!("{}.{}", sequence.sequence_number, sub_stage);
                    stages.push(Stage {
                        name: format!("Stage {id} - {range} {kind}"),
                        id,
                        category: categories.first().copied(),
                        element_ids,
                    });
                    sub_stage += 1;
                }
            }
            tracing::debug!(
                sequence = sequence.sequence_number,
                stages = sub_stage - 1,
                "Generated sequence stages"
            );
        }
        stages
    }

    /// Stages for every zone, ground up. `storeys` must be in ascending
    /// elevation order, as the storey resolver returns them.
    pub fn generate_auto(&self, zones: &[Zone], storeys: &[Storey]) -> Vec<Stage> {
        let mut stages = Vec::new();
        for zone in zones {
            let members: Vec<(&str, ElementCategory, ElementId)> = zone
                .element_ids
                .iter()
                .filter_map(|&id| {
                    let primitive = self.scene.primitive(id)?;
                    let category = ElementCategory::classify(&primitive.element_type)?;
                    Some((primitive.storey_name.as_str(), category, id))
                })
                .collect();

            let mut sub_stage = 1;
            for primary in [true, false] {
                for storey in storeys {
                    let level = short_storey_name(&storey.name);
                    let categories = ElementCategory::ERECTION_ORDER
                        .into_iter()
                        .filter(|c| c.is_primary() == primary)
                        .filter(|&c| self.include_footings || c != ElementCategory::Footings);
                    for category in categories {
                        let element_ids: Vec<ElementId> = members
                            .iter()
                            .filter(|(s, c, _)| *s == storey.name && *c == category)
                            .map(|&(_, _, id)| id)
                            .collect();
                        if element_ids.is_empty() {
                            continue;
                        }
                        let id = format!("{}.{}", zone.id, sub_stage);
                        stages.push(Stage {
                            name: format!("Stage {id} - {level} {}", category.label()),
                            id,
                            category: Some(category),
                            element_ids,
                        });
                        sub_stage += 1;
                    }
                }
            }
            tracing::debug!(zone = zone.id, stages = sub_stage - 1, "Generated zone stages");
        }
        stages
    }

    /// Split the sequence's column span at every split tag inside it.
    fn sub_ranges(&self, sequence: &UserSequence) -> Vec<SelectionRect> {
        let axes = self.mapper.axes();
        let s = &sequence.selection;
        let (Some(a), Some(b)) = (
            axes.index_of(AxisKind::Column, &s.col_start),
            axes.index_of(AxisKind::Column, &s.col_end),
        ) else {
            // Unknown tags still go through the area query's fallback
            return vec![s.clone()];
        };
        let (lo, hi) = (a.min(b), a.max(b));

        let mut points: Vec<usize> = sequence
            .splits
            .iter()
            .filter_map(|tag| {
                let index = axes.index_of(AxisKind::Column, tag);
                if index.is_none() {
                    tracing::warn!(
                        sequence = sequence.sequence_number,
                        split = %tag,
                        "Ignoring unknown split axis"
                    );
                }
                index
            })
            .filter(|&i| i > lo && i < hi)
            .collect();
        points.push(lo);
        points.push(hi);
        points.sort_unstable();
        points.dedup();

        points
            .windows(2)
            .filter_map(|w| {
                Some(SelectionRect::new(
                    s.row_start.as_str(),
                    s.row_end.as_str(),
                    axes.tag_at(AxisKind::Column, w[0])?,
                    axes.tag_at(AxisKind::Column, w[1])?,
                ))
            })
            .collect()
    }
}

/// Compact storey label used in stage names: `L1`, `Mezz`, `Roof`, `L4`.
fn short_storey_name(name: &str) -> String {
    let lower = name.to_lowercase();
    if lower.contains("ground") || ["l1", "level 1", "level1", "gf"].contains(&lower.as_str()) {
        return "L1".to_string();
    }
    if lower.contains("mezz") {
        return "Mezz".to_string();
    }
    if lower.contains("roof") {
        return "Roof".to_string();
    }
    if lower.contains("level 2") || lower.contains("l2") {
        return "L2".to_string();
    }
    if lower.contains("level 3") || lower.contains("l3") {
        return "L3".to_string();
    }
    match name
        .split(|c: char| !c.is_ascii_digit())
        .find(|digits| !digits.is_empty())
    {
        Some(digits) => format!("L{digits}"),
        None => name.chars().take(10).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridstage_core::{GridAxis, IngestElement, Rgb, IDENTITY_TRANSFORM};
    use gridstage_geometry::Vector3;
    use gridstage_grid::{AxisSet, MapperConfig};

    use crate::zones::ZoneDetector;

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

    fn mapper_for(scene: &Scene) -> GridMapper {
        let axes = AxisSet::new(vec![
            GridAxis::row("A", 0.0),
            GridAxis::row("B", 10_000.0),
            GridAxis::column("1", 0.0),
            GridAxis::column("2", 6000.0),
            GridAxis::column("3", 12_000.0),
            GridAxis::column("4", 18_000.0),
        ]);
        let bounds = scene.model_bounds();
        GridMapper::new(axes, bounds, Vector3::zeros(), MapperConfig::default()).unwrap()
    }

    fn fixture() -> (Scene, GridMapper) {
        let scene = Scene::from_ingest(vec![
            pad(1, "IfcFooting", 0.0, 0.0),
            pad(2, "IfcColumn", 0.0, 0.0),
            pad(3, "IfcColumn", 0.0, 12_000.0),
            pad(4, "IfcBeam", 5000.0, 3000.0),
            pad(5, "IfcPlate", 5000.0, 15_000.0),
            pad(6, "IfcMember", 9000.0, 14_000.0),
        ]);
        let mapper = mapper_for(&scene);
        (scene, mapper)
    }

    fn storey(name: &str, elevation: f64, index: usize) -> Storey {
        Storey {
            name: name.to_string(),
            elevation,
            index,
            mesh_count: 0,
        }
    }

    /// Two storeys: frame on both, a wall below and a railing above.
    fn two_storey_scene() -> Scene {
        let mut scene = Scene::from_ingest(vec![
            pad(1, "IfcFooting", 0.0, 0.0),
            pad(2, "IfcColumn", 0.0, 0.0),
            pad(3, "IfcColumn", 0.0, 12_000.0),
            pad(4, "IfcBeam", 5000.0, 3000.0),
            pad(5, "IfcPlate", 5000.0, 15_000.0),
            pad(6, "IfcMember", 9000.0, 14_000.0),
            pad(7, "IfcWall", 1000.0, 1000.0),
            pad(8, "IfcRailing", 2000.0, 2000.0),
        ]);
        for p in scene.iter_mut() {
            let upper = matches!(p.element_id, 3 | 5 | 8);
            p.storey_name = if upper { "Level 2" } else { "Ground Floor" }.to_string();
        }
        scene
    }

    #[test]
    fn test_split_sequence_generates_ordered_stages() {
        let (scene, mapper) = fixture();
        let sequence = UserSequence {
            sequence_number: 1,
            name: None,
            selection: SelectionRect::new("A", "B", "1", "4"),
            splits: vec!["3".to_string()],
        };
        let stages = StageGenerator::new(&scene, &mapper, 500.0).generate(&[sequence]);
        let names: Vec<_> = stages.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Stage 1.1 - Grid 1-3 / A-B Footings",
                "Stage 1.2 - Grid 1-3 / A-B Columns",
                "Stage 1.3 - Grid 1-3 / A-B Beams",
                "Stage 1.4 - Grid 3-4 / A-B Columns",
                "Stage 1.5 - Grid 3-4 / A-B Beams",
            ]
        );
        assert_eq!(stages[1].element_ids, vec![2, 3]);
        // Members count once even though they match beams and bracing
        assert_eq!(stages[4].element_ids, vec![5, 6]);
        assert_eq!(stages[3].element_ids, vec![3]);
    }

    #[test]
    fn test_footings_can_be_excluded() {
        let (scene, mapper) = fixture();
        let sequence = UserSequence {
            sequence_number: 2,
            name: Some("North".to_string()),
            selection: SelectionRect::new("A", "B", "1", "2"),
            splits: vec!["9".to_string(), "4".to_string()],
        };
        let stages = StageGenerator::new(&scene, &mapper, 500.0)
            .include_footings(false)
            .generate(&[sequence]);
        let ids: Vec<_> = stages.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["2.1", "2.2"]);
        assert_eq!(stages[0].category, Some(ElementCategory::Columns));
        assert_eq!(stages[1].element_ids, vec![4]);
    }

    #[test]
    fn test_auto_stages_build_frame_before_finishes() {
        let scene = two_storey_scene();
        let mapper = mapper_for(&scene);
        let zones = ZoneDetector::default().detect(&scene, &Vector3::zeros(), None);
        assert_eq!(zones.len(), 1);
        let storeys = [storey("Ground Floor", 0.0, 0), storey("Level 2", 3000.0, 1)];

        let stages = StageGenerator::new(&scene, &mapper, 500.0).generate_auto(&zones, &storeys);
        let names: Vec<_> = stages.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Stage 1.1 - L1 Footings",
                "Stage 1.2 - L1 Columns",
                "Stage 1.3 - L1 Beams",
                "Stage 1.4 - L2 Columns",
                "Stage 1.5 - L2 Bracing",
                "Stage 1.6 - L1 Walls",
                "Stage 1.7 - L2 Railings",
            ]
        );
        // Members are erected with the beams only
        assert_eq!(stages[2].element_ids, vec![4, 6]);
        assert_eq!(stages[4].element_ids, vec![5]);
        assert_eq!(stages[6].category, Some(ElementCategory::Railings));
    }

    #[test]
    fn test_auto_stages_without_footings() {
        let scene = two_storey_scene();
        let mapper = mapper_for(&scene);
        let zones = ZoneDetector::default().detect(&scene, &Vector3::zeros(), None);
        let storeys = [storey("Ground Floor", 0.0, 0), storey("Level 2", 3000.0, 1)];
        let stages = StageGenerator::new(&scene, &mapper, 500.0)
            .include_footings(false)
            .generate_auto(&zones, &storeys);
        assert_eq!(stages.len(), 6);
        assert_eq!(stages[0].name, "Stage 1.1 - L1 Columns");
    }

    #[test]
    fn test_short_storey_names() {
        assert_eq!(short_storey_name("Ground Floor"), "L1");
        assert_eq!(short_storey_name("GF"), "L1");
        assert_eq!(short_storey_name("Mezzanine"), "Mezz");
        assert_eq!(short_storey_name("Roof Plant"), "Roof");
        assert_eq!(short_storey_name("Level 2"), "L2");
        assert_eq!(short_storey_name("Storey 07"), "L07");
        assert_eq!(short_storey_name("Basement parking"), "Basement p");
    }
}
