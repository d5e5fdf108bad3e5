// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use approx::assert_relative_eq;
use gridstage_core::{
    ContainmentRelation, ElementId, GridAxis, IngestElement, MemorySource, Rgb, SelectionRect,
    SpatialStructure, StoreyRecord, IDENTITY_TRANSFORM,
};
use gridstage_engine::{EngineConfig, Error, Stage, Viewer, VisualPhase};
use gridstage_geometry::{Camera, Point2, Point3, Vector3, Viewport};
use gridstage_grid::{HoverCell, PointerEvent, SelectionSlot};

/// Box spanning `min..max` in model coordinates.
fn block(id: ElementId, element_type: &str, min: [f32; 3], max: [f32; 3]) -> IngestElement {
    let [x0, y0, z0] = min;
    let [x1, y1, z1] = max;
    IngestElement {
        element_id: id,
        element_type: element_type.to_string(),
        positions: vec![
            x0, y0, z0, x1, y0, z0, x1, y0, z1, x0, y0, z1, //
            x0, y1, z0, x1, y1, z0, x1, y1, z1, x0, y1, z1,
        ],
        indices: vec![0, 1, 2, 0, 2, 3, 4, 5, 6, 4, 6, 7],
        transform: IDENTITY_TRANSFORM,
        color: Rgb::WHITE,
        opacity: 1.0,
        helper: false,
    }
}

/// 100 elements in a 10x10 layout on a 1000 pitch, offset from the origin.
fn hundred_elements() -> Vec<IngestElement> {
    (0..100)
        .map(|i| {
            let x = 5000.0 + (i % 10) as f32 * 1000.0;
            let z = 2000.0 + (i / 10) as f32 * 1000.0;
            block(i + 1, "IfcColumn", [x, 0.0, z], [x + 100.0, 2800.0, z + 100.0])
        })
        .collect()
}

async fn loaded_viewer(elements: Vec<IngestElement>, spatial: SpatialStructure) -> Viewer {
    let mut viewer = Viewer::new(EngineConfig::default()).unwrap();
    let mut source = MemorySource::new(spatial, elements);
    viewer.load(&mut source).await.unwrap();
    viewer
}

fn three_storeys() -> SpatialStructure {
    SpatialStructure {
        storeys: vec![
            StoreyRecord {
                storey_id: 10,
                name: Some("Ground".to_string()),
                elevation: 0.0,
            },
            StoreyRecord {
                storey_id: 11,
                name: Some("First".to_string()),
                elevation: 3000.0,
            },
            StoreyRecord {
                storey_id: 12,
                name: Some("Second".to_string()),
                elevation: 6000.0,
            },
        ],
        containment: vec![ContainmentRelation {
            structure_id: 10,
            related_element_ids: vec![1],
        }],
    }
}

#[tokio::test]
async fn test_show_only_is_exclusive_over_hundred_elements() {
    let mut viewer = loaded_viewer(hundred_elements(), SpatialStructure::default()).await;
    viewer.show_all_elements();
    viewer.show_all_elements();
    assert_eq!(viewer.get_all_element_ids().len(), 100);

    let report = viewer.show_only_elements(&[5, 9]);
    assert_eq!(report.applied, 2);
    let visible: Vec<ElementId> = viewer
        .scene()
        .unwrap()
        .iter()
        .filter(|p| p.visible)
        .map(|p| p.element_id)
        .collect();
    assert_eq!(visible, vec![5, 9]);
}

#[tokio::test]
async fn test_storey_fallback_uses_elevation_bands() {
    let elements = vec![
        block(1, "IfcSlab", [0.0, 6500.0, 0.0], [100.0, 6600.0, 100.0]),
        // Centered at 3500 with no containment
        block(2, "IfcColumn", [0.0, 3000.0, 0.0], [100.0, 4000.0, 100.0]),
        // Just below the second floor, inside its buffer
        block(3, "IfcBeam", [0.0, 5600.0, 0.0], [100.0, 5800.0, 100.0]),
        block(4, "IfcColumn", [0.0, -9000.0, 0.0], [100.0, -8000.0, 100.0]),
    ];
    let viewer = loaded_viewer(elements, three_storeys()).await;
    let scene = viewer.scene().unwrap();
    // Containment wins over elevation
    assert_eq!(scene.primitive(1).unwrap().storey_name, "Ground");
    assert_eq!(scene.primitive(2).unwrap().storey_name, "First");
    assert_eq!(scene.primitive(3).unwrap().storey_name, "Second");
    assert_eq!(scene.primitive(4).unwrap().storey_name, "Unassigned");

    let storeys = viewer.get_storeys();
    let names: Vec<_> = storeys.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Ground", "First", "Second", "Unassigned"]);
    assert_eq!(storeys[1].index, 1);
    assert_eq!(storeys.iter().map(|s| s.mesh_count).sum::<usize>(), 4);
}

#[tokio::test]
async fn test_storey_visibility_toggles_its_elements() {
    let elements = vec![
        block(1, "IfcSlab", [0.0, 0.0, 0.0], [100.0, 100.0, 100.0]),
        block(2, "IfcColumn", [0.0, 3000.0, 0.0], [100.0, 4000.0, 100.0]),
    ];
    let mut viewer = loaded_viewer(elements, three_storeys()).await;
    let report = viewer.set_storey_visibility("First", false);
    assert_eq!(report.applied, 1);
    assert!(!viewer.scene().unwrap().primitive(2).unwrap().visible);
    assert!(viewer.scene().unwrap().primitive(1).unwrap().visible);
    assert!(!viewer.get_storeys()[1].visible);

    viewer.set_all_storeys_visibility(true);
    assert!(viewer.scene().unwrap().iter().all(|p| p.visible));
    assert_eq!(viewer.set_storey_visibility("Roof", false).applied, 0);
}

#[tokio::test]
async fn test_alignment_moves_minimum_to_origin() {
    let viewer = loaded_viewer(hundred_elements(), SpatialStructure::default()).await;
    let alignment = viewer.alignment().unwrap();
    assert_relative_eq!(alignment.offset.x, -5000.0);
    assert_relative_eq!(alignment.offset.y, 0.0);
    assert_relative_eq!(alignment.offset.z, -2000.0);
    let bounds = viewer.scene().unwrap().model_bounds();
    assert_relative_eq!(bounds.min.x, 0.0, epsilon = 1e-6);
    assert_relative_eq!(bounds.min.z, 0.0, epsilon = 1e-6);
    assert_relative_eq!(bounds.min.y, 0.0, epsilon = 1e-6);
}

#[tokio::test]
async fn test_highlight_clear_restores_material_identity() {
    let mut viewer = loaded_viewer(hundred_elements(), SpatialStructure::default()).await;
    let before = viewer.scene().unwrap().primitive(7).unwrap().material.clone();
    viewer.highlight_elements(&[7], Rgb([1.0, 0.0, 0.0]), 1.0);
    assert_eq!(viewer.element_view(7).unwrap().phase, VisualPhase::Highlighted);
    viewer.clear_highlights();
    assert!(Arc::ptr_eq(&before, &viewer.scene().unwrap().primitive(7).unwrap().material));
}

#[tokio::test]
async fn test_opacity_contract() {
    let mut viewer = loaded_viewer(hundred_elements(), SpatialStructure::default()).await;

    viewer.set_elements_opacity(&[3], 0.0);
    assert!(!viewer.element_view(3).unwrap().visible);

    viewer.set_elements_opacity(&[3], 1.0);
    let view = viewer.element_view(3).unwrap();
    assert!(view.visible);
    assert!(!view.transparent);
    assert_eq!(view.opacity, 1.0);

    viewer.set_elements_opacity(&[3], 0.5);
    let view = viewer.element_view(3).unwrap();
    assert!(view.visible);
    assert!(view.transparent);
    assert_eq!(view.opacity, 0.5);

    viewer.reset_elements_appearance();
    let view = viewer.element_view(3).unwrap();
    assert!(view.visible && !view.transparent);
}

#[tokio::test]
async fn test_stage_b_wins_over_stage_a() {
    let mut viewer = loaded_viewer(hundred_elements(), SpatialStructure::default()).await;
    let stage_a = Stage::new("A", "Stage A", vec![1, 2]);
    let stage_b = Stage::new("B", "Stage B", vec![2, 3]);
    let current = viewer.config().current_stage.color;

    let report = viewer.play_stage(&[1, 2, 3, 4], &[stage_a, stage_b], 1).unwrap();
    assert_eq!(report.current_stage.as_deref(), Some("B"));
    assert_eq!(report.missing(), 0);
    assert_eq!(viewer.element_view(2).unwrap().color, current);
    assert_eq!(viewer.element_view(1).unwrap().phase, VisualPhase::DimmedHighlighted);
    assert_eq!(viewer.element_view(50).unwrap().phase, VisualPhase::Hidden);
}

/// Viewer over `hundred_elements` with a three-row grid and a camera looking
/// down at row B, column 1 from the viewport center.
async fn hover_viewer() -> Viewer {
    let mut viewer = loaded_viewer(hundred_elements(), SpatialStructure::default()).await;
    // Model-space axes; the model starts at x=5000, z=2000
    viewer.set_grid_axes(vec![
        GridAxis::row("A", 5000.0),
        GridAxis::row("B", 9500.0),
        GridAxis::row("C", 14_000.0),
        GridAxis::column("1", 2000.0),
        GridAxis::column("2", 11_000.0),
    ]);

    // Aim at aligned (4500, 0, 1000): model (9500, 3000) is on row B, column 1
    let target = Point3::new(4500.0, 0.0, 1000.0);
    let camera = Camera::perspective(
        target + Vector3::new(0.0, 8000.0, 8000.0),
        target,
        std::f64::consts::FRAC_PI_4,
        1.0,
        1.0,
        100_000.0,
    )
    .unwrap();
    viewer.set_camera(camera);
    viewer
}

#[tokio::test]
async fn test_pointer_hover_round_trip() {
    let mut viewer = hover_viewer().await;
    assert!(!viewer.grid_is_virtual());

    let seen: Rc<RefCell<Vec<Option<HoverCell>>>> = Rc::default();
    let sink = seen.clone();
    viewer.on_hover_change(Box::new(move |cell| sink.borrow_mut().push(cell)));

    let viewport = Viewport::new(1000.0, 1000.0);
    let hover = viewer.pointer_move(Point2::new(500.0, 500.0), viewport).unwrap();
    assert_eq!((hover.row_tag.as_str(), hover.col_tag.as_str()), ("B", "1"));
    assert!(viewer.selection_overlays()[2].is_some());

    // Table hover on the same cell gives the same answer
    let from_table = viewer
        .set_hover_cell(Some((hover.row_display_index, hover.col_index)))
        .unwrap();
    assert_eq!(from_table, hover);

    // Pointing past the model reports None and clears the hover rectangle
    assert!(viewer.pointer_move(Point2::new(500.0, 0.0), viewport).is_none());
    assert!(viewer.selection_overlays()[2].is_none());
    assert_eq!(seen.borrow().len(), 2);
    assert!(seen.borrow()[1].is_none());
}

#[tokio::test]
async fn test_pointer_queue_resolves_latest_move_once_per_frame() {
    let mut viewer = hover_viewer().await;
    let fired: Rc<RefCell<Vec<Option<HoverCell>>>> = Rc::default();
    let sink = fired.clone();
    viewer.on_hover_change(Box::new(move |cell| sink.borrow_mut().push(cell)));

    let viewport = Viewport::new(1000.0, 1000.0);
    for position in [(500.0, 0.0), (0.0, 0.0), (500.0, 500.0)] {
        viewer.queue_pointer_move(PointerEvent {
            position: Point2::new(position.0, position.1),
            viewport,
        });
    }

    // Only the last move is resolved; the earlier off-grid ones never surface
    let hover = viewer.process_pointer_queue().unwrap().unwrap();
    assert_eq!((hover.row_tag.as_str(), hover.col_tag.as_str()), ("B", "1"));
    assert_eq!(fired.borrow().len(), 1);
    assert_eq!(fired.borrow()[0].as_ref(), Some(&hover));

    // Nothing queued: no resolution and no listener call
    assert!(viewer.process_pointer_queue().is_none());
    assert_eq!(fired.borrow().len(), 1);
}

#[tokio::test]
async fn test_selection_slots_are_independent() {
    let mut viewer = loaded_viewer(hundred_elements(), SpatialStructure::default()).await;
    viewer.set_draft_selection(Some(SelectionRect::new("A", "B", "01", "02")));
    viewer.set_applied_selection(Some(SelectionRect::cell("A", "01")));
    // No axes supplied: the virtual grid names rows A.. and columns 01..
    assert!(viewer.grid_is_virtual());
    let [draft, applied, _] = viewer.selection_overlays();
    assert!(draft.is_some() && applied.is_some());

    viewer.set_draft_selection(None);
    let [draft, applied, _] = viewer.selection_overlays();
    assert!(draft.is_none());
    assert!(applied.is_some());
    assert!(viewer.selection(SelectionSlot::Applied).is_some());
}

#[tokio::test]
async fn test_stale_load_is_discarded() {
    let mut viewer = loaded_viewer(hundred_elements(), SpatialStructure::default()).await;

    let wall = || vec![block(1, "IfcWall", [0.0; 3], [1.0; 3])];
    let slow = viewer.begin_load();
    let mut source = MemorySource::new(SpatialStructure::default(), wall());
    let result = gridstage_core::collect(&mut source).await;

    // A newer load starts while the first is still in flight
    let fast = viewer.begin_load();
    let err = viewer.finish_load(slow, result).unwrap_err();
    assert!(matches!(
        err,
        Error::StaleLoad { expected, actual }
            if expected == fast.generation() && actual == slow.generation()
    ));
    assert_eq!(viewer.get_all_element_ids().len(), 100);

    let mut source = MemorySource::new(SpatialStructure::default(), wall());
    let result = gridstage_core::collect(&mut source).await;
    let summary = viewer.finish_load(fast, result).unwrap();
    assert_eq!(summary.elements, 1);
    assert_eq!(summary.triangles, 4);
}

#[tokio::test]
async fn test_unload_invalidates_pending_load() {
    let mut viewer = loaded_viewer(hundred_elements(), SpatialStructure::default()).await;
    let ticket = viewer.begin_load();
    viewer.unload();
    let mut source = MemorySource::new(SpatialStructure::default(), hundred_elements());
    let result = gridstage_core::collect(&mut source).await;
    assert!(matches!(viewer.finish_load(ticket, result), Err(Error::StaleLoad { .. })));
    assert!(!viewer.is_loaded());
    assert!(viewer.get_all_element_ids().is_empty());
}

#[tokio::test]
async fn test_ingest_error_keeps_previous_scene() {
    let mut viewer = loaded_viewer(hundred_elements(), SpatialStructure::default()).await;
    let mut broken = block(1, "IfcWall", [0.0; 3], [1.0; 3]);
    broken.indices.push(99);
    let mut source = MemorySource::new(SpatialStructure::default(), vec![broken]);
    assert!(matches!(viewer.load(&mut source).await, Err(Error::Core(_))));
    assert_eq!(viewer.get_all_element_ids().len(), 100);
}
