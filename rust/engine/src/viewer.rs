// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Viewer facade.
//!
//! Owns the loaded scene and every piece of interactive state around it.
//! All mutation happens through `&mut self` on the thread driving the render
//! loop; only ingest is asynchronous, and its result is accepted only if no
//! newer load or unload happened in the meantime.

use std::fmt;

use gridstage_core::{
    ElementCategory, ElementId, GeometrySource, GridAxis, IngestData, Rgb, SelectionRect,
};
use gridstage_geometry::{
    Aabb, Alignment, Camera, ModelAligner, Orientation, Point2, Scene, Storey, StoreyResolver,
    Viewport,
};
use gridstage_grid::{
    elements_in_area, AreaQuery, AxisSet, GridMapper, HoverCell, OverlayLine, OverlayRect,
    PointerEvent, PointerQueue, PointerResolver, SelectionController, SelectionSlot, VirtualGrid,
};
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::compositor::{BulkReport, Compositor, ElementView};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::playback::{Playback, PlaybackReport, Stage};
use crate::sequence::{StageGenerator, UserSequence};
use crate::zones::{Zone, ZoneDetector};

/// Receives every hover change, including `None` when the pointer leaves the grid.
pub type HoverListener = Box<dyn FnMut(Option<HoverCell>)>;

/// Proof that a load was started; only the newest ticket can finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Storey as shown in a storey toggle list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreySummary {
    pub name: String,
    pub elevation: f64,
    pub index: usize,
    pub mesh_count: usize,
    pub visible: bool,
}

/// Result of a successful load.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadSummary {
    pub generation: u64,
    pub elements: usize,
    pub triangles: usize,
    pub storeys: usize,
    pub alignment: Alignment,
    pub virtual_grid: bool,
}

struct LoadedModel {
    scene: Scene,
    storeys: Vec<Storey>,
    alignment: Alignment,
    storey_visible: FxHashMap<String, bool>,
}

pub struct Viewer {
    config: EngineConfig,
    generation: u64,
    model: Option<LoadedModel>,
    compositor: Compositor,
    playback: Playback,
    grid_axes: Vec<GridAxis>,
    grid_is_virtual: bool,
    mapper: Option<GridMapper>,
    selection: SelectionController,
    hover: Option<HoverCell>,
    hover_listener: Option<HoverListener>,
    camera: Option<Camera>,
    pointer_queue: PointerQueue,
}

impl fmt::Debug for Viewer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Viewer")
            .field("generation", &self.generation)
            .field("elements", &self.model.as_ref().map(|m| m.scene.len()))
            .field("grid_axes", &self.grid_axes.len())
            .field("grid_is_virtual", &self.grid_is_virtual)
            .field("hover", &self.hover)
            .finish_non_exhaustive()
    }
}

impl Viewer {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let playback = Playback::new(config.completed_stage, config.current_stage);
        Ok(Self {
            config,
            generation: 0,
            model: None,
            compositor: Compositor::new(),
            playback,
            grid_axes: Vec::new(),
            grid_is_virtual: false,
            mapper: None,
            selection: SelectionController::new(),
            hover: None,
            hover_listener: None,
            camera: None,
            pointer_queue: PointerQueue::new(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ---- load lifecycle ----

    /// Start a load. Any ticket handed out before becomes stale.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        tracing::debug!(generation = self.generation, "Load started");
        LoadTicket {
            generation: self.generation,
        }
    }

    /// Install the result of a load started with `ticket`.
    ///
    /// A stale ticket or an ingest error leaves the current scene untouched.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: gridstage_core::Result<IngestData>,
    ) -> Result<LoadSummary> {
        if ticket.generation != self.generation {
            tracing::warn!(
                ticket = ticket.generation,
                current = self.generation,
                "Discarding result of superseded load"
            );
            return Err(Error::StaleLoad {
                expected: self.generation,
                actual: ticket.generation,
            });
        }
        let data = result.map_err(|e| {
            tracing::warn!(error = %e, "Load failed, keeping previous scene");
            e
        })?;

        let mut scene = Scene::from_ingest(data.elements);
        let storeys =
            StoreyResolver::new(self.config.storey_buffer).resolve(&mut scene, &data.spatial);
        let aligner = ModelAligner::new(self.config.orientation_samples);
        let alignment = match aligner.align(&mut scene) {
            Ok(alignment) => alignment,
            Err(e) => {
                tracing::warn!(error = %e, "Model not aligned");
                Alignment::identity(Aabb::new())
            }
        };
        let storey_visible = storeys.iter().map(|s| (s.name.clone(), true)).collect();

        self.model = Some(LoadedModel {
            scene,
            storeys,
            alignment,
            storey_visible,
        });
        self.compositor.forget();
        self.selection.clear_all();
        self.emit_hover(None);
        self.rebuild_grid();

        let model = self.model.as_ref().ok_or(Error::NoModel)?;
        let summary = LoadSummary {
            generation: self.generation,
            elements: model.scene.len(),
            triangles: model.scene.triangle_count(),
            storeys: model.storeys.len(),
            alignment: model.alignment,
            virtual_grid: self.grid_is_virtual,
        };
        tracing::info!(
            generation = summary.generation,
            elements = summary.elements,
            triangles = summary.triangles,
            storeys = summary.storeys,
            virtual_grid = summary.virtual_grid,
            "Model loaded"
        );
        Ok(summary)
    }

    /// Drain `source` and install it.
    pub async fn load<S>(&mut self, source: &mut S) -> Result<LoadSummary>
    where
        S: GeometrySource + ?Sized,
    {
        let ticket = self.begin_load();
        let result = gridstage_core::collect(source).await;
        self.finish_load(ticket, result)
    }

    /// Drop the model. Loads still in flight become stale.
    pub fn unload(&mut self) {
        self.generation += 1;
        self.model = None;
        self.mapper = None;
        self.grid_is_virtual = false;
        self.compositor.forget();
        self.selection.clear_all();
        self.emit_hover(None);
        tracing::info!(generation = self.generation, "Model unloaded");
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.model.as_ref().map(|m| &m.scene)
    }

    pub fn alignment(&self) -> Option<&Alignment> {
        self.model.as_ref().map(|m| &m.alignment)
    }

    /// Dominant planar orientation. Diagnostic only: the overlay stays axis-aligned.
    pub fn orientation(&self) -> Option<Orientation> {
        self.alignment().map(|a| a.orientation)
    }

    // ---- storeys ----

    pub fn get_storeys(&self) -> Vec<StoreySummary> {
        let Some(model) = &self.model else {
            return Vec::new();
        };
        model
            .storeys
            .iter()
            .map(|s| StoreySummary {
                name: s.name.clone(),
                elevation: s.elevation,
                index: s.index,
                mesh_count: s.mesh_count,
                visible: model.storey_visible.get(&s.name).copied().unwrap_or(true),
            })
            .collect()
    }

    /// Show or hide every element of one storey.
    pub fn set_storey_visibility(&mut self, name: &str, visible: bool) -> BulkReport {
        let Some(model) = &mut self.model else {
            return BulkReport::default();
        };
        let Some(flag) = model.storey_visible.get_mut(name) else {
            tracing::warn!(storey = name, "Unknown storey");
            return BulkReport::default();
        };
        *flag = visible;
        let ids: Vec<ElementId> = model
            .scene
            .iter()
            .filter(|p| p.storey_name == name)
            .map(|p| p.element_id)
            .collect();
        self.compositor.set_visibility(&mut model.scene, ids, visible)
    }

    pub fn set_all_storeys_visibility(&mut self, visible: bool) {
        let Some(model) = &mut self.model else {
            return;
        };
        for flag in model.storey_visible.values_mut() {
            *flag = visible;
        }
        if visible {
            self.compositor.show_all(&mut model.scene);
        } else {
            self.compositor.hide_all(&mut model.scene);
        }
    }

    // ---- element appearance ----

    pub fn get_all_element_ids(&self) -> Vec<ElementId> {
        self.scene().map(Scene::element_ids).unwrap_or_default()
    }

    pub fn highlight_elements(
        &mut self,
        ids: &[ElementId],
        color: Rgb,
        opacity: f32,
    ) -> BulkReport {
        self.with_scene(ids.len(), |c, scene| {
            c.highlight_elements(scene, ids.iter().copied(), color, opacity)
        })
    }

    pub fn clear_highlights(&mut self) {
        self.with_scene(0, |c, scene| {
            c.clear_highlights(scene);
            BulkReport::default()
        });
    }

    pub fn set_elements_opacity(&mut self, ids: &[ElementId], opacity: f32) -> BulkReport {
        self.with_scene(ids.len(), |c, scene| {
            c.set_elements_opacity(scene, ids.iter().copied(), opacity)
        })
    }

    pub fn set_model_opacity(&mut self, opacity: Option<f32>) {
        self.with_scene(0, |c, scene| {
            match opacity {
                Some(opacity) => c.set_model_opacity(scene, opacity),
                None => c.clear_model_opacity(scene),
            }
            BulkReport::default()
        });
    }

    pub fn reset_elements_appearance(&mut self) {
        if let Some(model) = &mut self.model {
            self.compositor.reset_elements_appearance(&mut model.scene);
            for flag in model.storey_visible.values_mut() {
                *flag = true;
            }
        }
    }

    pub fn hide_all_elements(&mut self) {
        self.with_scene(0, |c, scene| {
            c.hide_all(scene);
            BulkReport::default()
        });
    }

    pub fn show_all_elements(&mut self) {
        self.with_scene(0, |c, scene| {
            c.show_all(scene);
            BulkReport::default()
        });
    }

    pub fn show_only_elements(&mut self, ids: &[ElementId]) -> BulkReport {
        self.with_scene(ids.len(), |c, scene| c.show_only_elements(scene, ids.iter().copied()))
    }

    pub fn element_view(&self, id: ElementId) -> Option<ElementView> {
        self.compositor.visual_state(self.scene()?, id)
    }

    /// Without a model every id is a lookup miss.
    fn with_scene(
        &mut self,
        requested: usize,
        f: impl FnOnce(&mut Compositor, &mut Scene) -> BulkReport,
    ) -> BulkReport {
        match &mut self.model {
            Some(model) => f(&mut self.compositor, &mut model.scene),
            None => BulkReport {
                applied: 0,
                missing: requested,
            },
        }
    }

    // ---- grid ----

    /// Replace the grid axes. An empty set switches to a virtual grid.
    pub fn set_grid_axes(&mut self, axes: Vec<GridAxis>) {
        self.grid_axes = axes;
        self.rebuild_grid();
    }

    pub fn grid_is_virtual(&self) -> bool {
        self.grid_is_virtual
    }

    pub fn grid(&self) -> Option<&GridMapper> {
        self.mapper.as_ref()
    }

    pub fn grid_lines(&self) -> Vec<OverlayLine> {
        self.mapper.as_ref().map(GridMapper::lines).unwrap_or_default()
    }

    fn rebuild_grid(&mut self) {
        let Some(model) = &self.model else {
            self.mapper = None;
            self.selection.refresh(None);
            return;
        };

        let (axes, is_virtual) = if self.grid_axes.is_empty() {
            let virtual_grid = VirtualGrid::new(self.config.virtual_grid_spacing);
            match virtual_grid.build(&model.alignment.bounds_before) {
                Ok(axes) => (axes, true),
                Err(e) => {
                    tracing::warn!(error = %e, "No grid available");
                    (Vec::new(), false)
                }
            }
        } else {
            (self.grid_axes.clone(), false)
        };

        self.grid_is_virtual = is_virtual;
        self.mapper = match GridMapper::new(
            AxisSet::new(axes),
            model.alignment.bounds_after,
            model.alignment.offset,
            self.config.mapper(),
        ) {
            Ok(mapper) => Some(mapper),
            Err(e) => {
                tracing::warn!(error = %e, "Grid overlay hidden");
                None
            }
        };
        self.selection.refresh(self.mapper.as_ref());
    }

    // ---- selection and hover ----

    pub fn set_draft_selection(&mut self, selection: Option<SelectionRect>) {
        self.selection.set_draft(selection, self.mapper.as_ref());
    }

    pub fn set_applied_selection(&mut self, selection: Option<SelectionRect>) {
        self.selection.set_applied(selection, self.mapper.as_ref());
    }

    /// Hover from a table cell, rows counted top-down. Not reported to the
    /// hover listener, which exists for pointer-driven hover.
    pub fn set_hover_cell(&mut self, cell: Option<(usize, usize)>) -> Option<HoverCell> {
        let hover = match (cell, &self.mapper) {
            (Some((row, col)), Some(mapper)) => {
                self.selection.set_hover_from_table(row, col, mapper)
            }
            _ => {
                self.selection.set_hover(None, None);
                None
            }
        };
        self.hover = hover.clone();
        hover
    }

    pub fn selection(&self, slot: SelectionSlot) -> Option<&SelectionRect> {
        self.selection.selection(slot)
    }

    /// Realized draft, applied and hover rectangles.
    pub fn selection_overlays(&self) -> [Option<OverlayRect>; 3] {
        self.selection.overlays()
    }

    pub fn hover(&self) -> Option<&HoverCell> {
        self.hover.as_ref()
    }

    pub fn on_hover_change(&mut self, listener: HoverListener) {
        self.hover_listener = Some(listener);
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = Some(camera);
    }

    /// Resolve a pointer position and report the result, `None` included.
    pub fn pointer_move(&mut self, position: Point2<f64>, viewport: Viewport) -> Option<HoverCell> {
        let hover = match (&self.mapper, &self.camera) {
            (Some(mapper), Some(camera)) => {
                let cell = PointerResolver::new(mapper).resolve(position, &viewport, camera);
                self.selection.set_hover_cell(cell, mapper)
            }
            _ => {
                self.selection.set_hover(None, None);
                None
            }
        };
        self.emit_hover(hover.clone());
        hover
    }

    /// Queue a pointer move; only the latest one per frame is resolved.
    pub fn queue_pointer_move(&mut self, event: PointerEvent) {
        self.pointer_queue.push(event);
    }

    /// Resolve the latest queued pointer move, if any.
    pub fn process_pointer_queue(&mut self) -> Option<Option<HoverCell>> {
        let event = self.pointer_queue.take()?;
        Some(self.pointer_move(event.position, event.viewport))
    }

    fn emit_hover(&mut self, hover: Option<HoverCell>) {
        self.hover = hover.clone();
        if let Some(listener) = self.hover_listener.as_mut() {
            listener(hover);
        }
    }

    // ---- areas and playback ----

    /// Model elements inside a grid rectangle, optionally filtered by category.
    pub fn elements_in_area(
        &self,
        selection: &SelectionRect,
        categories: &[ElementCategory],
    ) -> Result<Vec<ElementId>> {
        let (scene, mapper) = self.scene_and_grid()?;
        let query = AreaQuery::new(selection)
            .with_categories(categories)
            .with_tolerance(self.config.area_tolerance);
        Ok(elements_in_area(scene, mapper, &query))
    }

    pub fn generate_sequence_stages(
        &self,
        sequences: &[UserSequence],
        include_footings: bool,
    ) -> Result<Vec<Stage>> {
        let (scene, mapper) = self.scene_and_grid()?;
        Ok(StageGenerator::new(scene, mapper, self.config.area_tolerance)
            .include_footings(include_footings)
            .generate(sequences))
    }

    /// Erection zones over the structural elements of the loaded model,
    /// named after the grid cells they cover.
    pub fn detect_zones(&self) -> Result<Vec<Zone>> {
        let model = self.model.as_ref().ok_or(Error::NoModel)?;
        Ok(ZoneDetector::new(self.config.zone_size).detect(
            &model.scene,
            &model.alignment.offset,
            self.mapper.as_ref().map(GridMapper::axes),
        ))
    }

    /// Zone-by-zone stages, frame storey by storey before finishes.
    pub fn generate_auto_stages(
        &self,
        zones: &[Zone],
        include_footings: bool,
    ) -> Result<Vec<Stage>> {
        let (scene, mapper) = self.scene_and_grid()?;
        let storeys = self
            .model
            .as_ref()
            .map(|m| m.storeys.as_slice())
            .unwrap_or_default();
        Ok(StageGenerator::new(scene, mapper, self.config.area_tolerance)
            .include_footings(include_footings)
            .generate_auto(zones, storeys))
    }

    /// Show `section` with stages up to `current_index` highlighted.
    pub fn play_stage(
        &mut self,
        section: &[ElementId],
        stages: &[Stage],
        current_index: usize,
    ) -> Result<PlaybackReport> {
        let model = self.model.as_mut().ok_or(Error::NoModel)?;
        Ok(self
            .playback
            .compose(&mut self.compositor, &mut model.scene, section, stages, current_index))
    }

    fn scene_and_grid(&self) -> Result<(&Scene, &GridMapper)> {
        let scene = self.scene().ok_or(Error::NoModel)?;
        let mapper = self.mapper.as_ref().ok_or_else(|| {
            Error::Grid(gridstage_grid::Error::DegenerateBounds(
                "no grid for the loaded model".to_string(),
            ))
        })?;
        Ok((scene, mapper))
    }
}
