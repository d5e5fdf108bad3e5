// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-element visibility and highlight state.
//!
//! Renderable state lives on each [`Primitive`]; everything needed to undo
//! it lives here, in one record per element keyed by id. A record is created
//! the first time an element's material is overridden and remembers the
//! material it had before, exactly once, until highlights are cleared or the
//! scene is reset.

use gridstage_core::{ElementId, Material, MaterialRef, Rgb};
use gridstage_geometry::{Primitive, Scene};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

/// Outcome of a bulk operation. Unknown ids are counted, never fatal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkReport {
    pub applied: usize,
    pub missing: usize,
}

impl BulkReport {
    pub fn merge(self, other: BulkReport) -> BulkReport {
        BulkReport {
            applied: self.applied + other.applied,
            missing: self.missing + other.missing,
        }
    }
}

/// Coarse appearance of an element, derived from its state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum VisualPhase {
    Normal,
    Hidden,
    Highlighted,
    /// Highlighted at reduced opacity, as completed playback stages are.
    DimmedHighlighted,
}

/// Inspection view of one element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementView {
    pub visible: bool,
    pub opacity: f32,
    pub transparent: bool,
    pub color: Rgb,
    pub phase: VisualPhase,
}

#[derive(Debug, Clone, Default)]
struct ElementVisualState {
    highlight: Option<(Rgb, f32)>,
    /// Material before the first override.
    original: Option<MaterialRef>,
}

impl ElementVisualState {
    fn remember(&mut self, primitive: &Primitive) {
        if self.original.is_none() {
            self.original = Some(primitive.material.clone());
        }
    }
}

/// Visibility/highlight compositor over a [`Scene`].
#[derive(Debug, Clone, Default)]
pub struct Compositor {
    states: FxHashMap<ElementId, ElementVisualState>,
    model_opacity: Option<f32>,
}

impl Compositor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every override without touching the scene. Used when the scene
    /// itself is replaced.
    pub fn forget(&mut self) {
        self.states.clear();
        self.model_opacity = None;
    }

    pub fn hide_all(&mut self, scene: &mut Scene) {
        for p in scene.iter_mut() {
            p.visible = false;
        }
    }

    pub fn show_all(&mut self, scene: &mut Scene) {
        for p in scene.iter_mut() {
            p.visible = true;
        }
    }

    /// Set visibility of the given elements only.
    pub fn set_visibility(
        &mut self,
        scene: &mut Scene,
        ids: impl IntoIterator<Item = ElementId>,
        visible: bool,
    ) -> BulkReport {
        let mut report = BulkReport::default();
        for id in ids {
            match scene.primitive_mut(id) {
                Some(p) => {
                    p.visible = visible;
                    report.applied += 1;
                }
                None => report.missing += 1,
            }
        }
        log_missing("set_visibility", report);
        report
    }

    /// Exactly the given elements end up visible.
    pub fn show_only_elements(
        &mut self,
        scene: &mut Scene,
        ids: impl IntoIterator<Item = ElementId>,
    ) -> BulkReport {
        let wanted: FxHashSet<ElementId> = ids.into_iter().collect();
        let mut applied = 0;
        for p in scene.iter_mut() {
            p.visible = wanted.contains(&p.element_id);
            if p.visible {
                applied += 1;
            }
        }
        let report = BulkReport {
            applied,
            missing: wanted.len() - applied,
        };
        log_missing("show_only_elements", report);
        report
    }

    /// Install a highlight material, remembering the original first.
    ///
    /// A later call on the same element overwrites the highlight but never
    /// the remembered original.
    pub fn highlight_elements(
        &mut self,
        scene: &mut Scene,
        ids: impl IntoIterator<Item = ElementId>,
        color: Rgb,
        opacity: f32,
    ) -> BulkReport {
        let opacity = opacity.clamp(0.0, 1.0);
        let material = Material::highlight(color, opacity).into_ref();
        let mut report = BulkReport::default();
        for id in ids {
            let Some(p) = scene.primitive_mut(id) else {
                report.missing += 1;
                continue;
            };
            let state = self.states.entry(id).or_default();
            state.remember(p);
            state.highlight = Some((color, opacity));
            p.material = material.clone();
            report.applied += 1;
        }
        log_missing("highlight_elements", report);
        report
    }

    /// Restore every remembered material, then reapply the model opacity
    /// override if one is active. Visibility is left alone.
    pub fn clear_highlights(&mut self, scene: &mut Scene) {
        let restored = self.restore_originals(scene);
        tracing::debug!(restored, "Cleared highlights");
        if let Some(opacity) = self.model_opacity {
            self.apply_model_opacity(scene, opacity);
        }
    }

    /// `0` hides, `1` shows with an opaque material, anything between shows
    /// with a transparent material at that opacity.
    pub fn set_elements_opacity(
        &mut self,
        scene: &mut Scene,
        ids: impl IntoIterator<Item = ElementId>,
        opacity: f32,
    ) -> BulkReport {
        let opacity = opacity.clamp(0.0, 1.0);
        let mut report = BulkReport::default();
        for id in ids {
            let Some(p) = scene.primitive_mut(id) else {
                report.missing += 1;
                continue;
            };
            report.applied += 1;
            if opacity <= 0.0 {
                p.visible = false;
                continue;
            }
            let state = self.states.entry(id).or_default();
            state.remember(p);
            if let Some((color, _)) = state.highlight {
                state.highlight = Some((color, opacity));
            }
            p.visible = true;
            p.material = p.material.with_opacity(opacity).into_ref();
        }
        log_missing("set_elements_opacity", report);
        report
    }

    /// Dim the whole model. The override survives [`clear_highlights`](Self::clear_highlights).
    pub fn set_model_opacity(&mut self, scene: &mut Scene, opacity: f32) {
        let opacity = opacity.clamp(0.0, 1.0);
        self.model_opacity = Some(opacity);
        self.apply_model_opacity(scene, opacity);
    }

    /// Drop the model opacity override, restoring elements that carry no highlight.
    pub fn clear_model_opacity(&mut self, scene: &mut Scene) {
        if self.model_opacity.take().is_none() {
            return;
        }
        let plain: Vec<ElementId> = self
            .states
            .iter()
            .filter(|(_, s)| s.highlight.is_none())
            .map(|(&id, _)| id)
            .collect();
        for id in plain {
            if let Some(original) = self.states.remove(&id).and_then(|s| s.original) {
                if let Some(p) = scene.primitive_mut(id) {
                    p.material = original;
                }
            }
        }
    }

    pub fn model_opacity(&self) -> Option<f32> {
        self.model_opacity
    }

    /// Full reset: every element visible, opaque and unhighlighted.
    pub fn reset_elements_appearance(&mut self, scene: &mut Scene) {
        self.model_opacity = None;
        self.restore_originals(scene);
        for p in scene.iter_mut() {
            p.visible = true;
            if !p.material.is_opaque() {
                p.material = p.material.with_opacity(1.0).into_ref();
            }
        }
        tracing::debug!(elements = scene.len(), "Reset element appearance");
    }

    /// Number of elements with a remembered original material.
    pub fn remembered(&self) -> usize {
        self.states.values().filter(|s| s.original.is_some()).count()
    }

    pub fn is_highlighted(&self, id: ElementId) -> bool {
        self.states.get(&id).is_some_and(|s| s.highlight.is_some())
    }

    pub fn visual_state(&self, scene: &Scene, id: ElementId) -> Option<ElementView> {
        let p = scene.primitive(id)?;
        let highlight = self.states.get(&id).and_then(|s| s.highlight);
        let phase = match (p.visible, highlight) {
            (false, _) => VisualPhase::Hidden,
            (true, Some((_, opacity))) if opacity < 1.0 => VisualPhase::DimmedHighlighted,
            (true, Some(_)) => VisualPhase::Highlighted,
            (true, None) => VisualPhase::Normal,
        };
        Some(ElementView {
            visible: p.visible,
            opacity: p.material.opacity,
            transparent: p.material.transparent,
            color: p.material.color,
            phase,
        })
    }

    fn restore_originals(&mut self, scene: &mut Scene) -> usize {
        let mut restored = 0;
        for (id, state) in self.states.drain() {
            if let (Some(original), Some(p)) = (state.original, scene.primitive_mut(id)) {
                p.material = original;
                restored += 1;
            }
        }
        restored
    }

    fn apply_model_opacity(&mut self, scene: &mut Scene, opacity: f32) {
        for p in scene.iter_mut() {
            if self.states.get(&p.element_id).is_some_and(|s| s.highlight.is_some()) {
                continue;
            }
            self.states.entry(p.element_id).or_default().remember(p);
            p.material = p.material.with_opacity(opacity).into_ref();
        }
    }
}

fn log_missing(operation: &'static str, report: BulkReport) {
    if report.missing > 0 {
        tracing::debug!(
            operation,
            applied = report.applied,
            missing = report.missing,
            "Skipped unknown element ids"
        );
    }
}
