// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Staged visibility playback.
//!
//! Playing stage `k` shows the section, dims stages `0..k` and marks stage
//! `k`. Each highlight call overwrites the material of its targets, so the
//! calls are issued in stage order and the current stage goes last.

use gridstage_core::{ElementCategory, ElementId};
use gridstage_geometry::Scene;
use serde::{Deserialize, Serialize};

use crate::compositor::{BulkReport, Compositor};
use crate::config::StageStyle;

/// An ordered subset of a section's elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ElementCategory>,
    pub element_ids: Vec<ElementId>,
}

impl Stage {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        element_ids: Vec<ElementId>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: None,
            element_ids,
        }
    }
}

/// What a playback step touched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackReport {
    /// Id of the stage shown as current, if the index named one.
    pub current_stage: Option<String>,
    pub completed_stages: usize,
    pub section: BulkReport,
    pub completed: BulkReport,
    pub current: BulkReport,
}

impl PlaybackReport {
    /// Stage and section ids that were not in the scene.
    pub fn missing(&self) -> usize {
        self.section.missing + self.completed.missing + self.current.missing
    }
}

/// Colors used for completed and current stages.
#[derive(Debug, Clone, Copy)]
pub struct Playback {
    pub completed: StageStyle,
    pub current: StageStyle,
}

impl Playback {
    pub fn new(completed: StageStyle, current: StageStyle) -> Self {
        Self { completed, current }
    }

    /// Show `section` and highlight stages up to `current_index`.
    ///
    /// An index past the last stage plays every stage as completed.
    pub fn compose(
        &self,
        compositor: &mut Compositor,
        scene: &mut Scene,
        section: &[ElementId],
        stages: &[Stage],
        current_index: usize,
    ) -> PlaybackReport {
        let mut report = PlaybackReport {
            section: compositor.show_only_elements(scene, section.iter().copied()),
            ..Default::default()
        };
        compositor.clear_highlights(scene);

        let done = current_index.min(stages.len());
        for stage in &stages[..done] {
            let r = compositor.highlight_elements(
                scene,
                stage.element_ids.iter().copied(),
                self.completed.color,
                self.completed.opacity,
            );
            report.completed = report.completed.merge(r);
        }
        report.completed_stages = done;

        match stages.get(current_index) {
            Some(stage) => {
                report.current = compositor.highlight_elements(
                    scene,
                    stage.element_ids.iter().copied(),
                    self.current.color,
                    self.current.opacity,
                );
                report.current_stage = Some(stage.id.clone());
            }
            None => {
                tracing::warn!(
                    current_index,
                    stages = stages.len(),
                    "Playback index past the last stage"
                );
            }
        }

        tracing::debug!(
            current = report.current_stage.as_deref().unwrap_or("-"),
            completed = report.completed_stages,
            missing = report.missing(),
            "Composed playback step"
        );
        report
    }
}
