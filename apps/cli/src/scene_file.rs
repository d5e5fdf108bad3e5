// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JSON scene files: parser output plus the grid and stage data a viewer
//! would otherwise fetch from its data service.

use std::path::Path;

use anyhow::{Context, Result};
use gridstage_core::{ElementId, GridAxis, IngestElement, MemorySource, SpatialStructure};
use gridstage_engine::{Stage, UserSequence};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneFile {
    pub elements: Vec<IngestElement>,
    #[serde(default)]
    pub spatial: SpatialStructure,
    /// Model-space grid axes. Empty means a virtual grid.
    #[serde(default)]
    pub grid_axes: Vec<GridAxis>,
    #[serde(default)]
    pub stages: Vec<Stage>,
    #[serde(default)]
    pub sequences: Vec<UserSequence>,
    /// Section shown during playback; defaults to every stage element.
    #[serde(default)]
    pub section: Vec<ElementId>,
}

impl SceneFile {
    pub async fn read(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("cannot read scene file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("cannot parse scene file {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Split into the geometry source and the grid/stage data.
    pub fn into_parts(self) -> (MemorySource, SceneData) {
        let source = MemorySource::new(self.spatial, self.elements);
        let data = SceneData {
            grid_axes: self.grid_axes,
            stages: self.stages,
            sequences: self.sequences,
            section: self.section,
        };
        (source, data)
    }
}

/// Everything in a scene file besides geometry.
#[derive(Debug, Default)]
pub struct SceneData {
    pub grid_axes: Vec<GridAxis>,
    pub stages: Vec<Stage>,
    pub sequences: Vec<UserSequence>,
    pub section: Vec<ElementId>,
}

impl SceneData {
    /// The explicit section, or the union of all stage elements.
    pub fn section_for(&self, stages: &[Stage]) -> Vec<ElementId> {
        if !self.section.is_empty() {
            return self.section.clone();
        }
        let mut ids: Vec<ElementId> = stages
            .iter()
            .flat_map(|s| s.element_ids.iter().copied())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}
