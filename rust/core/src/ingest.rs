// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Ingest contract with the geometry parser.
//!
//! The parser itself lives outside this workspace. It hands over a flat list
//! of render primitives plus the storey records and containment relations of
//! the spatial structure. [`collect`] drains a [`GeometrySource`] and validates
//! everything the later stages rely on; any failure is fatal to that load.

use futures_util::future::{BoxFuture, FutureExt};
use futures_util::stream::{self, BoxStream, StreamExt};
use rustc_hash::FxHashSet;

use crate::error::{Error, Result};
use crate::material::Rgb;
use crate::ElementId;

/// Column-major identity matrix.
pub const IDENTITY_TRANSFORM: [f64; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

/// One renderable mesh produced by the parser.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct IngestElement {
    pub element_id: ElementId,
    pub element_type: String,
    /// Vertex positions (x, y, z triplets), Y-up, local to `transform`.
    pub positions: Vec<f32>,
    /// Triangle indices.
    pub indices: Vec<u32>,
    /// Column-major 4x4 world transform.
    #[cfg_attr(feature = "serde", serde(default = "identity_transform"))]
    pub transform: [f64; 16],
    pub color: Rgb,
    #[cfg_attr(feature = "serde", serde(default = "full_opacity"))]
    pub opacity: f32,
    /// Non-model helper geometry (ground plane, markers).
    #[cfg_attr(feature = "serde", serde(default))]
    pub helper: bool,
}

#[cfg(feature = "serde")]
fn identity_transform() -> [f64; 16] {
    IDENTITY_TRANSFORM
}

#[cfg(feature = "serde")]
fn full_opacity() -> f32 {
    1.0
}

impl IngestElement {
    /// Check buffer consistency.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Error::InvalidBuffer {
            element_id: self.element_id,
            reason,
        };

        if self.positions.len() % 3 != 0 {
            return Err(invalid(format!(
                "position buffer length {} is not a multiple of 3",
                self.positions.len()
            )));
        }
        if self.indices.len() % 3 != 0 {
            return Err(invalid(format!(
                "index buffer length {} is not a multiple of 3",
                self.indices.len()
            )));
        }
        let vertex_count = (self.positions.len() / 3) as u32;
        if let Some(&bad) = self.indices.iter().find(|&&i| i >= vertex_count) {
            return Err(invalid(format!(
                "index {} out of range for {} vertices",
                bad, vertex_count
            )));
        }
        if self.positions.iter().any(|v| !v.is_finite()) {
            return Err(invalid("non-finite vertex coordinate".to_string()));
        }
        if self.transform.iter().any(|v| !v.is_finite()) {
            return Err(invalid("non-finite transform".to_string()));
        }
        Ok(())
    }
}

/// `IfcBuildingStorey` as seen by the viewer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct StoreyRecord {
    pub storey_id: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: Option<String>,
    pub elevation: f64,
}

/// `IfcRelContainedInSpatialStructure`: a structure and the elements it holds.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ContainmentRelation {
    pub structure_id: u32,
    pub related_element_ids: Vec<ElementId>,
}

/// Storeys and containment, read once per load.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct SpatialStructure {
    #[cfg_attr(feature = "serde", serde(default))]
    pub storeys: Vec<StoreyRecord>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub containment: Vec<ContainmentRelation>,
}

/// Validated output of one load.
#[derive(Debug, Clone, Default)]
pub struct IngestData {
    pub elements: Vec<IngestElement>,
    pub spatial: SpatialStructure,
}

/// Anything that can deliver a model: a parser worker, a cache, a file.
pub trait GeometrySource {
    /// Storey records and containment relations.
    fn spatial_structure(&mut self) -> BoxFuture<'_, Result<SpatialStructure>>;

    /// Render primitives, streamed in parser order.
    fn elements(&mut self) -> BoxStream<'_, Result<IngestElement>>;
}

/// Source backed by already-parsed data.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    spatial: SpatialStructure,
    elements: Vec<IngestElement>,
}

impl MemorySource {
    pub fn new(spatial: SpatialStructure, elements: Vec<IngestElement>) -> Self {
        Self { spatial, elements }
    }
}

impl GeometrySource for MemorySource {
    fn spatial_structure(&mut self) -> BoxFuture<'_, Result<SpatialStructure>> {
        let spatial = self.spatial.clone();
        async move { Ok(spatial) }.boxed()
    }

    fn elements(&mut self) -> BoxStream<'_, Result<IngestElement>> {
        let elements = std::mem::take(&mut self.elements);
        stream::iter(elements.into_iter().map(Ok)).boxed()
    }
}

/// Drain a source into validated [`IngestData`].
///
/// Repeated storey or element ids, storeys with a non-finite elevation and
/// inconsistent buffers abort the load. Containment relations are passed through
/// untouched: bad containment only degrades storey assignment later.
pub async fn collect<S>(source: &mut S) -> Result<IngestData>
where
    S: GeometrySource + ?Sized,
{
    let spatial = source.spatial_structure().await?;
    let mut storey_ids: FxHashSet<u32> = FxHashSet::default();
    for storey in &spatial.storeys {
        if !storey_ids.insert(storey.storey_id) {
            return Err(Error::MalformedIngest(format!(
                "storey {} is listed more than once",
                storey.storey_id
            )));
        }
        if !storey.elevation.is_finite() {
            return Err(Error::InvalidStorey {
                storey_id: storey.storey_id,
                reason: format!("elevation {} is not finite", storey.elevation),
            });
        }
    }

    let mut elements = Vec::new();
    let mut seen: FxHashSet<ElementId> = FxHashSet::default();
    let mut stream = source.elements();
    while let Some(element) = stream.next().await {
        let element = element?;
        element.validate()?;
        if !seen.insert(element.element_id) {
            return Err(Error::DuplicateElement(element.element_id));
        }
        elements.push(element);
    }

    tracing::debug!(
        elements = elements.len(),
        storeys = spatial.storeys.len(),
        relations = spatial.containment.len(),
        "Collected ingest data"
    );

    Ok(IngestData { elements, spatial })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle(id: ElementId) -> IngestElement {
        IngestElement {
            element_id: id,
            element_type: "IfcBeam".to_string(),
            positions: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0],
            indices: vec![0, 1, 2],
            transform: IDENTITY_TRANSFORM,
            color: Rgb::WHITE,
            opacity: 1.0,
            helper: false,
        }
    }

    #[tokio::test]
    async fn test_collect_memory_source() {
        let spatial = SpatialStructure {
            storeys: vec![StoreyRecord {
                storey_id: 10,
                name: Some("Level 1".into()),
                elevation: 0.0,
            }],
            containment: vec![],
        };
        let mut source = MemorySource::new(spatial, vec![triangle(1), triangle(2)]);
        let data = collect(&mut source).await.unwrap();
        assert_eq!(data.elements.len(), 2);
        assert_eq!(data.spatial.storeys.len(), 1);
    }

    #[tokio::test]
    async fn test_collect_rejects_duplicate_ids() {
        let mut source =
            MemorySource::new(SpatialStructure::default(), vec![triangle(7), triangle(7)]);
        let err = collect(&mut source).await.unwrap_err();
        assert!(matches!(err, Error::DuplicateElement(7)));
    }

    #[tokio::test]
    async fn test_collect_rejects_out_of_range_index() {
        let mut bad = triangle(3);
        bad.indices = vec![0, 1, 5];
        let mut source = MemorySource::new(SpatialStructure::default(), vec![bad]);
        let err = collect(&mut source).await.unwrap_err();
        assert!(matches!(err, Error::InvalidBuffer { element_id: 3, .. }));
    }

    #[tokio::test]
    async fn test_collect_rejects_nan_elevation() {
        let spatial = SpatialStructure {
            storeys: vec![StoreyRecord {
                storey_id: 4,
                name: None,
                elevation: f64::NAN,
            }],
            containment: vec![],
        };
        let mut source = MemorySource::new(spatial, vec![]);
        assert!(matches!(
            collect(&mut source).await,
            Err(Error::InvalidStorey { storey_id: 4, .. })
        ));
    }

    #[tokio::test]
    async fn test_collect_rejects_repeated_storey() {
        let storey = StoreyRecord {
            storey_id: 12,
            name: Some("Level 2".into()),
            elevation: 3000.0,
        };
        let spatial = SpatialStructure {
            storeys: vec![storey.clone(), storey],
            containment: vec![],
        };
        let mut source = MemorySource::new(spatial, vec![triangle(1)]);
        assert!(matches!(
            collect(&mut source).await,
            Err(Error::MalformedIngest(_))
        ));
    }

    #[test]
    fn test_validate_partial_triplet() {
        let mut bad = triangle(1);
        bad.positions.pop();
        assert!(bad.validate().is_err());
    }
}
