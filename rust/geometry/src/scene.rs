// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Render primitives keyed by element id.

use gridstage_core::{ElementId, IngestElement, Material, MaterialRef};
use nalgebra::{Matrix4, Vector3};
use rayon::prelude::*;
use rustc_hash::FxHashMap;

use crate::bounds::Aabb;
use crate::mesh::MeshBuffers;

/// One renderable mesh derived from a model element.
#[derive(Debug, Clone)]
pub struct Primitive {
    pub element_id: ElementId,
    pub element_type: String,
    pub mesh: MeshBuffers,
    /// Local-to-world transform, alignment offset included.
    pub transform: Matrix4<f64>,
    /// Material delivered by the parser.
    pub base_material: MaterialRef,
    /// Material the renderer currently draws with.
    pub material: MaterialRef,
    pub visible: bool,
    /// Assigned by the storey resolver; empty until then.
    pub storey_name: String,
    /// Helper geometry is rendered but never counted as part of the model.
    pub helper: bool,
}

impl Primitive {
    pub fn from_ingest(element: IngestElement) -> Self {
        let base_material = Material::base(element.color, element.opacity).into_ref();
        Self {
            element_id: element.element_id,
            element_type: element.element_type,
            mesh: MeshBuffers::new(element.positions, element.indices),
            transform: Matrix4::from_column_slice(&element.transform),
            material: base_material.clone(),
            base_material,
            visible: true,
            storey_name: String::new(),
            helper: element.helper,
        }
    }

    /// World-space bounds
    #[inline]
    pub fn world_bounds(&self) -> Aabb {
        self.mesh.world_bounds(&self.transform)
    }

    /// Move the primitive in world space.
    pub fn translate(&mut self, offset: &Vector3<f64>) {
        self.transform = Matrix4::new_translation(offset) * self.transform;
    }
}

/// All primitives of one loaded model.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    primitives: Vec<Primitive>,
    index: FxHashMap<ElementId, usize>,
}

impl Scene {
    /// Build from validated ingest output. Element ids are unique by then.
    pub fn from_ingest(elements: Vec<IngestElement>) -> Self {
        let primitives: Vec<Primitive> =
            elements.into_iter().map(Primitive::from_ingest).collect();
        let index = primitives
            .iter()
            .enumerate()
            .map(|(i, p)| (p.element_id, i))
            .collect();
        Self { primitives, index }
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    pub fn primitive(&self, id: ElementId) -> Option<&Primitive> {
        self.index.get(&id).map(|&i| &self.primitives[i])
    }

    pub fn primitive_mut(&mut self, id: ElementId) -> Option<&mut Primitive> {
        self.index.get(&id).map(|&i| &mut self.primitives[i])
    }

    /// Triangles across all primitives, helpers included.
    pub fn triangle_count(&self) -> usize {
        self.primitives.iter().map(|p| p.mesh.triangle_count()).sum()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Primitive> {
        self.primitives.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Primitive> {
        self.primitives.iter_mut()
    }

    /// Element ids in load order.
    pub fn element_ids(&self) -> Vec<ElementId> {
        self.primitives.iter().map(|p| p.element_id).collect()
    }

    /// Union of the world bounds of every model primitive (helpers excluded).
    pub fn model_bounds(&self) -> Aabb {
        self.primitives
            .par_iter()
            .filter(|p| !p.helper)
            .map(Primitive::world_bounds)
            .reduce(Aabb::new, |a, b| a.union(&b))
    }

    /// World bounds per model primitive, computed in parallel.
    pub fn world_bounds_by_element(&self) -> FxHashMap<ElementId, Aabb> {
        self.primitives
            .par_iter()
            .filter(|p| !p.helper)
            .map(|p| (p.element_id, p.world_bounds()))
            .collect::<Vec<_>>()
            .into_iter()
            .collect()
    }
}
