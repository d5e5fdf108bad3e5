// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Gridstage Core
//!
//! Shared vocabulary of the gridstage viewer: element ids, materials, grid
//! axes, tag-space selections and the ingest contract with the external
//! geometry parser.
//!
//! ## Overview
//!
//! - **Ingest**: [`GeometrySource`] streams render primitives, [`collect`]
//!   validates them into [`IngestData`]
//! - **Grid vocabulary**: [`GridAxis`], [`AxisKind`], [`SelectionRect`]
//! - **Appearance**: [`Material`] shared through [`MaterialRef`]
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization support for the data model

pub mod axis;
pub mod category;
pub mod error;
pub mod ingest;
pub mod material;

/// Stable element identity (the IFC express id). Never reused within a load.
pub type ElementId = u32;

pub use axis::{AxisKind, GridAxis, SelectionRect};
pub use category::ElementCategory;
pub use error::{Error, Result};
pub use ingest::{
    collect, ContainmentRelation, GeometrySource, IngestData, IngestElement, MemorySource,
    SpatialStructure, StoreyRecord, IDENTITY_TRANSFORM,
};
pub use material::{Material, MaterialRef, Rgb};
