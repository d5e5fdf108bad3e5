// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for ingest and data-model validation.

use thiserror::Error;

use crate::ElementId;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while reading source data.
///
/// Every variant is fatal to the load that produced it; the caller keeps its
/// previous scene.
#[derive(Error, Debug)]
pub enum Error {
    /// The geometry source could not produce readable data.
    #[error("malformed ingest data: {0}")]
    MalformedIngest(String),

    /// Vertex or index buffers of an element are inconsistent.
    #[error("invalid buffers for element #{element_id}: {reason}")]
    InvalidBuffer { element_id: ElementId, reason: String },

    /// The same element id was produced twice in one load.
    #[error("duplicate element id #{0}")]
    DuplicateElement(ElementId),

    /// A storey record could not be interpreted.
    #[error("invalid storey record {storey_id}: {reason}")]
    InvalidStorey { storey_id: u32, reason: String },
}
