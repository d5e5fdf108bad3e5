// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for grid mapping.
//!
//! None of these are fatal to the viewer: callers hide the affected overlay
//! element and log.

use gridstage_core::AxisKind;

/// Result type alias for grid operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A selection named a tag that is not in the current axis set.
    #[error("unknown {kind} axis tag {tag:?}")]
    UnknownAxisTag { kind: AxisKind, tag: String },

    /// No axes of this kind are loaded.
    #[error("no {0} axes loaded")]
    NoAxes(AxisKind),

    /// The model bounds cannot host an overlay.
    #[error("degenerate bounds: {0}")]
    DegenerateBounds(String),
}
