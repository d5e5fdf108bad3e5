// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the viewer engine.

use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A load finished after a newer load or an unload superseded it.
    #[error("stale load: ticket generation {actual}, current generation {expected}")]
    StaleLoad { expected: u64, actual: u64 },

    /// The operation needs a loaded model.
    #[error("no model loaded")]
    NoModel,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] gridstage_core::Error),

    #[error(transparent)]
    Grid(#[from] gridstage_grid::Error),
}
