// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during scene geometry processing
#[derive(Error, Debug)]
pub enum Error {
    #[error("Empty bounds: {0}")]
    EmptyBounds(String),

    #[error("Camera projection is not invertible")]
    SingularProjection,

    #[error("Degenerate viewport: {width}x{height}")]
    DegenerateViewport { width: f64, height: f64 },

    #[error("Degenerate frustum: aspect {aspect}, near {near}, far {far}")]
    DegenerateFrustum { aspect: f64, near: f64, far: f64 },
}
