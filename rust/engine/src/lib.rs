// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Gridstage Engine
//!
//! The viewer core behind a construction-grid building viewer: the
//! per-element visibility and highlight compositor, staged playback, stage
//! generation from grid sequences or detected zones and the [`Viewer`] facade tying scene,
//! storeys, grid overlay and pointer hover together.
//!
//! ```rust,ignore
//! use gridstage_engine::{EngineConfig, Viewer};
//!
//! let mut viewer = Viewer::new(EngineConfig::from_env())?;
//! viewer.load(&mut source).await?;
//! viewer.show_only_elements(&[5, 9]);
//! ```

pub mod compositor;
pub mod config;
pub mod error;
pub mod playback;
pub mod sequence;
pub mod viewer;
pub mod zones;

pub use compositor::{BulkReport, Compositor, ElementView, VisualPhase};
pub use config::{EngineConfig, StageStyle};
pub use error::{Error, Result};
pub use playback::{Playback, PlaybackReport, Stage};
pub use sequence::{StageGenerator, UserSequence};
pub use viewer::{HoverListener, LoadSummary, LoadTicket, StoreySummary, Viewer};
pub use zones::{Zone, ZoneDetector, DEFAULT_ZONE_SIZE, MAX_ZONES_PER_AXIS};

