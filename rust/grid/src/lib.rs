// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Gridstage Grid
//!
//! Construction-grid overlay for an aligned model: canonical axis ordering,
//! tag-space to overlay-space mapping and its inverse, the three selection
//! rectangles, pointer picking and grid-area element queries.
//!
//! ```rust,ignore
//! use gridstage_grid::{AxisSet, GridMapper, MapperConfig};
//!
//! let axes = AxisSet::new(axes);
//! let mapper = GridMapper::new(axes, bounds_after, offset, MapperConfig::default())?;
//! let cell = mapper.world_point_to_cell(600.0, 200.0);
//! ```

pub mod area;
pub mod axes;
pub mod error;
pub mod mapper;
pub mod pointer;
pub mod selection;
pub mod virtual_grid;

pub use area::{elements_in_area, AreaBounds, AreaQuery, DEFAULT_AREA_TOLERANCE};
pub use axes::AxisSet;
pub use error::{Error, Result};
pub use mapper::{CellIndex, GridMapper, MapperConfig, OverlayLine, OverlayRect};
pub use pointer::{PointerEvent, PointerQueue, PointerResolver};
pub use selection::{HoverCell, SelectionController, SelectionSlot};
pub use virtual_grid::{column_label, row_label, VirtualGrid, DEFAULT_VIRTUAL_SPACING};
