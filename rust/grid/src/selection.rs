// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Draft, applied and hover selection rectangles.

use std::fmt;

use gridstage_core::{AxisKind, SelectionRect};
use serde::Serialize;

use crate::axes::AxisSet;
use crate::mapper::{CellIndex, GridMapper, OverlayRect};

/// Which of the three live rectangles an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionSlot {
    Draft,
    Applied,
    Hover,
}

impl SelectionSlot {
    pub const ALL: [SelectionSlot; 3] = [Self::Draft, Self::Applied, Self::Hover];

    fn index(self) -> usize {
        match self {
            Self::Draft => 0,
            Self::Applied => 1,
            Self::Hover => 2,
        }
    }
}

impl fmt::Display for SelectionSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Applied => write!(f, "applied"),
            Self::Hover => write!(f, "hover"),
        }
    }
}

/// A hovered grid cell, reported to hover listeners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoverCell {
    pub row_tag: String,
    pub col_tag: String,
    /// Ascending row index.
    pub row_index: usize,
    /// Row index in the descending table order.
    pub row_display_index: usize,
    pub col_index: usize,
}

impl HoverCell {
    /// Resolve a cell against the canonical axis order.
    pub fn from_cell(axes: &AxisSet, cell: CellIndex) -> Option<Self> {
        Some(Self {
            row_tag: axes.tag_at(AxisKind::Row, cell.row)?.to_string(),
            col_tag: axes.tag_at(AxisKind::Column, cell.col)?.to_string(),
            row_index: cell.row,
            row_display_index: axes.ascending_to_display(cell.row)?,
            col_index: cell.col,
        })
    }

    pub fn selection(&self) -> SelectionRect {
        SelectionRect::cell(self.row_tag.as_str(), self.col_tag.as_str())
    }
}

#[derive(Debug, Clone, Default)]
struct Slot {
    selection: Option<SelectionRect>,
    overlay: Option<OverlayRect>,
}

/// Owns the three selection rectangles and their realized overlay geometry.
///
/// A rectangle whose tags cannot be mapped stays selected but has no
/// overlay, so it reappears once the axes that name it are loaded.
#[derive(Debug, Clone, Default)]
pub struct SelectionController {
    slots: [Slot; 3],
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_draft(&mut self, selection: Option<SelectionRect>, mapper: Option<&GridMapper>) {
        self.set(SelectionSlot::Draft, selection, mapper);
    }

    pub fn set_applied(&mut self, selection: Option<SelectionRect>, mapper: Option<&GridMapper>) {
        self.set(SelectionSlot::Applied, selection, mapper);
    }

    pub fn set_hover(&mut self, selection: Option<SelectionRect>, mapper: Option<&GridMapper>) {
        self.set(SelectionSlot::Hover, selection, mapper);
    }

    /// Update one slot and realize it. `None` hides only this slot.
    pub fn set(
        &mut self,
        slot: SelectionSlot,
        selection: Option<SelectionRect>,
        mapper: Option<&GridMapper>,
    ) {
        let overlay = match (&selection, mapper) {
            (Some(rect), Some(mapper)) => realize(slot, rect, mapper),
            _ => None,
        };
        self.slots[slot.index()] = Slot { selection, overlay };
    }

    /// Hover driven by a cell from pointer picking.
    pub fn set_hover_cell(
        &mut self,
        cell: Option<CellIndex>,
        mapper: &GridMapper,
    ) -> Option<HoverCell> {
        let hover = cell.and_then(|c| HoverCell::from_cell(mapper.axes(), c));
        self.set_hover(hover.as_ref().map(HoverCell::selection), Some(mapper));
        hover
    }

    /// Hover driven by a table cell. The table lists rows top-down, so the
    /// display row index is reversed into the ascending order the mapper uses.
    pub fn set_hover_from_table(
        &mut self,
        row_display_index: usize,
        col_index: usize,
        mapper: &GridMapper,
    ) -> Option<HoverCell> {
        let cell = mapper
            .axes()
            .display_to_ascending(row_display_index)
            .map(|row| CellIndex { row, col: col_index });
        self.set_hover_cell(cell, mapper)
    }

    pub fn selection(&self, slot: SelectionSlot) -> Option<&SelectionRect> {
        self.slots[slot.index()].selection.as_ref()
    }

    pub fn overlay(&self, slot: SelectionSlot) -> Option<OverlayRect> {
        self.slots[slot.index()].overlay
    }

    /// Realized rectangles in slot order: draft, applied, hover.
    pub fn overlays(&self) -> [Option<OverlayRect>; 3] {
        [
            self.overlay(SelectionSlot::Draft),
            self.overlay(SelectionSlot::Applied),
            self.overlay(SelectionSlot::Hover),
        ]
    }

    /// Re-realize every slot against new axes or bounds.
    pub fn refresh(&mut self, mapper: Option<&GridMapper>) {
        for slot in SelectionSlot::ALL {
            let selection = self.slots[slot.index()].selection.take();
            self.set(slot, selection, mapper);
        }
    }

    pub fn clear(&mut self, slot: SelectionSlot) {
        self.slots[slot.index()] = Slot::default();
    }

    pub fn clear_all(&mut self) {
        self.slots = Default::default();
    }
}

fn realize(slot: SelectionSlot, rect: &SelectionRect, mapper: &GridMapper) -> Option<OverlayRect> {
    match mapper.cell_rect(rect) {
        Ok(overlay) => Some(overlay),
        Err(e) => {
            tracing::warn!(%slot, selection = %rect, error = %e, "Hiding selection overlay");
            None
        }
    }
}
