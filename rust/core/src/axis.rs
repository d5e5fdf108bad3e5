// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Construction grid axes and tag-space selections.

use std::fmt;

/// Which family an axis belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum AxisKind {
    Row,
    Column,
}

impl fmt::Display for AxisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisKind::Row => f.write_str("row"),
            AxisKind::Column => f.write_str("column"),
        }
    }
}

/// A named grid line at a fixed model coordinate.
///
/// `position` is in model units, before any alignment offset is applied.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct GridAxis {
    pub tag: String,
    pub axis_kind: AxisKind,
    pub position: f64,
}

impl GridAxis {
    pub fn row(tag: impl Into<String>, position: f64) -> Self {
        Self {
            tag: tag.into(),
            axis_kind: AxisKind::Row,
            position,
        }
    }

    pub fn column(tag: impl Into<String>, position: f64) -> Self {
        Self {
            tag: tag.into(),
            axis_kind: AxisKind::Column,
            position,
        }
    }
}

/// Rectangle in axis-tag space, bounded by two row axes and two column axes.
///
/// Start and end may be given in either order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct SelectionRect {
    pub row_start: String,
    pub row_end: String,
    pub col_start: String,
    pub col_end: String,
}

impl SelectionRect {
    pub fn new(
        row_start: impl Into<String>,
        row_end: impl Into<String>,
        col_start: impl Into<String>,
        col_end: impl Into<String>,
    ) -> Self {
        Self {
            row_start: row_start.into(),
            row_end: row_end.into(),
            col_start: col_start.into(),
            col_end: col_end.into(),
        }
    }

    /// Single-cell rectangle sitting on one axis intersection.
    pub fn cell(row: impl Into<String>, col: impl Into<String>) -> Self {
        let row = row.into();
        let col = col.into();
        Self {
            row_start: row.clone(),
            row_end: row,
            col_start: col.clone(),
            col_end: col,
        }
    }
}

impl fmt::Display for SelectionRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Grid {}-{} / {}-{}",
            self.col_start, self.col_end, self.row_start, self.row_end
        )
    }
}
