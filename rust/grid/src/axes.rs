// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Canonical axis ordering.
//!
//! Axes are sorted once, ascending by position. Row labels are displayed
//! top-down in the opposite order; that view is always derived from the
//! ascending one by index reversal so the two can never drift apart.

use gridstage_core::{AxisKind, GridAxis};

/// Row and column axes, each ascending by position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AxisSet {
    rows: Vec<GridAxis>,
    columns: Vec<GridAxis>,
}

impl AxisSet {
    /// Sort axes into canonical order.
    ///
    /// Axes with a non-finite position are dropped, and a tag repeated
    /// within one kind keeps its first occurrence.
    pub fn new(axes: impl IntoIterator<Item = GridAxis>) -> Self {
        let mut rows: Vec<GridAxis> = Vec::new();
        let mut columns: Vec<GridAxis> = Vec::new();

        for axis in axes {
            if !axis.position.is_finite() {
                tracing::warn!(
                    tag = %axis.tag,
                    kind = %axis.axis_kind,
                    "Dropping axis with non-finite position"
                );
                continue;
            }
            let bucket = match axis.axis_kind {
                AxisKind::Row => &mut rows,
                AxisKind::Column => &mut columns,
            };
            if bucket.iter().any(|a| a.tag == axis.tag) {
                tracing::warn!(
                    tag = %axis.tag,
                    kind = %axis.axis_kind,
                    "Dropping duplicate axis tag"
                );
                continue;
            }
            bucket.push(axis);
        }

        sort_ascending(&mut rows);
        sort_ascending(&mut columns);
        Self { rows, columns }
    }

    /// The single canonical order every consumer derives from.
    pub fn sorted_ascending(&self, kind: AxisKind) -> &[GridAxis] {
        match kind {
            AxisKind::Row => &self.rows,
            AxisKind::Column => &self.columns,
        }
    }

    pub fn len(&self, kind: AxisKind) -> usize {
        self.sorted_ascending(kind).len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.columns.is_empty()
    }

    /// Ascending index of `tag`.
    pub fn index_of(&self, kind: AxisKind, tag: &str) -> Option<usize> {
        self.sorted_ascending(kind).iter().position(|a| a.tag == tag)
    }

    pub fn axis(&self, kind: AxisKind, index: usize) -> Option<&GridAxis> {
        self.sorted_ascending(kind).get(index)
    }

    pub fn tag_at(&self, kind: AxisKind, index: usize) -> Option<&str> {
        self.axis(kind, index).map(|a| a.tag.as_str())
    }

    pub fn position_of(&self, kind: AxisKind, tag: &str) -> Option<f64> {
        self.sorted_ascending(kind)
            .iter()
            .find(|a| a.tag == tag)
            .map(|a| a.position)
    }

    /// Rows in display order (descending position).
    pub fn display_rows(&self) -> impl Iterator<Item = &GridAxis> + '_ {
        self.rows.iter().rev()
    }

    /// `display = count - 1 - ascending`.
    pub fn ascending_to_display(&self, ascending: usize) -> Option<usize> {
        (ascending < self.rows.len()).then(|| self.rows.len() - 1 - ascending)
    }

    /// Inverse of [`ascending_to_display`](Self::ascending_to_display).
    pub fn display_to_ascending(&self, display: usize) -> Option<usize> {
        (display < self.rows.len()).then(|| self.rows.len() - 1 - display)
    }

    /// Tag at a display index. Columns display in ascending order.
    pub fn tag_at_display(&self, kind: AxisKind, display: usize) -> Option<&str> {
        match kind {
            AxisKind::Row => self.tag_at(kind, self.display_to_ascending(display)?),
            AxisKind::Column => self.tag_at(kind, display),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &GridAxis> + '_ {
        self.rows.iter().chain(self.columns.iter())
    }
}

fn sort_ascending(axes: &mut [GridAxis]) {
    axes.sort_by(|a, b| {
        a.position
            .total_cmp(&b.position)
            .then_with(|| a.tag.cmp(&b.tag))
    });
}
