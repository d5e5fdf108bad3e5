// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Synthetic axes for models that carry no grid.

use gridstage_core::GridAxis;
use gridstage_geometry::Aabb;

use crate::error::{Error, Result};

/// Default spacing between synthesized axes, in model units.
pub const DEFAULT_VIRTUAL_SPACING: f64 = 10_000.0;

/// Row letters. `I` and `O` are skipped to avoid confusion with 1 and 0.
const ROW_LETTERS: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";

/// Single letters followed by every two-letter combination.
pub const MAX_ROW_LABELS: usize = ROW_LETTERS.len() * (ROW_LETTERS.len() + 1);

/// Row label for an ascending index: `A..Z`, then `AA, AB, ..`.
pub fn row_label(index: usize) -> Option<String> {
    let n = ROW_LETTERS.len();
    if index < n {
        return Some((ROW_LETTERS[index] as char).to_string());
    }
    if index >= MAX_ROW_LABELS {
        return None;
    }
    let first = ROW_LETTERS[index / n - 1] as char;
    let second = ROW_LETTERS[index % n] as char;
    Some(format!("{first}{second}"))
}

/// Column label for an ascending index: `01, 02, ..`.
pub fn column_label(index: usize) -> String {
    format!("{:02}", index + 1)
}

/// Builds an evenly spaced grid over a model footprint.
#[derive(Debug, Clone, Copy)]
pub struct VirtualGrid {
    spacing: f64,
}

impl Default for VirtualGrid {
    fn default() -> Self {
        Self {
            spacing: DEFAULT_VIRTUAL_SPACING,
        }
    }
}

impl VirtualGrid {
    pub fn new(spacing: f64) -> Self {
        Self { spacing }
    }

    /// Axes in model coordinates, starting at the minimum of `bounds` and
    /// running until one spacing past the maximum. Rows run along x,
    /// columns along z. At most [`MAX_ROW_LABELS`] axes of each kind.
    pub fn build(&self, bounds: &Aabb) -> Result<Vec<GridAxis>> {
        if !bounds.is_valid() {
            return Err(Error::DegenerateBounds(
                "cannot build a grid over empty bounds".to_string(),
            ));
        }
        if !(self.spacing.is_finite() && self.spacing > 0.0) {
            return Err(Error::DegenerateBounds(format!(
                "invalid grid spacing {}",
                self.spacing
            )));
        }

        let size = bounds.size();
        let rows = self.axis_count(size.x);
        let columns = self.axis_count(size.z);

        let mut axes = Vec::with_capacity(rows + columns);
        for (index, tag) in (0..rows).map_while(|i| Some((i, row_label(i)?))) {
            axes.push(GridAxis::row(tag, bounds.min.x + index as f64 * self.spacing));
        }
        for index in 0..columns {
            let z = bounds.min.z + index as f64 * self.spacing;
            axes.push(GridAxis::column(column_label(index), z));
        }

        tracing::info!(rows, columns, spacing = self.spacing, "Built virtual grid");
        Ok(axes)
    }

    /// Axes needed to reach one spacing past `extent`, capped.
    fn axis_count(&self, extent: f64) -> usize {
        let wanted = (extent / self.spacing).floor() + 2.0;
        if wanted.is_finite() && wanted <= MAX_ROW_LABELS as f64 {
            return wanted as usize;
        }
        tracing::warn!(
            wanted,
            limit = MAX_ROW_LABELS,
            spacing = self.spacing,
            "Virtual grid too dense, truncating"
        );
        MAX_ROW_LABELS
    }
}
