// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Render materials.
//!
//! Materials are shared through [`MaterialRef`] so that a remembered original
//! can be restored by identity rather than by value.

use std::sync::Arc;

/// Shared handle to an immutable material.
pub type MaterialRef = Arc<Material>;

/// Linear RGB color, each channel in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rgb(pub [f32; 3]);

impl Rgb {
    pub const WHITE: Rgb = Rgb([1.0, 1.0, 1.0]);
    pub const NEUTRAL_GREY: Rgb = Rgb([0.55, 0.57, 0.6]);
    pub const ATTENTION_ORANGE: Rgb = Rgb([1.0, 0.45, 0.05]);

    /// Build a color from an `0xRRGGBB` literal.
    pub fn from_hex(hex: u32) -> Self {
        let r = ((hex >> 16) & 0xff) as f32 / 255.0;
        let g = ((hex >> 8) & 0xff) as f32 / 255.0;
        let b = (hex & 0xff) as f32 / 255.0;
        Rgb([r, g, b])
    }

    /// Parse `#rrggbb` / `rrggbb`.
    pub fn parse(text: &str) -> Option<Self> {
        let digits = text.trim().trim_start_matches('#');
        if digits.len() != 6 {
            return None;
        }
        u32::from_str_radix(digits, 16).ok().map(Self::from_hex)
    }
}

/// Surface appearance of one primitive.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Material {
    pub color: Rgb,
    /// Opacity in `[0, 1]`.
    pub opacity: f32,
    /// Whether the renderer must blend this material.
    pub transparent: bool,
}

impl Material {
    /// Material as delivered by the geometry source.
    pub fn base(color: Rgb, opacity: f32) -> Self {
        let opacity = opacity.clamp(0.0, 1.0);
        Self {
            color,
            opacity,
            transparent: opacity < 1.0,
        }
    }

    /// Flat highlight material.
    pub fn highlight(color: Rgb, opacity: f32) -> Self {
        Self::base(color, opacity)
    }

    /// Copy of this material at a different opacity.
    pub fn with_opacity(&self, opacity: f32) -> Self {
        Self::base(self.color, opacity)
    }

    #[inline]
    pub fn is_opaque(&self) -> bool {
        !self.transparent && self.opacity >= 1.0
    }

    pub fn into_ref(self) -> MaterialRef {
        Arc::new(self)
    }
}
