// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Element categories used to split a grid area into erection stages.

/// Coarse structural category over IFC entity type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ElementCategory {
    Footings,
    Columns,
    Beams,
    Bracing,
    Slabs,
    Walls,
    Stairs,
    Railings,
}

impl ElementCategory {
    /// Structural erection order: foundations first, slabs after their supports.
    pub const ERECTION_ORDER: [ElementCategory; 8] = [
        ElementCategory::Footings,
        ElementCategory::Columns,
        ElementCategory::Beams,
        ElementCategory::Bracing,
        ElementCategory::Slabs,
        ElementCategory::Walls,
        ElementCategory::Stairs,
        ElementCategory::Railings,
    ];

    /// IFC entity names belonging to this category.
    pub fn ifc_types(self) -> &'static [&'static str] {
        match self {
            ElementCategory::Footings => &["IfcFooting"],
            ElementCategory::Columns => &["IfcColumn"],
            ElementCategory::Beams => &["IfcBeam", "IfcMember"],
            // Bracing is usually modelled as members or plates
            ElementCategory::Bracing => &["IfcMember", "IfcPlate"],
            ElementCategory::Slabs => &["IfcSlab"],
            ElementCategory::Walls => &["IfcWall", "IfcWallStandardCase"],
            ElementCategory::Stairs => &["IfcStair", "IfcStairFlight"],
            ElementCategory::Railings => &["IfcRailing"],
        }
    }

    /// First category in erection order that claims `element_type`.
    ///
    /// `IfcMember` matches beams and bracing; it classifies as a beam.
    pub fn classify(element_type: &str) -> Option<ElementCategory> {
        Self::ERECTION_ORDER
            .into_iter()
            .find(|c| c.matches(element_type))
    }

    /// Load-bearing frame, erected storey by storey before anything else.
    pub fn is_primary(self) -> bool {
        matches!(
            self,
            ElementCategory::Footings
                | ElementCategory::Columns
                | ElementCategory::Beams
                | ElementCategory::Bracing
                | ElementCategory::Slabs
        )
    }

    /// Case-insensitive match against an element type tag such as `IFCBEAM`.
    pub fn matches(self, element_type: &str) -> bool {
        self.ifc_types()
            .iter()
            .any(|t| t.eq_ignore_ascii_case(element_type))
    }

    pub fn label(self) -> &'static str {
        match self {
            ElementCategory::Footings => "Footings",
            ElementCategory::Columns => "Columns",
            ElementCategory::Beams => "Beams",
            ElementCategory::Bracing => "Bracing",
            ElementCategory::Slabs => "Slabs",
            ElementCategory::Walls => "Walls",
            ElementCategory::Stairs => "Stairs",
            ElementCategory::Railings => "Railings",
        }
    }
}
