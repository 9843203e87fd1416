use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Homogeneous target materials with tabulated Molière coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Material {
    Water,
    Air,
    Bone,
    Tissue,
    Gold,
}

impl Material {
    /// Number of tabulated materials.
    pub const COUNT: usize = 5;

    /// Every material, in table order.
    pub const ALL: [Material; Material::COUNT] = [
        Material::Water,
        Material::Air,
        Material::Bone,
        Material::Tissue,
        Material::Gold,
    ];

    /// Row of this material in the coefficient tables.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Material::Water => 0,
            Material::Air => 1,
            Material::Bone => 2,
            Material::Tissue => 3,
            Material::Gold => 4,
        }
    }

    /// Lowercase name, as used in configuration files.
    pub fn name(self) -> &'static str {
        match self {
            Material::Water => "water",
            Material::Air => "air",
            Material::Bone => "bone",
            Material::Tissue => "tissue",
            Material::Gold => "gold",
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Material {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Material::ALL
            .into_iter()
            .find(|m| m.name() == wanted)
            .ok_or_else(|| Error::UnknownMaterial(s.to_string()))
    }
}
