// src/data.rs
// Compiled-in physical constants and histogram geometry. Every value here is
// read-only configuration; nothing in the crate mutates it.

use once_cell::sync::Lazy;

use crate::material::Material;

/// Electron rest mass [MeV].
pub const ELECTRON_MASS: f64 = 0.510998910;

/// Kinetic energy of the simulated electrons [MeV].
pub const KINETIC_ENERGY: f64 = 0.128;

/// Number of bins in the longitudinal (z / L in [-1, 1]) histogram.
pub const LONGITUDINAL_BINS: usize = 201;

/// Number of bins in the transverse (r / L in [0, 1]) histogram.
pub const TRANSVERSE_BINS: usize = 101;

/// Inverse bin width of the longitudinal histogram; also its offset.
pub const LONGITUDINAL_INV_D: f64 = (LONGITUDINAL_BINS as f64 - 1.0) / 2.0;

/// Inverse bin width of the transverse histogram.
pub const TRANSVERSE_INV_D: f64 = (TRANSVERSE_BINS as f64 - 1.0) / 1.0;

/// Molière `B_c` coefficients [1/mm], indexed by [`Material::index`].
const MOLIERE_BC: [f64; Material::COUNT] = [877.879, 1.02281, 1645.05, 888.813, 12481.2];

/// Molière `X_c^2` coefficients [MeV^2/mm], indexed by [`Material::index`].
const MOLIERE_XC2: [f64; Material::COUNT] = [0.0661905, 7.88813e-05, 0.17879, 0.0647072, 9.72643];

/// Per-material Molière scattering coefficients.
///
/// The physics kernel never reaches for a global; it receives a reference to
/// a table. [`MOLIERE`] is the process-wide instance built from the compiled-in
/// coefficients.
#[derive(Debug, Clone, PartialEq)]
pub struct MoliereTable {
    bc: [f64; Material::COUNT],
    xc2: [f64; Material::COUNT],
}

impl MoliereTable {
    /// Table built from the compiled-in coefficients.
    pub fn standard() -> Self {
        Self::new(MOLIERE_BC, MOLIERE_XC2)
    }

    pub fn new(bc: [f64; Material::COUNT], xc2: [f64; Material::COUNT]) -> Self {
        Self { bc, xc2 }
    }

    /// `B_c` for a material [1/mm].
    #[inline]
    pub fn bc(&self, material: Material) -> f64 {
        self.bc[material.index()]
    }

    /// `X_c^2` for a material [MeV^2/mm].
    #[inline]
    pub fn xc2(&self, material: Material) -> f64 {
        self.xc2[material.index()]
    }
}

impl Default for MoliereTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Process-wide Molière table, initialised on first use and never mutated.
pub static MOLIERE: Lazy<MoliereTable> = Lazy::new(MoliereTable::standard);
