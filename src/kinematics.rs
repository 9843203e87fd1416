use once_cell::sync::Lazy;

use crate::data::{ELECTRON_MASS, KINETIC_ENERGY};

/// Kinematic state of the simulated particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kinematics {
    /// Rest mass [MeV].
    pub mass: f64,
    /// Kinetic energy [MeV].
    pub kinetic_energy: f64,
    /// Squared momentum (pc)^2 [MeV^2].
    pub ptot2: f64,
    /// Squared velocity in units of c.
    pub beta2: f64,
}

impl Kinematics {
    pub fn new(mass: f64, kinetic_energy: f64) -> Self {
        let ptot2 = kinetic_energy * (kinetic_energy + 2.0 * mass);
        let beta2 = ptot2 / (ptot2 + mass * mass);
        Self {
            mass,
            kinetic_energy,
            ptot2,
            beta2,
        }
    }

    /// 128 keV electrons.
    pub fn electron() -> Self {
        Self::new(ELECTRON_MASS, KINETIC_ENERGY)
    }
}

/// Process-wide kinematics, computed once.
pub static KINEMATICS: Lazy<Kinematics> = Lazy::new(Kinematics::electron);
