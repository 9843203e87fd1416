//! Multiple Coulomb scattering simulation of 128 keV electrons.
//!
//! Electrons start at the origin flying along +z and scatter elastically
//! (screened Rutherford, Molière screening) until they have travelled a fixed,
//! material-dependent path. Their final longitudinal and transverse
//! displacements are histogrammed. Several drivers produce these histograms
//! and a two-sample Kolmogorov–Smirnov test checks that they agree.
//!
//! ```no_run
//! use mcss::{Material, Multithread, Reference, Settings, Simulator};
//! use mcss::validation::compare_distributions;
//!
//! let settings = Settings::with_seed(42);
//! let reference = Reference::new(settings).simulate(Material::Water, 100_000)?;
//! let parallel = Multithread::new(settings, None)?.simulate(Material::Water, 100_000)?;
//! let p = compare_distributions(&reference, &parallel)?;
//! assert!(p.longitudinal >= 0.95 && p.transverse >= 0.95);
//! # Ok::<(), mcss::Error>(())
//! ```

pub mod config;
pub mod data;
mod error;
pub mod histogram;
pub mod kinematics;
pub mod ks;
mod material;
pub mod offload;
pub mod physics;
pub mod rng;
pub mod settings;
pub mod simulator;
pub mod track;
pub mod transport;
pub mod validation;

pub use config::Config;
pub use data::{MoliereTable, MOLIERE};
pub use error::{Error, Result};
pub use histogram::{Histogram, Histograms};
pub use kinematics::{Kinematics, KINEMATICS};
pub use ks::ks_test;
pub use material::Material;
pub use offload::{LaneEmulator, OffloadDevice, OffloadSimulator};
pub use physics::{
    compute_mfp, compute_scr_param, compute_transport_mfp, rotate_to_lab_frame, sample_cos_theta,
    MaterialPhysics,
};
pub use rng::FastRng;
pub use settings::Settings;
pub use simulator::{Multithread, Reference, Simulator};
pub use track::Track;
