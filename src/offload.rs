//! Offloaded execution of the scattering kernel.
//!
//! An accelerator is modelled as an opaque, blocking device: it is handed the
//! material, the history count and the transport settings, and returns the
//! finished histograms. How it gets there (pipelining, batching, reduced
//! precision) is its own business; the only requirement is statistical
//! equivalence with the [`Reference`](crate::simulator::Reference) driver.
//!
//! [`LaneEmulator`] is the software device shipped with the crate. It mirrors
//! how a streaming pipeline evaluates the kernel: a fixed set of lanes is kept
//! busy, every lane advances one step per pass in single precision, and a lane
//! whose track terminates is immediately refilled with the next history.

use log::{debug, info};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::histogram::Histograms;
use crate::material::Material;
use crate::physics::MaterialPhysics;
use crate::rng::FastRng;
use crate::settings::Settings;
use crate::simulator::{check_histories, Simulator};

/// Contract of an accelerator that runs whole simulations.
pub trait OffloadDevice: Send + Sync {
    fn name(&self) -> &str;

    /// Run `histories` histories to completion.
    fn run(&self, material: Material, histories: u64, settings: &Settings) -> Result<Histograms>;
}

/// [`Simulator`] backed by an [`OffloadDevice`].
pub struct OffloadSimulator<D: OffloadDevice> {
    device: D,
    settings: Settings,
}

impl<D: OffloadDevice> OffloadSimulator<D> {
    pub fn new(device: D, settings: Settings) -> Self {
        Self { device, settings }
    }

    pub fn device(&self) -> &D {
        &self.device
    }
}

impl<D: OffloadDevice> Simulator for OffloadSimulator<D> {
    fn name(&self) -> &str {
        self.device.name()
    }

    fn simulate(&self, material: Material, histories: u64) -> Result<Histograms> {
        check_histories(histories)?;
        self.settings.validate()?;
        let histograms = self.device.run(material, histories, &self.settings)?;
        let recorded = histograms.histories();
        if recorded != histories as f64 {
            return Err(Error::Device {
                device: self.device.name().to_string(),
                reason: format!("returned {recorded} histories, expected {histories}"),
            });
        }
        info!("{}: {histories} histories in {material}", self.device.name());
        Ok(histograms)
    }
}

// Streams used by the emulator start here so they never coincide with the
// CPU drivers' worker streams.
const LANE_STREAM_BASE: u64 = 1 << 32;

/// Single-precision step constants, with lengths in units of the path limit.
#[derive(Debug, Clone, Copy)]
struct LaneConstants {
    scr_param: f32,
    mfp: f32,
    max_steps: u64,
}

/// Structure-of-arrays lane state.
struct Lanes {
    x: Vec<f32>,
    y: Vec<f32>,
    z: Vec<f32>,
    u: Vec<f32>,
    v: Vec<f32>,
    w: Vec<f32>,
    path: Vec<f32>,
    steps: Vec<u64>,
    active: Vec<bool>,
    rng: Vec<FastRng>,
}

impl Lanes {
    fn new(count: usize, seed: u64) -> Self {
        Self {
            x: vec![0.0; count],
            y: vec![0.0; count],
            z: vec![0.0; count],
            u: vec![0.0; count],
            v: vec![0.0; count],
            w: vec![1.0; count],
            path: vec![0.0; count],
            steps: vec![0; count],
            active: vec![false; count],
            rng: (0..count)
                .map(|lane| FastRng::stream(seed, LANE_STREAM_BASE + lane as u64))
                .collect(),
        }
    }

    fn load(&mut self, i: usize) {
        self.x[i] = 0.0;
        self.y[i] = 0.0;
        self.z[i] = 0.0;
        self.u[i] = 0.0;
        self.v[i] = 0.0;
        self.w[i] = 1.0;
        self.path[i] = 0.0;
        self.steps[i] = 0;
        self.active[i] = true;
    }

    /// Advance lane `i` by one free flight and, if it survives, one elastic
    /// scattering. Returns `true` when the track has terminated.
    #[inline]
    fn step(&mut self, i: usize, k: &LaneConstants) -> bool {
        let rng = &mut self.rng[i];
        let flight = -k.mfp * (1.0 - rng.uniform_f32()).ln();
        let remaining = 1.0 - self.path[i];
        let (u, v, w) = (self.u[i], self.v[i], self.w[i]);
        if flight >= remaining {
            self.x[i] += u * remaining;
            self.y[i] += v * remaining;
            self.z[i] += w * remaining;
            self.path[i] = 1.0;
            self.steps[i] += 1;
            return true;
        }
        self.x[i] += u * flight;
        self.y[i] += v * flight;
        self.z[i] += w * flight;
        self.path[i] += flight;
        self.steps[i] += 1;
        if self.steps[i] >= k.max_steps {
            return true;
        }

        // Sample in u = (1 - cos) / 2 and take sin from u directly; forming
        // 1 - cos in f32 would erase the small angles that dominate.
        let rn = rng.uniform_f32();
        let t = k.scr_param * rn / (1.0 - rn + k.scr_param);
        let t = t.clamp(0.0, 1.0);
        let cos_theta = 1.0 - 2.0 * t;
        let sin_theta = 2.0 * (t * (1.0 - t)).sqrt();
        let phi = 2.0 * std::f32::consts::PI * rng.uniform_f32();
        let (sin_phi, cos_phi) = phi.sin_cos();
        let (u1, u2, u3) = (sin_theta * cos_phi, sin_theta * sin_phi, cos_theta);

        let up = u * u + v * v;
        let (nu, nv, nw) = if up > 0.0 {
            let up = up.sqrt();
            (
                (u * w * u1 - v * u2) / up + u * u3,
                (v * w * u1 + u * u2) / up + v * u3,
                -up * u1 + w * u3,
            )
        } else if w < 0.0 {
            (-u1, u2, -u3)
        } else {
            (u1, u2, u3)
        };
        let inv_norm = 1.0 / (nu * nu + nv * nv + nw * nw).sqrt();
        self.u[i] = nu * inv_norm;
        self.v[i] = nv * inv_norm;
        self.w[i] = nw * inv_norm;
        false
    }
}

/// Software model of a lane-pipelined accelerator.
#[derive(Debug, Clone)]
pub struct LaneEmulator {
    lanes: usize,
}

impl LaneEmulator {
    pub fn new(lanes: usize) -> Result<Self> {
        if lanes == 0 {
            return Err(Error::InvalidSettings("lanes must be > 0".to_string()));
        }
        Ok(Self { lanes })
    }

    pub fn from_config() -> Result<Self> {
        let lanes = Config::global().lanes;
        Self::new(lanes)
    }

    pub fn lanes(&self) -> usize {
        self.lanes
    }
}

impl OffloadDevice for LaneEmulator {
    fn name(&self) -> &str {
        "lane-emulator"
    }

    fn run(&self, material: Material, histories: u64, settings: &Settings) -> Result<Histograms> {
        // Host side: constants are prepared in double precision, then narrowed.
        let physics = MaterialPhysics::standard(material, settings)?;
        let k = LaneConstants {
            scr_param: physics.scr_param as f32,
            mfp: (physics.elastic_mfp / physics.path_limit) as f32,
            max_steps: physics.max_steps,
        };

        let count = self.lanes.min(usize::try_from(histories).unwrap_or(usize::MAX));
        let mut lanes = Lanes::new(count, settings.seed);
        let mut histograms = Histograms::new();
        let mut issued = 0u64;
        let mut in_flight = 0usize;
        for i in 0..count {
            lanes.load(i);
            issued += 1;
            in_flight += 1;
        }

        let mut passes = 0u64;
        while in_flight > 0 {
            for i in 0..count {
                if !lanes.active[i] || !lanes.step(i, &k) {
                    continue;
                }
                let r = lanes.x[i].hypot(lanes.y[i]);
                histograms.record(f64::from(lanes.z[i]), f64::from(r));
                if issued < histories {
                    lanes.load(i);
                    issued += 1;
                } else {
                    lanes.active[i] = false;
                    in_flight -= 1;
                }
            }
            passes += 1;
        }
        debug!("{}: {count} lanes, {passes} pipeline passes", self.name());
        Ok(histograms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    impl OffloadDevice for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn run(&self, _: Material, _: u64, _: &Settings) -> Result<Histograms> {
            // drops every history
            Ok(Histograms::new())
        }
    }

    #[test]
    fn test_emulator_mass_conservation() {
        let device = LaneEmulator::new(16).unwrap();
        let h = device.run(Material::Gold, 1000, &Settings::default()).unwrap();
        assert_eq!(h.longitudinal.total(), 1000.0);
        assert_eq!(h.transverse.total(), 1000.0);
    }

    #[test]
    fn test_emulator_fewer_histories_than_lanes() {
        let device = LaneEmulator::new(64).unwrap();
        let h = device.run(Material::Gold, 5, &Settings::default()).unwrap();
        assert_eq!(h.histories(), 5.0);
    }

    #[test]
    fn test_emulator_deterministic() {
        let sim = OffloadSimulator::new(LaneEmulator::new(8).unwrap(), Settings::with_seed(3));
        let a = sim.simulate(Material::Tissue, 200).unwrap();
        let b = sim.simulate(Material::Tissue, 200).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_emulator_mean_longitudinal() {
        let device = LaneEmulator::new(32).unwrap();
        let h = device.run(Material::Gold, 4000, &Settings::default()).unwrap();
        let mean = h.longitudinal.mean().unwrap();
        let expected = 1.0 - (-1.0f64).exp();
        assert!((mean - expected).abs() < 0.03, "<z>/L = {mean}");
    }

    #[test]
    fn test_zero_lanes_rejected() {
        assert!(LaneEmulator::new(0).is_err());
    }

    #[test]
    fn test_device_losing_histories_is_an_error() {
        let sim = OffloadSimulator::new(Broken, Settings::default());
        assert!(matches!(
            sim.simulate(Material::Gold, 10),
            Err(Error::Device { .. })
        ));
    }
}
