// Single-scattering physics for the multiple Coulomb scattering kernel.
//
// Elastic scattering follows the screened Rutherford cross section with
// Molière's screening parameter. All functions here are pure apart from the
// random numbers they are handed.

use nalgebra::Vector3;
use rand::Rng;
use rand_distr::Exp1;

use crate::data::{MoliereTable, MOLIERE};
use crate::error::{Error, Result};
use crate::kinematics::{Kinematics, KINEMATICS};
use crate::material::Material;
use crate::settings::Settings;

/// Molière screening parameter `A = X_c^2 / (4 (pc)^2 B_c)` (dimensionless).
#[inline]
pub fn compute_scr_param(table: &MoliereTable, material: Material, ptot2: f64) -> f64 {
    table.xc2(material) / (4.0 * ptot2 * table.bc(material))
}

/// Elastic mean free path `lambda_0 = beta^2 (1 + A) / B_c` [mm].
///
/// Free-flight lengths between elastic events are exponentially distributed
/// with this mean: `s = -lambda_0 ln(xi)`.
#[inline]
pub fn compute_mfp(table: &MoliereTable, material: Material, beta2: f64, scrpar: f64) -> f64 {
    beta2 * (1.0 + scrpar) / table.bc(material)
}

/// First transport mean free path `lambda_1 = lambda_0 / G_1` [mm], where
/// `G_1 = 2A [(1 + A) ln(1 + 1/A) - 1]` is the mean of `1 - cos(theta)` under
/// the screened Rutherford distribution.
#[inline]
pub fn compute_transport_mfp(elastic_mfp: f64, scrpar: f64) -> f64 {
    let g1 = 2.0 * scrpar * ((1.0 + scrpar) * (1.0 + 1.0 / scrpar).ln() - 1.0);
    elastic_mfp / g1
}

/// Sample `cos(theta)` from the screened Rutherford distribution.
///
/// With `u = (1 - cos(theta)) / 2` the density is `A (1 + A) / (u + A)^2` on
/// `[0, 1]`, which inverts to `u = A xi / (1 - xi + A)`.
#[inline]
pub fn sample_cos_theta(scrpar: f64, rn: f64) -> f64 {
    if scrpar <= 0.0 {
        // no screening width: forward peak collapses to a delta
        return 1.0;
    }
    let u = scrpar * rn / (1.0 - rn + scrpar);
    (1.0 - 2.0 * u).clamp(-1.0, 1.0)
}

/// Uniform azimuthal angle in `[0, 2 pi)`.
#[inline]
pub fn sample_phi<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    2.0 * std::f64::consts::PI * rng.gen::<f64>()
}

/// Scattered direction in the frame whose z axis is the flight direction.
#[inline]
pub fn local_direction(cos_theta: f64, phi: f64) -> Vector3<f64> {
    let sin_theta = ((1.0 - cos_theta) * (1.0 + cos_theta)).max(0.0).sqrt();
    Vector3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta)
}

/// Rotate `local` (given relative to the current flight direction) into the
/// lab frame, overwriting `direction`. The result is re-normalised so that
/// round-off does not accumulate over many steps.
pub fn rotate_to_lab_frame(direction: &mut Vector3<f64>, local: &Vector3<f64>) {
    let (u, v, w) = (direction.x, direction.y, direction.z);
    let (u1, u2, u3) = (local.x, local.y, local.z);
    let up = u * u + v * v;
    if up > 0.0 {
        let up = up.sqrt();
        *direction = Vector3::new(
            (u * w * u1 - v * u2) / up + u * u3,
            (v * w * u1 + u * u2) / up + v * u3,
            -up * u1 + w * u3,
        );
    } else if w < 0.0 {
        // flying along -z: the local frame is mirrored
        *direction = Vector3::new(-u1, u2, -u3);
    } else {
        *direction = *local;
    }
    direction.normalize_mut();
}

/// Per-material step table, computed once per run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialPhysics {
    pub material: Material,
    /// Molière screening parameter.
    pub scr_param: f64,
    /// Elastic mean free path [mm].
    pub elastic_mfp: f64,
    /// First transport mean free path [mm].
    pub transport_mfp: f64,
    /// Path length at which a history terminates [mm].
    pub path_limit: f64,
    /// Step budget per history.
    pub max_steps: u64,
}

impl MaterialPhysics {
    pub fn new(
        material: Material,
        table: &MoliereTable,
        kinematics: &Kinematics,
        settings: &Settings,
    ) -> Result<Self> {
        settings.validate()?;

        let scr_param = compute_scr_param(table, material, kinematics.ptot2);
        let elastic_mfp = compute_mfp(table, material, kinematics.beta2, scr_param);
        let transport_mfp = compute_transport_mfp(elastic_mfp, scr_param);
        let path_limit = settings.path_length_tmfp * transport_mfp;

        let invalid = |reason: String| Error::InvalidPhysics {
            material: material.to_string(),
            reason,
        };
        if !(scr_param.is_finite() && scr_param > 0.0) {
            return Err(invalid(format!("screening parameter {scr_param}")));
        }
        if !(elastic_mfp.is_finite() && elastic_mfp > 0.0) {
            return Err(invalid(format!("elastic mean free path {elastic_mfp}")));
        }
        if !(transport_mfp.is_finite() && transport_mfp > 0.0) {
            return Err(invalid(format!("transport mean free path {transport_mfp}")));
        }
        if !(path_limit.is_finite() && path_limit > 0.0) {
            return Err(invalid(format!("path limit {path_limit}")));
        }

        Ok(Self {
            material,
            scr_param,
            elastic_mfp,
            transport_mfp,
            path_limit,
            max_steps: settings.max_steps,
        })
    }

    /// Step table from the process-wide Molière table and kinematics.
    pub fn standard(material: Material, settings: &Settings) -> Result<Self> {
        Self::new(material, &MOLIERE, &KINEMATICS, settings)
    }

    /// Exponentially distributed distance to the next elastic event [mm].
    #[inline]
    pub fn sample_free_flight<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let n: f64 = rng.sample(Exp1);
        self.elastic_mfp * n
    }

    /// Mean number of elastic events along one history.
    pub fn mean_events(&self) -> f64 {
        self.path_limit / self.elastic_mfp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn scr(material: Material) -> f64 {
        compute_scr_param(&MOLIERE, material, KINEMATICS.ptot2)
    }

    #[test]
    fn test_gold_has_largest_screening_parameter() {
        let gold = scr(Material::Gold);
        for material in Material::ALL {
            if material != Material::Gold {
                assert!(gold > scr(material), "{material}: {} vs gold {gold}", scr(material));
            }
        }
    }

    #[test]
    fn test_water_screening_parameter_value() {
        // 0.0661905 / (4 * 0.147209... * 877.879)
        let a = scr(Material::Water);
        assert!((a - 1.2805e-4).abs() < 1e-7, "A = {a}");
    }

    #[test]
    fn test_mfp_positive_and_transport_longer() {
        for material in Material::ALL {
            let a = scr(material);
            let mfp = compute_mfp(&MOLIERE, material, KINEMATICS.beta2, a);
            let tmfp = compute_transport_mfp(mfp, a);
            assert!(mfp > 0.0, "{material}");
            assert!(tmfp > mfp, "{material}: transport {tmfp} <= elastic {mfp}");
        }
    }

    #[test]
    fn test_cos_theta_in_range() {
        let mut rng = StdRng::seed_from_u64(42);
        for material in Material::ALL {
            let a = scr(material);
            for _ in 0..10_000 {
                let c = sample_cos_theta(a, rng.gen());
                assert!((-1.0..=1.0).contains(&c), "cos = {c}");
            }
        }
    }

    #[test]
    fn test_cos_theta_boundaries() {
        let a = scr(Material::Gold);
        assert_eq!(sample_cos_theta(a, 0.0), 1.0);
        assert!((sample_cos_theta(a, 1.0) + 1.0).abs() < 1e-12);
        assert_eq!(sample_cos_theta(0.0, 0.7), 1.0);
    }

    #[test]
    fn test_cos_theta_mean_matches_g1() {
        // <1 - cos> must equal G1 = lambda_0 / lambda_1
        let a = scr(Material::Gold);
        let mut rng = StdRng::seed_from_u64(7);
        let n = 200_000;
        let mean: f64 = (0..n)
            .map(|_| 1.0 - sample_cos_theta(a, rng.gen()))
            .sum::<f64>()
            / n as f64;
        let g1 = 1.0 / compute_transport_mfp(1.0, a);
        assert!((mean - g1).abs() / g1 < 0.05, "mean {mean} vs G1 {g1}");
    }

    #[test]
    fn test_small_angles_dominate() {
        let a = scr(Material::Water);
        assert!(sample_cos_theta(a, 0.5) > 0.999);
    }

    #[test]
    fn test_rotate_preserves_norm() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut dir = Vector3::new(0.0, 0.0, 1.0);
        for _ in 0..10_000 {
            let c = 2.0 * rng.gen::<f64>() - 1.0;
            let local = local_direction(c, sample_phi(&mut rng));
            let before = dir;
            rotate_to_lab_frame(&mut dir, &local);
            assert!((dir.norm() - 1.0).abs() < 1e-6, "norm = {}", dir.norm());
            assert!((before.dot(&dir) - c).abs() < 1e-6, "polar angle not preserved");
        }
    }

    #[test]
    fn test_rotate_along_axis() {
        let local = local_direction(0.5, 0.0);
        let mut up = Vector3::new(0.0, 0.0, 1.0);
        rotate_to_lab_frame(&mut up, &local);
        assert!((up - local).norm() < 1e-12);

        let mut down = Vector3::new(0.0, 0.0, -1.0);
        rotate_to_lab_frame(&mut down, &local);
        assert!((down.z + 0.5).abs() < 1e-12, "z = {}", down.z);
    }

    #[test]
    fn test_material_physics_table() {
        let settings = Settings::default();
        let physics = MaterialPhysics::standard(Material::Gold, &settings).unwrap();
        assert_eq!(physics.path_limit, physics.transport_mfp);
        assert!(physics.mean_events() > 10.0);
    }

    #[test]
    fn test_material_physics_rejects_bad_table() {
        let table = MoliereTable::new([-1.0; Material::COUNT], [1.0; Material::COUNT]);
        let err = MaterialPhysics::new(Material::Water, &table, &KINEMATICS, &Settings::default());
        assert!(matches!(err, Err(Error::InvalidPhysics { .. })));
    }

    #[test]
    fn test_free_flight_mean() {
        let physics = MaterialPhysics::standard(Material::Water, &Settings::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let n = 100_000;
        let mean = (0..n).map(|_| physics.sample_free_flight(&mut rng)).sum::<f64>() / n as f64;
        assert!((mean / physics.elastic_mfp - 1.0).abs() < 0.02);
    }
}
