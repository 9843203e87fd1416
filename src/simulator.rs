// Simulation drivers: one capability, several execution strategies.

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::histogram::Histograms;
use crate::material::Material;
use crate::physics::MaterialPhysics;
use crate::rng::FastRng;
use crate::settings::Settings;
use crate::transport::{run_histories, TransportSummary};

/// Anything that turns `(material, histories)` into displacement histograms.
pub trait Simulator {
    /// Short name used in logs and validation reports.
    fn name(&self) -> &str;

    fn simulate(&self, material: Material, histories: u64) -> Result<Histograms>;

    /// Simulate with the material and history count of the global [`Config`].
    fn simulate_default(&self) -> Result<Histograms> {
        let (material, histories) = {
            let config = Config::global();
            (config.material, config.histories)
        };
        self.simulate(material, histories)
    }
}

pub(crate) fn check_histories(histories: u64) -> Result<()> {
    if histories == 0 {
        return Err(Error::InvalidHistoryCount(histories));
    }
    Ok(())
}

fn log_summary(driver: &str, material: Material, summary: &TransportSummary) {
    info!(
        "{driver}: {} histories in {material}, {:.1} steps per history",
        summary.histories,
        summary.steps as f64 / summary.histories.max(1) as f64
    );
    if summary.truncated > 0 {
        warn!(
            "{driver}: {} histories hit the step budget before the path limit",
            summary.truncated
        );
    }
}

/// Sequential ground-truth driver: one RNG stream, one pair of histograms.
#[derive(Debug, Clone)]
pub struct Reference {
    settings: Settings,
}

impl Reference {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Driver using the settings of the global [`Config`].
    pub fn from_config() -> Self {
        Self::new(Config::global().settings)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

impl Default for Reference {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl Simulator for Reference {
    fn name(&self) -> &str {
        "reference"
    }

    fn simulate(&self, material: Material, histories: u64) -> Result<Histograms> {
        check_histories(histories)?;
        let physics = MaterialPhysics::standard(material, &self.settings)?;
        debug!(
            "reference: {material} A = {:.4e}, lambda0 = {:.4e} mm, L = {:.4e} mm",
            physics.scr_param, physics.elastic_mfp, physics.path_limit
        );

        let mut rng = FastRng::stream(self.settings.seed, 0);
        let mut histograms = Histograms::new();
        let summary = run_histories(&physics, histories, &mut rng, &mut histograms);
        log_summary(self.name(), material, &summary);
        Ok(histograms)
    }
}

/// Split `histories` into `workers` contiguous chunks whose sizes differ by at
/// most one.
pub fn partition(histories: u64, workers: usize) -> Vec<u64> {
    let workers = workers.max(1) as u64;
    let base = histories / workers;
    let extra = histories % workers;
    (0..workers).map(|w| base + u64::from(w < extra)).collect()
}

/// Parallel driver: each worker owns an RNG stream and private histograms,
/// which are summed once every worker has finished.
pub struct Multithread {
    settings: Settings,
    pool: rayon::ThreadPool,
}

impl Multithread {
    /// `threads = None` sizes the pool to the number of cores.
    pub fn new(settings: Settings, threads: Option<usize>) -> Result<Self> {
        let mut builder = rayon::ThreadPoolBuilder::new().thread_name(|i| format!("mcss-worker-{i}"));
        if let Some(n) = threads {
            if n == 0 {
                return Err(Error::InvalidSettings("threads must be > 0".to_string()));
            }
            builder = builder.num_threads(n);
        }
        let pool = builder.build()?;
        Ok(Self { settings, pool })
    }

    /// Driver using the settings and thread count of the global [`Config`].
    pub fn from_config() -> Result<Self> {
        let (settings, threads) = {
            let config = Config::global();
            (config.settings, config.threads)
        };
        Self::new(settings, threads)
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

impl Simulator for Multithread {
    fn name(&self) -> &str {
        "multithread"
    }

    fn simulate(&self, material: Material, histories: u64) -> Result<Histograms> {
        check_histories(histories)?;
        let physics = MaterialPhysics::standard(material, &self.settings)?;
        let chunks = partition(histories, self.workers());
        let seed = self.settings.seed;

        let partials: Vec<(Histograms, TransportSummary)> = self.pool.install(|| {
            chunks
                .par_iter()
                .enumerate()
                .map(|(worker, &count)| {
                    // stream 0 belongs to the reference driver
                    let mut rng = FastRng::stream(seed, worker as u64 + 1);
                    let mut histograms = Histograms::new();
                    let summary = run_histories(&physics, count, &mut rng, &mut histograms);
                    debug!("multithread: worker {worker} finished {count} histories");
                    (histograms, summary)
                })
                .collect()
        });

        let mut histograms = Histograms::new();
        let mut summary = TransportSummary::default();
        for (partial, partial_summary) in &partials {
            histograms.merge(partial)?;
            summary = summary.combine(*partial_summary);
        }
        log_summary(self.name(), material, &summary);
        Ok(histograms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition() {
        assert_eq!(partition(10, 3), vec![4, 3, 3]);
        assert_eq!(partition(2, 4), vec![1, 1, 0, 0]);
        assert_eq!(partition(7, 0), vec![7]);
        assert_eq!(partition(1_000_000, 8).iter().sum::<u64>(), 1_000_000);
    }

    #[test]
    fn test_reference_mass_conservation() {
        let h = Reference::default().simulate(Material::Gold, 1000).unwrap();
        assert_eq!(h.longitudinal.total(), 1000.0);
        assert_eq!(h.transverse.total(), 1000.0);
    }

    #[test]
    fn test_zero_histories_rejected() {
        assert!(matches!(
            Reference::default().simulate(Material::Gold, 0),
            Err(Error::InvalidHistoryCount(0))
        ));
        let mt = Multithread::new(Settings::default(), Some(2)).unwrap();
        assert!(matches!(
            mt.simulate(Material::Gold, 0),
            Err(Error::InvalidHistoryCount(0))
        ));
    }

    #[test]
    fn test_zero_threads_rejected() {
        assert!(matches!(
            Multithread::new(Settings::default(), Some(0)),
            Err(Error::InvalidSettings(_))
        ));
    }

    #[test]
    fn test_multithread_fewer_histories_than_workers() {
        let mt = Multithread::new(Settings::default(), Some(4)).unwrap();
        assert_eq!(mt.workers(), 4);
        let h = mt.simulate(Material::Gold, 3).unwrap();
        assert_eq!(h.histories(), 3.0);
        assert_eq!(h.transverse.total(), 3.0);
    }

    #[test]
    fn test_multithread_deterministic_for_fixed_workers() {
        let mt = Multithread::new(Settings::with_seed(77), Some(3)).unwrap();
        let a = mt.simulate(Material::Bone, 600).unwrap();
        let b = mt.simulate(Material::Bone, 600).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_settings_surface() {
        let settings = Settings {
            path_length_tmfp: -1.0,
            ..Settings::default()
        };
        assert!(matches!(
            Reference::new(settings).simulate(Material::Water, 10),
            Err(Error::InvalidSettings(_))
        ));
    }
}
