//! Statistical validation of driver variants against each other.
//!
//! Two runs agree when both their longitudinal and their transverse
//! histograms pass the K-S test at the `equivalent` threshold. The same test
//! must tell the two projections of a single run apart, otherwise agreement
//! would mean nothing.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::histogram::Histograms;
use crate::ks::{compare_histograms, ks_test};
use crate::material::Material;
use crate::simulator::Simulator;

/// Significance thresholds of the validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Minimum p-value for two runs to count as the same distribution.
    pub equivalent: f64,
    /// p-value below which two distributions count as different.
    pub distinct: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            equivalent: 0.95,
            distinct: 0.10,
        }
    }
}

/// p-values of a pairwise comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistributionComparison {
    pub longitudinal: f64,
    pub transverse: f64,
}

impl DistributionComparison {
    pub fn is_equivalent(&self, thresholds: &Thresholds) -> bool {
        self.longitudinal >= thresholds.equivalent && self.transverse >= thresholds.equivalent
    }
}

/// Compare the longitudinal and transverse histograms of two runs.
pub fn compare_distributions(
    reference: &Histograms,
    candidate: &Histograms,
) -> Result<DistributionComparison> {
    let longitudinal = compare_histograms(&reference.longitudinal, &candidate.longitudinal)?;
    let transverse = compare_histograms(&reference.transverse, &candidate.transverse)?;
    Ok(DistributionComparison {
        longitudinal: longitudinal.p_value,
        transverse: transverse.p_value,
    })
}

/// p-value of the transverse against the longitudinal histogram of one run.
pub fn self_discrimination(histograms: &Histograms) -> f64 {
    ks_test(histograms.transverse.counts(), histograms.longitudinal.counts())
}

/// `true` when the test separates the two projections of one run.
pub fn discriminates(histograms: &Histograms, thresholds: &Thresholds) -> bool {
    self_discrimination(histograms) < thresholds.distinct
}

/// Result of validating one candidate driver against the reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub candidate: String,
    pub material: Material,
    pub histories: u64,
    pub comparison: DistributionComparison,
    pub discrimination: f64,
    pub passed: bool,
}

/// Run `reference` and `candidate` with identical arguments and check that
/// their outputs are equivalent and that the candidate's projections are
/// distinguishable.
pub fn validate(
    reference: &dyn Simulator,
    candidate: &dyn Simulator,
    material: Material,
    histories: u64,
    thresholds: &Thresholds,
) -> Result<ValidationReport> {
    let expected = reference.simulate(material, histories)?;
    let actual = candidate.simulate(material, histories)?;
    let comparison = compare_distributions(&expected, &actual)?;
    let discrimination = self_discrimination(&actual);
    let passed = comparison.is_equivalent(thresholds) && discrimination < thresholds.distinct;

    if passed {
        info!(
            "{} vs {}: {material}, {histories} histories, p(longitudinal) = {:.6}, p(transverse) = {:.6}",
            candidate.name(),
            reference.name(),
            comparison.longitudinal,
            comparison.transverse
        );
    } else {
        warn!(
            "{} vs {} failed: {material}, {histories} histories, p(longitudinal) = {:.6}, p(transverse) = {:.6}, p(self) = {:.6}",
            candidate.name(),
            reference.name(),
            comparison.longitudinal,
            comparison.transverse,
            discrimination
        );
    }

    Ok(ValidationReport {
        candidate: candidate.name().to_string(),
        material,
        histories,
        comparison,
        discrimination,
        passed,
    })
}
