//! Two-sample Kolmogorov–Smirnov test on binned data.
//!
//! Each series is read as a histogram over its bin index: the empirical CDF at
//! bin `i` is the cumulative count up to and including `i` divided by the
//! series total. The statistic is the largest gap between the two CDFs and the
//! p-value comes from the asymptotic Kolmogorov distribution.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::histogram::Histogram;

/// What counts as the size of a binned sample when converting D to a p-value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleSize {
    /// Number of bins: agreement judged at histogram resolution.
    Bins,
    /// Total count: every binned observation counts as one sample.
    Counts,
}

/// Outcome of one test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KsResult {
    /// Maximum CDF distance D.
    pub statistic: f64,
    pub p_value: f64,
}

/// Kolmogorov distribution tail `Q(lambda) = 2 sum (-1)^(j-1) exp(-2 j^2 lambda^2)`.
///
/// The series converges too slowly near zero; there Q is 1 to within any
/// meaningful precision, and that is what is returned.
pub fn kolmogorov_q(lambda: f64) -> f64 {
    const EPS1: f64 = 1.0e-3;
    const EPS2: f64 = 1.0e-8;

    let a2 = -2.0 * lambda * lambda;
    let mut fac = 2.0;
    let mut sum = 0.0;
    let mut previous = 0.0;
    for j in 1..=100 {
        let j = j as f64;
        let term = fac * (a2 * j * j).exp();
        sum += term;
        if term.abs() <= EPS1 * previous || term.abs() <= EPS2 * sum {
            return sum.clamp(0.0, 1.0);
        }
        fac = -fac;
        previous = term.abs();
    }
    1.0
}

fn total(series: &[f64]) -> f64 {
    series.iter().sum()
}

/// Largest distance between the binned CDFs of `a` and `b`.
///
/// The series may differ in length; past its last bin a series' CDF is 1
/// (all of its mass has been seen). A series with zero total has CDF 0.
pub fn ks_statistic(a: &[f64], b: &[f64]) -> f64 {
    let (ta, tb) = (total(a), total(b));
    let end_a = if ta > 0.0 { 1.0 } else { 0.0 };
    let end_b = if tb > 0.0 { 1.0 } else { 0.0 };

    // cumulative counts are divided once per bin so the last bin lands on exactly 1
    let (mut sa, mut sb) = (0.0, 0.0);
    let mut d: f64 = 0.0;
    for i in 0..a.len().max(b.len()) {
        let ca = match a.get(i) {
            Some(&x) => {
                sa += x;
                if ta > 0.0 { sa / ta } else { 0.0 }
            }
            None => end_a,
        };
        let cb = match b.get(i) {
            Some(&x) => {
                sb += x;
                if tb > 0.0 { sb / tb } else { 0.0 }
            }
            None => end_b,
        };
        d = d.max((ca - cb).abs());
    }
    d
}

/// p-value for statistic `d` between samples of sizes `n` and `m`.
pub fn ks_p_value(d: f64, n: f64, m: f64) -> f64 {
    let en = (n * m / (n + m)).sqrt();
    kolmogorov_q((en + 0.12 + 0.11 / en) * d)
}

/// Full test with an explicit notion of sample size.
///
/// # Panics
/// If either series is empty.
pub fn ks_test_with(a: &[f64], b: &[f64], size: SampleSize) -> KsResult {
    assert!(!a.is_empty() && !b.is_empty(), "K-S test needs two non-empty series");
    let statistic = ks_statistic(a, b);
    let (n, m) = match size {
        SampleSize::Bins => (a.len() as f64, b.len() as f64),
        SampleSize::Counts => (total(a), total(b)),
    };
    let p_value = if n > 0.0 && m > 0.0 {
        ks_p_value(statistic, n, m)
    } else {
        // nothing observed on one side: no evidence against equality
        1.0
    };
    KsResult { statistic, p_value }
}

/// p-value that `a` and `b` were drawn from the same distribution, judged at
/// the resolution of their bins. `ks_test(x, x) == 1.0`.
///
/// # Panics
/// If either series is empty.
pub fn ks_test(a: &[f64], b: &[f64]) -> f64 {
    ks_test_with(a, b, SampleSize::Bins).p_value
}

/// Compare two histograms that share a binning.
pub fn compare_histograms(a: &Histogram, b: &Histogram) -> Result<KsResult> {
    if a.len() != b.len() {
        return Err(Error::BinMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    Ok(ks_test_with(a.counts(), b.counts(), SampleSize::Bins))
}
