use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::{LONGITUDINAL_BINS, LONGITUDINAL_INV_D, TRANSVERSE_BINS, TRANSVERSE_INV_D};
use crate::error::{Error, Result};
use crate::track::Track;

/// Fixed-resolution 1D histogram.
///
/// A value `x` lands in bin `round(x * inv_d + offset)`, clamped to the valid
/// range so that every recorded value is counted. Counts are kept as `f64`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    inv_d: f64,
    offset: f64,
    counts: Vec<f64>,
}

impl Histogram {
    /// Histogram of `bins` bins with `inv_d` bins per unit value and bin
    /// `offset` at value zero.
    pub fn new(bins: usize, inv_d: f64, offset: f64) -> Result<Self> {
        if bins == 0 {
            return Err(Error::InvalidSettings("histogram needs at least one bin".to_string()));
        }
        if !(inv_d.is_finite() && inv_d > 0.0 && offset.is_finite()) {
            return Err(Error::InvalidSettings(format!(
                "histogram scale must be positive and finite, got inv_d = {inv_d}, offset = {offset}"
            )));
        }
        Ok(Self::with_bins(bins, inv_d, offset))
    }

    fn with_bins(bins: usize, inv_d: f64, offset: f64) -> Self {
        Self {
            inv_d,
            offset,
            counts: vec![0.0; bins],
        }
    }

    /// z / L in [-1, 1] over 201 bins.
    pub fn longitudinal() -> Self {
        Self::with_bins(LONGITUDINAL_BINS, LONGITUDINAL_INV_D, LONGITUDINAL_INV_D)
    }

    /// r / L in [0, 1] over 101 bins.
    pub fn transverse() -> Self {
        Self::with_bins(TRANSVERSE_BINS, TRANSVERSE_INV_D, 0.0)
    }

    #[inline]
    pub fn bin_index(&self, value: f64) -> usize {
        let idx = (value * self.inv_d + self.offset).round();
        if idx > 0.0 {
            (idx as usize).min(self.counts.len() - 1)
        } else {
            0
        }
    }

    #[inline]
    pub fn fill(&mut self, value: f64) {
        let idx = self.bin_index(value);
        self.counts[idx] += 1.0;
    }

    pub fn counts(&self) -> &[f64] {
        &self.counts
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// `true` once anything has been filled.
    pub fn has_counts(&self) -> bool {
        self.total() > 0.0
    }

    pub fn total(&self) -> f64 {
        self.counts.iter().sum()
    }

    /// Centre of bin `index` in value units.
    pub fn bin_center(&self, index: usize) -> f64 {
        (index as f64 - self.offset) / self.inv_d
    }

    /// Mean of the binned values, or `None` for an empty histogram.
    pub fn mean(&self) -> Option<f64> {
        let total = self.total();
        if total == 0.0 {
            return None;
        }
        let sum: f64 = self
            .counts
            .iter()
            .enumerate()
            .map(|(i, &c)| c * self.bin_center(i))
            .sum();
        Some(sum / total)
    }

    /// Add `other` bin by bin. Both histograms must share the same binning.
    pub fn merge(&mut self, other: &Histogram) -> Result<()> {
        if self.counts.len() != other.counts.len() {
            return Err(Error::BinMismatch {
                left: self.counts.len(),
                right: other.counts.len(),
            });
        }
        for (a, b) in self.counts.iter_mut().zip(&other.counts) {
            *a += *b;
        }
        Ok(())
    }
}

impl AsRef<[f64]> for Histogram {
    fn as_ref(&self) -> &[f64] {
        &self.counts
    }
}

/// Longitudinal and transverse displacement histograms of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histograms {
    pub longitudinal: Histogram,
    pub transverse: Histogram,
}

impl Histograms {
    pub fn new() -> Self {
        Self {
            longitudinal: Histogram::longitudinal(),
            transverse: Histogram::transverse(),
        }
    }

    /// Record one terminal displacement, both components already divided by
    /// the history's path length.
    #[inline]
    pub fn record(&mut self, longitudinal: f64, transverse: f64) {
        self.longitudinal.fill(longitudinal);
        self.transverse.fill(transverse);
    }

    /// Record a terminated track whose path limit was `path_limit`.
    #[inline]
    pub fn record_track(&mut self, track: &Track, path_limit: f64) {
        let inv = 1.0 / path_limit;
        self.record(track.longitudinal() * inv, track.transverse() * inv);
    }

    /// Number of histories recorded.
    pub fn histories(&self) -> f64 {
        self.longitudinal.total()
    }

    pub fn merge(&mut self, other: &Histograms) -> Result<()> {
        self.longitudinal.merge(&other.longitudinal)?;
        self.transverse.merge(&other.transverse)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let histograms: Self = serde_json::from_str(json)?;
        for h in [&histograms.longitudinal, &histograms.transverse] {
            // re-check what `Histogram::new` enforces
            Histogram::new(h.len(), h.inv_d, h.offset)?;
        }
        Ok(histograms)
    }
}

impl Default for Histograms {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Histograms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Histories: {}", self.histories())?;
        match self.longitudinal.mean() {
            Some(m) => writeln!(f, "  Longitudinal: {} bins, mean z/L {:.4}", self.longitudinal.len(), m)?,
            None => writeln!(f, "  Longitudinal: {} bins, empty", self.longitudinal.len())?,
        }
        match self.transverse.mean() {
            Some(m) => write!(f, "  Transverse: {} bins, mean r/L {:.4}", self.transverse.len(), m),
            None => write!(f, "  Transverse: {} bins, empty", self.transverse.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lengths() {
        let h = Histograms::new();
        assert_eq!(h.longitudinal.len(), 201);
        assert_eq!(h.transverse.len(), 101);
        assert!(!h.longitudinal.is_empty());
        assert!(!h.longitudinal.has_counts());
    }

    #[test]
    fn test_has_counts_after_fill() {
        let mut h = Histogram::transverse();
        h.fill(0.5);
        assert!(h.has_counts());
        assert_eq!(h.len(), 101);
    }

    #[test]
    fn test_new_rejects_bad_geometry() {
        assert!(matches!(Histogram::new(0, 100.0, 0.0), Err(Error::InvalidSettings(_))));
        assert!(matches!(Histogram::new(10, 0.0, 0.0), Err(Error::InvalidSettings(_))));
        assert!(matches!(Histogram::new(10, 1.0, f64::NAN), Err(Error::InvalidSettings(_))));
        let h = Histogram::new(51, 25.0, 25.0).unwrap();
        assert_eq!(h.len(), 51);
        assert_eq!(h.bin_index(1.0), 50);
    }

    #[test]
    fn test_from_json_rejects_empty_histogram() {
        let json = r#"{"longitudinal":{"inv_d":100.0,"offset":100.0,"counts":[]},
                       "transverse":{"inv_d":100.0,"offset":0.0,"counts":[0.0]}}"#;
        assert!(matches!(Histograms::from_json(json), Err(Error::InvalidSettings(_))));
    }

    #[test]
    fn test_bin_mapping() {
        let h = Histogram::longitudinal();
        assert_eq!(h.bin_index(-1.0), 0);
        assert_eq!(h.bin_index(0.0), 100);
        assert_eq!(h.bin_index(1.0), 200);
        assert_eq!(h.bin_index(0.504), 150);
        assert_eq!(h.bin_index(0.506), 151);

        let t = Histogram::transverse();
        assert_eq!(t.bin_index(0.0), 0);
        assert_eq!(t.bin_index(0.25), 25);
        assert_eq!(t.bin_index(1.0), 100);
    }

    #[test]
    fn test_out_of_range_values_clamped_not_dropped() {
        let mut h = Histograms::new();
        h.record(-5.0, 3.0);
        h.record(7.0, -1.0);
        h.record(f64::NAN, f64::INFINITY);
        assert_eq!(h.longitudinal.counts()[0], 2.0);
        assert_eq!(h.longitudinal.counts()[200], 1.0);
        assert_eq!(h.transverse.counts()[100], 2.0);
        assert_eq!(h.histories(), 3.0);
        assert_eq!(h.transverse.total(), 3.0);
    }

    #[test]
    fn test_record_track_normalises_by_path() {
        let mut track = Track::new();
        track.advance(2.0);
        let mut h = Histograms::new();
        h.record_track(&track, 4.0);
        assert_eq!(h.longitudinal.counts()[150], 1.0);
        assert_eq!(h.transverse.counts()[0], 1.0);
    }

    #[test]
    fn test_merge() {
        let mut a = Histograms::new();
        let mut b = Histograms::new();
        a.record(0.5, 0.1);
        b.record(0.5, 0.2);
        b.record(-0.5, 0.2);
        a.merge(&b).unwrap();
        assert_eq!(a.histories(), 3.0);
        assert_eq!(a.longitudinal.counts()[150], 2.0);
        assert_eq!(a.transverse.counts()[20], 2.0);
    }

    #[test]
    fn test_merge_rejects_mismatched_bins() {
        let mut a = Histogram::longitudinal();
        let b = Histogram::transverse();
        assert!(matches!(
            a.merge(&b),
            Err(Error::BinMismatch { left: 201, right: 101 })
        ));
    }

    #[test]
    fn test_mean_and_centres() {
        let mut h = Histogram::longitudinal();
        assert_eq!(h.mean(), None);
        h.fill(0.2);
        h.fill(0.4);
        assert!((h.mean().unwrap() - 0.3).abs() < 1e-12);
        assert_eq!(h.bin_center(100), 0.0);
    }

    #[test]
    fn test_json_roundtrip() {
        let mut h = Histograms::new();
        h.record(0.3, 0.3);
        let json = h.to_json().unwrap();
        assert_eq!(Histograms::from_json(&json).unwrap(), h);
    }
}
