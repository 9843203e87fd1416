// History transport loop shared by the CPU drivers.

use rand::Rng;

use crate::histogram::Histograms;
use crate::physics::{local_direction, rotate_to_lab_frame, sample_cos_theta, sample_phi, MaterialPhysics};
use crate::track::Track;

/// Why a history stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Path length reached the material's path limit.
    PathLimit,
    /// Step budget exhausted before the path limit.
    StepBudget,
}

/// Bookkeeping for a batch of histories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransportSummary {
    pub histories: u64,
    pub steps: u64,
    /// Histories stopped by the step budget.
    pub truncated: u64,
}

impl TransportSummary {
    pub fn combine(self, other: TransportSummary) -> TransportSummary {
        TransportSummary {
            histories: self.histories + other.histories,
            steps: self.steps + other.steps,
            truncated: self.truncated + other.truncated,
        }
    }
}

/// Transport one track from its current state until it terminates.
///
/// Each iteration samples a free flight; the flight that would cross the path
/// limit is cut short so the track ends exactly on it. Otherwise the track
/// scatters elastically and flies on.
pub fn transport_history<R: Rng + ?Sized>(
    track: &mut Track,
    physics: &MaterialPhysics,
    rng: &mut R,
) -> Termination {
    loop {
        let remaining = physics.path_limit - track.track_length;
        let flight = physics.sample_free_flight(rng);
        if flight >= remaining {
            track.advance(remaining);
            return Termination::PathLimit;
        }
        track.advance(flight);
        if track.steps >= physics.max_steps {
            return Termination::StepBudget;
        }

        let cos_theta = sample_cos_theta(physics.scr_param, rng.gen());
        let local = local_direction(cos_theta, sample_phi(rng));
        rotate_to_lab_frame(&mut track.direction, &local);
    }
}

/// Run `histories` independent histories and record each terminal
/// displacement into `histograms`.
pub fn run_histories<R: Rng + ?Sized>(
    physics: &MaterialPhysics,
    histories: u64,
    rng: &mut R,
    histograms: &mut Histograms,
) -> TransportSummary {
    let mut summary = TransportSummary::default();
    let mut track = Track::new();
    for _ in 0..histories {
        track.reset();
        if transport_history(&mut track, physics, rng) == Termination::StepBudget {
            summary.truncated += 1;
        }
        histograms.record_track(&track, physics.path_limit);
        summary.steps += track.steps;
        summary.histories += 1;
    }
    summary
}
