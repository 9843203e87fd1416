use nalgebra::Vector3;

/// State of one simulated electron while it is being transported.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    /// Position [mm].
    pub position: Vector3<f64>,
    /// Unit flight direction.
    pub direction: Vector3<f64>,
    /// Cumulative path length [mm].
    pub track_length: f64,
    /// Elastic events and free flights taken so far.
    pub steps: u64,
}

impl Track {
    /// Fresh track at the origin flying along +z.
    pub fn new() -> Self {
        Self {
            position: Vector3::zeros(),
            direction: Vector3::z(),
            track_length: 0.0,
            steps: 0,
        }
    }

    /// Return the track to its start-of-history state so it can be reused.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Fly `distance` along the current direction.
    #[inline]
    pub fn advance(&mut self, distance: f64) {
        self.position += self.direction * distance;
        self.track_length += distance;
        self.steps += 1;
    }

    /// Displacement along the initial flight direction [mm].
    #[inline]
    pub fn longitudinal(&self) -> f64 {
        self.position.z
    }

    /// Planar distance from the initial flight axis [mm].
    #[inline]
    pub fn transverse(&self) -> f64 {
        self.position.x.hypot(self.position.y)
    }
}

impl Default for Track {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_construction() {
        let t = Track::new();
        assert_eq!(t.position, Vector3::zeros());
        assert_eq!(t.direction, Vector3::new(0.0, 0.0, 1.0));
        assert_eq!(t.track_length, 0.0);
        assert_eq!(t.steps, 0);
    }

    #[test]
    fn test_advance_and_reset() {
        let mut t = Track::new();
        t.advance(2.0);
        t.direction = Vector3::new(0.6, 0.8, 0.0);
        t.advance(5.0);
        assert_eq!(t.longitudinal(), 2.0);
        assert!((t.transverse() - 5.0).abs() < 1e-12);
        assert_eq!(t.track_length, 7.0);
        assert_eq!(t.steps, 2);

        t.reset();
        assert_eq!(t, Track::default());
    }
}
