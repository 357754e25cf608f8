//! Location gate
//!
//! Decides whether the task on a square may be completed, from the square and
//! the latest device sample only. The test is two independent axis checks
//! against a threshold in degrees, not a radial distance.

use tracing::{debug, warn};

use crate::game::board::Square;
use crate::location::{GeolocationError, LocationSample};

/// Gate decision for a square and an optional sample
///
/// Start is always open. Without a usable sample every other square is closed.
pub fn is_within_range(square: &Square, sample: Option<&LocationSample>, threshold: f64) -> bool {
    if square.is_start() {
        return true;
    }

    let (Some(target), Some(sample)) = (square.location, sample) else {
        return false;
    };
    if !sample.is_valid() {
        return false;
    }

    let threshold = square.leniency.unwrap_or(threshold);
    let lat_diff = (sample.latitude - target.latitude).abs();
    let lon_diff = (sample.longitude - target.longitude).abs();

    lat_diff < threshold && lon_diff < threshold
}

/// Gate state for the square the avatar stands on
#[derive(Debug, Clone)]
pub struct LocationGate {
    square: Square,
    latest: Option<LocationSample>,
    threshold: f64,
    open: bool,
}

impl LocationGate {
    pub fn new(square: Square, threshold: f64) -> Self {
        let mut gate = Self {
            square,
            latest: None,
            threshold,
            open: false,
        };
        gate.recompute();
        gate
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn square(&self) -> &Square {
        &self.square
    }

    pub fn latest(&self) -> Option<&LocationSample> {
        self.latest.as_ref()
    }

    /// Avatar moved; returns the new decision
    pub fn retarget(&mut self, square: Square) -> bool {
        self.square = square;
        self.recompute()
    }

    /// New device reading; returns the new decision
    pub fn on_sample(&mut self, sample: LocationSample) -> bool {
        if !sample.is_valid() {
            warn!("Location not available yet, skipping check");
            return self.open;
        }
        self.latest = Some(sample);
        self.recompute()
    }

    /// Reading failed; the previous decision stands
    pub fn on_unavailable(&mut self, error: &GeolocationError) -> bool {
        warn!("Location unavailable for {}: {}", self.square.name, error);
        self.open
    }

    fn recompute(&mut self) -> bool {
        self.open = is_within_range(&self.square, self.latest.as_ref(), self.threshold);
        debug!(
            "Gate for {} is {}",
            self.square.name,
            if self.open { "open" } else { "closed" }
        );
        self.open
    }
}
