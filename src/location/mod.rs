//! Device location sampling
//!
//! A [`GeolocationProvider`] answers "where is the device now"; the
//! [`poller`] asks it on a fixed interval for as long as its handle is alive.

pub mod poller;
pub mod provider;

use serde::{Deserialize, Serialize};

pub use poller::{LocationPoller, LocationUpdate, PollerHandle};
pub use provider::{FixedLocation, GeolocationProvider, NoLocation, ScriptedLocation};

/// One device position reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    pub latitude: f64,
    pub longitude: f64,
}

impl LocationSample {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Finite and within the WGS84 ranges
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Why a location sample could not be taken
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeolocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location request timed out")]
    Timeout,
    #[error("Location unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_validity() {
        assert!(LocationSample::new(50.7365, -3.5427).is_valid());
        assert!(LocationSample::new(0.0, 0.0).is_valid());
        assert!(!LocationSample::new(f64::NAN, 0.0).is_valid());
        assert!(!LocationSample::new(0.0, f64::INFINITY).is_valid());
        assert!(!LocationSample::new(91.0, 0.0).is_valid());
        assert!(!LocationSample::new(0.0, -181.0).is_valid());
    }
}
