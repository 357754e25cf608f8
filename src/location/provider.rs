use std::collections::VecDeque;
use std::future::Future;

use parking_lot::Mutex;

use super::{GeolocationError, LocationSample};

/// Source of device positions
pub trait GeolocationProvider: Send + Sync + 'static {
    /// Take one reading; may fail without side effects
    fn current_position(
        &self,
    ) -> impl Future<Output = Result<LocationSample, GeolocationError>> + Send;
}

/// Always reports the same position
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub LocationSample);

impl GeolocationProvider for FixedLocation {
    async fn current_position(&self) -> Result<LocationSample, GeolocationError> {
        Ok(self.0)
    }
}

/// No positioning hardware available
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocation;

impl GeolocationProvider for NoLocation {
    async fn current_position(&self) -> Result<LocationSample, GeolocationError> {
        Err(GeolocationError::Unavailable("no location source configured".to_string()))
    }
}

/// Replays queued readings, then keeps repeating the last one
///
/// Useful for simulated walks and for driving the board in tests.
#[derive(Debug, Default)]
pub struct ScriptedLocation {
    queue: Mutex<VecDeque<Result<LocationSample, GeolocationError>>>,
    last: Mutex<Option<Result<LocationSample, GeolocationError>>>,
    calls: Mutex<usize>,
}

impl ScriptedLocation {
    pub fn new<I>(readings: I) -> Self
    where
        I: IntoIterator<Item = Result<LocationSample, GeolocationError>>,
    {
        Self {
            queue: Mutex::new(readings.into_iter().collect()),
            last: Mutex::new(None),
            calls: Mutex::new(0),
        }
    }

    /// Queue another reading
    pub fn push(&self, reading: Result<LocationSample, GeolocationError>) {
        self.queue.lock().push_back(reading);
    }

    /// Number of readings requested so far
    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }

    fn next_reading(&self) -> Result<LocationSample, GeolocationError> {
        *self.calls.lock() += 1;
        let mut last = self.last.lock();
        if let Some(reading) = self.queue.lock().pop_front() {
            *last = Some(reading.clone());
            return reading;
        }
        last.clone()
            .unwrap_or_else(|| Err(GeolocationError::Unavailable("script exhausted".to_string())))
    }
}

impl GeolocationProvider for ScriptedLocation {
    async fn current_position(&self) -> Result<LocationSample, GeolocationError> {
        self.next_reading()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixed_location() {
        let here = LocationSample::new(50.7365, -3.5427);
        let provider = FixedLocation(here);
        assert_eq!(provider.current_position().await, Ok(here));
    }

    #[tokio::test]
    async fn test_no_location_fails() {
        assert!(matches!(
            NoLocation.current_position().await,
            Err(GeolocationError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_scripted_repeats_last() {
        let a = LocationSample::new(1.0, 2.0);
        let provider = ScriptedLocation::new([Ok(a), Err(GeolocationError::Timeout)]);

        assert_eq!(provider.current_position().await, Ok(a));
        assert_eq!(provider.current_position().await, Err(GeolocationError::Timeout));
        assert_eq!(provider.current_position().await, Err(GeolocationError::Timeout));

        let b = LocationSample::new(3.0, 4.0);
        provider.push(Ok(b));
        assert_eq!(provider.current_position().await, Ok(b));
        assert_eq!(provider.calls(), 4);
    }

    #[tokio::test]
    async fn test_empty_script_is_unavailable() {
        let provider = ScriptedLocation::new([]);
        assert!(provider.current_position().await.is_err());
    }
}
