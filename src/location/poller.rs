//! Interval-based location sampling
//!
//! The poller samples once immediately, then on every interval tick. It lives
//! exactly as long as its [`PollerHandle`]: dropping the handle aborts the task,
//! including a sample that is still in flight.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::{GeolocationError, GeolocationProvider, LocationSample};
use crate::metrics::ClientMetrics;

/// One poll result
#[derive(Debug, Clone, PartialEq)]
pub enum LocationUpdate {
    Sample(LocationSample),
    Unavailable(GeolocationError),
}

/// Owns a running poll task
#[derive(Debug)]
pub struct PollerHandle {
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Stop polling now
    pub fn stop(self) {
        drop(self);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub struct LocationPoller;

impl LocationPoller {
    /// Start sampling `provider` every `period`, delivering results on `updates`
    ///
    /// The task also ends on its own once the receiving side is gone.
    pub fn spawn<P: GeolocationProvider>(
        provider: Arc<P>,
        period: Duration,
        updates: mpsc::UnboundedSender<LocationUpdate>,
        metrics: Arc<ClientMetrics>,
    ) -> PollerHandle {
        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            // A slow reading pushes the schedule back rather than bunching ticks
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!("Location polling started every {:?}", period);

            loop {
                ticker.tick().await;

                let update = match provider.current_position().await {
                    Ok(sample) if sample.is_valid() => {
                        debug!("Location updated: {}, {}", sample.latitude, sample.longitude);
                        metrics.record_location_sample();
                        LocationUpdate::Sample(sample)
                    }
                    Ok(sample) => {
                        warn!("Discarding invalid location {:?}", sample);
                        metrics.record_location_failure();
                        LocationUpdate::Unavailable(GeolocationError::Unavailable(
                            "invalid coordinates".to_string(),
                        ))
                    }
                    Err(e) => {
                        warn!("Geolocation error: {}", e);
                        metrics.record_location_failure();
                        LocationUpdate::Unavailable(e)
                    }
                };

                if updates.send(update).is_err() {
                    debug!("Location receiver gone, stopping poller");
                    break;
                }
            }
        });

        PollerHandle { task }
    }
}
