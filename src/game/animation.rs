//! Spin animation timer
//!
//! The visual rotation runs as its own task and reports completion with the
//! spin generation it was started for. Cancelling aborts the task, so a
//! cancelled animation never reports completion.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::debug;

use crate::game::constants::animation::EASING;
use crate::game::spinner::{SpinGeneration, SpinTicket};
use crate::util::easing::CubicBezier;

/// Angle over time for one spin
#[derive(Debug, Clone, Copy)]
pub struct SpinTimeline {
    pub start_angle: f64,
    pub end_angle: f64,
    pub duration: Duration,
    pub easing: CubicBezier,
}

impl SpinTimeline {
    pub fn new(ticket: &SpinTicket, duration: Duration) -> Self {
        Self {
            start_angle: ticket.start_angle,
            end_angle: ticket.end_angle,
            duration,
            easing: CubicBezier::from_points(EASING),
        }
    }

    /// Wheel angle after `elapsed`
    pub fn angle_at(&self, elapsed: Duration) -> f64 {
        let progress = if self.duration.is_zero() {
            1.0
        } else {
            elapsed.as_secs_f64() / self.duration.as_secs_f64()
        };
        self.start_angle + (self.end_angle - self.start_angle) * self.easing.ease(progress)
    }
}

/// A running animation
#[derive(Debug)]
pub struct AnimationHandle {
    generation: SpinGeneration,
    task: JoinHandle<()>,
}

impl AnimationHandle {
    pub fn generation(&self) -> SpinGeneration {
        self.generation
    }

    /// Stop the animation; its completion will not be delivered
    pub fn cancel(self) {
        debug!("Cancelling animation for spin {}", self.generation);
        drop(self);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for AnimationHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Run `timeline`, publishing the wheel angle every frame, then send `generation` on `done`
pub fn spawn_animation(
    generation: SpinGeneration,
    timeline: SpinTimeline,
    frame_interval: Duration,
    angle: Arc<watch::Sender<f64>>,
    done: mpsc::UnboundedSender<SpinGeneration>,
) -> AnimationHandle {
    let task = tokio::spawn(async move {
        let started = Instant::now();
        let mut frames = interval(frame_interval);
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            frames.tick().await;
            let elapsed = started.elapsed();
            if elapsed >= timeline.duration {
                break;
            }
            angle.send_replace(timeline.angle_at(elapsed));
        }

        // The completion signal only fires once the full duration has elapsed
        angle.send_replace(timeline.end_angle);
        let _ = done.send(generation);
    });

    AnimationHandle { generation, task }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(generation: SpinGeneration) -> SpinTicket {
        SpinTicket {
            generation,
            start_angle: 0.0,
            end_angle: 2145.0,
            superseded: None,
        }
    }

    #[test]
    fn test_timeline_endpoints() {
        let timeline = SpinTimeline::new(&ticket(1), Duration::from_secs(4));
        assert_eq!(timeline.angle_at(Duration::ZERO), 0.0);
        assert_eq!(timeline.angle_at(Duration::from_secs(4)), 2145.0);
        assert_eq!(timeline.angle_at(Duration::from_secs(9)), 2145.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_completes_after_duration() {
        let (angle_tx, angle_rx) = watch::channel(0.0);
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();
        let started = Instant::now();

        let _handle = spawn_animation(
            1,
            SpinTimeline::new(&ticket(1), Duration::from_secs(4)),
            Duration::from_millis(16),
            Arc::new(angle_tx),
            done_tx,
        );

        assert_eq!(done_rx.recv().await, Some(1));
        assert!(started.elapsed() >= Duration::from_secs(4));
        assert_eq!(*angle_rx.borrow(), 2145.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_animation_never_completes() {
        let (angle_tx, _angle_rx) = watch::channel(0.0);
        let angle_tx = Arc::new(angle_tx);
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();
        let frame = Duration::from_millis(16);
        let duration = Duration::from_secs(4);

        let first = spawn_animation(
            1,
            SpinTimeline::new(&ticket(1), duration),
            frame,
            angle_tx.clone(),
            done_tx.clone(),
        );
        tokio::time::sleep(Duration::from_secs(1)).await;

        first.cancel();
        let _second = spawn_animation(
            2,
            SpinTimeline::new(&ticket(2), duration),
            frame,
            angle_tx,
            done_tx,
        );

        assert_eq!(done_rx.recv().await, Some(2));
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(done_rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_aborts() {
        let (angle_tx, _angle_rx) = watch::channel(0.0);
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();

        let handle = spawn_animation(
            5,
            SpinTimeline::new(&ticket(5), Duration::from_secs(4)),
            Duration::from_millis(16),
            Arc::new(angle_tx),
            done_tx,
        );
        assert_eq!(handle.generation(), 5);
        drop(handle);

        // Sender dropped with the aborted task: channel closes without a value
        assert_eq!(done_rx.recv().await, None);
    }
}
