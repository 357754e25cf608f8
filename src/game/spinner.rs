//! Wheel spin resolution
//!
//! A spin adds a random multi-turn rotation to the wheel and, once its
//! animation completes, resolves to one of six faces. Every spin gets a new
//! generation number; a completion that carries an older generation belongs to
//! a superseded spin and is ignored.

use rand::Rng;
use serde::Serialize;
use tracing::debug;

use crate::game::constants::wheel::{
    CHANCE_FACE, FACE_ORDER, MIN_FULL_TURNS, POINTER_OFFSET, SECTOR_COUNT, SECTOR_WIDTH,
};

/// Monotonic spin counter
pub type SpinGeneration = u64;

/// Result of a resolved spin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SpinOutcome {
    pub landed_number: u8,
    pub is_chance: bool,
}

impl SpinOutcome {
    pub fn from_face(landed_number: u8) -> Self {
        Self {
            landed_number,
            is_chance: landed_number == CHANCE_FACE,
        }
    }
}

/// Sector under the pointer for a cumulative wheel angle (degrees)
pub fn landed_index(angle: f64) -> usize {
    let normalized = angle.rem_euclid(360.0);
    let raw = ((360.0 - normalized) + POINTER_OFFSET) / SECTOR_WIDTH;
    (raw.floor() as usize) % SECTOR_COUNT
}

/// Face value under the pointer for a cumulative wheel angle (degrees)
pub fn resolve_angle(angle: f64) -> SpinOutcome {
    SpinOutcome::from_face(FACE_ORDER[landed_index(angle)])
}

/// A started spin, handed to the animation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpinTicket {
    pub generation: SpinGeneration,
    /// Angle the animation starts from
    pub start_angle: f64,
    /// Cumulative angle the animation ends on
    pub end_angle: f64,
    /// Spin that was still animating and is now cancelled
    pub superseded: Option<SpinGeneration>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpinPhase {
    Idle,
    Spinning { generation: SpinGeneration, end_angle: f64 },
    Resolved(SpinOutcome),
}

/// Spin state machine: Idle -> Spinning -> Resolved, Spinning -> Spinning on re-spin
#[derive(Debug, Clone)]
pub struct Spinner {
    phase: SpinPhase,
    generation: SpinGeneration,
    /// Normalized end angle of the last started spin
    committed_angle: f64,
    min_full_turns: u32,
}

impl Default for Spinner {
    fn default() -> Self {
        Self::new(MIN_FULL_TURNS)
    }
}

impl Spinner {
    pub fn new(min_full_turns: u32) -> Self {
        Self {
            phase: SpinPhase::Idle,
            generation: 0,
            committed_angle: 0.0,
            min_full_turns: min_full_turns.max(MIN_FULL_TURNS),
        }
    }

    pub fn phase(&self) -> SpinPhase {
        self.phase
    }

    pub fn is_spinning(&self) -> bool {
        matches!(self.phase, SpinPhase::Spinning { .. })
    }

    pub fn generation(&self) -> SpinGeneration {
        self.generation
    }

    pub fn committed_angle(&self) -> f64 {
        self.committed_angle
    }

    /// Start a spin with a random extra rotation
    pub fn begin<R: Rng>(&mut self, rng: &mut R) -> SpinTicket {
        let extra = rng.gen_range(0.0..360.0);
        self.begin_with(extra)
    }

    /// Start a spin whose extra rotation beyond the full turns is `extra_degrees`
    ///
    /// An in-flight spin is superseded; its completion will never resolve.
    pub fn begin_with(&mut self, extra_degrees: f64) -> SpinTicket {
        let superseded = match self.phase {
            SpinPhase::Spinning { generation, .. } => {
                debug!("Spin {} superseded before completion", generation);
                Some(generation)
            }
            _ => None,
        };

        self.generation += 1;
        let start_angle = self.committed_angle;
        let end_angle =
            start_angle + 360.0 * self.min_full_turns as f64 + extra_degrees.rem_euclid(360.0);

        self.committed_angle = end_angle.rem_euclid(360.0);
        self.phase = SpinPhase::Spinning {
            generation: self.generation,
            end_angle,
        };

        SpinTicket {
            generation: self.generation,
            start_angle,
            end_angle,
            superseded,
        }
    }

    /// Animation for `generation` finished
    ///
    /// Returns the outcome exactly once for the current spin; completions from
    /// superseded or already resolved spins return None.
    pub fn complete(&mut self, generation: SpinGeneration) -> Option<SpinOutcome> {
        match self.phase {
            SpinPhase::Spinning {
                generation: current,
                end_angle,
            } if current == generation => {
                let outcome = resolve_angle(end_angle);
                self.phase = SpinPhase::Resolved(outcome);
                Some(outcome)
            }
            _ => {
                debug!(
                    "Ignoring stale completion for spin {} (current {})",
                    generation, self.generation
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_face_table_is_fixed_cycle() {
        for index in 0..SECTOR_COUNT {
            let face = FACE_ORDER[index];
            assert!((1..=6).contains(&face));
            assert_eq!(face, [4, 5, 6, 1, 2, 3][index % 6]);
        }
    }

    #[test]
    fn test_each_sector_resolves_to_table_face() {
        // Angle 360 - 30i puts the pointer in the middle of sector i
        for index in 0..SECTOR_COUNT {
            let angle = (360.0 - SECTOR_WIDTH * index as f64).rem_euclid(360.0);
            assert_eq!(landed_index(angle), index);
            assert_eq!(resolve_angle(angle).landed_number, FACE_ORDER[index]);
        }
    }

    #[test]
    fn test_345_degrees_lands_on_five() {
        assert_eq!(landed_index(345.0), 1);
        assert_eq!(resolve_angle(345.0).landed_number, 5);
        // Cumulative angles normalize first
        assert_eq!(resolve_angle(345.0 + 360.0 * 7.0).landed_number, 5);
    }

    #[test]
    fn test_zero_angle() {
        // (360 + 15) / 30 = 12.5 -> 12 mod 12 = 0
        assert_eq!(landed_index(0.0), 0);
        assert_eq!(resolve_angle(0.0).landed_number, 4);
    }

    #[test]
    fn test_chance_only_on_six() {
        for face in 1..=6u8 {
            assert_eq!(SpinOutcome::from_face(face).is_chance, face == 6);
        }
    }

    #[test]
    fn test_begin_adds_full_turns() {
        let mut spinner = Spinner::default();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..50 {
            let ticket = spinner.begin(&mut rng);
            let extra = ticket.end_angle - ticket.start_angle;
            assert!(extra >= 1800.0 && extra < 2160.0);
            assert!(spinner.complete(ticket.generation).is_some());
        }
    }

    #[test]
    fn test_start_angle_carries_forward() {
        let mut spinner = Spinner::default();
        let first = spinner.begin_with(100.0);
        assert_eq!(first.start_angle, 0.0);
        assert_eq!(first.end_angle, 1900.0);
        spinner.complete(first.generation);

        let second = spinner.begin_with(10.0);
        assert_eq!(second.start_angle, 1900.0 % 360.0);
    }

    #[test]
    fn test_resolves_exactly_once() {
        let mut spinner = Spinner::default();
        let ticket = spinner.begin_with(345.0);
        assert_eq!(ticket.end_angle.rem_euclid(360.0), 345.0);

        let outcome = spinner.complete(ticket.generation);
        assert_eq!(outcome.map(|o| o.landed_number), Some(5));
        assert_eq!(spinner.complete(ticket.generation), None);
        assert_eq!(spinner.phase(), SpinPhase::Resolved(SpinOutcome::from_face(5)));
    }

    #[test]
    fn test_superseded_spin_never_resolves() {
        let mut spinner = Spinner::default();
        let first = spinner.begin_with(30.0);
        let second = spinner.begin_with(60.0);

        assert_eq!(second.superseded, Some(first.generation));
        assert_eq!(second.start_angle, first.end_angle.rem_euclid(360.0));
        assert!(second.generation > first.generation);

        // Late completion from the cancelled run
        assert_eq!(spinner.complete(first.generation), None);
        assert!(spinner.is_spinning());

        assert!(spinner.complete(second.generation).is_some());
        assert!(!spinner.is_spinning());
    }

    #[test]
    fn test_min_turns_floor() {
        let mut spinner = Spinner::new(1);
        let ticket = spinner.begin_with(0.0);
        assert_eq!(ticket.end_angle, 1800.0);

        let mut spinner = Spinner::new(8);
        let ticket = spinner.begin_with(0.0);
        assert_eq!(ticket.end_angle, 2880.0);
    }
}
