//! Board turn state
//!
//! One player's view of the board: avatar position, wheel, location gate, the
//! pending task and any chance card. Pure state; timers live in the driver.

use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};

use crate::game::board::{self, Square};
use crate::game::constants::score::DEFAULT_TASK_POINTS;
use crate::game::deck::Deck;
use crate::game::gate::LocationGate;
use crate::game::spinner::{SpinGeneration, SpinOutcome, SpinTicket, Spinner};
use crate::location::LocationUpdate;
use crate::models::{Chance, Task, UserGameStats};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
pub enum TurnError {
    #[error("The wheel is still spinning")]
    SpinInProgress,
    #[error("No task is waiting to be completed")]
    NoTaskPending,
    #[error("Not close enough to {0}")]
    OutOfRange(&'static str),
    #[error("No chance card available")]
    NoChanceAvailable,
    #[error("Chance card already claimed")]
    ChanceAlreadyClaimed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskState {
    pub current: Option<Task>,
    pub completed: bool,
    pub popup_open: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChanceState {
    pub available: bool,
    pub popup_open: bool,
    pub card: Option<Chance>,
    pub claimed: bool,
}

/// A resolved spin and where it moved the avatar
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Landing {
    pub outcome: SpinOutcome,
    pub from: usize,
    pub position: usize,
    pub gate_open: bool,
}

#[derive(Debug, Clone)]
pub struct BoardSession {
    position: usize,
    spinner: Spinner,
    gate: LocationGate,
    can_spin: bool,
    task: TaskState,
    chance: ChanceState,
    score: i64,
}

impl BoardSession {
    /// Fresh board: avatar on Start, ready to spin
    pub fn new(threshold: f64, min_full_turns: u32) -> Self {
        Self {
            position: board::START_SQUARE,
            spinner: Spinner::new(min_full_turns),
            gate: LocationGate::new(*board::square_at(board::START_SQUARE), threshold),
            can_spin: true,
            task: TaskState {
                completed: true,
                ..TaskState::default()
            },
            chance: ChanceState::default(),
            score: 0,
        }
    }

    /// Resume from persisted stats
    ///
    /// A task that was drawn but not completed stays pending; a fresh account
    /// (no task drawn yet) may spin straight away.
    pub fn restore(stats: &UserGameStats, deck: &Deck, threshold: f64, min_full_turns: u32) -> Self {
        let mut session = Self::new(threshold, min_full_turns);
        session.position = board::normalize_position(stats.current_square);
        session.gate.retarget(*board::square_at(session.position));
        session.score = stats.score;

        let pending = !stats.task_completed && stats.current_task >= 0;
        if pending {
            session.can_spin = false;
            session.task.completed = false;
            session.task.current = deck.task(stats.current_task as u64).cloned();
        }

        info!(
            "Board restored at {} with {} points ({})",
            session.square().name,
            session.score,
            if pending { "task pending" } else { "ready to spin" }
        );
        session
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn square(&self) -> &'static Square {
        board::square_at(self.position)
    }

    pub fn can_spin(&self) -> bool {
        self.can_spin
    }

    pub fn is_spinning(&self) -> bool {
        self.spinner.is_spinning()
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn gate_open(&self) -> bool {
        self.gate.is_open()
    }

    pub fn task(&self) -> &TaskState {
        &self.task
    }

    pub fn chance(&self) -> &ChanceState {
        &self.chance
    }

    pub fn wheel_angle(&self) -> f64 {
        self.spinner.committed_angle()
    }

    /// Task button is live once the wheel has stopped and a task is pending
    pub fn is_task_completable(&self) -> bool {
        !self.spinner.is_spinning() && !self.task.completed && self.gate.is_open()
    }

    /// Start a spin; no-op while spinning is disabled
    ///
    /// Spinning stays enabled until the wheel lands, so a request during the
    /// animation supersedes the running spin.
    pub fn request_spin<R: Rng>(&mut self, rng: &mut R) -> Option<SpinTicket> {
        if !self.can_spin {
            debug!("Spin ignored: spinning is disabled");
            return None;
        }
        let ticket = self.spinner.begin(rng);
        debug!(
            "Spin {} from {:.1} to {:.1}",
            ticket.generation, ticket.start_angle, ticket.end_angle
        );
        Some(ticket)
    }

    /// Animation for `generation` finished; applies the landing at most once
    pub fn finish_spin(&mut self, generation: SpinGeneration) -> Option<Landing> {
        let outcome = self.spinner.complete(generation)?;

        if outcome.is_chance {
            self.chance = ChanceState {
                available: true,
                popup_open: true,
                card: None,
                claimed: false,
            };
        } else {
            self.chance.available = false;
            self.chance.popup_open = false;
        }

        let from = self.position;
        self.position = board::advance(self.position, outcome.landed_number);
        self.can_spin = false;
        self.task = TaskState::default();
        let gate_open = self.gate.retarget(*self.square());

        info!(
            "Landed on {} -> {} ({})",
            outcome.landed_number,
            self.square().name,
            if outcome.is_chance { "chance!" } else { "no chance" }
        );

        Some(Landing {
            outcome,
            from,
            position: self.position,
            gate_open,
        })
    }

    pub fn assign_task(&mut self, task: Option<Task>) {
        self.task.current = task;
    }

    pub fn assign_chance(&mut self, card: Option<Chance>) {
        if self.chance.available {
            self.chance.card = card;
        }
    }

    /// Feed a poll result to the gate; returns whether the gate is open
    pub fn on_location(&mut self, update: &LocationUpdate) -> bool {
        match update {
            LocationUpdate::Sample(sample) => self.gate.on_sample(*sample),
            LocationUpdate::Unavailable(error) => self.gate.on_unavailable(error),
        }
    }

    pub fn open_task(&mut self) -> Result<(), TurnError> {
        if self.can_spin {
            return Err(TurnError::NoTaskPending);
        }
        self.task.popup_open = true;
        Ok(())
    }

    pub fn close_task(&mut self) {
        self.task.popup_open = false;
    }

    /// Mark the pending task done; returns the points awarded
    pub fn complete_task(&mut self) -> Result<i64, TurnError> {
        if self.spinner.is_spinning() {
            return Err(TurnError::SpinInProgress);
        }
        if self.task.completed {
            return Err(TurnError::NoTaskPending);
        }
        if !self.gate.is_open() {
            return Err(TurnError::OutOfRange(self.square().name));
        }

        let points = self
            .task
            .current
            .as_ref()
            .map(|t| t.score_to_award)
            .unwrap_or(DEFAULT_TASK_POINTS);

        self.score += points;
        self.task.completed = true;
        self.task.popup_open = false;
        self.can_spin = true;
        self.chance.available = false;
        self.chance.popup_open = false;

        info!("Task completed at {}: +{} ({} total)", self.square().name, points, self.score);
        Ok(points)
    }

    pub fn open_chance(&mut self) -> Result<(), TurnError> {
        if !self.chance.available {
            return Err(TurnError::NoChanceAvailable);
        }
        self.chance.popup_open = true;
        Ok(())
    }

    pub fn close_chance(&mut self) {
        self.chance.popup_open = false;
    }

    /// Collect the chance card's points, once per card
    pub fn claim_chance(&mut self) -> Result<i64, TurnError> {
        if !self.chance.available {
            return Err(TurnError::NoChanceAvailable);
        }
        if self.chance.claimed {
            return Err(TurnError::ChanceAlreadyClaimed);
        }

        let points = self.chance.card.as_ref().map(|c| c.score_to_award).unwrap_or(0);
        self.chance.claimed = true;
        self.score += points;
        info!("Chance claimed: +{} ({} total)", points, self.score);
        Ok(points)
    }

    /// Progress to persist
    pub fn stats(&self) -> UserGameStats {
        UserGameStats {
            current_square: self.position as i64,
            current_task: self.task.current.as_ref().map(|t| t.id as i64).unwrap_or(-1),
            task_completed: self.task.completed,
            score: self.score,
        }
    }
}
