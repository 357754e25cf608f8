//! Task and chance card decks

use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::{Chance, Task};

/// Tasks and chance cards loaded from the backend
#[derive(Debug, Clone, Default)]
pub struct Deck {
    tasks: Vec<Task>,
    chances: Vec<Chance>,
}

impl Deck {
    pub fn new(tasks: Vec<Task>, chances: Vec<Chance>) -> Self {
        Self { tasks, chances }
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn chance_count(&self) -> usize {
        self.chances.len()
    }

    pub fn task(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Random task that may be done on `square_id`
    pub fn draw_task<R: Rng>(&self, square_id: usize, rng: &mut R) -> Option<Task> {
        let candidates: Vec<&Task> = self.tasks.iter().filter(|t| t.applies_to(square_id)).collect();
        candidates.choose(rng).map(|t| (*t).clone())
    }

    /// Random chance card
    pub fn draw_chance<R: Rng>(&self, rng: &mut R) -> Option<Chance> {
        self.chances.choose(rng).cloned()
    }
}
