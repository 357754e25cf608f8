//! Admin editors for task and chance cards
//!
//! Forms hold raw input the way it was typed and only produce a request body
//! once every field validates.

use serde::Serialize;

use crate::game::board::SQUARE_COUNT;
use crate::models::{Chance, NewChance, NewTask, Task};

/// Request to create a record or replace an existing one
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Submission<T> {
    Create(T),
    Update(u64, T),
}

impl<T> Submission<T> {
    pub fn id(&self) -> Option<u64> {
        match self {
            Submission::Create(_) => None,
            Submission::Update(id, _) => Some(*id),
        }
    }

    pub fn body(&self) -> &T {
        match self {
            Submission::Create(body) | Submission::Update(_, body) => body,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("Description is required")]
    MissingDescription,
    #[error("Score must be a whole number, got {0:?}")]
    InvalidScore(String),
    #[error("Score cannot be negative")]
    NegativeScore,
    #[error("No square with id {0}")]
    UnknownSquare(usize),
}

fn parse_score(raw: &str) -> Result<i64, FormError> {
    let score: i64 = raw
        .trim()
        .parse()
        .map_err(|_| FormError::InvalidScore(raw.to_string()))?;
    if score < 0 {
        return Err(FormError::NegativeScore);
    }
    Ok(score)
}

fn require_description(raw: &str) -> Result<String, FormError> {
    let description = raw.trim();
    if description.is_empty() {
        return Err(FormError::MissingDescription);
    }
    Ok(description.to_string())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskForm {
    editing: Option<u64>,
    pub description: String,
    pub score: String,
    squares: Vec<usize>,
}

impl TaskForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefill from an existing task
    pub fn edit(task: &Task) -> Self {
        let mut squares = task.applicable_squares.clone();
        squares.sort_unstable();
        squares.dedup();
        Self {
            editing: Some(task.id),
            description: task.description.clone(),
            score: task.score_to_award.to_string(),
            squares,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    /// Checked squares, ascending
    pub fn squares(&self) -> &[usize] {
        &self.squares
    }

    pub fn toggle_square(&mut self, square_id: usize, checked: bool) -> Result<(), FormError> {
        if square_id >= SQUARE_COUNT {
            return Err(FormError::UnknownSquare(square_id));
        }
        self.squares.retain(|&id| id != square_id);
        if checked {
            self.squares.push(square_id);
            self.squares.sort_unstable();
        }
        Ok(())
    }

    pub fn submit(&self) -> Result<Submission<NewTask>, FormError> {
        let body = NewTask {
            description: require_description(&self.description)?,
            applicable_squares: self.squares.clone(),
            score_to_award: parse_score(&self.score)?,
        };
        Ok(match self.editing {
            Some(id) => Submission::Update(id, body),
            None => Submission::Create(body),
        })
    }

    /// Back to an empty create form
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChanceForm {
    editing: Option<u64>,
    pub description: String,
    pub score: String,
}

impl ChanceForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn edit(chance: &Chance) -> Self {
        Self {
            editing: Some(chance.id),
            description: chance.description.clone(),
            score: chance.score_to_award.to_string(),
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn submit(&self) -> Result<Submission<NewChance>, FormError> {
        let body = NewChance {
            description: require_description(&self.description)?,
            score_to_award: parse_score(&self.score)?,
        };
        Ok(match self.editing {
            Some(id) => Submission::Update(id, body),
            None => Submission::Create(body),
        })
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_task_posts() {
        let mut form = TaskForm::new();
        form.description = "  Take the stairs ".to_string();
        form.score = "15".to_string();
        form.toggle_square(9, true).unwrap();
        form.toggle_square(2, true).unwrap();

        let submission = form.submit().unwrap();
        assert_eq!(submission.id(), None);
        assert_eq!(submission.body().description, "Take the stairs");
        assert_eq!(submission.body().applicable_squares, vec![2, 9]);
        assert_eq!(submission.body().score_to_award, 15);
    }

    #[test]
    fn test_edit_task_puts() {
        let task = Task {
            id: 4,
            description: "Recycle a can".to_string(),
            applicable_squares: vec![6, 1, 6],
            score_to_award: 20,
        };
        let mut form = TaskForm::edit(&task);
        assert!(form.is_editing());
        assert_eq!(form.squares(), &[1, 6]);

        form.toggle_square(6, false).unwrap();
        form.toggle_square(1, true).unwrap();
        let submission = form.submit().unwrap();
        assert_eq!(submission.id(), Some(4));
        assert_eq!(submission.body().applicable_squares, vec![1]);

        form.reset();
        assert!(!form.is_editing());
        assert!(form.squares().is_empty());
    }

    #[test]
    fn test_task_validation() {
        let mut form = TaskForm::new();
        form.score = "10".to_string();
        assert_eq!(form.submit(), Err(FormError::MissingDescription));

        form.description = "Walk to class".to_string();
        form.score = "ten".to_string();
        assert_eq!(form.submit(), Err(FormError::InvalidScore("ten".to_string())));

        form.score = "-5".to_string();
        assert_eq!(form.submit(), Err(FormError::NegativeScore));

        assert_eq!(form.toggle_square(16, true), Err(FormError::UnknownSquare(16)));
    }

    #[test]
    fn test_chance_form() {
        let mut form = ChanceForm::new();
        form.description = "Found a bike".to_string();
        form.score = "0".to_string();
        assert!(matches!(form.submit(), Ok(Submission::Create(_))));

        let chance = Chance {
            id: 2,
            description: "Lost a cup".to_string(),
            score_to_award: 5,
        };
        let form = ChanceForm::edit(&chance);
        let submission = form.submit().unwrap();
        assert_eq!(submission.id(), Some(2));
        assert_eq!(submission.body().score_to_award, 5);
    }
}
