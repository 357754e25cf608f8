//! Records exchanged with the backend

use serde::{Deserialize, Serialize};

/// Per-user game progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserGameStats {
    pub current_square: i64,
    /// Task id on the current square, -1 when none
    pub current_task: i64,
    pub task_completed: bool,
    pub score: i64,
}

impl Default for UserGameStats {
    fn default() -> Self {
        Self {
            current_square: 0,
            current_task: -1,
            task_completed: false,
            score: 0,
        }
    }
}

/// Account as returned by the backend (password is write-only and never read back)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub usergamestats: Option<UserGameStats>,
}

impl User {
    pub fn score(&self) -> i64 {
        self.usergamestats.as_ref().map(|s| s.score).unwrap_or(0)
    }
}

/// Task to complete at a square
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub description: String,
    /// Square ids this task may be drawn on; empty means any square
    #[serde(default)]
    pub applicable_squares: Vec<usize>,
    pub score_to_award: i64,
}

impl Task {
    pub fn applies_to(&self, square_id: usize) -> bool {
        self.applicable_squares.is_empty() || self.applicable_squares.contains(&square_id)
    }
}

/// Bonus card drawn when the wheel lands on the chance face
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chance {
    pub id: u64,
    pub description: String,
    pub score_to_award: i64,
}

/// Task body without a server id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub description: String,
    pub applicable_squares: Vec<usize>,
    pub score_to_award: i64,
}

/// Chance body without a server id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewChance {
    pub description: String,
    pub score_to_award: i64,
}

/// Fields an account holder or admin may change
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_staff: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usergamestats: Option<UserGameStats>,
}
