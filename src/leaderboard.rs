//! Leaderboard view over the ranked user list

use serde::Serialize;

use crate::models::User;

/// Number of users shown on the podium
pub const PODIUM_SIZE: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Standing {
    /// 1-based
    pub rank: usize,
    pub username: String,
    pub score: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Leaderboard {
    pub podium: Vec<Standing>,
    /// 1-based position of the viewing user, None when not ranked
    pub position: Option<usize>,
    /// Viewer's score as a percentage of the leader's, in `[0, 100]`
    pub progress: f64,
}

impl Leaderboard {
    /// Build from users ordered by score, highest first
    pub fn build(ranked: &[User], viewer: &User) -> Self {
        let podium = ranked
            .iter()
            .take(PODIUM_SIZE)
            .enumerate()
            .map(|(i, user)| Standing {
                rank: i + 1,
                username: user.username.clone(),
                score: user.score(),
            })
            .collect();

        let position = ranked
            .iter()
            .position(|user| user.id == viewer.id)
            .map(|i| i + 1);

        let leader = ranked.first().map(User::score).unwrap_or(0);

        Self {
            podium,
            position,
            progress: progress_towards(viewer.score(), leader),
        }
    }
}

pub fn progress_towards(score: i64, leader: i64) -> f64 {
    if leader <= 0 {
        return 0.0;
    }
    (score as f64 / leader as f64 * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserGameStats;

    fn user(id: u64, score: i64) -> User {
        User {
            id,
            username: format!("user{}", id),
            email: String::new(),
            is_staff: false,
            usergamestats: Some(UserGameStats {
                score,
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_podium_and_position() {
        let ranked = vec![user(3, 80), user(1, 60), user(7, 40), user(2, 20)];
        let board = Leaderboard::build(&ranked, &ranked[3]);

        assert_eq!(board.podium.len(), 3);
        assert_eq!(board.podium[0].username, "user3");
        assert_eq!(board.podium[2].rank, 3);
        assert_eq!(board.position, Some(4));
        assert!((board.progress - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_short_list() {
        let ranked = vec![user(1, 10)];
        let board = Leaderboard::build(&ranked, &ranked[0]);
        assert_eq!(board.podium.len(), 1);
        assert_eq!(board.position, Some(1));
        assert_eq!(board.progress, 100.0);
    }

    #[test]
    fn test_unranked_viewer() {
        let ranked = vec![user(1, 10), user(2, 5)];
        let board = Leaderboard::build(&ranked, &user(9, 0));
        assert_eq!(board.position, None);
        assert_eq!(board.progress, 0.0);
    }

    #[test]
    fn test_progress_clamped() {
        assert_eq!(progress_towards(5, 0), 0.0);
        assert_eq!(progress_towards(50, 40), 100.0);
        assert_eq!(progress_towards(-10, 40), 0.0);
        assert!((progress_towards(10, 40) - 25.0).abs() < 1e-9);
    }
}
