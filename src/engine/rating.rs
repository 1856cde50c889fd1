//! Fixed-step skill rank adjustment for ranked results.

use crate::domain::{DEFAULT_SKILL_RANK, MAX_SKILL_RANK, MIN_SKILL_RANK};

pub const WIN_STEP: f64 = 0.1;
pub const LOSS_STEP: f64 = 0.05;

/// Rounded to two decimals so repeated steps do not accumulate float noise.
fn tidy(rank: f64) -> f64 {
    (rank * 100.0).round() / 100.0
}

pub fn after_win(current: Option<f64>) -> f64 {
    tidy((current.unwrap_or(DEFAULT_SKILL_RANK) + WIN_STEP).min(MAX_SKILL_RANK))
}

pub fn after_loss(current: Option<f64>) -> f64 {
    tidy((current.unwrap_or(DEFAULT_SKILL_RANK) - LOSS_STEP).max(MIN_SKILL_RANK))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_win_caps_at_max() {
        assert_eq!(after_win(Some(7.95)), 8.0);
        assert_eq!(after_win(Some(8.0)), 8.0);
    }

    #[test]
    fn test_loss_floors_at_min() {
        assert_eq!(after_loss(Some(2.02)), 2.0);
        assert_eq!(after_loss(Some(2.0)), 2.0);
    }

    #[test]
    fn test_unset_rank_starts_from_default() {
        assert_eq!(after_win(None), 3.1);
        assert_eq!(after_loss(None), 2.95);
    }

    #[test]
    fn test_steps_stay_on_two_decimals() {
        let mut rank = Some(3.0);
        for _ in 0..7 {
            rank = Some(after_win(rank));
        }
        assert_eq!(rank, Some(3.7));
    }
}
