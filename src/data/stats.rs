use serde::Serialize;

use super::record::{SignalRecord, SignalResult};

/// Running performance figures, recomputed from the store on every query.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SignalStats {
    pub total: usize,
    pub wins: usize,
    pub losses: usize,
    /// Percentage rounded to two decimals; 0 when there are no signals
    pub win_rate: f64,
    /// Trailing run of results equal to the newest one
    pub current_streak: usize,
    pub streak_result: Option<SignalResult>,
}

impl SignalStats {
    /// Records must be in arrival order, oldest first.
    pub fn compute<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a SignalRecord>,
    {
        let results: Vec<SignalResult> = records.into_iter().map(|r| r.result()).collect();

        let total = results.len();
        let wins = results.iter().filter(|r| **r == SignalResult::Win).count();
        let win_rate = if total == 0 {
            0.0
        } else {
            round2(wins as f64 / total as f64 * 100.0)
        };

        let streak_result = results.last().copied();
        let current_streak = match streak_result {
            Some(last) => results.iter().rev().take_while(|r| **r == last).count(),
            None => 0,
        };

        Self {
            total,
            wins,
            losses: total - wins,
            win_rate,
            current_streak,
            streak_result,
        }
    }
}

/// Exact halves go to the even neighbour, so 1 win in 32 reads 3.12.
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}
