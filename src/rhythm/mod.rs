//! Rhythm practice tutor.
//!
//! The student listens to a pattern of beats, taps it back, and is scored on
//! how closely the gaps between taps match the pattern. Passing a level moves
//! on to the next pattern until every level is done.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use crate::config::PracticeConfig;
use std::time::Instant;
use tracing::debug;

/// Beat intervals in seconds, one pattern per level, before slow-down
pub const BASE_PATTERNS: [&[f64]; 5] = [
    &[0.5, 0.5, 0.5, 0.5],
    &[0.5, 0.25, 0.25, 0.5, 0.5],
    &[0.4, 0.4, 0.8, 0.4, 0.4],
    &[0.3, 0.3, 0.3, 0.3, 0.3, 0.3],
    &[0.5, 0.25, 0.25, 0.5, 0.25, 0.25, 0.5],
];

/// The base patterns with every interval multiplied by `slow_factor`.
pub fn level_patterns(slow_factor: f64) -> Vec<Vec<f64>> {
    BASE_PATTERNS
        .iter()
        .map(|pattern| pattern.iter().map(|interval| interval * slow_factor).collect())
        .collect()
}

/// Gaps between taps in seconds: the first relative to `start`, the rest
/// between consecutive taps.
pub fn intervals_from_hits(start: Instant, hits: &[Instant]) -> Vec<f64> {
    let mut previous = start;
    hits.iter()
        .map(|&hit| {
            let gap = hit.saturating_duration_since(previous).as_secs_f64();
            previous = hit;
            gap
        })
        .collect()
}

/// Closeness of `actual` to `expected` as a percentage.
///
/// Each interval scores `1 - |a - e| / e`, floored at zero; the result is
/// the mean over the compared intervals. Missing taps score zero.
pub fn score_intervals(actual: &[f64], expected: &[f64]) -> f64 {
    if expected.is_empty() {
        return 0.0;
    }

    let total: f64 = expected
        .iter()
        .enumerate()
        .map(|(i, &e)| match actual.get(i) {
            Some(&a) if e > 0.0 => (1.0 - (a - e).abs() / e).max(0.0),
            _ => 0.0,
        })
        .sum();

    total / expected.len() as f64 * 100.0
}

/// Result of one attempt at the current level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outcome {
    /// Scaled score, 0 to 100
    pub score: f64,
    pub passed: bool,
    /// True once the last level has been passed
    pub finished: bool,
}

#[derive(Debug, Clone)]
pub struct RhythmTutor {
    level: usize,
    patterns: Vec<Vec<f64>>,
    pass_score: f64,
    generosity: f64,
}

impl RhythmTutor {
    pub fn new(config: &PracticeConfig) -> Self {
        Self {
            level: 1,
            patterns: level_patterns(config.slow_factor),
            pass_score: config.pass_score,
            generosity: config.generosity,
        }
    }

    /// Start at `level` (1-based), clamped to the available levels.
    pub fn starting_at(config: &PracticeConfig, level: usize) -> Self {
        let mut tutor = Self::new(config);
        tutor.level = level.clamp(1, tutor.patterns.len());
        tutor
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn levels(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_finished(&self) -> bool {
        self.level > self.patterns.len()
    }

    /// Intervals the student should tap for the current level.
    pub fn current_pattern(&self) -> Option<&[f64]> {
        self.patterns.get(self.level.checked_sub(1)?).map(Vec::as_slice)
    }

    /// Score an attempt at the current level and advance on a pass.
    pub fn record_attempt(&mut self, actual: &[f64]) -> Outcome {
        let Some(expected) = self.current_pattern() else {
            return Outcome {
                score: 0.0,
                passed: false,
                finished: true,
            };
        };

        let raw = score_intervals(actual, expected);
        let score = (raw * self.generosity).min(100.0);
        let passed = score >= self.pass_score;
        debug!("Level {} attempt: raw {:.1}, scaled {:.1}", self.level, raw, score);

        if passed {
            self.level += 1;
        }

        Outcome {
            score,
            passed,
            finished: self.is_finished(),
        }
    }
}
