//! Stagnation detection over the recent-thought window.

use std::collections::HashSet;

/// Flags a run of thoughts that keep reusing the same words
#[derive(Clone, Copy, Debug)]
pub struct StagnationDetector {
    window: usize,
    cutoff: f64,
}

impl Default for StagnationDetector {
    fn default() -> Self {
        Self::new(3, 0.3)
    }
}

impl StagnationDetector {
    pub fn new(window: usize, cutoff: f64) -> Self {
        Self {
            window: window.max(1),
            cutoff,
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Unique tokens over total tokens for the last `window` thoughts, or
    /// `None` while fewer than `window` thoughts exist.
    pub fn diversity_ratio<'a, I>(&self, thoughts: I) -> Option<f64>
    where
        I: IntoIterator<Item = &'a String>,
        I::IntoIter: DoubleEndedIterator,
    {
        let last_n: Vec<&String> = thoughts.into_iter().rev().take(self.window).collect();
        if last_n.len() < self.window {
            return None;
        }

        let mut unique = HashSet::new();
        let mut total = 0usize;
        for thought in last_n {
            for token in thought.split_whitespace() {
                unique.insert(token);
                total += 1;
            }
        }

        if total == 0 {
            return None;
        }
        Some(unique.len() as f64 / total as f64)
    }

    pub fn is_stagnant<'a, I>(&self, thoughts: I) -> bool
    where
        I: IntoIterator<Item = &'a String>,
        I::IntoIter: DoubleEndedIterator,
    {
        self.diversity_ratio(thoughts)
            .is_some_and(|ratio| ratio < self.cutoff)
    }
}
