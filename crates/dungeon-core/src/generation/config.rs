//! Layout search configuration.

use serde::{Deserialize, Serialize};

/// How the engine orders the candidates it tries at each node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Library and doorway order. Independent of the seed.
    FirstFit,
    /// Candidates shuffled with the attempt's seeded RNG.
    #[default]
    Random,
}

/// Configuration for [`generate_layout`](super::generate_layout).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Whole-search retries before giving up
    pub max_attempts: u32,
    /// Clearance in tiles between rooms that are not directly connected
    pub overlap_padding: i32,
    /// Base seed; attempt `n` runs with `seed + n`
    pub seed: u64,
    pub selection: SelectionPolicy,
    /// Candidate evaluations allowed per attempt before it is abandoned
    pub max_search_steps: u64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            overlap_padding: 0,
            seed: 0,
            selection: SelectionPolicy::Random,
            max_search_steps: 100_000,
        }
    }
}

impl LayoutConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_padding(mut self, overlap_padding: i32) -> Self {
        self.overlap_padding = overlap_padding;
        self
    }

    pub fn with_selection(mut self, selection: SelectionPolicy) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_max_search_steps(mut self, max_search_steps: u64) -> Self {
        self.max_search_steps = max_search_steps;
        self
    }

    /// Seed used by attempt `attempt` (zero-based).
    pub fn attempt_seed(&self, attempt: u32) -> u64 {
        self.seed.wrapping_add(attempt as u64)
    }
}
