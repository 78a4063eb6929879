//! Solver choice policy.
//!
//! The exact table costs `O(n * capacity)` memory, so past a configured
//! size the planner falls back to the greedy solver. This is a tunable
//! precision/performance trade-off, not a correctness rule.

use serde::{Deserialize, Serialize};

/// Size limits above which the exact solver is not attempted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionLimits {
    /// Maximum item count for the exact solver (default: 1000)
    #[serde(default = "default_max_exact_items")]
    pub max_exact_items: usize,

    /// Maximum capacity for the exact solver (default: 10000)
    #[serde(default = "default_max_exact_capacity")]
    pub max_exact_capacity: u64,
}

fn default_max_exact_items() -> usize {
    1000
}
fn default_max_exact_capacity() -> u64 {
    10_000
}

impl Default for SelectionLimits {
    fn default() -> Self {
        Self {
            max_exact_items: default_max_exact_items(),
            max_exact_capacity: default_max_exact_capacity(),
        }
    }
}

impl SelectionLimits {
    /// Pick a solver for a problem of `n` orders at `capacity`.
    ///
    /// Exceeding either bound forces the greedy solver.
    pub fn choose(&self, n: usize, capacity: u64) -> SolverChoice {
        if n > self.max_exact_items || capacity > self.max_exact_capacity {
            SolverChoice::Greedy
        } else {
            SolverChoice::Exact
        }
    }
}

/// Which solver the policy selected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverChoice {
    /// Bounded dynamic programming, optimal
    Exact,

    /// Value-density ranking, feasible but approximate
    Greedy,
}

impl SolverChoice {
    /// Name used in log output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Greedy => "greedy",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = SelectionLimits::default();
        assert_eq!(limits.max_exact_items, 1000);
        assert_eq!(limits.max_exact_capacity, 10_000);
    }

    #[test]
    fn test_small_problems_use_exact() {
        let limits = SelectionLimits::default();
        assert_eq!(limits.choose(0, 0), SolverChoice::Exact);
        assert_eq!(limits.choose(1000, 10_000), SolverChoice::Exact);
    }

    #[test]
    fn test_large_item_count_forces_greedy() {
        // 1500 orders must route to greedy regardless of capacity.
        let limits = SelectionLimits::default();
        assert_eq!(limits.choose(1500, 10), SolverChoice::Greedy);
        assert_eq!(limits.choose(1001, 0), SolverChoice::Greedy);
    }

    #[test]
    fn test_large_capacity_forces_greedy() {
        let limits = SelectionLimits::default();
        assert_eq!(limits.choose(5, 10_001), SolverChoice::Greedy);
    }

    #[test]
    fn test_limits_deserialize_with_defaults() {
        let limits: SelectionLimits = serde_yaml::from_str("max_exact_items: 50").unwrap();
        assert_eq!(limits.max_exact_items, 50);
        assert_eq!(limits.max_exact_capacity, 10_000);
        assert_eq!(limits.choose(51, 10), SolverChoice::Greedy);
    }
}
