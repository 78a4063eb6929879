//! Core planning logic.
//!
//! This module contains:
//! - knapsack: the exact and greedy selection solvers
//! - policy: the size-based choice between them
//! - planner: the transactional planning orchestrator

pub mod knapsack;
pub mod planner;
pub mod policy;

// Re-export commonly used types
pub use knapsack::{solve_exact, solve_greedy, Selection, SolveError};
pub use planner::{PlanError, Planner, PlannerSettings};
pub use policy::{SelectionLimits, SolverChoice};
