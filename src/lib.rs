//! packbot - capacity-aware delivery planning engine
//!
//! Selects a maximum-value subset of eligible orders for a delivery
//! robot with a fixed carrying capacity, and atomically claims the
//! chosen orders so no two robots ever take the same one.
//!
//! # Architecture
//!
//! One planning run is a single atomic, cancellable unit:
//! - a transactional scope is opened against the order store
//! - the eligible snapshot is read inside that scope
//! - a solver picks the subset (exact knapsack DP, or value-density
//!   greedy when the DP table would be too large)
//! - exactly the selected order ids transition to `delivering`
//! - the scope commits; any failure rolls everything back
//!
//! # Modules
//!
//! - `core`: solvers, solver policy, and the planning orchestrator
//! - `domain`: data structures (Order, OrderStatus, DeliveryPlan)
//! - `store`: the order store boundary plus SQLite and in-memory stores
//! - `cli`: command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Seed a demo pool and plan for a robot with capacity 40
//! packbot seed --count 30
//! packbot plan robot-1 --capacity 40
//!
//! # Inspect the pool
//! packbot orders
//!
//! # Mark an order delivered
//! packbot mark 7 arrived
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod store;

// Re-export main types at crate root for convenience
pub use self::core::{PlanError, Planner, PlannerSettings, SelectionLimits, SolverChoice};
pub use domain::{DeliveryPlan, Order, OrderStatus};
pub use store::{MemoryOrderStore, OrderStore, PlanningScope, SqliteOrderStore, StoreError};
