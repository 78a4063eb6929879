//! Domain types for the packbot planner.
//!
//! This module contains the core data structures:
//! - Order: a single shippable order in the pool
//! - OrderStatus: the closed set of order states
//! - DeliveryPlan: the artifact produced by one planning run

pub mod order;
pub mod plan;

// Re-export commonly used types
pub use order::{Order, OrderStatus};
pub use plan::DeliveryPlan;
