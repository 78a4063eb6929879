//! Delivery plans produced by planning runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::order::Order;

/// The artifact of one planning invocation.
///
/// Immutable after creation. Invariants (upheld by the planner, checked
/// in tests): `total_weight` never exceeds the requested capacity, the
/// totals are the sums over `orders`, and no order id appears twice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryPlan {
    /// Unique identifier for this plan
    pub id: Uuid,

    /// Robot the plan was generated for
    pub robot_id: String,

    /// Sum of selected order weights
    pub total_weight: u64,

    /// Sum of selected order values
    pub total_value: u64,

    /// The selected orders (iteration order unspecified)
    pub orders: Vec<Order>,

    /// When the plan was generated
    pub created_at: DateTime<Utc>,
}

impl DeliveryPlan {
    /// Build a plan from a set of selected orders, computing the totals.
    pub fn new(robot_id: impl Into<String>, orders: Vec<Order>) -> Self {
        let total_weight = orders.iter().map(|o| o.weight as u64).sum();
        let total_value = orders.iter().map(|o| o.value as u64).sum();
        Self {
            id: Uuid::new_v4(),
            robot_id: robot_id.into(),
            total_weight,
            total_value,
            orders,
            created_at: Utc::now(),
        }
    }

    /// The empty plan for a robot (nothing eligible or nothing fits).
    pub fn empty(robot_id: impl Into<String>) -> Self {
        Self::new(robot_id, Vec::new())
    }

    /// Identifiers of the selected orders.
    pub fn order_ids(&self) -> Vec<i64> {
        self.orders.iter().map(|o| o.id).collect()
    }

    /// Whether the plan selects no orders.
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}
