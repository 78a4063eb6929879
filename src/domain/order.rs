//! Orders and their lifecycle states.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single order in the shared pool.
///
/// The store owns the canonical record; the planner only ever holds a
/// read-only snapshot taken inside one transactional scope. Weight and
/// value are non-negative by contract and validated before any solver
/// runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Unique, stable identifier
    pub id: i64,

    /// Shipping weight (non-negative)
    pub weight: i64,

    /// Order value (non-negative)
    pub value: i64,

    /// Current lifecycle state
    pub status: OrderStatus,

    /// When the order was created, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Create an eligible (shipping) order without timestamps.
    pub fn shipping(id: i64, weight: i64, value: i64) -> Self {
        Self {
            id,
            weight,
            value,
            status: OrderStatus::Shipping,
            created_at: None,
        }
    }
}

/// Lifecycle state of an order.
///
/// `Shipping` is the eligible state a planner may claim from;
/// `Delivering` means a robot has the order in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Awaiting pickup; eligible for selection
    Shipping,

    /// Claimed by a robot and in transit
    Delivering,

    /// Delivered to the customer
    Arrived,
}

impl OrderStatus {
    /// Stable text encoding used by the store.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shipping => "shipping",
            Self::Delivering => "delivering",
            Self::Arrived => "arrived",
        }
    }

    /// Parse the store encoding back into a status.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "shipping" => Some(Self::Shipping),
            "delivering" => Some(Self::Delivering),
            "arrived" => Some(Self::Arrived),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            OrderStatus::Shipping,
            OrderStatus::Delivering,
            OrderStatus::Arrived,
        ] {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::parse("teleported"), None);
    }

    #[test]
    fn test_status_serde_encoding_matches_store_encoding() {
        let json = serde_json::to_string(&OrderStatus::Delivering).unwrap();
        assert_eq!(json, "\"delivering\"");
    }

    #[test]
    fn test_shipping_constructor() {
        let order = Order::shipping(7, 3, 10);
        assert_eq!(order.id, 7);
        assert_eq!(order.status, OrderStatus::Shipping);
        assert!(order.created_at.is_none());
    }
}
