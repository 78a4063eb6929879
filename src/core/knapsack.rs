//! Order selection solvers.
//!
//! Two pure functions over a snapshot of eligible orders:
//! - `solve_exact`: 0/1 knapsack via dynamic programming, optimal but
//!   `O(n * capacity)` in time and memory
//! - `solve_greedy`: value-density ranking, feasible but not optimal,
//!   used when the exact table would be too large
//!
//! Neither solver performs I/O or holds shared state. The exact solver
//! polls a deadline cooperatively so a planning timeout can reach into
//! the inner loop.

use std::cmp::Ordering;
use std::time::Instant;

use thiserror::Error;

use crate::domain::Order;

/// A feasible subset of orders with its aggregate weight and value.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// Selected orders (order unspecified; callers must not rely on it)
    pub orders: Vec<Order>,

    /// Sum of selected weights
    pub total_weight: u64,

    /// Sum of selected values
    pub total_value: u64,
}

impl Selection {
    fn from_orders(orders: Vec<Order>) -> Self {
        let total_weight = orders.iter().map(|o| o.weight as u64).sum();
        let total_value = orders.iter().map(|o| o.value as u64).sum();
        Self {
            orders,
            total_weight,
            total_value,
        }
    }
}

/// Errors from the selection solvers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SolveError {
    #[error("selection aborted: deadline exceeded")]
    DeadlineExceeded,
}

/// Optimal 0/1 knapsack selection.
///
/// Builds a `(n+1) x (capacity+1)` table of best achievable value and
/// reconstructs the chosen subset by backtracking. The deadline is
/// polled once per item row; on expiry the solver aborts with no
/// partial result.
///
/// Weights and values must already be validated non-negative.
pub fn solve_exact(
    orders: &[Order],
    capacity: u64,
    deadline: Instant,
) -> Result<Selection, SolveError> {
    let n = orders.len();
    if n == 0 {
        return Ok(Selection::default());
    }

    let cap = capacity as usize;
    let mut best = vec![vec![0u64; cap + 1]; n + 1];

    for i in 1..=n {
        // One check per row keeps cancellation latency bounded by a
        // single O(capacity) sweep without paying for it on every cell.
        if Instant::now() >= deadline {
            return Err(SolveError::DeadlineExceeded);
        }

        let order = &orders[i - 1];
        let item_weight = order.weight as usize;
        let item_value = order.value as u64;

        for w in 0..=cap {
            let mut v = best[i - 1][w];
            if item_weight <= w {
                let include = best[i - 1][w - item_weight] + item_value;
                if include > v {
                    v = include;
                }
            }
            best[i][w] = v;
        }
    }

    // Backtrack: the value changes between rows exactly when item i was
    // taken at this remaining budget.
    let mut selected = Vec::new();
    let mut w = cap;
    for i in (1..=n).rev() {
        if best[i][w] != best[i - 1][w] {
            let order = &orders[i - 1];
            selected.push(order.clone());
            w -= order.weight as usize;
        }
    }

    Ok(Selection::from_orders(selected))
}

/// Approximate selection by value density.
///
/// Orders are ranked by value/weight descending, ties broken by
/// ascending id so the result is deterministic, then accepted while
/// they still fit. Zero-weight orders with positive value are taken
/// outright before ranking: they never consume capacity and would
/// otherwise divide by zero.
pub fn solve_greedy(orders: &[Order], capacity: u64) -> Selection {
    let mut selected: Vec<Order> = orders
        .iter()
        .filter(|o| o.weight == 0 && o.value > 0)
        .cloned()
        .collect();

    let mut ranked: Vec<&Order> = orders.iter().filter(|o| o.weight > 0).collect();
    ranked.sort_by(|a, b| {
        let ra = a.value as f64 / a.weight as f64;
        let rb = b.value as f64 / b.weight as f64;
        rb.partial_cmp(&ra)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut total_weight = 0u64;
    for order in ranked {
        if total_weight + order.weight as u64 <= capacity {
            total_weight += order.weight as u64;
            selected.push(order.clone());
        }
    }

    Selection::from_orders(selected)
}
