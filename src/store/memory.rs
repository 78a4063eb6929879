//! In-memory order store.
//!
//! Backs tests and demos without touching disk. The scope takes the
//! pool's owned mutex guard for its whole lifetime, so planning runs
//! are fully serialized; writes are staged and only applied on commit.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::{Order, OrderStatus};

use super::{OrderStore, PlanningScope, StoreError};

/// Order store held entirely in memory
pub struct MemoryOrderStore {
    orders: Arc<Mutex<BTreeMap<i64, Order>>>,
    next_id: AtomicI64,
}

impl Default for MemoryOrderStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryOrderStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            orders: Arc::new(Mutex::new(BTreeMap::new())),
            next_id: AtomicI64::new(1),
        }
    }

    /// Create a store pre-populated with orders.
    pub fn with_orders(orders: impl IntoIterator<Item = Order>) -> Self {
        let map: BTreeMap<i64, Order> = orders.into_iter().map(|o| (o.id, o)).collect();
        let next = map.keys().max().copied().unwrap_or(0) + 1;
        Self {
            orders: Arc::new(Mutex::new(map)),
            next_id: AtomicI64::new(next),
        }
    }

    /// Insert a new eligible order and return its id.
    pub async fn add_order(&self, weight: i64, value: i64) -> i64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.orders
            .lock()
            .await
            .insert(id, Order::shipping(id, weight, value));
        id
    }

    /// Copy of the current pool, id ascending.
    pub async fn snapshot(&self) -> Vec<Order> {
        self.orders.lock().await.values().cloned().collect()
    }

    /// Count orders currently in a given status.
    pub async fn count_by_status(&self, status: OrderStatus) -> usize {
        self.orders
            .lock()
            .await
            .values()
            .filter(|o| o.status == status)
            .count()
    }
}

#[async_trait::async_trait]
impl OrderStore for MemoryOrderStore {
    async fn begin(&self) -> Result<Box<dyn PlanningScope + '_>, StoreError> {
        let guard = self.orders.clone().lock_owned().await;
        Ok(Box::new(MemoryScope {
            guard,
            staged: Vec::new(),
        }))
    }
}

/// Scope over the in-memory pool; staged writes apply on commit.
pub struct MemoryScope {
    guard: OwnedMutexGuard<BTreeMap<i64, Order>>,
    staged: Vec<(i64, OrderStatus)>,
}

#[async_trait::async_trait]
impl PlanningScope for MemoryScope {
    async fn fetch_eligible(&mut self) -> Result<Vec<Order>, StoreError> {
        Ok(self
            .guard
            .values()
            .filter(|o| o.status == OrderStatus::Shipping)
            .cloned()
            .collect())
    }

    async fn transition_status(
        &mut self,
        ids: &[i64],
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<usize, StoreError> {
        let mut changed = 0;
        for id in ids {
            let already_staged = self.staged.iter().any(|(sid, _)| sid == id);
            if already_staged {
                continue;
            }
            if let Some(order) = self.guard.get(id) {
                if order.status == from {
                    self.staged.push((*id, to));
                    changed += 1;
                }
            }
        }
        Ok(changed)
    }

    async fn commit(mut self: Box<Self>) -> Result<(), StoreError> {
        let staged = std::mem::take(&mut self.staged);
        for (id, status) in staged {
            if let Some(order) = self.guard.get_mut(&id) {
                order.status = status;
            }
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        // Staged writes are simply dropped with the scope.
        Ok(())
    }
}
