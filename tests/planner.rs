//! Planner Integration Tests
//!
//! End-to-end planning runs against in-memory stores: the reference
//! scenarios, the no-write guarantee for empty selections, abort on
//! lost claims, and deadline cancellation with zero transitions.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use packbot::store::{MemoryOrderStore, OrderStore, PlanningScope, StoreError};
use packbot::{Order, OrderStatus, PlanError, Planner, PlannerSettings};

/// Store wrapper that counts calls to the write step.
struct CountingStore {
    inner: MemoryOrderStore,
    writes: Arc<AtomicUsize>,
}

impl CountingStore {
    fn new(inner: MemoryOrderStore) -> Self {
        Self {
            inner,
            writes: Arc::new(AtomicUsize::new(0)),
        }
    }
}

struct CountingScope<'a> {
    inner: Box<dyn PlanningScope + 'a>,
    writes: Arc<AtomicUsize>,
}

#[async_trait]
impl OrderStore for CountingStore {
    async fn begin(&self) -> Result<Box<dyn PlanningScope + '_>, StoreError> {
        Ok(Box::new(CountingScope {
            inner: self.inner.begin().await?,
            writes: self.writes.clone(),
        }))
    }
}

#[async_trait]
impl PlanningScope for CountingScope<'_> {
    async fn fetch_eligible(&mut self) -> Result<Vec<Order>, StoreError> {
        self.inner.fetch_eligible().await
    }

    async fn transition_status(
        &mut self,
        ids: &[i64],
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<usize, StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.transition_status(ids, from, to).await
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.inner.commit().await
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.inner.rollback().await
    }
}

/// Store wrapper that under-reports the claimed row count, simulating a
/// concurrent run stealing part of the selection.
struct ShortChangeStore {
    inner: MemoryOrderStore,
}

struct ShortChangeScope<'a> {
    inner: Box<dyn PlanningScope + 'a>,
}

#[async_trait]
impl OrderStore for ShortChangeStore {
    async fn begin(&self) -> Result<Box<dyn PlanningScope + '_>, StoreError> {
        Ok(Box::new(ShortChangeScope {
            inner: self.inner.begin().await?,
        }))
    }
}

#[async_trait]
impl PlanningScope for ShortChangeScope<'_> {
    async fn fetch_eligible(&mut self) -> Result<Vec<Order>, StoreError> {
        self.inner.fetch_eligible().await
    }

    async fn transition_status(
        &mut self,
        ids: &[i64],
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<usize, StoreError> {
        let changed = self.inner.transition_status(ids, from, to).await?;
        Ok(changed.saturating_sub(1))
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.inner.commit().await
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.inner.rollback().await
    }
}

#[tokio::test]
async fn test_scenario_exact_selection_and_claim() {
    // Orders {(1,w2,v3), (2,w3,v4), (3,w4,v5)} at capacity 5.
    let store = MemoryOrderStore::with_orders([
        Order::shipping(1, 2, 3),
        Order::shipping(2, 3, 4),
        Order::shipping(3, 4, 5),
    ]);
    let planner = Planner::new(store);

    let plan = planner.generate_plan("robot-1", 5).await.unwrap();

    let mut ids = plan.order_ids();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(plan.total_weight, 5);
    assert_eq!(plan.total_value, 7);
    assert_eq!(plan.robot_id, "robot-1");

    // Exactly the selected ids transitioned, no others.
    let store = planner.store();
    assert_eq!(store.count_by_status(OrderStatus::Delivering).await, 2);
    assert_eq!(store.count_by_status(OrderStatus::Shipping).await, 1);
    let snapshot = store.snapshot().await;
    let leftover = snapshot.iter().find(|o| o.id == 3).unwrap();
    assert_eq!(leftover.status, OrderStatus::Shipping);
}

#[tokio::test]
async fn test_empty_pool_returns_empty_plan_without_write() {
    let store = CountingStore::new(MemoryOrderStore::new());
    let writes = store.writes.clone();
    let planner = Planner::new(store);

    let plan = planner.generate_plan("robot-1", 10).await.unwrap();

    assert!(plan.is_empty());
    assert_eq!(plan.total_weight, 0);
    assert_eq!(plan.total_value, 0);
    assert_eq!(writes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_nothing_fits_skips_write() {
    let inner = MemoryOrderStore::with_orders([
        Order::shipping(1, 5, 10),
        Order::shipping(2, 7, 20),
    ]);
    let store = CountingStore::new(inner);
    let writes = store.writes.clone();
    let planner = Planner::new(store);

    let plan = planner.generate_plan("robot-1", 3).await.unwrap();

    assert!(plan.is_empty());
    assert_eq!(writes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_selected_ids_are_a_unique_subset_of_the_snapshot() {
    let store = MemoryOrderStore::new();
    for i in 1..=40i64 {
        store.add_order((i % 9) + 1, (i * 11) % 23 + 1).await;
    }
    let eligible_ids: HashSet<i64> = store.snapshot().await.iter().map(|o| o.id).collect();

    let planner = Planner::new(store);
    let plan = planner.generate_plan("robot-1", 50).await.unwrap();

    assert!(plan.total_weight <= 50);
    let ids = plan.order_ids();
    let unique: HashSet<i64> = ids.iter().copied().collect();
    assert_eq!(unique.len(), ids.len(), "no id may appear twice");
    assert!(unique.is_subset(&eligible_ids));
}

#[tokio::test]
async fn test_invalid_order_aborts_with_no_effect() {
    let store = MemoryOrderStore::with_orders([
        Order::shipping(1, 2, 3),
        Order::shipping(2, -4, 5),
    ]);
    let planner = Planner::new(store);

    let err = planner.generate_plan("robot-1", 10).await.unwrap_err();
    assert!(matches!(err, PlanError::InvalidOrder { id: 2 }));

    assert_eq!(
        planner.store().count_by_status(OrderStatus::Shipping).await,
        2
    );
}

#[tokio::test]
async fn test_lost_claim_race_aborts_the_whole_unit() {
    let inner = MemoryOrderStore::with_orders([
        Order::shipping(1, 2, 3),
        Order::shipping(2, 3, 4),
    ]);
    let store = ShortChangeStore { inner };
    let planner = Planner::new(store);

    let err = planner.generate_plan("robot-1", 10).await.unwrap_err();
    assert!(matches!(
        err,
        PlanError::Conflict {
            expected: 2,
            updated: 1
        }
    ));

    // The aborted unit left no partial claim behind.
    assert_eq!(
        planner
            .store()
            .inner
            .count_by_status(OrderStatus::Shipping)
            .await,
        2
    );
}

#[tokio::test]
async fn test_deadline_mid_computation_leaves_zero_transitions() {
    // Large enough that the exact DP cannot finish within the deadline.
    let store = MemoryOrderStore::new();
    for i in 1..=900i64 {
        store.add_order((i % 10) + 1, (i % 50) + 1).await;
    }

    let settings = PlannerSettings {
        timeout: Duration::from_millis(1),
        ..Default::default()
    };
    let planner = Planner::with_settings(store, settings);

    let err = planner.generate_plan("robot-1", 9_000).await.unwrap_err();
    assert!(matches!(err, PlanError::DeadlineExceeded));

    assert_eq!(
        planner.store().count_by_status(OrderStatus::Shipping).await,
        900
    );
    assert_eq!(
        planner
            .store()
            .count_by_status(OrderStatus::Delivering)
            .await,
        0
    );
}

#[tokio::test]
async fn test_update_status_transitions_one_order() {
    let store = MemoryOrderStore::with_orders([Order::shipping(1, 2, 3)]);
    let planner = Planner::new(store);

    planner
        .update_status(1, OrderStatus::Shipping, OrderStatus::Delivering)
        .await
        .unwrap();
    assert_eq!(
        planner
            .store()
            .count_by_status(OrderStatus::Delivering)
            .await,
        1
    );

    // Re-running the same transition finds no row in the source state.
    let err = planner
        .update_status(1, OrderStatus::Shipping, OrderStatus::Delivering)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PlanError::Conflict {
            expected: 1,
            updated: 0
        }
    ));
}

#[tokio::test]
async fn test_plan_weight_bounded_for_various_capacities() {
    for capacity in [0i64, 1, 7, 23, 100] {
        let store = MemoryOrderStore::new();
        for i in 1..=25i64 {
            store.add_order((i % 6) + 1, (i % 13) + 1).await;
        }
        let planner = Planner::new(store);
        let plan = planner.generate_plan("robot-1", capacity).await.unwrap();
        assert!(plan.total_weight <= capacity as u64);
    }
}
