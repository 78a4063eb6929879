//! Candidate order store boundary.
//!
//! The planner talks to the order pool exclusively through these
//! traits. A [`PlanningScope`] is one transactional scope: every read
//! and write of a planning run goes through a single scope, constructed
//! once per invocation and never reused. Effects become visible only on
//! `commit`; dropping a scope without committing discards them.

pub mod memory;
pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Order, OrderStatus};

// Re-export the concrete stores
pub use memory::MemoryOrderStore;
pub use sqlite::SqliteOrderStore;

/// Errors from the order store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("unknown order status in store: {0:?}")]
    UnknownStatus(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// One transactional scope over the order pool.
///
/// Scopes serialize against each other: while one planning run holds a
/// scope, a second run cannot observe or claim the same rows until the
/// first commits or rolls back.
#[async_trait]
pub trait PlanningScope: Send {
    /// Snapshot of all orders currently in the eligible (shipping) state.
    async fn fetch_eligible(&mut self) -> Result<Vec<Order>, StoreError>;

    /// Bulk status transition restricted to `ids`, conditional on each
    /// row still being in the `from` state. Returns the number of rows
    /// actually changed; an empty `ids` is a trivially successful no-op.
    async fn transition_status(
        &mut self,
        ids: &[i64],
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<usize, StoreError>;

    /// Make the scope's writes durable.
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    /// Discard the scope's writes.
    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

/// A store that can open planning scopes.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Open a new transactional scope.
    async fn begin(&self) -> Result<Box<dyn PlanningScope + '_>, StoreError>;
}

// Allow one store to serve several concurrent planners.
#[async_trait]
impl<S: OrderStore + ?Sized> OrderStore for Arc<S> {
    async fn begin(&self) -> Result<Box<dyn PlanningScope + '_>, StoreError> {
        (**self).begin().await
    }
}
