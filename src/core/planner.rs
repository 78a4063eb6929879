//! Delivery planning orchestrator.
//!
//! Sequences "read eligible orders" -> "select subset" -> "claim the
//! selected ids" as one atomic unit inside a single transactional
//! scope, under a deadline. Any failure (store error, cancellation,
//! lost claim race) aborts the whole unit with no partial effect.

use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::core::knapsack::{self, SolveError};
use crate::core::policy::{SelectionLimits, SolverChoice};
use crate::domain::{DeliveryPlan, OrderStatus};
use crate::store::{OrderStore, PlanningScope, StoreError};

/// Tunables for a planner instance
#[derive(Debug, Clone)]
pub struct PlannerSettings {
    /// Deadline for one planning invocation (default: 30s)
    pub timeout: Duration,

    /// Exact-solver size limits
    pub limits: SelectionLimits,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            limits: SelectionLimits::default(),
        }
    }
}

/// Errors from a planning invocation
#[derive(Debug, Error)]
pub enum PlanError {
    /// The caller-imposed deadline elapsed during read, selection, or
    /// write. Distinct from data errors so callers can retry.
    #[error("planning deadline exceeded")]
    DeadlineExceeded,

    #[error("capacity must be non-negative, got {0}")]
    InvalidCapacity(i64),

    #[error("order {id} has a negative weight or value")]
    InvalidOrder { id: i64 },

    /// The conditional claim changed fewer rows than were selected:
    /// part of the selection was taken by a concurrent run.
    #[error("only {updated} of {expected} selected orders could be claimed")]
    Conflict { expected: usize, updated: usize },

    #[error("order store error: {0}")]
    Store(#[from] StoreError),
}

impl From<SolveError> for PlanError {
    fn from(err: SolveError) -> Self {
        match err {
            SolveError::DeadlineExceeded => Self::DeadlineExceeded,
        }
    }
}

/// Generates delivery plans against a shared order pool.
pub struct Planner<S: OrderStore> {
    store: S,
    settings: PlannerSettings,
}

impl<S: OrderStore> Planner<S> {
    /// Create a planner with default settings.
    pub fn new(store: S) -> Self {
        Self::with_settings(store, PlannerSettings::default())
    }

    /// Create a planner with explicit settings.
    pub fn with_settings(store: S, settings: PlannerSettings) -> Self {
        Self { store, settings }
    }

    /// The store this planner plans against.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Generate a delivery plan for a robot with the given capacity.
    ///
    /// Reads the eligible snapshot, selects a maximum-value feasible
    /// subset, and transitions exactly the selected ids to
    /// `delivering`, all inside one transactional scope. An empty
    /// selection skips the write and returns an empty plan.
    #[instrument(skip(self))]
    pub async fn generate_plan(
        &self,
        robot_id: &str,
        capacity: i64,
    ) -> Result<DeliveryPlan, PlanError> {
        if capacity < 0 {
            return Err(PlanError::InvalidCapacity(capacity));
        }
        let capacity = capacity as u64;

        // The outer timeout covers the store awaits; the deadline is
        // also threaded into the solver, which is synchronous and can
        // only observe cancellation by polling.
        let deadline = Instant::now() + self.settings.timeout;
        match tokio::time::timeout(
            self.settings.timeout,
            self.plan_once(robot_id, capacity, deadline),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                warn!(robot_id, "planning run timed out");
                Err(PlanError::DeadlineExceeded)
            }
        }
    }

    async fn plan_once(
        &self,
        robot_id: &str,
        capacity: u64,
        deadline: Instant,
    ) -> Result<DeliveryPlan, PlanError> {
        let mut scope = self.store.begin().await?;

        match self
            .plan_in_scope(&mut scope, robot_id, capacity, deadline)
            .await
        {
            Ok(plan) => {
                scope.commit().await?;
                info!(
                    robot_id,
                    orders = plan.orders.len(),
                    total_weight = plan.total_weight,
                    total_value = plan.total_value,
                    "delivery plan committed"
                );
                Ok(plan)
            }
            Err(err) => {
                if let Err(rb) = scope.rollback().await {
                    warn!(error = %rb, "rollback after failed planning run also failed");
                }
                Err(err)
            }
        }
    }

    async fn plan_in_scope(
        &self,
        scope: &mut Box<dyn PlanningScope + '_>,
        robot_id: &str,
        capacity: u64,
        deadline: Instant,
    ) -> Result<DeliveryPlan, PlanError> {
        let orders = scope.fetch_eligible().await?;
        debug!(robot_id, eligible = orders.len(), "fetched eligible orders");

        if let Some(bad) = orders.iter().find(|o| o.weight < 0 || o.value < 0) {
            return Err(PlanError::InvalidOrder { id: bad.id });
        }

        let choice = self.settings.limits.choose(orders.len(), capacity);
        debug!(solver = choice.as_str(), "solver selected");

        let selection = match choice {
            SolverChoice::Exact => knapsack::solve_exact(&orders, capacity, deadline)?,
            SolverChoice::Greedy => knapsack::solve_greedy(&orders, capacity),
        };

        if selection.orders.is_empty() {
            // Nothing eligible or nothing fits; skipping the write is
            // the legitimate empty result, not an error.
            return Ok(DeliveryPlan::empty(robot_id));
        }

        let ids: Vec<i64> = selection.orders.iter().map(|o| o.id).collect();
        let updated = scope
            .transition_status(&ids, OrderStatus::Shipping, OrderStatus::Delivering)
            .await?;
        if updated != ids.len() {
            return Err(PlanError::Conflict {
                expected: ids.len(),
                updated,
            });
        }

        Ok(DeliveryPlan::new(robot_id, selection.orders))
    }

    /// Transition a single order between adjacent states, e.g. a robot
    /// marking a delivered order as arrived. Runs under the same
    /// timeout and atomicity rules as planning.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        order_id: i64,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<(), PlanError> {
        let unit = async {
            let mut scope = self.store.begin().await?;
            match scope.transition_status(&[order_id], from, to).await {
                Ok(1) => {
                    scope.commit().await?;
                    info!(order_id, %from, %to, "order status updated");
                    Ok(())
                }
                Ok(updated) => {
                    if let Err(rb) = scope.rollback().await {
                        warn!(error = %rb, "rollback failed");
                    }
                    Err(PlanError::Conflict {
                        expected: 1,
                        updated,
                    })
                }
                Err(err) => {
                    if let Err(rb) = scope.rollback().await {
                        warn!(error = %rb, "rollback failed");
                    }
                    Err(PlanError::Store(err))
                }
            }
        };

        match tokio::time::timeout(self.settings.timeout, unit).await {
            Ok(result) => result,
            Err(_) => Err(PlanError::DeadlineExceeded),
        }
    }
}
