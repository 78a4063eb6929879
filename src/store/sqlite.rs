//! SQLite-backed order store.
//!
//! A single connection behind an async mutex. `begin` holds the
//! connection guard for the life of the scope and opens a
//! `BEGIN IMMEDIATE` transaction, so concurrent planning runs serialize
//! and a second run cannot read rows the first has claimed but not yet
//! committed. The bulk update is additionally conditional on the source
//! status and reports the changed-row count, so a misconfigured store
//! fails loudly instead of double-selecting.

use std::path::Path;

use chrono::DateTime;
use rusqlite::{params, params_from_iter, types::Value, Connection};
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::domain::{Order, OrderStatus};

use super::{OrderStore, PlanningScope, StoreError};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS orders (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    weight     INTEGER NOT NULL,
    value      INTEGER NOT NULL,
    status     TEXT    NOT NULL DEFAULT 'shipping',
    created_at TEXT
);
CREATE INDEX IF NOT EXISTS idx_orders_status ON orders(status);
";

/// Order store persisted in a SQLite database
pub struct SqliteOrderStore {
    conn: Mutex<Connection>,
}

impl SqliteOrderStore {
    /// Open (or create) a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::init(Connection::open(path)?)
    }

    /// Open a private in-memory store.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Insert a new eligible order and return its id.
    pub async fn add_order(&self, weight: i64, value: i64) -> Result<i64, StoreError> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO orders (weight, value, status, created_at) VALUES (?1, ?2, 'shipping', ?3)",
            params![weight, value, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// All orders in the pool, id ascending.
    pub async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT id, weight, value, status, created_at FROM orders ORDER BY id",
        )?;
        let rows = stmt
            .query_map([], row_to_tuple)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(tuple_to_order).collect()
    }

    /// Count orders currently in a given status.
    pub async fn count_by_status(&self, status: OrderStatus) -> Result<usize, StoreError> {
        let conn = self.conn.lock().await;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM orders WHERE status = ?1",
            params![status.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

#[async_trait::async_trait]
impl OrderStore for SqliteOrderStore {
    async fn begin(&self) -> Result<Box<dyn PlanningScope + '_>, StoreError> {
        let conn = self.conn.lock().await;
        conn.execute_batch("BEGIN IMMEDIATE")?;
        debug!("opened planning scope");
        Ok(Box::new(SqliteScope { conn, open: true }))
    }
}

/// A `BEGIN IMMEDIATE` transaction holding the connection guard.
///
/// Rolls back on drop if neither `commit` nor `rollback` ran, which
/// also covers cancellation by the planning timeout.
pub struct SqliteScope<'a> {
    conn: MutexGuard<'a, Connection>,
    open: bool,
}

#[async_trait::async_trait]
impl PlanningScope for SqliteScope<'_> {
    async fn fetch_eligible(&mut self) -> Result<Vec<Order>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, weight, value, status, created_at FROM orders \
             WHERE status = 'shipping' ORDER BY id",
        )?;
        let rows = stmt
            .query_map([], row_to_tuple)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(tuple_to_order).collect()
    }

    async fn transition_status(
        &mut self,
        ids: &[i64],
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<usize, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "UPDATE orders SET status = ? WHERE status = ? AND id IN ({placeholders})"
        );

        let mut args: Vec<Value> = Vec::with_capacity(ids.len() + 2);
        args.push(to.as_str().to_string().into());
        args.push(from.as_str().to_string().into());
        args.extend(ids.iter().map(|id| Value::from(*id)));

        let changed = self.conn.execute(&sql, params_from_iter(args))?;
        Ok(changed)
    }

    async fn commit(mut self: Box<Self>) -> Result<(), StoreError> {
        self.open = false;
        let result = self.conn.execute_batch("COMMIT");
        if result.is_err() {
            // Leave the connection usable for the next scope.
            let _ = self.conn.execute_batch("ROLLBACK");
        }
        result.map_err(Into::into)
    }

    async fn rollback(mut self: Box<Self>) -> Result<(), StoreError> {
        self.open = false;
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }
}

impl Drop for SqliteScope<'_> {
    fn drop(&mut self) {
        if self.open {
            let _ = self.conn.execute_batch("ROLLBACK");
        }
    }
}

type OrderRow = (i64, i64, i64, String, Option<String>);

fn row_to_tuple(row: &rusqlite::Row<'_>) -> rusqlite::Result<OrderRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
    ))
}

fn tuple_to_order((id, weight, value, status, created_at): OrderRow) -> Result<Order, StoreError> {
    let status = OrderStatus::parse(&status).ok_or(StoreError::UnknownStatus(status))?;
    let created_at = created_at
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&chrono::Utc));
    Ok(Order {
        id,
        weight,
        value,
        status,
        created_at,
    })
}
