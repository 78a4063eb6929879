//! Command-line interface for packbot.
//!
//! Provides commands for generating delivery plans, seeding and
//! inspecting the order pool, and transitioning individual orders.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use crate::config;
use crate::core::{PlanError, Planner, PlannerSettings};
use crate::domain::OrderStatus;
use crate::store::SqliteOrderStore;

/// packbot - capacity-aware delivery planning engine
#[derive(Parser, Debug)]
#[command(name = "packbot")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Orders database path (overrides config)
    #[arg(long, global = true, env = "PACKBOT_DB")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a delivery plan for a robot
    Plan {
        /// Robot identifier
        robot_id: String,

        /// Carrying capacity (maximum total weight)
        #[arg(short, long)]
        capacity: i64,

        /// Planning timeout in seconds (overrides config)
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Add a single order to the pool
    Add {
        /// Shipping weight
        #[arg(short, long)]
        weight: i64,

        /// Order value
        #[arg(short, long)]
        value: i64,
    },

    /// Seed the pool with deterministic demo orders
    Seed {
        /// Number of orders to create
        #[arg(short, long, default_value = "20")]
        count: usize,
    },

    /// List orders and status counts
    Orders,

    /// Transition a single order to a new status
    Mark {
        /// Order identifier
        order_id: i64,

        /// Target status
        #[arg(value_enum)]
        status: StatusArg,
    },

    /// Show resolved configuration (debug)
    Config,
}

/// Target statuses reachable from the CLI
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum StatusArg {
    Delivering,
    Arrived,
}

impl StatusArg {
    fn to_status(self) -> OrderStatus {
        match self {
            Self::Delivering => OrderStatus::Delivering,
            Self::Arrived => OrderStatus::Arrived,
        }
    }

    /// The state an order must be in for this transition.
    fn source(self) -> OrderStatus {
        match self {
            Self::Delivering => OrderStatus::Shipping,
            Self::Arrived => OrderStatus::Delivering,
        }
    }
}

impl Cli {
    /// Execute the parsed command.
    pub async fn execute(self) -> Result<()> {
        let cfg = config::load()?;
        let db_path = self.db.unwrap_or_else(|| cfg.db_path.clone());

        match self.command {
            Commands::Plan {
                robot_id,
                capacity,
                timeout,
            } => {
                let mut settings = cfg.planner.clone();
                if let Some(secs) = timeout {
                    settings.timeout = Duration::from_secs(secs);
                }
                run_plan(&db_path, &robot_id, capacity, settings).await
            }
            Commands::Add { weight, value } => {
                let store = open_store(&db_path)?;
                let id = store.add_order(weight, value).await?;
                println!("Added order {} (weight {}, value {})", id, weight, value);
                Ok(())
            }
            Commands::Seed { count } => seed_orders(&db_path, count).await,
            Commands::Orders => list_orders(&db_path).await,
            Commands::Mark { order_id, status } => mark_order(&db_path, order_id, status).await,
            Commands::Config => {
                println!("Home: {}", cfg.home.display());
                println!("Database: {}", db_path.display());
                match &cfg.config_file {
                    Some(path) => println!("Config file: {}", path.display()),
                    None => println!("Config file: (none found)"),
                }
                println!("Timeout: {:?}", cfg.planner.timeout);
                println!("Max exact items: {}", cfg.planner.limits.max_exact_items);
                println!(
                    "Max exact capacity: {}",
                    cfg.planner.limits.max_exact_capacity
                );
                Ok(())
            }
        }
    }
}

fn open_store(db_path: &Path) -> Result<SqliteOrderStore> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    SqliteOrderStore::open(db_path)
        .with_context(|| format!("Failed to open orders database: {}", db_path.display()))
}

/// Generate and print a delivery plan
async fn run_plan(
    db_path: &Path,
    robot_id: &str,
    capacity: i64,
    settings: PlannerSettings,
) -> Result<()> {
    let store = open_store(db_path)?;
    let planner = Planner::with_settings(store, settings);

    match planner.generate_plan(robot_id, capacity).await {
        Ok(plan) => {
            println!("{}", serde_json::to_string_pretty(&plan)?);
            eprintln!(
                "\n[Plan {}: {} orders, weight {}/{}, value {}]",
                plan.id,
                plan.orders.len(),
                plan.total_weight,
                capacity,
                plan.total_value
            );
            Ok(())
        }
        Err(PlanError::DeadlineExceeded) => {
            eprintln!("[Planning for {} timed out; no orders were claimed]", robot_id);
            std::process::exit(1);
        }
        Err(err) => Err(err.into()),
    }
}

/// Seed the pool with demo orders (deterministic, no randomness)
async fn seed_orders(db_path: &Path, count: usize) -> Result<()> {
    let store = open_store(db_path)?;

    for i in 1..=count as i64 {
        let weight = (i * 7) % 15 + 1;
        let value = (i * 13) % 40 + 5;
        store.add_order(weight, value).await?;
    }

    println!("Seeded {} orders", count);
    Ok(())
}

/// List the pool and per-status counts
async fn list_orders(db_path: &Path) -> Result<()> {
    let store = open_store(db_path)?;
    let orders = store.list_orders().await?;

    for order in &orders {
        println!(
            "{:>6}  weight {:>4}  value {:>4}  {}",
            order.id, order.weight, order.value, order.status
        );
    }

    println!();
    for status in [
        OrderStatus::Shipping,
        OrderStatus::Delivering,
        OrderStatus::Arrived,
    ] {
        let count = store.count_by_status(status).await?;
        println!("{}: {}", status, count);
    }

    Ok(())
}

/// Transition one order, e.g. mark an arrival
async fn mark_order(db_path: &Path, order_id: i64, status: StatusArg) -> Result<()> {
    let store = open_store(db_path)?;
    let planner = Planner::new(store);

    planner
        .update_status(order_id, status.source(), status.to_status())
        .await
        .with_context(|| format!("Failed to mark order {} as {}", order_id, status.to_status()))?;

    println!("Order {} is now {}", order_id, status.to_status());
    Ok(())
}
