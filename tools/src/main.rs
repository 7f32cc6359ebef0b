//! # concierge-tools
//!
//! Tool server for Concierge: exposes `get_user_details` over line-delimited
//! JSON-RPC on stdio, backed by a SQLite customers database.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::BufReader;
use std::path::PathBuf;

mod customers;
mod rpc;

use customers::CustomerDb;

/// concierge-tools - customer database tool server
#[derive(Parser)]
#[command(name = "concierge-tools")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Customer-database tool server speaking JSON-RPC over stdio")]
struct Cli {
    /// Path to the customers database
    #[arg(short, long, default_value = "data/customers.db")]
    database: PathBuf,

    /// Create the customers table and seed demo rows before serving
    #[arg(long)]
    init_demo: bool,

    /// Enable verbose logging (stderr)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout is the protocol channel; all logging goes to stderr
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(if cli.verbose {
            "debug"
        } else {
            "info"
        }))
        .with_writer(std::io::stderr)
        .init();

    if let Some(parent) = cli.database.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }

    let db = CustomerDb::open(&cli.database)
        .with_context(|| format!("failed to open {}", cli.database.display()))?;

    if cli.init_demo {
        db.init_demo().context("failed to seed demo data")?;
        tracing::info!(database = %cli.database.display(), "demo data seeded");
    }

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    rpc::serve(BufReader::new(stdin.lock()), stdout.lock(), &db)
}
