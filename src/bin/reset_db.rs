//! Developer tool: drop and recreate the `reviews` table.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use review_records::domain::EmployeeId;
use review_records::infra::app_config;
use review_records::infra::db::{Database, ReviewRepository};

#[derive(Parser, Debug)]
#[command(name = "reset_db")]
#[command(about = "Drop and recreate the reviews table", long_about = None)]
struct Args {
    /// Database file to reset (defaults to the configured database)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Drop the table without recreating it
    #[arg(long)]
    drop_only: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    run(&Args::parse())
}

fn run(args: &Args) -> Result<()> {
    let db_path = match &args.db {
        Some(path) => path.clone(),
        None => app_config::load_config().resolved_database_path(),
    };

    if !db_path.exists() {
        println!("Database does not exist at: {}", db_path.display());
        println!("No reset needed.");
        return Ok(());
    }

    println!("Connecting to database at: {}", db_path.display());
    let db = Database::open_at(db_path.clone())?;

    let review_count = count_reviews(&db)?;
    match review_count {
        Some(count) => println!("Current reviews: {}", count),
        None => println!("Reviews table does not exist."),
    }

    // Table DDL needs no employee checks.
    let no_employees = |_: EmployeeId| -> Result<bool> { Ok(false) };
    let mut repo = ReviewRepository::new(db.connection(), no_employees);
    repo.drop_table()?;
    println!("Dropped reviews table");

    if !args.drop_only {
        repo.create_table()?;
        println!("Recreated reviews table");
    }

    log::info!("Reset reviews table at {}", db_path.display());
    println!("Database location: {}", db_path.display());
    Ok(())
}

fn count_reviews(db: &Database) -> Result<Option<i64>> {
    let conn = db.connection();
    let conn = conn
        .lock()
        .map_err(|_| anyhow::anyhow!("database lock poisoned"))?;
    let exists: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'reviews'",
        [],
        |row| row.get(0),
    )?;
    if exists == 0 {
        return Ok(None);
    }
    let count = conn.query_row("SELECT COUNT(*) FROM reviews", [], |row| row.get(0))?;
    Ok(Some(count))
}
