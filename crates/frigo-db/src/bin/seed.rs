//! # Store Seeder
//!
//! Creates or resets a FrigoGest store for development.
//!
//! ## Usage
//! ```bash
//! # Seed any missing collections (default)
//! cargo run -p frigo-db --bin seed
//!
//! # Re-add missing seed products and customers
//! cargo run -p frigo-db --bin seed -- --reset
//!
//! # Wipe everything, device settings included, and re-seed
//! cargo run -p frigo-db --bin seed -- --reset --full
//!
//! # Specify database path
//! cargo run -p frigo-db --bin seed -- --db ./data/frigogest.db
//! ```

use frigo_core::Collection;
use frigo_db::{Database, DbConfig};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./frigogest_dev.db");
    let mut reset = false;
    let mut full = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--reset" | "-r" => reset = true,
            "--full" => full = true,
            "--help" | "-h" => {
                println!("FrigoGest Store Seeder");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./frigogest_dev.db)");
                println!("  -r, --reset        Re-add missing seed products and customers");
                println!("      --full         With --reset: wipe the store and settings first");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => {
                eprintln!("Unknown option: {}", other);
                return Ok(());
            }
        }
        i += 1;
    }

    println!("🧊 FrigoGest Store Seeder");
    println!("=========================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    if reset {
        let count = db.collections().reset(full).await?;
        if full {
            println!("✓ Store wiped and re-seeded ({} records)", count);
        } else {
            println!("✓ Restored {} seed records", count);
        }
    } else {
        let seeded = db.collections().init().await?;
        if seeded.is_empty() {
            println!("✓ All collections present, nothing to seed");
        } else {
            let keys: Vec<&str> = seeded.iter().map(Collection::key).collect();
            println!("✓ Seeded: {}", keys.join(", "));
        }
    }

    let data = db.collections().load_dataset().await?;
    println!();
    println!("  Categories:   {}", data.categories.len());
    println!("  Products:     {}", data.products.len());
    println!("  Batches:      {}", data.batches.len());
    println!("  Customers:    {}", data.customers.len());
    println!("  Sales:        {}", data.sales.len());
    println!("  Sale details: {}", data.sale_details.len());

    db.close().await;
    println!();
    println!("✓ Seed complete!");

    Ok(())
}
