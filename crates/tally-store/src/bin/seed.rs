//! # Seed Data Writer
//!
//! Writes the sample catalog into a file-store data directory.
//!
//! ## Usage
//! ```bash
//! # Seed ./tally-data (default)
//! cargo run -p tally-store --bin seed
//!
//! # Specify the data directory
//! cargo run -p tally-store --bin seed -- --dir ~/.local/share/tally
//!
//! # Overwrite an existing catalog (sales history is left alone)
//! cargo run -p tally-store --bin seed -- --force
//! ```

use std::env;

use tally_core::{Catalog, PersistenceStore};
use tally_store::{seed, JsonFileStore};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut dir = String::from("./tally-data");
    let mut force = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--dir" | "-d" => {
                if i + 1 < args.len() {
                    dir = args[i + 1].clone();
                    i += 1;
                }
            }
            "--force" | "-f" => force = true,
            "--help" | "-h" => {
                println!("Tally Seed Data Writer");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --dir <PATH>   Data directory (default: ./tally-data)");
                println!("  -f, --force        Overwrite an existing catalog");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => eprintln!("Ignoring unknown argument: {other}"),
        }
        i += 1;
    }

    println!("Tally Seed Data Writer");
    println!("======================");
    println!("Data directory: {dir}");
    println!();

    let store = JsonFileStore::open(&dir)?;

    if store.has_catalog() && !force {
        let existing = store.load_catalog()?;
        println!("⚠ Catalog already has {} products", existing.len());
        println!("  Skipping seed. Pass --force to overwrite.");
        return Ok(());
    }

    // Round-trip through Catalog so the data set is validated before writing.
    let catalog = Catalog::new(seed::sample_products())?;
    store.save_catalog(&catalog.snapshot())?;

    for product in catalog.list() {
        println!(
            "  {:>3}  {:<10} {:>8}  stock {:>4}",
            product.id,
            product.name,
            product.unit_price().to_string(),
            product.stock
        );
    }

    println!();
    println!("✓ Wrote {}", store.catalog_path().display());
    println!("  Sign in with admin/admin or cashier/cashier.");

    Ok(())
}
