// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

// Use library instead of local modules
use stock_count::{export, logging, AppConfig, Store};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let config = AppConfig::from_env();
    let store = Store::new(config.files.clone());

    match args.get(1).map(String::as_str) {
        Some("orders") => {
            logging::init();
            run_orders(&store)?;
        }
        Some("export") => {
            logging::init();
            let path = args
                .get(2)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(export::FILE_NAME));
            run_export(&store, path)?;
        }
        Some("history") => {
            logging::init();
            run_history(&store)?;
        }
        Some(other) => {
            eprintln!("❌ Unknown command: {}", other);
            eprintln!("   Usage: stock-count [orders | export [PATH] | history]");
            std::process::exit(2);
        }
        // UI mode (default)
        None => run_ui_mode(store)?,
    }

    Ok(())
}

fn run_orders(store: &Store) -> Result<()> {
    let inventory = store.load().context("Failed to load inventory")?;
    let report = inventory.reconcile();

    println!("📋 Order List (Items Below Threshold)");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    if !report.needs_ordering() {
        println!("✓ Nothing below threshold");
    }
    for line in &report.order_lines {
        println!("{:<30} {:<12} {:>6}", line.item, line.item_type, line.order_quantity);
    }

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("{}", report.summary());
    Ok(())
}

fn run_export(store: &Store, path: PathBuf) -> Result<()> {
    let inventory = store.load().context("Failed to load inventory")?;
    let lines = inventory.order_list();

    let bytes = export::render_order_list(&lines).context("Failed to render order list")?;
    std::fs::write(&path, bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("📄 Wrote {} order lines to {}", lines.len(), path.display());
    Ok(())
}

fn run_history(store: &Store) -> Result<()> {
    let history = store.history().context("Failed to read movement history")?;

    println!(
        "{:<30} {:>13} {:>11} {:>13}  {}",
        "ITEM", "OPENING_STOCK", "STOCK_MOVED", "CLOSING_STOCK", "DATE"
    );
    for record in &history {
        println!(
            "{:<30} {:>13} {:>11} {:>13}  {}",
            record.item, record.opening_stock, record.moved, record.closing_stock, record.date
        );
    }
    println!("\n✓ {} movement records", history.len());
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(store: Store) -> Result<()> {
    logging::init_file(std::path::Path::new("stock-count.log"))
        .context("Failed to open log file")?;

    println!("🖥️  Loading Stock Count UI...\n");

    let mut app = ui::App::new(store).context("Failed to load inventory")?;
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_store: Store) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use web UI: cargo run --bin stock-server --features server");
    std::process::exit(1);
}
