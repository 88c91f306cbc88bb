// Stock Count - Core Library
// Exposes all modules for use in the TUI/CLI, the web server, and tests

pub mod config;
pub mod error;
pub mod export;
pub mod inventory;
pub mod items;
pub mod logging;
pub mod pages;
pub mod reconciliation;
pub mod store;

// Re-export commonly used types
pub use config::{AppConfig, DataFiles};
pub use error::{StockError, StockResult, ValidationError};
pub use export::{render_order_list, ExportLayout, PageGeometry};
pub use inventory::{DeleteOutcome, Inventory};
pub use items::{
    ItemType, MovementRecord, NewItem, OrderLine, StockItem, StockLevel, StockMove,
    ThresholdItem,
};
pub use reconciliation::{order_list, ReconciliationReport, Reconciler};
pub use store::Store;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
