// 🗃️ Inventory - In-memory state of one interaction
//
// Holds both stores for the duration of a single user action. Every mutation
// validates first and only then touches the collections, so a rejected
// request leaves the inventory exactly as it was loaded.

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::items::{
    MovementRecord, NewItem, OrderLine, StockItem, StockLevel, StockMove, ThresholdItem,
};
use crate::reconciliation::{ReconciliationReport, Reconciler};

/// What a delete actually removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeleteOutcome {
    pub stock_removed: bool,
    pub thresholds_removed: usize,
}

impl DeleteOutcome {
    pub fn changed(&self) -> bool {
        self.stock_removed || self.thresholds_removed > 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    stock: Vec<StockItem>,
    thresholds: Vec<ThresholdItem>,
}

impl Inventory {
    pub fn new(stock: Vec<StockItem>, thresholds: Vec<ThresholdItem>) -> Self {
        Inventory { stock, thresholds }
    }

    pub fn stock(&self) -> &[StockItem] {
        &self.stock
    }

    pub fn thresholds(&self) -> &[ThresholdItem] {
        &self.thresholds
    }

    pub fn item(&self, name: &str) -> Option<&StockItem> {
        self.stock.iter().find(|item| item.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.item(name).is_some()
    }

    // ========================================================================
    // DERIVED VIEWS
    // ========================================================================

    pub fn order_list(&self) -> Vec<OrderLine> {
        Reconciler::new(&self.thresholds).order_list(&self.stock)
    }

    pub fn stock_levels(&self) -> Vec<StockLevel> {
        Reconciler::new(&self.thresholds).stock_levels(&self.stock)
    }

    pub fn reconcile(&self) -> ReconciliationReport {
        Reconciler::new(&self.thresholds).reconcile(&self.stock)
    }

    // ========================================================================
    // ITEM LIFECYCLE
    // ========================================================================

    /// Append a new item to both stores.
    pub fn add_item(&mut self, new_item: NewItem) -> Result<(), ValidationError> {
        let name = new_item.name.trim();

        if !name.is_empty() && self.contains(name) {
            return Err(ValidationError::DuplicateItem(name.to_string()));
        }
        if name.is_empty() {
            return Err(ValidationError::BlankName);
        }
        if new_item.quantity <= 0 {
            return Err(ValidationError::NonPositiveQuantity(new_item.quantity));
        }
        if new_item.threshold <= 0 {
            return Err(ValidationError::NonPositiveThreshold(new_item.threshold));
        }

        self.stock
            .push(StockItem::new(name, new_item.item_type, new_item.quantity));
        self.thresholds
            .push(ThresholdItem::new(name, new_item.item_type, new_item.threshold));

        tracing::info!(item = name, quantity = new_item.quantity, threshold = new_item.threshold, "item added");
        Ok(())
    }

    /// Remove an item from stock and, independently, from the thresholds.
    pub fn delete_item(&mut self, name: &str) -> DeleteOutcome {
        let stock_before = self.stock.len();
        self.stock.retain(|item| item.name != name);

        let thresholds_before = self.thresholds.len();
        self.thresholds.retain(|threshold| threshold.name != name);

        let outcome = DeleteOutcome {
            stock_removed: self.stock.len() < stock_before,
            thresholds_removed: thresholds_before - self.thresholds.len(),
        };

        if outcome.changed() {
            tracing::info!(item = name, ?outcome, "item deleted");
        }
        outcome
    }

    /// Overwrite one item's quantity. Returns false when the item is unknown.
    pub fn update_quantity(&mut self, name: &str, quantity: i64) -> Result<bool, ValidationError> {
        if quantity <= 0 {
            return Err(ValidationError::NonPositiveQuantity(quantity));
        }

        match self.stock.iter_mut().find(|item| item.name == name) {
            Some(item) => {
                tracing::info!(item = name, from = item.quantity, to = quantity, "quantity updated");
                item.quantity = quantity;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // ========================================================================
    // MOVEMENTS
    // ========================================================================

    /// Take moved units out of stock and return one history row per item.
    ///
    /// Closing stock is not floored at zero. Moves for unknown items are
    /// skipped and produce no record.
    pub fn apply_movements(
        &mut self,
        moves: &[StockMove],
        date: NaiveDate,
    ) -> Result<Vec<MovementRecord>, ValidationError> {
        if let Some(bad) = moves.iter().find(|m| m.moved < 0) {
            return Err(ValidationError::NegativeMovement {
                item: bad.item.clone(),
                moved: bad.moved,
            });
        }

        // Applied to a copy so an out-of-range move rejects the whole batch
        let mut stock = self.stock.clone();
        let mut records = Vec::with_capacity(moves.len());
        for stock_move in moves {
            let Some(item) = stock.iter_mut().find(|item| item.name == stock_move.item) else {
                continue;
            };

            let record = MovementRecord::new(&item.name, item.quantity, stock_move.moved, date)?;
            if record.closing_stock < 0 {
                tracing::warn!(
                    item = %record.item,
                    opening = record.opening_stock,
                    moved = record.moved,
                    closing = record.closing_stock,
                    "movement exceeds stock on hand, closing stock is negative"
                );
            }
            item.quantity = record.closing_stock;
            records.push(record);
        }

        self.stock = stock;
        Ok(records)
    }
}
