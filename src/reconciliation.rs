// ⚖️ Reconciliation - Join stock against thresholds
//
// Formula, per stock item with a threshold:
//   quantity < threshold  =>  order threshold - quantity
//
// Items without a threshold entry are not applicable and never appear in the
// order list. Duplicate threshold names resolve to the first entry.

use crate::items::{OrderLine, StockItem, StockLevel, ThresholdItem};
use serde::Serialize;
use std::collections::HashMap;

// ============================================================================
// RECONCILIATION REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationReport {
    pub order_lines: Vec<OrderLine>,
    pub items_checked: usize,
    pub items_without_threshold: usize,
    pub reconciled_at: chrono::DateTime<chrono::Utc>,
}

impl ReconciliationReport {
    pub fn needs_ordering(&self) -> bool {
        !self.order_lines.is_empty()
    }

    pub fn total_units(&self) -> i64 {
        self.order_lines
            .iter()
            .fold(0i64, |total, line| total.saturating_add(line.order_quantity))
    }

    pub fn summary(&self) -> String {
        format!(
            "Reconciled {} items: {} below threshold ({} units to order), {} without threshold",
            self.items_checked,
            self.order_lines.len(),
            self.total_units(),
            self.items_without_threshold
        )
    }
}

// ============================================================================
// RECONCILER
// ============================================================================

/// Joins stock rows with threshold rows by exact item name.
pub struct Reconciler<'a> {
    thresholds: HashMap<&'a str, &'a ThresholdItem>,
}

impl<'a> Reconciler<'a> {
    pub fn new(thresholds: &'a [ThresholdItem]) -> Self {
        let mut index = HashMap::with_capacity(thresholds.len());
        for threshold in thresholds {
            // First entry wins
            index.entry(threshold.name.as_str()).or_insert(threshold);
        }
        Reconciler { thresholds: index }
    }

    pub fn threshold_for(&self, name: &str) -> Option<&'a ThresholdItem> {
        self.thresholds.get(name).copied()
    }

    /// Order line for one stock item, if it is below its threshold.
    pub fn order_line(&self, item: &StockItem) -> Option<OrderLine> {
        let threshold = self.threshold_for(&item.name)?;
        if item.quantity < threshold.threshold {
            Some(OrderLine {
                item: item.name.clone(),
                item_type: threshold.item_type,
                // Saturates for very negative stock
                order_quantity: threshold.threshold.saturating_sub(item.quantity),
            })
        } else {
            None
        }
    }

    /// Order lines in stock order.
    pub fn order_list(&self, stock: &[StockItem]) -> Vec<OrderLine> {
        stock.iter().filter_map(|item| self.order_line(item)).collect()
    }

    pub fn stock_levels(&self, stock: &[StockItem]) -> Vec<StockLevel> {
        stock
            .iter()
            .map(|item| {
                let threshold = self.threshold_for(&item.name).map(|t| t.threshold);
                StockLevel {
                    item: item.name.clone(),
                    item_type: item.item_type,
                    quantity: item.quantity,
                    threshold,
                    below_threshold: threshold.is_some_and(|t| item.quantity < t),
                }
            })
            .collect()
    }

    pub fn reconcile(&self, stock: &[StockItem]) -> ReconciliationReport {
        let order_lines = self.order_list(stock);
        let items_without_threshold = stock
            .iter()
            .filter(|item| self.threshold_for(&item.name).is_none())
            .count();

        if items_without_threshold > 0 {
            tracing::debug!(items_without_threshold, "stock items without a threshold entry");
        }

        ReconciliationReport {
            order_lines,
            items_checked: stock.len(),
            items_without_threshold,
            reconciled_at: chrono::Utc::now(),
        }
    }
}

/// Order list for two in-memory collections.
pub fn order_list(stock: &[StockItem], thresholds: &[ThresholdItem]) -> Vec<OrderLine> {
    Reconciler::new(thresholds).order_list(stock)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::ItemType;
    use proptest::prelude::*;

    fn stock(name: &str, quantity: i64) -> StockItem {
        StockItem::new(name, ItemType::Box, quantity)
    }

    fn threshold(name: &str, item_type: ItemType, threshold: i64) -> ThresholdItem {
        ThresholdItem::new(name, item_type, threshold)
    }

    #[test]
    fn test_flour_below_threshold() {
        let lines = order_list(&[stock("Flour", 10)], &[threshold("Flour", ItemType::Box, 15)]);

        assert_eq!(
            lines,
            vec![OrderLine {
                item: "Flour".to_string(),
                item_type: ItemType::Box,
                order_quantity: 5,
            }]
        );
    }

    #[test]
    fn test_at_or_above_threshold_not_ordered() {
        let stock = vec![stock("Flour", 15), stock("Sugar", 20)];
        let thresholds = vec![
            threshold("Flour", ItemType::Box, 15),
            threshold("Sugar", ItemType::Pack, 10),
        ];

        assert!(order_list(&stock, &thresholds).is_empty());
    }

    #[test]
    fn test_item_without_threshold_excluded() {
        let stock = vec![stock("Flour", 0), stock("Butter", 1)];
        let thresholds = vec![threshold("Butter", ItemType::Tub, 4)];

        let lines = order_list(&stock, &thresholds);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].item, "Butter");
        assert_eq!(lines[0].order_quantity, 3);
    }

    #[test]
    fn test_first_duplicate_threshold_wins() {
        let thresholds = vec![
            threshold("Flour", ItemType::Box, 15),
            threshold("Flour", ItemType::Pack, 50),
        ];

        let lines = order_list(&[stock("Flour", 10)], &thresholds);
        assert_eq!(lines[0].order_quantity, 5);
        assert_eq!(lines[0].item_type, ItemType::Box);
    }

    #[test]
    fn test_order_follows_stock_order() {
        let stock = vec![stock("Rolls", 0), stock("Flour", 0), stock("Milk", 0)];
        let thresholds = vec![
            threshold("Milk", ItemType::Individual, 1),
            threshold("Flour", ItemType::Box, 1),
            threshold("Rolls", ItemType::Roll, 1),
        ];

        let names: Vec<_> = order_list(&stock, &thresholds)
            .into_iter()
            .map(|line| line.item)
            .collect();
        assert_eq!(names, vec!["Rolls", "Flour", "Milk"]);
    }

    #[test]
    fn test_negative_stock_orders_full_deficit() {
        let lines = order_list(&[stock("Flour", -3)], &[threshold("Flour", ItemType::Box, 10)]);
        assert_eq!(lines[0].order_quantity, 13);
    }

    #[test]
    fn test_extreme_negative_stock_saturates() {
        let stock = vec![stock("Flour", i64::MIN), stock("Sugar", -i64::MAX)];
        let thresholds = vec![
            threshold("Flour", ItemType::Box, 15),
            threshold("Sugar", ItemType::Pack, 1),
        ];

        let report = Reconciler::new(&thresholds).reconcile(&stock);
        assert_eq!(report.order_lines[0].order_quantity, i64::MAX);
        assert_eq!(report.order_lines[1].order_quantity, i64::MAX);
        assert_eq!(report.total_units(), i64::MAX);
    }

    #[test]
    fn test_stock_levels_flag_rows() {
        let stock = vec![stock("Flour", 10), stock("Sugar", 30), stock("Salt", 1)];
        let thresholds = vec![
            threshold("Flour", ItemType::Box, 15),
            threshold("Sugar", ItemType::Pack, 10),
        ];

        let levels = Reconciler::new(&thresholds).stock_levels(&stock);
        assert!(levels[0].below_threshold);
        assert!(!levels[1].below_threshold);
        assert!(!levels[2].below_threshold);
        assert_eq!(levels[2].threshold, None);
    }

    #[test]
    fn test_report_summary() {
        let stock = vec![stock("Flour", 10), stock("Salt", 1)];
        let thresholds = vec![threshold("Flour", ItemType::Box, 15)];

        let report = Reconciler::new(&thresholds).reconcile(&stock);
        assert!(report.needs_ordering());
        assert_eq!(report.items_checked, 2);
        assert_eq!(report.items_without_threshold, 1);
        assert_eq!(report.total_units(), 5);

        println!("✅ Test passed: {}", report.summary());
    }

    proptest! {
        #[test]
        fn prop_order_line_iff_below_threshold(
            rows in proptest::collection::vec((0i64..1_000, 0i64..1_000), 0..40)
        ) {
            let stock: Vec<_> = rows
                .iter()
                .enumerate()
                .map(|(i, (q, _))| StockItem::new(format!("item-{i}"), ItemType::Box, *q))
                .collect();
            let thresholds: Vec<_> = rows
                .iter()
                .enumerate()
                .map(|(i, (_, t))| ThresholdItem::new(format!("item-{i}"), ItemType::Pack, *t))
                .collect();

            let lines = order_list(&stock, &thresholds);
            let expected: Vec<_> = rows
                .iter()
                .enumerate()
                .filter(|(_, (q, t))| q < t)
                .map(|(i, (q, t))| (format!("item-{i}"), t - q))
                .collect();
            let actual: Vec<_> = lines
                .into_iter()
                .map(|line| (line.item, line.order_quantity))
                .collect();

            prop_assert_eq!(actual, expected);
        }
    }
}
