// End-to-end interactions against real files in a temporary directory

use chrono::NaiveDate;
use std::fs;
use std::path::Path;

use stock_count::{
    export, DataFiles, Inventory, ItemType, MovementRecord, NewItem, OrderLine, StockError,
    StockItem, StockMove, Store, ThresholdItem, ValidationError,
};

fn store_with(dir: &Path, stock: Vec<StockItem>, thresholds: Vec<ThresholdItem>) -> Store {
    let store = Store::new(DataFiles::in_dir(dir));
    store.commit(&Inventory::new(stock, thresholds)).unwrap();
    store
}

fn flour_store(dir: &Path) -> Store {
    store_with(
        dir,
        vec![StockItem::new("Flour", ItemType::Box, 10)],
        vec![ThresholdItem::new("Flour", ItemType::Box, 15)],
    )
}

#[test]
fn flour_below_threshold_is_ordered() {
    let dir = tempfile::tempdir().unwrap();
    let store = flour_store(dir.path());

    let lines = store.load().unwrap().order_list();
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
fn movement_updates_stock_and_appends_history() {
    let dir = tempfile::tempdir().unwrap();
    let store = flour_store(dir.path());
    let today = NaiveDate::from_ymd_opt(2025, 2, 14).unwrap();

    store
        .record_movements_on(&[StockMove::new("Flour", 3)], today)
        .unwrap();

    assert_eq!(store.load().unwrap().item("Flour").unwrap().quantity, 7);
    assert_eq!(
        store.history().unwrap(),
        vec![MovementRecord {
            item: "Flour".to_string(),
            opening_stock: 10,
            moved: 3,
            closing_stock: 7,
            date: today,
        }]
    );

    // A second day's movement goes negative and is kept as computed
    store
        .record_movements_on(&[StockMove::new("Flour", 9)], today.succ_opt().unwrap())
        .unwrap();
    assert_eq!(store.load().unwrap().item("Flour").unwrap().quantity, -2);

    let raw = fs::read_to_string(&store.files().history).unwrap();
    assert_eq!(raw.matches("ITEM,OPENING_STOCK").count(), 1);
    assert!(raw.ends_with("Flour,7,9,-2,2025-02-15\n"));
}

#[test]
fn duplicate_add_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = flour_store(dir.path());
    let before = store.load().unwrap();

    let err = store
        .add_item(NewItem {
            name: "Flour".to_string(),
            item_type: ItemType::Pack,
            quantity: 20,
            threshold: 30,
        })
        .unwrap_err();

    assert!(matches!(
        err,
        StockError::Validation(ValidationError::DuplicateItem(ref name)) if name == "Flour"
    ));
    assert_eq!(store.load().unwrap(), before);
}

#[test]
fn add_then_delete_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = flour_store(dir.path());

    let inventory = store
        .add_item(NewItem {
            name: "Butter".to_string(),
            item_type: ItemType::Tub,
            quantity: 2,
            threshold: 6,
        })
        .unwrap();
    assert_eq!(inventory.order_list().len(), 2);

    let reloaded = store.load().unwrap();
    assert!(reloaded.contains("Butter"));
    assert_eq!(reloaded.thresholds().len(), 2);

    let outcome = store.delete_item("Butter").unwrap();
    assert!(outcome.stock_removed);
    assert_eq!(outcome.thresholds_removed, 1);
    assert!(!store.load().unwrap().contains("Butter"));
}

#[test]
fn delete_without_threshold_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_with(
        dir.path(),
        vec![StockItem::new("Salt", ItemType::Individual, 3)],
        vec![ThresholdItem::new("Flour", ItemType::Box, 15)],
    );

    let outcome = store.delete_item("Salt").unwrap();
    assert!(outcome.stock_removed);
    assert_eq!(outcome.thresholds_removed, 0);

    let inventory = store.load().unwrap();
    assert!(inventory.stock().is_empty());
    assert_eq!(inventory.thresholds().len(), 1);
}

#[test]
fn stock_only_item_never_ordered() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_with(
        dir.path(),
        vec![
            StockItem::new("Flour", ItemType::Box, 0),
            StockItem::new("Salt", ItemType::Individual, 0),
        ],
        vec![ThresholdItem::new("Flour", ItemType::Box, 1)],
    );

    let names: Vec<_> = store
        .load()
        .unwrap()
        .order_list()
        .into_iter()
        .map(|line| line.item)
        .collect();
    assert_eq!(names, vec!["Flour"]);
}

#[test]
fn export_rows_match_order_list() {
    let dir = tempfile::tempdir().unwrap();
    let store = flour_store(dir.path());
    let lines = store.load().unwrap().order_list();

    let layout = export::ExportLayout::new(&lines, export::PageGeometry::letter());
    let rows: Vec<_> = layout.rows().map(|row| row.cells.clone()).collect();
    assert_eq!(rows, vec![["Flour".to_string(), "box".to_string(), "5".to_string()]]);

    let bytes = export::render_order_list(&lines).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn out_of_range_movement_is_rejected_before_any_write() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_with(
        dir.path(),
        vec![StockItem::new("Flour", ItemType::Box, -2)],
        vec![ThresholdItem::new("Flour", ItemType::Box, 15)],
    );
    let today = NaiveDate::from_ymd_opt(2025, 2, 14).unwrap();

    let err = store
        .record_movements_on(&[StockMove::new("Flour", i64::MAX)], today)
        .unwrap_err();
    assert!(matches!(
        err,
        StockError::Validation(ValidationError::MovementOutOfRange { .. })
    ));

    assert_eq!(store.load().unwrap().item("Flour").unwrap().quantity, -2);
    assert!(store.history().unwrap().is_empty());
    assert_eq!(store.load().unwrap().order_list()[0].order_quantity, 17);
}

#[test]
fn huge_movement_still_loads_an_order_list() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_with(
        dir.path(),
        vec![StockItem::new("Flour", ItemType::Box, 0)],
        vec![ThresholdItem::new("Flour", ItemType::Box, 15)],
    );
    let today = NaiveDate::from_ymd_opt(2025, 2, 14).unwrap();

    store
        .record_movements_on(&[StockMove::new("Flour", i64::MAX)], today)
        .unwrap();

    let lines = store.load().unwrap().order_list();
    assert_eq!(lines[0].order_quantity, i64::MAX);
}
