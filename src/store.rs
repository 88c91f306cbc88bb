// 💾 Flat-file Store - CSV persistence with explicit load/commit boundaries
//
// Every interaction runs: Store::load -> mutate Inventory -> commit.
// Store files are rewritten in full through a temporary sibling file and a
// rename; the history log is only ever appended to.

use chrono::{Local, NaiveDate};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::config::DataFiles;
use crate::error::{StockError, StockResult};
use crate::inventory::{DeleteOutcome, Inventory};
use crate::items::{MovementRecord, NewItem, StockItem, StockMove, ThresholdItem};

// ============================================================================
// ROW FORMATS
// ============================================================================

/// A struct stored as one CSV row with a fixed header.
pub trait CsvRow: Serialize + DeserializeOwned {
    const HEADERS: &'static [&'static str];
}

impl CsvRow for StockItem {
    const HEADERS: &'static [&'static str] = &["ITEM", "TYPE", "QUANTITY"];
}

impl CsvRow for ThresholdItem {
    const HEADERS: &'static [&'static str] = &["ITEM", "TYPE", "THRESHOLD"];
}

impl CsvRow for MovementRecord {
    const HEADERS: &'static [&'static str] =
        &["ITEM", "OPENING_STOCK", "STOCK_MOVED", "CLOSING_STOCK", "DATE"];
}

// ============================================================================
// LOW-LEVEL FILE ACCESS
// ============================================================================

/// Read every row of a CSV file. A missing file reads as empty.
pub fn load_csv<T: CsvRow>(path: &Path) -> StockResult<Vec<T>> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "data file not found, starting empty");
        return Ok(Vec::new());
    }

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| StockError::csv(path, e))?;

    rdr.deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|e| StockError::csv(path, e))
}

fn write_rows<T: CsvRow, W: Write>(writer: W, rows: &[T], path: &Path) -> StockResult<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(T::HEADERS)
        .map_err(|e| StockError::csv(path, e))?;
    for row in rows {
        wtr.serialize(row).map_err(|e| StockError::csv(path, e))?;
    }
    wtr.flush().map_err(|e| StockError::io(path, e))
}

/// Write rows into a temporary file next to `path`, not yet visible.
fn stage_csv<T: CsvRow>(path: &Path, rows: &[T]) -> StockResult<NamedTempFile> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| StockError::io(dir, e))?;

    let mut staged = NamedTempFile::new_in(dir).map_err(|e| StockError::io(dir, e))?;
    write_rows(&mut staged, rows, path)?;
    staged
        .as_file()
        .sync_all()
        .map_err(|e| StockError::io(staged.path(), e))?;
    Ok(staged)
}

fn publish(staged: NamedTempFile, path: &Path) -> StockResult<()> {
    staged
        .persist(path)
        .map(|_| ())
        .map_err(|e| StockError::io(path, e.error))
}

/// Replace the whole file with `rows`.
pub fn save_csv<T: CsvRow>(path: &Path, rows: &[T]) -> StockResult<()> {
    let staged = stage_csv(path, rows)?;
    publish(staged, path)
}

/// Append rows, writing the header first when the file is new or empty.
pub fn append_csv<T: CsvRow>(path: &Path, rows: &[T]) -> StockResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| StockError::io(parent, e))?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| StockError::io(path, e))?;
    let is_new = file.metadata().map_err(|e| StockError::io(path, e))?.len() == 0;

    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    if is_new {
        wtr.write_record(T::HEADERS)
            .map_err(|e| StockError::csv(path, e))?;
    }
    for row in rows {
        wtr.serialize(row).map_err(|e| StockError::csv(path, e))?;
    }
    wtr.flush().map_err(|e| StockError::io(path, e))
}

// ============================================================================
// STORE
// ============================================================================

/// Handle on the three data files. Holds no state between interactions.
#[derive(Debug, Clone)]
pub struct Store {
    files: DataFiles,
}

impl Store {
    pub fn new(files: DataFiles) -> Self {
        Store { files }
    }

    pub fn files(&self) -> &DataFiles {
        &self.files
    }

    /// Start of an interaction: read both stores fresh from disk.
    pub fn load(&self) -> StockResult<Inventory> {
        let stock = load_csv::<StockItem>(&self.files.stock)?;
        let thresholds = load_csv::<ThresholdItem>(&self.files.thresholds)?;
        tracing::debug!(stock = stock.len(), thresholds = thresholds.len(), "inventory loaded");
        Ok(Inventory::new(stock, thresholds))
    }

    /// Persist both stores. Both files are staged before either is replaced.
    pub fn commit(&self, inventory: &Inventory) -> StockResult<()> {
        let stock = stage_csv(&self.files.stock, inventory.stock())?;
        let thresholds = stage_csv(&self.files.thresholds, inventory.thresholds())?;

        publish(stock, &self.files.stock)?;
        publish(thresholds, &self.files.thresholds)?;
        tracing::debug!("stock and threshold files committed");
        Ok(())
    }

    /// Persist the stock file only.
    pub fn commit_stock(&self, inventory: &Inventory) -> StockResult<()> {
        save_csv(&self.files.stock, inventory.stock())
    }

    pub fn append_history(&self, records: &[MovementRecord]) -> StockResult<()> {
        if records.is_empty() {
            return Ok(());
        }
        append_csv(&self.files.history, records)?;
        tracing::info!(rows = records.len(), path = %self.files.history.display(), "movement history appended");
        Ok(())
    }

    pub fn history(&self) -> StockResult<Vec<MovementRecord>> {
        load_csv(&self.files.history)
    }

    // ========================================================================
    // INTERACTIONS (load -> mutate -> commit)
    // ========================================================================

    pub fn add_item(&self, new_item: NewItem) -> StockResult<Inventory> {
        let mut inventory = self.load()?;
        inventory.add_item(new_item)?;
        self.commit(&inventory)?;
        Ok(inventory)
    }

    pub fn delete_item(&self, name: &str) -> StockResult<DeleteOutcome> {
        let mut inventory = self.load()?;
        let outcome = inventory.delete_item(name);
        if outcome.changed() {
            self.commit(&inventory)?;
        }
        Ok(outcome)
    }

    pub fn update_quantity(&self, name: &str, quantity: i64) -> StockResult<bool> {
        let mut inventory = self.load()?;
        let updated = inventory.update_quantity(name, quantity)?;
        if updated {
            self.commit_stock(&inventory)?;
        }
        Ok(updated)
    }

    /// Apply movements dated today, rewrite the stock file, then append the
    /// history rows. The two writes are independent.
    pub fn record_movements(&self, moves: &[StockMove]) -> StockResult<Vec<MovementRecord>> {
        self.record_movements_on(moves, Local::now().date_naive())
    }

    pub fn record_movements_on(
        &self,
        moves: &[StockMove],
        date: NaiveDate,
    ) -> StockResult<Vec<MovementRecord>> {
        let mut inventory = self.load()?;
        let records = inventory.apply_movements(moves, date)?;
        self.commit_stock(&inventory)?;
        self.append_history(&records)?;
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::ItemType;

    fn seeded_store(dir: &Path) -> Store {
        let store = Store::new(DataFiles::in_dir(dir));
        let inventory = Inventory::new(
            vec![
                StockItem::new("Flour", ItemType::Box, 10),
                StockItem::new("Butter", ItemType::Tub, 2),
            ],
            vec![ThresholdItem::new("Flour", ItemType::Box, 15)],
        );
        store.commit(&inventory).unwrap();
        store
    }

    #[test]
    fn test_load_missing_files_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(DataFiles::in_dir(dir.path().join("nothing-here")));

        let inventory = store.load().unwrap();
        assert!(inventory.stock().is_empty());
        assert!(inventory.thresholds().is_empty());
        assert!(store.history().unwrap().is_empty());
    }

    #[test]
    fn test_commit_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(dir.path());

        let inventory = store.load().unwrap();
        assert_eq!(inventory.stock().len(), 2);
        assert_eq!(inventory.item("Butter").unwrap().item_type, ItemType::Tub);

        let raw = fs::read_to_string(&store.files().stock).unwrap();
        assert!(raw.starts_with("ITEM,TYPE,QUANTITY\n"));
        assert!(raw.contains("Flour,box,10"));
    }

    #[test]
    fn test_empty_collection_keeps_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("QUANTITY.csv");

        save_csv::<StockItem>(&path, &[]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "ITEM,TYPE,QUANTITY\n");
        assert!(load_csv::<StockItem>(&path).unwrap().is_empty());
    }

    #[test]
    fn test_reads_spreadsheet_style_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ITEMS_THRESHOLD.csv");
        fs::write(&path, "ITEM,TYPE,THRESHOLD\n Flour , Box ,15\n").unwrap();

        let rows = load_csv::<ThresholdItem>(&path).unwrap();
        assert_eq!(rows, vec![ThresholdItem::new("Flour", ItemType::Box, 15)]);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("QUANTITY.csv");
        fs::write(&path, "ITEM,TYPE,QUANTITY\nFlour,crate,ten\n").unwrap();

        let err = load_csv::<StockItem>(&path).unwrap_err();
        assert!(matches!(err, StockError::Csv { .. }));
    }

    #[test]
    fn test_history_header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stock_movement_history.csv");
        let date = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();

        append_csv(&path, &[MovementRecord::new("Flour", 10, 3, date).unwrap()]).unwrap();
        append_csv(&path, &[MovementRecord::new("Flour", 7, 9, date).unwrap()]).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert_eq!(
            raw,
            "ITEM,OPENING_STOCK,STOCK_MOVED,CLOSING_STOCK,DATE\n\
             Flour,10,3,7,2025-01-06\n\
             Flour,7,9,-2,2025-01-06\n"
        );
    }

    #[test]
    fn test_record_movements_persists_stock_and_log() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(dir.path());
        let date = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();

        let records = store
            .record_movements_on(&[StockMove::new("Flour", 3), StockMove::new("Butter", 5)], date)
            .unwrap();
        assert_eq!(records.len(), 2);

        let inventory = store.load().unwrap();
        assert_eq!(inventory.item("Flour").unwrap().quantity, 7);
        assert_eq!(inventory.item("Butter").unwrap().quantity, -3);

        let history = store.history().unwrap();
        assert_eq!(history, records);
    }

    #[test]
    fn test_rejected_add_does_not_touch_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(dir.path());
        let stock_before = fs::read_to_string(&store.files().stock).unwrap();
        let thresholds_before = fs::read_to_string(&store.files().thresholds).unwrap();

        let err = store
            .add_item(NewItem {
                name: "Flour".to_string(),
                item_type: ItemType::Box,
                quantity: 3,
                threshold: 3,
            })
            .unwrap_err();
        assert!(err.is_validation());

        assert_eq!(fs::read_to_string(&store.files().stock).unwrap(), stock_before);
        assert_eq!(fs::read_to_string(&store.files().thresholds).unwrap(), thresholds_before);
    }

    #[test]
    fn test_failed_staging_leaves_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(dir.path());
        let stock_before = fs::read_to_string(&store.files().stock).unwrap();

        // Threshold file's directory is a regular file, so staging fails
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        let broken = Store::new(DataFiles {
            stock: store.files().stock.clone(),
            thresholds: blocker.join("ITEMS_THRESHOLD.csv"),
            history: store.files().history.clone(),
        });

        let mut inventory = store.load().unwrap();
        inventory.delete_item("Flour");
        assert!(broken.commit(&inventory).is_err());

        assert_eq!(fs::read_to_string(&store.files().stock).unwrap(), stock_before);
    }
}
