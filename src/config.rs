// Configuration - where the data files live and where the server listens
//
// Paths resolve relative to the working directory unless overridden through
// the environment.

use std::env;
use std::path::{Path, PathBuf};

pub const DATA_DIR_VAR: &str = "STOCK_COUNT_DATA_DIR";
pub const HISTORY_VAR: &str = "STOCK_COUNT_HISTORY";
pub const ADDR_VAR: &str = "STOCK_COUNT_ADDR";

pub const STOCK_FILE_NAME: &str = "QUANTITY.csv";
pub const THRESHOLD_FILE_NAME: &str = "ITEMS_THRESHOLD.csv";
pub const HISTORY_FILE_NAME: &str = "stock_movement_history.csv";
pub const DEFAULT_ADDR: &str = "0.0.0.0:3000";

/// Locations of the three flat files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFiles {
    pub stock: PathBuf,
    pub thresholds: PathBuf,
    pub history: PathBuf,
}

impl DataFiles {
    /// Store files under `data_dir`, history log at `history`.
    pub fn new(data_dir: impl AsRef<Path>, history: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.as_ref();
        DataFiles {
            stock: data_dir.join(STOCK_FILE_NAME),
            thresholds: data_dir.join(THRESHOLD_FILE_NAME),
            history: history.into(),
        }
    }

    /// All three files inside one directory (handy for tests).
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(dir, dir.join(HISTORY_FILE_NAME))
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub files: DataFiles,
    pub bind_addr: String,
}

impl AppConfig {
    /// Defaults: `./data/QUANTITY.csv`, `./data/ITEMS_THRESHOLD.csv`,
    /// `./stock_movement_history.csv`, listening on `0.0.0.0:3000`.
    pub fn from_env() -> Self {
        let data_dir = env::var(DATA_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));
        let history = env::var(HISTORY_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(HISTORY_FILE_NAME));
        let bind_addr = env::var(ADDR_VAR).unwrap_or_else(|_| DEFAULT_ADDR.to_string());

        AppConfig {
            files: DataFiles::new(data_dir, history),
            bind_addr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_files_layout() {
        let files = DataFiles::new("data", HISTORY_FILE_NAME);
        assert_eq!(files.stock, PathBuf::from("data/QUANTITY.csv"));
        assert_eq!(files.thresholds, PathBuf::from("data/ITEMS_THRESHOLD.csv"));
        assert_eq!(files.history, PathBuf::from("stock_movement_history.csv"));
    }

    #[test]
    fn test_in_dir_keeps_everything_together() {
        let files = DataFiles::in_dir("/tmp/shop");
        assert_eq!(files.history, PathBuf::from("/tmp/shop/stock_movement_history.csv"));
    }
}
