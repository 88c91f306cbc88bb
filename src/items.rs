// 📦 Item Model - Stock rows, threshold rows, movement history, order lines
//
// Row structs map one-to-one onto the CSV columns of the data files, so the
// serde renames below ARE the file format.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

// ============================================================================
// ITEM TYPE
// ============================================================================

/// Packaging category of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ItemType {
    Box,
    Pack,
    Tub,
    Loaf,
    Individual,
    Roll,
}

impl ItemType {
    pub const ALL: [ItemType; 6] = [
        ItemType::Box,
        ItemType::Pack,
        ItemType::Tub,
        ItemType::Loaf,
        ItemType::Individual,
        ItemType::Roll,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Box => "box",
            ItemType::Pack => "pack",
            ItemType::Tub => "tub",
            ItemType::Loaf => "loaf",
            ItemType::Individual => "individual",
            ItemType::Roll => "roll",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ItemType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ItemType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ValidationError::UnknownItemType(wanted.to_string()))
    }
}

impl TryFrom<String> for ItemType {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ItemType> for String {
    fn from(value: ItemType) -> Self {
        value.as_str().to_string()
    }
}

// ============================================================================
// STORE ROWS
// ============================================================================

/// One row of the stock file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockItem {
    #[serde(rename = "ITEM")]
    pub name: String,

    #[serde(rename = "TYPE")]
    pub item_type: ItemType,

    /// Can go negative after an over-movement.
    #[serde(rename = "QUANTITY")]
    pub quantity: i64,
}

impl StockItem {
    pub fn new(name: impl Into<String>, item_type: ItemType, quantity: i64) -> Self {
        Self {
            name: name.into(),
            item_type,
            quantity,
        }
    }
}

/// One row of the threshold file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdItem {
    #[serde(rename = "ITEM")]
    pub name: String,

    #[serde(rename = "TYPE")]
    pub item_type: ItemType,

    #[serde(rename = "THRESHOLD")]
    pub threshold: i64,
}

impl ThresholdItem {
    pub fn new(name: impl Into<String>, item_type: ItemType, threshold: i64) -> Self {
        Self {
            name: name.into(),
            item_type,
            threshold,
        }
    }
}

/// One row of the movement history log. Written once, never changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementRecord {
    #[serde(rename = "ITEM")]
    pub item: String,

    #[serde(rename = "OPENING_STOCK")]
    pub opening_stock: i64,

    #[serde(rename = "STOCK_MOVED")]
    pub moved: i64,

    #[serde(rename = "CLOSING_STOCK")]
    pub closing_stock: i64,

    #[serde(rename = "DATE")]
    pub date: NaiveDate,
}

impl MovementRecord {
    /// Closing stock is `opening_stock - moved`, rejected when it leaves the i64 range.
    pub fn new(
        item: impl Into<String>,
        opening_stock: i64,
        moved: i64,
        date: NaiveDate,
    ) -> Result<Self, ValidationError> {
        let item = item.into();
        let Some(closing_stock) = opening_stock.checked_sub(moved) else {
            return Err(ValidationError::MovementOutOfRange {
                item,
                opening: opening_stock,
                moved,
            });
        };
        Ok(Self {
            item,
            opening_stock,
            moved,
            closing_stock,
            date,
        })
    }
}

// ============================================================================
// DERIVED VALUES (never persisted)
// ============================================================================

/// An item to reorder and how many units bring it back to its threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    pub item: String,
    pub item_type: ItemType,
    pub order_quantity: i64,
}

/// Stock row joined with its threshold, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockLevel {
    pub item: String,
    pub item_type: ItemType,
    pub quantity: i64,
    pub threshold: Option<i64>,
    pub below_threshold: bool,
}

/// Input of the add-item flow.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub item_type: ItemType,
    pub quantity: i64,
    pub threshold: i64,
}

/// Units of one item taken out of stock.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StockMove {
    pub item: String,
    pub moved: i64,
}

impl StockMove {
    pub fn new(item: impl Into<String>, moved: i64) -> Self {
        Self {
            item: item.into(),
            moved,
        }
    }
}
