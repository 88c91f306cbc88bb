// 🌐 Web Pages - Server-rendered HTML for the three views
//
// Pure string rendering plus form parsing, so the web server only wires
// requests to Store interactions and hands back whatever these return.

use serde::Deserialize;
use std::fmt::Write;

use crate::error::ValidationError;
use crate::items::{ItemType, MovementRecord, NewItem, OrderLine, StockItem, StockLevel, StockMove};

pub const COMPANY_NAME: &str = "West Cornwall Pasty";

/// Prefix of the per-item fields on the movement form.
pub const MOVED_FIELD_PREFIX: &str = "moved:";

// ============================================================================
// BANNERS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Banner {
    Success(String),
    Error(String),
}

impl Banner {
    pub fn success(msg: impl Into<String>) -> Self {
        Banner::Success(msg.into())
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Banner::Error(msg.into())
    }

    fn render(&self) -> String {
        match self {
            Banner::Success(msg) => format!(r#"<div class="banner success">{}</div>"#, escape(msg)),
            Banner::Error(msg) => format!(r#"<div class="banner error">{}</div>"#, escape(msg)),
        }
    }
}

// ============================================================================
// FORMS
// ============================================================================

/// Raw add-item form. Numbers arrive as text so blanks can be reported.
#[derive(Debug, Clone, Deserialize)]
pub struct AddItemForm {
    pub name: String,
    pub item_type: String,
    pub quantity: String,
    pub threshold: String,
}

impl AddItemForm {
    pub fn parse(&self) -> Result<NewItem, ValidationError> {
        Ok(NewItem {
            name: self.name.clone(),
            item_type: self.item_type.parse()?,
            quantity: parse_number("quantity", &self.quantity)?,
            threshold: parse_number("threshold", &self.threshold)?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteItemForm {
    pub item: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateQuantityForm {
    pub item: String,
    pub quantity: String,
}

impl UpdateQuantityForm {
    pub fn quantity(&self) -> Result<i64, ValidationError> {
        parse_number("quantity", &self.quantity)
    }
}

/// A blank field counts as zero.
pub fn parse_number(field: &str, value: &str) -> Result<i64, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(0);
    }
    value.parse().map_err(|_| ValidationError::InvalidNumber {
        field: field.to_string(),
        value: value.to_string(),
    })
}

/// Collect `moved:<item>` fields into stock moves, in form order.
pub fn parse_movement_form(fields: &[(String, String)]) -> Result<Vec<StockMove>, ValidationError> {
    fields
        .iter()
        .filter_map(|(key, value)| {
            key.strip_prefix(MOVED_FIELD_PREFIX)
                .map(|item| (item, value))
        })
        .map(|(item, value)| -> Result<StockMove, ValidationError> {
            let moved = parse_number(&format!("moved quantity for {item}"), value)?;
            Ok(StockMove::new(item, moved))
        })
        .collect()
}

// ============================================================================
// RENDERING HELPERS
// ============================================================================

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    CurrentStock,
    UpdateQuantity,
    StockMovement,
}

impl View {
    pub const ALL: [View; 3] = [View::CurrentStock, View::UpdateQuantity, View::StockMovement];

    pub fn title(&self) -> &'static str {
        match self {
            View::CurrentStock => "Current Stock",
            View::UpdateQuantity => "Add New Stock",
            View::StockMovement => "Stock Movement",
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            View::CurrentStock => "/",
            View::UpdateQuantity => "/update",
            View::StockMovement => "/movement",
        }
    }
}

fn layout(active: View, banner: Option<&Banner>, body: &str) -> String {
    let mut nav = String::new();
    for view in View::ALL {
        let class = if view == active { r#" class="active""# } else { "" };
        let _ = write!(nav, r#"<a href="{}"{}>{}</a>"#, view.path(), class, view.title());
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Stock Count App - {title}</title>
<link rel="stylesheet" href="/static/style.css">
</head>
<body>
<header><h1>{company}</h1></header>
<nav>{nav}</nav>
<main>
{banner}
{body}
</main>
</body>
</html>
"#,
        title = active.title(),
        company = COMPANY_NAME,
        nav = nav,
        banner = banner.map(Banner::render).unwrap_or_default(),
        body = body,
    )
}

fn type_options() -> String {
    ItemType::ALL
        .iter()
        .map(|t| format!(r#"<option value="{0}">{0}</option>"#, t.as_str()))
        .collect()
}

fn item_options(stock: &[StockItem]) -> String {
    stock
        .iter()
        .map(|item| format!(r#"<option value="{0}">{0}</option>"#, escape(&item.name)))
        .collect()
}

fn stock_table(stock: &[StockItem]) -> String {
    let mut html = String::from("<table><tr><th>ITEM</th><th>TYPE</th><th>QUANTITY</th></tr>");
    for item in stock {
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(&item.name),
            item.item_type,
            item.quantity
        );
    }
    html.push_str("</table>");
    html
}

// ============================================================================
// VIEWS
// ============================================================================

/// Stock table with below-threshold rows highlighted, add/delete forms and
/// the order list with its PDF download.
pub fn current_stock_page(
    levels: &[StockLevel],
    stock: &[StockItem],
    order_lines: &[OrderLine],
    banner: Option<&Banner>,
) -> String {
    let mut body = String::from(
        "<h2>Current Stock Count</h2><h3>Here is the current stock inventory:</h3>\
         <table><tr><th>ITEM</th><th>TYPE</th><th>QUANTITY</th></tr>",
    );
    for level in levels {
        let class = if level.below_threshold { r#" class="below""# } else { "" };
        let _ = write!(
            body,
            "<tr{}><td>{}</td><td>{}</td><td>{}</td></tr>",
            class,
            escape(&level.item),
            level.item_type,
            level.quantity
        );
    }
    body.push_str("</table>");

    let _ = write!(
        body,
        r#"<h3>Add or Delete Stock Items</h3>
<details><summary>Add New Stock</summary>
<form method="post" action="/items">
<label>Enter New Item Name <input name="name"></label>
<label>Select Item Type <select name="item_type">{types}</select></label>
<label>Enter Quantity <input name="quantity" type="number" min="0" step="1" value="0"></label>
<label>Enter Threshold Value <input name="threshold" type="number" min="0" step="1" value="0"></label>
<button type="submit">Add New Item</button>
</form></details>
<details><summary>Delete Stock Item</summary>
<form method="post" action="/items/delete">
<label>Select Item to Delete <select name="item">{items}</select></label>
<button type="submit">Delete Item</button>
</form></details>"#,
        types = type_options(),
        items = item_options(stock),
    );

    if !order_lines.is_empty() {
        body.push_str(
            "<h3>Order List (Items Below Threshold)</h3>\
             <table><tr><th>Item</th><th>Type</th><th>Order Quantity</th></tr>",
        );
        for line in order_lines {
            let _ = write!(
                body,
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape(&line.item),
                line.item_type,
                line.order_quantity
            );
        }
        body.push_str(r#"</table><a class="button" href="/orders.pdf">Download Order List as PDF</a>"#);
    }

    layout(View::CurrentStock, banner, &body)
}

pub fn update_quantity_page(stock: &[StockItem], banner: Option<&Banner>) -> String {
    let body = format!(
        r#"<h2>Add New Stock Item</h2><h3>Enter details of the new stock item below:</h3>
<form method="post" action="/update">
<label>Item Name <select name="item">{items}</select></label>
<label>New Quantity <input name="quantity" type="number" min="0" step="1" value="0"></label>
<button type="submit">Update Quantity</button>
</form>
<h3>Updated Stock Table</h3>
{table}"#,
        items = item_options(stock),
        table = stock_table(stock),
    );
    layout(View::UpdateQuantity, banner, &body)
}

/// One numeric field per stock item; after a submit, the recorded rows.
pub fn movement_page(
    stock: &[StockItem],
    recorded: Option<&[MovementRecord]>,
    banner: Option<&Banner>,
) -> String {
    let mut body = String::from(
        r#"<h2>Stock Movement</h2><h3>Enter the quantities of stock that have moved today:</h3>
<form method="post" action="/movement"><table>"#,
    );
    for item in stock {
        let name = escape(&item.name);
        let _ = write!(
            body,
            r#"<tr><td>{name}</td><td><input name="{prefix}{name}" type="number" min="0" step="1" value="0" aria-label="Moved Quantity for {name}"></td></tr>"#,
            name = name,
            prefix = MOVED_FIELD_PREFIX,
        );
    }
    body.push_str(r#"</table><button type="submit">Record Stock Movement</button></form>"#);

    if let Some(records) = recorded {
        body.push_str(
            "<h3>Stock Movement Summary</h3><table><tr><th>ITEM</th><th>OPENING_STOCK</th>\
             <th>STOCK_MOVED</th><th>CLOSING_STOCK</th><th>DATE</th></tr>",
        );
        for record in records {
            let _ = write!(
                body,
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape(&record.item),
                record.opening_stock,
                record.moved,
                record.closing_stock,
                record.date
            );
        }
        body.push_str("</table>");
    }

    layout(View::StockMovement, banner, &body)
}
