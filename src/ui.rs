use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use std::path::PathBuf;

use stock_count::pages::parse_number;
use stock_count::{
    export, Inventory, ItemType, NewItem, StockError, StockMove, Store, ValidationError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    CurrentStock,
    UpdateQuantity,
    StockMovement,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::CurrentStock => Page::UpdateQuantity,
            Page::UpdateQuantity => Page::StockMovement,
            Page::StockMovement => Page::CurrentStock,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::CurrentStock => Page::StockMovement,
            Page::UpdateQuantity => Page::CurrentStock,
            Page::StockMovement => Page::UpdateQuantity,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::CurrentStock => "Current Stock",
            Page::UpdateQuantity => "Add New Stock",
            Page::StockMovement => "Stock Movement",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Info(String),
    Success(String),
    Error(String),
}

/// Add-item form on the Current Stock page.
#[derive(Debug, Clone, Default)]
pub struct AddForm {
    pub name: String,
    pub type_index: usize,
    pub quantity: String,
    pub threshold: String,
    /// 0 name, 1 type, 2 quantity, 3 threshold
    pub focus: usize,
}

impl AddForm {
    fn item_type(&self) -> ItemType {
        ItemType::ALL[self.type_index % ItemType::ALL.len()]
    }

    fn to_new_item(&self) -> Result<NewItem, ValidationError> {
        Ok(NewItem {
            name: self.name.clone(),
            item_type: self.item_type(),
            quantity: parse_number("quantity", &self.quantity)?,
            threshold: parse_number("threshold", &self.threshold)?,
        })
    }
}

pub struct App {
    pub store: Store,
    pub inventory: Inventory,
    pub current_page: Page,
    pub state: TableState,
    pub add_form: Option<AddForm>,
    pub quantity_input: String,
    pub moved_inputs: Vec<String>,
    pub status: Status,
    pub export_path: PathBuf,
}

impl App {
    pub fn new(store: Store) -> Result<Self, StockError> {
        let inventory = store.load()?;
        let mut app = Self {
            store,
            inventory,
            current_page: Page::CurrentStock,
            state: TableState::default(),
            add_form: None,
            quantity_input: String::new(),
            moved_inputs: Vec::new(),
            status: Status::Info("Tab switches page, q quits".to_string()),
            export_path: PathBuf::from(export::FILE_NAME),
        };
        app.reset_inputs();
        Ok(app)
    }

    fn reset_inputs(&mut self) {
        self.moved_inputs = vec![String::new(); self.inventory.stock().len()];
        self.quantity_input.clear();
        let len = self.inventory.stock().len();
        match self.state.selected() {
            _ if len == 0 => self.state.select(None),
            Some(i) if i >= len => self.state.select(Some(len - 1)),
            None => self.state.select(Some(0)),
            Some(_) => {}
        }
    }

    /// Re-read both stores after an interaction.
    fn reload(&mut self) {
        match self.store.load() {
            Ok(inventory) => self.inventory = inventory,
            Err(e) => self.status = Status::Error(e.to_string()),
        }
        self.reset_inputs();
    }

    fn report(&mut self, result: Result<String, StockError>) {
        self.status = match result {
            Ok(msg) => Status::Success(msg),
            Err(e) => {
                if !e.is_validation() {
                    tracing::error!(error = %e, "interaction failed");
                }
                Status::Error(e.to_string())
            }
        };
        self.reload();
    }

    pub fn selected_name(&self) -> Option<String> {
        self.state
            .selected()
            .and_then(|i| self.inventory.stock().get(i))
            .map(|item| item.name.clone())
    }

    pub fn next(&mut self) {
        let len = self.inventory.stock().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.inventory.stock().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    // ========================================================================
    // ACTIONS
    // ========================================================================

    pub fn submit_add(&mut self, form: &AddForm) {
        let name = form.name.trim().to_string();
        let result = form
            .to_new_item()
            .map_err(StockError::from)
            .and_then(|new_item| self.store.add_item(new_item))
            .map(|_| format!("Successfully added {name} to the stock and updated its threshold!"));
        self.report(result);
    }

    pub fn delete_selected(&mut self) {
        let Some(name) = self.selected_name() else {
            return;
        };
        let result = self
            .store
            .delete_item(&name)
            .map(|_| format!("Successfully deleted {name} from the stock."));
        self.report(result);
    }

    pub fn submit_quantity(&mut self) {
        let Some(name) = self.selected_name() else {
            return;
        };
        let result = parse_number("quantity", &self.quantity_input)
            .map_err(StockError::from)
            .and_then(|quantity| {
                self.store.update_quantity(&name, quantity).map(|updated| {
                    if updated {
                        format!("Successfully updated the quantity of {name} to {quantity}!")
                    } else {
                        format!("{name} is no longer in the stock")
                    }
                })
            });
        self.report(result);
    }

    pub fn submit_movements(&mut self) {
        let moves: Result<Vec<StockMove>, ValidationError> = self
            .inventory
            .stock()
            .iter()
            .zip(&self.moved_inputs)
            .map(|(item, input)| -> Result<StockMove, ValidationError> {
                let moved = parse_number(&format!("moved quantity for {}", item.name), input)?;
                Ok(StockMove::new(&item.name, moved))
            })
            .collect();
        let result = moves
            .map_err(StockError::from)
            .and_then(|moves| self.store.record_movements(&moves))
            .map(|records| format!("Stock movement recorded for {} items", records.len()));
        self.report(result);
    }

    pub fn export_orders(&mut self) {
        let lines = self.inventory.order_list();
        let result = export::render_order_list(&lines).and_then(|bytes| {
            std::fs::write(&self.export_path, bytes)
                .map_err(|e| StockError::io(&self.export_path, e))
        });
        self.status = match result {
            Ok(()) => Status::Success(format!(
                "Order list ({} items) written to {}",
                lines.len(),
                self.export_path.display()
            )),
            Err(e) => Status::Error(e.to_string()),
        };
    }

    // ========================================================================
    // KEY HANDLING
    // ========================================================================

    /// Returns true when the app should quit.
    pub fn on_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        if let Some(mut form) = self.add_form.take() {
            self.on_form_key(&mut form, code);
            return false;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Tab => self.current_page = self.current_page.next(),
            KeyCode::BackTab => self.current_page = self.current_page.previous(),
            KeyCode::Down => self.next(),
            KeyCode::Up => self.previous(),
            _ => match self.current_page {
                Page::CurrentStock => self.on_stock_key(code),
                Page::UpdateQuantity => self.on_update_key(code),
                Page::StockMovement => self.on_movement_key(code, modifiers),
            },
        }
        false
    }

    fn on_form_key(&mut self, form: &mut AddForm, code: KeyCode) {
        match code {
            KeyCode::Esc => {
                self.status = Status::Info("Add cancelled".to_string());
                return;
            }
            KeyCode::Enter if form.focus >= 3 => {
                self.submit_add(form);
                return;
            }
            KeyCode::Enter | KeyCode::Tab => form.focus = (form.focus + 1).min(3),
            KeyCode::BackTab => form.focus = form.focus.saturating_sub(1),
            KeyCode::Left if form.focus == 1 => {
                form.type_index = (form.type_index + ItemType::ALL.len() - 1) % ItemType::ALL.len()
            }
            KeyCode::Right if form.focus == 1 => {
                form.type_index = (form.type_index + 1) % ItemType::ALL.len()
            }
            KeyCode::Backspace => {
                match form.focus {
                    0 => form.name.pop(),
                    2 => form.quantity.pop(),
                    3 => form.threshold.pop(),
                    _ => None,
                };
            }
            KeyCode::Char(c) => match form.focus {
                0 => form.name.push(c),
                2 if c.is_ascii_digit() => form.quantity.push(c),
                3 if c.is_ascii_digit() => form.threshold.push(c),
                _ => {}
            },
            _ => {}
        }
        self.add_form = Some(form.clone());
    }

    fn on_stock_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('a') => self.add_form = Some(AddForm::default()),
            KeyCode::Char('d') => self.delete_selected(),
            KeyCode::Char('e') => self.export_orders(),
            KeyCode::Char('r') => self.reload(),
            _ => {}
        }
    }

    fn on_update_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char(c) if c.is_ascii_digit() => self.quantity_input.push(c),
            KeyCode::Backspace => {
                self.quantity_input.pop();
            }
            KeyCode::Enter => self.submit_quantity(),
            _ => {}
        }
    }

    fn on_movement_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        let selected = self.state.selected();
        match code {
            KeyCode::Char(c) if c.is_ascii_digit() => {
                if let Some(input) = selected.and_then(|i| self.moved_inputs.get_mut(i)) {
                    input.push(c);
                }
            }
            KeyCode::Backspace => {
                if let Some(input) = selected.and_then(|i| self.moved_inputs.get_mut(i)) {
                    input.pop();
                }
            }
            KeyCode::Enter if modifiers.contains(KeyModifiers::SHIFT) => self.next(),
            KeyCode::Enter => self.submit_movements(),
            _ => {}
        }
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if app.on_key(key.code, key.modifiers) {
                return Ok(());
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::CurrentStock => {
            let content = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
                .split(chunks[1]);
            render_stock_table(f, content[0], app);
            if let Some(form) = &app.add_form {
                render_add_form(f, content[1], form);
            } else {
                render_order_list(f, content[1], app);
            }
        }
        Page::UpdateQuantity => render_update(f, chunks[1], app),
        Page::StockMovement => render_movement(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let pages = [Page::CurrentStock, Page::UpdateQuantity, Page::StockMovement];

    let mut tab_spans = vec![Span::styled(
        format!("{}  ", stock_count::pages::COMPANY_NAME),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )];
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    let below = app.inventory.order_list().len();
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Items: {}", app.inventory.stock().len()),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  "));
    tab_spans.push(Span::styled(
        format!("Below threshold: {}", below),
        Style::default().fg(if below > 0 { Color::Red } else { Color::Green }),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn header_row(titles: &[&'static str]) -> Row<'static> {
    let cells = titles.iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });
    Row::new(cells).style(Style::default().bg(Color::DarkGray)).height(1)
}

fn titled(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(title)
}

fn render_stock_table(f: &mut Frame, area: Rect, app: &mut App) {
    let rows = app.inventory.stock_levels().into_iter().map(|level| {
        let style = if level.below_threshold {
            Style::default().fg(Color::White).bg(Color::Red)
        } else {
            Style::default()
        };
        Row::new(vec![
            Cell::from(level.item),
            Cell::from(level.item_type.to_string()),
            Cell::from(level.quantity.to_string()),
            Cell::from(level.threshold.map(|t| t.to_string()).unwrap_or_else(|| "-".to_string())),
        ])
        .style(style)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(28),
            Constraint::Length(12),
            Constraint::Length(10),
            Constraint::Length(10),
        ],
    )
    .header(header_row(&["ITEM", "TYPE", "QUANTITY", "THRESHOLD"]))
    .block(titled(" Current Stock Count "))
    .highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_order_list(f: &mut Frame, area: Rect, app: &App) {
    let rows = app.inventory.order_list().into_iter().map(|line| {
        Row::new(vec![
            Cell::from(line.item),
            Cell::from(line.item_type.to_string()),
            Cell::from(line.order_quantity.to_string()).style(Style::default().fg(Color::Red)),
        ])
    });

    let table = Table::new(
        rows,
        [Constraint::Length(24), Constraint::Length(12), Constraint::Length(16)],
    )
    .header(header_row(&["Item", "Type", "Order Quantity"]))
    .block(titled(" Order List (Items Below Threshold) "));

    f.render_widget(table, area);
}

fn render_add_form(f: &mut Frame, area: Rect, form: &AddForm) {
    let field = |index: usize, label: &'static str, value: String| {
        let style = if form.focus == index {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Cyan)
        };
        Line::from(vec![Span::styled(format!("  {label}: "), style), Span::raw(value)])
    };

    let content = vec![
        Line::from(""),
        field(0, "Item Name", form.name.clone()),
        Line::from(""),
        field(1, "Item Type", format!("◀ {} ▶", form.item_type())),
        Line::from(""),
        field(2, "Quantity", form.quantity.clone()),
        Line::from(""),
        field(3, "Threshold", form.threshold.clone()),
        Line::from(""),
        Line::from(Span::styled(
            "  Enter next/submit, Esc cancel",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )),
    ];

    let panel = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Add New Stock "),
    );
    f.render_widget(panel, area);
}

fn render_update(f: &mut Frame, area: Rect, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let item = app.selected_name().unwrap_or_else(|| "-".to_string());
    let prompt = Paragraph::new(Line::from(vec![
        Span::styled("  Item: ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::raw(item),
        Span::styled("   New Quantity: ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::styled(app.quantity_input.clone(), Style::default().fg(Color::Yellow)),
    ]))
    .block(titled(" Update Quantity (Enter to save) "));
    f.render_widget(prompt, chunks[0]);

    let rows = app.inventory.stock().iter().map(|item| {
        Row::new(vec![
            Cell::from(item.name.clone()),
            Cell::from(item.item_type.to_string()),
            Cell::from(item.quantity.to_string()),
        ])
    });
    let table = Table::new(
        rows,
        [Constraint::Length(28), Constraint::Length(12), Constraint::Length(10)],
    )
    .header(header_row(&["ITEM", "TYPE", "QUANTITY"]))
    .block(titled(" Updated Stock Table "))
    .highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, chunks[1], &mut app.state);
}

fn render_movement(f: &mut Frame, area: Rect, app: &mut App) {
    let rows = app
        .inventory
        .stock()
        .iter()
        .zip(&app.moved_inputs)
        .map(|(item, input)| {
            let closing = parse_number("moved", input)
                .ok()
                .and_then(|moved| item.quantity.checked_sub(moved));
            Row::new(vec![
                Cell::from(item.name.clone()),
                Cell::from(item.quantity.to_string()),
                Cell::from(if input.is_empty() { "0".to_string() } else { input.clone() })
                    .style(Style::default().fg(Color::Yellow)),
                match closing {
                    Some(closing) => Cell::from(closing.to_string()).style(
                        Style::default().fg(if closing < 0 { Color::Red } else { Color::Green }),
                    ),
                    None => Cell::from("out of range").style(Style::default().fg(Color::Red)),
                },
            ])
        });

    let table = Table::new(
        rows,
        [
            Constraint::Length(28),
            Constraint::Length(15),
            Constraint::Length(13),
            Constraint::Length(15),
        ],
    )
    .header(header_row(&["ITEM", "OPENING_STOCK", "STOCK_MOVED", "CLOSING_STOCK"]))
    .block(titled(" Enter the quantities of stock that have moved today (Enter to record) "))
    .highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let (text, color) = match &app.status {
        Status::Info(msg) => (msg.as_str(), Color::Cyan),
        Status::Success(msg) => (msg.as_str(), Color::Green),
        Status::Error(msg) => (msg.as_str(), Color::Red),
    };

    let mut status_spans = vec![Span::styled(format!(" {} ", text), Style::default().fg(color))];

    let hints: &[(&str, &str)] = match app.current_page {
        Page::CurrentStock => &[("a", " Add"), ("d", " Delete"), ("e", " Export PDF")],
        Page::UpdateQuantity => &[("0-9", " Quantity"), ("Enter", " Save")],
        Page::StockMovement => &[("0-9", " Moved"), ("Enter", " Record")],
    };
    for (key, label) in hints.iter().chain(&[("Tab", " Page"), ("q", " Quit")]) {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(*key, Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(*label));
    }

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}
