// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use psr_app::{
    AppCommand, AppEvent, AppState, DashboardView, DetailPanel, InputMode, RuleRecord, RuleTable,
    TABLE_COLUMNS, Treemap, TreemapLeaf, ViewBody, ViewMode, project, table_cells,
};
use ratatui::Terminal;
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};
use std::io;
use std::ops::Range;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tracing::debug;

const PAGE_ROWS: isize = 10;
const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);
const TOOLTIP_HEIGHT: u16 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct ViewData {
    status_token: u64,
}

pub fn run_app(state: &mut AppState, table: &RuleTable) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let result = match Terminal::new(backend).context("create terminal") {
        Ok(mut terminal) => event_loop(&mut terminal, state, table),
        Err(error) => Err(error),
    };

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    state: &mut AppState,
    table: &RuleTable,
) -> Result<()> {
    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();
    debug!(rules = table.len(), view = state.view.as_str(), "terminal ui started");

    let loaded = format!(
        "{} rules across {} chapters",
        table.len(),
        table.chapter_count()
    );
    emit_status(state, table, &mut view_data, &internal_tx, loaded);

    loop {
        process_internal_events(state, table, &view_data, &internal_rx);

        terminal
            .draw(|frame| render(frame, state, table))
            .context("draw frame")?;

        if !event::poll(Duration::from_millis(120)).context("poll event")? {
            continue;
        }
        if let Event::Key(key) = event::read().context("read event")?
            && handle_key_event(state, table, &mut view_data, &internal_tx, key)
        {
            return Ok(());
        }
    }
}

fn process_internal_events(
    state: &mut AppState,
    table: &RuleTable,
    view_data: &ViewData,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(table, AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_AFTER);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

/// Dispatches `command` and arms the clear timer whenever the reducer
/// reports a new status line.
fn apply(
    state: &mut AppState,
    table: &RuleTable,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    command: AppCommand,
) -> Vec<AppEvent> {
    let events = state.dispatch(table, command);
    if events
        .iter()
        .any(|event| matches!(event, AppEvent::StatusUpdated(_)))
    {
        view_data.status_token = view_data.status_token.saturating_add(1);
        schedule_status_clear(internal_tx, view_data.status_token);
    }
    events
}

fn emit_status(
    state: &mut AppState,
    table: &RuleTable,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    apply(
        state,
        table,
        view_data,
        internal_tx,
        AppCommand::SetStatus(message.into()),
    );
}

/// Returns true when the app should quit.
fn handle_key_event(
    state: &mut AppState,
    table: &RuleTable,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    let control = key.modifiers.contains(KeyModifiers::CONTROL);
    if control && key.code == KeyCode::Char('q') {
        return true;
    }

    if state.help_visible {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
            apply(state, table, view_data, internal_tx, AppCommand::ToggleHelp);
        }
        return false;
    }

    if state.input == InputMode::Search {
        handle_search_key(state, table, view_data, internal_tx, key);
        return false;
    }

    let command = match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('/') => AppCommand::EnterSearch,
        KeyCode::Char('j') | KeyCode::Down => AppCommand::MoveCursor(1),
        KeyCode::Char('k') | KeyCode::Up => AppCommand::MoveCursor(-1),
        KeyCode::PageDown => AppCommand::MoveCursor(PAGE_ROWS),
        KeyCode::PageUp => AppCommand::MoveCursor(-PAGE_ROWS),
        KeyCode::Char('g') | KeyCode::Home => AppCommand::JumpFirst,
        KeyCode::Char('G') | KeyCode::End => AppCommand::JumpLast,
        KeyCode::Char('v') => AppCommand::ToggleView,
        KeyCode::Char('?') => AppCommand::ToggleHelp,
        KeyCode::Esc => AppCommand::CloseDetail,
        KeyCode::Enter if state.view == ViewMode::Table => AppCommand::SelectCursor,
        KeyCode::Enter => {
            emit_status(
                state,
                table,
                view_data,
                internal_tx,
                "details open from the table view; press v",
            );
            return false;
        }
        _ => return false,
    };
    apply(state, table, view_data, internal_tx, command);
    false
}

fn handle_search_key(
    state: &mut AppState,
    table: &RuleTable,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let control = key.modifiers.contains(KeyModifiers::CONTROL);
    let command = match key.code {
        KeyCode::Esc | KeyCode::Enter => AppCommand::ExitSearch,
        KeyCode::Backspace => AppCommand::PopQueryChar,
        KeyCode::Char('u') if control => AppCommand::ClearQuery,
        KeyCode::Char(_) if control => return,
        KeyCode::Char(ch) => AppCommand::PushQueryChar(ch),
        _ => return,
    };
    let leaving = command == AppCommand::ExitSearch;
    apply(state, table, view_data, internal_tx, command);
    if leaving && !state.query.trim().is_empty() {
        let matches = psr_app::filter(table, &state.query).len();
        emit_status(
            state,
            table,
            view_data,
            internal_tx,
            format!("{matches} subheadings match {:?}", state.query),
        );
    }
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, table: &RuleTable) {
    let view = project(table, state);
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(frame.area());

    let search_style = if state.input == InputMode::Search {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::White)
    };
    let search = Paragraph::new(search_bar_text(state, &view)).style(search_style).block(
        Block::default()
            .title("CKFTA product specific rules")
            .borders(Borders::ALL),
    );
    frame.render_widget(search, layout[0]);

    match &view.body {
        ViewBody::Table(rows) => render_table(frame, layout[1], rows, &view),
        ViewBody::Treemap(treemap) => render_treemap(frame, layout[1], treemap, &view),
    }

    let status = Paragraph::new(status_text(state))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(status, layout[2]);

    if let Some(detail) = &view.detail {
        let area = centered_rect(70, 60, frame.area());
        frame.render_widget(Clear, area);
        let modal = Paragraph::new(render_detail_text(detail))
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .title(detail.title.as_str())
                    .borders(Borders::ALL)
                    .style(Style::default().fg(Color::Cyan)),
            );
        frame.render_widget(modal, area);
    }

    if state.help_visible {
        let area = centered_rect(64, 50, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_table(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    rows: &[&RuleRecord],
    view: &DashboardView<'_>,
) {
    let header = Row::new(TABLE_COLUMNS.iter().map(|label| {
        Cell::from(*label).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));

    // Two border rows plus the header row.
    let visible = visible_window(rows.len(), view.cursor, area.height.saturating_sub(3));
    let body = rows[visible.clone()]
        .iter()
        .zip(visible)
        .map(|(record, index)| {
            let style = if index == view.cursor {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Row::new(table_cells(record).map(Cell::from)).style(style)
        });

    let widths = [
        Constraint::Length(8),
        Constraint::Length(11),
        Constraint::Percentage(55),
        Constraint::Min(12),
    ];
    let widget = Table::new(body, widths)
        .header(header)
        .column_spacing(1)
        .block(
            Block::default()
                .title(table_title(view))
                .borders(Borders::ALL),
        );
    frame.render_widget(widget, area);
}

fn render_treemap(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    treemap: &Treemap,
    view: &DashboardView<'_>,
) {
    let split = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(TOOLTIP_HEIGHT)])
        .split(area);

    let outer = Block::default().title(table_title(view)).borders(Borders::ALL);
    let canvas = outer.inner(split[0]);
    frame.render_widget(outer, split[0]);

    let layout = layout_treemap(treemap, canvas);
    for tile in &layout.branches {
        let Some(branch) = treemap.branches.get(tile.branch) else {
            continue;
        };
        if tile.area.width < 2 || tile.area.height < 2 {
            continue;
        }
        let block = Block::default()
            .title(format!("Ch {}", branch.chapter))
            .borders(Borders::ALL)
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(block, tile.area);
    }

    let leaves = treemap.leaves().collect::<Vec<&TreemapLeaf>>();
    for tile in &layout.leaves {
        let Some(leaf) = leaves.get(tile.leaf) else {
            continue;
        };
        if tile.area.width == 0 || tile.area.height == 0 {
            continue;
        }
        let style = if tile.leaf == view.cursor {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        frame.render_widget(
            Paragraph::new(leaf.subheading.as_str()).style(style),
            tile.area,
        );
    }

    let tooltip = leaves
        .get(view.cursor)
        .map(|leaf| tooltip_text(leaf))
        .unwrap_or_default();
    let tooltip = Paragraph::new(tooltip)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(tooltip, split[1]);
}

fn search_bar_text(state: &AppState, view: &DashboardView<'_>) -> String {
    let caret = if state.input == InputMode::Search {
        "_"
    } else {
        ""
    };
    let shown = if view.is_empty() && !state.query.trim().is_empty() {
        "no matching subheadings".to_owned()
    } else {
        format!("{} of {} rules", view.match_count, view.total_count)
    };
    format!(
        "/ subheading: {}{caret}   [{}] {shown}",
        state.query,
        state.view.as_str()
    )
}

fn table_title(view: &DashboardView<'_>) -> String {
    let label = match view.body {
        ViewBody::Table(_) => "rules",
        ViewBody::Treemap(_) => "chapters",
    };
    format!("{label} ({}/{})", view.match_count, view.total_count)
}

fn status_text(state: &AppState) -> String {
    if state.help_visible {
        return String::new();
    }
    let (mode, hints) = match (state.input, state.view) {
        (InputMode::Search, _) => ("SEARCH", "type to filter | enter/esc done | ctrl+u clear"),
        (InputMode::Nav, ViewMode::Table) => (
            "NAV",
            "j/k g/G | enter detail | esc close | / search | v treemap | ? help | q quit",
        ),
        (InputMode::Nav, ViewMode::Treemap) => (
            "NAV",
            "j/k g/G | / search | v table | ? help | q quit",
        ),
    };
    match &state.status_line {
        Some(status) => format!("{mode} | {status} | {hints}"),
        None => format!("{mode} | {hints}"),
    }
}

fn render_detail_text(detail: &DetailPanel) -> String {
    format!(
        "Product Description\n{}\n\nProduct Specific Rule\n{}\n\nesc close",
        detail.product_description, detail.product_specific_rule
    )
}

fn tooltip_text(leaf: &TreemapLeaf) -> String {
    format!(
        "{}\ndescription: {}\nrule: {}",
        leaf.subheading, leaf.tooltip.short_description, leaf.tooltip.short_rule
    )
}

fn help_overlay_text() -> &'static str {
    "global: ctrl+q quit | ? help\n\
nav: j/k or up/down move | pgup/pgdn page | g/G first/last | q quit\n\
nav: / search subheadings | v toggle treemap/table\n\
table: enter open detail | esc close detail\n\
search: type to filter | backspace delete | ctrl+u clear | enter/esc done"
}

/// Rows `[start, end)` to draw so `cursor` stays on screen.
fn visible_window(len: usize, cursor: usize, height: u16) -> Range<usize> {
    let height = usize::from(height).max(1);
    let start = cursor.saturating_sub(height - 1).min(len);
    start..(start + height).min(len)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BranchTile {
    branch: usize,
    area: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LeafTile {
    /// Position in `Treemap::leaves()`.
    leaf: usize,
    area: Rect,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct TreemapLayout {
    branches: Vec<BranchTile>,
    leaves: Vec<LeafTile>,
}

/// Slice-and-dice: chapters split the width by leaf count, then each
/// chapter's leaves fill its bordered interior as a column-major grid of
/// equal cells.
fn layout_treemap(treemap: &Treemap, area: Rect) -> TreemapLayout {
    let weights = treemap
        .branches
        .iter()
        .map(|branch| branch.leaves.len())
        .collect::<Vec<usize>>();

    let mut layout = TreemapLayout::default();
    let mut first_leaf = 0;
    for (branch, (x, width)) in split_proportional(area.x, area.width, &weights)
        .into_iter()
        .enumerate()
    {
        let branch_area = Rect::new(x, area.y, width, area.height);
        layout.branches.push(BranchTile {
            branch,
            area: branch_area,
        });

        let count = weights[branch];
        let interior = Rect::new(
            branch_area.x.saturating_add(1),
            branch_area.y.saturating_add(1),
            branch_area.width.saturating_sub(2),
            branch_area.height.saturating_sub(2),
        );
        let rows_cap = usize::from(interior.height).max(1);
        let columns = count.div_ceil(rows_cap).max(1);
        let per_column = count.div_ceil(columns).max(1);
        let column_spans = split_proportional(interior.x, interior.width, &vec![1; columns]);
        let row_spans = split_proportional(interior.y, interior.height, &vec![1; per_column]);

        for offset in 0..count {
            let (cx, cw) = column_spans[offset / per_column];
            let (ry, rh) = row_spans[offset % per_column];
            layout.leaves.push(LeafTile {
                leaf: first_leaf + offset,
                area: Rect::new(cx, ry, cw, rh),
            });
        }
        first_leaf += count;
    }
    layout
}

/// Splits `length` cells starting at `start` into `(offset, size)` spans
/// proportional to `weights`. Spans are contiguous and cover the range.
fn split_proportional(start: u16, length: u16, weights: &[usize]) -> Vec<(u16, u16)> {
    let total = weights.iter().sum::<usize>();
    if total == 0 {
        return weights.iter().map(|_| (start, 0)).collect();
    }
    let length = usize::from(length);
    let boundary = |cumulative: usize| -> u16 {
        let cells = length * cumulative / total;
        start.saturating_add(u16::try_from(cells).unwrap_or(u16::MAX))
    };

    let mut spans = Vec::with_capacity(weights.len());
    let mut cumulative = 0;
    for weight in weights {
        let from = boundary(cumulative);
        cumulative += weight;
        let to = boundary(cumulative);
        spans.push((from, to - from));
    }
    spans
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
