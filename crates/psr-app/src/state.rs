// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::filter::filter;
use crate::ids::RuleId;
use crate::model::RuleTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Treemap,
    Table,
}

impl ViewMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Treemap => "treemap",
            Self::Table => "table",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "treemap" => Some(Self::Treemap),
            "table" => Some(Self::Table),
            _ => None,
        }
    }

    pub const fn toggled(self) -> Self {
        match self {
            Self::Treemap => Self::Table,
            Self::Table => Self::Treemap,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Nav,
    Search,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailView {
    Closed,
    Open(RuleId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub view: ViewMode,
    pub input: InputMode,
    pub query: String,
    /// Index into the filtered rows (table) or leaves (treemap).
    pub cursor: usize,
    pub detail: DetailView,
    pub help_visible: bool,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ViewMode::Table)
    }
}

impl AppState {
    pub fn new(view: ViewMode) -> Self {
        Self {
            view,
            input: InputMode::Nav,
            query: String::new(),
            cursor: 0,
            detail: DetailView::Closed,
            help_visible: false,
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    EnterSearch,
    ExitSearch,
    SetQuery(String),
    PushQueryChar(char),
    PopQueryChar,
    ClearQuery,
    MoveCursor(isize),
    JumpFirst,
    JumpLast,
    Select(RuleId),
    SelectCursor,
    CloseDetail,
    ToggleView,
    ToggleHelp,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    InputModeChanged(InputMode),
    QueryChanged(String),
    CursorMoved(usize),
    DetailOpened(RuleId),
    DetailClosed,
    ViewChanged(ViewMode),
    HelpToggled(bool),
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    /// Applies one user command. The table is read-only input; everything
    /// the command changes lives in `self`.
    pub fn dispatch(&mut self, table: &RuleTable, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::EnterSearch => {
                self.input = InputMode::Search;
                vec![AppEvent::InputModeChanged(self.input)]
            }
            AppCommand::ExitSearch => {
                self.input = InputMode::Nav;
                vec![AppEvent::InputModeChanged(self.input)]
            }
            AppCommand::SetQuery(query) => self.replace_query(query),
            AppCommand::PushQueryChar(ch) => {
                let mut query = self.query.clone();
                query.push(ch);
                self.replace_query(query)
            }
            AppCommand::PopQueryChar => {
                let mut query = self.query.clone();
                if query.pop().is_none() {
                    return Vec::new();
                }
                self.replace_query(query)
            }
            AppCommand::ClearQuery => self.replace_query(String::new()),
            AppCommand::MoveCursor(delta) => {
                let len = filter(table, &self.query).len();
                if len == 0 {
                    return Vec::new();
                }
                let max = (len - 1) as isize;
                let next = (self.cursor as isize + delta).clamp(0, max) as usize;
                self.move_cursor_to(table, next)
            }
            AppCommand::JumpFirst => self.move_cursor_to(table, 0),
            AppCommand::JumpLast => {
                let len = filter(table, &self.query).len();
                self.move_cursor_to(table, len.saturating_sub(1))
            }
            AppCommand::Select(id) => self.open_detail(table, id),
            AppCommand::SelectCursor => {
                let rows = filter(table, &self.query);
                match rows.get(self.cursor) {
                    Some(record) => {
                        let id = record.id;
                        self.open_detail(table, id)
                    }
                    None => Vec::new(),
                }
            }
            AppCommand::CloseDetail => {
                if self.detail == DetailView::Closed {
                    return Vec::new();
                }
                self.detail = DetailView::Closed;
                vec![AppEvent::DetailClosed]
            }
            AppCommand::ToggleView => {
                self.view = self.view.toggled();
                self.cursor = 0;
                self.detail = DetailView::Closed;
                vec![
                    AppEvent::ViewChanged(self.view),
                    self.set_status(self.view.as_str()),
                ]
            }
            AppCommand::ToggleHelp => {
                self.help_visible = !self.help_visible;
                vec![AppEvent::HelpToggled(self.help_visible)]
            }
            AppCommand::SetStatus(message) => vec![self.set_status(&message)],
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    fn replace_query(&mut self, query: String) -> Vec<AppEvent> {
        if query == self.query {
            return Vec::new();
        }
        self.query = query;
        self.cursor = 0;
        vec![
            AppEvent::QueryChanged(self.query.clone()),
            AppEvent::CursorMoved(self.cursor),
        ]
    }

    /// While the detail view is open, moving the cursor re-selects the row
    /// under it so the modal follows the cursor.
    fn move_cursor_to(&mut self, table: &RuleTable, index: usize) -> Vec<AppEvent> {
        if index == self.cursor {
            return Vec::new();
        }
        self.cursor = index;
        let mut events = vec![AppEvent::CursorMoved(self.cursor)];
        if matches!(self.detail, DetailView::Open(_))
            && let Some(record) = filter(table, &self.query).get(self.cursor)
        {
            let id = record.id;
            events.extend(self.open_detail(table, id));
        }
        events
    }

    fn open_detail(&mut self, table: &RuleTable, id: RuleId) -> Vec<AppEvent> {
        if table.get(id).is_none() {
            return Vec::new();
        }
        if self.detail == DetailView::Open(id) {
            return Vec::new();
        }
        self.detail = DetailView::Open(id);
        vec![AppEvent::DetailOpened(id)]
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}
