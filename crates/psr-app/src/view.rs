// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::filter::filter;
use crate::model::{RuleRecord, RuleTable};
use crate::state::{AppState, DetailView, ViewMode};
use crate::treemap::{Treemap, build_treemap};

pub const TABLE_COLUMNS: [&str; 4] = ["Chapter", "Subheading", "Description", "Rule"];

/// Full text shown by the detail modal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailPanel {
    pub title: String,
    pub product_description: String,
    pub product_specific_rule: String,
}

impl DetailPanel {
    pub fn for_record(record: &RuleRecord) -> Self {
        Self {
            title: record.detail_title(),
            product_description: record.product_description.clone(),
            product_specific_rule: record.product_specific_rule.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewBody<'a> {
    Treemap(Treemap),
    Table(Vec<&'a RuleRecord>),
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardView<'a> {
    pub body: ViewBody<'a>,
    pub match_count: usize,
    pub total_count: usize,
    pub cursor: usize,
    pub detail: Option<DetailPanel>,
}

impl DashboardView<'_> {
    pub fn is_empty(&self) -> bool {
        self.match_count == 0
    }
}

pub fn project<'a>(table: &'a RuleTable, state: &AppState) -> DashboardView<'a> {
    let rows = filter(table, &state.query);
    let match_count = rows.len();
    let detail = match state.detail {
        DetailView::Closed => None,
        DetailView::Open(id) => table.get(id).map(DetailPanel::for_record),
    };
    let body = match state.view {
        ViewMode::Treemap => ViewBody::Treemap(build_treemap(rows)),
        ViewMode::Table => ViewBody::Table(rows),
    };

    DashboardView {
        body,
        match_count,
        total_count: table.len(),
        cursor: state.cursor.min(match_count.saturating_sub(1)),
        detail,
    }
}

/// The four visible cells of a table row.
pub fn table_cells(record: &RuleRecord) -> [&str; 4] {
    [
        record.chapter.as_str(),
        record.subheading.as_str(),
        record.short_description.as_str(),
        record.short_rule.as_str(),
    ]
}
