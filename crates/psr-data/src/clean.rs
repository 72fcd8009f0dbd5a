// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::HashSet;

use psr_app::{NO_DESCRIPTION, NO_RULE, NewRule, RuleTable};

use crate::sheet::RawSheet;

pub const CHAPTER: &str = "Chapter";
pub const SUBHEADING: &str = "Subheading";
pub const PRODUCT_DESCRIPTION: &str = "Product Description";
pub const PRODUCT_SPECIFIC_RULE: &str = "Product Specific Rule";
pub const REQUIRED_COLUMNS: [&str; 4] =
    [CHAPTER, SUBHEADING, PRODUCT_DESCRIPTION, PRODUCT_SPECIFIC_RULE];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("missing required columns: {}", .0.join(", "))]
pub struct MissingColumns(pub Vec<String>);

/// Row accounting for one run of the pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub raw_rows: usize,
    pub missing_key_rows: usize,
    pub blank_rule_rows: usize,
    pub duplicate_rows: usize,
    pub kept_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cleaned {
    pub table: RuleTable,
    pub summary: LoadSummary,
}

/// Trims the header and folds each run of line breaks into one space.
pub fn normalize_header(raw: &str) -> String {
    let mut normalized = String::with_capacity(raw.len());
    let mut in_break = false;
    for ch in raw.trim().chars() {
        if ch == '\n' || ch == '\r' {
            if !in_break {
                normalized.push(' ');
            }
            in_break = true;
        } else {
            normalized.push(ch);
            in_break = false;
        }
    }
    normalized
}

/// Deletes every character outside printable ASCII (0x20..=0x7E).
pub fn strip_non_printable(text: &str) -> String {
    text.chars().filter(|ch| (' '..='~').contains(ch)).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ProjectedRow {
    chapter: Option<String>,
    subheading: Option<String>,
    description: Option<String>,
    rule: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FilledRow {
    chapter: String,
    subheading: String,
    description: Option<String>,
    rule: Option<String>,
}

#[derive(Debug, Default)]
struct Carry {
    chapter: Option<String>,
    subheading: Option<String>,
}

pub fn clean(sheet: RawSheet) -> Result<Cleaned, MissingColumns> {
    let mut summary = LoadSummary {
        raw_rows: sheet.rows.len(),
        ..LoadSummary::default()
    };

    let projected = project_columns(sheet)?;
    let filled = forward_fill(projected);
    summary.missing_key_rows = summary.raw_rows - filled.len();

    let mut seen = HashSet::new();
    let mut rules = Vec::with_capacity(filled.len());
    for row in filled {
        let Some(rule) = finish_row(row) else {
            summary.blank_rule_rows += 1;
            continue;
        };
        if !seen.insert(rule.subheading.clone()) {
            summary.duplicate_rows += 1;
            continue;
        }
        rules.push(rule);
    }
    summary.kept_rows = rules.len();

    Ok(Cleaned {
        table: RuleTable::from_rules(rules),
        summary,
    })
}

fn project_columns(sheet: RawSheet) -> Result<Vec<ProjectedRow>, MissingColumns> {
    let headers = sheet
        .headers
        .iter()
        .map(|header| normalize_header(header))
        .collect::<Vec<String>>();
    let position = |name: &str| headers.iter().position(|header| header == name);

    let indices = REQUIRED_COLUMNS.map(position);
    let missing = REQUIRED_COLUMNS
        .iter()
        .zip(indices.iter())
        .filter(|(_, index)| index.is_none())
        .map(|(name, _)| (*name).to_owned())
        .collect::<Vec<String>>();
    if !missing.is_empty() {
        return Err(MissingColumns(missing));
    }
    let [chapter, subheading, description, rule] = indices.map(|index| index.unwrap_or_default());

    Ok(sheet
        .rows
        .into_iter()
        .map(|mut cells| {
            let mut take = |index: usize| cells.get_mut(index).and_then(Option::take);
            ProjectedRow {
                chapter: take(chapter),
                subheading: take(subheading),
                description: take(description),
                rule: take(rule),
            }
        })
        .collect())
}

/// Fills blank chapter/subheading cells from the closest row above and drops
/// rows that still have no key. Rows dropped later in the pipeline still
/// feed the carry.
fn forward_fill(rows: Vec<ProjectedRow>) -> Vec<FilledRow> {
    let (_, filled) = rows.into_iter().fold(
        (Carry::default(), Vec::new()),
        |(mut carry, mut filled), row| {
            if let Some(chapter) = present(row.chapter) {
                carry.chapter = Some(chapter);
            }
            if let Some(subheading) = present(row.subheading) {
                carry.subheading = Some(subheading);
            }
            if let (Some(chapter), Some(subheading)) = (&carry.chapter, &carry.subheading) {
                filled.push(FilledRow {
                    chapter: chapter.clone(),
                    subheading: subheading.clone(),
                    description: row.description,
                    rule: row.rule,
                });
            }
            (carry, filled)
        },
    );
    filled
}

/// Placeholders, trimming and the printable-ASCII pass. `None` means the
/// rule text was present but empty once cleaned, so the row is dropped.
fn finish_row(row: FilledRow) -> Option<NewRule> {
    let description = row
        .description
        .map(|text| clean_text(&text))
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| NO_DESCRIPTION.to_owned());
    let rule = match row.rule {
        Some(text) => clean_text(&text),
        None => NO_RULE.to_owned(),
    };
    if rule.is_empty() {
        return None;
    }

    Some(NewRule {
        chapter: row.chapter,
        subheading: row.subheading,
        product_description: description,
        product_specific_rule: rule,
    })
}

fn clean_text(text: &str) -> String {
    strip_non_printable(text.trim()).trim().to_owned()
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}
