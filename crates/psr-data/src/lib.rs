// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod clean;
mod demo;
mod error;
mod sheet;

use std::path::Path;

use psr_app::RuleTable;
use tracing::info;

pub use clean::{
    CHAPTER, Cleaned, LoadSummary, MissingColumns, PRODUCT_DESCRIPTION, PRODUCT_SPECIFIC_RULE,
    REQUIRED_COLUMNS, SUBHEADING, clean, normalize_header, strip_non_printable,
};
pub use demo::{demo_cleaned, demo_sheet};
pub use error::LoadError;
pub use sheet::{LoadOptions, RawSheet, read_sheet};

pub const DEFAULT_DATA_FILE: &str = "PSR Annex 3-A Combined_Sheet_Corrected.xlsx";
pub const DATA_FILE_ENV: &str = "DATA_FILE_PATH";

/// Reads the first worksheet of `path` and runs the cleaning pipeline.
pub fn load(path: &Path) -> Result<RuleTable, LoadError> {
    load_with(path, &LoadOptions::default()).map(|cleaned| cleaned.table)
}

pub fn load_with(path: &Path, options: &LoadOptions) -> Result<Cleaned, LoadError> {
    let sheet = read_sheet(path, options)?;
    let cleaned = clean(sheet).map_err(|MissingColumns(missing)| LoadError::Schema {
        path: path.to_path_buf(),
        missing,
    })?;
    log_summary(path, &cleaned.summary);
    Ok(cleaned)
}

fn log_summary(path: &Path, summary: &LoadSummary) {
    info!(
        path = %path.display(),
        raw_rows = summary.raw_rows,
        kept = summary.kept_rows,
        missing_key = summary.missing_key_rows,
        blank_rule = summary.blank_rule_rows,
        duplicate = summary.duplicate_rows,
        "rule table loaded"
    );
}
