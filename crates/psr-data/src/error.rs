// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("could not find the spreadsheet at {}; set DATA_FILE_PATH or [data].path", .path.display())]
    FileNotFound { path: PathBuf },

    #[error(
        "spreadsheet {} is missing required columns: {}; expected headers Chapter, Subheading, Product Description, Product Specific Rule",
        .path.display(),
        .missing.join(", ")
    )]
    Schema { path: PathBuf, missing: Vec<String> },

    #[error("unsupported spreadsheet format for {}; use .xlsx, .xlsm, or .csv", .path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("worksheet {sheet:?} not found in {}", .path.display())]
    SheetNotFound { path: PathBuf, sheet: String },

    #[error("read spreadsheet {}: {message}", .path.display())]
    Read { path: PathBuf, message: String },

    #[error("read csv {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl LoadError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::FileNotFound { path }
            | Self::Schema { path, .. }
            | Self::UnsupportedFormat { path }
            | Self::SheetNotFound { path, .. }
            | Self::Read { path, .. }
            | Self::Csv { path, .. } => path,
        }
    }
}
