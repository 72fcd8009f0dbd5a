// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::ffi::OsStr;
use std::path::Path;

use tracing::debug;

use crate::error::LoadError;

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Header row plus data rows exactly as read. Empty cells are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawSheet {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { headers, rows }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Worksheet name for workbook formats; the first sheet when unset.
    pub sheet: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SheetFormat {
    Xlsx,
    Csv,
}

impl SheetFormat {
    fn detect(path: &Path) -> Option<Self> {
        let extension = path
            .extension()
            .and_then(OsStr::to_str)?
            .to_ascii_lowercase();
        match extension.as_str() {
            "xlsx" | "xlsm" => Some(Self::Xlsx),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

pub fn read_sheet(path: &Path, options: &LoadOptions) -> Result<RawSheet, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let format = SheetFormat::detect(path).ok_or_else(|| LoadError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;

    let sheet = match format {
        SheetFormat::Xlsx => read_xlsx(path, options)?,
        SheetFormat::Csv => read_csv(path)?,
    };
    debug!(
        path = %path.display(),
        columns = sheet.headers.len(),
        rows = sheet.rows.len(),
        "read raw sheet"
    );
    Ok(sheet)
}

fn read_xlsx(path: &Path, options: &LoadOptions) -> Result<RawSheet, LoadError> {
    let book = umya_spreadsheet::reader::xlsx::read(path).map_err(|error| LoadError::Read {
        path: path.to_path_buf(),
        message: error.to_string(),
    })?;

    let worksheet = match &options.sheet {
        Some(name) => book
            .get_sheet_by_name(name)
            .ok_or_else(|| LoadError::SheetNotFound {
                path: path.to_path_buf(),
                sheet: name.clone(),
            })?,
        None => book.get_sheet(&0).ok_or_else(|| LoadError::Read {
            path: path.to_path_buf(),
            message: "workbook has no worksheets".to_owned(),
        })?,
    };

    let (max_col, max_row) = worksheet.get_highest_column_and_row();
    if max_row == 0 {
        return Ok(RawSheet::default());
    }

    let read_cell = |col: u32, row: u32| -> Option<String> {
        worksheet
            .get_cell((col, row))
            .and_then(|cell| non_empty(cell.get_value().to_string()))
    };

    let headers = (1..=max_col)
        .map(|col| read_cell(col, 1).unwrap_or_default())
        .collect();
    let rows = (2..=max_row)
        .map(|row| {
            (1..=max_col)
                .map(|col| read_cell(col, row))
                .collect::<Vec<Option<String>>>()
        })
        .filter(|cells| !is_blank_row(cells))
        .collect();

    Ok(RawSheet::new(headers, rows))
}

fn read_csv(path: &Path) -> Result<RawSheet, LoadError> {
    let csv_error = |source: csv::Error| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(csv_error)?;

    let headers = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .enumerate()
        .map(|(index, header)| {
            if index == 0 {
                header.trim_start_matches(BYTE_ORDER_MARK).to_owned()
            } else {
                header.to_owned()
            }
        })
        .collect::<Vec<String>>();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        let cells = (0..headers.len())
            .map(|index| record.get(index).and_then(|value| non_empty(value.to_owned())))
            .collect::<Vec<_>>();
        if !is_blank_row(&cells) {
            rows.push(cells);
        }
    }

    Ok(RawSheet::new(headers, rows))
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

fn is_blank_row(cells: &[Option<String>]) -> bool {
    cells.iter().all(Option::is_none)
}
