// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, ensure};
use psr_app::RuleTable;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub const ANNEX_HEADERS: [&str; 4] = [
    "Chapter",
    "Subheading",
    "Product Description",
    "Product Specific Rule",
];

const RULES: [&str; 8] = [
    "CC",
    "CTH",
    "CTSH",
    "Wholly obtained",
    "CTH; or RVC 40 percent or more",
    "CTSH; or RVC 45 percent or more",
    "CC, provided that the non-originating materials are wholly obtained",
    "RVC 40 percent or more - build-down method",
];

const GOODS: [&str; 12] = [
    "horses",
    "bovine animals",
    "swine",
    "salmon",
    "trout",
    "oranges",
    "mandarins",
    "polyethylene",
    "plates of polymers",
    "air conditioning machines",
    "data processing machines",
    "motor cars",
];

const QUALIFIERS: [&str; 8] = [
    "fresh or chilled",
    "frozen",
    "dried",
    "in primary forms",
    "pure-bred breeding animals",
    "other",
    "not more than 10 kg",
    "of a cylinder capacity exceeding 1,500 cc",
];

/// In-memory sheet that tests write out as `.xlsx` or `.csv`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetFixture {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SheetFixture {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Fixture with the four annex columns and no rows.
    pub fn annex() -> Self {
        Self::new(ANNEX_HEADERS)
    }

    pub fn row(mut self, cells: &[&str]) -> Self {
        self.rows.push(cells.iter().map(|cell| (*cell).to_owned()).collect());
        self
    }

    pub fn write_xlsx(&self, dir: &Path, file_name: &str) -> Result<PathBuf> {
        self.write_xlsx_sheet(dir, file_name, None)
    }

    /// Writes the fixture as the second worksheet named `sheet_name`,
    /// behind a decoy first sheet that lacks the annex columns.
    pub fn write_xlsx_named(
        &self,
        dir: &Path,
        file_name: &str,
        sheet_name: &str,
    ) -> Result<PathBuf> {
        self.write_xlsx_sheet(dir, file_name, Some(sheet_name))
    }

    fn write_xlsx_sheet(
        &self,
        dir: &Path,
        file_name: &str,
        sheet_name: Option<&str>,
    ) -> Result<PathBuf> {
        let path = dir.join(file_name);
        let mut book = umya_spreadsheet::new_file();

        let worksheet = match sheet_name {
            Some(name) => {
                let decoy = book
                    .get_sheet_mut(&0)
                    .context("new workbook has a first sheet")?;
                decoy.get_cell_mut((1, 1)).set_value_string("Notes");
                decoy
                    .get_cell_mut((1, 2))
                    .set_value_string("See the next worksheet");
                book.new_sheet(name).map_err(anyhow::Error::msg)?
            }
            None => book
                .get_sheet_mut(&0)
                .context("new workbook has a first sheet")?,
        };

        for (col, header) in self.headers.iter().enumerate() {
            worksheet
                .get_cell_mut((cell_index(col)?, 1))
                .set_value_string(header.as_str());
        }
        for (row_offset, row) in self.rows.iter().enumerate() {
            let row_index = cell_index(row_offset + 1)?;
            for (col, value) in row.iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                worksheet
                    .get_cell_mut((cell_index(col)?, row_index))
                    .set_value_string(value.as_str());
            }
        }

        umya_spreadsheet::writer::xlsx::write(&book, &path)
            .with_context(|| format!("write workbook {}", path.display()))?;
        Ok(path)
    }

    pub fn write_csv(&self, dir: &Path, file_name: &str) -> Result<PathBuf> {
        let path = dir.join(file_name);
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(&path)
            .with_context(|| format!("create {}", path.display()))?;
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(path)
    }
}

/// One-based spreadsheet index for a zero-based offset.
fn cell_index(offset: usize) -> Result<u32> {
    u32::try_from(offset + 1).context("cell index overflows u32")
}

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

/// Generates annex-shaped sheets: chapter cells only on the first row of
/// each chapter, strictly increasing subheadings, occasional blank rules.
#[derive(Debug, Clone)]
pub struct RuleFaker {
    rng: DeterministicRng,
}

impl RuleFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    pub fn annex_sheet(&mut self, rows: usize) -> SheetFixture {
        let mut fixture = SheetFixture::annex();
        let mut chapter = 0_usize;
        let mut heading = 0_usize;
        let mut leaf = 0_usize;

        for index in 0..rows {
            let new_chapter = index == 0 || self.rng.int_n(5) == 0;
            if new_chapter {
                chapter += 1 + self.rng.int_n(3);
                heading = 1;
                leaf = 0;
            } else if self.rng.int_n(3) == 0 {
                heading += 1;
                leaf = 0;
            }
            leaf += 1 + self.rng.int_n(2);

            let chapter_cell = if new_chapter {
                format!("{chapter:02}")
            } else {
                String::new()
            };
            let subheading = format!("{chapter:02}{heading:02}.{leaf:02}");
            let description = self.description();
            let rule = if self.rng.int_n(10) == 0 {
                String::new()
            } else {
                self.pick(&RULES).to_owned()
            };
            fixture.rows.push(vec![chapter_cell, subheading, description, rule]);
        }
        fixture
    }

    pub fn description(&mut self) -> String {
        let goods = self.pick(&GOODS);
        let qualifier = self.pick(&QUALIFIERS);
        let mut sentence = if self.rng.bool() {
            format!("{goods}, {qualifier}")
        } else {
            format!("{goods} ({qualifier}), other than those of the preceding subheading")
        };
        if let Some(first) = sentence.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        sentence
    }

    fn pick<'a>(&mut self, values: &'a [&'a str]) -> &'a str {
        values[self.rng.int_n(values.len())]
    }
}

pub fn temp_data_dir() -> Result<tempfile::TempDir> {
    tempfile::tempdir().context("create temp dir")
}

/// Checks the post-load guarantees every table must satisfy.
pub fn assert_table_invariants(table: &RuleTable) -> Result<()> {
    let mut seen = HashSet::new();
    for record in table {
        ensure!(!record.chapter.is_empty(), "row {} has no chapter", record.id);
        ensure!(
            !record.subheading.is_empty(),
            "row {} has no subheading",
            record.id
        );
        ensure!(
            !record.product_description.is_empty(),
            "row {} has an empty description",
            record.id
        );
        ensure!(
            !record.product_specific_rule.is_empty(),
            "row {} has an empty rule",
            record.id
        );
        for text in [&record.product_description, &record.product_specific_rule] {
            ensure!(
                text.chars().all(|ch| (' '..='~').contains(&ch)),
                "row {} carries non-printable text: {text:?}",
                record.id
            );
            ensure!(
                text.trim() == text.as_str(),
                "row {} has untrimmed text: {text:?}",
                record.id
            );
        }
        ensure!(
            seen.insert(record.subheading.as_str()),
            "row {} duplicates subheading {}",
            record.id,
            record.subheading
        );
    }
    Ok(())
}
