// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use psr_app::{NO_DESCRIPTION, NO_RULE, RuleTable};
use psr_data::{LoadError, LoadOptions, LoadSummary, load, load_with};
use psr_testkit::{RuleFaker, SheetFixture, assert_table_invariants, temp_data_dir};
use std::path::Path;

fn messy_fixture() -> SheetFixture {
    SheetFixture::new([
        "Chapter",
        "Heading",
        " Subheading ",
        "Product\nDescription",
        "Product Specific\r\nRule",
    ])
    .row(&["01", "01.01", "0101.21", "Live horses\u{a0}", "CC"])
    .row(&["", "", "0101.29", "Live horses: other", ""])
    .row(&["", "", "0101.29", "Live horses: repeated listing", "CTH"])
    .row(&["", "01.02", "0102.21", "Cattle", "\u{2013}"])
    .row(&["02", "", "0201.10", "", "CC"])
}

fn rows(table: &RuleTable) -> Vec<(&str, &str, &str, &str)> {
    table
        .iter()
        .map(|record| {
            (
                record.chapter.as_str(),
                record.subheading.as_str(),
                record.product_description.as_str(),
                record.product_specific_rule.as_str(),
            )
        })
        .collect()
}

fn assert_messy_fixture_cleaned(path: &Path) -> Result<()> {
    let cleaned = load_with(path, &LoadOptions::default())?;
    assert_eq!(
        rows(&cleaned.table),
        vec![
            ("01", "0101.21", "Live horses", "CC"),
            ("01", "0101.29", "Live horses: other", NO_RULE),
            ("02", "0201.10", NO_DESCRIPTION, "CC"),
        ]
    );
    assert_eq!(
        cleaned.summary,
        LoadSummary {
            raw_rows: 5,
            missing_key_rows: 0,
            blank_rule_rows: 1,
            duplicate_rows: 1,
            kept_rows: 3,
        }
    );
    assert_table_invariants(&cleaned.table)?;
    Ok(())
}

#[test]
fn xlsx_workbook_is_filled_cleaned_and_deduplicated() -> Result<()> {
    let dir = temp_data_dir()?;
    let path = messy_fixture().write_xlsx(dir.path(), "annex.xlsx")?;
    assert_messy_fixture_cleaned(&path)
}

#[test]
fn csv_export_is_filled_cleaned_and_deduplicated() -> Result<()> {
    let dir = temp_data_dir()?;
    let path = messy_fixture().write_csv(dir.path(), "annex.csv")?;
    assert_messy_fixture_cleaned(&path)
}

#[test]
fn empty_rule_cell_keeps_row_with_placeholder() -> Result<()> {
    let dir = temp_data_dir()?;
    let fixture = SheetFixture::annex()
        .row(&["01", "0101.10", "", "Wholly obtained"])
        .row(&["", "0101.21", "", ""])
        .row(&["", "0101.29", "", "\u{2013}"]);
    let expected = vec![
        ("01", "0101.10", NO_DESCRIPTION, "Wholly obtained"),
        ("01", "0101.21", NO_DESCRIPTION, NO_RULE),
    ];

    let xlsx = load(&fixture.write_xlsx(dir.path(), "annex.xlsx")?)?;
    let csv = load(&fixture.write_csv(dir.path(), "annex.csv")?)?;
    assert_eq!(rows(&xlsx), expected);
    assert_eq!(rows(&csv), expected);
    Ok(())
}

#[test]
fn generated_annex_loads_identically_from_both_formats() -> Result<()> {
    let dir = temp_data_dir()?;
    let fixture = RuleFaker::new(42).annex_sheet(60);
    let xlsx = load(&fixture.write_xlsx(dir.path(), "annex.xlsx")?)?;
    let csv = load(&fixture.write_csv(dir.path(), "annex.csv")?)?;

    assert_eq!(xlsx, csv);
    assert_eq!(xlsx.len(), 60);
    assert_table_invariants(&xlsx)?;
    Ok(())
}

#[test]
fn loading_a_cleaned_table_again_changes_nothing() -> Result<()> {
    let dir = temp_data_dir()?;
    let first = load(&messy_fixture().write_xlsx(dir.path(), "annex.xlsx")?)?;

    let mut again = SheetFixture::annex();
    for rule in first.to_new_rules() {
        again = again.row(&[
            rule.chapter.as_str(),
            rule.subheading.as_str(),
            rule.product_description.as_str(),
            rule.product_specific_rule.as_str(),
        ]);
    }
    let second = load(&again.write_csv(dir.path(), "again.csv")?)?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn missing_file_names_the_override() {
    let error = load(Path::new("/nonexistent/annex.xlsx")).expect_err("file is absent");
    assert!(matches!(error, LoadError::FileNotFound { .. }));
    assert!(error.to_string().contains("DATA_FILE_PATH"));
    assert_eq!(error.path(), Path::new("/nonexistent/annex.xlsx"));
}

#[test]
fn missing_columns_are_a_schema_error() -> Result<()> {
    let dir = temp_data_dir()?;
    let path = SheetFixture::new(["Chapter", "Subheading", "Notes"])
        .row(&["01", "0101.21", "horses"])
        .write_xlsx(dir.path(), "annex.xlsx")?;

    let error = load(&path).expect_err("schema mismatch");
    match error {
        LoadError::Schema { missing, .. } => assert_eq!(
            missing,
            vec!["Product Description", "Product Specific Rule"]
        ),
        other => panic!("expected schema error, got {other}"),
    }
    Ok(())
}

#[test]
fn header_only_sheet_is_an_empty_table() -> Result<()> {
    let dir = temp_data_dir()?;
    let path = SheetFixture::annex().write_xlsx(dir.path(), "annex.xlsx")?;
    let cleaned = load_with(&path, &LoadOptions::default())?;
    assert!(cleaned.table.is_empty());
    assert_eq!(cleaned.summary, LoadSummary::default());
    Ok(())
}

#[test]
fn named_worksheet_is_read_instead_of_the_first() -> Result<()> {
    let dir = temp_data_dir()?;
    let path = SheetFixture::annex()
        .row(&["84", "8471.30", "Portable computers", "CTSH"])
        .write_xlsx_named(dir.path(), "annex.xlsx", "Annex 3-A")?;

    let first_sheet = load(&path).expect_err("decoy sheet has no annex columns");
    assert!(matches!(first_sheet, LoadError::Schema { .. }));

    let options = LoadOptions {
        sheet: Some("Annex 3-A".to_owned()),
    };
    let cleaned = load_with(&path, &options)?;
    assert_eq!(
        rows(&cleaned.table),
        vec![("84", "8471.30", "Portable computers", "CTSH")]
    );

    let options = LoadOptions {
        sheet: Some("Annex 3-B".to_owned()),
    };
    let error = load_with(&path, &options).expect_err("sheet does not exist");
    assert!(matches!(error, LoadError::SheetNotFound { ref sheet, .. } if sheet == "Annex 3-B"));
    Ok(())
}
