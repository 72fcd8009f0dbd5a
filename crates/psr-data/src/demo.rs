// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::clean::{Cleaned, MissingColumns, clean};
use crate::sheet::RawSheet;

const DEMO_HEADERS: [&str; 5] = [
    "Chapter",
    "Heading",
    "Subheading",
    "Product\nDescription",
    "Product Specific\nRule",
];

/// Annex-style rows with the same irregularities as the real sheet: blank
/// key cells under a merged chapter, a repeated subheading, and stray
/// non-ASCII punctuation.
const DEMO_ROWS: &[[&str; 5]] = &[
    ["01", "01.01", "0101.21", "Live horses: pure-bred breeding animals", "CC"],
    ["", "", "0101.29", "Live horses: other", "CC"],
    ["", "01.02", "0102.21", "Live bovine animals: cattle, pure-bred breeding animals", "CC"],
    ["", "", "0102.29", "Live bovine animals: cattle, other", "CC"],
    ["02", "02.01", "0201.10", "Meat of bovine animals, fresh or chilled: carcasses and half-carcasses", "CC"],
    ["", "", "0201.20", "Meat of bovine animals, fresh or chilled: other cuts with bone in", "CC"],
    ["", "", "0201.20", "Duplicate listing of the cuts with bone in", "CC"],
    ["", "02.03", "0203.11", "Meat of swine, fresh or chilled: carcasses and half\u{2011}carcasses", "CC"],
    ["03", "03.02", "0302.11", "Trout, fresh or chilled, excluding fish fillets and other fish meat", "Wholly obtained"],
    ["", "", "0302.13", "Pacific salmon, fresh or chilled", "Wholly obtained"],
    ["", "03.04", "0304.41", "Fish fillets of Pacific salmon, Atlantic salmon and Danube salmon, fresh or chilled", "CC, provided that the non-originating materials of Chapter 3 are wholly obtained"],
    ["", "", "0304.99", "Other fish meat, frozen", ""],
    ["08", "08.05", "0805.10", "Citrus fruit, fresh or dried: oranges", "CC"],
    ["", "", "0805.21", "Mandarins (including tangerines and satsumas)\u{a0}", "CC"],
    ["39", "39.01", "3901.10", "Polyethylene having a specific gravity of less than 0.94, in primary forms", "CTH; or RVC 45 percent or more"],
    ["", "39.20", "3920.10", "Other plates, sheets, film, foil and strip, of polymers of ethylene", "CTH; or RVC 45 percent or more"],
    ["84", "84.15", "8415.10", "Air conditioning machines of a kind designed to be fixed to a window, wall, ceiling or floor", "CTSH; or RVC 40 percent or more"],
    ["", "84.71", "8471.30", "Portable automatic data processing machines, weighing not more than 10 kg", "CTSH; or RVC 40 percent or more"],
    ["87", "87.03", "8703.23", "Motor cars with spark-ignition engines of a cylinder capacity exceeding 1,500 cc but not exceeding 3,000 cc", "CTH; or RVC 45 percent or more \u{2013} build-down method"],
    ["", "", "8703.24", "Motor cars with spark-ignition engines of a cylinder capacity exceeding 3,000 cc", "CTH; or RVC 45 percent or more"],
];

pub fn demo_sheet() -> RawSheet {
    let headers = DEMO_HEADERS.iter().map(|header| (*header).to_owned()).collect();
    let rows = DEMO_ROWS
        .iter()
        .map(|row| {
            row.iter()
                .map(|value| (!value.is_empty()).then(|| (*value).to_owned()))
                .collect()
        })
        .collect();
    RawSheet::new(headers, rows)
}

/// Sample data for `--demo`, run through the regular cleaning pipeline.
pub fn demo_cleaned() -> Result<Cleaned, MissingColumns> {
    clean(demo_sheet())
}
