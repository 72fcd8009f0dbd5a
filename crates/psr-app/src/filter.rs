// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::model::{RuleRecord, RuleTable};

/// Records whose subheading contains `query`, ignoring case, in table order.
///
/// A blank query matches everything. The query is always a literal
/// substring; regex metacharacters and control characters have no special
/// meaning. Filtering always starts from the full table, so
/// `filter(filter(t, a), b)` is not a supported composition.
pub fn filter<'a>(table: &'a RuleTable, query: &str) -> Vec<&'a RuleRecord> {
    filter_records(table.iter(), query)
}

pub fn filter_records<'a, I>(records: I, query: &str) -> Vec<&'a RuleRecord>
where
    I: IntoIterator<Item = &'a RuleRecord>,
{
    if query.trim().is_empty() {
        return records.into_iter().collect();
    }
    let needle = query.to_lowercase();
    records
        .into_iter()
        .filter(|record| subheading_matches(&record.subheading, &needle))
        .collect()
}

fn subheading_matches(subheading: &str, lowered_query: &str) -> bool {
    subheading.to_lowercase().contains(lowered_query)
}
