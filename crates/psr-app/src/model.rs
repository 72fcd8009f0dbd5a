// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::ids::RuleId;

pub const PREVIEW_TOKENS: usize = 10;
pub const PREVIEW_ELLIPSIS: &str = "...";
pub const NO_DESCRIPTION: &str = "No description";
pub const NO_RULE: &str = "No rule";

/// Cleaned fields for one rule, before it is placed in a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRule {
    pub chapter: String,
    pub subheading: String,
    pub product_description: String,
    pub product_specific_rule: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleRecord {
    pub id: RuleId,
    pub chapter: String,
    pub subheading: String,
    pub product_description: String,
    pub product_specific_rule: String,
    pub short_description: String,
    pub short_rule: String,
}

impl RuleRecord {
    fn from_new(id: RuleId, rule: NewRule) -> Self {
        let short_description = short_text(&rule.product_description);
        let short_rule = short_text(&rule.product_specific_rule);
        Self {
            id,
            chapter: rule.chapter,
            subheading: rule.subheading,
            product_description: rule.product_description,
            product_specific_rule: rule.product_specific_rule,
            short_description,
            short_rule,
        }
    }

    pub fn detail_title(&self) -> String {
        format!("Subheading {}", self.subheading)
    }
}

/// The cleaned rule set. Built once at startup and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleTable {
    records: Vec<RuleRecord>,
}

impl RuleTable {
    /// Ids are assigned by position, so `get(id)` is an index lookup.
    pub fn from_rules<I>(rules: I) -> Self
    where
        I: IntoIterator<Item = NewRule>,
    {
        let records = rules
            .into_iter()
            .enumerate()
            .map(|(index, rule)| RuleRecord::from_new(RuleId::new(index), rule))
            .collect();
        Self { records }
    }

    pub fn records(&self) -> &[RuleRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RuleRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: RuleId) -> Option<&RuleRecord> {
        self.records.get(id.get())
    }

    pub fn chapter_count(&self) -> usize {
        let mut seen = std::collections::BTreeSet::new();
        for record in &self.records {
            seen.insert(record.chapter.as_str());
        }
        seen.len()
    }

    /// Hands the cleaned fields back out, e.g. to feed them through the
    /// cleaning pipeline again.
    pub fn to_new_rules(&self) -> Vec<NewRule> {
        self.records
            .iter()
            .map(|record| NewRule {
                chapter: record.chapter.clone(),
                subheading: record.subheading.clone(),
                product_description: record.product_description.clone(),
                product_specific_rule: record.product_specific_rule.clone(),
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a RuleTable {
    type Item = &'a RuleRecord;
    type IntoIter = std::slice::Iter<'a, RuleRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// First `PREVIEW_TOKENS` whitespace-separated tokens joined by single
/// spaces, with `...` appended when anything was cut. Shorter text is
/// returned verbatim.
pub fn short_text(text: &str) -> String {
    let mut tokens = text.split_whitespace();
    let head = tokens
        .by_ref()
        .take(PREVIEW_TOKENS)
        .collect::<Vec<&str>>();
    if tokens.next().is_none() {
        return text.to_owned();
    }
    let mut short = head.join(" ");
    short.push_str(PREVIEW_ELLIPSIS);
    short
}
