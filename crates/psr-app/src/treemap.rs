// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::HashMap;

use crate::ids::RuleId;
use crate::model::RuleRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tooltip {
    pub short_description: String,
    pub short_rule: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreemapLeaf {
    pub id: RuleId,
    pub subheading: String,
    pub tooltip: Tooltip,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreemapBranch {
    pub chapter: String,
    pub leaves: Vec<TreemapLeaf>,
}

/// Chapter → Subheading hierarchy. Leaves carry no weight, so a branch's
/// share of the area is its leaf count over the total leaf count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Treemap {
    pub branches: Vec<TreemapBranch>,
}

/// Flat node form: `parent` is empty for chapter nodes and chapter nodes
/// carry no tooltip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreemapNode {
    pub id: String,
    pub label: String,
    pub parent: String,
    pub tooltip: Option<Tooltip>,
}

/// Groups records by chapter in order of first appearance; leaves keep the
/// order of the input.
pub fn build_treemap<'a, I>(records: I) -> Treemap
where
    I: IntoIterator<Item = &'a RuleRecord>,
{
    let mut branches: Vec<TreemapBranch> = Vec::new();
    let mut positions: HashMap<&'a str, usize> = HashMap::new();

    for record in records {
        let index = *positions
            .entry(record.chapter.as_str())
            .or_insert_with(|| {
                branches.push(TreemapBranch {
                    chapter: record.chapter.clone(),
                    leaves: Vec::new(),
                });
                branches.len() - 1
            });
        branches[index].leaves.push(TreemapLeaf {
            id: record.id,
            subheading: record.subheading.clone(),
            tooltip: Tooltip {
                short_description: record.short_description.clone(),
                short_rule: record.short_rule.clone(),
            },
        });
    }

    Treemap { branches }
}

impl Treemap {
    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    pub fn leaf_count(&self) -> usize {
        self.branches.iter().map(|branch| branch.leaves.len()).sum()
    }

    /// Leaves in drawing order, chapter by chapter.
    pub fn leaves(&self) -> impl Iterator<Item = &TreemapLeaf> {
        self.branches.iter().flat_map(|branch| branch.leaves.iter())
    }

    pub fn nodes(&self) -> Vec<TreemapNode> {
        let mut nodes = Vec::with_capacity(self.branches.len() + self.leaf_count());
        for branch in &self.branches {
            nodes.push(TreemapNode {
                id: branch.chapter.clone(),
                label: branch.chapter.clone(),
                parent: String::new(),
                tooltip: None,
            });
            for leaf in &branch.leaves {
                nodes.push(TreemapNode {
                    id: format!("{}/{}", branch.chapter, leaf.subheading),
                    label: leaf.subheading.clone(),
                    parent: branch.chapter.clone(),
                    tooltip: Some(leaf.tooltip.clone()),
                });
            }
        }
        nodes
    }
}
