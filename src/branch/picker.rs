//! Ordering of branches for the interactive pickers.
//!
//! Pinned branches always come first, in pin order. The remaining branches
//! are either grouped by category (single-select pickers) or listed
//! alphabetically (multi-select pickers), capped at
//! [`MAX_REGULAR_BRANCHES`] entries.

use std::cmp::Ordering;

use super::{BranchDescriptor, OTHER_CATEGORY};

/// Maximum number of non-pinned branches shown in a picker.
pub const MAX_REGULAR_BRANCHES: usize = 100;

/// Preferred order of well-known categories.
pub const CATEGORY_ORDER: &[&str] = &[
    "feat", "fix", "merge", "refactor", "hotfix", "chore", "docs", "test", "style",
];

/// How non-pinned branches are arranged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerView {
    /// Grouped by category, most recent first within a group.
    Category,
    /// One alphabetical list.
    Flat,
}

/// Heading of a group of branches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionKind {
    /// The user's pinned branches.
    Pinned,
    /// Branches sharing a name prefix.
    Category(String),
    /// Every remaining branch, alphabetically.
    All,
}

/// A run of branches under one heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Heading.
    pub kind: SectionKind,
    /// Branches in display order.
    pub branches: Vec<BranchDescriptor>,
}

/// Ordered, sectioned list of branches ready to be rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchPresentation {
    sections: Vec<Section>,
}

impl BranchPresentation {
    /// Arranges `candidates`, lifting those named in `pinned` to the top.
    pub fn build(view: PickerView, candidates: Vec<BranchDescriptor>, pinned: &[String]) -> Self {
        let (mut pinned_branches, mut regular): (Vec<_>, Vec<_>) = candidates
            .into_iter()
            .partition(|b| pinned.iter().any(|p| p == &b.name));

        pinned_branches.sort_by_key(|b| pinned.iter().position(|p| p == &b.name));

        let mut sections = Vec::new();
        if !pinned_branches.is_empty() {
            sections.push(Section {
                kind: SectionKind::Pinned,
                branches: pinned_branches,
            });
        }

        match view {
            PickerView::Flat => {
                regular.sort_by(|a, b| a.name.cmp(&b.name));
                regular.truncate(MAX_REGULAR_BRANCHES);
                if !regular.is_empty() {
                    sections.push(Section {
                        kind: SectionKind::All,
                        branches: regular,
                    });
                }
            }
            PickerView::Category => {
                regular.sort_by(compare_for_category_view);
                regular.truncate(MAX_REGULAR_BRANCHES);
                for branch in regular {
                    match sections.last_mut() {
                        Some(Section {
                            kind: SectionKind::Category(category),
                            branches,
                        }) if *category == branch.category => branches.push(branch),
                        _ => sections.push(Section {
                            kind: SectionKind::Category(branch.category.clone()),
                            branches: vec![branch],
                        }),
                    }
                }
            }
        }

        Self { sections }
    }

    /// Shorthand for [`PickerView::Category`].
    pub fn category_view(candidates: Vec<BranchDescriptor>, pinned: &[String]) -> Self {
        Self::build(PickerView::Category, candidates, pinned)
    }

    /// Shorthand for [`PickerView::Flat`].
    pub fn flat_view(candidates: Vec<BranchDescriptor>, pinned: &[String]) -> Self {
        Self::build(PickerView::Flat, candidates, pinned)
    }

    /// Returns the sections in display order.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Iterates over every branch in display order.
    pub fn branches(&self) -> impl Iterator<Item = &BranchDescriptor> {
        self.sections.iter().flat_map(|s| s.branches.iter())
    }

    /// Returns the branch names in display order.
    pub fn names(&self) -> Vec<&str> {
        self.branches().map(|b| b.name.as_str()).collect()
    }

    /// Number of selectable branches.
    pub fn len(&self) -> usize {
        self.sections.iter().map(|s| s.branches.len()).sum()
    }

    /// Checks whether there is nothing to choose from.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Returns the branch at a zero-based display position.
    pub fn get(&self, index: usize) -> Option<&BranchDescriptor> {
        self.branches().nth(index)
    }

    /// The pre-selected choice: first pinned branch, else the first entry.
    pub fn default_choice(&self) -> Option<&str> {
        self.branches().next().map(|b| b.name.as_str())
    }

    /// Keeps branches whose name contains `query`, ignoring case.
    ///
    /// Sections left empty are dropped.
    pub fn filter(&self, query: &str) -> Self {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.clone();
        }

        let sections = self
            .sections
            .iter()
            .filter_map(|section| {
                let branches: Vec<_> = section
                    .branches
                    .iter()
                    .filter(|b| b.name.to_lowercase().contains(&needle))
                    .cloned()
                    .collect();
                (!branches.is_empty()).then(|| Section {
                    kind: section.kind.clone(),
                    branches,
                })
            })
            .collect();

        Self { sections }
    }
}

/// Sort key for a category: listed ones first, then others alphabetically,
/// then the literal `other`.
fn category_rank(category: &str) -> (usize, &str) {
    if let Some(index) = CATEGORY_ORDER.iter().position(|c| *c == category) {
        (index, "")
    } else if category == OTHER_CATEGORY {
        (CATEGORY_ORDER.len() + 1, "")
    } else {
        (CATEGORY_ORDER.len(), category)
    }
}

fn compare_for_category_view(a: &BranchDescriptor, b: &BranchDescriptor) -> Ordering {
    category_rank(&a.category)
        .cmp(&category_rank(&b.category))
        .then_with(|| b.last_commit_epoch_seconds.cmp(&a.last_commit_epoch_seconds))
        .then_with(|| a.name.cmp(&b.name))
}
