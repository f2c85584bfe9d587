use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ResViewError, Result};
use crate::item::ItemKind;

/// Result-kind partition shown as one tab of the browser.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[default]
    All,
    Scalars,
    Parameters,
    Vectors,
    Histograms,
}

/// Which control variant displays a category.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlKind {
    Table,
    Tree,
}

impl Category {
    /// Tab order.
    pub const ALL: [Category; 5] = [
        Category::All,
        Category::Scalars,
        Category::Parameters,
        Category::Vectors,
        Category::Histograms,
    ];

    pub fn index(self) -> usize {
        match self {
            Self::All => 0,
            Self::Scalars => 1,
            Self::Parameters => 2,
            Self::Vectors => 3,
            Self::Histograms => 4,
        }
    }

    pub fn from_index(index: usize) -> Result<Self> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or(ResViewError::CategoryIndexOutOfRange {
                index,
                total: Self::ALL.len(),
            })
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Scalars => "Scalars",
            Self::Parameters => "Parameters",
            Self::Vectors => "Vectors",
            Self::Histograms => "Histograms",
        }
    }

    pub fn control_kind(self) -> ControlKind {
        match self {
            Self::All => ControlKind::Tree,
            _ => ControlKind::Table,
        }
    }

    pub fn is_tabular(self) -> bool {
        self.control_kind() == ControlKind::Table
    }

    /// Whether the category's item list depends on the "show fields as scalars" toggle.
    pub fn expands_fields(self) -> bool {
        matches!(self, Self::All | Self::Scalars)
    }

    /// Whether an item of `kind` belongs to this category.
    pub fn accepts(self, kind: ItemKind) -> bool {
        match self {
            Self::All => true,
            Self::Scalars => kind == ItemKind::Scalar,
            Self::Parameters => kind == ItemKind::Parameter,
            Self::Vectors => kind == ItemKind::Vector,
            Self::Histograms => matches!(kind, ItemKind::Statistics | ItemKind::Histogram),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_matches_tab_order() {
        for (i, c) in Category::ALL.iter().enumerate() {
            assert_eq!(c.index(), i);
            assert_eq!(Category::from_index(i).unwrap(), *c);
        }
    }

    #[test]
    fn from_index_rejects_out_of_range() {
        assert!(matches!(
            Category::from_index(5),
            Err(ResViewError::CategoryIndexOutOfRange { index: 5, total: 5 })
        ));
    }

    #[test]
    fn only_all_uses_the_tree() {
        assert_eq!(Category::All.control_kind(), ControlKind::Tree);
        assert!(Category::ALL[1..].iter().all(|c| c.is_tabular()));
    }
}
