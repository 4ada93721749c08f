//! Distinct years present in a [`Catalog`], oldest first.
//!
//! The index is a projection: it is derived from a catalog on demand and
//! never cached beside it, so it always reflects the catalog it came from.

use std::collections::BTreeSet;

use memoir_types::Year;

use crate::catalog::Catalog;

/// Ascending set of distinct years.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct YearIndex {
    years: BTreeSet<Year>,
}

/// Derive the [`YearIndex`] of `catalog`.
pub fn years(catalog: &Catalog) -> YearIndex {
    YearIndex {
        years: catalog.iter().map(|m| m.year).collect(),
    }
}

impl YearIndex {
    /// Iterate years oldest first.  Each call starts over.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = Year> + Clone + '_ {
        self.years.iter().copied()
    }

    /// Oldest year, used for the initial selection.
    pub fn first(&self) -> Option<Year> {
        self.years.first().copied()
    }

    pub fn contains(&self, year: Year) -> bool {
        self.years.contains(&year)
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }
}
