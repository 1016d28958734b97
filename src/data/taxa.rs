// taxa.rs - Taxa registry: ordered, de-duplicated sample identifiers

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A single sample identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Taxon {
    name: String,
}

impl Taxon {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Taxon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Ordered set of taxa. A taxon's index is its position and never changes
/// for the lifetime of the list.
#[derive(Debug, PartialEq, Eq)]
pub struct TaxaList {
    taxa: Vec<Taxon>,
    index: HashMap<String, usize>,
}

impl TaxaList {
    /// Number of taxa
    pub fn len(&self) -> usize {
        self.taxa.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taxa.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Taxon> {
        self.taxa.get(index)
    }

    /// Look up a taxon's index by name
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Taxon> {
        self.taxa.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.taxa.iter().map(|t| t.name()).collect()
    }

    /// Derive a new list holding the taxa at `indices`, in that order.
    /// Out-of-range indices are ignored.
    pub fn subset(&self, indices: &[usize]) -> Arc<TaxaList> {
        let mut builder = TaxaListBuilder::new();
        for &i in indices {
            if let Some(taxon) = self.taxa.get(i) {
                builder.add(taxon.clone());
            }
        }
        builder.build()
    }
}

/// Builder for [`TaxaList`]; duplicates are dropped on insertion
#[derive(Debug, Default)]
pub struct TaxaListBuilder {
    taxa: Vec<Taxon>,
    index: HashMap<String, usize>,
}

impl TaxaListBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a taxon. Returns false (and keeps the first occurrence) when a
    /// taxon with the same name was already added.
    pub fn add(&mut self, taxon: Taxon) -> bool {
        if self.index.contains_key(taxon.name()) {
            log::warn!("Duplicate taxon '{}' ignored", taxon.name());
            return false;
        }
        self.index.insert(taxon.name.clone(), self.taxa.len());
        self.taxa.push(taxon);
        true
    }

    pub fn add_name(&mut self, name: &str) -> bool {
        self.add(Taxon::new(name))
    }

    pub fn len(&self) -> usize {
        self.taxa.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taxa.is_empty()
    }

    pub fn build(self) -> Arc<TaxaList> {
        Arc::new(TaxaList {
            taxa: self.taxa,
            index: self.index,
        })
    }
}

impl<S: AsRef<str>> FromIterator<S> for TaxaListBuilder {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut builder = TaxaListBuilder::new();
        for name in iter {
            builder.add_name(name.as_ref());
        }
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_keeps_first_occurrence() {
        let mut builder = TaxaListBuilder::new();
        assert!(builder.add_name("B73"));
        assert!(builder.add_name("Mo17"));
        assert!(!builder.add_name("B73"));
        let taxa = builder.build();

        assert_eq!(taxa.len(), 2);
        assert_eq!(taxa.index_of("B73"), Some(0));
        assert_eq!(taxa.index_of("Mo17"), Some(1));
        assert_eq!(taxa.index_of("W22"), None);
    }

    #[test]
    fn test_subset_preserves_requested_order() {
        let taxa = ["a", "b", "c", "d"].iter().collect::<TaxaListBuilder>().build();
        let subset = taxa.subset(&[3, 1, 9]);
        assert_eq!(subset.names(), vec!["d", "b"]);
        assert_eq!(subset.index_of("b"), Some(1));
    }
}
