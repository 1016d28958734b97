// table.rs - Position-sorted collection of feature sites over one taxa list

use crate::data::site::FeatureSite;
use crate::data::taxa::{TaxaList, Taxon};
use crate::error::{KinshipError, Result};
use std::sync::Arc;

/// Immutable, position-sorted list of sites sharing one taxa registry.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    taxa: Arc<TaxaList>,
    sites: Vec<FeatureSite>,
}

impl FeatureTable {
    pub fn taxa(&self) -> &Arc<TaxaList> {
        &self.taxa
    }

    pub fn num_taxa(&self) -> usize {
        self.taxa.len()
    }

    pub fn num_features(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn site(&self, index: usize) -> Option<&FeatureSite> {
        self.sites.get(index)
    }

    pub fn sites(&self) -> &[FeatureSite] {
        &self.sites
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FeatureSite> {
        self.sites.iter()
    }

    /// Drop every cached allele statistic in the table
    pub fn clear_allele_stats(&mut self) {
        for site in &mut self.sites {
            site.clear_allele_stats();
        }
    }

    /// New table restricted to the taxa matching `keep`, in registry order
    pub fn retain_taxa<F>(&self, keep: F) -> Result<FeatureTable>
    where
        F: Fn(&Taxon) -> bool,
    {
        let indices: Vec<usize> = self
            .taxa
            .iter()
            .enumerate()
            .filter(|(_, taxon)| keep(taxon))
            .map(|(i, _)| i)
            .collect();

        if indices.len() == self.taxa.len() {
            return Ok(self.clone());
        }

        let taxa = self.taxa.subset(&indices);
        let sites = self
            .sites
            .iter()
            .map(|site| site.subset_taxa(Arc::clone(&taxa), &indices))
            .collect::<Result<Vec<_>>>()?;

        log::debug!(
            "Retained {} of {} taxa across {} sites",
            taxa.len(),
            self.taxa.len(),
            sites.len()
        );
        Ok(FeatureTable { taxa, sites })
    }
}

impl<'a> IntoIterator for &'a FeatureTable {
    type Item = &'a FeatureSite;
    type IntoIter = std::slice::Iter<'a, FeatureSite>;

    fn into_iter(self) -> Self::IntoIter {
        self.sites.iter()
    }
}

/// Accumulates sites, then sorts them into a [`FeatureTable`].
///
/// Every site must have been built against the builder's taxa registry,
/// either the same `Arc` or an identical list.
#[derive(Debug)]
pub struct FeatureTableBuilder {
    taxa: Arc<TaxaList>,
    sites: Vec<FeatureSite>,
}

impl FeatureTableBuilder {
    pub fn new(taxa: Arc<TaxaList>) -> Self {
        Self {
            taxa,
            sites: Vec::new(),
        }
    }

    pub fn with_capacity(taxa: Arc<TaxaList>, capacity: usize) -> Self {
        Self {
            taxa,
            sites: Vec::with_capacity(capacity),
        }
    }

    pub fn add(&mut self, site: FeatureSite) -> Result<&mut Self> {
        if !Arc::ptr_eq(site.taxa(), &self.taxa) && **site.taxa() != *self.taxa {
            return Err(KinshipError::TaxaMismatch {
                expected: self.taxa.len(),
                found: site.num_taxa(),
            });
        }
        self.sites.push(site);
        Ok(self)
    }

    pub fn add_all<I>(&mut self, sites: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = FeatureSite>,
    {
        for site in sites {
            self.add(site)?;
        }
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Stable sort by feature; sites at identical features keep insertion order
    pub fn build(mut self) -> FeatureTable {
        self.sites.sort_by(|a, b| a.feature().cmp(b.feature()));
        FeatureTable {
            taxa: self.taxa,
            sites: self.sites,
        }
    }
}
