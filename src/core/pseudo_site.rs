// pseudo_site.rs - Per-allele pseudo-sites derived from feature sites

use crate::data::site::{FeatureSite, UNKNOWN_ALLELE};
use crate::data::table::FeatureTable;

/// One allele of one site with its observed frequency
#[derive(Debug, Clone, Copy)]
pub struct PseudoSite<'a> {
    pub site: &'a FeatureSite,
    pub allele: u8,
    pub frequency: f64,
}

impl<'a> PseudoSite<'a> {
    /// Copies of this allele carried by `taxon`, or `None` when every copy
    /// is missing
    pub fn dosage(&self, taxon: usize) -> Option<u8> {
        dosage(self.site.genotype(taxon), self.allele)
    }
}

/// Count of copies equal to `allele`. Missing copies are ignored unless all
/// copies are missing.
pub fn dosage(alleles: &[u8], allele: u8) -> Option<u8> {
    if allele == UNKNOWN_ALLELE || alleles.iter().all(|&a| a == UNKNOWN_ALLELE) {
        return None;
    }
    Some(alleles.iter().filter(|&&a| a == allele).count() as u8)
}

/// Pseudo-sites of one site.
///
/// Alleles are ranked by count (ties by allele code). Only the first
/// `max_alleles` are considered and the last considered one, the rarest,
/// is dropped. Sites with fewer than two considered alleles yield nothing.
pub fn pseudo_sites(site: &FeatureSite, max_alleles: usize) -> Vec<PseudoSite<'_>> {
    let stats = site.allele_stats();
    let considered = stats.num_alleles().min(max_alleles);
    if considered < 2 {
        return Vec::new();
    }

    let total = stats.total_non_missing_alleles() as f64;
    stats.allele_counts()[..considered - 1]
        .iter()
        .map(|ac| PseudoSite {
            site,
            allele: ac.allele,
            frequency: ac.count as f64 / total,
        })
        .collect()
}

/// Number of pseudo-sites a site yields
pub fn count_pseudo_sites(site: &FeatureSite, max_alleles: usize) -> usize {
    site.allele_stats()
        .num_alleles()
        .min(max_alleles)
        .saturating_sub(1)
}

/// Pseudo-sites of every site of a table, in table order
pub fn table_pseudo_sites(
    table: &FeatureTable,
    max_alleles: usize,
) -> impl Iterator<Item = PseudoSite<'_>> {
    table
        .iter()
        .flat_map(move |site| pseudo_sites(site, max_alleles))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::feature::{Chromosome, GenomicFeature};
    use crate::data::site_builder::HaplotypeSiteBuilder;
    use crate::data::taxa::TaxaListBuilder;
    use std::sync::Arc;

    fn site(calls: &[&str]) -> FeatureSite {
        let taxa = (0..calls.len())
            .map(|i| format!("t{}", i))
            .collect::<TaxaListBuilder>()
            .build();
        let mut builder =
            HaplotypeSiteBuilder::new(GenomicFeature::at(Chromosome::new("1"), 1), Arc::clone(&taxa), 2)
                .unwrap();
        for (i, call) in calls.iter().enumerate() {
            builder.set_call(i, call).unwrap();
        }
        builder.build().unwrap()
    }

    #[test]
    fn test_rarest_allele_dropped() {
        // A=3, C=3, G=2: ties by code keep A before C
        let s = site(&["A/A", "A/C", "C/C", "G/G"]);
        let ps = pseudo_sites(&s, 255);
        assert_eq!(ps.len(), 2);
        assert_eq!(ps[0].allele, 0);
        assert_eq!(ps[1].allele, 1);
        assert!((ps[0].frequency - 3.0 / 8.0).abs() < 1e-12);
        assert_eq!(count_pseudo_sites(&s, 255), 2);
    }

    #[test]
    fn test_max_alleles_limits_considered_alleles() {
        let s = site(&["A/A", "A/C", "C/C", "G/G"]);
        let ps = pseudo_sites(&s, 2);
        assert_eq!(ps.len(), 1);
        assert_eq!(ps[0].allele, 0);
        // denominator still covers every non-missing copy
        assert!((ps[0].frequency - 3.0 / 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_monomorphic_and_missing_sites_yield_nothing() {
        assert!(pseudo_sites(&site(&["A/A", "A/A"]), 255).is_empty());
        assert!(pseudo_sites(&site(&["./.", "./."]), 255).is_empty());
    }

    #[test]
    fn test_dosage() {
        assert_eq!(dosage(&[1, 1], 1), Some(2));
        assert_eq!(dosage(&[0, 1], 1), Some(1));
        assert_eq!(dosage(&[0, 0], 1), Some(0));
        assert_eq!(dosage(&[UNKNOWN_ALLELE, 1], 1), Some(1));
        assert_eq!(dosage(&[UNKNOWN_ALLELE, 0], 1), Some(0));
        assert_eq!(dosage(&[UNKNOWN_ALLELE, UNKNOWN_ALLELE], 1), None);
    }
}
