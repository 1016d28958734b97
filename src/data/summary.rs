// summary.rs - Genotype summary statistics for a feature table

use crate::data::site::UNKNOWN_ALLELE;
use crate::data::table::FeatureTable;
use serde::Serialize;
use std::fmt;

/// Whole-table genotype summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSummary {
    pub num_sites: usize,
    pub num_taxa: usize,
    pub total_gametes: u64,
    pub missing_gametes: u64,
    pub heterozygous_calls: u64,
    pub polymorphic_sites: usize,
    pub mean_minor_allele_frequency: f64,
}

impl TableSummary {
    pub fn from_table(table: &FeatureTable) -> Self {
        let mut total_gametes = 0u64;
        let mut missing_gametes = 0u64;
        let mut heterozygous_calls = 0u64;
        let mut polymorphic_sites = 0usize;
        let mut maf_sum = 0.0;

        for site in table {
            for alleles in site.genotypes() {
                total_gametes += alleles.len() as u64;
                missing_gametes += alleles.iter().filter(|&&a| a == UNKNOWN_ALLELE).count() as u64;
            }
            heterozygous_calls += site.heterozygous_count() as u64;

            let stats = site.allele_stats();
            maf_sum += stats.minor_allele_frequency();
            if stats.num_alleles() > 1 {
                polymorphic_sites += 1;
            }
        }

        let num_sites = table.num_features();
        Self {
            num_sites,
            num_taxa: table.num_taxa(),
            total_gametes,
            missing_gametes,
            heterozygous_calls,
            polymorphic_sites,
            mean_minor_allele_frequency: if num_sites == 0 {
                0.0
            } else {
                maf_sum / num_sites as f64
            },
        }
    }

    pub fn proportion_missing(&self) -> f64 {
        ratio(self.missing_gametes, self.total_gametes)
    }

    /// Heterozygous calls over all genotype calls
    pub fn proportion_heterozygous(&self) -> f64 {
        ratio(
            self.heterozygous_calls,
            (self.num_sites as u64) * (self.num_taxa as u64),
        )
    }
}

fn ratio(num: u64, den: u64) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

impl fmt::Display for TableSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Number of taxa:            {}", self.num_taxa)?;
        writeln!(f, "Number of sites:           {}", self.num_sites)?;
        writeln!(f, "Polymorphic sites:         {}", self.polymorphic_sites)?;
        writeln!(f, "Sites x taxa:              {}", self.num_sites * self.num_taxa)?;
        writeln!(
            f,
            "Gametes missing:           {} ({:.4})",
            self.missing_gametes,
            self.proportion_missing()
        )?;
        writeln!(
            f,
            "Heterozygous calls:        {} ({:.4})",
            self.heterozygous_calls,
            self.proportion_heterozygous()
        )?;
        write!(
            f,
            "Mean minor allele freq:    {:.4}",
            self.mean_minor_allele_frequency
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::feature::{Chromosome, GenomicFeature};
    use crate::data::site_builder::SnpSiteBuilder;
    use crate::data::table::FeatureTableBuilder;
    use crate::data::taxa::TaxaListBuilder;
    use std::sync::Arc;

    #[test]
    fn test_summary_counts() {
        let taxa = ["a", "b"].iter().collect::<TaxaListBuilder>().build();
        let mut builder = FeatureTableBuilder::new(Arc::clone(&taxa));
        for (pos, calls) in [(1, ["A", "R"]), (2, ["N", "C"])] {
            let mut site =
                SnpSiteBuilder::new(GenomicFeature::at(Chromosome::new("1"), pos), Arc::clone(&taxa));
            site.set_call(0, calls[0]).unwrap();
            site.set_call(1, calls[1]).unwrap();
            builder.add(site.build().unwrap()).unwrap();
        }
        let summary = TableSummary::from_table(&builder.build());

        assert_eq!(summary.num_sites, 2);
        assert_eq!(summary.total_gametes, 8);
        assert_eq!(summary.missing_gametes, 2);
        assert_eq!(summary.heterozygous_calls, 1);
        assert_eq!(summary.polymorphic_sites, 1);
        assert!((summary.proportion_missing() - 0.25).abs() < 1e-12);
        assert!((summary.proportion_heterozygous() - 0.25).abs() < 1e-12);
        // site 1: A=3, G=1 -> maf 0.25; site 2 monomorphic -> 0
        assert!((summary.mean_minor_allele_frequency - 0.125).abs() < 1e-12);
    }
}
