// site.rs - Feature sites: per-taxon allele arrays at one genomic feature

use crate::data::allele_stats::AlleleStats;
use crate::data::feature::GenomicFeature;
use crate::data::nucleotide;
use crate::data::taxa::TaxaList;
use crate::error::{KinshipError, Result};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};

/// Allele code reserved for a missing allele copy
pub const UNKNOWN_ALLELE: u8 = 0xFF;
pub const UNKNOWN_ALLELE_STR: &str = "N";

/// Row-major `taxa × ploidy` allele codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenotypeMatrix {
    num_rows: usize,
    ploidy: usize,
    values: Vec<u8>,
}

impl GenotypeMatrix {
    /// Matrix with every allele copy missing
    pub fn missing(num_rows: usize, ploidy: usize) -> Self {
        Self {
            num_rows,
            ploidy,
            values: vec![UNKNOWN_ALLELE; num_rows * ploidy],
        }
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn ploidy(&self) -> usize {
        self.ploidy
    }

    pub fn row(&self, row: usize) -> &[u8] {
        let start = row * self.ploidy;
        &self.values[start..start + self.ploidy]
    }

    /// Caller guarantees `row < num_rows` and `alleles.len() == ploidy`
    pub(crate) fn set_row(&mut self, row: usize, alleles: &[u8]) {
        let start = row * self.ploidy;
        self.values[start..start + self.ploidy].copy_from_slice(alleles);
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.values.chunks_exact(self.ploidy.max(1)).take(self.num_rows)
    }
}

/// Assembly origin of a haplotype state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HaplotypeAnnotation {
    pub taxon: String,
    pub asm_contig: String,
    pub asm_start: i32,
    pub asm_end: i32,
}

/// The closed set of site encodings
#[derive(Debug, Clone, PartialEq)]
pub enum SiteVariant {
    /// Diploid nucleotide calls (A, C, G, T, +, -)
    Snp,
    /// Arbitrary named states; allele code `i` is `states[i]`
    Haplotype {
        states: Vec<String>,
        annotations: Option<Vec<Option<HaplotypeAnnotation>>>,
    },
}

/// Genotype calls of every taxon at one genomic feature.
///
/// Immutable once built. Allele statistics are computed on first use and
/// cached in the site until [`FeatureSite::clear_allele_stats`] is called.
#[derive(Debug, Clone)]
pub struct FeatureSite {
    feature: GenomicFeature,
    taxa: Arc<TaxaList>,
    genotypes: GenotypeMatrix,
    weight: Option<f64>,
    phased: bool,
    variant: SiteVariant,
    allele_stats: OnceLock<AlleleStats>,
}

impl FeatureSite {
    pub(crate) fn new(
        feature: GenomicFeature,
        taxa: Arc<TaxaList>,
        genotypes: GenotypeMatrix,
        weight: Option<f64>,
        phased: bool,
        variant: SiteVariant,
    ) -> Result<Self> {
        if taxa.len() != genotypes.num_rows() {
            return Err(KinshipError::TaxaMismatch {
                expected: taxa.len(),
                found: genotypes.num_rows(),
            });
        }
        Ok(Self {
            feature,
            taxa,
            genotypes,
            weight,
            phased,
            variant,
            allele_stats: OnceLock::new(),
        })
    }

    pub fn feature(&self) -> &GenomicFeature {
        &self.feature
    }

    pub fn taxa(&self) -> &Arc<TaxaList> {
        &self.taxa
    }

    pub fn num_taxa(&self) -> usize {
        self.genotypes.num_rows()
    }

    /// Allele copies per taxon (2 for diploid)
    pub fn ploidy(&self) -> usize {
        self.genotypes.ploidy()
    }

    pub fn weight(&self) -> Option<f64> {
        self.weight
    }

    pub fn is_phased(&self) -> bool {
        self.phased
    }

    pub fn variant(&self) -> &SiteVariant {
        &self.variant
    }

    pub fn is_snp(&self) -> bool {
        matches!(self.variant, SiteVariant::Snp)
    }

    /// Allele codes of one taxon, `ploidy()` long.
    ///
    /// Panics if `taxon >= num_taxa()`.
    pub fn genotype(&self, taxon: usize) -> &[u8] {
        self.genotypes.row(taxon)
    }

    pub fn try_genotype(&self, taxon: usize) -> Result<&[u8]> {
        if taxon >= self.num_taxa() {
            return Err(KinshipError::TaxonIndexOutOfRange {
                index: taxon,
                num_taxa: self.num_taxa(),
            });
        }
        Ok(self.genotypes.row(taxon))
    }

    /// Genotypes of all taxa in taxa order
    pub fn genotypes(&self) -> impl Iterator<Item = &[u8]> {
        self.genotypes.rows()
    }

    pub fn genotype_as_string(&self, taxon: usize) -> String {
        let alleles = self.genotype(taxon);
        match &self.variant {
            SiteVariant::Snp => nucleotide::diploid_iupac([alleles[0], alleles[1]]),
            SiteVariant::Haplotype { states, .. } => {
                let separator = if self.phased { "|" } else { "/" };
                alleles
                    .iter()
                    .map(|&code| {
                        if code == UNKNOWN_ALLELE {
                            UNKNOWN_ALLELE_STR
                        } else {
                            states
                                .get(code as usize)
                                .map(String::as_str)
                                .unwrap_or(UNKNOWN_ALLELE_STR)
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(separator)
            }
        }
    }

    /// State strings of a haplotype site
    pub fn states(&self) -> Option<&[String]> {
        match &self.variant {
            SiteVariant::Haplotype { states, .. } => Some(states),
            SiteVariant::Snp => None,
        }
    }

    /// Annotation for an allele code, if this is an annotated haplotype site
    pub fn haplotype_annotation(&self, allele: u8) -> Option<&HaplotypeAnnotation> {
        match &self.variant {
            SiteVariant::Haplotype {
                annotations: Some(annotations),
                ..
            } => annotations.get(allele as usize).and_then(|a| a.as_ref()),
            _ => None,
        }
    }

    pub fn allele_stats(&self) -> &AlleleStats {
        self.allele_stats
            .get_or_init(|| AlleleStats::from_genotypes(self.genotypes.rows()))
    }

    /// Drop cached allele statistics; they are recomputed on next access
    pub fn clear_allele_stats(&mut self) {
        self.allele_stats.take();
    }

    /// Number of taxa carrying more than one distinct non-missing allele
    pub fn heterozygous_count(&self) -> usize {
        self.genotypes()
            .filter(|alleles| {
                let mut first = None;
                alleles.iter().filter(|&&a| a != UNKNOWN_ALLELE).any(|&a| match first {
                    None => {
                        first = Some(a);
                        false
                    }
                    Some(f) => f != a,
                })
            })
            .count()
    }

    /// Rebuild this site for `taxa`, taking genotype rows at `indices`
    pub fn subset_taxa(&self, taxa: Arc<TaxaList>, indices: &[usize]) -> Result<FeatureSite> {
        let mut genotypes = GenotypeMatrix::missing(indices.len(), self.ploidy());
        for (row, &taxon) in indices.iter().enumerate() {
            genotypes.set_row(row, self.try_genotype(taxon)?);
        }
        FeatureSite::new(
            self.feature.clone(),
            taxa,
            genotypes,
            self.weight,
            self.phased,
            self.variant.clone(),
        )
    }
}

impl PartialEq for FeatureSite {
    fn eq(&self, other: &Self) -> bool {
        self.feature == other.feature
            && self.genotypes == other.genotypes
            && self.variant == other.variant
            && self.phased == other.phased
            && self.weight == other.weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::feature::Chromosome;
    use crate::data::taxa::TaxaListBuilder;

    fn taxa(n: usize) -> Arc<TaxaList> {
        (0..n).map(|i| format!("t{}", i)).collect::<TaxaListBuilder>().build()
    }

    #[test]
    fn test_rows_must_match_taxa() {
        let err = FeatureSite::new(
            GenomicFeature::at(Chromosome::new("1"), 1),
            taxa(3),
            GenotypeMatrix::missing(2, 2),
            None,
            false,
            SiteVariant::Snp,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            KinshipError::TaxaMismatch {
                expected: 3,
                found: 2
            }
        ));
    }

    #[test]
    fn test_heterozygous_count_ignores_missing() {
        let mut genotypes = GenotypeMatrix::missing(4, 2);
        genotypes.set_row(0, &[0, 1]);
        genotypes.set_row(1, &[1, 1]);
        genotypes.set_row(2, &[0, UNKNOWN_ALLELE]);
        genotypes.set_row(3, &[2, 0]);
        let site = FeatureSite::new(
            GenomicFeature::at(Chromosome::new("1"), 1),
            taxa(4),
            genotypes,
            None,
            false,
            SiteVariant::Snp,
        )
        .unwrap();
        assert_eq!(site.heterozygous_count(), 2);
    }

    #[test]
    fn test_allele_stats_cache_can_be_cleared() {
        let mut genotypes = GenotypeMatrix::missing(2, 2);
        genotypes.set_row(0, &[0, 0]);
        genotypes.set_row(1, &[0, 1]);
        let mut site = FeatureSite::new(
            GenomicFeature::at(Chromosome::new("1"), 1),
            taxa(2),
            genotypes,
            None,
            false,
            SiteVariant::Snp,
        )
        .unwrap();
        let before = site.allele_stats().clone();
        site.clear_allele_stats();
        assert_eq!(site.allele_stats(), &before);
        assert_eq!(before.major_allele(), 0);
    }
}
