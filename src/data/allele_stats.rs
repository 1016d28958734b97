// allele_stats.rs - Per-site allele counts and frequencies

use crate::data::site::UNKNOWN_ALLELE;

/// Count of one allele code across all allele copies of a site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlleleCount {
    pub allele: u8,
    pub count: u32,
}

/// Allele counts of a site, sorted by descending count. Ties are ordered by
/// ascending allele code. The missing sentinel is never counted.
#[derive(Debug, Clone, PartialEq)]
pub struct AlleleStats {
    allele_counts: Vec<AlleleCount>,
    total_non_missing: u32,
}

impl AlleleStats {
    /// Tally every allele copy of every genotype
    pub fn from_genotypes<'a>(genotypes: impl Iterator<Item = &'a [u8]>) -> Self {
        let mut counts = [0u32; 256];
        for alleles in genotypes {
            for &allele in alleles {
                counts[allele as usize] += 1;
            }
        }

        let mut allele_counts: Vec<AlleleCount> = counts[..UNKNOWN_ALLELE as usize]
            .iter()
            .enumerate()
            .filter(|&(_, &count)| count != 0)
            .map(|(allele, &count)| AlleleCount {
                allele: allele as u8,
                count,
            })
            .collect();
        // Stable sort over ascending allele codes keeps ties in code order
        allele_counts.sort_by(|a, b| b.count.cmp(&a.count));

        let total_non_missing = allele_counts.iter().map(|a| a.count).sum();

        Self {
            allele_counts,
            total_non_missing,
        }
    }

    pub fn allele_counts(&self) -> &[AlleleCount] {
        &self.allele_counts
    }

    /// Number of distinct non-missing alleles
    pub fn num_alleles(&self) -> usize {
        self.allele_counts.len()
    }

    /// Total non-missing allele copies (gametes) at the site
    pub fn total_non_missing_alleles(&self) -> u32 {
        self.total_non_missing
    }

    pub fn major_allele(&self) -> u8 {
        self.allele_counts
            .first()
            .map(|a| a.allele)
            .unwrap_or(UNKNOWN_ALLELE)
    }

    pub fn major_allele_frequency(&self) -> f64 {
        self.allele_counts
            .first()
            .map(|a| self.fraction(a.count))
            .unwrap_or(0.0)
    }

    pub fn minor_allele(&self) -> u8 {
        self.allele_counts
            .get(1)
            .map(|a| a.allele)
            .unwrap_or(UNKNOWN_ALLELE)
    }

    pub fn minor_allele_frequency(&self) -> f64 {
        self.allele_counts
            .get(1)
            .map(|a| self.fraction(a.count))
            .unwrap_or(0.0)
    }

    /// Frequency of `allele` among non-missing copies
    pub fn frequency(&self, allele: u8) -> f64 {
        self.allele_counts
            .iter()
            .find(|a| a.allele == allele)
            .map(|a| self.fraction(a.count))
            .unwrap_or(0.0)
    }

    fn fraction(&self, count: u32) -> f64 {
        if self.total_non_missing == 0 {
            0.0
        } else {
            count as f64 / self.total_non_missing as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(calls: &[[u8; 2]]) -> AlleleStats {
        AlleleStats::from_genotypes(calls.iter().map(|c| &c[..]))
    }

    #[test]
    fn test_counts_every_copy_and_skips_missing() {
        let s = stats(&[[0, 0], [0, 1], [1, 1], [UNKNOWN_ALLELE, 1], [UNKNOWN_ALLELE; 2]]);
        assert_eq!(s.num_alleles(), 2);
        assert_eq!(s.total_non_missing_alleles(), 7);
        assert_eq!(s.major_allele(), 1);
        assert_eq!(s.minor_allele(), 0);
        assert!((s.major_allele_frequency() - 4.0 / 7.0).abs() < 1e-12);
        assert!((s.minor_allele_frequency() - 3.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_ties_ordered_by_allele_code() {
        let s = stats(&[[3, 1], [2, 0]]);
        let order: Vec<u8> = s.allele_counts().iter().map(|a| a.allele).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_sentinels_when_too_few_alleles() {
        let empty = stats(&[[UNKNOWN_ALLELE; 2]]);
        assert_eq!(empty.major_allele(), UNKNOWN_ALLELE);
        assert_eq!(empty.minor_allele(), UNKNOWN_ALLELE);
        assert_eq!(empty.major_allele_frequency(), 0.0);

        let mono = stats(&[[2, 2], [2, 2]]);
        assert_eq!(mono.major_allele(), 2);
        assert_eq!(mono.minor_allele(), UNKNOWN_ALLELE);
        assert_eq!(mono.minor_allele_frequency(), 0.0);
    }
}
