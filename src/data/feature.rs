// feature.rs - Chromosomes and genomic features

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Chromosome name. Ordered numerically when both names are integers,
/// otherwise in natural order ("chr2" < "chr10").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Chromosome {
    name: String,
    number: Option<i64>,
}

impl Chromosome {
    pub fn new(name: &str) -> Self {
        let name = name.trim();
        Self {
            name: name.to_string(),
            number: name.parse::<i64>().ok(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn number(&self) -> Option<i64> {
        self.number
    }
}

impl Ord for Chromosome {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.number, other.number) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.name.cmp(&other.name)),
            _ => natord::compare(&self.name, &other.name),
        }
    }
}

impl PartialOrd for Chromosome {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Chromosome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Immutable descriptor of a site's genomic range.
///
/// Features order by start chromosome and start position. Remaining fields
/// break ties so that the ordering is total; sorting a table is stable, so
/// features that compare equal keep their insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GenomicFeature {
    pub start_chr: Chromosome,
    pub start_pos: i32,
    pub end_chr: Chromosome,
    pub end_pos: i32,
    pub name: Option<String>,
    pub id: Option<String>,
}

impl GenomicFeature {
    /// Single-position feature
    pub fn at(chr: Chromosome, pos: i32) -> Self {
        Self {
            end_chr: chr.clone(),
            start_chr: chr,
            start_pos: pos,
            end_pos: pos,
            name: None,
            id: None,
        }
    }

    /// Feature spanning `start_pos..=end_pos` on one chromosome
    pub fn range(chr: Chromosome, start_pos: i32, end_pos: i32) -> Self {
        Self {
            end_chr: chr.clone(),
            start_chr: chr,
            start_pos,
            end_pos,
            name: None,
            id: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Name if present, otherwise `chr:pos`
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("{}:{}", self.start_chr, self.start_pos),
        }
    }
}

impl Ord for GenomicFeature {
    fn cmp(&self, other: &Self) -> Ordering {
        self.start_chr
            .cmp(&other.start_chr)
            .then(self.start_pos.cmp(&other.start_pos))
            .then_with(|| self.end_chr.cmp(&other.end_chr))
            .then(self.end_pos.cmp(&other.end_pos))
            .then_with(|| self.name.cmp(&other.name))
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for GenomicFeature {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for GenomicFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.start_chr, self.start_pos, self.end_chr, self.end_pos
        )?;
        if let Some(name) = &self.name {
            write!(f, ":{}", name)?;
        }
        if let Some(id) = &self.id {
            write!(f, ":{}", id)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chromosome_ordering() {
        let mut chrs: Vec<Chromosome> = ["10", "2", "chr10", "chr2", "Pt", "1"]
            .iter()
            .map(|s| Chromosome::new(s))
            .collect();
        chrs.sort();
        let names: Vec<&str> = chrs.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["1", "2", "10", "Pt", "chr2", "chr10"]);
    }

    #[test]
    fn test_feature_ordering_by_chromosome_then_position() {
        let a = GenomicFeature::at(Chromosome::new("1"), 500);
        let b = GenomicFeature::at(Chromosome::new("1"), 1000);
        let c = GenomicFeature::at(Chromosome::new("2"), 10);
        assert!(a < b);
        assert!(b < c);

        let named = GenomicFeature::at(Chromosome::new("1"), 500).with_name("snp1");
        assert_ne!(a.cmp(&named), Ordering::Equal);
    }

    #[test]
    fn test_display() {
        let f = GenomicFeature::range(Chromosome::new("3"), 10, 20).with_name("hap7");
        assert_eq!(f.to_string(), "3:10-3:20:hap7");
        assert_eq!(f.label(), "hap7");
    }
}
