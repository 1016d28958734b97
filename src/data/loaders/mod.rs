// mod.rs - Genotype file loaders producing feature tables

pub mod hapmap;
pub mod vcf;

use crate::data::table::FeatureTable;
use crate::error::{KinshipError, Result};
use std::path::Path;

pub use hapmap::load_hapmap;
pub use vcf::load_vcf;

/// Supported genotype file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenotypeFormat {
    HapMap,
    Vcf,
}

impl GenotypeFormat {
    /// Guess the format from the file name (`.hmp.txt`, `.hmp`, `.vcf`)
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_ascii_lowercase();
        if name.ends_with(".hmp.txt") || name.ends_with(".hmp") {
            Some(GenotypeFormat::HapMap)
        } else if name.ends_with(".vcf") {
            Some(GenotypeFormat::Vcf)
        } else {
            None
        }
    }
}

/// Load a feature table, choosing the reader from the file extension
pub fn load_feature_table(path: &Path) -> Result<FeatureTable> {
    match GenotypeFormat::from_path(path) {
        Some(GenotypeFormat::HapMap) => load_hapmap(path),
        Some(GenotypeFormat::Vcf) => load_vcf(path),
        None => Err(KinshipError::Config(format!(
            "Unrecognized genotype file extension: {} (expected .hmp.txt or .vcf)",
            path.display()
        ))),
    }
}

pub(crate) fn parse_error(path: &Path, line: usize, message: impl Into<String>) -> KinshipError {
    KinshipError::Parse {
        path: path.display().to_string(),
        line,
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            GenotypeFormat::from_path(Path::new("data/maize.hmp.txt")),
            Some(GenotypeFormat::HapMap)
        );
        assert_eq!(
            GenotypeFormat::from_path(Path::new("HAPS.VCF")),
            Some(GenotypeFormat::Vcf)
        );
        assert_eq!(GenotypeFormat::from_path(Path::new("profiles.tsv")), None);
    }
}
