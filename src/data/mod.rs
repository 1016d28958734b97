// mod.rs - Genotype data model: taxa, features, sites, tables and matrices

pub mod allele_stats;
pub mod feature;
pub mod loaders;
pub mod matrix;
pub mod nucleotide;
pub mod site;
pub mod site_builder;
pub mod summary;
pub mod table;
pub mod taxa;

// Re-export main types for convenience
pub use allele_stats::{AlleleCount, AlleleStats};
pub use feature::{Chromosome, GenomicFeature};
pub use loaders::{load_feature_table, GenotypeFormat};
pub use matrix::{DistanceMatrix, MatrixRecord};
pub use site::{FeatureSite, HaplotypeAnnotation, SiteVariant, UNKNOWN_ALLELE};
pub use site_builder::{HaplotypeSiteBuilder, SnpSiteBuilder};
pub use summary::TableSummary;
pub use table::{FeatureTable, FeatureTableBuilder};
pub use taxa::{TaxaList, TaxaListBuilder, Taxon};
