// lib.rs - kinmat library root

//! # kinmat - Bit-packed centered-IBS kinship matrices for association mapping
//!
//! This library computes the Endelman & Jannink (2012) centered identity-by-state
//! kinship matrix from genotype tables. Every site is split into biallelic
//! pseudo-sites, genotypes are packed three bits per call, and pair sums are
//! accumulated by a bounded producer / worker pool / merge pipeline.
//!
//! ## Features
//!
//! - **Multiallelic sites**: haplotype sites with up to 255 states, SNPs with IUPAC codes
//! - **Deterministic**: fixed-point accumulation gives identical results for any worker count
//! - **Multiple formats**: HapMap and VCF input; TSV, CSV, PHYLIP, TASSEL, JSON and LZ4 binary output
//! - **Flexible filtering**: Sample filtering with regex and file lists
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use kinmat::prelude::*;
//!
//! let table = load_feature_table(std::path::Path::new("panel.hmp.txt"))?;
//! let kinship = EndelmanKinship::new(&table)
//!     .max_alleles(6)
//!     .num_workers(4)
//!     .build()?;
//! println!("K[0,1] = {}", kinship.get(0, 1));
//! # Ok::<(), kinmat::KinshipError>(())
//! ```

// Re-export all main modules
pub mod cli;
pub mod core;
pub mod data;
pub mod error;
pub mod output;

// Convenience prelude for common imports
pub mod prelude {
    pub use crate::cli::{validate_args, Args, ValidationResult};
    pub use crate::core::{centered_ibs, centered_ibs_reference};
    pub use crate::core::{EndelmanKinship, KinshipConfig, ProgressListener};
    pub use crate::data::{load_feature_table, DistanceMatrix, FeatureTable, TableSummary};
    pub use crate::data::{HaplotypeSiteBuilder, SnpSiteBuilder, TaxaListBuilder};
    pub use crate::error::{KinshipError, Result};
    pub use crate::output::{write_matrix, OutputFormat};
}

// Re-export main types at the root level for convenience
pub use core::{EndelmanKinship, KinshipConfig};
pub use data::{DistanceMatrix, FeatureTable};
pub use error::{KinshipError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library information
pub fn get_info() -> String {
    format!(
        "kinmat v{} - Centered-IBS kinship matrix calculator",
        VERSION
    )
}
