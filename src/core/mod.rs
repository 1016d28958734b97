// mod.rs - Core logic module

pub mod encoding;
pub mod kinship;
pub mod pseudo_site;
pub mod reference;

// Re-export main types for convenience
pub use kinship::{
    centered_ibs, default_num_workers, EndelmanKinship, KinshipConfig, ProgressListener,
    DEFAULT_MAX_ALLELES,
};
pub use pseudo_site::{pseudo_sites, table_pseudo_sites, PseudoSite};
pub use reference::centered_ibs_reference;
