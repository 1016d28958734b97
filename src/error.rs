// error.rs - Error types shared by the data model, loaders and kinship engine

use std::fmt;
use thiserror::Error;

/// Stage of the kinship pipeline in which a failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Producer,
    Worker,
    Merge,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStage::Producer => write!(f, "producer"),
            PipelineStage::Worker => write!(f, "worker"),
            PipelineStage::Merge => write!(f, "merge"),
        }
    }
}

#[derive(Debug, Error)]
pub enum KinshipError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Number of taxa: {expected} should match number of genotypes: {found}")]
    TaxaMismatch { expected: usize, found: usize },

    #[error("{0} not in taxa list")]
    UnknownTaxon(String),

    #[error("Taxon index {index} is out of range for {num_taxa} taxa")]
    TaxonIndexOutOfRange { index: usize, num_taxa: usize },

    #[error("{state} not on allele list: {allowed}")]
    UnknownState { state: String, allowed: String },

    #[error("Expected {expected} allele values per call but found {found}")]
    WrongPloidy { expected: usize, found: usize },

    #[error("A site can hold at most 255 distinct allele states")]
    TooManyStates,

    #[error("Failed to parse {path} line {line}: {message}")]
    Parse {
        path: String,
        line: usize,
        message: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Kinship computation failed in {stage} stage: {message}")]
    Pipeline {
        stage: PipelineStage,
        message: String,
    },

    #[error("No informative sites: every site is monomorphic or missing, so the kinship matrix cannot be normalized")]
    NoInformativeSites,
}

pub type Result<T> = std::result::Result<T, KinshipError>;
