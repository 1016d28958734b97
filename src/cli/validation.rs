// validation.rs - Input validation utilities

use crate::cli::args::Args;
use crate::core::{default_num_workers, KinshipConfig};
use crate::core::kinship::{DEFAULT_RESULT_QUEUE_CAPACITY, DEFAULT_WORK_QUEUE_CAPACITY};
use crate::data::taxa::Taxon;
use crate::data::GenotypeFormat;
use crate::output::OutputFormat;
use regex::Regex;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

pub struct ValidationResult {
    pub output_format: OutputFormat,
    pub kinship_config: KinshipConfig,
    pub sample_include_regex: Option<Regex>,
    pub sample_exclude_regex: Option<Regex>,
    pub samples_include_set: Option<HashSet<String>>,
    pub samples_exclude_set: Option<HashSet<String>>,
}

impl ValidationResult {
    /// True when any sample filter was given
    pub fn has_sample_filters(&self) -> bool {
        self.sample_include_regex.is_some()
            || self.sample_exclude_regex.is_some()
            || self.samples_include_set.is_some()
            || self.samples_exclude_set.is_some()
    }

    /// Apply include filters first, then exclude filters
    pub fn keep_taxon(&self, taxon: &Taxon) -> bool {
        let name = taxon.name();
        if let Some(regex) = &self.sample_include_regex {
            if !regex.is_match(name) {
                return false;
            }
        }
        if let Some(set) = &self.samples_include_set {
            if !set.contains(name) {
                return false;
            }
        }
        if let Some(regex) = &self.sample_exclude_regex {
            if regex.is_match(name) {
                return false;
            }
        }
        if let Some(set) = &self.samples_exclude_set {
            if set.contains(name) {
                return false;
            }
        }
        true
    }
}

/// Validate all command line arguments
pub fn validate_args(args: &Args) -> Result<ValidationResult, String> {
    // Validate genotype file
    if let Some(genotypes) = &args.genotypes {
        let path = Path::new(genotypes);
        if GenotypeFormat::from_path(path).is_none() {
            return Err(format!(
                "Unrecognized genotype file '{}': expected .hmp.txt or .vcf",
                genotypes
            ));
        }
        if !path.exists() {
            return Err(format!("Genotype file '{}' does not exist", genotypes));
        }
    }

    // Validate output format
    let output_format = OutputFormat::from_str(&args.format).map_err(|e| e.to_string())?;

    if args.threads == Some(0) {
        return Err("--threads must be at least 1".to_string());
    }

    let kinship_config = KinshipConfig {
        max_alleles: args.max_alleles,
        num_workers: args.threads.unwrap_or_else(default_num_workers),
        work_queue_capacity: args.work_queue_capacity.unwrap_or(DEFAULT_WORK_QUEUE_CAPACITY),
        result_queue_capacity: args
            .result_queue_capacity
            .unwrap_or(DEFAULT_RESULT_QUEUE_CAPACITY),
    };
    kinship_config.validate().map_err(|e| e.to_string())?;

    // Compile regex patterns
    let sample_include_regex = if let Some(pattern) = &args.include_samples {
        Some(Regex::new(pattern).map_err(|e| format!("Invalid include_samples regex: {}", e))?)
    } else {
        None
    };

    let sample_exclude_regex = if let Some(pattern) = &args.exclude_samples {
        Some(Regex::new(pattern).map_err(|e| format!("Invalid exclude_samples regex: {}", e))?)
    } else {
        None
    };

    // Load filter sets from files
    let samples_include_set = if let Some(file_path) = &args.include_samples_list {
        Some(load_set_from_file(file_path)?)
    } else {
        None
    };

    let samples_exclude_set = if let Some(file_path) = &args.exclude_samples_list {
        Some(load_set_from_file(file_path)?)
    } else {
        None
    };

    Ok(ValidationResult {
        output_format,
        kinship_config,
        sample_include_regex,
        sample_exclude_regex,
        samples_include_set,
        samples_exclude_set,
    })
}

/// Load a set of strings from a file (one per line)
fn load_set_from_file(file_path: &str) -> Result<HashSet<String>, String> {
    let file = File::open(file_path)
        .map_err(|e| format!("Failed to open filter file '{}': {}", file_path, e))?;

    let reader = BufReader::new(file);
    let mut set = HashSet::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| {
            format!("Failed to read line {} from '{}': {}", line_num + 1, file_path, e)
        })?;
        let trimmed = line.trim();
        if !trimmed.is_empty() && !trimmed.starts_with('#') {
            set.insert(trimmed.to_string());
        }
    }

    println!("📋 Loaded {} items from filter file '{}'", set.len(), file_path);
    Ok(set)
}
