// config.rs - Configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    // Input/Output
    pub genotypes: Option<String>,
    pub output: Option<String>,
    pub format: Option<String>,

    // Kinship settings
    pub max_alleles: Option<usize>,
    pub reference: Option<bool>,

    // Performance
    pub threads: Option<usize>,
    pub work_queue_capacity: Option<usize>,
    pub result_queue_capacity: Option<usize>,

    // Sample filtering
    pub include_samples: Option<String>,
    pub exclude_samples: Option<String>,
    pub include_samples_list: Option<String>,
    pub exclude_samples_list: Option<String>,

    // Flags
    pub dry_run: Option<bool>,
    pub quiet: Option<bool>,
}

impl Config {
    /// Create a new empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?;

        println!("📄 Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), String> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        fs::write(path, content)
            .map_err(|e| format!("Failed to write config file '{}': {}", path.display(), e))?;

        println!("📄 Saved configuration to: {}", path.display());
        Ok(())
    }

    /// Generate a sample configuration file with comments
    pub fn generate_sample() -> String {
        r#"# kinmat.toml - Configuration file for kinmat
# Command line arguments will override these settings

# =============================================================================
# INPUT/OUTPUT
# =============================================================================

# Path to genotype file (.hmp.txt or .vcf)
genotypes = "/path/to/genotypes.hmp.txt"

# Output kinship matrix file
output = "kinship.tsv"

# Output format: tsv, csv, phylip, tassel, json, bin
format = "tsv"

# =============================================================================
# KINSHIP SETTINGS
# =============================================================================

# Maximum number of alleles considered per site (2-255).
# Alleles are ranked by count; the rarest considered allele is dropped.
max_alleles = 255

# Use the direct per-pair formula (slow, for cross-checking small inputs)
reference = false

# =============================================================================
# PERFORMANCE
# =============================================================================

# Number of worker threads (omit for available cores minus two)
# threads = 8

# Units of 3000 pseudo-sites buffered ahead of the workers
work_queue_capacity = 1000

# Worker results buffered ahead of the merge step
result_queue_capacity = 30

# =============================================================================
# SAMPLE FILTERING
# =============================================================================

# Include only samples matching regex pattern
# include_samples = "B7.*"

# Exclude samples matching regex pattern
# exclude_samples = "control.*"

# Include only samples listed in a file (one sample per line)
# include_samples_list = "samples.txt"

# Exclude samples listed in a file (one sample per line)
# exclude_samples_list = "exclude.txt"

# =============================================================================
# FLAGS
# =============================================================================

# Validate inputs without computation (dry run)
dry_run = false

# Hide the progress bar
quiet = false
"#
        .to_string()
    }
}
