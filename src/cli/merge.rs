// merge.rs - Merge configuration file with CLI arguments

use crate::cli::{Args, Config};
use crate::core::DEFAULT_MAX_ALLELES;

impl Args {
    /// Merge with configuration from file
    /// CLI arguments take precedence over config file values
    pub fn merge_with_config(mut self, config: Config) -> Self {
        // Input/Output
        if self.genotypes.is_none() {
            self.genotypes = config.genotypes;
        }
        if self.output.is_none() {
            self.output = config.output;
        }

        // Settings with defaults (only override defaults, not explicit CLI values)
        if let Some(format) = config.format {
            if self.format == "tsv" {
                self.format = format;
            }
        }
        if let Some(max_alleles) = config.max_alleles {
            if self.max_alleles == DEFAULT_MAX_ALLELES {
                self.max_alleles = max_alleles;
            }
        }

        // Performance
        if self.threads.is_none() {
            self.threads = config.threads;
        }
        if self.work_queue_capacity.is_none() {
            self.work_queue_capacity = config.work_queue_capacity;
        }
        if self.result_queue_capacity.is_none() {
            self.result_queue_capacity = config.result_queue_capacity;
        }

        // Sample filtering
        if self.include_samples.is_none() {
            self.include_samples = config.include_samples;
        }
        if self.exclude_samples.is_none() {
            self.exclude_samples = config.exclude_samples;
        }
        if self.include_samples_list.is_none() {
            self.include_samples_list = config.include_samples_list;
        }
        if self.exclude_samples_list.is_none() {
            self.exclude_samples_list = config.exclude_samples_list;
        }

        // Flags (CLI flags take precedence, config only sets if not explicitly set)
        if !self.reference && config.reference.unwrap_or(false) {
            self.reference = true;
        }
        if !self.dry_run && config.dry_run.unwrap_or(false) {
            self.dry_run = true;
        }
        if !self.quiet && config.quiet.unwrap_or(false) {
            self.quiet = true;
        }

        self
    }

    /// Load configuration and merge with CLI args
    pub fn with_config_file(self, config_path: &str) -> Result<Self, String> {
        let config = Config::from_file(config_path)?;
        Ok(self.merge_with_config(config))
    }
}
