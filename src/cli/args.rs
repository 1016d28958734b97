// args.rs - Command line arguments definition

use argh::FromArgs;

#[derive(FromArgs)]
/// kinmat - Centered-IBS (Endelman) kinship matrix calculator
pub struct Args {
    /// path to genotype file (.hmp.txt or .vcf)
    #[argh(option)]
    pub genotypes: Option<String>,

    /// output kinship matrix file
    #[argh(option)]
    pub output: Option<String>,

    /// output format: tsv, csv, phylip, tassel, json, bin (default: tsv)
    #[argh(option, default = "String::from(\"tsv\")")]
    pub format: String,

    /// maximum number of alleles considered per site, 2-255 (default: 255)
    #[argh(option, default = "255")]
    pub max_alleles: usize,

    /// number of worker threads (default: available cores minus two)
    #[argh(option)]
    pub threads: Option<usize>,

    /// capacity of the work queue between producer and workers (default: 1000)
    #[argh(option)]
    pub work_queue_capacity: Option<usize>,

    /// capacity of the result queue ahead of the merge step (default: 30)
    #[argh(option)]
    pub result_queue_capacity: Option<usize>,

    /// include only samples matching regex pattern
    #[argh(option)]
    pub include_samples: Option<String>,

    /// exclude samples matching regex pattern
    #[argh(option)]
    pub exclude_samples: Option<String>,

    /// include only samples listed in a file (one sample per line)
    #[argh(option)]
    pub include_samples_list: Option<String>,

    /// exclude samples listed in a file (one sample per line)
    #[argh(option)]
    pub exclude_samples_list: Option<String>,

    /// show genotype summary statistics only, then exit
    #[argh(switch)]
    pub stats_only: bool,

    /// validate inputs without computation (dry run)
    #[argh(switch)]
    pub dry_run: bool,

    /// use the direct per-pair formula instead of the bit-packed engine
    #[argh(switch)]
    pub reference: bool,

    /// hide the progress bar
    #[argh(switch)]
    pub quiet: bool,

    /// enable debug logging
    #[argh(switch, short = 'v')]
    pub verbose: bool,

    /// path to TOML configuration file
    #[argh(option)]
    pub config: Option<String>,

    /// generate sample configuration file and exit
    #[argh(switch)]
    pub generate_config: bool,
}
