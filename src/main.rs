// main.rs - CLI entry point

use indicatif::{ProgressBar, ProgressStyle};
use kinmat::cli::{validate_args, Args, Config};
use kinmat::core::{centered_ibs_reference, EndelmanKinship, ProgressListener};
use kinmat::data::{load_feature_table, TableSummary};
use kinmat::output::write_matrix;
use std::path::Path;
use std::time::Instant;

fn main() {
    if let Err(e) = run_main() {
        eprintln!("❌ ERROR: {}", e);
        std::process::exit(1);
    }
}

/// Forwards engine progress to a terminal progress bar
struct BarListener {
    bar: ProgressBar,
}

impl BarListener {
    fn new() -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓▒░ "),
        );
        Self { bar }
    }
}

impl ProgressListener for BarListener {
    fn progress(&self, percent: u8, message: Option<&str>) {
        self.bar.set_position(percent as u64);
        if let Some(message) = message {
            self.bar.set_message(message.to_string());
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_level),
    )
    .format_timestamp(None)
    .try_init();
}

fn run_main() -> Result<(), String> {
    let mut args: Args = argh::from_env();
    let command_line = std::env::args().collect::<Vec<String>>().join(" ");

    // Handle generate config first
    if args.generate_config {
        let sample_config = Config::generate_sample();
        println!("{}", sample_config);
        println!("\n💡 Save this content to a .toml file and use --config /path/to/config.toml");
        return Ok(());
    }

    init_logging(args.verbose);

    // Load configuration file if specified
    if let Some(config_path) = args.config.clone() {
        args = args.with_config_file(&config_path)?;
    }

    let genotypes = args
        .genotypes
        .clone()
        .ok_or("--genotypes is required")?;
    let output = if args.stats_only || args.dry_run {
        None
    } else {
        Some(args.output.clone().ok_or("--output is required")?)
    };

    println!("🚀 kinmat v{}", env!("CARGO_PKG_VERSION"));

    // Validate all arguments
    let validation_result = validate_args(&args)?;
    let kinship_config = validation_result.kinship_config.clone();
    println!("🧵 Workers: {}", kinship_config.num_workers);
    println!("🧬 Max alleles per site: {}", kinship_config.max_alleles);

    let total_start = Instant::now();

    // Load genotypes
    println!("📂 Loading genotypes from {}...", genotypes);
    let mut table = load_feature_table(Path::new(&genotypes)).map_err(|e| e.to_string())?;
    println!(
        "✅ Loaded {} sites × {} taxa",
        table.num_features(),
        table.num_taxa()
    );

    if validation_result.has_sample_filters() {
        table = table
            .retain_taxa(|taxon| validation_result.keep_taxon(taxon))
            .map_err(|e| e.to_string())?;
        println!("🔍 Sample filters kept {} taxa", table.num_taxa());
    }

    if table.num_taxa() == 0 {
        return Err("No taxa left after filtering".to_string());
    }

    if args.dry_run {
        println!("✅ Dry run completed successfully");
        println!(
            "📊 Final table: {} sites × {} taxa",
            table.num_features(),
            table.num_taxa()
        );
        return Ok(());
    }

    // Handle stats-only mode
    if args.stats_only {
        println!("\n📈 === GENOTYPE SUMMARY ===");
        println!("{}", TableSummary::from_table(&table));
        println!("\n✅ Statistics analysis completed");
        return Ok(());
    }

    println!("\n🔄 Computing centered-IBS kinship matrix...");
    let compute_start = Instant::now();
    let matrix = if args.reference {
        println!("📐 Using direct per-pair formula");
        centered_ibs_reference(&table, kinship_config.max_alleles)
    } else if args.quiet {
        EndelmanKinship::new(&table)
            .with_config(kinship_config)
            .build()
    } else {
        let listener = BarListener::new();
        let result = EndelmanKinship::new(&table)
            .with_config(kinship_config)
            .with_listener(&listener)
            .build();
        listener.bar.finish_and_clear();
        result
    }
    .map_err(|e| e.to_string())?;
    println!(
        "✅ Kinship computed in {:.2}s",
        compute_start.elapsed().as_secs_f64()
    );

    // Write output
    if let Some(output_path) = output {
        write_matrix(
            Path::new(&output_path),
            validation_result.output_format,
            &matrix,
            &command_line,
        )
        .map_err(|e| format!("writing output: {}", e))?;
        println!("✅ Distance matrix written to: {}", output_path);
    }

    println!(
        "\n⏱️  Total execution time: {:.2}s",
        total_start.elapsed().as_secs_f64()
    );
    Ok(())
}
