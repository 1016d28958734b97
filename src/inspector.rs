// inspector.rs - Binary kinship matrix inspector
// Features: annotation listing, diagonal/off-diagonal statistics, integrity checks

use std::fs::File;
use std::io::Write;
use std::path::Path;

use argh::FromArgs;
use kinmat::data::matrix::{CENTERED_IBS_SUMPK, MATRIX_TYPE};
use kinmat::data::DistanceMatrix;
use kinmat::output::binary::load_binary_with_metadata;

// ============================================================================
// CLI ARGUMENTS
// ============================================================================

#[derive(FromArgs)]
/// Inspect kinmat binary kinship matrices
struct Args {
    /// path to the binary matrix file (.bin)
    #[argh(option)]
    matrix: String,

    /// show the kinship row of a specific taxon
    #[argh(option)]
    show_taxon: Option<String>,

    /// show top N most related taxon pairs (default: 10)
    #[argh(option, default = "10")]
    top_pairs: usize,

    /// validate matrix integrity
    #[argh(switch)]
    validate: bool,

    /// export per-taxon summary to TSV file
    #[argh(option)]
    export_summary: Option<String>,

    /// quiet mode - minimal output
    #[argh(switch)]
    quiet: bool,
}

// ============================================================================
// STATISTICS
// ============================================================================

#[derive(Debug, Default)]
struct ValueStats {
    count: usize,
    min: f64,
    max: f64,
    mean: f64,
    std_dev: f64,
}

impl ValueStats {
    fn from_values<I: Iterator<Item = f64>>(values: I) -> Self {
        let values: Vec<f64> = values.collect();
        if values.is_empty() {
            return Self::default();
        }
        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
        Self {
            count,
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            mean,
            std_dev: variance.sqrt(),
        }
    }

    fn print(&self, label: &str) {
        println!(
            "{:<14} n={:<10} min={:>9.4} max={:>9.4} mean={:>9.4} sd={:>8.4}",
            label, self.count, self.min, self.max, self.mean, self.std_dev
        );
    }
}

// ============================================================================
// ANALYSIS FUNCTIONS
// ============================================================================

fn analyze_overview(matrix: &DistanceMatrix, created: &str, args: &Args) {
    if args.quiet {
        return;
    }

    println!("\n=== MATRIX SUMMARY ===");
    println!("Created: {}", created);
    println!("Taxa: {}", matrix.size());

    println!("\n=== ANNOTATIONS ===");
    if matrix.annotations().is_empty() {
        println!("(none)");
    }
    for (key, value) in matrix.annotations() {
        println!("{} = {}", key, value);
    }

    println!("\n=== KINSHIP STATISTICS ===");
    ValueStats::from_values(matrix.diagonal()).print("Diagonal");
    ValueStats::from_values(matrix.off_diagonal()).print("Off-diagonal");
}

fn analyze_top_pairs(matrix: &DistanceMatrix, args: &Args) {
    if args.quiet || args.top_pairs == 0 {
        return;
    }

    let n = matrix.size();
    let mut pairs = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            pairs.push((i, j, matrix.get(i, j)));
        }
    }
    pairs.sort_by(|a, b| b.2.total_cmp(&a.2));

    println!("\n=== MOST RELATED PAIRS ===");
    println!("{:<20} {:<20} {:>10}", "Taxon", "Taxon", "Kinship");
    println!("{}", "=".repeat(52));
    for (i, j, value) in pairs.iter().take(args.top_pairs) {
        let (Some(a), Some(b)) = (matrix.taxa().get(*i), matrix.taxa().get(*j)) else {
            continue;
        };
        println!("{:<20} {:<20} {:>10.4}", a.name(), b.name(), value);
    }
    if pairs.len() > args.top_pairs {
        println!("... and {} more pairs", pairs.len() - args.top_pairs);
    }
}

fn analyze_taxon(matrix: &DistanceMatrix, name: &str) {
    let Some(index) = matrix.taxa().index_of(name) else {
        println!("❌ Taxon '{}' not found in matrix", name);
        return;
    };

    println!("\n=== KINSHIP ROW: {} ===", name);
    for (taxon, value) in matrix.taxa().iter().zip(matrix.row(index)) {
        println!("{:<20} {:>10.4}", taxon.name(), value);
    }
}

fn validate_matrix(matrix: &DistanceMatrix) -> bool {
    println!("\n=== INTEGRITY CHECK ===");
    let mut issues = Vec::new();

    let non_finite = matrix.upper_triangle().iter().filter(|v| !v.is_finite()).count();
    if non_finite > 0 {
        issues.push(format!("{} non-finite values", non_finite));
    }

    if matrix.annotation(MATRIX_TYPE).is_none() {
        issues.push(format!("missing {} annotation", MATRIX_TYPE));
    }

    if let Some(sum_pk) = matrix.annotation(CENTERED_IBS_SUMPK) {
        match sum_pk.parse::<f64>() {
            Ok(value) if value > 0.0 => {}
            _ => issues.push(format!("invalid {} annotation: {}", CENTERED_IBS_SUMPK, sum_pk)),
        }
    }

    if issues.is_empty() {
        println!("✅ Matrix is valid");
        true
    } else {
        for issue in &issues {
            println!("❌ {}", issue);
        }
        false
    }
}

fn export_summary_to_tsv(matrix: &DistanceMatrix, output_path: &str) -> std::io::Result<()> {
    let mut file = File::create(output_path)?;
    writeln!(file, "Taxon\tSelfKinship\tMeanKinship\tClosestRelative\tClosestKinship")?;

    let n = matrix.size();
    for (i, taxon) in matrix.taxa().iter().enumerate() {
        let others: Vec<(usize, f64)> = matrix
            .row(i)
            .enumerate()
            .filter(|(j, _)| *j != i)
            .collect();
        let mean = if others.is_empty() {
            0.0
        } else {
            others.iter().map(|(_, v)| v).sum::<f64>() / others.len() as f64
        };
        let closest = others.iter().max_by(|a, b| a.1.total_cmp(&b.1));
        let (closest_name, closest_value) = match closest {
            Some((j, value)) => (
                matrix.taxa().get(*j).map(|t| t.name()).unwrap_or("-"),
                format!("{:.6}", value),
            ),
            None => ("-", "-".to_string()),
        };
        writeln!(
            file,
            "{}\t{:.6}\t{:.6}\t{}\t{}",
            taxon.name(),
            matrix.get(i, i),
            mean,
            closest_name,
            closest_value
        )?;
    }

    println!("✅ Summary for {} taxa exported to: {}", n, output_path);
    Ok(())
}

// ============================================================================
// MAIN FUNCTION
// ============================================================================

fn main() {
    let args: Args = argh::from_env();

    if !args.quiet {
        println!("🔍 kinmat Matrix Inspector");
        println!("==========================");
    }

    let matrix_path = Path::new(&args.matrix);
    let (matrix, created) = match load_binary_with_metadata(matrix_path) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("❌ ERROR loading matrix: {}", e);
            std::process::exit(1);
        }
    };

    analyze_overview(&matrix, &created, &args);
    analyze_top_pairs(&matrix, &args);

    if let Some(name) = &args.show_taxon {
        analyze_taxon(&matrix, name);
    }

    if args.validate && !validate_matrix(&matrix) {
        std::process::exit(1);
    }

    if let Some(export_path) = &args.export_summary {
        if let Err(e) = export_summary_to_tsv(&matrix, export_path) {
            eprintln!("❌ ERROR exporting summary: {}", e);
            std::process::exit(1);
        }
    }

    if !args.quiet {
        println!("\n✅ Matrix inspection completed successfully");
    }
}
