// mod.rs - Output formatters module

pub mod binary;

pub use binary::{load_binary, save_binary};

use crate::data::matrix::DistanceMatrix;
use crate::error::{KinshipError, Result};
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

/// Supported matrix output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Tsv,
    Csv,
    Phylip,
    Tassel,
    Json,
    Bin,
}

impl OutputFormat {
    pub const NAMES: &'static [&'static str] = &["tsv", "csv", "phylip", "tassel", "json", "bin"];
}

impl FromStr for OutputFormat {
    type Err = KinshipError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "tsv" => Ok(OutputFormat::Tsv),
            "csv" => Ok(OutputFormat::Csv),
            "phylip" => Ok(OutputFormat::Phylip),
            "tassel" | "txt" => Ok(OutputFormat::Tassel),
            "json" => Ok(OutputFormat::Json),
            "bin" | "lz4" => Ok(OutputFormat::Bin),
            _ => Err(KinshipError::Config(format!(
                "Unsupported output format: {}. Use: {}",
                s,
                OutputFormat::NAMES.join(", ")
            ))),
        }
    }
}

/// Ensure parent directory exists before creating file
fn ensure_parent_dir(file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn create_writer(file_path: &Path) -> Result<BufWriter<File>> {
    ensure_parent_dir(file_path)?;
    Ok(BufWriter::new(File::create(file_path)?))
}

/// Provenance lines shared by the text formats
fn write_provenance<W: Write>(writer: &mut W, prefix: &str, command_line: &str) -> Result<()> {
    writeln!(writer, "{}Command: {}", prefix, command_line)?;
    writeln!(
        writer,
        "{}Generated: {}",
        prefix,
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(writer, "{}kinmat v{}", prefix, env!("CARGO_PKG_VERSION"))?;
    Ok(())
}

/// Write the full square matrix, tab separated
pub fn write_tsv(file_path: &Path, matrix: &DistanceMatrix, command_line: &str) -> Result<()> {
    let mut writer = create_writer(file_path)?;
    write_provenance(&mut writer, "# ", command_line)?;

    write!(writer, "Taxa")?;
    for taxon in matrix.taxa().iter() {
        write!(writer, "\t{}", taxon)?;
    }
    writeln!(writer)?;

    for (i, taxon) in matrix.taxa().iter().enumerate() {
        write!(writer, "{}", taxon)?;
        for value in matrix.row(i) {
            write!(writer, "\t{}", value)?;
        }
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the full square matrix as CSV
pub fn write_csv(file_path: &Path, matrix: &DistanceMatrix, command_line: &str) -> Result<()> {
    let mut writer = create_writer(file_path)?;
    write_provenance(&mut writer, "# ", command_line)?;

    let mut csv_writer = csv::Writer::from_writer(writer);
    let csv_err = |e: csv::Error| KinshipError::Serialization(format!("CSV write error: {}", e));

    let mut header = vec!["Taxa".to_string()];
    header.extend(matrix.taxa().iter().map(|t| t.name().to_string()));
    csv_writer.write_record(&header).map_err(csv_err)?;

    for (i, taxon) in matrix.taxa().iter().enumerate() {
        let mut record = vec![taxon.name().to_string()];
        record.extend(matrix.row(i).map(|v| v.to_string()));
        csv_writer.write_record(&record).map_err(csv_err)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write the lower triangle in PHYLIP format
pub fn write_phylip(file_path: &Path, matrix: &DistanceMatrix, command_line: &str) -> Result<()> {
    let mut writer = create_writer(file_path)?;

    writeln!(writer, "    {}", matrix.size())?;
    for (i, taxon) in matrix.taxa().iter().enumerate() {
        write!(writer, "{:<10}", taxon.name())?;
        for j in 0..=i {
            write!(writer, "  {:.6}", matrix.get(i, j))?;
        }
        writeln!(writer)?;
    }

    // PHYLIP has no comments; trailing content is ignored by most readers
    writeln!(writer)?;
    write_provenance(&mut writer, "# ", command_line)?;
    writer.flush()?;
    Ok(())
}

/// Write the TASSEL delimited distance format: `##key=value` annotations,
/// taxa count, then one full row per taxon
pub fn write_tassel(file_path: &Path, matrix: &DistanceMatrix, command_line: &str) -> Result<()> {
    let mut writer = create_writer(file_path)?;
    write_provenance(&mut writer, "##", command_line)?;
    for (key, value) in matrix.annotations() {
        writeln!(writer, "##{}={}", key, value)?;
    }
    writeln!(writer, "{}", matrix.size())?;

    for (i, taxon) in matrix.taxa().iter().enumerate() {
        write!(writer, "{}", taxon)?;
        for value in matrix.row(i) {
            write!(writer, "\t{}", value)?;
        }
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write taxa, upper triangle and annotations as JSON
pub fn write_json(file_path: &Path, matrix: &DistanceMatrix) -> Result<()> {
    let mut writer = create_writer(file_path)?;
    let record = crate::data::matrix::MatrixRecord::from(matrix);
    serde_json::to_writer_pretty(&mut writer, &record)
        .map_err(|e| KinshipError::Serialization(format!("JSON write error: {}", e)))?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Write the matrix in the specified format
pub fn write_matrix(
    file_path: &Path,
    format: OutputFormat,
    matrix: &DistanceMatrix,
    command_line: &str,
) -> Result<()> {
    match format {
        OutputFormat::Tsv => write_tsv(file_path, matrix, command_line),
        OutputFormat::Csv => write_csv(file_path, matrix, command_line),
        OutputFormat::Phylip => write_phylip(file_path, matrix, command_line),
        OutputFormat::Tassel => write_tassel(file_path, matrix, command_line),
        OutputFormat::Json => write_json(file_path, matrix),
        OutputFormat::Bin => save_binary(file_path, matrix),
    }?;
    log::info!("Wrote {}x{} matrix to {}", matrix.size(), matrix.size(), file_path.display());
    Ok(())
}
