// hapmap.rs - HapMap text loader for diploid nucleotide sites

use super::parse_error;
use crate::data::feature::{Chromosome, GenomicFeature};
use crate::data::nucleotide;
use crate::data::site::FeatureSite;
use crate::data::site_builder::SnpSiteBuilder;
use crate::data::table::{FeatureTable, FeatureTableBuilder};
use crate::data::taxa::{TaxaList, TaxaListBuilder};
use crate::error::{KinshipError, Result};
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

/// rs#, alleles, chrom, pos, strand, assembly#, center, protLSID, assayLSID, panelLSID, QCcode
const NUM_NON_TAXA_COLUMNS: usize = 11;
const SNP_ID_COLUMN: usize = 0;
const CHROMOSOME_COLUMN: usize = 2;
const POSITION_COLUMN: usize = 3;

/// Load a HapMap file. Calls may be one IUPAC letter or two nucleotides per
/// taxon; `##` lines before the header are skipped.
pub fn load_hapmap(path: &Path) -> Result<FeatureTable> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut header: Option<(usize, String)> = None;
    let mut lines: Vec<(usize, String)> = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line_num = index + 1;
        if line.trim().is_empty() {
            continue;
        }
        if header.is_none() {
            if line.starts_with("##") {
                continue;
            }
            header = Some((line_num, line));
        } else {
            lines.push((line_num, line));
        }
    }

    let (header_line, header) = header.ok_or_else(|| parse_error(path, 0, "missing header line"))?;
    let taxa = parse_header(path, header_line, &header)?;

    let sites = lines
        .par_iter()
        .map(|(line_num, line)| parse_site(path, *line_num, line, &taxa))
        .collect::<Result<Vec<FeatureSite>>>()?;

    let mut builder = FeatureTableBuilder::with_capacity(Arc::clone(&taxa), sites.len());
    builder.add_all(sites)?;
    let table = builder.build();

    log::info!(
        "Loaded HapMap {}: {} taxa, {} sites",
        path.display(),
        table.num_taxa(),
        table.num_features()
    );
    Ok(table)
}

fn parse_header(path: &Path, line_num: usize, header: &str) -> Result<Arc<TaxaList>> {
    let columns: Vec<&str> = header.split('\t').collect();
    if columns.len() <= NUM_NON_TAXA_COLUMNS {
        return Err(parse_error(
            path,
            line_num,
            format!(
                "header needs {} fixed columns followed by taxa names",
                NUM_NON_TAXA_COLUMNS
            ),
        ));
    }

    let names = &columns[NUM_NON_TAXA_COLUMNS..];
    if let Some(pos) = names.iter().position(|n| n.trim().is_empty()) {
        return Err(parse_error(
            path,
            line_num,
            format!("empty taxon name in column {}", NUM_NON_TAXA_COLUMNS + pos + 1),
        ));
    }

    let taxa = names.iter().map(|n| n.trim()).collect::<TaxaListBuilder>().build();
    if taxa.len() != names.len() {
        return Err(parse_error(path, line_num, "duplicate taxon names in header"));
    }
    Ok(taxa)
}

fn parse_site(path: &Path, line_num: usize, line: &str, taxa: &Arc<TaxaList>) -> Result<FeatureSite> {
    let columns: Vec<&str> = line.split('\t').collect();
    if columns.len() < NUM_NON_TAXA_COLUMNS {
        return Err(parse_error(
            path,
            line_num,
            format!("expected at least {} columns", NUM_NON_TAXA_COLUMNS),
        ));
    }

    let name = columns[SNP_ID_COLUMN].trim();
    let position: i32 = columns[POSITION_COLUMN].trim().parse().map_err(|_| {
        parse_error(
            path,
            line_num,
            format!(
                "position must be an integer: {}",
                columns[POSITION_COLUMN].trim()
            ),
        )
    })?;

    let calls = &columns[NUM_NON_TAXA_COLUMNS..];
    if calls.len() != taxa.len() {
        let problem = if calls.len() > taxa.len() {
            "too many"
        } else {
            "too few"
        };
        return Err(parse_error(
            path,
            line_num,
            format!(
                "SNP {} has {} values: {} for {} taxa",
                name,
                problem,
                calls.len(),
                taxa.len()
            ),
        ));
    }

    let feature = GenomicFeature::at(Chromosome::new(columns[CHROMOSOME_COLUMN]), position).with_name(name);
    let mut builder = SnpSiteBuilder::new(feature, Arc::clone(taxa));
    for (taxon, call) in calls.iter().enumerate() {
        let alleles = nucleotide::parse_diploid_call(call).ok_or_else(|| {
            parse_error(
                path,
                line_num,
                format!("SNP {} has illegal value: {}", name, call.trim()),
            )
        })?;
        builder.set(taxon, alleles)?;
    }
    builder
        .build()
        .map_err(|e: KinshipError| parse_error(path, line_num, e.to_string()))
}
