// vcf.rs - VCF text loader building haplotype sites from GT calls

use super::parse_error;
use crate::data::feature::{Chromosome, GenomicFeature};
use crate::data::site::{FeatureSite, HaplotypeAnnotation};
use crate::data::site_builder::HaplotypeSiteBuilder;
use crate::data::table::{FeatureTable, FeatureTableBuilder};
use crate::data::taxa::{TaxaList, TaxaListBuilder};
use crate::error::Result;
use regex::Regex;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

const CHROM: usize = 0;
const POS: usize = 1;
const ID: usize = 2;
const REF: usize = 3;
const ALT: usize = 4;
const FORMAT: usize = 8;
const FIRST_SAMPLE: usize = 9;

/// Strip symbolic-allele brackets: `<hap1>` becomes `hap1`
fn state_name(allele: &str) -> &str {
    allele
        .trim()
        .trim_start_matches('<')
        .trim_end_matches('>')
}

/// Parse `##ALT=<ID=hap1,Description="B73:chr1:100-200">` header lines into
/// haplotype annotations keyed by ALT id
fn alt_annotations(header_lines: &[String]) -> HashMap<String, HaplotypeAnnotation> {
    let Ok(pattern) = Regex::new(
        r#"^##ALT=<ID=([^,>]+),.*Description="([^":,]+)[^":]*:([^":]+):(-?\d+)-(-?\d+)""#,
    ) else {
        return HashMap::new();
    };

    header_lines
        .iter()
        .filter_map(|line| {
            let caps = pattern.captures(line)?;
            let annotation = HaplotypeAnnotation {
                taxon: caps[2].to_string(),
                asm_contig: caps[3].to_string(),
                asm_start: caps[4].parse().ok()?,
                asm_end: caps[5].parse().ok()?,
            };
            Some((caps[1].to_string(), annotation))
        })
        .collect()
}

/// Load a VCF file. Sample columns become taxa; `REF` and `ALT` define the
/// fixed state list of each site and `GT` indexes into it.
pub fn load_vcf(path: &Path) -> Result<FeatureTable> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut meta_lines = Vec::new();
    let mut taxa: Option<Arc<TaxaList>> = None;
    let mut annotations = HashMap::new();
    let mut builder: Option<FeatureTableBuilder> = None;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line_num = index + 1;
        if line.trim().is_empty() {
            continue;
        }

        if line.starts_with("##") {
            meta_lines.push(line);
            continue;
        }

        if line.starts_with("#CHROM") {
            let columns: Vec<&str> = line.split('\t').collect();
            if columns.len() <= FIRST_SAMPLE {
                return Err(parse_error(path, line_num, "header has no sample columns"));
            }
            let names = &columns[FIRST_SAMPLE..];
            let list = names.iter().map(|n| n.trim()).collect::<TaxaListBuilder>().build();
            if list.len() != names.len() {
                return Err(parse_error(path, line_num, "duplicate sample names in header"));
            }
            annotations = alt_annotations(&meta_lines);
            builder = Some(FeatureTableBuilder::new(Arc::clone(&list)));
            taxa = Some(list);
            continue;
        }

        let (Some(taxa), Some(builder)) = (taxa.as_ref(), builder.as_mut()) else {
            return Err(parse_error(path, line_num, "data line before #CHROM header"));
        };
        let site = parse_record(path, line_num, &line, taxa, &annotations)?;
        builder.add(site)?;
    }

    let builder = builder.ok_or_else(|| parse_error(path, 0, "missing #CHROM header line"))?;
    let table = builder.build();
    log::info!(
        "Loaded VCF {}: {} taxa, {} sites",
        path.display(),
        table.num_taxa(),
        table.num_features()
    );
    Ok(table)
}

fn parse_record(
    path: &Path,
    line_num: usize,
    line: &str,
    taxa: &Arc<TaxaList>,
    annotations: &HashMap<String, HaplotypeAnnotation>,
) -> Result<FeatureSite> {
    let columns: Vec<&str> = line.split('\t').collect();
    if columns.len() != FIRST_SAMPLE + taxa.len() {
        return Err(parse_error(
            path,
            line_num,
            format!(
                "expected {} columns, found {}",
                FIRST_SAMPLE + taxa.len(),
                columns.len()
            ),
        ));
    }

    let position: i32 = columns[POS]
        .trim()
        .parse()
        .map_err(|_| parse_error(path, line_num, format!("invalid POS: {}", columns[POS])))?;

    let reference = state_name(columns[REF]);
    let mut states = vec![reference.to_string()];
    if columns[ALT].trim() != "." {
        states.extend(columns[ALT].split(',').map(|a| state_name(a).to_string()));
    }

    let end = position + reference.len().max(1) as i32 - 1;
    let mut feature = GenomicFeature::range(Chromosome::new(columns[CHROM]), position, end);
    let id = columns[ID].trim();
    if id != "." {
        feature = feature.with_name(id);
    }

    let gt_index = columns[FORMAT]
        .split(':')
        .position(|f| f == "GT")
        .ok_or_else(|| parse_error(path, line_num, "FORMAT has no GT field"))?;

    let calls: Vec<Vec<&str>> = columns[FIRST_SAMPLE..]
        .iter()
        .map(|sample| {
            sample
                .split(':')
                .nth(gt_index)
                .unwrap_or(".")
                .split(['/', '|'])
                .collect()
        })
        .collect();
    // all-missing records written as a bare '.' are still diploid
    let ploidy = calls.iter().map(Vec::len).max().unwrap_or(2).max(2);
    let phased = columns[FIRST_SAMPLE..].iter().any(|s| s.contains('|'));

    let site_annotations: Vec<Option<HaplotypeAnnotation>> =
        states.iter().map(|s| annotations.get(s).cloned()).collect();

    let mut builder = HaplotypeSiteBuilder::with_states(feature, Arc::clone(taxa), ploidy, states.clone())
        .map_err(|e| parse_error(path, line_num, e.to_string()))?
        .annotations(site_annotations)?
        .phased(phased);

    for (taxon, gt) in calls.iter().enumerate() {
        let mut values: Vec<&str> = Vec::with_capacity(ploidy);
        for index in gt {
            let value = match *index {
                "." | "" => ".",
                index => {
                    let code: usize = index.parse().map_err(|_| {
                        parse_error(path, line_num, format!("invalid GT allele index: {}", index))
                    })?;
                    states.get(code).map(String::as_str).ok_or_else(|| {
                        parse_error(
                            path,
                            line_num,
                            format!("GT allele index {} beyond {} states", code, states.len()),
                        )
                    })?
                }
            };
            values.push(value);
        }
        // haploid calls at a diploid site are padded as missing
        values.resize(ploidy, ".");
        builder.set(taxon, &values)?;
    }

    builder.build()
}
