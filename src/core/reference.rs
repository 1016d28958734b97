// reference.rs - Direct per-pair centered-IBS computation for cross-checking

use crate::core::pseudo_site::table_pseudo_sites;
use crate::data::matrix::{
    triangle_index, triangle_len, DistanceMatrix, CENTERED_IBS_METHOD, CENTERED_IBS_SUMPK,
    MATRIX_TYPE,
};
use crate::data::table::FeatureTable;
use crate::error::{KinshipError, Result};
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Centered-IBS kinship evaluated term by term in `f64`:
/// `K(i, j) = Σ (x_i - 2p)(x_j - 2p) / (2 Σ p(1 - p))`, skipping a term when
/// either taxon is missing at that pseudo-site.
///
/// O(taxa² × pseudo-sites); meant for small inputs and for validating
/// [`EndelmanKinship`](crate::core::EndelmanKinship).
pub fn centered_ibs_reference(table: &FeatureTable, max_alleles: usize) -> Result<DistanceMatrix> {
    if !(2..=255).contains(&max_alleles) {
        return Err(KinshipError::Config(format!(
            "max alleles must be between 2 and 255, got {}",
            max_alleles
        )));
    }

    let n = table.num_taxa();
    let mut centered: Vec<Vec<Option<f64>>> = Vec::new();
    let mut sum_pi = 0.0;
    for pseudo in table_pseudo_sites(table, max_alleles) {
        let two_p = 2.0 * pseudo.frequency;
        sum_pi += pseudo.frequency * (1.0 - pseudo.frequency);
        centered.push(
            (0..n)
                .map(|t| pseudo.dosage(t).map(|x| x as f64 - two_p))
                .collect(),
        );
    }
    if centered.is_empty() || sum_pi == 0.0 {
        return Err(KinshipError::NoInformativeSites);
    }
    let sum_pk = 2.0 * sum_pi;

    let rows: Vec<Vec<f64>> = (0..n)
        .into_par_iter()
        .map(|i| {
            (i..n)
                .map(|j| {
                    let raw: f64 = centered
                        .iter()
                        .filter_map(|site| Some(site[i]? * site[j]?))
                        .sum();
                    raw / sum_pk
                })
                .collect()
        })
        .collect();

    let mut values = vec![0.0; triangle_len(n)];
    for (i, row) in rows.into_iter().enumerate() {
        for (offset, value) in row.into_iter().enumerate() {
            values[triangle_index(n, i, i + offset)] = value;
        }
    }

    let mut annotations = BTreeMap::new();
    annotations.insert(MATRIX_TYPE.to_string(), CENTERED_IBS_METHOD.to_string());
    annotations.insert(CENTERED_IBS_SUMPK.to_string(), sum_pk.to_string());
    DistanceMatrix::from_upper_triangle(table.taxa().clone(), values, annotations)
}
