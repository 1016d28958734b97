// Engine-level properties of the centered-IBS kinship pipeline

use approx::assert_abs_diff_eq;
use kinmat::core::{centered_ibs_reference, EndelmanKinship};
use kinmat::data::matrix::CENTERED_IBS_SUMPK;
use kinmat::data::{
    Chromosome, FeatureTable, FeatureTableBuilder, GenomicFeature, HaplotypeSiteBuilder,
    SnpSiteBuilder, TaxaList, TaxaListBuilder,
};
use kinmat::error::PipelineStage;
use kinmat::{DistanceMatrix, KinshipError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

const SNP_CALLS: &[&str] = &["A", "C", "G", "T", "R", "Y", "M", "K", "S", "W", "N"];
const HAPLOTYPES: &[&str] = &["h1", "h2", "h3", "h4", "."];

fn taxa(n: usize) -> Arc<TaxaList> {
    (0..n)
        .map(|i| format!("line{:02}", i))
        .collect::<TaxaListBuilder>()
        .build()
}

fn snp_table(sites: &[&[&str]]) -> FeatureTable {
    let n = sites.first().map(|s| s.len()).unwrap_or(0);
    let taxa = taxa(n);
    let mut builder = FeatureTableBuilder::new(Arc::clone(&taxa));
    for (pos, calls) in sites.iter().enumerate() {
        let feature = GenomicFeature::at(Chromosome::new("1"), pos as i32 + 1);
        let mut site = SnpSiteBuilder::new(feature, Arc::clone(&taxa));
        for (t, call) in calls.iter().enumerate() {
            site.set_call(t, call).unwrap();
        }
        builder.add(site.build().unwrap()).unwrap();
    }
    builder.build()
}

/// SNP sites spread over two chromosomes plus multiallelic haplotype sites
fn random_panel(seed: u64, num_taxa: usize, num_snps: usize, num_haplotypes: usize) -> FeatureTable {
    let mut rng = StdRng::seed_from_u64(seed);
    let taxa = taxa(num_taxa);
    let mut builder = FeatureTableBuilder::new(Arc::clone(&taxa));

    for s in 0..num_snps {
        let chr = Chromosome::new(if s % 2 == 0 { "1" } else { "2" });
        let feature = GenomicFeature::at(chr, s as i32 * 100 + 1).with_name(format!("snp{}", s));
        let mut site = SnpSiteBuilder::new(feature, Arc::clone(&taxa));
        for t in 0..num_taxa {
            let call = SNP_CALLS[rng.gen_range(0..SNP_CALLS.len())];
            site.set_call(t, call).unwrap();
        }
        builder.add(site.build().unwrap()).unwrap();
    }

    for h in 0..num_haplotypes {
        let start = h as i32 * 1000 + 1;
        let feature = GenomicFeature::range(Chromosome::new("3"), start, start + 499);
        let mut site = HaplotypeSiteBuilder::new(feature, Arc::clone(&taxa), 2).unwrap();
        for t in 0..num_taxa {
            let first = HAPLOTYPES[rng.gen_range(0..HAPLOTYPES.len())];
            let second = HAPLOTYPES[rng.gen_range(0..HAPLOTYPES.len())];
            site.set(t, &[first, second]).unwrap();
        }
        builder.add(site.build().unwrap()).unwrap();
    }
    builder.build()
}

fn assert_matrices_close(a: &DistanceMatrix, b: &DistanceMatrix, epsilon: f64) {
    assert_eq!(a.size(), b.size());
    for (x, y) in a.upper_triangle().iter().zip(b.upper_triangle()) {
        assert_abs_diff_eq!(x, y, epsilon = epsilon);
    }
}

#[test]
fn three_sample_example_matches_hand_computation() {
    let table = snp_table(&[&["A", "M", "C"]]);
    let matrix = EndelmanKinship::new(&table).num_workers(1).build().unwrap();

    let expected = [[2.0, 0.0, -2.0], [0.0, 0.0, 0.0], [-2.0, 0.0, 2.0]];
    for (i, row) in expected.iter().enumerate() {
        for (j, value) in row.iter().enumerate() {
            assert_abs_diff_eq!(matrix.get(i, j), *value, epsilon = 1e-9);
        }
    }
    let sum_pk: f64 = matrix.annotation(CENTERED_IBS_SUMPK).unwrap().parse().unwrap();
    assert_abs_diff_eq!(sum_pk, 0.5, epsilon = 1e-12);
}

#[test]
fn matrix_is_square_and_symmetric() {
    let table = random_panel(7, 9, 40, 5);
    let matrix = EndelmanKinship::new(&table).num_workers(3).build().unwrap();

    assert_eq!(matrix.size(), 9);
    assert_eq!(matrix.taxa().names(), table.taxa().names());
    for i in 0..9 {
        for j in 0..9 {
            assert_eq!(matrix.get(i, j).to_bits(), matrix.get(j, i).to_bits());
        }
    }
}

#[test]
fn worker_count_does_not_change_result() {
    // enough pseudo-sites for several work units
    let table = random_panel(11, 6, 4_000, 300);
    let single = EndelmanKinship::new(&table).num_workers(1).build().unwrap();
    let many = EndelmanKinship::new(&table).num_workers(5).build().unwrap();

    for (a, b) in single.upper_triangle().iter().zip(many.upper_triangle()) {
        assert_eq!(a.to_bits(), b.to_bits());
    }
    assert_eq!(single.annotations(), many.annotations());
}

#[test]
fn repeated_runs_are_bit_identical() {
    let table = random_panel(3, 8, 500, 20);
    let engine = EndelmanKinship::new(&table).num_workers(4);
    let first = engine.build().unwrap();
    let second = engine.build().unwrap();
    assert_eq!(first, second);
}

#[test]
fn fully_missing_taxon_contributes_zero() {
    let table = snp_table(&[
        &["A", "N", "C", "A"],
        &["G", "N", "G", "T"],
        &["R", "N", "C", "C"],
    ]);
    let matrix = EndelmanKinship::new(&table).num_workers(2).build().unwrap();

    for j in 0..4 {
        assert_eq!(matrix.get(1, j), 0.0);
    }
    assert!(matrix.get(0, 0) > 0.0);
}

#[test]
fn engine_agrees_with_direct_formula() {
    for seed in [1, 2, 3] {
        let table = random_panel(seed, 12, 120, 15);
        for max_alleles in [2, 3, 255] {
            let fast = EndelmanKinship::new(&table)
                .max_alleles(max_alleles)
                .num_workers(2)
                .build()
                .unwrap();
            let direct = centered_ibs_reference(&table, max_alleles).unwrap();
            assert_matrices_close(&fast, &direct, 1e-4);

            let fast_sum: f64 = fast.annotation(CENTERED_IBS_SUMPK).unwrap().parse().unwrap();
            let direct_sum: f64 = direct.annotation(CENTERED_IBS_SUMPK).unwrap().parse().unwrap();
            assert_abs_diff_eq!(fast_sum, direct_sum, epsilon = 1e-6);
        }
    }
}

#[test]
fn duplicating_every_site_leaves_matrix_unchanged() {
    let table = random_panel(5, 7, 60, 6);
    let taxa = Arc::clone(table.taxa());
    let mut doubled = FeatureTableBuilder::new(taxa);
    doubled.add_all(table.iter().cloned()).unwrap();
    doubled.add_all(table.iter().cloned()).unwrap();
    let doubled = doubled.build();

    let once = EndelmanKinship::new(&table).num_workers(2).build().unwrap();
    let twice = EndelmanKinship::new(&doubled).num_workers(2).build().unwrap();
    assert_matrices_close(&once, &twice, 1e-12);
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let values: Vec<f64> = values.collect();
    values.iter().sum::<f64>() / values.len() as f64
}

#[test]
fn doubling_independent_sites_keeps_kinship_scale() {
    let small = random_panel(21, 10, 1_500, 20);
    let large = random_panel(22, 10, 3_000, 40);
    let a = EndelmanKinship::new(&small).num_workers(2).build().unwrap();
    let b = EndelmanKinship::new(&large).num_workers(2).build().unwrap();

    assert_abs_diff_eq!(mean(a.off_diagonal()), mean(b.off_diagonal()), epsilon = 0.05);
    assert_abs_diff_eq!(mean(a.diagonal()), mean(b.diagonal()), epsilon = 0.1);

    let sum_pk = |m: &DistanceMatrix| -> f64 {
        m.annotation(CENTERED_IBS_SUMPK).unwrap().parse().unwrap()
    };
    let ratio = sum_pk(&b) / sum_pk(&a);
    assert!((1.8..2.2).contains(&ratio), "sumPk ratio {}", ratio);
}

#[test]
fn fewer_alleles_drops_rare_haplotypes() {
    // h2 (4 copies) > h1 (3) > h3 (1); with two alleles considered only h2 is scored
    let taxa = taxa(4);
    let feature = GenomicFeature::range(Chromosome::new("1"), 1, 100);
    let mut site = HaplotypeSiteBuilder::new(feature, Arc::clone(&taxa), 2).unwrap();
    site.set(0, &["h1", "h1"]).unwrap();
    site.set(1, &["h1", "h2"]).unwrap();
    site.set(2, &["h2", "h2"]).unwrap();
    site.set(3, &["h2", "h3"]).unwrap();
    let mut builder = FeatureTableBuilder::new(taxa);
    builder.add(site.build().unwrap()).unwrap();
    let table = builder.build();

    let two = EndelmanKinship::new(&table).max_alleles(2).build().unwrap();
    let all = EndelmanKinship::new(&table).max_alleles(255).build().unwrap();
    assert_ne!(two, all);
    assert_matrices_close(&two, &centered_ibs_reference(&table, 2).unwrap(), 1e-5);
}

#[test]
fn worker_panic_surfaces_as_pipeline_error() {
    let table = random_panel(9, 5, 50, 0);
    let listener = |_: u8, _: Option<&str>| panic!("listener failed");
    let err = EndelmanKinship::new(&table)
        .num_workers(1)
        .with_listener(&listener)
        .build()
        .unwrap_err();

    match err {
        KinshipError::Pipeline { stage, message } => {
            assert_eq!(stage, PipelineStage::Worker);
            assert!(message.contains("listener failed"));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn non_diploid_site_is_rejected() {
    let taxa = taxa(3);
    let feature = GenomicFeature::range(Chromosome::new("1"), 1, 100);
    let mut site = HaplotypeSiteBuilder::new(feature, Arc::clone(&taxa), 1).unwrap();
    site.set(0, &["h1"]).unwrap();
    site.set(1, &["h2"]).unwrap();
    site.set(2, &["h1"]).unwrap();
    let mut builder = FeatureTableBuilder::new(taxa);
    builder.add(site.build().unwrap()).unwrap();
    let table = builder.build();

    assert!(matches!(
        EndelmanKinship::new(&table).build(),
        Err(KinshipError::Config(_))
    ));
}

#[test]
fn empty_table_has_no_informative_sites() {
    let table = FeatureTableBuilder::new(taxa(3)).build();
    assert!(matches!(
        EndelmanKinship::new(&table).build(),
        Err(KinshipError::NoInformativeSites)
    ));
}
