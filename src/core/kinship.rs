// kinship.rs - Endelman centered-IBS kinship: producer, worker pool and merge

use crate::core::encoding::{
    PackedBlock, DISTANCE_SCALE, LOOKUP_SIZE, MISSING_WORD, SITES_PER_BLOCK, SITES_PER_UNIT,
    SUM_PI_SCALE, WORDS_PER_BLOCK,
};
use crate::core::pseudo_site::{count_pseudo_sites, pseudo_sites, PseudoSite};
use crate::data::matrix::{
    triangle_len, DistanceMatrix, CENTERED_IBS_METHOD, CENTERED_IBS_SUMPK, MATRIX_TYPE,
};
use crate::data::table::FeatureTable;
use crate::error::{KinshipError, PipelineStage, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::Instant;

pub const DEFAULT_MAX_ALLELES: usize = 255;
pub const DEFAULT_WORK_QUEUE_CAPACITY: usize = 1000;
pub const DEFAULT_RESULT_QUEUE_CAPACITY: usize = 30;

/// Pair-site operations per minute per worker, for the run time estimate
const PAIR_SITES_PER_MINUTE: f64 = 1.02e11;

/// Receives best-effort progress updates from the engine. Called from
/// worker threads; percentages never decrease.
pub trait ProgressListener: Send + Sync {
    fn progress(&self, percent: u8, message: Option<&str>);
}

impl<F> ProgressListener for F
where
    F: Fn(u8, Option<&str>) + Send + Sync,
{
    fn progress(&self, percent: u8, message: Option<&str>) {
        self(percent, message)
    }
}

/// Available parallelism minus two, at least one
pub fn default_num_workers() -> usize {
    num_cpus::get().saturating_sub(2).max(1)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KinshipConfig {
    /// Alleles considered per site, 2..=255
    pub max_alleles: usize,
    pub num_workers: usize,
    /// Units buffered between the producer and the workers
    pub work_queue_capacity: usize,
    /// Worker results buffered ahead of the merge step
    pub result_queue_capacity: usize,
}

impl Default for KinshipConfig {
    fn default() -> Self {
        Self {
            max_alleles: DEFAULT_MAX_ALLELES,
            num_workers: default_num_workers(),
            work_queue_capacity: DEFAULT_WORK_QUEUE_CAPACITY,
            result_queue_capacity: DEFAULT_RESULT_QUEUE_CAPACITY,
        }
    }
}

impl KinshipConfig {
    pub fn validate(&self) -> Result<()> {
        if !(2..=255).contains(&self.max_alleles) {
            return Err(KinshipError::Config(format!(
                "max alleles must be between 2 and 255, got {}",
                self.max_alleles
            )));
        }
        if self.num_workers == 0 {
            return Err(KinshipError::Config(
                "number of workers must be at least 1".to_string(),
            ));
        }
        if self.work_queue_capacity == 0 || self.result_queue_capacity == 0 {
            return Err(KinshipError::Config(
                "queue capacities must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

type WorkUnit<'a> = Vec<PseudoSite<'a>>;

/// Un-normalized sums owned by one worker
#[derive(Debug)]
struct PartialSums {
    distances: Vec<i64>,
    sum_pi: i64,
    num_sites: usize,
}

impl PartialSums {
    fn new(num_taxa: usize) -> Self {
        Self {
            distances: vec![0; triangle_len(num_taxa)],
            sum_pi: 0,
            num_sites: 0,
        }
    }

    fn add_all(&mut self, other: &PartialSums) {
        for (total, value) in self.distances.iter_mut().zip(&other.distances) {
            *total += value;
        }
        self.sum_pi += other.sum_pi;
        self.num_sites += other.num_sites;
    }
}

struct Progress<'a> {
    listener: Option<&'a dyn ProgressListener>,
    total: usize,
    processed: AtomicUsize,
    /// Held while the listener runs so deliveries stay ordered
    last_percent: Mutex<usize>,
}

impl<'a> Progress<'a> {
    fn new(listener: Option<&'a dyn ProgressListener>, total: usize) -> Self {
        Self {
            listener,
            total,
            processed: AtomicUsize::new(0),
            last_percent: Mutex::new(0),
        }
    }

    fn advance(&self, sites: usize) {
        let done = self.processed.fetch_add(sites, Ordering::Relaxed) + sites;
        let percent = if self.total == 0 {
            100
        } else {
            (done * 100 / self.total).min(100)
        };
        self.report(percent, None);
    }

    fn report(&self, percent: usize, message: Option<&str>) {
        if let Some(listener) = self.listener {
            // a poisoned lock means a listener call already panicked
            let Ok(mut last) = self.last_percent.lock() else {
                return;
            };
            if *last < percent {
                *last = percent;
                listener.progress(percent as u8, message);
            }
        }
    }
}

/// Sets the shared abort flag if its thread unwinds
struct AbortOnPanic<'a>(&'a AtomicBool);

impl Drop for AbortOnPanic<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.store(true, Ordering::SeqCst);
        }
    }
}

/// Run one pipeline stage, raising the abort flag if it fails or panics
fn run_stage<T>(abort: &AtomicBool, stage: impl FnOnce() -> Result<T>) -> Result<T> {
    let _guard = AbortOnPanic(abort);
    let result = stage();
    if result.is_err() {
        abort.store(true, Ordering::SeqCst);
    }
    result
}

fn join_stage<T>(
    stage: PipelineStage,
    handle: thread::ScopedJoinHandle<'_, Result<T>>,
) -> Result<T> {
    handle.join().map_err(|panic| {
        let message = panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "thread panicked".to_string());
        KinshipError::Pipeline { stage, message }
    })?
}

/// Builds the centered-IBS kinship matrix of a feature table.
///
/// One producer turns sites into pseudo-sites and sends them in units of
/// 200 blocks of 15 over a bounded queue. A pool of workers packs each block
/// into one-hot words, expands the block's lookup tables and adds every
/// pair's contribution into a private accumulator. A single merge step sums
/// the worker accumulators and divides by `sumPk`.
pub struct EndelmanKinship<'a> {
    table: &'a FeatureTable,
    config: KinshipConfig,
    listener: Option<&'a dyn ProgressListener>,
}

impl<'a> EndelmanKinship<'a> {
    pub fn new(table: &'a FeatureTable) -> Self {
        Self {
            table,
            config: KinshipConfig::default(),
            listener: None,
        }
    }

    pub fn with_config(mut self, config: KinshipConfig) -> Self {
        self.config = config;
        self
    }

    pub fn max_alleles(mut self, max_alleles: usize) -> Self {
        self.config.max_alleles = max_alleles;
        self
    }

    pub fn num_workers(mut self, num_workers: usize) -> Self {
        self.config.num_workers = num_workers;
        self
    }

    pub fn with_listener(mut self, listener: &'a dyn ProgressListener) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn config(&self) -> &KinshipConfig {
        &self.config
    }

    pub fn build(&self) -> Result<DistanceMatrix> {
        self.config.validate()?;
        let start = Instant::now();
        let table = self.table;
        let num_taxa = table.num_taxa();
        let max_alleles = self.config.max_alleles;
        let num_workers = self.config.num_workers;

        let total_pseudo_sites: usize = table
            .iter()
            .map(|site| count_pseudo_sites(site, max_alleles))
            .sum();
        log::debug!(
            "Centered IBS: {} taxa, {} sites, {} pseudo-sites, {} workers",
            num_taxa,
            table.num_features(),
            total_pseudo_sites,
            num_workers
        );
        log::info!(
            "Centered IBS: estimated time to complete: {}",
            describe_minutes(
                num_taxa as f64 * (num_taxa as f64 + 1.0) / 2.0 * total_pseudo_sites as f64
                    / num_workers as f64
                    / PAIR_SITES_PER_MINUTE
            )
        );

        let abort = AtomicBool::new(false);
        let progress = Progress::new(self.listener, total_pseudo_sites);
        let (work_tx, work_rx) = bounded::<WorkUnit<'a>>(self.config.work_queue_capacity);
        let (result_tx, result_rx) = bounded::<PartialSums>(self.config.result_queue_capacity);

        let (producer_result, worker_results, merge_result) = thread::scope(|s| {
            let abort = &abort;
            let progress = &progress;

            let producer = s.spawn(move || {
                run_stage(abort, || produce(table, max_alleles, work_tx, abort))
            });

            let workers: Vec<_> = (0..num_workers)
                .map(|_| {
                    let rx = work_rx.clone();
                    let tx = result_tx.clone();
                    s.spawn(move || run_stage(abort, || work(num_taxa, rx, tx, abort, progress)))
                })
                .collect();
            drop(work_rx);
            drop(result_tx);

            let merger = s.spawn(move || run_stage(abort, || merge(num_taxa, result_rx, abort)));

            let producer_result = join_stage(PipelineStage::Producer, producer);
            let worker_results: Vec<Result<()>> = workers
                .into_iter()
                .map(|handle| join_stage(PipelineStage::Worker, handle))
                .collect();
            let merge_result = join_stage(PipelineStage::Merge, merger);
            (producer_result, worker_results, merge_result)
        });

        producer_result?;
        for result in worker_results {
            result?;
        }
        let (values, sum_pk) = merge_result?;
        progress.report(100, Some("Centered IBS complete"));

        let mut annotations = BTreeMap::new();
        annotations.insert(MATRIX_TYPE.to_string(), CENTERED_IBS_METHOD.to_string());
        annotations.insert(CENTERED_IBS_SUMPK.to_string(), sum_pk.to_string());
        let matrix = DistanceMatrix::from_upper_triangle(table.taxa().clone(), values, annotations)?;

        log::info!(
            "Centered IBS: actual time to complete: {}",
            describe_minutes(start.elapsed().as_secs_f64() / 60.0)
        );
        Ok(matrix)
    }
}

/// Centered-IBS kinship with default settings
pub fn centered_ibs(table: &FeatureTable, max_alleles: usize) -> Result<DistanceMatrix> {
    EndelmanKinship::new(table).max_alleles(max_alleles).build()
}

fn describe_minutes(minutes: f64) -> String {
    let minutes = minutes.round() as u64;
    if minutes < 60 {
        format!("{} minutes", minutes)
    } else {
        format!("{} hours {} minutes", minutes / 60, minutes % 60)
    }
}

/// Producer stage: the only sender on the work queue
fn produce<'a>(
    table: &'a FeatureTable,
    max_alleles: usize,
    tx: Sender<WorkUnit<'a>>,
    abort: &AtomicBool,
) -> Result<()> {
    let mut unit: WorkUnit<'a> = Vec::with_capacity(SITES_PER_UNIT);
    let mut num_units = 0usize;

    for site in table {
        if abort.load(Ordering::Relaxed) {
            return Ok(());
        }
        let pseudos = pseudo_sites(site, max_alleles);
        if pseudos.is_empty() {
            continue;
        }
        if site.ploidy() != 2 {
            return Err(KinshipError::Config(format!(
                "centered IBS requires diploid sites, but {} has ploidy {}",
                site.feature(),
                site.ploidy()
            )));
        }
        for pseudo in pseudos {
            unit.push(pseudo);
            if unit.len() == SITES_PER_UNIT {
                let full = std::mem::replace(&mut unit, Vec::with_capacity(SITES_PER_UNIT));
                if tx.send(full).is_err() {
                    // every worker has stopped
                    return Ok(());
                }
                num_units += 1;
            }
        }
    }

    if !unit.is_empty() {
        if tx.send(unit).is_err() {
            return Ok(());
        }
        num_units += 1;
    }
    log::debug!("Centered IBS: producer queued {} units", num_units);
    Ok(())
}

/// Worker stage: private accumulator and lookup tables, no shared writes
fn work(
    num_taxa: usize,
    rx: Receiver<WorkUnit<'_>>,
    tx: Sender<PartialSums>,
    abort: &AtomicBool,
    progress: &Progress<'_>,
) -> Result<()> {
    let mut sums = PartialSums::new(num_taxa);
    let mut lookups: [Vec<i32>; WORDS_PER_BLOCK] = [
        vec![0; LOOKUP_SIZE],
        vec![0; LOOKUP_SIZE],
        vec![0; LOOKUP_SIZE],
    ];

    for unit in rx.iter() {
        if abort.load(Ordering::Relaxed) {
            return Ok(());
        }
        for sites in unit.chunks(SITES_PER_BLOCK) {
            let block = PackedBlock::pack(sites, num_taxa);
            for (terms, lookup) in block.terms.iter().zip(lookups.iter_mut()) {
                terms.expand_into(lookup);
            }
            accumulate(&mut sums.distances, &block.words, &lookups);
            sums.sum_pi += block.sum_pi;
            sums.num_sites += block.num_sites;
        }
        progress.advance(unit.len());
    }

    if abort.load(Ordering::Relaxed) {
        return Ok(());
    }
    tx.send(sums).map_err(|_| KinshipError::Pipeline {
        stage: PipelineStage::Worker,
        message: "merge stage stopped before receiving results".to_string(),
    })
}

/// Add `lookup[word_i | word_j]` of all three words into every pair `i <= j`
fn accumulate(
    distances: &mut [i64],
    words: &[Vec<u16>; WORDS_PER_BLOCK],
    lookups: &[Vec<i32>; WORDS_PER_BLOCK],
) {
    let [w0, w1, w2] = words;
    let [l0, l1, l2] = lookups;
    let n = w0.len();

    let mut index = 0;
    for i in 0..n {
        let row_len = n - i;
        let (a, b, c) = (w0[i], w1[i], w2[i]);
        // all fifteen pseudo-sites missing for taxon i
        if a == MISSING_WORD && b == MISSING_WORD && c == MISSING_WORD {
            index += row_len;
            continue;
        }
        let row = &mut distances[index..index + row_len];
        for (cell, j) in row.iter_mut().zip(i..n) {
            *cell += l0[(a | w0[j]) as usize] as i64
                + l1[(b | w1[j]) as usize] as i64
                + l2[(c | w2[j]) as usize] as i64;
        }
        index += row_len;
    }
}

/// Merge stage: sums every worker's result, then normalizes by `sumPk`
fn merge(num_taxa: usize, rx: Receiver<PartialSums>, abort: &AtomicBool) -> Result<(Vec<f64>, f64)> {
    let mut total = PartialSums::new(num_taxa);
    let mut num_results = 0usize;
    for partial in rx.iter() {
        total.add_all(&partial);
        num_results += 1;
    }

    if abort.load(Ordering::SeqCst) {
        return Err(KinshipError::Pipeline {
            stage: PipelineStage::Merge,
            message: "aborted after an upstream failure".to_string(),
        });
    }
    log::debug!(
        "Centered IBS: merged {} worker results covering {} pseudo-sites",
        num_results,
        total.num_sites
    );

    if total.sum_pi == 0 {
        return Err(KinshipError::NoInformativeSites);
    }
    let sum_pk = 2.0 * (total.sum_pi as f64 / SUM_PI_SCALE);
    let values = total
        .distances
        .iter()
        .map(|&raw| raw as f64 / DISTANCE_SCALE / sum_pk)
        .collect();
    Ok((values, sum_pk))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::feature::{Chromosome, GenomicFeature};
    use crate::data::site_builder::{HaplotypeSiteBuilder, SnpSiteBuilder};
    use crate::data::table::FeatureTableBuilder;
    use crate::data::taxa::TaxaListBuilder;
    use std::sync::Arc;

    fn table(sites: &[&[&str]]) -> FeatureTable {
        let n = sites.first().map(|s| s.len()).unwrap_or(0);
        let taxa = (0..n).map(|i| format!("t{}", i)).collect::<TaxaListBuilder>().build();
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

    #[test]
    fn test_config_validation() {
        assert!(KinshipConfig::default().validate().is_ok());
        for max_alleles in [0, 1, 256] {
            let config = KinshipConfig {
                max_alleles,
                ..Default::default()
            };
            assert!(matches!(config.validate(), Err(KinshipError::Config(_))));
        }
        let config = KinshipConfig {
            num_workers: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(default_num_workers() >= 1);
    }

    #[test]
    fn test_three_sample_example() {
        let t = table(&[&["A", "M", "C"]]);
        let matrix = EndelmanKinship::new(&t).num_workers(2).build().unwrap();

        let expected = [[2.0, 0.0, -2.0], [0.0, 0.0, 0.0], [-2.0, 0.0, 2.0]];
        for i in 0..3 {
            for j in 0..3 {
                assert!((matrix.get(i, j) - expected[i][j]).abs() < 1e-9);
            }
        }
        assert_eq!(matrix.annotation(MATRIX_TYPE), Some(CENTERED_IBS_METHOD));
        let sum_pk: f64 = matrix.annotation(CENTERED_IBS_SUMPK).unwrap().parse().unwrap();
        assert!((sum_pk - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_monomorphic_table_has_no_informative_sites() {
        let t = table(&[&["A", "A", "A"], &["C", "N", "C"]]);
        let err = EndelmanKinship::new(&t).build().unwrap_err();
        assert!(matches!(err, KinshipError::NoInformativeSites));
    }

    #[test]
    fn test_uninformative_haploid_site_is_skipped() {
        let t = table(&[&["A", "M", "C"]]);
        let mut builder = FeatureTableBuilder::new(Arc::clone(t.taxa()));
        builder.add_all(t.iter().cloned()).unwrap();
        let feature = GenomicFeature::range(Chromosome::new("2"), 1, 50);
        let mut haploid = HaplotypeSiteBuilder::new(feature, Arc::clone(t.taxa()), 1).unwrap();
        haploid.set(0, &["h1"]).unwrap();
        haploid.set(2, &["h1"]).unwrap();
        builder.add(haploid.build().unwrap()).unwrap();
        let with_haploid = builder.build();

        let expected = EndelmanKinship::new(&t).build().unwrap();
        let matrix = EndelmanKinship::new(&with_haploid).build().unwrap();
        assert_eq!(matrix.upper_triangle(), expected.upper_triangle());
    }

    #[test]
    fn test_invalid_max_alleles_fails_before_running() {
        let t = table(&[&["A", "M", "C"]]);
        assert!(matches!(
            EndelmanKinship::new(&t).max_alleles(1).build(),
            Err(KinshipError::Config(_))
        ));
    }

    #[test]
    fn test_progress_reaches_100_and_never_decreases() {
        let seen = Mutex::new(Vec::new());
        let listener = |percent: u8, _: Option<&str>| {
            seen.lock().unwrap().push(percent);
        };
        let t = table(&[&["A", "M", "C"], &["G", "G", "T"]]);
        EndelmanKinship::new(&t)
            .num_workers(3)
            .with_listener(&listener)
            .build()
            .unwrap();

        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.last(), Some(&100));
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_progress_stays_ordered_under_slow_listener() {
        // several units finishing on different workers at once
        let rows: Vec<[&str; 3]> = (0..12_000)
            .map(|i| match i % 3 {
                0 => ["A", "M", "C"],
                1 => ["G", "T", "K"],
                _ => ["C", "Y", "T"],
            })
            .collect();
        let sites: Vec<&[&str]> = rows.iter().map(|r| &r[..]).collect();
        let t = table(&sites);

        let seen = Mutex::new(Vec::new());
        let listener = |percent: u8, _: Option<&str>| {
            if percent % 2 == 0 {
                thread::sleep(std::time::Duration::from_millis(5));
            }
            seen.lock().unwrap().push(percent);
        };
        EndelmanKinship::new(&t)
            .num_workers(4)
            .with_listener(&listener)
            .build()
            .unwrap();

        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.last(), Some(&100));
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_describe_minutes() {
        assert_eq!(describe_minutes(3.2), "3 minutes");
        assert_eq!(describe_minutes(125.0), "2 hours 5 minutes");
    }
}
