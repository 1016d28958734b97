// encoding.rs - One-hot dosage codes, packed words and lookup tables

use crate::core::pseudo_site::PseudoSite;
use crate::data::site::UNKNOWN_ALLELE;

/// Pseudo-sites packed into one 15-bit word
pub const SITES_PER_WORD: usize = 5;
/// Words (sub-blocks) per block
pub const WORDS_PER_BLOCK: usize = 3;
pub const SITES_PER_BLOCK: usize = SITES_PER_WORD * WORDS_PER_BLOCK;
/// Blocks per schedulable unit of work
pub const BLOCKS_PER_UNIT: usize = 200;
pub const SITES_PER_UNIT: usize = SITES_PER_BLOCK * BLOCKS_PER_UNIT;

pub const DOSAGE_0: u16 = 0b001;
pub const DOSAGE_1: u16 = 0b010;
pub const DOSAGE_2: u16 = 0b100;
/// Union of the three dosage codes; dominates under OR
pub const MISSING_CODE: u16 = DOSAGE_0 | DOSAGE_1 | DOSAGE_2;
/// Word with all five sites missing
pub const MISSING_WORD: u16 = 0x7FFF;

const SLOTS_PER_SITE: usize = 8;
pub const TERMS_PER_WORD: usize = SITES_PER_WORD * SLOTS_PER_SITE;
pub const LOOKUP_SIZE: usize = 1 << (SITES_PER_WORD * 3);

/// Fixed-point scale of lookup values and pair accumulators. Integer sums
/// are exact, so results do not depend on how units were scheduled.
pub const DISTANCE_SCALE: f64 = (1u64 << 24) as f64;
/// Fixed-point scale of accumulated `p(1 - p)`
pub const SUM_PI_SCALE: f64 = (1u64 << 32) as f64;

/// One-hot code of a diploid call's dosage of `allele`
#[inline]
pub fn dosage_code(allele: u8, first: u8, second: u8) -> u16 {
    if allele == UNKNOWN_ALLELE || (first == UNKNOWN_ALLELE && second == UNKNOWN_ALLELE) {
        return MISSING_CODE;
    }
    match (first == allele) as u8 + (second == allele) as u8 {
        0 => DOSAGE_0,
        1 => DOSAGE_1,
        _ => DOSAGE_2,
    }
}

/// Recover the pair of dosages from two codes OR-ed together. `None` when
/// either side was missing.
pub fn decode_pair(or_code: u16) -> Option<(u8, u8)> {
    match or_code & MISSING_CODE {
        0b001 => Some((0, 0)),
        0b011 => Some((0, 1)),
        0b101 => Some((0, 2)),
        0b010 => Some((1, 1)),
        0b110 => Some((1, 2)),
        0b100 => Some((2, 2)),
        _ => None,
    }
}

/// Bit offset of site `k` (0..5) within a word; site 0 takes the high bits
#[inline]
fn site_shift(k: usize) -> usize {
    (SITES_PER_WORD - k - 1) * 3
}

/// Centered products `(x - 2p)(y - 2p)` for the five sites of one word,
/// indexed by `site * 8 + or_code`. Missing and unused slots are zero.
#[derive(Debug, Clone, PartialEq)]
pub struct TermTable {
    terms: [f32; TERMS_PER_WORD],
}

impl Default for TermTable {
    fn default() -> Self {
        Self {
            terms: [0.0; TERMS_PER_WORD],
        }
    }
}

impl TermTable {
    pub fn set_site(&mut self, site: usize, frequency: f64) {
        let two_p = frequency as f32 * 2.0;
        let base = site * SLOTS_PER_SITE;
        for or_code in 1..MISSING_CODE {
            if let Some((x, y)) = decode_pair(or_code) {
                self.terms[base + or_code as usize] = (x as f32 - two_p) * (y as f32 - two_p);
            }
        }
    }

    pub fn term(&self, site: usize, or_code: u16) -> f32 {
        self.terms[site * SLOTS_PER_SITE + (or_code & MISSING_CODE) as usize]
    }

    /// Fill `lookup` with the summed term of every 15-bit OR combination,
    /// as fixed-point integers scaled by [`DISTANCE_SCALE`]
    pub fn expand_into(&self, lookup: &mut [i32]) {
        debug_assert_eq!(lookup.len(), LOOKUP_SIZE);
        for (combined, slot) in lookup.iter_mut().enumerate() {
            let sum: f32 = (0..SITES_PER_WORD)
                .map(|k| self.terms[k * SLOTS_PER_SITE + ((combined >> site_shift(k)) & 7)])
                .sum();
            *slot = (sum as f64 * DISTANCE_SCALE).round() as i32;
        }
    }
}

/// Up to fifteen pseudo-sites packed per taxon into three words, with the
/// term table of each word
#[derive(Debug, Clone)]
pub struct PackedBlock {
    pub words: [Vec<u16>; WORDS_PER_BLOCK],
    pub terms: [TermTable; WORDS_PER_BLOCK],
    /// Sum of `p(1 - p)` over the packed pseudo-sites, scaled by [`SUM_PI_SCALE`]
    pub sum_pi: i64,
    pub num_sites: usize,
}

impl PackedBlock {
    /// Pack `sites` (at most [`SITES_PER_BLOCK`], all diploid) for `num_taxa`
    /// taxa. Positions not filled stay missing.
    pub fn pack(sites: &[PseudoSite<'_>], num_taxa: usize) -> Self {
        debug_assert!(sites.len() <= SITES_PER_BLOCK);
        let mut words = [
            vec![MISSING_WORD; num_taxa],
            vec![MISSING_WORD; num_taxa],
            vec![MISSING_WORD; num_taxa],
        ];
        let mut terms: [TermTable; WORDS_PER_BLOCK] = Default::default();
        let mut sum_pi = 0i64;

        for (n, pseudo) in sites.iter().enumerate() {
            let word = n / SITES_PER_WORD;
            let k = n % SITES_PER_WORD;
            let p = pseudo.frequency;
            sum_pi += (p * (1.0 - p) * SUM_PI_SCALE).round() as i64;
            terms[word].set_site(k, p);

            let shift = site_shift(k);
            let keep = !(MISSING_CODE << shift) & MISSING_WORD;
            for (taxon, packed) in words[word].iter_mut().enumerate() {
                let alleles = pseudo.site.genotype(taxon);
                let code = dosage_code(pseudo.allele, alleles[0], alleles[1]);
                *packed = (*packed & keep) | (code << shift);
            }
        }

        Self {
            words,
            terms,
            sum_pi,
            num_sites: sites.len(),
        }
    }
}
