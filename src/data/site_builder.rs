// site_builder.rs - Builders turning per-taxon string calls into feature sites

use crate::data::feature::GenomicFeature;
use crate::data::nucleotide;
use crate::data::site::{
    FeatureSite, GenotypeMatrix, HaplotypeAnnotation, SiteVariant, UNKNOWN_ALLELE,
};
use crate::data::taxa::TaxaList;
use crate::error::{KinshipError, Result};
use std::collections::HashMap;
use std::sync::Arc;

const MAX_STATES: usize = UNKNOWN_ALLELE as usize;

fn check_taxon(taxa: &TaxaList, taxon: usize) -> Result<()> {
    if taxon >= taxa.len() {
        return Err(KinshipError::TaxonIndexOutOfRange {
            index: taxon,
            num_taxa: taxa.len(),
        });
    }
    Ok(())
}

fn lookup_taxon(taxa: &TaxaList, name: &str) -> Result<usize> {
    taxa.index_of(name)
        .ok_or_else(|| KinshipError::UnknownTaxon(name.to_string()))
}

/// Builds a [`FeatureSite`] with named allele states.
///
/// Without a fixed state list, unseen state strings get new codes in
/// encounter order. `""` and `"."` are always missing.
#[derive(Debug)]
pub struct HaplotypeSiteBuilder {
    feature: GenomicFeature,
    taxa: Arc<TaxaList>,
    ploidy: usize,
    fixed_states: bool,
    states: Vec<String>,
    state_codes: HashMap<String, u8>,
    annotations: Option<Vec<Option<HaplotypeAnnotation>>>,
    genotypes: GenotypeMatrix,
    phased: bool,
    weight: Option<f64>,
}

impl HaplotypeSiteBuilder {
    pub fn new(feature: GenomicFeature, taxa: Arc<TaxaList>, ploidy: usize) -> Result<Self> {
        if ploidy == 0 {
            return Err(KinshipError::Config("ploidy must be at least 1".to_string()));
        }
        let genotypes = GenotypeMatrix::missing(taxa.len(), ploidy);
        Ok(Self {
            feature,
            taxa,
            ploidy,
            fixed_states: false,
            states: Vec::new(),
            state_codes: HashMap::new(),
            annotations: None,
            genotypes,
            phased: false,
            weight: None,
        })
    }

    /// Builder restricted to `states`; any other state string is rejected
    pub fn with_states(
        feature: GenomicFeature,
        taxa: Arc<TaxaList>,
        ploidy: usize,
        states: Vec<String>,
    ) -> Result<Self> {
        if states.len() > MAX_STATES {
            return Err(KinshipError::TooManyStates);
        }
        let mut builder = Self::new(feature, taxa, ploidy)?;
        for (code, state) in states.iter().enumerate() {
            if builder.state_codes.insert(state.clone(), code as u8).is_some() {
                return Err(KinshipError::Config(format!(
                    "duplicate haplotype state: {}",
                    state
                )));
            }
        }
        builder.states = states;
        builder.fixed_states = true;
        Ok(builder)
    }

    /// Attach one optional annotation per fixed state
    pub fn annotations(mut self, annotations: Vec<Option<HaplotypeAnnotation>>) -> Result<Self> {
        if !self.fixed_states {
            return Err(KinshipError::Config(
                "states must be specified when supplying haplotype annotations".to_string(),
            ));
        }
        if annotations.len() != self.states.len() {
            return Err(KinshipError::Config(format!(
                "{} states but {} haplotype annotations",
                self.states.len(),
                annotations.len()
            )));
        }
        self.annotations = if annotations.iter().all(Option::is_none) {
            None
        } else {
            Some(annotations)
        };
        Ok(self)
    }

    pub fn phased(mut self, phased: bool) -> Self {
        self.phased = phased;
        self
    }

    pub fn weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    /// Set the allele states of one taxon. Either every value is applied or,
    /// on error, none is.
    pub fn set(&mut self, taxon: usize, values: &[&str]) -> Result<&mut Self> {
        check_taxon(&self.taxa, taxon)?;
        if values.len() != self.ploidy {
            return Err(KinshipError::WrongPloidy {
                expected: self.ploidy,
                found: values.len(),
            });
        }

        let mut pending: Vec<String> = Vec::new();
        let mut codes = Vec::with_capacity(self.ploidy);
        for value in values {
            codes.push(self.code_for(value, &mut pending)?);
        }

        for state in pending {
            self.state_codes.insert(state.clone(), self.states.len() as u8);
            self.states.push(state);
        }
        self.genotypes.set_row(taxon, &codes);
        Ok(self)
    }

    pub fn set_by_name(&mut self, taxon: &str, values: &[&str]) -> Result<&mut Self> {
        let index = lookup_taxon(&self.taxa, taxon)?;
        self.set(index, values)
    }

    /// Set from a separated call such as `"A/C"`, `"h1|h2"` or `"./."`
    pub fn set_call(&mut self, taxon: usize, call: &str) -> Result<&mut Self> {
        let values: Vec<&str> = call.split(['/', '|']).collect();
        self.set(taxon, &values)
    }

    fn code_for(&self, value: &str, pending: &mut Vec<String>) -> Result<u8> {
        if value.is_empty() || value == "." {
            return Ok(UNKNOWN_ALLELE);
        }
        if let Some(&code) = self.state_codes.get(value) {
            return Ok(code);
        }
        if self.fixed_states {
            return Err(KinshipError::UnknownState {
                state: value.to_string(),
                allowed: self.states.join(","),
            });
        }
        if let Some(pos) = pending.iter().position(|s| s == value) {
            return Ok((self.states.len() + pos) as u8);
        }
        let code = self.states.len() + pending.len();
        if code >= MAX_STATES {
            return Err(KinshipError::TooManyStates);
        }
        pending.push(value.to_string());
        Ok(code as u8)
    }

    pub fn build(self) -> Result<FeatureSite> {
        FeatureSite::new(
            self.feature,
            self.taxa,
            self.genotypes,
            self.weight,
            self.phased,
            SiteVariant::Haplotype {
                states: self.states,
                annotations: self.annotations,
            },
        )
    }
}

/// Builds a diploid nucleotide [`FeatureSite`]
#[derive(Debug)]
pub struct SnpSiteBuilder {
    feature: GenomicFeature,
    taxa: Arc<TaxaList>,
    genotypes: GenotypeMatrix,
    phased: bool,
    weight: Option<f64>,
}

impl SnpSiteBuilder {
    pub fn new(feature: GenomicFeature, taxa: Arc<TaxaList>) -> Self {
        let genotypes = GenotypeMatrix::missing(taxa.len(), 2);
        Self {
            feature,
            taxa,
            genotypes,
            phased: false,
            weight: None,
        }
    }

    pub fn phased(mut self, phased: bool) -> Self {
        self.phased = phased;
        self
    }

    pub fn weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn set(&mut self, taxon: usize, alleles: [u8; 2]) -> Result<&mut Self> {
        check_taxon(&self.taxa, taxon)?;
        self.genotypes.set_row(taxon, &alleles);
        Ok(self)
    }

    /// Set from a nucleotide call (`"A"`, `"R"`, `"AG"`, `"A/G"`, `"N"`)
    pub fn set_call(&mut self, taxon: usize, call: &str) -> Result<&mut Self> {
        let alleles =
            nucleotide::parse_diploid_call(call).ok_or_else(|| KinshipError::UnknownState {
                state: call.to_string(),
                allowed: "IUPAC nucleotide codes".to_string(),
            })?;
        self.set(taxon, alleles)
    }

    pub fn set_call_by_name(&mut self, taxon: &str, call: &str) -> Result<&mut Self> {
        let index = lookup_taxon(&self.taxa, taxon)?;
        self.set_call(index, call)
    }

    pub fn build(self) -> Result<FeatureSite> {
        FeatureSite::new(
            self.feature,
            self.taxa,
            self.genotypes,
            self.weight,
            self.phased,
            SiteVariant::Snp,
        )
    }
}
