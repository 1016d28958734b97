// matrix.rs - Symmetric distance / kinship matrix with annotations

use crate::data::taxa::{TaxaList, TaxaListBuilder};
use crate::error::{KinshipError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Annotation key naming the kind of matrix
pub const MATRIX_TYPE: &str = "Matrix_Type";
/// Annotation key holding the centered-IBS normalization constant
pub const CENTERED_IBS_SUMPK: &str = "Centered_IBS.SumPk";
/// `MATRIX_TYPE` value for centered-IBS kinship
pub const CENTERED_IBS_METHOD: &str = "Centered_IBS";

/// Number of stored cells for an `n × n` symmetric matrix
pub fn triangle_len(n: usize) -> usize {
    n * (n + 1) / 2
}

/// Offset of the cell `(i, j)`, `i <= j`, in a row-major upper triangle
#[inline]
pub fn triangle_index(n: usize, i: usize, j: usize) -> usize {
    i * n - i * (i + 1) / 2 + j
}

/// Symmetric `n × n` matrix stored as its upper triangle.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    taxa: Arc<TaxaList>,
    values: Vec<f64>,
    annotations: BTreeMap<String, String>,
}

impl DistanceMatrix {
    /// `values` holds rows `i = 0..n`, columns `j = i..n`
    pub fn from_upper_triangle(
        taxa: Arc<TaxaList>,
        values: Vec<f64>,
        annotations: BTreeMap<String, String>,
    ) -> Result<Self> {
        let expected = triangle_len(taxa.len());
        if values.len() != expected {
            return Err(KinshipError::Config(format!(
                "upper triangle for {} taxa needs {} values, got {}",
                taxa.len(),
                expected,
                values.len()
            )));
        }
        Ok(Self {
            taxa,
            values,
            annotations,
        })
    }

    /// Number of rows (and columns)
    pub fn size(&self) -> usize {
        self.taxa.len()
    }

    pub fn taxa(&self) -> &Arc<TaxaList> {
        &self.taxa
    }

    /// Value at `(i, j)`; symmetric in its arguments.
    ///
    /// Panics if either index is out of range.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        let n = self.size();
        assert!(i < n && j < n, "index ({}, {}) out of range for {}", i, j, n);
        let (lo, hi) = if i <= j { (i, j) } else { (j, i) };
        self.values[triangle_index(n, lo, hi)]
    }

    pub fn upper_triangle(&self) -> &[f64] {
        &self.values
    }

    pub fn annotations(&self) -> &BTreeMap<String, String> {
        &self.annotations
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }

    pub fn annotate(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.annotations.insert(key.into(), value.into());
    }

    /// Iterate a full row, including the mirrored lower half
    pub fn row(&self, i: usize) -> impl Iterator<Item = f64> + '_ {
        (0..self.size()).map(move |j| self.get(i, j))
    }

    pub fn diagonal(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.size()).map(move |i| self.get(i, i))
    }

    /// Off-diagonal cells of the upper triangle
    pub fn off_diagonal(&self) -> impl Iterator<Item = f64> + '_ {
        let n = self.size();
        (0..n).flat_map(move |i| (i + 1..n).map(move |j| self.get(i, j)))
    }
}

/// Serializable form of a [`DistanceMatrix`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixRecord {
    pub taxa: Vec<String>,
    pub upper_triangle: Vec<f64>,
    pub annotations: BTreeMap<String, String>,
}

impl From<&DistanceMatrix> for MatrixRecord {
    fn from(matrix: &DistanceMatrix) -> Self {
        Self {
            taxa: matrix.taxa.names().iter().map(|s| s.to_string()).collect(),
            upper_triangle: matrix.values.clone(),
            annotations: matrix.annotations.clone(),
        }
    }
}

impl TryFrom<MatrixRecord> for DistanceMatrix {
    type Error = KinshipError;

    fn try_from(record: MatrixRecord) -> Result<Self> {
        let declared = record.taxa.len();
        let taxa = record.taxa.iter().collect::<TaxaListBuilder>().build();
        if taxa.len() != declared {
            return Err(KinshipError::Serialization(format!(
                "matrix lists {} taxa but only {} are distinct",
                declared,
                taxa.len()
            )));
        }
        DistanceMatrix::from_upper_triangle(taxa, record.upper_triangle, record.annotations)
    }
}
