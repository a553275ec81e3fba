use std::collections::BTreeMap;

use ndarray::{Array1, Array2};

// ---------------------------------------------------------------------------
// SampleEntry – one object's sparse samples
// ---------------------------------------------------------------------------

/// The sparse log-likelihood samples recorded for a single object.
///
/// `index[i]` is the model-grid row that `lnp[i]` was evaluated at.
/// Samples are neither sorted nor deduplicated.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleEntry {
    pub index: Vec<i64>,
    pub lnp: Vec<f64>,
}

impl SampleEntry {
    pub fn new(index: Vec<i64>, lnp: Vec<f64>) -> Self {
        SampleEntry { index, lnp }
    }

    /// Number of samples, as defined by the index sequence.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

// ---------------------------------------------------------------------------
// SparseLikelihood – aligned (n_samples, n_objects) matrices
// ---------------------------------------------------------------------------

/// Dense, normalised log-likelihood samples for a population of objects.
///
/// Column `j` of both matrices belongs to `keys[j]`; row `i` is the `i`-th
/// sample slot. `values` has already had `shift` (the global maximum)
/// subtracted, so its largest entry is exactly `0.0`.
#[derive(Debug, Clone)]
pub struct SparseLikelihood {
    pub values: Array2<f64>,
    pub indices: Array2<usize>,
    pub keys: Vec<String>,
    pub shift: f64,
}

impl SparseLikelihood {
    /// `(n_samples, n_objects)`.
    pub fn shape(&self) -> (usize, usize) {
        self.values.dim()
    }

    pub fn n_samples(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_objects(&self) -> usize {
        self.values.ncols()
    }
}

// ---------------------------------------------------------------------------
// Parameter / gathered tables
// ---------------------------------------------------------------------------

/// Parameter name → 1-D array indexed by model-grid row.
///
/// A `BTreeMap` keeps iteration (and hence logging and export column order)
/// deterministic.
pub type ParameterTable = BTreeMap<String, Array1<f64>>;

/// Parameter name → `(n_samples, n_objects)` matrix aligned with
/// [`SparseLikelihood::indices`].
pub type GatheredTable = BTreeMap<String, Array2<f64>>;

/// Everything downstream fitting needs: normalised samples plus the model
/// parameters evaluated at the same grid rows.
#[derive(Debug, Clone)]
pub struct GridProduct {
    pub likelihood: SparseLikelihood,
    pub gathered: GatheredTable,
}
