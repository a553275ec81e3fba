use std::collections::BTreeMap;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use super::model::SampleEntry;
use crate::error::{GridError, Result};

// ---------------------------------------------------------------------------
// Store interfaces
// ---------------------------------------------------------------------------

/// Keyed container of per-object sparse samples.
pub trait ObjectSampleStore {
    /// Object keys in the store's native enumeration order.
    fn keys(&self) -> Vec<String>;

    /// Samples recorded for `key`.
    fn entry(&self, key: &str) -> Result<SampleEntry>;

    fn len(&self) -> usize {
        self.keys().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Physics model grid: one 1-D column per named parameter, indexed by grid row.
pub trait PhysicsGridStore {
    fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>>;
}

/// Noise model grid: one `(grid rows, realizations)` array per named parameter.
pub trait NoiseGridStore {
    fn column(&self, name: &str) -> Option<ArrayView2<'_, f64>>;
}

// ---------------------------------------------------------------------------
// In-memory implementations
// ---------------------------------------------------------------------------

/// Sample store held in memory; keys enumerate in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemorySampleStore {
    order: Vec<String>,
    entries: BTreeMap<String, SampleEntry>,
}

impl MemorySampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) an object. A replaced object keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, entry: SampleEntry) {
        let key = key.into();
        if self.entries.insert(key.clone(), entry).is_none() {
            self.order.push(key);
        }
    }
}

impl ObjectSampleStore for MemorySampleStore {
    fn keys(&self) -> Vec<String> {
        self.order.clone()
    }

    fn entry(&self, key: &str) -> Result<SampleEntry> {
        self.entries
            .get(key)
            .cloned()
            .ok_or_else(|| GridError::MissingObject(key.to_string()))
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}

/// Physics grid held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryPhysicsGrid {
    pub columns: BTreeMap<String, Array1<f64>>,
}

impl MemoryPhysicsGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_column(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.columns.insert(name.into(), Array1::from(values));
        self
    }

    /// Number of grid rows, taken from the first column.
    pub fn n_rows(&self) -> Option<usize> {
        self.columns.values().next().map(|c| c.len())
    }
}

impl PhysicsGridStore for MemoryPhysicsGrid {
    fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        self.columns.get(name).map(|c| c.view())
    }
}

/// Noise grid held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryNoiseGrid {
    pub columns: BTreeMap<String, Array2<f64>>,
}

impl MemoryNoiseGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_column(mut self, name: impl Into<String>, values: Array2<f64>) -> Self {
        self.columns.insert(name.into(), values);
        self
    }
}

impl NoiseGridStore for MemoryNoiseGrid {
    fn column(&self, name: &str) -> Option<ArrayView2<'_, f64>> {
        self.columns.get(name).map(|c| c.view())
    }
}
