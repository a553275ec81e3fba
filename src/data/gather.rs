use log::debug;
use ndarray::{Array1, Array2};
use rayon::prelude::*;

use super::model::{GatheredTable, ParameterTable, SparseLikelihood};
use crate::error::{GridError, Result};

// ---------------------------------------------------------------------------
// GatherEngine
// ---------------------------------------------------------------------------

/// Looks up every parameter at the grid rows referenced by an index matrix.
///
/// For each parameter `p` the output satisfies
/// `out[p][[i, j]] == table[p][indices[[i, j]]]`. Parameters are independent,
/// so with `parallel` set they are gathered on the rayon pool; the result is
/// identical either way.
#[derive(Debug, Clone, Copy)]
pub struct GatherEngine {
    pub parallel: bool,
}

impl Default for GatherEngine {
    fn default() -> Self {
        GatherEngine { parallel: true }
    }
}

impl GatherEngine {
    pub fn new(parallel: bool) -> Self {
        GatherEngine { parallel }
    }

    /// Gather against a loaded [`SparseLikelihood`], reporting object keys on failure.
    pub fn gather(&self, lnp: &SparseLikelihood, table: &ParameterTable) -> Result<GatheredTable> {
        self.gather_indices(&lnp.indices, table, &lnp.keys)
    }

    /// Gather against a bare index matrix. `keys` names the columns for error
    /// messages and may be empty.
    pub fn gather_indices(
        &self,
        indices: &Array2<usize>,
        table: &ParameterTable,
        keys: &[String],
    ) -> Result<GatheredTable> {
        let (n_samples, n_objects) = indices.dim();
        debug!(
            "gathering {} parameters over {n_samples} x {n_objects} samples",
            table.len()
        );

        let gathered: Vec<(String, Array2<f64>)> = if self.parallel {
            table
                .par_iter()
                .map(|(name, column)| {
                    gather_one(name, column, indices, keys).map(|out| (name.clone(), out))
                })
                .collect::<Result<_>>()?
        } else {
            table
                .iter()
                .map(|(name, column)| {
                    gather_one(name, column, indices, keys).map(|out| (name.clone(), out))
                })
                .collect::<Result<_>>()?
        };

        Ok(gathered.into_iter().collect())
    }
}

/// Bounds-check the whole index matrix, then take values in one pass.
fn gather_one(
    name: &str,
    column: &Array1<f64>,
    indices: &Array2<usize>,
    keys: &[String],
) -> Result<Array2<f64>> {
    let len = column.len();
    let outside = indices.indexed_iter().find(|(_, idx)| **idx >= len);
    if let Some(((sample, object), &index)) = outside {
        return Err(GridError::GridIndexOutOfRange {
            parameter: name.to_string(),
            sample,
            object,
            key: keys.get(object).cloned().unwrap_or_default(),
            index,
            len,
        });
    }

    Ok(indices.mapv(|idx| column[idx]))
}
