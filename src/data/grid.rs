use log::{debug, warn};
use ndarray::{Array1, ArrayView2, Axis};

use super::model::ParameterTable;
use super::store::{NoiseGridStore, PhysicsGridStore};
use crate::config::COMPLETENESS;
use crate::error::{GridError, Result, StoreKind};

// ---------------------------------------------------------------------------
// ModelGridReader
// ---------------------------------------------------------------------------

/// Reads the requested model-grid parameters into a [`ParameterTable`].
///
/// Every name is copied from the physics grid except [`COMPLETENESS`], which
/// is derived from the noise grid as the maximum over noise realizations of
/// each grid row.
pub struct ModelGridReader;

impl ModelGridReader {
    pub fn load<P, N>(physics: &P, noise: &N, names: &[String]) -> Result<ParameterTable>
    where
        P: PhysicsGridStore + ?Sized,
        N: NoiseGridStore + ?Sized,
    {
        let mut table = ParameterTable::new();

        for name in names {
            let column = if name == COMPLETENESS {
                let trials = noise.column(name).ok_or_else(|| GridError::MissingParameter {
                    name: name.clone(),
                    store: StoreKind::Noise,
                })?;
                completeness(name, trials)?
            } else {
                physics
                    .column(name)
                    .ok_or_else(|| GridError::MissingParameter {
                        name: name.clone(),
                        store: StoreKind::Physics,
                    })?
                    .to_owned()
            };
            debug!("read parameter '{name}' ({} grid rows)", column.len());
            table.insert(name.clone(), column);
        }

        check_row_counts(&table);
        Ok(table)
    }
}

/// Row-wise maximum over noise realizations.
fn completeness(name: &str, trials: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
    if trials.ncols() == 0 && trials.nrows() > 0 {
        return Err(GridError::EmptyRealizations(name.to_string()));
    }
    Ok(trials.map_axis(Axis(1), |row| {
        row.iter().copied().fold(f64::NAN, f64::max)
    }))
}

/// The two grids are joined by row position only; disagreeing lengths usually
/// mean mismatched grid files.
fn check_row_counts(table: &ParameterTable) {
    let mut lengths = table.iter().map(|(name, col)| (name, col.len()));
    if let Some((first_name, first_len)) = lengths.next() {
        for (name, len) in lengths {
            if len != first_len {
                warn!(
                    "parameter '{name}' has {len} grid rows but '{first_name}' has {first_len}"
                );
            }
        }
    }
}
