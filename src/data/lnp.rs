use std::collections::BTreeSet;

use log::{debug, info, warn};
use ndarray::Array2;

use super::model::{SampleEntry, SparseLikelihood};
use super::store::ObjectSampleStore;
use crate::error::{GridError, Result};

// ---------------------------------------------------------------------------
// SparseLikelihoodLoader
// ---------------------------------------------------------------------------

/// Assembles per-object sparse samples into aligned `(n_samples, n_objects)`
/// value and index matrices.
///
/// The sample count of the first object fixes `n_samples` for the whole run.
/// After assembly a single global shift is subtracted from every value so the
/// overall maximum becomes `0.0`; the same offset applies to every object,
/// which keeps likelihoods comparable across objects.
pub struct SparseLikelihoodLoader;

impl SparseLikelihoodLoader {
    /// Load every object of `store`, in the store's enumeration order.
    ///
    /// That order becomes the column order of both matrices and is recorded in
    /// [`SparseLikelihood::keys`]. Callers that must match an external object
    /// list should prefer [`SparseLikelihoodLoader::load_ordered`].
    pub fn load<S>(store: &S, expected_objects: usize) -> Result<SparseLikelihood>
    where
        S: ObjectSampleStore + ?Sized,
    {
        let keys = store.keys();
        if keys.len() != expected_objects {
            return Err(GridError::CountMismatch {
                expected: expected_objects,
                actual: keys.len(),
            });
        }
        assemble(store, keys)
    }

    /// Load objects in the order given by `keys`.
    ///
    /// `keys` must name every object in the store exactly once.
    pub fn load_ordered<S>(store: &S, keys: &[String]) -> Result<SparseLikelihood>
    where
        S: ObjectSampleStore + ?Sized,
    {
        let actual = store.len();
        if actual != keys.len() {
            return Err(GridError::CountMismatch {
                expected: keys.len(),
                actual,
            });
        }
        let mut seen = BTreeSet::new();
        for key in keys {
            if !seen.insert(key.as_str()) {
                return Err(GridError::DuplicateObject(key.clone()));
            }
        }
        assemble(store, keys.to_vec())
    }
}

fn assemble<S>(store: &S, keys: Vec<String>) -> Result<SparseLikelihood>
where
    S: ObjectSampleStore + ?Sized,
{
    let n_objects = keys.len();

    // Reference object fixes the shape before anything is written.
    let first = match keys.first() {
        Some(key) => Some(validated_entry(store, key)?),
        None => None,
    };
    let n_samples = first.as_ref().map_or(0, SampleEntry::len);

    let mut values = Array2::<f64>::zeros((n_samples, n_objects));
    let mut indices = Array2::<usize>::zeros((n_samples, n_objects));
    let mut with_duplicates = 0usize;

    let mut first = first;
    for (col, key) in keys.iter().enumerate() {
        let entry = match first.take() {
            Some(entry) => entry,
            None => validated_entry(store, key)?,
        };
        if entry.len() != n_samples {
            return Err(GridError::ShapeMismatch {
                key: key.clone(),
                expected: n_samples,
                actual: entry.len(),
            });
        }

        let mut rows = BTreeSet::new();
        for (i, (&idx, &lnp)) in entry.index.iter().zip(&entry.lnp).enumerate() {
            let row = usize::try_from(idx).map_err(|_| GridError::NegativeIndex {
                key: key.clone(),
                sample: i,
                index: idx,
            })?;
            rows.insert(row);
            indices[[i, col]] = row;
            values[[i, col]] = lnp;
        }
        if rows.len() != n_samples {
            debug!("object '{key}': {} repeated grid indices", n_samples - rows.len());
            with_duplicates += 1;
        }
    }

    if with_duplicates > 0 {
        warn!("{with_duplicates} of {n_objects} objects sample the same grid row more than once");
    }

    let shift = normalise(&mut values)?;
    info!("loaded {n_objects} objects x {n_samples} samples, global lnp shift {shift}");

    Ok(SparseLikelihood {
        values,
        indices,
        keys,
        shift,
    })
}

/// Fetch an entry and check that its two sequences line up.
fn validated_entry<S>(store: &S, key: &str) -> Result<SampleEntry>
where
    S: ObjectSampleStore + ?Sized,
{
    let entry = store.entry(key)?;
    if entry.index.len() != entry.lnp.len() {
        return Err(GridError::EntryLengthMismatch {
            key: key.to_string(),
            n_index: entry.index.len(),
            n_value: entry.lnp.len(),
        });
    }
    Ok(entry)
}

/// Subtract the global maximum from every entry and return it.
///
/// An empty matrix is left untouched with a shift of `0.0`.
fn normalise(values: &mut Array2<f64>) -> Result<f64> {
    if values.is_empty() {
        return Ok(0.0);
    }
    let max = values.iter().copied().fold(f64::NAN, f64::max);
    if !max.is_finite() {
        return Err(GridError::NonFiniteMaximum(max));
    }
    values.mapv_inplace(|v| v - max);
    Ok(max)
}
