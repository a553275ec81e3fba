use log::info;

use crate::config::GridConfig;
use crate::data::gather::GatherEngine;
use crate::data::grid::ModelGridReader;
use crate::data::lnp::SparseLikelihoodLoader;
use crate::data::model::{GridProduct, SparseLikelihood};
use crate::data::store::{NoiseGridStore, ObjectSampleStore, PhysicsGridStore};
use crate::error::{GridError, Result};

/// Load the sparse likelihoods, read the configured grid parameters and gather
/// them at the sampled grid rows. Any failure aborts the whole run.
pub fn run_pipeline<S, P, N>(
    samples: &S,
    physics: &P,
    noise: &N,
    config: &GridConfig,
) -> Result<GridProduct>
where
    S: ObjectSampleStore + ?Sized,
    P: PhysicsGridStore + ?Sized,
    N: NoiseGridStore + ?Sized,
{
    let expected = config.expected_objects.unwrap_or_else(|| samples.len());
    let likelihood = SparseLikelihoodLoader::load(samples, expected)?;
    gather_grid(likelihood, physics, noise, config)
}

/// As [`run_pipeline`], with the object (column) order given by `keys`.
///
/// A configured `expected_objects` must equal the number of keys.
pub fn run_pipeline_ordered<S, P, N>(
    samples: &S,
    physics: &P,
    noise: &N,
    keys: &[String],
    config: &GridConfig,
) -> Result<GridProduct>
where
    S: ObjectSampleStore + ?Sized,
    P: PhysicsGridStore + ?Sized,
    N: NoiseGridStore + ?Sized,
{
    if let Some(expected) = config.expected_objects {
        if expected != keys.len() {
            return Err(GridError::CountMismatch {
                expected,
                actual: keys.len(),
            });
        }
    }
    let likelihood = SparseLikelihoodLoader::load_ordered(samples, keys)?;
    gather_grid(likelihood, physics, noise, config)
}

fn gather_grid<P, N>(
    likelihood: SparseLikelihood,
    physics: &P,
    noise: &N,
    config: &GridConfig,
) -> Result<GridProduct>
where
    P: PhysicsGridStore + ?Sized,
    N: NoiseGridStore + ?Sized,
{
    let table = ModelGridReader::load(physics, noise, &config.parameters)?;
    let gathered = GatherEngine::new(config.parallel).gather(&likelihood, &table)?;

    info!(
        "gathered {} parameters for {} objects x {} samples",
        gathered.len(),
        likelihood.n_objects(),
        likelihood.n_samples()
    );
    Ok(GridProduct {
        likelihood,
        gathered,
    })
}
