//! Gather model-grid parameters at the sparse log-likelihood samples of a
//! population of objects.
//!
//! [`data::lnp::SparseLikelihoodLoader`] turns a keyed store of per-object
//! `(grid index, lnp)` samples into aligned `(n_samples, n_objects)` matrices,
//! [`data::grid::ModelGridReader`] reads the requested parameters (deriving
//! completeness from the noise grid) and [`data::gather::GatherEngine`] looks
//! each parameter up at every sampled grid row.

pub mod config;
pub mod data;
pub mod error;
pub mod pipeline;

pub use config::{GridConfig, COMPLETENESS, DEFAULT_PARAMETERS};
pub use error::{GridError, Result, StoreKind};
pub use pipeline::{run_pipeline, run_pipeline_ordered};
