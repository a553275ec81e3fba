/// Data layer: stores, sparse-likelihood loading, grid reading and gathering.
///
/// Architecture:
/// ```text
///  sample store            physics grid    noise grid
///  (.parquet / .json)      (.parquet/.csv) (.parquet)
///        │                        │            │
///        ▼                        └─────┬──────┘
///   ┌──────────┐                        ▼
///   │   lnp    │  keys → (values,  ┌──────────┐
///   └──────────┘    indices)       │   grid   │  name → column,
///        │                         └──────────┘  completeness = row max
///        │  indices                     │
///        ▼                              ▼
///   ┌──────────────────────────────────────┐
///   │               gather                 │  name → (n_samples, n_objects)
///   └──────────────────────────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  export  │  long-format Parquet
///   └──────────┘
/// ```

pub mod export;
pub mod gather;
pub mod grid;
pub mod lnp;
pub mod loader;
pub mod model;
pub mod store;
