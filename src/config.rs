use std::path::Path;

use serde::Deserialize;

use crate::error::Result;

/// Parameter derived from the noise grid rather than read from the physics grid.
pub const COMPLETENESS: &str = "completeness";

/// Parameters extracted when none are configured.
pub const DEFAULT_PARAMETERS: [&str; 7] = ["Av", "Rv", "f_A", "M_ini", "logA", "Z", COMPLETENESS];

// ---------------------------------------------------------------------------
// GridConfig
// ---------------------------------------------------------------------------

/// Run configuration. Every field is optional in the JSON file:
///
/// ```json
/// { "parameters": ["Av", "logA", "completeness"], "expected_objects": 120, "parallel": true }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    /// Model-grid parameters to gather.
    pub parameters: Vec<String>,
    /// Number of objects the sample store must hold. `None` accepts whatever
    /// the store contains.
    pub expected_objects: Option<usize>,
    /// Gather parameters on the rayon pool.
    pub parallel: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            parameters: DEFAULT_PARAMETERS.iter().map(|p| p.to_string()).collect(),
            expected_objects: None,
            parallel: true,
        }
    }
}

impl GridConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}
