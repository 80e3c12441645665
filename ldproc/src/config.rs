use std::path::Path;

use common::FileFormat;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Run options shared by the stacking and PAL pipelines.
///
/// Every field is optional in the file; missing ones take the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessConfig {
    /// Worker threads per run.
    pub threads: usize,
    /// Turns off the differential dropout rescue when stacking.
    pub disable_diff_dod: bool,
    pub reverse_field_order: bool,
    /// Decode luma only.
    pub black_and_white: bool,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            disable_diff_dod: false,
            reverse_field_order: false,
            black_and_white: false,
        }
    }
}

impl ProcessConfig {
    /// Loads a YAML or JSON file, chosen by extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: Self = common::load_file(path)?;
        tracing::info!("Loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    pub fn parse(text: &str, format: FileFormat) -> Result<Self> {
        Ok(common::deserialize(text, format)?)
    }
}
