use std::path::PathBuf;

use super::config::FlowmarkConfig;

/// A discovered flowmark project
#[derive(Debug)]
pub struct Project {
    /// Root directory of the project (parent of `flowmark/`)
    pub root: PathBuf,
    /// Path to the `flowmark/` directory
    pub flowmark_dir: PathBuf,
    /// Parsed config.toml
    pub config: FlowmarkConfig,
}

impl Project {
    pub fn document_path(&self) -> PathBuf {
        self.flowmark_dir.join(&self.config.document.file)
    }

    pub fn fallback_path(&self) -> PathBuf {
        self.flowmark_dir.join(&self.config.document.fallback)
    }
}
