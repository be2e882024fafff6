/// Duplicate Analyzer - duplicate detection for nested educational content data
///
/// This library extracts the subject > topic > title hierarchy from a generated
/// data file and reports names that occur more than once at each level.

// Re-export core modules
pub mod core;
pub mod utils;

// Re-export main analyzer types for convenience
pub use crate::core::analyzer::{AnalysisError, AnalysisOptions, AnalysisReport, DuplicateAnalyzer};
pub use crate::core::extractor::{ExtractionError, Strategy};
pub use crate::core::patterns::MarkerSet;
pub use crate::core::reporter::{ContextPath, DuplicateEntry, Level, LevelReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Analyze a text and return the duplicate report
///
/// This is a convenience function for simple use cases. It performs no I/O.
///
/// # Arguments
///
/// * `text` - The data file content
/// * `options` - Strategy and marker configuration
pub fn analyze(text: &str, options: &AnalysisOptions) -> Result<AnalysisReport, AnalysisError> {
    DuplicateAnalyzer::new(options)?.analyze(text)
}

/// Read and analyze a single file
///
/// # Arguments
///
/// * `file_path` - Path to the data file
/// * `options` - Strategy and marker configuration
pub fn analyze_file<P: AsRef<std::path::Path>>(
    file_path: P,
    options: &AnalysisOptions,
) -> anyhow::Result<AnalysisReport> {
    let analyzer = DuplicateAnalyzer::new(options)?;
    analyzer.analyze_file(file_path.as_ref())
}

/// Library configuration and utilities
pub mod config {
    use std::path::Path;

    use anyhow::{Context, Result};

    use crate::core::analyzer::AnalysisOptions;

    /// Create default configuration: structured strategy, default markers
    pub fn default_config() -> AnalysisOptions {
        AnalysisOptions::default()
    }

    /// Read analysis options from a JSON file. Missing fields take defaults.
    pub fn read_config(path: &Path) -> Result<AnalysisOptions> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
        serde_json::from_str(&config_str)
            .with_context(|| format!("Invalid JSON in configuration file {}", path.display()))
    }

}
