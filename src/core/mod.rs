/// Core module for duplicate analysis
///
/// This module contains the marker patterns, the hierarchical extractor, context
/// resolution and the duplicate frequency reporter.

pub mod analyzer;
pub mod context;
pub mod extractor;
pub mod patterns;
pub mod reporter;
