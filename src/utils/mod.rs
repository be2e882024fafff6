/// Utility modules for the duplicate analyzer
///
/// This module contains helpers for reading source files and for rendering
/// and exporting reports.

pub mod file_utils;
pub mod output_formatter;
