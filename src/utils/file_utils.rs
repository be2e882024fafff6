/// File handling utilities
///
/// This module reads the data file to be analyzed and detects its kind from
/// the extension.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::{debug, warn};

/// Kind of source file, based on its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// TypeScript module (e.g. a generated `videos.ts`)
    TypeScript,
    /// JavaScript module
    JavaScript,
    /// JSON document
    Json,
    /// Anything else, treated as plain text
    Text,
}

/// Content of a source file and its kind
#[derive(Debug)]
pub struct SourceFile {
    pub path: PathBuf,
    pub kind: SourceKind,
    /// The content of the file as a string
    pub content: String,
}

/// Read a source file with proper error handling.
///
/// # Arguments
///
/// * `file_path` - Path to the file
///
/// # Returns
///
/// The file content and kind, or an error if the file does not exist or
/// is not valid UTF-8
pub fn read_source(file_path: &Path) -> Result<SourceFile> {
    if !file_path.exists() {
        bail!("File not found: {}", file_path.display());
    }
    if !file_path.is_file() {
        bail!("Not a file: {}", file_path.display());
    }

    let content = fs::read_to_string(file_path)
        .with_context(|| format!("Failed to read {} as UTF-8 text", file_path.display()))?;

    if content.chars().any(|c| c.is_control() && !c.is_whitespace()) {
        warn!("{} contains control characters", file_path.display());
    }

    let kind = detect_source_kind(file_path);
    debug!("Read {} bytes from {} ({:?})", content.len(), file_path.display(), kind);

    Ok(SourceFile {
        path: file_path.to_path_buf(),
        kind,
        content,
    })
}

/// Detect the source kind from the file extension.
pub fn detect_source_kind(file_path: &Path) -> SourceKind {
    let extension = file_path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "ts" | "tsx" | "mts" => SourceKind::TypeScript,
        "js" | "jsx" | "mjs" | "cjs" => SourceKind::JavaScript,
        "json" => SourceKind::Json,
        _ => SourceKind::Text,
    }
}
