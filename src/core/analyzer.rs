/// Core duplicate analyzer implementation
///
/// This file contains the DuplicateAnalyzer, which runs one extraction
/// strategy over a text and turns the result into per-level duplicate reports.

use std::path::Path;
use std::time::Instant;

use anyhow::Context;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::core::context::ProximityContexts;
use crate::core::extractor::{self, ExtractionError, Strategy};
use crate::core::patterns::{CompiledMarkers, MarkerSet, DEFAULT_MARKERS};
use crate::core::reporter::{Level, LevelReport};
use crate::utils::file_utils;

/// Errors produced by an analysis pass
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// A configured marker did not compile
    #[error("Invalid {key} pattern: {source}")]
    InvalidPattern {
        key: String,
        #[source]
        source: regex::Error,
    },
}

impl AnalysisError {
    /// Whether the outermost container was missing
    pub fn is_structure_not_found(&self) -> bool {
        matches!(
            self,
            AnalysisError::Extraction(ExtractionError::StructureNotFound { .. })
        )
    }
}

/// Options for one analysis pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    pub strategy: Strategy,
    pub markers: MarkerSet,
}

/// Size and fingerprint of the analyzed text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSummary {
    pub characters: usize,
    pub bytes: usize,
    /// Hex SHA-256 of the text; equal digests mean equal reports
    pub sha256: String,
}

impl SourceSummary {
    pub fn of(text: &str) -> Self {
        Self {
            characters: text.chars().count(),
            bytes: text.len(),
            sha256: hex::encode(Sha256::digest(text.as_bytes())),
        }
    }
}

/// Full result of an analysis pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisReport {
    pub strategy: Strategy,
    pub source: SourceSummary,
    pub subjects: LevelReport,
    pub topics: LevelReport,
    pub titles: LevelReport,
    /// Distinct subject names, sorted
    pub unique_subjects: Vec<String>,
}

impl AnalysisReport {
    pub fn levels(&self) -> [&LevelReport; 3] {
        [&self.subjects, &self.topics, &self.titles]
    }
}

/// Duplicate analyzer bound to one set of options
pub struct DuplicateAnalyzer {
    strategy: Strategy,
    markers: CompiledMarkers,
}

impl Default for DuplicateAnalyzer {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            markers: DEFAULT_MARKERS.clone(),
        }
    }
}

impl DuplicateAnalyzer {
    /// Create a new DuplicateAnalyzer
    ///
    /// # Arguments
    ///
    /// * `options` - Strategy and marker configuration
    ///
    /// # Returns
    ///
    /// The analyzer, or `InvalidPattern` if a marker does not compile
    pub fn new(options: &AnalysisOptions) -> Result<Self, AnalysisError> {
        Ok(Self {
            strategy: options.strategy,
            markers: CompiledMarkers::compile(&options.markers)?,
        })
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Analyze `text` and build the duplicate report.
    ///
    /// Structured and typed strategies fail with `StructureNotFound` when the
    /// container is missing. The flat strategy never fails.
    pub fn analyze(&self, text: &str) -> Result<AnalysisReport, AnalysisError> {
        let start_time = Instant::now();
        let source = SourceSummary::of(text);
        debug!("Analyzing {} characters ({})", source.characters, source.sha256);

        let extraction = extractor::extract(text, &self.markers, self.strategy)?;

        let subjects = LevelReport::from_names(Level::Subject, extraction.subject_names());
        let mut topics = LevelReport::from_names(Level::Topic, extraction.topic_names());
        let mut titles = LevelReport::from_names(Level::Title, extraction.title_names());

        match self.strategy {
            Strategy::Flat => {
                let proximity = ProximityContexts::new(text, &self.markers);
                topics.attach_contexts(&proximity);
                titles.attach_contexts(&proximity);
            }
            Strategy::Structured | Strategy::Typed => {
                topics.attach_contexts(&extraction);
                titles.attach_contexts(&extraction);
            }
        }

        let mut unique_subjects: Vec<String> = extraction.subjects.clone();
        unique_subjects.sort();
        unique_subjects.dedup();

        info!(
            "Duplicates: {} subjects, {} topics, {} titles (in {:?})",
            subjects.duplicates,
            topics.duplicates,
            titles.duplicates,
            start_time.elapsed()
        );

        Ok(AnalysisReport {
            strategy: self.strategy,
            source,
            subjects,
            topics,
            titles,
            unique_subjects,
        })
    }

    /// Read `file_path` and analyze its content
    pub fn analyze_file(&self, file_path: &Path) -> anyhow::Result<AnalysisReport> {
        info!("Analyzing file: {}", file_path.display());
        let source = file_utils::read_source(file_path)?;
        self.analyze(&source.content)
            .with_context(|| format!("Failed to analyze {}", file_path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[{subject:"Math", topics:[{topic:"Algebra", subtopics:[{title:"A"},{title:"B"}]},{topic:"Algebra", subtopics:[{title:"A"}]}]}]"#;

    fn options(strategy: Strategy) -> AnalysisOptions {
        AnalysisOptions {
            strategy,
            ..AnalysisOptions::default()
        }
    }

    #[test]
    fn test_reference_example() {
        let analyzer = DuplicateAnalyzer::new(&options(Strategy::Structured)).unwrap();
        let report = analyzer.analyze(SAMPLE).unwrap();

        assert_eq!((report.subjects.total, report.subjects.unique, report.subjects.duplicates), (1, 1, 0));
        assert_eq!((report.topics.total, report.topics.unique, report.topics.duplicates), (2, 1, 1));
        assert_eq!((report.titles.total, report.titles.unique, report.titles.duplicates), (3, 2, 1));

        let algebra = &report.topics.entries[0];
        assert_eq!(algebra.name, "Algebra");
        assert_eq!(algebra.contexts.iter().map(|c| c.to_string()).collect::<Vec<_>>(), vec!["Math"]);

        assert_eq!(report.titles.entries.len(), 1);
        let a = &report.titles.entries[0];
        assert_eq!((a.name.as_str(), a.count), ("A", 2));
        assert_eq!(a.contexts.len(), 1);
        assert_eq!(a.contexts[0].to_string(), "Math > Algebra");
        assert_eq!(a.locations.len(), 2);
    }

    #[test]
    fn test_missing_container() {
        let structured = DuplicateAnalyzer::default();
        let err = structured.analyze("nothing here").unwrap_err();
        assert!(err.is_structure_not_found());

        let flat = DuplicateAnalyzer::new(&AnalysisOptions {
            strategy: Strategy::Flat,
            ..AnalysisOptions::default()
        })
        .unwrap();
        let report = flat.analyze("nothing here").unwrap();
        assert_eq!(
            (report.subjects.total, report.topics.total, report.titles.total),
            (0, 0, 0)
        );
    }

    #[test]
    fn test_topics_counted_globally_by_name() {
        let text = r#"[
            { subject: "Math", topics: [ { topic: "Vectors", subtopics: [] } ] },
            { subject: "Math", topics: [ { topic: "Calculus", subtopics: [] } ] },
            { subject: "Physics", topics: [ { topic: "Vectors", subtopics: [] } ] }
        ]"#;
        let analyzer = DuplicateAnalyzer::new(&options(Strategy::Structured)).unwrap();
        let report = analyzer.analyze(text).unwrap();

        assert_eq!(report.subjects.total, 3);
        assert_eq!(report.subjects.duplicates, 1);
        assert_eq!(report.subjects.entries[0].count, 2);

        assert_eq!(report.topics.duplicates, 1);
        let vectors = &report.topics.entries[0];
        assert_eq!(vectors.name, "Vectors");
        let contexts: Vec<_> = vectors.contexts.iter().map(|c| c.to_string()).collect();
        assert_eq!(contexts, vec!["Math", "Physics"]);
        assert_eq!(report.unique_subjects, vec!["Math", "Physics"]);
    }

    #[test]
    fn test_analysis_is_idempotent() {
        let analyzer = DuplicateAnalyzer::new(&options(Strategy::Structured)).unwrap();
        let first = analyzer.analyze(SAMPLE).unwrap();
        let second = analyzer.analyze(SAMPLE).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.source.sha256.len(), 64);
    }

    #[test]
    fn test_flat_resolves_contexts_by_proximity() {
        let analyzer = DuplicateAnalyzer::new(&options(Strategy::Flat)).unwrap();
        let report = analyzer.analyze(SAMPLE).unwrap();

        assert_eq!(report.titles.duplicates, 1);
        let a = &report.titles.entries[0];
        assert_eq!(a.count, 2);
        // Non-overlapping spans: the first match consumes the only subject marker.
        assert_eq!(a.locations.len(), 1);
        assert_eq!(a.locations[0].to_string(), "Math > Algebra");
    }
}
