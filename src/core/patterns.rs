/// Marker definitions for the duplicate analyzer
///
/// This module contains the field and array markers used to recognize subjects,
/// topics and titles inside a nested data literal, and compiles them into the
/// regular expressions the extractor and the context resolvers run.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::analyzer::AnalysisError;

/// Default container marker: `export const VideosData: VideosData[] =`
pub const DEFAULT_CONTAINER_MARKER: &str = r"export\s+const\s+\w+\s*(?::\s*[\w<>\[\]]+\s*)?=";

/// Names of the fields and arrays that make up the nested hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerSet {
    /// Regex locating the outermost container. The array literal is the first
    /// `[` after its match; a text that is itself an array literal is accepted
    /// when the marker is absent. `None` means the first `[` of the text.
    pub container: Option<String>,
    /// Field holding a subject name
    pub subject: String,
    /// Field holding a topic name
    pub topic: String,
    /// Field holding a title name
    pub title: String,
    /// Array of topic blocks inside a subject block
    pub topics: String,
    /// Array of title blocks inside a topic block
    pub subtopics: String,
}

impl Default for MarkerSet {
    fn default() -> Self {
        Self {
            container: Some(DEFAULT_CONTAINER_MARKER.to_string()),
            subject: "subject".to_string(),
            topic: "topic".to_string(),
            title: "title".to_string(),
            topics: "topics".to_string(),
            subtopics: "subtopics".to_string(),
        }
    }
}

/// Regex source for `key:` where the key may be double-quoted and must start
/// on a word boundary.
fn key_pattern(key: &str) -> String {
    format!(r#""?\b{}"?\s*:"#, regex::escape(key))
}

/// Regex source for `key: "<value>"` capturing the value.
pub fn field_pattern(key: &str, value: &str) -> String {
    format!(r#"{}\s*"({})""#, key_pattern(key), value)
}

/// Regex source for the opening of an array field: `key: [`.
fn array_pattern(key: &str) -> String {
    format!(r"{}\s*\[", key_pattern(key))
}

/// Compiled form of a [`MarkerSet`]
#[derive(Debug, Clone)]
pub struct CompiledMarkers {
    /// Source marker names, kept for building per-name context patterns
    pub set: MarkerSet,
    pub container: Option<Regex>,
    pub subject_field: Regex,
    pub topic_field: Regex,
    pub title_field: Regex,
    pub topics_array: Regex,
    pub subtopics_array: Regex,
}

impl CompiledMarkers {
    /// Compile every marker of `set`
    ///
    /// # Returns
    ///
    /// The compiled markers, or `InvalidPattern` naming the marker that failed
    pub fn compile(set: &MarkerSet) -> Result<Self, AnalysisError> {
        let container = match &set.container {
            Some(pattern) => Some(compile_pattern("container", pattern)?),
            None => None,
        };
        let any_name = r#"[^"]+"#;

        Ok(Self {
            container,
            subject_field: compile_pattern("subject", &field_pattern(&set.subject, any_name))?,
            topic_field: compile_pattern("topic", &field_pattern(&set.topic, any_name))?,
            title_field: compile_pattern("title", &field_pattern(&set.title, any_name))?,
            topics_array: compile_pattern("topics", &array_pattern(&set.topics))?,
            subtopics_array: compile_pattern("subtopics", &array_pattern(&set.subtopics))?,
            set: set.clone(),
        })
    }

    /// Pattern for `subject "<S>" ...? topic "<name>"`, capturing the subject.
    pub fn topic_context_pattern(&self, topic: &str) -> Result<Regex, AnalysisError> {
        let pattern = format!(
            r"{}(?s:.)*?{}",
            field_pattern(&self.set.subject, r#"[^"]+"#),
            field_pattern(&self.set.topic, &regex::escape(topic)),
        );
        compile_pattern("topic", &pattern)
    }

    /// Pattern for `subject "<S>" ...? topic "<T>" ...? title "<name>"`,
    /// capturing subject and topic.
    pub fn title_context_pattern(&self, title: &str) -> Result<Regex, AnalysisError> {
        let pattern = format!(
            r"{}(?s:.)*?{}(?s:.)*?{}",
            field_pattern(&self.set.subject, r#"[^"]+"#),
            field_pattern(&self.set.topic, r#"[^"]+"#),
            field_pattern(&self.set.title, &regex::escape(title)),
        );
        compile_pattern("title", &pattern)
    }
}

/// Helper function to compile pattern
pub fn compile_pattern(key: &str, pattern: &str) -> Result<Regex, AnalysisError> {
    Regex::new(pattern).map_err(|source| {
        log::error!("Error compiling {} pattern: {}", key, source);
        AnalysisError::InvalidPattern {
            key: key.to_string(),
            source,
        }
    })
}

lazy_static! {
    /// Markers compiled from `MarkerSet::default()`
    pub static ref DEFAULT_MARKERS: CompiledMarkers = CompiledMarkers::compile(&MarkerSet::default())
        .expect("default marker patterns are valid");
}
