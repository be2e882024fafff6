/// Parent-context resolution for duplicate names
///
/// A [`ContextSource`] answers "under which parents does this name occur".
/// Extractions that recorded their nesting answer exactly. The flat strategy
/// has no nesting, so [`ProximityContexts`] rebuilds it from nearby markers.

use log::{debug, warn};

use crate::core::extractor::Extraction;
use crate::core::patterns::CompiledMarkers;
use crate::core::reporter::{ContextPath, Level};

/// Source of parent contexts for names at a given level
pub trait ContextSource {
    /// Every location at which `name` occurs at `level`, in text order.
    /// Subjects have no parents and always yield nothing.
    fn locations(&self, level: Level, name: &str) -> Vec<ContextPath>;
}

impl ContextSource for Extraction {
    fn locations(&self, level: Level, name: &str) -> Vec<ContextPath> {
        match level {
            Level::Subject => Vec::new(),
            Level::Topic => self
                .topics
                .iter()
                .filter(|topic| topic.name == name)
                .filter_map(|topic| topic.subject.clone())
                .map(|subject| ContextPath::new(vec![subject]))
                .collect(),
            Level::Title => self
                .titles
                .iter()
                .filter(|title| title.name == name)
                .filter_map(|title| match (&title.subject, &title.topic) {
                    (Some(subject), Some(topic)) => {
                        Some(ContextPath::new(vec![subject.clone(), topic.clone()]))
                    }
                    _ => None,
                })
                .collect(),
        }
    }
}

/// Nearest-marker heuristic over the raw text.
///
/// For a topic, each non-overlapping `subject "S" ... topic "<name>"` match
/// (shortest span, scanning forward from the start) yields `S`. Titles do the
/// same with `subject ... topic ... title`. When markers are not in strict
/// nesting order the reported parent can be wrong, and overlapping spans mean
/// fewer locations than occurrences may be found.
pub struct ProximityContexts<'a> {
    text: &'a str,
    markers: &'a CompiledMarkers,
}

impl<'a> ProximityContexts<'a> {
    pub fn new(text: &'a str, markers: &'a CompiledMarkers) -> Self {
        Self { text, markers }
    }
}

impl ContextSource for ProximityContexts<'_> {
    fn locations(&self, level: Level, name: &str) -> Vec<ContextPath> {
        let pattern = match level {
            Level::Subject => return Vec::new(),
            Level::Topic => self.markers.topic_context_pattern(name),
            Level::Title => self.markers.title_context_pattern(name),
        };
        let pattern = match pattern {
            Ok(pattern) => pattern,
            Err(e) => {
                warn!("Could not build context pattern for {} \"{}\": {}", level, name, e);
                return Vec::new();
            }
        };

        let found: Vec<ContextPath> = pattern
            .captures_iter(self.text)
            .map(|caps| {
                let parents = match level {
                    Level::Title => vec![caps[1].to_string(), caps[2].to_string()],
                    _ => vec![caps[1].to_string()],
                };
                ContextPath::new(parents)
            })
            .collect();

        if found.is_empty() {
            debug!("Could not determine context for {} \"{}\"", level, name);
        }
        found
    }
}
