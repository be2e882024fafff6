/// Duplicate frequency reporting
///
/// Counts names at one level of the hierarchy and lists those that occur more
/// than once. Names are compared by value only: the same topic name under two
/// different subjects is one duplicated topic.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::core::context::ContextSource;

/// Level of the hierarchy a report covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Subject,
    Topic,
    Title,
}

impl Level {
    /// Plural display name
    pub fn plural(&self) -> &'static str {
        match self {
            Level::Subject => "subjects",
            Level::Topic => "topics",
            Level::Title => "titles",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Level::Subject => "subject",
            Level::Topic => "topic",
            Level::Title => "title",
        };
        f.write_str(name)
    }
}

/// Chain of parent names, outermost first
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ContextPath(Vec<String>);

impl ContextPath {
    pub fn new(parents: Vec<String>) -> Self {
        Self(parents)
    }

    pub fn parents(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for ContextPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" > "))
    }
}

/// A name occurring more than once
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateEntry {
    pub name: String,
    pub count: usize,
    /// Distinct parent contexts, in order of first appearance
    pub contexts: Vec<ContextPath>,
    /// Parent context of every occurrence found, in text order
    pub locations: Vec<ContextPath>,
}

/// Counts and duplicate listing for one level
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelReport {
    pub level: Level,
    pub total: usize,
    pub unique: usize,
    /// `total - unique`
    pub duplicates: usize,
    /// Ordered by count descending, then first appearance
    pub entries: Vec<DuplicateEntry>,
}

impl LevelReport {
    /// Count `names` and list every name seen more than once.
    pub fn from_names<'a, I>(level: Level, names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        // name -> (count, index of first appearance)
        let mut counts: HashMap<&'a str, (usize, usize)> = HashMap::new();
        let mut total = 0;

        for (index, name) in names.into_iter().enumerate() {
            counts.entry(name).or_insert((0, index)).0 += 1;
            total += 1;
        }

        let unique = counts.len();
        let mut repeated: Vec<(&str, (usize, usize))> = counts
            .into_iter()
            .filter(|(_, (count, _))| *count > 1)
            .collect();
        repeated.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));

        let entries = repeated
            .into_iter()
            .map(|(name, (count, _))| DuplicateEntry {
                name: name.to_string(),
                count,
                contexts: Vec::new(),
                locations: Vec::new(),
            })
            .collect();

        Self {
            level,
            total,
            unique,
            duplicates: total - unique,
            entries,
        }
    }

    /// Fill in the parent contexts of every duplicate entry.
    pub fn attach_contexts(&mut self, source: &dyn ContextSource) {
        for entry in &mut self.entries {
            entry.locations = source.locations(self.level, &entry.name);

            let mut distinct: Vec<ContextPath> = Vec::new();
            for location in &entry.locations {
                if !distinct.contains(location) {
                    distinct.push(location.clone());
                }
            }
            entry.contexts = distinct;
        }
    }

    pub fn has_duplicates(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Highest occurrence count among duplicates
    pub fn max_count(&self) -> Option<usize> {
        self.entries.first().map(|entry| entry.count)
    }

    /// Up to `limit` entries sharing the highest count
    pub fn most_duplicated(&self, limit: usize) -> impl Iterator<Item = &DuplicateEntry> {
        let max = self.max_count().unwrap_or(0);
        self.entries
            .iter()
            .take_while(move |entry| entry.count == max)
            .take(limit)
    }

    /// The `n` most frequent duplicates
    pub fn top(&self, n: usize) -> &[DuplicateEntry] {
        &self.entries[..n.min(self.entries.len())]
    }
}
