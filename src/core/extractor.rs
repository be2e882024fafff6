/// Hierarchical text extraction
///
/// Pulls subject, topic and title names out of a nested data literal. Three
/// strategies are available: structured (delimiter-scoped, the default), flat
/// (independent scans of the whole text, lossy) and typed (the container is
/// deserialized as JSON5 and walked as a tree).

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::patterns::CompiledMarkers;

/// Error raised while locating or reading the nested structure
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// The outermost container could not be located
    #[error("Could not locate data structure (container marker: {marker})")]
    StructureNotFound { marker: String },

    /// The container was found but could not be read as a typed document
    #[error("Invalid document: {reason}")]
    InvalidDocument { reason: String },
}

/// Extraction strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Scope every search to the enclosing block; fails without a container
    #[default]
    Structured,
    /// Scan the whole text for each marker independently. Best effort:
    /// parents are reconstructed by proximity and may be wrong.
    Flat,
    /// Deserialize the container as JSON5 and walk the typed tree
    Typed,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Strategy::Structured => "structured",
            Strategy::Flat => "flat",
            Strategy::Typed => "typed",
        };
        f.write_str(name)
    }
}

/// One topic occurrence
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicEntry {
    pub subject: Option<String>,
    pub name: String,
}

/// One title occurrence
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TitleEntry {
    pub subject: Option<String>,
    pub topic: Option<String>,
    pub name: String,
}

/// Every name found, in order of first appearance in the text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Extraction {
    pub subjects: Vec<String>,
    pub topics: Vec<TopicEntry>,
    pub titles: Vec<TitleEntry>,
}

impl Extraction {
    pub fn subject_names(&self) -> impl Iterator<Item = &str> {
        self.subjects.iter().map(String::as_str)
    }

    pub fn topic_names(&self) -> impl Iterator<Item = &str> {
        self.topics.iter().map(|topic| topic.name.as_str())
    }

    pub fn title_names(&self) -> impl Iterator<Item = &str> {
        self.titles.iter().map(|title| title.name.as_str())
    }
}

/// Run the given strategy over `text`
pub fn extract(
    text: &str,
    markers: &CompiledMarkers,
    strategy: Strategy,
) -> Result<Extraction, ExtractionError> {
    let extraction = match strategy {
        Strategy::Structured => extract_structured(text, markers)?,
        Strategy::Flat => extract_flat(text, markers),
        Strategy::Typed => extract_typed(text, markers)?,
    };

    info!(
        "Extracted {} subjects, {} topics, {} titles ({} strategy)",
        extraction.subjects.len(),
        extraction.topics.len(),
        extraction.titles.len(),
        strategy
    );

    Ok(extraction)
}

/// Scan for each field marker independently over the whole text.
///
/// No container check is made and no parents are recorded; malformed input
/// simply yields fewer matches.
pub fn extract_flat(text: &str, markers: &CompiledMarkers) -> Extraction {
    let capture_all = |regex: &regex::Regex| -> Vec<String> {
        regex
            .captures_iter(text)
            .map(|caps| caps[1].to_string())
            .collect()
    };

    Extraction {
        subjects: capture_all(&markers.subject_field),
        topics: capture_all(&markers.topic_field)
            .into_iter()
            .map(|name| TopicEntry { subject: None, name })
            .collect(),
        titles: capture_all(&markers.title_field)
            .into_iter()
            .map(|name| TitleEntry {
                subject: None,
                topic: None,
                name,
            })
            .collect(),
    }
}

/// Scope each search to the extent of its parent block.
///
/// Every object element of the container is a candidate subject block; its
/// name is the subject field at the block's own level, wherever it sits among
/// the other keys. Topic blocks are found the same way inside the subject's
/// topics array. The container must be present; inside it nothing is
/// validated and unbalanced blocks extend to the end of their parent.
pub fn extract_structured(
    text: &str,
    markers: &CompiledMarkers,
) -> Result<Extraction, ExtractionError> {
    let container = locate_container(text, markers)?;
    let mut extraction = Extraction::default();

    let subject_blocks = element_objects(container);
    debug!("Found {} subject blocks", subject_blocks.len());

    for subject_block in &subject_blocks {
        let Some(subject) = own_field(subject_block, &markers.subject_field) else {
            continue;
        };
        extraction.subjects.push(subject.to_string());

        let Some(topics) = own_array(subject_block, &markers.topics_array) else {
            continue;
        };

        for topic_block in element_objects(topics) {
            let Some(topic) = own_field(topic_block, &markers.topic_field) else {
                continue;
            };
            extraction.topics.push(TopicEntry {
                subject: Some(subject.to_string()),
                name: topic.to_string(),
            });

            let Some(subtopics) = own_array(topic_block, &markers.subtopics_array) else {
                continue;
            };

            for caps in markers.title_field.captures_iter(subtopics) {
                extraction.titles.push(TitleEntry {
                    subject: Some(subject.to_string()),
                    topic: Some(topic.to_string()),
                    name: caps[1].to_string(),
                });
            }
        }
    }

    if extraction.subjects.is_empty() && !subject_blocks.is_empty() {
        warn!(
            "Container holds {} blocks but none has a top-level {} field",
            subject_blocks.len(),
            markers.set.subject
        );
    }

    Ok(extraction)
}

/// Deserialize the container as JSON5 and walk it as a tree.
///
/// JSON5 covers the object literal syntax of generated data modules: unquoted
/// keys, single-quoted strings, trailing commas and comments.
pub fn extract_typed(
    text: &str,
    markers: &CompiledMarkers,
) -> Result<Extraction, ExtractionError> {
    let container = locate_container(text, markers)?;
    let document: Value =
        json5::from_str(container).map_err(|e| ExtractionError::InvalidDocument {
            reason: e.to_string(),
        })?;

    let Value::Array(subject_nodes) = document else {
        return Err(ExtractionError::InvalidDocument {
            reason: "container is not an array".to_string(),
        });
    };

    let keys = &markers.set;
    let mut extraction = Extraction::default();

    for subject_node in &subject_nodes {
        let Some(subject) = string_field(subject_node, &keys.subject) else {
            continue;
        };
        extraction.subjects.push(subject.to_string());

        for topic_node in array_field(subject_node, &keys.topics) {
            let Some(topic) = string_field(topic_node, &keys.topic) else {
                continue;
            };
            extraction.topics.push(TopicEntry {
                subject: Some(subject.to_string()),
                name: topic.to_string(),
            });

            for title_node in array_field(topic_node, &keys.subtopics) {
                if let Some(title) = string_field(title_node, &keys.title) {
                    extraction.titles.push(TitleEntry {
                        subject: Some(subject.to_string()),
                        topic: Some(topic.to_string()),
                        name: title.to_string(),
                    });
                }
            }
        }
    }

    Ok(extraction)
}

fn string_field<'v>(node: &'v Value, key: &str) -> Option<&'v str> {
    match node.get(key) {
        Some(Value::String(name)) => Some(name),
        Some(other) => {
            warn!("Skipping non-string {} value: {}", key, other);
            None
        }
        None => None,
    }
}

fn array_field<'v>(node: &'v Value, key: &str) -> &'v [Value] {
    node.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Find the outermost array literal.
///
/// When a container marker is configured but absent, a text that is itself an
/// array literal (first non-whitespace character `[`) is taken as the
/// container.
///
/// # Returns
///
/// The container text from its `[` through its matching `]`
pub fn locate_container<'t>(
    text: &'t str,
    markers: &CompiledMarkers,
) -> Result<&'t str, ExtractionError> {
    let marker = markers
        .container
        .as_ref()
        .map(|regex| regex.as_str().to_string())
        .unwrap_or_else(|| "[".to_string());
    let not_found = || ExtractionError::StructureNotFound {
        marker: marker.clone(),
    };

    let search_from = match &markers.container {
        Some(regex) => match regex.find(text) {
            Some(m) => m.end(),
            None if text.trim_start().starts_with('[') => {
                debug!("Container marker not found; using the bare array literal");
                text.len() - text.trim_start().len()
            }
            None => return Err(not_found()),
        },
        None => 0,
    };
    let open = text[search_from..]
        .find('[')
        .map(|offset| search_from + offset)
        .ok_or_else(not_found)?;
    let close = matching_close(text, open).ok_or_else(not_found)?;

    Ok(&text[open..close])
}

/// Walk `text` from `start`, calling `visit` with every byte outside string
/// literals (`"`, `'`, backtick) and comments. Opening quotes are visited.
/// Walking stops at the first `Some` returned by `visit`.
fn walk<T>(
    text: &str,
    start: usize,
    mut visit: impl FnMut(usize, u8) -> Option<T>,
) -> Option<T> {
    let bytes = text.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = start;

    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == b'\\' {
                i += 2;
                continue;
            }
            if b == q {
                quote = None;
            }
            i += 1;
            continue;
        }

        match b {
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i < bytes.len() && !(bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/')) {
                    i += 1;
                }
                i += 2;
                continue;
            }
            _ => {}
        }

        if let Some(found) = visit(i, b) {
            return Some(found);
        }
        if matches!(b, b'"' | b'\'' | b'`') {
            quote = Some(b);
        }
        i += 1;
    }

    None
}

/// Byte offset just past the delimiter closing the one at `open`.
///
/// Bracket kinds are not checked against each other.
fn matching_close(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    walk(text, open, |i, b| match b {
        b'{' | b'[' => {
            depth += 1;
            None
        }
        b'}' | b']' => match depth.checked_sub(1) {
            None => Some(None),
            Some(0) => Some(Some(i + 1)),
            Some(d) => {
                depth = d;
                None
            }
        },
        _ => None,
    })
    .flatten()
}

/// Bracket depth at `pos`, or `None` when `pos` lies inside a literal or comment.
fn depth_at(text: &str, pos: usize) -> Option<usize> {
    let mut depth = 0usize;
    walk(text, 0, |i, b| {
        if i >= pos {
            return Some((i == pos).then_some(depth));
        }
        match b {
            b'{' | b'[' => depth += 1,
            b'}' | b']' => depth = depth.saturating_sub(1),
            _ => {}
        }
        None
    })
    .flatten()
}

/// Every `{...}` element directly inside `array`. An unterminated last element
/// extends to the end of the array.
fn element_objects(array: &str) -> Vec<&str> {
    let mut found = Vec::new();
    let mut depth = 0usize;
    let mut start: Option<usize> = None;

    walk(array, 0, |i, b| {
        match b {
            b'{' | b'[' => {
                if depth == 1 && b == b'{' {
                    start = Some(i);
                }
                depth += 1;
            }
            b'}' | b']' => {
                depth = depth.saturating_sub(1);
                if depth == 1 && b == b'}' {
                    if let Some(s) = start.take() {
                        found.push(&array[s..=i]);
                    }
                }
                if depth == 0 {
                    return Some(());
                }
            }
            _ => {}
        }
        None
    });

    if let Some(s) = start {
        found.push(&array[s..]);
    }
    found
}

/// Value of the first `field` match at the block's own level (depth 1).
fn own_field<'t>(block: &'t str, field: &regex::Regex) -> Option<&'t str> {
    field
        .captures_iter(block)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let name = caps.get(1)?;
            (depth_at(block, whole.start()) == Some(1)).then(|| name.as_str())
        })
        .next()
}

/// The array opened by `opener` at the block's own level, up to its matching `]`.
fn own_array<'t>(block: &'t str, opener: &regex::Regex) -> Option<&'t str> {
    let m = opener
        .find_iter(block)
        .find(|m| depth_at(block, m.start()) == Some(1))?;
    let open = m.end() - 1;
    let end = matching_close(block, open).unwrap_or(block.len());
    Some(&block[open..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::patterns::{CompiledMarkers, MarkerSet, DEFAULT_MARKERS};

    const SAMPLE: &str = r#"[{subject:"Math", topics:[{topic:"Algebra", subtopics:[{title:"A"},{title:"B"}]},{topic:"Algebra", subtopics:[{title:"A"}]}]}]"#;

    fn bare_markers() -> CompiledMarkers {
        CompiledMarkers::compile(&MarkerSet {
            container: None,
            ..MarkerSet::default()
        })
        .unwrap()
    }

    #[test]
    fn test_matching_close_skips_strings() {
        let text = r#"{ a: "}]", b: [1, 2], c: '{' }"#;
        assert_eq!(matching_close(text, 0), Some(text.len()));
        assert_eq!(matching_close("[[]", 0), None);
    }

    #[test]
    fn test_matching_close_skips_line_comments() {
        let text = "[ // closing ] here\n 1 ]";
        assert_eq!(matching_close(text, 0), Some(text.len()));
    }

    #[test]
    fn test_matching_close_skips_block_comments() {
        let text = "{ /* it's } */ a: 1 }";
        assert_eq!(matching_close(text, 0), Some(text.len()));
    }

    #[test]
    fn test_structured_scopes_nested_blocks() {
        let extraction = extract_structured(SAMPLE, &bare_markers()).unwrap();

        assert_eq!(extraction.subjects, vec!["Math"]);
        assert_eq!(extraction.topics.len(), 2);
        assert!(extraction
            .topics
            .iter()
            .all(|t| t.name == "Algebra" && t.subject.as_deref() == Some("Math")));
        let titles: Vec<_> = extraction.title_names().collect();
        assert_eq!(titles, vec!["A", "B", "A"]);
        assert_eq!(extraction.titles[2].topic.as_deref(), Some("Algebra"));
    }

    #[test]
    fn test_structured_requires_container() {
        let result = extract_structured("no array here", &bare_markers());
        assert!(matches!(result, Err(ExtractionError::StructureNotFound { .. })));

        let result = extract_structured(r#"const data = [{ subject: "Math" }];"#, &DEFAULT_MARKERS);
        assert!(matches!(result, Err(ExtractionError::StructureNotFound { .. })));

        let result = extract_structured("[{ subject: \"Math\" }", &DEFAULT_MARKERS);
        assert!(matches!(result, Err(ExtractionError::StructureNotFound { .. })));
    }

    #[test]
    fn test_structured_bare_array_without_marker() {
        let extraction = extract_structured(SAMPLE, &DEFAULT_MARKERS).unwrap();
        assert_eq!(extraction.subjects, vec!["Math"]);
        assert_eq!(extraction.topics.len(), 2);
        assert_eq!(extraction.titles.len(), 3);

        let padded = format!("\n  {}\n", SAMPLE);
        let extraction = extract_structured(&padded, &DEFAULT_MARKERS).unwrap();
        assert_eq!(extraction.titles.len(), 3);
    }

    #[test]
    fn test_structured_name_field_anywhere_in_block() {
        let text = r#"[{ id: 1, subject: "Math", topics: [{ id: 2, topic: "Algebra", subtopics: [{ title: "A" }] }] }]"#;
        let extraction = extract_structured(text, &DEFAULT_MARKERS).unwrap();
        assert_eq!(extraction.subjects, vec!["Math"]);
        assert_eq!(extraction.topic_names().collect::<Vec<_>>(), vec!["Algebra"]);
        assert_eq!(extraction.titles.len(), 1);
        assert_eq!(extraction.titles[0].subject.as_deref(), Some("Math"));
    }

    #[test]
    fn test_structured_ignores_nested_name_fields() {
        let text = r#"[{ meta: { subject: "Hidden" }, subject: "Math", note: "subject: \"Fake\"" }]"#;
        let extraction = extract_structured(text, &DEFAULT_MARKERS).unwrap();
        assert_eq!(extraction.subjects, vec!["Math"]);

        let text = r#"[{ id: 1 }, { id: 2 }]"#;
        let extraction = extract_structured(text, &DEFAULT_MARKERS).unwrap();
        assert!(extraction.subjects.is_empty());
    }

    #[test]
    fn test_element_objects_and_depth() {
        let array = r#"[ { a: "}" }, 3, [ { b: 1 } ], { c: [ {} ] } ]"#;
        let elements = element_objects(array);
        assert_eq!(elements, vec![r#"{ a: "}" }"#, "{ c: [ {} ] }"]);

        let block = r#"{ x: { y: 1 }, z: "{" }"#;
        assert_eq!(depth_at(block, block.find('x').unwrap()), Some(1));
        assert_eq!(depth_at(block, block.find('y').unwrap()), Some(2));
        assert_eq!(depth_at(block, block.rfind('{').unwrap()), None);
    }

    #[test]
    fn test_structured_with_export_container() {
        let text = format!(
            "import x from 'y';\nexport const VideosData: VideosData[] = {};\n",
            SAMPLE
        );
        let extraction = extract_structured(&text, &DEFAULT_MARKERS).unwrap();
        assert_eq!(extraction.topics.len(), 2);
        assert_eq!(extraction.titles.len(), 3);
    }

    #[test]
    fn test_structured_ignores_markers_outside_container() {
        let text = format!(
            "const stray = {{ subject: \"Loose\" }};\nexport const data = {};",
            SAMPLE
        );
        let extraction = extract_structured(&text, &DEFAULT_MARKERS).unwrap();
        assert_eq!(extraction.subjects, vec!["Math"]);
    }

    #[test]
    fn test_structured_subject_without_topics() {
        let text = r#"[{ subject: "Art" }, { subject: "Math", topics: [] }]"#;
        let extraction = extract_structured(text, &bare_markers()).unwrap();
        assert_eq!(extraction.subjects, vec!["Art", "Math"]);
        assert!(extraction.topics.is_empty());
    }

    #[test]
    fn test_structured_titles_stay_with_their_topic() {
        let text = r#"[
            { subject: "Physics", topics: [
                { topic: "Motion", subtopics: [ { title: "Speed" } ] },
                { topic: "Energy", subtopics: [ { title: "Work" }, { title: "Power" } ] }
            ] }
        ]"#;
        let extraction = extract_structured(text, &bare_markers()).unwrap();
        let parents: Vec<_> = extraction
            .titles
            .iter()
            .map(|t| (t.topic.clone().unwrap(), t.name.clone()))
            .collect();
        assert_eq!(
            parents,
            vec![
                ("Motion".to_string(), "Speed".to_string()),
                ("Energy".to_string(), "Work".to_string()),
                ("Energy".to_string(), "Power".to_string()),
            ]
        );
    }

    #[test]
    fn test_flat_needs_no_container() {
        let extraction = extract_flat(SAMPLE, &DEFAULT_MARKERS);
        assert_eq!(extraction.subjects.len(), 1);
        assert_eq!(extraction.topics.len(), 2);
        assert_eq!(extraction.titles.len(), 3);
        assert!(extraction.topics.iter().all(|t| t.subject.is_none()));

        let empty = extract_flat("nothing to see", &DEFAULT_MARKERS);
        assert_eq!(empty, Extraction::default());
    }

    #[test]
    fn test_typed_reads_json_container() {
        let text = r#"export const data = [
            {"subject": "Math", "topics": [
                {"topic": "Algebra", "subtopics": [{"title": "A"}, {"title": "B"}]},
                {"topic": "Geometry"}
            ]},
            {"subject": 42}
        ];"#;
        let extraction = extract_typed(text, &DEFAULT_MARKERS).unwrap();
        assert_eq!(extraction.subjects, vec!["Math"]);
        assert_eq!(extraction.topics.len(), 2);
        assert_eq!(extraction.titles.len(), 2);
    }

    #[test]
    fn test_typed_reads_object_literal_syntax() {
        let extraction = extract_typed(SAMPLE, &DEFAULT_MARKERS).unwrap();
        assert_eq!(extraction.subjects, vec!["Math"]);
        assert_eq!(extraction.topics.len(), 2);
        let titles: Vec<_> = extraction.title_names().collect();
        assert_eq!(titles, vec!["A", "B", "A"]);

        let text = "export const data = [\n  { subject: 'Art', topics: [], }, // trailing\n];";
        let extraction = extract_typed(text, &DEFAULT_MARKERS).unwrap();
        assert_eq!(extraction.subjects, vec!["Art"]);
    }

    #[test]
    fn test_typed_rejects_invalid_literal() {
        let result = extract_typed("[{ subject: Math }]", &bare_markers());
        assert!(matches!(result, Err(ExtractionError::InvalidDocument { .. })));
    }
}
