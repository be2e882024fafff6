/// Simple example demonstrating how to use the Duplicate Analyzer library

use anyhow::Result;
use duplicate_analyzer::{analyze, AnalysisOptions};

fn main() -> Result<()> {
    let text = r#"export const VideosData: VideosData[] = [
  { subject: "Math", topics: [
      { topic: "Algebra", subtopics: [{ title: "A" }, { title: "B" }] },
      { topic: "Algebra", subtopics: [{ title: "A" }] },
  ] },
];"#;

    let report = analyze(text, &AnalysisOptions::default())?;

    for level in report.levels() {
        println!(
            "{}: {} total, {} unique, {} duplicates",
            level.level.plural(),
            level.total,
            level.unique,
            level.duplicates
        );
        for entry in &level.entries {
            let contexts: Vec<String> = entry.contexts.iter().map(|c| c.to_string()).collect();
            println!("  - {} x{} [{}]", entry.name, entry.count, contexts.join(", "));
        }
    }

    Ok(())
}
