/// Output formatter for analysis reports
///
/// This module handles formatting and exporting duplicate reports in various
/// formats, including console output, JSON, HTML, and CSV.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use handlebars::Handlebars;
use serde_json::{json, Value};

use crate::core::analyzer::AnalysisReport;
use crate::core::extractor::Strategy;
use crate::core::reporter::{Level, LevelReport};

/// How the console report is rendered
#[derive(Debug, Clone)]
pub struct FormatOptions {
    /// Wrap output in markdown triple backticks
    pub markdown: bool,
    /// Only the structure counts and the summary statistics
    pub summary_only: bool,
    /// Duplicated titles shown in detail
    pub top: usize,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            markdown: false,
            summary_only: false,
            top: 20,
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn heading(title: &str) -> String {
    format!("{}\n", format!("=== {} ===", title).yellow().bold())
}

/// Format an analysis report for console output
///
/// # Arguments
///
/// * `report` - The analysis report
/// * `options` - Rendering options
///
/// # Returns
///
/// Formatted string for console output
pub fn format_report(report: &AnalysisReport, options: &FormatOptions) -> String {
    let mut output = String::new();

    if options.markdown {
        output.push_str("```\n");
    }

    output.push_str(&heading("DATA STRUCTURE ANALYSIS"));
    output.push_str(&format!("File size: {} characters\n", report.source.characters));
    output.push_str(&format!("Strategy: {}\n", report.strategy));
    output.push_str(&format!(
        "Found: {} subjects, {} topics, {} titles\n",
        report.subjects.total, report.topics.total, report.titles.total
    ));

    if !options.summary_only {
        for level in report.levels() {
            output.push('\n');
            format_level(&mut output, level, options.top);
        }
    }

    output.push('\n');
    format_summary(&mut output, report);

    if report.strategy == Strategy::Flat && !options.summary_only {
        output.push('\n');
        output.push_str(&heading("UNIQUE SUBJECTS LIST"));
        for subject in &report.unique_subjects {
            output.push_str(&format!("- {}\n", subject));
        }
    }

    if options.markdown {
        output.push_str("```\n");
    }

    output
}

fn format_level(output: &mut String, level: &LevelReport, top: usize) {
    let singular = capitalize(&level.level.to_string());
    let plural = level.level.plural();

    output.push_str(&heading(&plural.to_uppercase()));
    output.push_str(&format!("Total {}: {}\n", plural, level.total));
    output.push_str(&format!("Unique {}: {}\n", plural, level.unique));
    output.push_str(&format!("{} duplicates: {}\n", singular, level.duplicates));

    if !level.has_duplicates() {
        output.push_str(&format!("No duplicate {} found.\n", plural));
        return;
    }

    match level.level {
        Level::Subject | Level::Topic => {
            output.push_str(&format!("\nDUPLICATE {}:\n", plural.to_uppercase()));
            for entry in &level.entries {
                output.push_str(&format!(
                    "- \"{}\": {} times\n",
                    entry.name.cyan(),
                    entry.count
                ));
                if level.level == Level::Topic && !entry.contexts.is_empty() {
                    let subjects: Vec<String> =
                        entry.contexts.iter().map(|c| c.to_string()).collect();
                    output.push_str(&format!("  Found in subjects: {}\n", subjects.join(", ")));
                }
            }
        }
        Level::Title => {
            output.push_str(&format!(
                "\nDUPLICATE TITLES ({} unique duplicated titles):\n",
                level.entries.len()
            ));
            for (i, entry) in level.top(top).iter().enumerate() {
                output.push_str(&format!(
                    "\n{}. \"{}\": {} times\n",
                    i + 1,
                    entry.name.cyan(),
                    entry.count
                ));
                if entry.locations.is_empty() {
                    output.push_str(&format!(
                        "   (Could not determine exact context for \"{}\")\n",
                        entry.name
                    ));
                }
                for (j, location) in entry.locations.iter().enumerate() {
                    output.push_str(&format!("   {}. {}\n", j + 1, location));
                }
            }
            if level.entries.len() > top {
                output.push_str(&format!(
                    "\n... and {} more duplicated titles\n",
                    level.entries.len() - top
                ));
            }
        }
    }
}

fn format_summary(output: &mut String, report: &AnalysisReport) {
    let (subjects, topics, titles) = (&report.subjects, &report.topics, &report.titles);

    output.push_str(&heading("SUMMARY STATISTICS"));
    output.push_str(&format!(
        "Total items: {} subjects, {} topics, {} titles\n",
        subjects.total, topics.total, titles.total
    ));
    output.push_str(&format!(
        "Unique items: {} subjects, {} topics, {} titles\n",
        subjects.unique, topics.unique, titles.unique
    ));
    output.push_str(&format!(
        "Duplicates: {} subjects, {} topics, {} titles\n",
        subjects.duplicates, topics.duplicates, titles.duplicates
    ));

    if let Some(max) = titles.max_count() {
        output.push_str(&format!(
            "Most duplicated title(s): {} occurrences\n",
            max.to_string().green()
        ));
        for entry in titles.most_duplicated(3) {
            output.push_str(&format!("  - \"{}\"\n", entry.name));
        }
    }
}

/// Export a report to a JSON file
///
/// # Arguments
///
/// * `report` - The analysis report
/// * `output_path` - Path where the JSON file will be written
///
/// # Returns
///
/// Result indicating success or failure
pub fn export_report_json(report: &AnalysisReport, output_path: &Path) -> Result<()> {
    let file = File::create(output_path)
        .context(format!("Failed to create JSON output file: {}", output_path.display()))?;

    serde_json::to_writer_pretty(file, report).context("Failed to write JSON data")?;

    Ok(())
}

/// Create an HTML report from an analysis report
///
/// # Arguments
///
/// * `report` - The analysis report
/// * `output_path` - Path where the HTML file will be written
///
/// # Returns
///
/// Result indicating success or failure
pub fn create_html_report(report: &AnalysisReport, output_path: &Path) -> Result<()> {
    let mut handlebars = Handlebars::new();

    const HTML_TEMPLATE: &str = r#"
    <!DOCTYPE html>
    <html lang="en">
    <head>
        <meta charset="UTF-8">
        <meta name="viewport" content="width=device-width, initial-scale=1.0">
        <title>Duplicate Analysis Report</title>
        <style>
            body {
                font-family: Arial, sans-serif;
                line-height: 1.6;
                color: #333;
                max-width: 1200px;
                margin: 0 auto;
                padding: 20px;
            }
            h1 {
                color: #2c3e50;
                border-bottom: 2px solid #3498db;
                padding-bottom: 10px;
            }
            h2 {
                color: #2980b9;
                margin-top: 30px;
            }
            table {
                border-collapse: collapse;
                width: 100%;
            }
            th, td {
                text-align: left;
                padding: 6px 10px;
                border-bottom: 1px solid #eee;
            }
            .count {
                background-color: #3498db;
                color: white;
                border-radius: 20px;
                padding: 2px 8px;
                font-size: 0.8em;
            }
            .timestamp {
                color: #7f8c8d;
                font-size: 0.9em;
                margin-bottom: 30px;
            }
            .summary {
                background-color: #e8f4f8;
                padding: 15px;
                border-radius: 5px;
                margin-bottom: 30px;
            }
        </style>
    </head>
    <body>
        <h1>Duplicate Analysis Report</h1>
        <div class="timestamp">Generated on: {{timestamp}} ({{strategy}} strategy, sha256 {{sha256}})</div>

        <div class="summary">
            <h2>Summary</h2>
            {{#each levels}}
            <p>{{name}}: {{total}} total, {{unique}} unique, {{duplicates}} duplicates</p>
            {{/each}}
        </div>

        {{#each levels}}
        {{#if entries}}
        <h2>Duplicate {{name}}</h2>
        <table>
            <tr><th>Name</th><th>Count</th><th>Contexts</th></tr>
            {{#each entries}}
            <tr><td>{{name}}</td><td><span class="count">{{count}}</span></td><td>{{contexts}}</td></tr>
            {{/each}}
        </table>
        {{/if}}
        {{/each}}
    </body>
    </html>
    "#;

    handlebars
        .register_template_string("report", HTML_TEMPLATE)
        .context("Failed to register HTML template")?;

    let levels: Vec<Value> = report
        .levels()
        .iter()
        .map(|level| {
            let entries: Vec<Value> = level
                .entries
                .iter()
                .map(|entry| {
                    json!({
                        "name": entry.name,
                        "count": entry.count,
                        "contexts": joined_contexts(&entry.contexts),
                    })
                })
                .collect();
            json!({
                "name": capitalize(level.level.plural()),
                "total": level.total,
                "unique": level.unique,
                "duplicates": level.duplicates,
                "entries": entries,
            })
        })
        .collect();

    let template_data = json!({
        "timestamp": chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        "strategy": report.strategy.to_string(),
        "sha256": report.source.sha256,
        "levels": levels,
    });

    let html = handlebars
        .render("report", &template_data)
        .context("Failed to render HTML template")?;

    let mut file = File::create(output_path)
        .context(format!("Failed to create HTML output file: {}", output_path.display()))?;

    file.write_all(html.as_bytes())
        .context("Failed to write HTML data")?;

    Ok(())
}

/// Create a CSV report listing every duplicate entry
///
/// # Arguments
///
/// * `report` - The analysis report
/// * `output_path` - Path where the CSV file will be written
///
/// # Returns
///
/// Result indicating success or failure
pub fn create_csv_report(report: &AnalysisReport, output_path: &Path) -> Result<()> {
    let file = File::create(output_path)
        .context(format!("Failed to create CSV output file: {}", output_path.display()))?;

    let mut writer = csv::Writer::from_writer(file);

    writer
        .write_record(["Level", "Name", "Count", "Contexts"])
        .context("Failed to write CSV header")?;

    for level in report.levels() {
        let level_name = level.level.to_string();
        for entry in &level.entries {
            writer
                .write_record([
                    level_name.as_str(),
                    entry.name.as_str(),
                    entry.count.to_string().as_str(),
                    joined_contexts(&entry.contexts).as_str(),
                ])
                .context("Failed to write CSV record")?;
        }
    }

    writer.flush().context("Failed to flush CSV writer")?;

    Ok(())
}

fn joined_contexts(contexts: &[crate::core::reporter::ContextPath]) -> String {
    contexts
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
