//! Rendering of query results, run summaries and table counts

use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};
use serde_json::Value;
use ytwh_ingest::{IngestionSummary, QueryResults, TableCounts};

use crate::error::Result;
use crate::{OutputFormat, SummaryFormat};

pub fn format_results(results: &QueryResults, format: OutputFormat, no_header: bool) -> Result<String> {
    Ok(match format {
        OutputFormat::Table => format_as_table(results),
        OutputFormat::Json => format_as_json(results)?,
        OutputFormat::Csv => format_delimited(results, ',', no_header),
        OutputFormat::Tsv => format_delimited(results, '\t', no_header),
    })
}

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).apply_modifier(UTF8_ROUND_CORNERS);
    table
}

fn format_as_table(results: &QueryResults) -> String {
    let mut table = new_table();
    table.set_header(&results.columns);

    for row in &results.rows {
        table.add_row(row.iter().map(value_to_string).collect::<Vec<_>>());
    }

    format!("{}\n", table)
}

/// Cell text; NULL is spelled out
fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// One JSON object per row, keyed by column name
fn format_as_json(results: &QueryResults) -> Result<String> {
    let rows: Vec<serde_json::Map<String, Value>> = results
        .rows
        .iter()
        .map(|row| results.columns.iter().cloned().zip(row.iter().cloned()).collect())
        .collect();

    Ok(format!("{}\n", serde_json::to_string_pretty(&rows)?))
}

fn format_delimited(results: &QueryResults, delimiter: char, no_header: bool) -> String {
    let separator = delimiter.to_string();
    let mut output = String::new();

    if !no_header && !results.columns.is_empty() {
        let header: Vec<String> = results
            .columns
            .iter()
            .map(|c| escape_field(c, delimiter))
            .collect();
        output.push_str(&header.join(&separator));
        output.push('\n');
    }

    for row in &results.rows {
        let fields: Vec<String> = row
            .iter()
            .map(|v| escape_field(&value_to_string(v), delimiter))
            .collect();
        output.push_str(&fields.join(&separator));
        output.push('\n');
    }

    output
}

fn escape_field(value: &str, delimiter: char) -> String {
    if value.contains(delimiter) || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn format_summary(summary: &IngestionSummary, format: SummaryFormat) -> Result<String> {
    if format == SummaryFormat::Json {
        return Ok(format!("{}\n", serde_json::to_string_pretty(summary)?));
    }

    let mut table = new_table();
    table.set_header(vec!["Entity", "Written"]);
    table.add_row(vec!["channels".to_string(), summary.channels_written.to_string()]);
    table.add_row(vec!["videos".to_string(), summary.videos_written.to_string()]);
    table.add_row(vec!["comments".to_string(), summary.comments_written.to_string()]);

    let mut output = format!(
        "Run {} for channel {} ({:.1}s)\n{}\n",
        summary.run_id,
        summary.channel_id.cyan(),
        summary.duration().num_milliseconds() as f64 / 1000.0,
        table
    );

    if summary.has_warnings() {
        output.push_str(&format!(
            "{} {} warning(s):\n",
            "⚠".yellow(),
            summary.warnings.len()
        ));
        for warning in &summary.warnings {
            output.push_str(&format!("  - {}\n", warning));
        }
    }

    Ok(output)
}

pub fn format_counts(counts: &TableCounts, format: SummaryFormat) -> Result<String> {
    if format == SummaryFormat::Json {
        return Ok(format!("{}\n", serde_json::to_string_pretty(counts)?));
    }

    let mut table = new_table();
    table.set_header(vec!["Table", "Rows"]);
    table.add_row(vec!["channels".to_string(), counts.channels.to_string()]);
    table.add_row(vec!["videos".to_string(), counts.videos.to_string()]);
    table.add_row(vec!["comments".to_string(), counts.comments.to_string()]);

    Ok(format!("{}\n", table))
}
