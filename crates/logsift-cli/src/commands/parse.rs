use std::path::Path;

use comfy_table::{Cell, Table};
use logsift_core::LogsiftError;

const MAX_TABLE_ROWS: usize = 50;

pub fn run(file: &Path, json: bool, config: Option<&Path>) -> Result<(), LogsiftError> {
    let config = super::load_config(config)?;
    let text = super::read_text(file)?;
    let outcome = super::build_pipeline(&config).process_text(&text);

    if json {
        let rendered = serde_json::to_string_pretty(&outcome)
            .map_err(|e| LogsiftError::Serialize(e.to_string()))?;
        println!("{rendered}");
        return Ok(());
    }

    println!(
        "Lines: {} | Parsed: {} | Errors: {} | Success rate: {:.2}%",
        outcome.stats.total_lines,
        outcome.stats.parsed_lines,
        outcome.stats.error_lines,
        outcome.stats.success_rate
    );

    for err in &outcome.errors {
        println!(
            "  line {}: {} ({})",
            err.line_number,
            super::truncate(&err.raw_line, 60),
            err.error_message
        );
    }

    if outcome.records.is_empty() {
        println!("[logsift] No records parsed");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Source", "Level", "Timestamp", "Message"]);
    for record in outcome.records.iter().take(MAX_TABLE_ROWS) {
        table.add_row(vec![
            Cell::new(record.source().as_str()),
            Cell::new(&record.level),
            Cell::new(&record.timestamp),
            Cell::new(super::truncate(&record.message, 60)),
        ]);
    }
    println!("{table}");

    if outcome.records.len() > MAX_TABLE_ROWS {
        println!(
            "... {} more records (use --json for the full set)",
            outcome.records.len() - MAX_TABLE_ROWS
        );
    }
    Ok(())
}
