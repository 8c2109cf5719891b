use std::path::Path;

use comfy_table::{Cell, Table};
use logsift_core::LogsiftError;

pub fn run(file: &Path, json: bool, config: Option<&Path>) -> Result<(), LogsiftError> {
    let config = super::load_config(config)?;
    let text = super::read_text(file)?;
    let outcome = super::build_pipeline(&config).process_text(&text);

    let mut aggregator = super::build_aggregator(&config);
    aggregator.observe_all(&outcome.records);
    let report = aggregator.threat_report();

    if json {
        let rendered = serde_json::to_string_pretty(&report)
            .map_err(|e| LogsiftError::Serialize(e.to_string()))?;
        println!("{rendered}");
        return Ok(());
    }

    println!(
        "Threats: {} of {} records ({:.2}%) | High risk: {}",
        report.total_threats,
        outcome.stats.parsed_lines,
        report.threat_percentage,
        report.high_risk_requests
    );

    if report.total_threats == 0 {
        println!("[logsift] No suspicious activity detected");
        return Ok(());
    }

    if !report.threats_by_ip.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Source IP", "Suspicious requests"]);
        for (ip, count) in &report.threats_by_ip {
            table.add_row(vec![Cell::new(ip), Cell::new(count)]);
        }
        println!("{table}");
    }

    if !report.threats_by_type.is_empty() {
        let mut entries: Vec<(&String, &u64)> = report.threats_by_type.iter().collect();
        entries.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
        let mut table = Table::new();
        table.set_header(vec!["Request type", "Count"]);
        for (kind, count) in entries {
            table.add_row(vec![Cell::new(kind), Cell::new(count)]);
        }
        println!("{table}");
    }

    let peak_hour = report
        .attack_timeline
        .iter()
        .enumerate()
        .max_by_key(|(_, count)| **count)
        .map(|(hour, _)| hour)
        .unwrap_or(0);
    println!("Peak attack hour (UTC): {peak_hour:02}:00");
    Ok(())
}
