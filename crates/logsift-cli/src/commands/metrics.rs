use std::path::Path;

use comfy_table::{Cell, Table};
use logsift_core::LogsiftError;
use logsift_engine::MetricsSnapshot;

pub fn run(file: &Path, security: bool, json: bool, config: Option<&Path>) -> Result<(), LogsiftError> {
    let config = super::load_config(config)?;
    let text = super::read_text(file)?;
    let outcome = super::build_pipeline(&config).process_text(&text);

    let mut aggregator = super::build_aggregator(&config);
    aggregator.observe_all(&outcome.records);
    let snapshot = aggregator.snapshot();

    if json {
        let rendered = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| LogsiftError::Serialize(e.to_string()))?;
        println!("{rendered}");
        return Ok(());
    }

    println!(
        "Records: {} | Parse errors: {} | Success rate: {:.2}%",
        snapshot.total_records, outcome.stats.error_lines, outcome.stats.success_rate
    );

    print_distribution("Log levels", &snapshot.levels);
    print_distribution("Status codes", &snapshot.status_distribution);
    print_distribution("Methods", &snapshot.method_distribution);
    print_top("Top IPs", &snapshot.top_ips);
    print_top("Top URLs", &snapshot.top_urls);
    print_top("Top user agents", &snapshot.top_user_agents);
    print_top("Top file types", &snapshot.traffic.top_file_types);
    print_distribution("IP classes", &snapshot.traffic.ip_classes);
    print_distribution("Response sizes", &snapshot.traffic.size_categories);

    println!(
        "\nHTTP errors: {} ({:.2}%) | 4xx: {} | 5xx: {}",
        snapshot.error_analysis.total_errors,
        snapshot.error_analysis.error_rate,
        snapshot.error_analysis.errors_4xx,
        snapshot.error_analysis.errors_5xx
    );

    if security {
        print_security(&snapshot);
    }
    Ok(())
}

fn print_security(snapshot: &MetricsSnapshot) {
    println!(
        "\nSuspicious requests: {}",
        snapshot.security.suspicious_requests
    );
    print_distribution("Threat levels", &snapshot.security.threat_levels);
    print_distribution("Attack indicators", &snapshot.security.attack_types);
    print_top("Top suspicious IPs", &snapshot.security.top_suspicious_ips);
}

fn print_distribution(title: &str, counts: &std::collections::HashMap<String, u64>) {
    if counts.is_empty() {
        return;
    }
    let mut entries: Vec<(&String, &u64)> = counts.iter().collect();
    entries.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));

    let mut table = Table::new();
    table.set_header(vec![title, "Count"]);
    for (key, count) in entries {
        table.add_row(vec![Cell::new(key), Cell::new(count)]);
    }
    println!("{table}");
}

fn print_top(title: &str, entries: &[(String, u64)]) {
    if entries.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![title, "Count"]);
    for (key, count) in entries {
        table.add_row(vec![
            Cell::new(super::truncate(key, 60)),
            Cell::new(count),
        ]);
    }
    println!("{table}");
}
