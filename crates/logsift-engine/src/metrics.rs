use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::LazyLock;

use chrono::{Datelike, Timelike};
use logsift_core::{NormalizedRecord, ThreatLevel};
use regex::Regex;
use serde::Serialize;

/// Default truncation for "top" tables.
pub const TOP_N: usize = 10;

// 3-digit status token delimited by single spaces inside a free-text message.
static RE_MSG_STATUS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s(\d{3})\s").unwrap());

/// Frequency counter that remembers first-seen order for stable top-N
/// ranking. Merging two counters adds counts and keeps the earlier rank.
#[derive(Debug, Clone, Default)]
pub struct Counter {
    counts: HashMap<String, u64>,
    first_seen: HashMap<String, u64>,
    next_rank: u64,
}

impl Counter {
    pub fn increment(&mut self, key: &str) {
        self.add(key, 1);
    }

    pub fn add(&mut self, key: &str, n: u64) {
        if !self.counts.contains_key(key) {
            self.first_seen.insert(key.to_string(), self.next_rank);
            self.next_rank += 1;
        }
        *self.counts.entry(key.to_string()).or_default() += n;
    }

    pub fn merge(&mut self, other: &Counter) {
        // Keys new to self are ranked after everything self has seen,
        // preserving the other counter's relative order.
        let mut new_keys: Vec<(&String, u64)> = other
            .counts
            .keys()
            .filter(|k| !self.counts.contains_key(*k))
            .map(|k| (k, other.first_seen[k]))
            .collect();
        new_keys.sort_by_key(|(_, rank)| *rank);
        for (key, _) in new_keys {
            self.first_seen.insert(key.clone(), self.next_rank);
            self.next_rank += 1;
        }
        for (key, n) in &other.counts {
            *self.counts.entry(key.clone()).or_default() += n;
        }
    }

    pub fn counts(&self) -> &HashMap<String, u64> {
        &self.counts
    }

    pub fn get(&self, key: &str) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Highest-count keys, ties broken by first-seen order.
    pub fn top(&self, n: usize) -> Vec<(String, u64)> {
        let mut entries: Vec<(&String, u64)> =
            self.counts.iter().map(|(k, v)| (k, *v)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then(self.first_seen[a.0].cmp(&self.first_seen[b.0])));
        entries
            .into_iter()
            .take(n)
            .map(|(k, v)| (k.clone(), v))
            .collect()
    }
}

/// HTTP error breakdown over access records.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ErrorAnalysis {
    pub total_errors: u64,
    pub error_rate: f64,
    pub errors_4xx: u64,
    pub errors_5xx: u64,
}

/// Security summary derived from threat-annotated records.
#[derive(Debug, Clone, Serialize)]
pub struct SecuritySummary {
    pub suspicious_requests: u64,
    pub threat_levels: HashMap<String, u64>,
    pub attack_types: HashMap<String, u64>,
    pub top_suspicious_ips: Vec<(String, u64)>,
}

/// Traffic-shape summary over access records.
#[derive(Debug, Clone, Serialize)]
pub struct TrafficSummary {
    /// Requests per hour of day, index 0..24.
    pub hourly_distribution: [u64; 24],
    /// Requests per day of week, Monday = 0.
    pub daily_distribution: [u64; 7],
    pub top_file_types: Vec<(String, u64)>,
    pub ip_classes: HashMap<String, u64>,
    pub size_categories: HashMap<String, u64>,
}

/// Aggregate-only, derived snapshot of one ingested batch.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub total_records: u64,
    pub requests_per_minute: HashMap<String, u64>,
    pub error_codes: HashMap<String, u64>,
    pub levels: HashMap<String, u64>,
    pub top_ips: Vec<(String, u64)>,
    pub top_urls: Vec<(String, u64)>,
    pub top_user_agents: Vec<(String, u64)>,
    pub status_distribution: HashMap<String, u64>,
    pub method_distribution: HashMap<String, u64>,
    pub error_analysis: ErrorAnalysis,
    pub security: SecuritySummary,
    pub traffic: TrafficSummary,
}

/// Focused threat analysis, computed on demand from the same counters.
#[derive(Debug, Clone, Serialize)]
pub struct ThreatReport {
    pub total_threats: u64,
    pub threat_percentage: f64,
    pub threats_by_ip: Vec<(String, u64)>,
    pub threats_by_type: HashMap<String, u64>,
    pub high_risk_requests: u64,
    /// Suspicious requests per hour of day.
    pub attack_timeline: [u64; 24],
}

/// Single-pass streaming aggregator. Each record is visited exactly once;
/// counters update in O(1) amortized. Holds no cross-batch state: build a
/// fresh aggregator per invocation, or `merge` partial aggregates from
/// parallel workers (the fold is commutative and associative).
#[derive(Debug, Clone)]
pub struct MetricsAggregator {
    top_n: usize,
    total_records: u64,
    access_records: u64,
    requests_per_minute: Counter,
    error_codes: Counter,
    levels: Counter,
    ips: Counter,
    urls: Counter,
    user_agents: Counter,
    methods: Counter,
    statuses: Counter,
    extensions: Counter,
    ip_classes: Counter,
    size_categories: Counter,
    hourly: [u64; 24],
    daily: [u64; 7],
    http_errors: u64,
    errors_4xx: u64,
    errors_5xx: u64,
    suspicious: u64,
    high_threats: u64,
    threat_levels: Counter,
    indicators: Counter,
    suspicious_ips: Counter,
    threat_types: Counter,
    attack_hours: [u64; 24],
}

impl Default for MetricsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsAggregator {
    pub fn new() -> Self {
        Self::with_top_n(TOP_N)
    }

    pub fn with_top_n(top_n: usize) -> Self {
        Self {
            top_n,
            total_records: 0,
            access_records: 0,
            requests_per_minute: Counter::default(),
            error_codes: Counter::default(),
            levels: Counter::default(),
            ips: Counter::default(),
            urls: Counter::default(),
            user_agents: Counter::default(),
            methods: Counter::default(),
            statuses: Counter::default(),
            extensions: Counter::default(),
            ip_classes: Counter::default(),
            size_categories: Counter::default(),
            hourly: [0; 24],
            daily: [0; 7],
            http_errors: 0,
            errors_4xx: 0,
            errors_5xx: 0,
            suspicious: 0,
            high_threats: 0,
            threat_levels: Counter::default(),
            indicators: Counter::default(),
            suspicious_ips: Counter::default(),
            threat_types: Counter::default(),
            attack_hours: [0; 24],
        }
    }

    /// Fold one record into the counters.
    pub fn observe(&mut self, record: &NormalizedRecord) {
        self.total_records += 1;

        // Minute bucket: canonical time when the extractor produced one,
        // lexical truncation of the native timestamp otherwise.
        if let Some(access) = record.access() {
            let key = access.time.format("%Y-%m-%d %H:%M").to_string();
            self.requests_per_minute.increment(&key);
        } else if !record.timestamp.is_empty() {
            let key: String = record.timestamp.chars().take(16).collect();
            self.requests_per_minute.increment(&key);
        }

        if !record.level.is_empty() {
            self.levels.increment(&record.level);
        }

        if record.message.contains("HTTP") {
            if let Some(caps) = RE_MSG_STATUS.captures(&record.message) {
                self.error_codes.increment(&caps[1]);
            }
        }

        let Some(access) = record.access() else {
            return;
        };
        self.access_records += 1;

        self.ips.increment(&access.ip);
        self.urls.increment(&access.url);
        if !access.user_agent.is_empty() {
            self.user_agents.increment(&access.user_agent);
        }
        if !access.method.is_empty() {
            self.methods.increment(&access.method);
        }
        self.statuses.increment(&access.status_code.to_string());
        self.extensions.increment(&file_extension(&access.url));
        self.ip_classes.increment(ip_class(&access.ip));
        self.size_categories
            .increment(size_category(access.response_size));

        let hour = access.time.hour() as usize;
        self.hourly[hour] += 1;
        self.daily[access.time.weekday().num_days_from_monday() as usize] += 1;

        if access.status_code >= 400 {
            self.http_errors += 1;
            if access.status_code < 500 {
                self.errors_4xx += 1;
            } else {
                self.errors_5xx += 1;
            }
        }

        if let Some(analysis) = &access.analysis {
            self.threat_levels.increment(analysis.threat_level.as_str());
            for indicator in &analysis.attack_indicators {
                self.indicators.increment(indicator.as_str());
            }
            if analysis.is_suspicious {
                self.suspicious += 1;
                self.suspicious_ips.increment(&access.ip);
                self.threat_types.increment(analysis.request_type.as_str());
                self.attack_hours[hour] += 1;
                if analysis.threat_level == ThreatLevel::High {
                    self.high_threats += 1;
                }
            }
        }
    }

    pub fn observe_all<'a, I: IntoIterator<Item = &'a NormalizedRecord>>(&mut self, records: I) {
        for record in records {
            self.observe(record);
        }
    }

    /// Combine a partial aggregate from another worker by counter addition.
    pub fn merge(&mut self, other: &MetricsAggregator) {
        self.total_records += other.total_records;
        self.access_records += other.access_records;
        self.requests_per_minute.merge(&other.requests_per_minute);
        self.error_codes.merge(&other.error_codes);
        self.levels.merge(&other.levels);
        self.ips.merge(&other.ips);
        self.urls.merge(&other.urls);
        self.user_agents.merge(&other.user_agents);
        self.methods.merge(&other.methods);
        self.statuses.merge(&other.statuses);
        self.extensions.merge(&other.extensions);
        self.ip_classes.merge(&other.ip_classes);
        self.size_categories.merge(&other.size_categories);
        for h in 0..24 {
            self.hourly[h] += other.hourly[h];
            self.attack_hours[h] += other.attack_hours[h];
        }
        for d in 0..7 {
            self.daily[d] += other.daily[d];
        }
        self.http_errors += other.http_errors;
        self.errors_4xx += other.errors_4xx;
        self.errors_5xx += other.errors_5xx;
        self.suspicious += other.suspicious;
        self.high_threats += other.high_threats;
        self.threat_levels.merge(&other.threat_levels);
        self.indicators.merge(&other.indicators);
        self.suspicious_ips.merge(&other.suspicious_ips);
        self.threat_types.merge(&other.threat_types);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let error_rate = if self.access_records == 0 {
            0.0
        } else {
            self.http_errors as f64 / self.access_records as f64 * 100.0
        };

        MetricsSnapshot {
            total_records: self.total_records,
            requests_per_minute: self.requests_per_minute.counts().clone(),
            error_codes: self.error_codes.counts().clone(),
            levels: self.levels.counts().clone(),
            top_ips: self.ips.top(self.top_n),
            top_urls: self.urls.top(self.top_n),
            top_user_agents: self.user_agents.top(self.top_n),
            status_distribution: self.statuses.counts().clone(),
            method_distribution: self.methods.counts().clone(),
            error_analysis: ErrorAnalysis {
                total_errors: self.http_errors,
                error_rate,
                errors_4xx: self.errors_4xx,
                errors_5xx: self.errors_5xx,
            },
            security: SecuritySummary {
                suspicious_requests: self.suspicious,
                threat_levels: self.threat_levels.counts().clone(),
                attack_types: self.indicators.counts().clone(),
                top_suspicious_ips: self.suspicious_ips.top(self.top_n),
            },
            traffic: TrafficSummary {
                hourly_distribution: self.hourly,
                daily_distribution: self.daily,
                top_file_types: self.extensions.top(self.top_n),
                ip_classes: self.ip_classes.counts().clone(),
                size_categories: self.size_categories.counts().clone(),
            },
        }
    }

    pub fn threat_report(&self) -> ThreatReport {
        let threat_percentage = if self.access_records == 0 {
            0.0
        } else {
            self.suspicious as f64 / self.access_records as f64 * 100.0
        };
        ThreatReport {
            total_threats: self.suspicious,
            threat_percentage,
            threats_by_ip: self.suspicious_ips.top(self.top_n),
            threats_by_type: self.threat_types.counts().clone(),
            high_risk_requests: self.high_threats,
            attack_timeline: self.attack_hours,
        }
    }
}

/// File extension of the query-stripped path; `none` for bare paths and
/// implausibly long suffixes.
fn file_extension(url: &str) -> String {
    if url.is_empty() || url == "/" {
        return "none".to_string();
    }
    let path = url.split('?').next().unwrap_or("");
    match path.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && ext.len() <= 5 => ext.to_lowercase(),
        _ => "none".to_string(),
    }
}

fn ip_class(ip: &str) -> &'static str {
    match ip.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => {
            if v4.is_private() {
                "private"
            } else if v4.is_loopback() {
                "loopback"
            } else if v4.is_multicast() {
                "multicast"
            } else {
                "public"
            }
        }
        Ok(IpAddr::V6(v6)) => {
            if v6.is_loopback() {
                "loopback"
            } else if v6.is_multicast() {
                "multicast"
            } else {
                "public"
            }
        }
        Err(_) => "invalid",
    }
}

fn size_category(size: u64) -> &'static str {
    if size <= 1_000 {
        "small"
    } else if size <= 10_000 {
        "medium"
    } else if size <= 100_000 {
        "large"
    } else {
        "very_large"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use logsift_core::{
        AccessDetail, AttackIndicator, NormalizedRecord, RecordKind, RequestType, ThreatAnnotation,
    };

    fn plain_record(level: &str, timestamp: &str, message: &str) -> NormalizedRecord {
        NormalizedRecord {
            timestamp: timestamp.to_string(),
            level: level.to_string(),
            message: message.to_string(),
            raw: message.to_string(),
            enrichment: None,
            kind: RecordKind::Unknown,
        }
    }

    fn access_record(
        ip: &str,
        url: &str,
        status: u32,
        size: u64,
        analysis: Option<ThreatAnnotation>,
    ) -> NormalizedRecord {
        NormalizedRecord {
            timestamp: "10/Oct/2023:13:55:36 +0000".into(),
            level: "INFO".into(),
            message: format!("GET {url} HTTP/1.1"),
            raw: String::new(),
            enrichment: None,
            kind: RecordKind::Apache(AccessDetail {
                ip: ip.into(),
                method: "GET".into(),
                url: url.into(),
                protocol: "HTTP/1.1".into(),
                query_params: String::new(),
                status_code: status,
                response_size: size,
                referer: String::new(),
                user_agent: String::new(),
                response_time: 0,
                // Tuesday 2023-10-10, 13:55 UTC
                time: Utc.with_ymd_and_hms(2023, 10, 10, 13, 55, 36).unwrap(),
                analysis,
            }),
        }
    }

    #[test]
    fn counter_top_breaks_ties_by_first_seen() {
        let mut c = Counter::default();
        c.increment("b");
        c.increment("a");
        c.increment("a");
        c.increment("c");
        c.increment("c");
        let top = c.top(10);
        assert_eq!(top[0], ("a".to_string(), 2));
        assert_eq!(top[1], ("c".to_string(), 2));
        assert_eq!(top[2], ("b".to_string(), 1));
    }

    #[test]
    fn counter_top_is_bounded() {
        let mut c = Counter::default();
        for i in 0..100 {
            c.increment(&format!("key{i}"));
        }
        assert_eq!(c.top(10).len(), 10);
    }

    #[test]
    fn minute_bucket_uses_canonical_time_for_access_records() {
        let mut agg = MetricsAggregator::new();
        agg.observe(&access_record("1.2.3.4", "/a", 200, 100, None));
        assert_eq!(agg.requests_per_minute.get("2023-10-10 13:55"), 1);
    }

    #[test]
    fn minute_bucket_truncates_other_timestamps_lexically() {
        let mut agg = MetricsAggregator::new();
        agg.observe(&plain_record("INFO", "2023-01-01 08:30:15", "boot"));
        assert_eq!(agg.requests_per_minute.get("2023-01-01 08:30"), 1);
    }

    #[test]
    fn blank_timestamp_never_buckets() {
        let mut agg = MetricsAggregator::new();
        agg.observe(&plain_record("INFO", "", "no time"));
        assert!(agg.requests_per_minute.is_empty());
    }

    #[test]
    fn message_status_scavenging() {
        let mut agg = MetricsAggregator::new();
        agg.observe(&plain_record("INFO", "", "gateway replied HTTP 404 for /missing"));
        agg.observe(&plain_record("ERROR", "", "upstream sent HTTP 500 while proxying"));
        // Status token must be space-delimited and 3 digits.
        agg.observe(&plain_record("INFO", "", "HTTP request id 12345 processed"));
        assert_eq!(agg.error_codes.get("404"), 1);
        assert_eq!(agg.error_codes.get("500"), 1);
        assert!(agg.error_codes.get("123") == 0 && agg.error_codes.get("234") == 0);
    }

    #[test]
    fn traffic_and_error_breakdown() {
        let mut agg = MetricsAggregator::new();
        agg.observe(&access_record("10.0.0.1", "/a.css", 200, 400, None));
        agg.observe(&access_record("10.0.0.1", "/b.html", 404, 5_000, None));
        agg.observe(&access_record("8.8.8.8", "/c", 500, 200_000, None));

        let snap = agg.snapshot();
        assert_eq!(snap.error_analysis.total_errors, 2);
        assert_eq!(snap.error_analysis.errors_4xx, 1);
        assert_eq!(snap.error_analysis.errors_5xx, 1);
        assert!((snap.error_analysis.error_rate - 66.666).abs() < 0.01);

        assert_eq!(snap.traffic.hourly_distribution[13], 3);
        assert_eq!(snap.traffic.daily_distribution[1], 3); // Tuesday
        assert_eq!(snap.traffic.ip_classes.get("private"), Some(&2));
        assert_eq!(snap.traffic.ip_classes.get("public"), Some(&1));
        assert_eq!(snap.traffic.size_categories.get("small"), Some(&1));
        assert_eq!(snap.traffic.size_categories.get("medium"), Some(&1));
        assert_eq!(snap.traffic.size_categories.get("very_large"), Some(&1));
        assert!(snap
            .traffic
            .top_file_types
            .contains(&("css".to_string(), 1)));
    }

    #[test]
    fn security_summary_flattens_indicators() {
        let mut agg = MetricsAggregator::new();
        let annotation = ThreatAnnotation {
            threat_level: ThreatLevel::High,
            request_type: RequestType::NotFound,
            is_suspicious: true,
            attack_indicators: vec![
                AttackIndicator::SuspiciousPath,
                AttackIndicator::SqlInjection,
                AttackIndicator::Probing,
            ],
        };
        agg.observe(&access_record("9.9.9.9", "/admin", 404, 0, Some(annotation)));
        agg.observe(&access_record("10.0.0.1", "/ok", 200, 0, Some(ThreatAnnotation::default())));

        let snap = agg.snapshot();
        assert_eq!(snap.security.suspicious_requests, 1);
        assert_eq!(snap.security.threat_levels.get("high"), Some(&1));
        assert_eq!(snap.security.threat_levels.get("low"), Some(&1));
        // Three tags on one record contribute three counts.
        assert_eq!(snap.security.attack_types.len(), 3);
        assert_eq!(snap.security.top_suspicious_ips, vec![("9.9.9.9".to_string(), 1)]);

        let report = agg.threat_report();
        assert_eq!(report.total_threats, 1);
        assert_eq!(report.high_risk_requests, 1);
        assert!((report.threat_percentage - 50.0).abs() < f64::EPSILON);
        assert_eq!(report.attack_timeline[13], 1);
        assert_eq!(report.threats_by_type.get("not_found"), Some(&1));
    }

    #[test]
    fn merge_equals_single_pass_aggregation() {
        let records: Vec<NormalizedRecord> = (0..20)
            .map(|i| {
                access_record(
                    &format!("10.0.0.{}", i % 4),
                    &format!("/page{}.html", i % 3),
                    if i % 5 == 0 { 404 } else { 200 },
                    i * 100,
                    None,
                )
            })
            .collect();

        let mut whole = MetricsAggregator::new();
        whole.observe_all(&records);

        // Arbitrary partition.
        let (left, right) = records.split_at(7);
        let mut a = MetricsAggregator::new();
        a.observe_all(left);
        let mut b = MetricsAggregator::new();
        b.observe_all(right);
        a.merge(&b);

        assert_eq!(a.total_records, whole.total_records);
        assert_eq!(a.ips.counts(), whole.ips.counts());
        assert_eq!(a.urls.counts(), whole.urls.counts());
        assert_eq!(a.statuses.counts(), whole.statuses.counts());
        assert_eq!(a.requests_per_minute.counts(), whole.requests_per_minute.counts());
        assert_eq!(a.levels.counts(), whole.levels.counts());
        assert_eq!(a.hourly, whole.hourly);
        assert_eq!(a.daily, whole.daily);
        assert_eq!(a.http_errors, whole.http_errors);
        assert_eq!(
            a.size_categories.counts(),
            whole.size_categories.counts()
        );
    }

    #[test]
    fn file_extension_rules() {
        assert_eq!(file_extension(""), "none");
        assert_eq!(file_extension("/"), "none");
        assert_eq!(file_extension("/index.html"), "html");
        assert_eq!(file_extension("/a/b"), "none");
        assert_eq!(file_extension("/archive.TAR.GZ"), "gz");
        assert_eq!(file_extension("/v1.2/data"), "none"); // "2/data" too long
    }

    #[test]
    fn ip_classes_cover_ranges() {
        assert_eq!(ip_class("192.168.1.1"), "private");
        assert_eq!(ip_class("127.0.0.1"), "loopback");
        assert_eq!(ip_class("224.0.0.5"), "multicast");
        assert_eq!(ip_class("8.8.8.8"), "public");
        assert_eq!(ip_class("unknown"), "invalid");
    }
}
