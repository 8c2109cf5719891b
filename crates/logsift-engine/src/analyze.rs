use logsift_core::{AccessDetail, AttackIndicator, RequestType, ThreatAnnotation, ThreatLevel};

/// Fixed suspicious-path vocabulary, matched as lowercase substrings of the
/// URL path.
pub const SUSPICIOUS_PATHS: [&str; 12] = [
    "admin",
    "login",
    "wp-admin",
    "phpmyadmin",
    "shell",
    "config",
    "backup",
    "test",
    ".env",
    "password",
    "passwd",
    "shadow",
];

const SQL_INJECTION: [&str; 9] = [
    "union", "select", "drop", "insert", "update", "'", "\"", "--", "/*",
];
const XSS: [&str; 5] = ["<script", "javascript:", "onerror", "onload", "alert("];
const PATH_TRAVERSAL: [&str; 5] = ["../", "..\\", "%2e%2e", "etc/passwd", "windows/system32"];
const COMMAND_INJECTION: [&str; 7] = ["cmd.exe", "/bin/bash", "wget", "curl", "|", ";", "&"];
const FILE_INCLUSION: [&str; 5] = ["file:", "http:", "ftp:", "include", "require"];

/// Attack families, checked in this fixed order; each appends its own tag.
const ATTACK_FAMILIES: [(AttackIndicator, &[&str]); 5] = [
    (AttackIndicator::SqlInjection, &SQL_INJECTION),
    (AttackIndicator::Xss, &XSS),
    (AttackIndicator::PathTraversal, &PATH_TRAVERSAL),
    (AttackIndicator::CommandInjection, &COMMAND_INJECTION),
    (AttackIndicator::FileInclusion, &FILE_INCLUSION),
];

const BOT_TOKENS: [&str; 7] = ["bot", "crawler", "spider", "scan", "nmap", "sqlmap", "nikto"];

const MUTATING_METHODS: [&str; 4] = ["POST", "PUT", "DELETE", "PATCH"];

/// Heuristic request analyzer. The fixed vocabularies above are immutable;
/// deployments may only append extra tokens after them.
pub struct Analyzer {
    suspicious_paths: Vec<String>,
    bot_tokens: Vec<String>,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer {
    pub fn new() -> Self {
        Self::with_extras(&[], &[])
    }

    /// Build an analyzer with extra suspicious-path and bot tokens appended
    /// after the fixed vocabularies. Tokens are lowercased.
    pub fn with_extras(extra_paths: &[String], extra_bots: &[String]) -> Self {
        let mut suspicious_paths: Vec<String> =
            SUSPICIOUS_PATHS.iter().map(|p| p.to_string()).collect();
        suspicious_paths.extend(extra_paths.iter().map(|p| p.to_lowercase()));

        let mut bot_tokens: Vec<String> = BOT_TOKENS.iter().map(|t| t.to_string()).collect();
        bot_tokens.extend(extra_bots.iter().map(|t| t.to_lowercase()));

        Self {
            suspicious_paths,
            bot_tokens,
        }
    }

    /// Classify an access-log request. Pure and deterministic; tagging order
    /// is detection order and threat escalation is one-directional.
    pub fn analyze(&self, detail: &AccessDetail) -> ThreatAnnotation {
        let mut analysis = ThreatAnnotation::default();

        let url = detail.url.to_lowercase();
        if self.suspicious_paths.iter().any(|p| url.contains(p)) {
            analysis.is_suspicious = true;
            analysis.threat_level.escalate(ThreatLevel::Medium);
            analysis
                .attack_indicators
                .push(AttackIndicator::SuspiciousPath);
        }

        let full_request = format!("{} {}", url, detail.query_params).to_lowercase();
        for (indicator, signatures) in ATTACK_FAMILIES {
            if signatures.iter().any(|s| full_request.contains(s)) {
                analysis.is_suspicious = true;
                analysis.threat_level.escalate(ThreatLevel::High);
                analysis.attack_indicators.push(indicator);
            }
        }

        if detail.status_code == 401 {
            analysis.request_type = RequestType::AuthFailure;
            analysis.is_suspicious = true;
        } else if detail.status_code == 403 {
            analysis.request_type = RequestType::AccessDenied;
            analysis.is_suspicious = true;
        } else if detail.status_code == 404 {
            analysis.request_type = RequestType::NotFound;
            if analysis.is_suspicious {
                analysis.attack_indicators.push(AttackIndicator::Probing);
            }
        } else if detail.status_code >= 500 {
            analysis.request_type = RequestType::ServerError;
        } else if MUTATING_METHODS.contains(&detail.method.as_str()) {
            analysis.request_type = RequestType::DataModification;
        }

        let user_agent = detail.user_agent.to_lowercase();
        if self.bot_tokens.iter().any(|t| user_agent.contains(t)) {
            analysis.is_suspicious = true;
            analysis
                .attack_indicators
                .push(AttackIndicator::AutomatedTool);
        }

        analysis
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn make_detail(method: &str, url: &str, query: &str, status: u32, ua: &str) -> AccessDetail {
        AccessDetail {
            ip: "10.0.0.1".into(),
            method: method.into(),
            url: url.into(),
            protocol: "HTTP/1.1".into(),
            query_params: query.into(),
            status_code: status,
            response_size: 0,
            referer: String::new(),
            user_agent: ua.into(),
            response_time: 0,
            time: Utc::now(),
            analysis: None,
        }
    }

    #[test]
    fn normal_request_is_clean() {
        let a = Analyzer::new().analyze(&make_detail("GET", "/index.html", "", 200, ""));
        assert!(!a.is_suspicious);
        assert_eq!(a.threat_level, ThreatLevel::Low);
        assert_eq!(a.request_type, RequestType::Normal);
        assert!(a.attack_indicators.is_empty());
    }

    #[test]
    fn suspicious_path_is_medium() {
        let a = Analyzer::new().analyze(&make_detail("GET", "/wp-admin/setup.php", "", 200, ""));
        assert!(a.is_suspicious);
        assert_eq!(a.threat_level, ThreatLevel::Medium);
        assert_eq!(a.attack_indicators, vec![AttackIndicator::SuspiciousPath]);
    }

    #[test]
    fn sql_injection_in_query_is_high() {
        let a = Analyzer::new().analyze(&make_detail(
            "GET",
            "/admin/login.php",
            "id=1' OR '1'='1",
            200,
            "",
        ));
        assert!(a.is_suspicious);
        assert_eq!(a.threat_level, ThreatLevel::High);
        assert_eq!(
            a.attack_indicators,
            vec![
                AttackIndicator::SuspiciousPath,
                AttackIndicator::SqlInjection
            ]
        );
    }

    #[test]
    fn high_never_downgrades() {
        // Attack signature escalates to high; the later status rules must
        // leave it there.
        let a = Analyzer::new().analyze(&make_detail(
            "GET",
            "/search",
            "q=<script>alert(1)</script>",
            404,
            "",
        ));
        assert_eq!(a.threat_level, ThreatLevel::High);
        assert_eq!(a.request_type, RequestType::NotFound);
        assert!(a.attack_indicators.contains(&AttackIndicator::Probing));
    }

    #[test]
    fn multiple_families_each_append() {
        let a = Analyzer::new().analyze(&make_detail(
            "GET",
            "/x",
            "f=../../etc/passwd&cmd=wget",
            200,
            "",
        ));
        assert!(a.attack_indicators.contains(&AttackIndicator::PathTraversal));
        assert!(a
            .attack_indicators
            .contains(&AttackIndicator::CommandInjection));
        assert_eq!(a.threat_level, ThreatLevel::High);
    }

    #[test]
    fn status_categorization() {
        let analyzer = Analyzer::new();
        let a = analyzer.analyze(&make_detail("GET", "/x", "", 401, ""));
        assert_eq!(a.request_type, RequestType::AuthFailure);
        assert!(a.is_suspicious);

        let a = analyzer.analyze(&make_detail("GET", "/x", "", 403, ""));
        assert_eq!(a.request_type, RequestType::AccessDenied);
        assert!(a.is_suspicious);

        let a = analyzer.analyze(&make_detail("GET", "/x", "", 503, ""));
        assert_eq!(a.request_type, RequestType::ServerError);
        assert!(!a.is_suspicious);
    }

    #[test]
    fn clean_404_is_not_probing() {
        let a = Analyzer::new().analyze(&make_detail("GET", "/missing.html", "", 404, ""));
        assert_eq!(a.request_type, RequestType::NotFound);
        assert!(!a.is_suspicious);
        assert!(a.attack_indicators.is_empty());
    }

    #[test]
    fn mutating_method_only_when_no_status_rule_fires() {
        let analyzer = Analyzer::new();
        let a = analyzer.analyze(&make_detail("POST", "/api/items", "", 201, ""));
        assert_eq!(a.request_type, RequestType::DataModification);

        // 401 wins over the method rule.
        let a = analyzer.analyze(&make_detail("POST", "/api/items", "", 401, ""));
        assert_eq!(a.request_type, RequestType::AuthFailure);
    }

    #[test]
    fn bot_user_agent_does_not_touch_threat_level() {
        let a = Analyzer::new().analyze(&make_detail("GET", "/index.html", "", 200, "sqlmap/1.7"));
        assert!(a.is_suspicious);
        assert_eq!(a.threat_level, ThreatLevel::Low);
        assert_eq!(a.attack_indicators, vec![AttackIndicator::AutomatedTool]);
    }

    #[test]
    fn extra_tokens_append_after_fixed_vocabulary() {
        let analyzer = Analyzer::with_extras(&["Secret".to_string()], &["Headless".to_string()]);
        let a = analyzer.analyze(&make_detail("GET", "/secret/area", "", 200, ""));
        assert!(a.is_suspicious);
        assert_eq!(a.threat_level, ThreatLevel::Medium);

        let a = analyzer.analyze(&make_detail("GET", "/ok", "", 200, "HeadlessChrome"));
        assert!(a.is_suspicious);
        assert_eq!(a.attack_indicators, vec![AttackIndicator::AutomatedTool]);
    }
}
