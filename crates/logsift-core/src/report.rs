use serde::Serialize;

/// Per-line failure recorded by the batch orchestrator. Never aborts a batch.
#[derive(Debug, Clone, Serialize)]
pub struct ParseError {
    pub line_number: usize,
    pub raw_line: String,
    pub error_message: String,
}

/// Batch-level parsing statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BatchStats {
    pub total_lines: usize,
    pub parsed_lines: usize,
    pub error_lines: usize,
    /// Percentage of non-blank lines that parsed, rounded to 2 decimals.
    /// 0 for an empty batch.
    pub success_rate: f64,
}

impl BatchStats {
    pub fn new(parsed_lines: usize, error_lines: usize) -> Self {
        let total_lines = parsed_lines + error_lines;
        let success_rate = if total_lines == 0 {
            0.0
        } else {
            let rate = parsed_lines as f64 / total_lines as f64 * 100.0;
            (rate * 100.0).round() / 100.0
        };
        Self {
            total_lines,
            parsed_lines,
            error_lines,
            success_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_success_rate() {
        let stats = BatchStats::new(95, 5);
        assert_eq!(stats.total_lines, 100);
        assert_eq!(stats.parsed_lines, 95);
        assert_eq!(stats.error_lines, 5);
        assert!((stats.success_rate - 95.0).abs() < f64::EPSILON);
    }

    #[test]
    fn stats_empty_batch_never_divides_by_zero() {
        let stats = BatchStats::new(0, 0);
        assert_eq!(stats.total_lines, 0);
        assert!((stats.success_rate - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn stats_rounds_to_two_decimals() {
        // 1/3 = 33.333...%
        let stats = BatchStats::new(1, 2);
        assert!((stats.success_rate - 33.33).abs() < 1e-9);
    }
}
