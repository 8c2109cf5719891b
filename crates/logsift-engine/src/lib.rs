pub mod analyze;
pub mod batch;
pub mod detect;
pub mod extract;
pub mod metrics;

pub use analyze::Analyzer;
pub use batch::{BatchOutcome, Pipeline};
pub use detect::detect;
pub use extract::extract;
pub use metrics::{MetricsAggregator, MetricsSnapshot, ThreatReport};
