use serde::{Deserialize, Serialize};

/// Template-mining output supplied by an external collaborator. The engine
/// passes it through untouched and never computes it itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrichment {
    pub template: String,
    pub cluster_id: i64,
}

/// Narrow interface for the external template-mining collaborator. The
/// pipeline works identically when no enricher is installed.
pub trait Enricher {
    fn enrich(&self, line: &str) -> Option<Enrichment>;
}
