pub mod enrich;
pub mod error;
pub mod record;
pub mod report;

pub use enrich::{Enricher, Enrichment};
pub use error::LogsiftError;
pub use record::{
    AccessDetail, AttackIndicator, NormalizedRecord, RecordKind, RequestType, SourceKind,
    ThreatAnnotation, ThreatLevel,
};
pub use report::{BatchStats, ParseError};
