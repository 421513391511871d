//! Core data model definitions shared across the media janitor crates.
//!
//! Everything here is plain data: records fetched from a source catalog,
//! records persisted by the state store, and the per-file outcome handed to
//! notification sinks. Behaviour lives in `janitor-core`.
#![allow(missing_docs)]

pub mod ids;
pub mod media;
pub mod media_type;
pub mod outcome;
pub mod scan;
pub mod validation;

// Intentionally curated re-exports for downstream consumers.
pub use ids::{DeletionKey, EpisodeId, SearchKey, SeriesId};
pub use media::{EpisodeCoordinates, MediaRecord, SourceKind};
pub use media_type::{MediaType, ParseSourceFilterError, SourceFilter};
pub use outcome::{Disposition, ScanResult};
pub use scan::{
    LibraryTotals, ReplacementRecord, ScanRecord, ScanStats,
    REPLACEMENT_RETENTION,
};
pub use validation::{TechnicalMetadata, ValidationResult};
