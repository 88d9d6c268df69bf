//! ferrostruct-annotation: Identifier resolution and annotation aggregation.
//!
//! An input identifier (structure entry id or canonical accession) flows
//! through:
//! 1. `resolver`: ordered fallback chain to a canonical accession
//! 2. `sources`: catalog clients (UniProt, RCSB, PDBe) behind traits
//! 3. `disease`: disease associations from typed annotation comments
//! 4. `aggregator`: concurrent, best-effort merge with provenance
//! 5. `pipeline`: structure fetch + parse + analysis + annotation

pub mod models;
pub mod sources;
pub mod resolver;
pub mod disease;
pub mod aggregator;
pub mod pipeline;

pub use aggregator::{AnnotationAggregator, AnnotationRecord, Provenance, Sourced};
pub use disease::{AssociationType, DiseaseAssociation, DiseaseAssociationExtractor, DiseaseType, EvidenceLevel};
pub use models::{
    AnnotationComment, CrossReference, EntryMetadata, EvidenceCode, ProteinAnnotation, Reference, StructuredDisease,
};
pub use pipeline::{EntryPipeline, EntryReport, PipelineError, StructureOrigin};
pub use resolver::{IdentifierResolver, ResolvedIdentifier};
