//! External catalog clients.
//!
//! Each catalog is reached through a trait so the resolver and aggregator
//! can run against in-memory fakes (`mock`) in tests.

pub mod uniprot;
pub mod rcsb;
pub mod pdbe;
pub mod mock;

use async_trait::async_trait;
use ferrostruct_structure::LigandMetadata;

use crate::models::{CrossReference, EntryMetadata, ProteinAnnotation};

pub use pdbe::PdbeClient;
pub use rcsb::RcsbClient;
pub use uniprot::UniProtClient;

/// Annotation catalog: search by structure entry and annotation by accession.
#[async_trait]
pub trait AnnotationCatalog: Send + Sync {
    /// Best-matching canonical accession for a structure entry id.
    async fn search_accession(&self, entry_id: &str) -> anyhow::Result<Option<String>>;

    /// Function, organism, gene and comment fields for an accession.
    async fn fetch_annotation(&self, accession: &str) -> anyhow::Result<ProteinAnnotation>;
}

/// A cross-reference endpoint keyed by structure entry id.
///
/// Returns one list of references per entity (or mapping group).
#[async_trait]
pub trait CrossReferenceSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn cross_references(&self, entry_id: &str) -> anyhow::Result<Vec<Vec<CrossReference>>>;
}

/// Structure data catalog: entry-level descriptive fields and ligands.
#[async_trait]
pub trait StructureCatalog: Send + Sync {
    async fn ligand_metadata(&self, entry_id: &str) -> anyhow::Result<Vec<LigandMetadata>>;

    async fn entry_metadata(&self, entry_id: &str) -> anyhow::Result<EntryMetadata>;

    /// The full serialized entry document, unparsed.
    async fn raw_entry(&self, entry_id: &str) -> anyhow::Result<String>;
}
