//! The ordered resolution strategies.
//!
//! Each strategy gets one attempt at turning a normalized identifier into a
//! canonical accession. `Ok(None)` and `Err(_)` both mean "try the next one".

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::accession;
use super::static_table;
use crate::sources::{AnnotationCatalog, CrossReferenceSource, StructureCatalog};

#[async_trait]
pub trait ResolutionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn attempt(&self, identifier: &str) -> anyhow::Result<Option<String>>;
}

/// Step 1: input already has the canonical shape.
pub struct FormatCheck;

#[async_trait]
impl ResolutionStrategy for FormatCheck {
    fn name(&self) -> &'static str {
        "format_check"
    }

    async fn attempt(&self, identifier: &str) -> anyhow::Result<Option<String>> {
        Ok(accession::is_canonical(identifier).then(|| identifier.to_string()))
    }
}

/// Step 2: curated table, no network.
pub struct StaticTable;

#[async_trait]
impl ResolutionStrategy for StaticTable {
    fn name(&self) -> &'static str {
        "static_table"
    }

    async fn attempt(&self, identifier: &str) -> anyhow::Result<Option<String>> {
        Ok(static_table::lookup(identifier).map(String::from))
    }
}

/// Step 3: annotation catalog search by structure entry.
pub struct CatalogSearch {
    catalog: Arc<dyn AnnotationCatalog>,
}

impl CatalogSearch {
    pub fn new(catalog: Arc<dyn AnnotationCatalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl ResolutionStrategy for CatalogSearch {
    fn name(&self) -> &'static str {
        "catalog_search"
    }

    async fn attempt(&self, identifier: &str) -> anyhow::Result<Option<String>> {
        let hit = self.catalog.search_accession(identifier).await?;
        Ok(hit.map(|a| accession::normalize(&a)).filter(|a| accession::is_canonical(a)))
    }
}

/// Step 4: cross-reference endpoints, in the order given.
pub struct CrossReferenceLookup {
    sources: Vec<Arc<dyn CrossReferenceSource>>,
}

impl CrossReferenceLookup {
    pub fn new(sources: Vec<Arc<dyn CrossReferenceSource>>) -> Self {
        Self { sources }
    }
}

#[async_trait]
impl ResolutionStrategy for CrossReferenceLookup {
    fn name(&self) -> &'static str {
        "cross_reference"
    }

    async fn attempt(&self, identifier: &str) -> anyhow::Result<Option<String>> {
        let mut last_error = None;
        for source in &self.sources {
            match source.cross_references(identifier).await {
                Ok(groups) => {
                    let hit = groups
                        .iter()
                        .flatten()
                        .filter(|r| r.is_uniprot())
                        .map(|r| accession::normalize(&r.id))
                        .find(|a| accession::is_canonical(a));
                    if hit.is_some() {
                        return Ok(hit);
                    }
                    debug!(source = source.name(), identifier, "No UniProt cross reference");
                }
                Err(e) => {
                    debug!(source = source.name(), identifier, error = %e, "Cross-reference lookup failed");
                    last_error = Some(e);
                }
            }
        }
        match last_error {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }
}

/// Step 5: scan the raw entry document for accession-shaped text.
pub struct RawEntryScan {
    catalog: Arc<dyn StructureCatalog>,
}

impl RawEntryScan {
    pub fn new(catalog: Arc<dyn StructureCatalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl ResolutionStrategy for RawEntryScan {
    fn name(&self) -> &'static str {
        "raw_entry_scan"
    }

    async fn attempt(&self, identifier: &str) -> anyhow::Result<Option<String>> {
        let document = self.catalog.raw_entry(identifier).await?;
        let candidates = accession::scan(&document);
        debug!(identifier, candidates = candidates.len(), "Scanned raw entry");
        Ok(candidates.into_iter().find(|c| accession::is_plausible(c)))
    }
}
