//! In-memory catalog fakes for tests.
//!
//! Every fake counts its calls so tests can assert that a code path made no
//! external requests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use ferrostruct_structure::{LigandMetadata, StructureSource};

use super::{AnnotationCatalog, CrossReferenceSource, StructureCatalog};
use crate::models::{CrossReference, EntryMetadata, ProteinAnnotation};

// ── Annotation catalog ──────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockAnnotationCatalog {
    search: HashMap<String, String>,
    annotations: HashMap<String, ProteinAnnotation>,
    calls: AtomicUsize,
}

impl MockAnnotationCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Search for `entry_id` returns `accession`.
    pub fn with_search(mut self, entry_id: &str, accession: &str) -> Self {
        self.search.insert(entry_id.to_string(), accession.to_string());
        self
    }

    pub fn with_annotation(mut self, annotation: ProteinAnnotation) -> Self {
        self.annotations.insert(annotation.accession.clone(), annotation);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnnotationCatalog for MockAnnotationCatalog {
    async fn search_accession(&self, entry_id: &str) -> anyhow::Result<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.search.get(entry_id).cloned())
    }

    async fn fetch_annotation(&self, accession: &str) -> anyhow::Result<ProteinAnnotation> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.annotations
            .get(accession)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no annotation for {accession}"))
    }
}

// ── Cross references ────────────────────────────────────────────────────────

pub struct MockCrossReferenceSource {
    name: &'static str,
    references: HashMap<String, Vec<Vec<CrossReference>>>,
    fail: bool,
    calls: AtomicUsize,
}

impl MockCrossReferenceSource {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            references: HashMap::new(),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Every lookup errors.
    pub fn failing(name: &'static str) -> Self {
        Self { fail: true, ..Self::new(name) }
    }

    pub fn with(mut self, entry_id: &str, references: Vec<Vec<CrossReference>>) -> Self {
        self.references.insert(entry_id.to_string(), references);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CrossReferenceSource for MockCrossReferenceSource {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn cross_references(&self, entry_id: &str) -> anyhow::Result<Vec<Vec<CrossReference>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("{} unavailable", self.name);
        }
        Ok(self.references.get(entry_id).cloned().unwrap_or_default())
    }
}

// ── Structure catalog ───────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockStructureCatalog {
    ligands: HashMap<String, Vec<LigandMetadata>>,
    entries: HashMap<String, EntryMetadata>,
    raw: HashMap<String, String>,
    /// Artificial latency applied to every call.
    delay: Option<std::time::Duration>,
    calls: AtomicUsize,
}

impl MockStructureCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ligands(mut self, entry_id: &str, ligands: Vec<LigandMetadata>) -> Self {
        self.ligands.insert(entry_id.to_string(), ligands);
        self
    }

    pub fn with_entry(mut self, metadata: EntryMetadata) -> Self {
        self.entries.insert(metadata.entry_id.clone(), metadata);
        self
    }

    pub fn with_raw_entry(mut self, entry_id: &str, document: &str) -> Self {
        self.raw.insert(entry_id.to_string(), document.to_string());
        self
    }

    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn enter(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl StructureCatalog for MockStructureCatalog {
    async fn ligand_metadata(&self, entry_id: &str) -> anyhow::Result<Vec<LigandMetadata>> {
        self.enter().await;
        self.ligands
            .get(entry_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no ligands for {entry_id}"))
    }

    async fn entry_metadata(&self, entry_id: &str) -> anyhow::Result<EntryMetadata> {
        self.enter().await;
        self.entries
            .get(entry_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no entry {entry_id}"))
    }

    async fn raw_entry(&self, entry_id: &str) -> anyhow::Result<String> {
        self.enter().await;
        self.raw
            .get(entry_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no raw entry {entry_id}"))
    }
}

// ── Structure text ──────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockStructureSource {
    entries: HashMap<String, String>,
    predicted: HashMap<String, String>,
    calls: AtomicUsize,
}

impl MockStructureSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, entry_id: &str, text: &str) -> Self {
        self.entries.insert(entry_id.to_string(), text.to_string());
        self
    }

    pub fn with_predicted(mut self, accession: &str, text: &str) -> Self {
        self.predicted.insert(accession.to_string(), text.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StructureSource for MockStructureSource {
    async fn fetch_entry(&self, entry_id: &str) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entries
            .get(entry_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("entry {entry_id} not found"))
    }

    async fn fetch_predicted(&self, accession: &str) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.predicted
            .get(accession)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no predicted model for {accession}"))
    }
}
