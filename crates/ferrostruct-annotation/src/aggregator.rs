//! Best-effort annotation aggregation across independent catalogs.
//!
//! Three stages run concurrently:
//!   1. resolve the identifier, then fetch its annotation (serialised)
//!   2. ligand metadata for the structure entry
//!   3. descriptive metadata for the structure entry
//!
//! A stage that fails or times out degrades to a placeholder value tagged
//! `Provenance::Placeholder`; a record is always produced.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use ferrostruct_structure::LigandMetadata;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::disease::{DiseaseAssociation, DiseaseAssociationExtractor};
use crate::models::{EntryMetadata, ProteinAnnotation};
use crate::resolver::{accession, IdentifierResolver, ResolvedIdentifier};
use crate::sources::{AnnotationCatalog, StructureCatalog};

const UNKNOWN_PROTEIN: &str = "Unknown protein";
const UNKNOWN_ORGANISM: &str = "Unknown organism";
const NO_DESCRIPTION: &str = "No functional description available";

/// Where a merged value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// The annotation catalog record for the resolved accession.
    Annotation,
    /// The structure entry's generic molecule description.
    EntryDescription,
    /// The structure entry's aggregated keyword field.
    EntryAggregate,
    /// The structure catalog's ligand endpoint.
    LigandCatalog,
    /// Other structure entry metadata.
    EntryCatalog,
    /// Synthesised locally because no source supplied the value.
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sourced<T> {
    pub value: T,
    pub provenance: Provenance,
}

impl<T> Sourced<T> {
    pub fn new(value: T, provenance: Provenance) -> Self {
        Self { value, provenance }
    }

    pub fn placeholder(value: T) -> Self {
        Self::new(value, Provenance::Placeholder)
    }

    pub fn is_placeholder(&self) -> bool {
        self.provenance == Provenance::Placeholder
    }
}

/// Merged annotation for one input identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    pub identifier: String,
    /// Structure entry id when the input was not an accession.
    pub entry_id: Option<String>,
    pub resolution: ResolvedIdentifier,
    pub protein_name: Sourced<String>,
    pub gene_names: Sourced<Vec<String>>,
    pub organism: Sourced<String>,
    pub description: Sourced<String>,
    pub diseases: Sourced<Vec<DiseaseAssociation>>,
    pub pathways: Sourced<Vec<String>>,
    pub ligands: Sourced<Vec<LigandMetadata>>,
    pub entry: Sourced<Option<EntryMetadata>>,
}

impl AnnotationRecord {
    pub fn accession(&self) -> Option<&str> {
        self.resolution.accession()
    }

    /// Names of the fields that hold placeholders.
    pub fn placeholder_fields(&self) -> Vec<&'static str> {
        [
            ("protein_name", self.protein_name.is_placeholder()),
            ("gene_names", self.gene_names.is_placeholder()),
            ("organism", self.organism.is_placeholder()),
            ("description", self.description.is_placeholder()),
            ("diseases", self.diseases.is_placeholder()),
            ("pathways", self.pathways.is_placeholder()),
            ("ligands", self.ligands.is_placeholder()),
            ("entry", self.entry.is_placeholder()),
        ]
        .into_iter()
        .filter(|(_, placeholder)| *placeholder)
        .map(|(name, _)| name)
        .collect()
    }

    pub fn is_partial(&self) -> bool {
        !self.placeholder_fields().is_empty()
    }
}

pub struct AnnotationAggregator {
    resolver: Arc<IdentifierResolver>,
    catalog: Arc<dyn AnnotationCatalog>,
    structures: Arc<dyn StructureCatalog>,
    extractor: DiseaseAssociationExtractor,
    step_timeout: Option<Duration>,
}

impl AnnotationAggregator {
    pub fn new(
        resolver: Arc<IdentifierResolver>,
        catalog: Arc<dyn AnnotationCatalog>,
        structures: Arc<dyn StructureCatalog>,
    ) -> Self {
        Self {
            resolver,
            catalog,
            structures,
            extractor: DiseaseAssociationExtractor::default(),
            step_timeout: None,
        }
    }

    /// Bound each stage's external call; a stage that runs over degrades.
    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = Some(timeout);
        self
    }

    pub fn with_extractor(mut self, extractor: DiseaseAssociationExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    #[instrument(skip(self))]
    pub async fn aggregate(&self, identifier: &str) -> AnnotationRecord {
        let normalized = accession::normalize(identifier);
        let entry_id = (!accession::is_canonical(&normalized)).then(|| normalized.clone());

        let (annotation_stage, ligands, entry) = tokio::join!(
            self.annotation_stage(&normalized),
            self.ligand_stage(entry_id.as_deref()),
            self.entry_stage(entry_id.as_deref()),
        );
        let (resolution, annotation) = annotation_stage;

        let record = merge(
            normalized,
            entry_id,
            resolution,
            annotation,
            ligands,
            entry,
            &self.extractor,
        );

        let placeholders = record.placeholder_fields();
        if placeholders.is_empty() {
            info!(identifier = %record.identifier, "Annotation complete");
        } else {
            info!(identifier = %record.identifier, ?placeholders, "Annotation partial");
        }
        record
    }

    /// Resolve, then fetch the annotation for the resolved accession.
    async fn annotation_stage(&self, identifier: &str) -> (ResolvedIdentifier, Option<ProteinAnnotation>) {
        let resolution = self.resolver.resolve(identifier).await;
        let annotation = match resolution.accession() {
            Some(accession) => {
                self.bounded("annotation", self.catalog.fetch_annotation(accession))
                    .await
            }
            None => None,
        };
        (resolution, annotation)
    }

    async fn ligand_stage(&self, entry_id: Option<&str>) -> Option<Vec<LigandMetadata>> {
        let entry_id = entry_id?;
        self.bounded("ligands", self.structures.ligand_metadata(entry_id)).await
    }

    async fn entry_stage(&self, entry_id: Option<&str>) -> Option<EntryMetadata> {
        let entry_id = entry_id?;
        self.bounded("entry", self.structures.entry_metadata(entry_id)).await
    }

    /// Run one external call under the step timeout. Failure and timeout
    /// both come back as `None`.
    async fn bounded<T, F>(&self, stage: &'static str, call: F) -> Option<T>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        let outcome = match self.step_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => Err(anyhow::anyhow!("timed out after {:?}", limit)),
            },
            None => call.await,
        };
        match outcome {
            Ok(value) => {
                debug!(stage, "Stage complete");
                Some(value)
            }
            Err(e) => {
                warn!(stage, error = %e, "Stage degraded to placeholder");
                None
            }
        }
    }
}

/// Combine stage outputs. Description precedence: annotation function text,
/// then entry description, then entry keywords, then a placeholder.
fn merge(
    identifier: String,
    entry_id: Option<String>,
    resolution: ResolvedIdentifier,
    annotation: Option<ProteinAnnotation>,
    ligands: Option<Vec<LigandMetadata>>,
    entry: Option<EntryMetadata>,
    extractor: &DiseaseAssociationExtractor,
) -> AnnotationRecord {
    let annotation = annotation.as_ref();
    let entry_ref = entry.as_ref();
    let non_empty = |s: &Option<String>| s.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(String::from);

    let description = if let Some(text) = annotation.and_then(|a| non_empty(&a.function)) {
        Sourced::new(text, Provenance::Annotation)
    } else if let Some(text) = entry_ref.and_then(|e| non_empty(&e.description)) {
        Sourced::new(text, Provenance::EntryDescription)
    } else if let Some(text) = entry_ref.and_then(|e| non_empty(&e.keywords)) {
        Sourced::new(text, Provenance::EntryAggregate)
    } else {
        let text = resolution.note().unwrap_or(NO_DESCRIPTION);
        Sourced::placeholder(text.to_string())
    };

    let protein_name = if let Some(name) = annotation.and_then(|a| non_empty(&a.protein_name)) {
        Sourced::new(name, Provenance::Annotation)
    } else if let Some(title) = entry_ref.and_then(|e| non_empty(&e.title)) {
        Sourced::new(title, Provenance::EntryCatalog)
    } else {
        Sourced::placeholder(UNKNOWN_PROTEIN.to_string())
    };

    let organism = if let Some(organism) = annotation.and_then(|a| non_empty(&a.organism)) {
        Sourced::new(organism, Provenance::Annotation)
    } else if let Some(organism) = entry_ref.and_then(|e| e.organisms.first().cloned()) {
        Sourced::new(organism, Provenance::EntryCatalog)
    } else {
        Sourced::placeholder(UNKNOWN_ORGANISM.to_string())
    };

    let (gene_names, diseases, pathways) = match annotation {
        Some(a) => (
            Sourced::new(a.gene_names.clone(), Provenance::Annotation),
            Sourced::new(
                extractor.extract(&a.comments, a.last_updated.as_deref()),
                Provenance::Annotation,
            ),
            Sourced::new(a.pathways(), Provenance::Annotation),
        ),
        None => (
            Sourced::placeholder(Vec::new()),
            Sourced::placeholder(Vec::new()),
            Sourced::placeholder(Vec::new()),
        ),
    };

    let ligands = match ligands {
        Some(ligands) => Sourced::new(ligands, Provenance::LigandCatalog),
        None => Sourced::placeholder(Vec::new()),
    };

    let entry = match entry {
        Some(entry) => Sourced::new(Some(entry), Provenance::EntryCatalog),
        None => Sourced::placeholder(None),
    };

    AnnotationRecord {
        identifier,
        entry_id,
        resolution,
        protein_name,
        gene_names,
        organism,
        description,
        diseases,
        pathways,
        ligands,
        entry,
    }
}
