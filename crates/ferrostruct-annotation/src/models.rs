//! Data models shared by the catalog clients, resolver and aggregator.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A `(database, id)` pointer into another catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CrossReference {
    pub database: String,
    pub id: String,
}

impl CrossReference {
    pub fn new(database: impl Into<String>, id: impl Into<String>) -> Self {
        Self { database: database.into(), id: id.into() }
    }

    pub fn is_uniprot(&self) -> bool {
        self.database.eq_ignore_ascii_case("uniprot")
            || self.database.eq_ignore_ascii_case("uniprotkb")
    }
}

/// One evidence code attached to an annotation, optionally citing a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceCode {
    /// ECO code, e.g. "ECO:0000269".
    pub code: String,
    pub source: Option<String>,
    pub id: Option<String>,
}

impl EvidenceCode {
    /// Evidence backed by a literature citation.
    pub fn literature(&self) -> Option<CrossReference> {
        match (self.source.as_deref(), self.id.as_deref()) {
            (Some(source @ ("PubMed" | "DOI")), Some(id)) => Some(CrossReference::new(source, id)),
            _ => None,
        }
    }
}

/// A citable source backing a disease association.
///
/// Catalog payloads rarely carry bibliographic detail, so `title`, `authors`,
/// `journal` and `year` stay empty unless a caller fills them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub id: String,
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub journal: Option<String>,
    pub year: Option<i32>,
    /// Literature, DOI or catalog identifiers.
    pub external_ids: Vec<CrossReference>,
}

impl Reference {
    pub fn from_cross_reference(xref: &CrossReference) -> Self {
        Self {
            id: format!("{}:{}", xref.database, xref.id),
            external_ids: vec![xref.clone()],
            ..Self::default()
        }
    }

    /// Keyed by the cited literature when there is one, else by the ECO code.
    pub fn from_evidence(evidence: &EvidenceCode) -> Self {
        match evidence.literature() {
            Some(citation) => Self::from_cross_reference(&citation),
            None => Self { id: evidence.code.clone(), ..Self::default() },
        }
    }
}

/// Structured disease sub-record of a disease comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredDisease {
    pub disease_id: String,
    pub name: String,
    pub acronym: Option<String>,
    pub description: Option<String>,
    pub cross_reference: Option<CrossReference>,
    pub evidences: Vec<EvidenceCode>,
}

/// Free-text annotation comment, tagged by category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum AnnotationComment {
    Disease {
        text: Option<String>,
        structured: Option<StructuredDisease>,
    },
    Function { text: String },
    Miscellaneous { text: String },
    Polymorphism { text: String },
    Pathway { text: String },
    /// Any other comment type, kept for completeness but not interpreted.
    Other { kind: String, text: String },
}

/// Annotation catalog record for one canonical accession.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProteinAnnotation {
    pub accession: String,
    pub protein_name: Option<String>,
    pub gene_names: Vec<String>,
    pub organism: Option<String>,
    pub function: Option<String>,
    pub comments: Vec<AnnotationComment>,
    pub cross_references: Vec<CrossReference>,
    /// Catalog "last annotation update" marker, kept verbatim.
    pub last_updated: Option<String>,
}

impl ProteinAnnotation {
    pub fn pathways(&self) -> Vec<String> {
        self.comments
            .iter()
            .filter_map(|c| match c {
                AnnotationComment::Pathway { text } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }
}

/// Descriptive and provenance fields of one deposited structure entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryMetadata {
    pub entry_id: String,
    pub title: Option<String>,
    /// Generic molecule description of the entry.
    pub description: Option<String>,
    /// Aggregated keyword text of the entry.
    pub keywords: Option<String>,
    pub experimental_method: Option<String>,
    pub resolution: Option<f64>,
    pub deposit_date: Option<NaiveDate>,
    pub organisms: Vec<String>,
}
