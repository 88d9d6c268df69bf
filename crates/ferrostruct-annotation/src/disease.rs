//! Disease associations extracted from typed annotation comments.
//!
//! Each comment category has its own extraction rule:
//!   - disease: one record per `;`-delimited fragment of free text, or
//!     one record straight from a structured disease sub-record
//!   - function: pathogen keywords (specific pathogen, or generic viral)
//!   - miscellaneous / polymorphism: disease-indicative keywords
//!
//! Output is ordered by evidence level (known first), then by score.

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::models::{AnnotationComment, Reference, StructuredDisease};

/// Specific pathogen keyword → disease label.
const PATHOGEN_KEYWORDS: &[(&str, &str)] = &[
    ("hiv", "HIV infection"),
    ("hepatitis b", "Hepatitis B"),
    ("hepatitis c", "Hepatitis C"),
    ("influenza", "Influenza"),
    ("sars-cov", "SARS coronavirus infection"),
    ("herpes", "Herpes virus infection"),
    ("epstein-barr", "Epstein-Barr virus infection"),
    ("papillomavirus", "Human papillomavirus infection"),
    ("ebola", "Ebola virus disease"),
];

const GENERIC_PATHOGEN_KEYWORDS: &[&str] = &["host-virus", "virus", "viral", "pathogen"];

const DISEASE_INDICATIVE_KEYWORDS: &[&str] = &[
    "disease", "syndrome", "disorder", "cancer", "carcinoma", "tumor", "tumour",
    "leukemia", "deficiency", "susceptibility", "diabetes", "alzheimer", "parkinson",
    "dystrophy", "anemia", "anaemia",
];

/// Keyword → label for miscellaneous / polymorphism hits. First match wins.
const DISEASE_LABELS: &[(&str, &str)] = &[
    ("alzheimer", "Alzheimer disease"),
    ("parkinson", "Parkinson disease"),
    ("diabetes", "Diabetes mellitus"),
    ("leukemia", "Leukemia"),
    ("carcinoma", "Carcinoma"),
    ("cancer", "Cancer"),
    ("tumor", "Tumor"),
    ("tumour", "Tumor"),
    ("dystrophy", "Muscular dystrophy"),
    ("anemia", "Anemia"),
    ("anaemia", "Anemia"),
    ("deficiency", "Enzyme deficiency"),
    ("syndrome", "Genetic syndrome"),
    ("susceptibility", "Disease susceptibility"),
];

const FALLBACK_LABEL: &str = "Disease association";

/// Disease-type classification keywords, checked in order.
const DISEASE_TYPE_KEYWORDS: &[(DiseaseType, &[&str])] = &[
    (DiseaseType::Cancer, &["cancer", "carcinoma", "tumor", "tumour", "leukemia", "lymphoma", "melanoma", "sarcoma", "glioma", "neoplasm"]),
    (DiseaseType::Infectious, &["infection", "virus", "viral", "bacterial", "hiv", "hepatitis", "influenza", "sars"]),
    (DiseaseType::Metabolic, &["diabetes", "metabolic", "deficiency", "storage", "obesity", "lipid", "glycogen"]),
    (DiseaseType::Neurological, &["alzheimer", "parkinson", "neuro", "epilep", "ataxia", "dementia", "huntington", "sclerosis"]),
    (DiseaseType::Genetic, &["syndrome", "hereditary", "familial", "congenital", "cystic fibrosis", "dystrophy"]),
];

/// Confidence tier of an association. Declaration order is the sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceLevel {
    Known,
    Predicted,
    Inferred,
    Uncertain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationType {
    Direct,
    Functional,
    Indirect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiseaseType {
    Cancer,
    Infectious,
    Metabolic,
    Neurological,
    Genetic,
    Other,
}

impl DiseaseType {
    pub fn classify(text: &str) -> Self {
        let lower = text.to_lowercase();
        DISEASE_TYPE_KEYWORDS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
            .map(|(kind, _)| *kind)
            .unwrap_or(DiseaseType::Other)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseAssociation {
    pub id: Uuid,
    pub disease_name: String,
    pub disease_id: Option<String>,
    pub acronym: Option<String>,
    pub description: Option<String>,
    pub disease_type: DiseaseType,
    pub evidence_level: EvidenceLevel,
    /// In [0, 1].
    pub association_score: f64,
    pub association_type: AssociationType,
    pub clinical_features: Vec<String>,
    pub references: Vec<Reference>,
    pub data_source: String,
    pub last_updated: Option<String>,
}

/// Stable sort: evidence level ascending, then score descending.
pub fn sort_associations(associations: &mut [DiseaseAssociation]) {
    associations.sort_by(|a, b| {
        a.evidence_level
            .cmp(&b.evidence_level)
            .then_with(|| b.association_score.total_cmp(&a.association_score))
    });
}

#[derive(Debug, Clone)]
pub struct DiseaseAssociationExtractor {
    data_source: String,
}

impl Default for DiseaseAssociationExtractor {
    fn default() -> Self {
        Self::new("UniProt")
    }
}

impl DiseaseAssociationExtractor {
    pub fn new(data_source: impl Into<String>) -> Self {
        Self { data_source: data_source.into() }
    }

    pub fn extract(&self, comments: &[AnnotationComment], last_updated: Option<&str>) -> Vec<DiseaseAssociation> {
        let mut out = Vec::new();
        for comment in comments {
            match comment {
                AnnotationComment::Disease { structured: Some(disease), .. } => {
                    out.push(self.from_structured(disease));
                }
                AnnotationComment::Disease { text: Some(text), structured: None } => {
                    out.extend(self.from_disease_text(text));
                }
                AnnotationComment::Disease { text: None, structured: None } => {}
                AnnotationComment::Function { text } => out.extend(self.from_function(text)),
                AnnotationComment::Miscellaneous { text } => {
                    out.extend(self.from_keywords(text, EvidenceLevel::Uncertain, 0.4));
                }
                AnnotationComment::Polymorphism { text } => {
                    out.extend(self.from_keywords(text, EvidenceLevel::Inferred, 0.5));
                }
                AnnotationComment::Pathway { .. } | AnnotationComment::Other { .. } => {}
            }
        }

        for association in &mut out {
            association.last_updated = last_updated.map(String::from);
        }
        sort_associations(&mut out);
        debug!(comments = comments.len(), associations = out.len(), "Disease associations extracted");
        out
    }

    fn record(&self, name: &str, level: EvidenceLevel, score: f64, kind: AssociationType) -> DiseaseAssociation {
        DiseaseAssociation {
            id: Uuid::new_v4(),
            disease_name: name.to_string(),
            disease_id: None,
            acronym: None,
            description: None,
            disease_type: DiseaseType::classify(name),
            evidence_level: level,
            association_score: score,
            association_type: kind,
            clinical_features: Vec::new(),
            references: Vec::new(),
            data_source: self.data_source.clone(),
            last_updated: None,
        }
    }

    fn from_structured(&self, disease: &StructuredDisease) -> DiseaseAssociation {
        let mut references: Vec<Reference> =
            disease.cross_reference.iter().map(Reference::from_cross_reference).collect();
        references.extend(disease.evidences.iter().map(Reference::from_evidence));

        let classify_text = match &disease.description {
            Some(description) => format!("{} {}", disease.name, description),
            None => disease.name.clone(),
        };

        DiseaseAssociation {
            disease_id: Some(disease.disease_id.clone()),
            acronym: disease.acronym.clone(),
            description: disease.description.clone(),
            disease_type: DiseaseType::classify(&classify_text),
            clinical_features: disease.description.iter().cloned().collect(),
            references,
            ..self.record(&disease.name, EvidenceLevel::Known, 1.0, AssociationType::Direct)
        }
    }

    /// One record per `;`-delimited fragment. Line breaks are wrapping, not
    /// separators. The disease name is the text before the first `. `; the
    /// rest is the clinical feature.
    fn from_disease_text(&self, text: &str) -> Vec<DiseaseAssociation> {
        text.split(';')
            .map(|fragment| fragment.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|fragment| !fragment.is_empty())
            .filter_map(|fragment| {
                let (name, rest) = match fragment.split_once(". ") {
                    Some((name, rest)) => (name.trim(), rest.trim()),
                    None => (fragment.trim_end_matches('.').trim(), ""),
                };
                if name.is_empty() {
                    return None;
                }
                let mut association = self.record(name, EvidenceLevel::Known, 0.9, AssociationType::Direct);
                if !rest.is_empty() {
                    association.clinical_features.push(rest.to_string());
                }
                Some(association)
            })
            .collect()
    }

    fn from_function(&self, text: &str) -> Vec<DiseaseAssociation> {
        let lower = text.to_lowercase();

        let specific: Vec<DiseaseAssociation> = PATHOGEN_KEYWORDS
            .iter()
            .filter(|(keyword, _)| lower.contains(keyword))
            .map(|(_, label)| DiseaseAssociation {
                disease_type: DiseaseType::Infectious,
                clinical_features: vec![text.to_string()],
                ..self.record(label, EvidenceLevel::Predicted, 0.8, AssociationType::Functional)
            })
            .collect();
        if !specific.is_empty() {
            return specific;
        }

        if GENERIC_PATHOGEN_KEYWORDS.iter().any(|k| lower.contains(k)) {
            return vec![DiseaseAssociation {
                disease_type: DiseaseType::Infectious,
                clinical_features: vec![text.to_string()],
                ..self.record("Viral infection", EvidenceLevel::Inferred, 0.6, AssociationType::Functional)
            }];
        }

        Vec::new()
    }

    fn from_keywords(&self, text: &str, level: EvidenceLevel, score: f64) -> Option<DiseaseAssociation> {
        let lower = text.to_lowercase();
        if !DISEASE_INDICATIVE_KEYWORDS.iter().any(|k| lower.contains(k)) {
            return None;
        }
        let label = DISEASE_LABELS
            .iter()
            .find(|(keyword, _)| lower.contains(keyword))
            .map(|(_, label)| *label)
            .unwrap_or(FALLBACK_LABEL);

        Some(DiseaseAssociation {
            disease_type: DiseaseType::classify(text),
            clinical_features: vec![text.to_string()],
            ..self.record(label, level, score, AssociationType::Indirect)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CrossReference, EvidenceCode};

    fn extract(comments: &[AnnotationComment]) -> Vec<DiseaseAssociation> {
        DiseaseAssociationExtractor::default().extract(comments, Some("2024-07-24"))
    }

    fn disease_text(text: &str) -> AnnotationComment {
        AnnotationComment::Disease { text: Some(text.to_string()), structured: None }
    }

    #[test]
    fn test_free_text_disease_single_sentence_pair() {
        let out = extract(&[disease_text("Cystic fibrosis. Caused by mutations in CFTR.")]);
        assert_eq!(out.len(), 1);
        let a = &out[0];
        assert_eq!(a.disease_name, "Cystic fibrosis");
        assert_eq!(a.evidence_level, EvidenceLevel::Known);
        assert_eq!(a.association_score, 0.9);
        assert_eq!(a.clinical_features, vec!["Caused by mutations in CFTR."]);
        assert_eq!(a.disease_type, DiseaseType::Genetic);
        assert_eq!(a.last_updated.as_deref(), Some("2024-07-24"));
        assert_eq!(a.data_source, "UniProt");
    }

    #[test]
    fn test_free_text_multiple_fragments() {
        let out = extract(&[disease_text(
            "Breast cancer. Somatic mutations occur; Li-Fraumeni syndrome; Hereditary ataxia.",
        )]);
        let names: Vec<_> = out.iter().map(|a| a.disease_name.as_str()).collect();
        assert_eq!(names, vec!["Breast cancer", "Li-Fraumeni syndrome", "Hereditary ataxia"]);
        assert!(out[1].clinical_features.is_empty());
        assert_eq!(out[0].disease_type, DiseaseType::Cancer);
        assert_ne!(out[0].id, out[1].id);
    }

    #[test]
    fn test_wrapped_free_text_stays_one_record() {
        let out = extract(&[disease_text("Cystic fibrosis.\nCaused by mutations\n  in CFTR.")]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].disease_name, "Cystic fibrosis");
        assert_eq!(out[0].clinical_features, vec!["Caused by mutations in CFTR."]);
    }

    #[test]
    fn test_structured_disease_record() {
        let comment = AnnotationComment::Disease {
            text: Some("ignored when structured".to_string()),
            structured: Some(StructuredDisease {
                disease_id: "DI-00345".to_string(),
                name: "Cystic fibrosis".to_string(),
                acronym: Some("CF".to_string()),
                description: Some("A common generalized disorder of the exocrine glands.".to_string()),
                cross_reference: Some(CrossReference::new("MIM", "219700")),
                evidences: vec![
                    EvidenceCode { code: "ECO:0000269".to_string(), source: Some("PubMed".to_string()), id: Some("1695717".to_string()) },
                    EvidenceCode { code: "ECO:0000305".to_string(), source: None, id: None },
                ],
            }),
        };
        let out = extract(&[comment]);
        assert_eq!(out.len(), 1);
        let a = &out[0];
        assert_eq!(a.association_score, 1.0);
        assert_eq!(a.evidence_level, EvidenceLevel::Known);
        assert_eq!(a.disease_id.as_deref(), Some("DI-00345"));
        assert_eq!(a.acronym.as_deref(), Some("CF"));
        assert_eq!(a.clinical_features, vec!["A common generalized disorder of the exocrine glands."]);

        let ids: Vec<_> = a.references.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["MIM:219700", "PubMed:1695717", "ECO:0000305"]);
        assert_eq!(a.references[0].external_ids, vec![CrossReference::new("MIM", "219700")]);
        assert_eq!(a.references[1].external_ids, vec![CrossReference::new("PubMed", "1695717")]);
        assert!(a.references[2].external_ids.is_empty());
    }

    #[test]
    fn test_function_specific_and_generic_pathogens() {
        let specific = extract(&[AnnotationComment::Function {
            text: "Restricts HIV-1 replication in host cells.".to_string(),
        }]);
        assert_eq!(specific.len(), 1);
        assert_eq!(specific[0].disease_name, "HIV infection");
        assert_eq!(specific[0].evidence_level, EvidenceLevel::Predicted);
        assert_eq!(specific[0].association_score, 0.8);
        assert_eq!(specific[0].association_type, AssociationType::Functional);

        let generic = extract(&[AnnotationComment::Function {
            text: "Plays a role in antiviral defense against RNA virus infection.".to_string(),
        }]);
        assert_eq!(generic.len(), 1);
        assert_eq!(generic[0].disease_name, "Viral infection");
        assert_eq!(generic[0].evidence_level, EvidenceLevel::Inferred);
        assert_eq!(generic[0].association_score, 0.6);

        let none = extract(&[AnnotationComment::Function { text: "Catalyzes ATP hydrolysis.".to_string() }]);
        assert!(none.is_empty());
    }

    #[test]
    fn test_misc_and_polymorphism_keywords() {
        let text = "Variants in this gene confer susceptibility to type 2 diabetes.";
        let misc = extract(&[AnnotationComment::Miscellaneous { text: text.to_string() }]);
        assert_eq!(misc[0].disease_name, "Diabetes mellitus");
        assert_eq!(misc[0].evidence_level, EvidenceLevel::Uncertain);
        assert_eq!(misc[0].association_score, 0.4);
        assert_eq!(misc[0].clinical_features, vec![text]);
        assert_eq!(misc[0].association_type, AssociationType::Indirect);

        let poly = extract(&[AnnotationComment::Polymorphism {
            text: "Allele frequency differs between populations; linked to a rare disorder.".to_string(),
        }]);
        assert_eq!(poly[0].disease_name, "Disease association");
        assert_eq!(poly[0].evidence_level, EvidenceLevel::Inferred);
        assert_eq!(poly[0].association_score, 0.5);

        let quiet = extract(&[AnnotationComment::Miscellaneous { text: "Expressed in liver.".to_string() }]);
        assert!(quiet.is_empty());
    }

    #[test]
    fn test_sort_is_evidence_level_primary() {
        let ex = DiseaseAssociationExtractor::default();
        let mut list = vec![
            ex.record("b", EvidenceLevel::Uncertain, 0.99, AssociationType::Indirect),
            ex.record("a", EvidenceLevel::Known, 0.5, AssociationType::Direct),
            ex.record("c", EvidenceLevel::Known, 0.9, AssociationType::Direct),
            ex.record("d", EvidenceLevel::Known, 0.9, AssociationType::Direct),
        ];
        sort_associations(&mut list);
        let order: Vec<_> = list.iter().map(|a| a.disease_name.as_str()).collect();
        assert_eq!(order, vec!["c", "d", "a", "b"]);
    }

    #[test]
    fn test_pathway_and_other_ignored() {
        let out = extract(&[
            AnnotationComment::Pathway { text: "Cancer pathway.".to_string() },
            AnnotationComment::Other { kind: "subunit".to_string(), text: "Disease syndrome".to_string() },
        ]);
        assert!(out.is_empty());
    }
}
