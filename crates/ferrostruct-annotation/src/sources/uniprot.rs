//! UniProtKB REST client.
//!
//! Two endpoints are used:
//!   - search: `GET /uniprotkb/search?query=xref:pdb-<id>` → best accession
//!   - entry:  `GET /uniprotkb/<accession>.json` → names, genes, organism,
//!     typed comments and cross references
//!
//! API docs: https://www.uniprot.org/help/api

use async_trait::async_trait;
use ferrostruct_common::sandbox::SandboxClient as Client;
use serde_json::Value;
use tracing::{debug, instrument};

use super::AnnotationCatalog;
use crate::models::{AnnotationComment, CrossReference, EvidenceCode, ProteinAnnotation, StructuredDisease};

pub const UNIPROT_BASE_URL: &str = "https://rest.uniprot.org";

pub struct UniProtClient {
    client: Client,
    base_url: String,
}

impl UniProtClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl AnnotationCatalog for UniProtClient {
    #[instrument(skip(self))]
    async fn search_accession(&self, entry_id: &str) -> anyhow::Result<Option<String>> {
        let url = format!("{}/uniprotkb/search", self.base_url);
        let query = format!("xref:pdb-{}", entry_id);

        let resp = self.client
            .get(&url)?
            .query(&[
                ("query", query.as_str()),
                ("fields", "accession"),
                ("format", "json"),
                ("size", "1"),
            ])
            .send()
            .await?
            .error_for_status()?;

        let json: Value = resp.json().await?;
        let accession = json["results"]
            .as_array()
            .and_then(|results| results.first())
            .and_then(|hit| hit["primaryAccession"].as_str())
            .map(String::from);

        debug!(entry_id, ?accession, "UniProt search complete");
        Ok(accession)
    }

    #[instrument(skip(self))]
    async fn fetch_annotation(&self, accession: &str) -> anyhow::Result<ProteinAnnotation> {
        let url = format!("{}/uniprotkb/{}.json", self.base_url, accession);
        let resp = self.client.get(&url)?.send().await?.error_for_status()?;
        let json: Value = resp.json().await?;

        let annotation = parse_entry(&json, accession);
        debug!(
            accession,
            comments = annotation.comments.len(),
            "UniProt entry fetched"
        );
        Ok(annotation)
    }
}

/// Map a UniProtKB JSON entry onto `ProteinAnnotation`.
pub fn parse_entry(json: &Value, requested: &str) -> ProteinAnnotation {
    let accession = json["primaryAccession"]
        .as_str()
        .unwrap_or(requested)
        .to_string();

    let description = &json["proteinDescription"];
    let protein_name = description["recommendedName"]["fullName"]["value"]
        .as_str()
        .or_else(|| {
            description["submissionNames"]
                .as_array()
                .and_then(|names| names.first())
                .and_then(|n| n["fullName"]["value"].as_str())
        })
        .map(String::from);

    let gene_names = json["genes"]
        .as_array()
        .map(|genes| {
            genes
                .iter()
                .filter_map(|g| g["geneName"]["value"].as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default();

    let comments: Vec<AnnotationComment> = json["comments"]
        .as_array()
        .map(|cs| cs.iter().filter_map(parse_comment).collect())
        .unwrap_or_default();

    let function = comments.iter().find_map(|c| match c {
        AnnotationComment::Function { text } => Some(text.clone()),
        _ => None,
    });

    let cross_references = json["uniProtKBCrossReferences"]
        .as_array()
        .map(|refs| {
            refs.iter()
                .filter_map(|r| {
                    Some(CrossReference::new(r["database"].as_str()?, r["id"].as_str()?))
                })
                .collect()
        })
        .unwrap_or_default();

    ProteinAnnotation {
        accession,
        protein_name,
        gene_names,
        organism: json["organism"]["scientificName"].as_str().map(String::from),
        function,
        comments,
        cross_references,
        last_updated: json["entryAudit"]["lastAnnotationUpdateDate"]
            .as_str()
            .map(String::from),
    }
}

/// Joined `texts[].value` of a comment (or of its `note`).
fn comment_text(node: &Value) -> Option<String> {
    let texts = node["texts"].as_array()?;
    let joined = texts
        .iter()
        .filter_map(|t| t["value"].as_str())
        .collect::<Vec<_>>()
        .join(" ");
    if joined.trim().is_empty() { None } else { Some(joined) }
}

fn parse_comment(comment: &Value) -> Option<AnnotationComment> {
    let kind = comment["commentType"].as_str()?;
    match kind {
        "DISEASE" => {
            let text = comment_text(comment).or_else(|| comment_text(&comment["note"]));
            let structured = parse_disease(&comment["disease"]);
            if text.is_none() && structured.is_none() {
                return None;
            }
            Some(AnnotationComment::Disease { text, structured })
        }
        "FUNCTION" => comment_text(comment).map(|text| AnnotationComment::Function { text }),
        "MISCELLANEOUS" => comment_text(comment).map(|text| AnnotationComment::Miscellaneous { text }),
        "POLYMORPHISM" => comment_text(comment).map(|text| AnnotationComment::Polymorphism { text }),
        "PATHWAY" => comment_text(comment).map(|text| AnnotationComment::Pathway { text }),
        other => comment_text(comment).map(|text| AnnotationComment::Other {
            kind: other.to_lowercase(),
            text,
        }),
    }
}

fn parse_disease(node: &Value) -> Option<StructuredDisease> {
    let name = node["diseaseId"].as_str()?;
    let disease_id = node["diseaseAccession"].as_str().unwrap_or(name);

    let cross_reference = {
        let xref = &node["diseaseCrossReference"];
        match (xref["database"].as_str(), xref["id"].as_str()) {
            (Some(db), Some(id)) => Some(CrossReference::new(db, id)),
            _ => None,
        }
    };

    let evidences = node["evidences"]
        .as_array()
        .map(|evs| {
            evs.iter()
                .filter_map(|e| {
                    Some(EvidenceCode {
                        code: e["evidenceCode"].as_str()?.to_string(),
                        source: e["source"].as_str().map(String::from),
                        id: e["id"].as_str().map(String::from),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Some(StructuredDisease {
        disease_id: disease_id.to_string(),
        name: name.to_string(),
        acronym: node["acronym"].as_str().map(String::from),
        description: node["description"].as_str().map(String::from),
        cross_reference,
        evidences,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_entry_fields_and_comments() {
        let entry = json!({
            "primaryAccession": "P13569",
            "proteinDescription": {
                "recommendedName": { "fullName": { "value": "Cystic fibrosis transmembrane conductance regulator" } }
            },
            "genes": [{ "geneName": { "value": "CFTR" } }],
            "organism": { "scientificName": "Homo sapiens" },
            "entryAudit": { "lastAnnotationUpdateDate": "2024-07-24" },
            "comments": [
                { "commentType": "FUNCTION", "texts": [{ "value": "Epithelial ion channel." }] },
                {
                    "commentType": "DISEASE",
                    "disease": {
                        "diseaseId": "Cystic fibrosis",
                        "diseaseAccession": "DI-00345",
                        "acronym": "CF",
                        "description": "A common generalized disorder of exocrine glands.",
                        "diseaseCrossReference": { "database": "MIM", "id": "219700" },
                        "evidences": [
                            { "evidenceCode": "ECO:0000269", "source": "PubMed", "id": "1695717" }
                        ]
                    }
                },
                { "commentType": "PATHWAY", "texts": [{ "value": "Ion transport." }] },
                { "commentType": "SUBUNIT", "texts": [] }
            ],
            "uniProtKBCrossReferences": [
                { "database": "PDB", "id": "1XMI" },
                { "database": "MIM" }
            ]
        });

        let a = parse_entry(&entry, "p13569");
        assert_eq!(a.accession, "P13569");
        assert_eq!(a.protein_name.as_deref(), Some("Cystic fibrosis transmembrane conductance regulator"));
        assert_eq!(a.gene_names, vec!["CFTR"]);
        assert_eq!(a.organism.as_deref(), Some("Homo sapiens"));
        assert_eq!(a.function.as_deref(), Some("Epithelial ion channel."));
        assert_eq!(a.last_updated.as_deref(), Some("2024-07-24"));
        assert_eq!(a.comments.len(), 3);
        assert_eq!(a.pathways(), vec!["Ion transport."]);
        assert_eq!(a.cross_references, vec![CrossReference::new("PDB", "1XMI")]);

        let AnnotationComment::Disease { structured: Some(d), .. } = &a.comments[1] else {
            panic!("expected structured disease");
        };
        assert_eq!(d.disease_id, "DI-00345");
        assert_eq!(d.cross_reference, Some(CrossReference::new("MIM", "219700")));
        assert_eq!(d.evidences[0].literature(), Some(CrossReference::new("PubMed", "1695717")));
    }

    #[test]
    fn test_free_text_disease_from_note() {
        let entry = json!({
            "comments": [{
                "commentType": "DISEASE",
                "note": { "texts": [{ "value": "Cystic fibrosis. Caused by mutations in CFTR." }] }
            }]
        });
        let a = parse_entry(&entry, "P13569");
        assert_eq!(a.accession, "P13569");
        assert_eq!(
            a.comments,
            vec![AnnotationComment::Disease {
                text: Some("Cystic fibrosis. Caused by mutations in CFTR.".to_string()),
                structured: None,
            }]
        );
    }
}
