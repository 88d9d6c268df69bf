//! PDBe SIFTS mapping client.
//!
//! `GET /pdbe/api/mappings/uniprot/<id>` returns
//! `{ "<id>": { "UniProt": { "<accession>": { ... } } } }`.
//!
//! API docs: https://www.ebi.ac.uk/pdbe/api/doc/sifts.html

use async_trait::async_trait;
use ferrostruct_common::sandbox::SandboxClient as Client;
use serde_json::Value;
use tracing::{debug, instrument};

use super::CrossReferenceSource;
use crate::models::CrossReference;

pub const PDBE_BASE_URL: &str = "https://www.ebi.ac.uk";

pub struct PdbeClient {
    client: Client,
    base_url: String,
}

impl PdbeClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl CrossReferenceSource for PdbeClient {
    fn name(&self) -> &'static str {
        "pdbe_sifts"
    }

    #[instrument(skip(self))]
    async fn cross_references(&self, entry_id: &str) -> anyhow::Result<Vec<Vec<CrossReference>>> {
        let url = format!(
            "{}/pdbe/api/mappings/uniprot/{}",
            self.base_url,
            entry_id.to_lowercase()
        );
        let resp = self.client.get(&url)?.send().await?;

        // SIFTS answers 404 for entries it has no mapping for.
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            debug!(entry_id, "No SIFTS mapping");
            return Ok(Vec::new());
        }
        let json: Value = resp.error_for_status()?.json().await?;
        Ok(parse_mappings(&json))
    }
}

/// One reference list per mapped entry.
pub fn parse_mappings(json: &Value) -> Vec<Vec<CrossReference>> {
    let Some(entries) = json.as_object() else {
        return Vec::new();
    };
    entries
        .values()
        .map(|entry| {
            entry["UniProt"]
                .as_object()
                .into_iter()
                .flat_map(|m| m.keys())
                .map(|accession| CrossReference::new("UniProt", accession.as_str()))
                .collect()
        })
        .collect()
}
