//! RCSB PDB Data API client.
//!
//! Endpoints (all under `/rest/v1/core`):
//!   - `entry/<id>`                       : entry document (title, keywords, method)
//!   - `polymer_entity/<id>/<entity>`     : sequence references, source organism
//!   - `nonpolymer_entity/<id>/<entity>`  : chemical component id of a ligand
//!   - `chemcomp/<comp_id>`               : ligand name, weight, charge, type
//!
//! One aggregation touches the entry document from several stages, so the
//! client memoizes response bodies by path for its lifetime. Concurrent
//! requests for one path share a single fetch; failures are not cached.
//!
//! API docs: https://data.rcsb.org/redoc/index.html

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use ferrostruct_common::sandbox::SandboxClient as Client;
use ferrostruct_structure::LigandMetadata;
use futures::future::join_all;
use serde_json::Value;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, instrument};

use super::{CrossReferenceSource, StructureCatalog};
use crate::models::{CrossReference, EntryMetadata};

pub const RCSB_DATA_BASE_URL: &str = "https://data.rcsb.org";

pub struct RcsbClient {
    client: Client,
    base_url: String,
    responses: Mutex<HashMap<String, Arc<OnceCell<String>>>>,
}

impl RcsbClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            responses: Mutex::new(HashMap::new()),
        }
    }

    async fn get_text(&self, path: &str) -> anyhow::Result<String> {
        let cell = self.responses.lock().await.entry(path.to_string()).or_default().clone();
        let body = cell
            .get_or_try_init(|| async {
                debug!(path, "RCSB request");
                let url = format!("{}/rest/v1/core/{}", self.base_url, path);
                self.client.get_text(&url).await
            })
            .await?;
        Ok(body.clone())
    }

    async fn get_json(&self, path: &str) -> anyhow::Result<Value> {
        Ok(serde_json::from_str(&self.get_text(path).await?)?)
    }

    async fn entry(&self, entry_id: &str) -> anyhow::Result<Value> {
        self.get_json(&format!("entry/{}", entry_id.to_uppercase())).await
    }

    /// Polymer entity documents of an entry. Entities that fail to load are
    /// dropped.
    async fn polymer_entities(&self, entry_id: &str, entry: &Value) -> Vec<Value> {
        let id = entry_id.to_uppercase();
        let paths: Vec<String> = entity_ids(entry, "polymer_entity_ids")
            .into_iter()
            .map(|eid| format!("polymer_entity/{}/{}", id, eid))
            .collect();
        join_all(paths.iter().map(|p| self.get_json(p)))
            .await
            .into_iter()
            .filter_map(|r| r.map_err(|e| debug!(error = %e, "Polymer entity fetch failed")).ok())
            .collect()
    }

    async fn ligand(&self, entry_id: &str, entity_id: &str) -> anyhow::Result<LigandMetadata> {
        let entity = self
            .get_json(&format!("nonpolymer_entity/{}/{}", entry_id, entity_id))
            .await?;
        let comp_id = entity["pdbx_entity_nonpoly"]["comp_id"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("non-polymer entity {entry_id}/{entity_id} has no comp_id"))?;
        let comp = self.get_json(&format!("chemcomp/{}", comp_id)).await?;
        Ok(parse_chem_comp(&comp, comp_id))
    }
}

#[async_trait]
impl StructureCatalog for RcsbClient {
    #[instrument(skip(self))]
    async fn ligand_metadata(&self, entry_id: &str) -> anyhow::Result<Vec<LigandMetadata>> {
        let entry = self.entry(entry_id).await?;
        let id = entry_id.to_uppercase();
        let entity_ids = entity_ids(&entry, "non_polymer_entity_ids");

        let ligands: Vec<LigandMetadata> = join_all(entity_ids.iter().map(|eid| self.ligand(&id, eid)))
            .await
            .into_iter()
            .filter_map(|r| r.map_err(|e| debug!(error = %e, "Ligand fetch failed")).ok())
            .collect();

        debug!(entry_id, entities = entity_ids.len(), ligands = ligands.len(), "RCSB ligands fetched");
        Ok(ligands)
    }

    #[instrument(skip(self))]
    async fn entry_metadata(&self, entry_id: &str) -> anyhow::Result<EntryMetadata> {
        let entry = self.entry(entry_id).await?;
        let mut metadata = parse_entry_metadata(&entry, entry_id);

        for entity in self.polymer_entities(entry_id, &entry).await {
            for organism in entity["rcsb_entity_source_organism"].as_array().into_iter().flatten() {
                if let Some(name) = organism["scientific_name"].as_str() {
                    if !metadata.organisms.iter().any(|o| o == name) {
                        metadata.organisms.push(name.to_string());
                    }
                }
            }
        }

        Ok(metadata)
    }

    #[instrument(skip(self))]
    async fn raw_entry(&self, entry_id: &str) -> anyhow::Result<String> {
        self.get_text(&format!("entry/{}", entry_id.to_uppercase())).await
    }
}

#[async_trait]
impl CrossReferenceSource for RcsbClient {
    fn name(&self) -> &'static str {
        "rcsb_polymer_entity"
    }

    #[instrument(skip(self))]
    async fn cross_references(&self, entry_id: &str) -> anyhow::Result<Vec<Vec<CrossReference>>> {
        let entry = self.entry(entry_id).await?;
        let refs: Vec<Vec<CrossReference>> = self
            .polymer_entities(entry_id, &entry)
            .await
            .iter()
            .map(|entity| {
                entity["rcsb_polymer_entity_container_identifiers"]["reference_sequence_identifiers"]
                    .as_array()
                    .into_iter()
                    .flatten()
                    .filter_map(|r| {
                        Some(CrossReference::new(
                            r["database_name"].as_str()?,
                            r["database_accession"].as_str()?,
                        ))
                    })
                    .collect()
            })
            .collect();
        Ok(refs)
    }
}

fn entity_ids(entry: &Value, key: &str) -> Vec<String> {
    entry["rcsb_entry_container_identifiers"][key]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|v| v.as_str().map(String::from).or_else(|| v.as_i64().map(|n| n.to_string())))
        .collect()
}

pub fn parse_entry_metadata(entry: &Value, entry_id: &str) -> EntryMetadata {
    let text = |v: &Value| v.as_str().filter(|s| !s.trim().is_empty()).map(String::from);

    EntryMetadata {
        entry_id: entry["rcsb_id"]
            .as_str()
            .map(String::from)
            .unwrap_or_else(|| entry_id.to_uppercase()),
        title: text(&entry["struct"]["title"]),
        description: text(&entry["struct"]["pdbx_descriptor"]),
        keywords: text(&entry["struct_keywords"]["text"])
            .or_else(|| text(&entry["struct_keywords"]["pdbx_keywords"])),
        experimental_method: entry["exptl"]
            .as_array()
            .and_then(|e| e.first())
            .and_then(|e| text(&e["method"])),
        resolution: entry["rcsb_entry_info"]["resolution_combined"]
            .as_array()
            .and_then(|r| r.first())
            .and_then(Value::as_f64),
        deposit_date: entry["rcsb_accession_info"]["deposit_date"]
            .as_str()
            .and_then(|d| d.get(..10))
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
        organisms: Vec::new(),
    }
}

pub fn parse_chem_comp(comp: &Value, comp_id: &str) -> LigandMetadata {
    let chem = &comp["chem_comp"];
    LigandMetadata {
        id: chem["id"].as_str().unwrap_or(comp_id).to_string(),
        name: chem["name"].as_str().unwrap_or(comp_id).to_string(),
        formula_weight: chem["formula_weight"].as_f64(),
        formal_charge: chem["pdbx_formal_charge"].as_i64().map(|c| c as i32),
        kind: chem["type"].as_str().map(String::from),
    }
}
