//! Deposited and predicted structure retrieval.

use anyhow::Result;
use async_trait::async_trait;
use ferrostruct_common::sandbox::SandboxClient as Client;
use tracing::{debug, info, instrument};

pub const DEFAULT_FILES_BASE: &str = "https://files.rcsb.org";
pub const DEFAULT_PREDICTED_BASE: &str = "https://alphafold.ebi.ac.uk";

/// Source of raw coordinate text.
#[async_trait]
pub trait StructureSource: Send + Sync {
    /// Deposited structure text for a structure entry id.
    async fn fetch_entry(&self, entry_id: &str) -> Result<String>;

    /// Predicted model text for a canonical accession.
    async fn fetch_predicted(&self, accession: &str) -> Result<String>;
}

/// Fetches coordinate files over the sandboxed client. Nothing touches disk.
pub struct StructureFetcher {
    client: Client,
    files_base: String,
    predicted_base: String,
}

impl StructureFetcher {
    pub fn new(client: Client, files_base: impl Into<String>, predicted_base: impl Into<String>) -> Self {
        Self {
            client,
            files_base: files_base.into().trim_end_matches('/').to_string(),
            predicted_base: predicted_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Fetcher against the public structure services.
    pub fn with_defaults() -> Result<Self> {
        Ok(Self::new(Client::new()?, DEFAULT_FILES_BASE, DEFAULT_PREDICTED_BASE))
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        let text = self.client.get_text(url).await?;
        if text.trim().is_empty() {
            anyhow::bail!("empty structure document at {url}");
        }
        debug!(bytes = text.len(), "Structure text received");
        Ok(text)
    }
}

#[async_trait]
impl StructureSource for StructureFetcher {
    #[instrument(skip(self))]
    async fn fetch_entry(&self, entry_id: &str) -> Result<String> {
        info!("Fetching structure entry {} from RCSB", entry_id);
        let url = format!("{}/download/{}.pdb", self.files_base, entry_id.to_lowercase());
        self.get_text(&url).await
    }

    #[instrument(skip(self))]
    async fn fetch_predicted(&self, accession: &str) -> Result<String> {
        info!("Fetching predicted model for {} from AlphaFold", accession);
        let url = format!("{}/files/AF-{}-F1-model_v4.pdb", self.predicted_base, accession.to_uppercase());
        self.get_text(&url).await
    }
}
