use reqwest::{Client, ClientBuilder};
use std::collections::HashSet;
use std::time::Duration;
use tracing::warn;
use url::Url;
use crate::error::FerrostructError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// An HTTP client that only talks to approved catalog hosts.
///
/// Every external collaborator (annotation catalog, structure data API,
/// structure files, entry mappings, predicted models) goes through one of
/// these, so a misconfigured endpoint fails fast instead of leaking requests.
#[derive(Debug, Clone)]
pub struct SandboxClient {
    client: Client,
    allowlist: HashSet<String>,
}

impl SandboxClient {
    /// Creates a client with the default allowlist and a 30 s request timeout.
    pub fn new() -> Result<Self, FerrostructError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates a client with the default allowlist and a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, FerrostructError> {
        let domains = [
            "rest.uniprot.org",    // UniProtKB annotations + search
            "data.rcsb.org",       // RCSB data API (entries, entities, chem comps)
            "files.rcsb.org",      // RCSB coordinate files
            "www.ebi.ac.uk",       // PDBe SIFTS mappings
            "alphafold.ebi.ac.uk", // AlphaFold predicted models
            "localhost",
            "127.0.0.1",
        ];
        let allowlist = domains.iter().map(|d| d.to_string()).collect();

        let client = ClientBuilder::new()
            .timeout(timeout)
            .build()
            .map_err(|e| FerrostructError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, allowlist })
    }

    /// Appends an exact hostname to the allowlist.
    pub fn allow_domain(&mut self, domain: &str) {
        self.allowlist.insert(domain.to_string());
    }

    /// Validates if a URL is permitted under the current sandbox policy.
    pub fn is_allowed(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };
        self.allowlist
            .iter()
            .any(|allowed| host == allowed || host.ends_with(&format!(".{}", allowed)))
    }

    /// GET request builder for an allow-listed URL.
    pub fn get(&self, url: &str) -> Result<reqwest::RequestBuilder, FerrostructError> {
        if !self.is_allowed(url) {
            warn!(url, "Blocked request to a host outside the allowlist");
            return Err(FerrostructError::Security(format!(
                "Network capabilities capped: domain not in allowlist for URL {}",
                url
            )));
        }

        Ok(self.client.get(url))
    }

    /// GET an allow-listed URL and return the body. Non-2xx statuses are
    /// `FerrostructError::Http`.
    pub async fn get_text(&self, url: &str) -> Result<String, FerrostructError> {
        let response = self.get(url)?.send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}
