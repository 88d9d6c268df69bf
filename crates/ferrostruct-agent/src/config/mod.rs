//! Configuration loading for ferrostruct.
//! Reads ferrostruct.toml from the current directory or the path in the
//! FERROSTRUCT_CONFIG env var. Every field has a default.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use ferrostruct_structure::PocketParams;

pub const DEFAULT_CONFIG_FILE: &str = "ferrostruct.toml";
pub const CONFIG_ENV_VAR: &str = "FERROSTRUCT_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub endpoints: EndpointsConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Abort on malformed atom/range records instead of skipping them.
    #[serde(default)]
    pub strict: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_min_pocket_atoms")]
    pub min_pocket_atoms: usize,
    #[serde(default = "default_pocket_volume_factor")]
    pub pocket_volume_factor: f64,
    #[serde(default = "default_pocket_epsilon")]
    pub pocket_epsilon: f64,
}

fn default_min_pocket_atoms()     -> usize { 12 }
fn default_pocket_volume_factor() -> f64   { 0.25 }
fn default_pocket_epsilon()       -> f64   { 0.001 }

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_pocket_atoms: default_min_pocket_atoms(),
            pocket_volume_factor: default_pocket_volume_factor(),
            pocket_epsilon: default_pocket_epsilon(),
        }
    }
}

impl AnalysisConfig {
    pub fn pocket_params(&self) -> PocketParams {
        PocketParams {
            min_atoms: self.min_pocket_atoms,
            volume_factor: self.pocket_volume_factor,
            epsilon: self.pocket_epsilon,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_step_timeout")]
    pub step_timeout_secs: u64,
    /// Hosts added to the built-in allowlist (e.g. a local mirror).
    #[serde(default)]
    pub extra_allowed_domains: Vec<String>,
}

fn default_request_timeout() -> u64 { 30 }
fn default_step_timeout()    -> u64 { 20 }

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            step_timeout_secs: default_step_timeout(),
            extra_allowed_domains: Vec::new(),
        }
    }
}

impl NetworkConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn step_timeout(&self) -> Duration {
        Duration::from_secs(self.step_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointsConfig {
    #[serde(default = "default_uniprot")]
    pub uniprot: String,
    #[serde(default = "default_rcsb_data")]
    pub rcsb_data: String,
    #[serde(default = "default_rcsb_files")]
    pub rcsb_files: String,
    #[serde(default = "default_pdbe")]
    pub pdbe: String,
    #[serde(default = "default_alphafold")]
    pub alphafold: String,
}

fn default_uniprot()    -> String { "https://rest.uniprot.org".to_string() }
fn default_rcsb_data()  -> String { "https://data.rcsb.org".to_string() }
fn default_rcsb_files() -> String { "https://files.rcsb.org".to_string() }
fn default_pdbe()       -> String { "https://www.ebi.ac.uk".to_string() }
fn default_alphafold()  -> String { "https://alphafold.ebi.ac.uk".to_string() }

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            uniprot: default_uniprot(),
            rcsb_data: default_rcsb_data(),
            rcsb_files: default_rcsb_files(),
            pdbe: default_pdbe(),
            alphafold: default_alphafold(),
        }
    }
}


impl Config {
    /// Config file path: explicit argument, then FERROSTRUCT_CONFIG, then
    /// ./ferrostruct.toml.
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        match explicit {
            Some(path) => path.to_path_buf(),
            None => std::env::var(CONFIG_ENV_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE)),
        }
    }

    /// Load configuration. A missing file yields defaults; an unreadable or
    /// malformed file is an error.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let path = Self::resolve_path(explicit);

        if !path.exists() {
            tracing::warn!("Config file not found: {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        Self::from_toml(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config {}: {}", path.display(), e))
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
