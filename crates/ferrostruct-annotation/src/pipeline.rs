//! End-to-end entry pipeline: structure + annotation in one report.
//!
//! The structure is mandatory; failing to obtain it fails the run. The
//! annotation is best-effort and never does.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use ferrostruct_structure::{
    GeometricAnalyzer, ParseError, StructuralModel, StructureAnalysis, StructureParser, StructureSource,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::aggregator::{AnnotationAggregator, AnnotationRecord};
use crate::resolver::accession;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no 3-D structure available for {identifier}: {reason}")]
    NoStructureAvailable { identifier: String, reason: String },

    #[error("structure for {identifier} could not be parsed: {source}")]
    Parse {
        identifier: String,
        #[source]
        source: ParseError,
    },
}

/// Where the coordinates in a report came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureOrigin {
    Deposited,
    Predicted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryReport {
    pub id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub identifier: String,
    pub structure_origin: StructureOrigin,
    pub model: StructuralModel,
    pub analysis: StructureAnalysis,
    pub annotation: AnnotationRecord,
}

impl EntryReport {
    /// True when any annotation field is a placeholder.
    pub fn is_partial(&self) -> bool {
        self.annotation.is_partial()
    }
}

pub struct EntryPipeline {
    structures: Arc<dyn StructureSource>,
    aggregator: AnnotationAggregator,
    parser: StructureParser,
    analyzer: GeometricAnalyzer,
    step_timeout: Option<Duration>,
}

impl EntryPipeline {
    pub fn new(
        structures: Arc<dyn StructureSource>,
        aggregator: AnnotationAggregator,
        parser: StructureParser,
        analyzer: GeometricAnalyzer,
    ) -> Self {
        Self { structures, aggregator, parser, analyzer, step_timeout: None }
    }

    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = Some(timeout);
        self
    }

    #[instrument(skip(self))]
    pub async fn run(&self, identifier: &str) -> Result<EntryReport, PipelineError> {
        let normalized = accession::normalize(identifier);
        let origin = if accession::is_canonical(&normalized) {
            StructureOrigin::Predicted
        } else {
            StructureOrigin::Deposited
        };

        let (text, annotation) = tokio::join!(
            self.fetch_structure(&normalized, origin),
            self.aggregator.aggregate(&normalized),
        );

        let text = text.map_err(|reason| {
            warn!(identifier = %normalized, %reason, "No structure available");
            PipelineError::NoStructureAvailable { identifier: normalized.clone(), reason }
        })?;

        let model = self.parser.parse(&text).map_err(|source| PipelineError::Parse {
            identifier: normalized.clone(),
            source,
        })?;
        if model.is_empty() {
            return Err(PipelineError::NoStructureAvailable {
                identifier: normalized,
                reason: "structure document contains no atoms".to_string(),
            });
        }

        let analysis = self.analyzer.analyze(&model, &annotation.ligands.value);
        info!(
            identifier = %normalized,
            atoms = model.atom_count(),
            ligands = analysis.ligands.len(),
            pockets = analysis.pockets.len(),
            partial = annotation.is_partial(),
            "Entry report ready"
        );

        Ok(EntryReport {
            id: Uuid::new_v4(),
            generated_at: Utc::now(),
            identifier: normalized,
            structure_origin: origin,
            model,
            analysis,
            annotation,
        })
    }

    async fn fetch_structure(&self, identifier: &str, origin: StructureOrigin) -> Result<String, String> {
        let fetch = async {
            match origin {
                StructureOrigin::Deposited => self.structures.fetch_entry(identifier).await,
                StructureOrigin::Predicted => self.structures.fetch_predicted(identifier).await,
            }
        };
        let outcome = match self.step_timeout {
            Some(limit) => match tokio::time::timeout(limit, fetch).await {
                Ok(result) => result,
                Err(_) => return Err(format!("timed out after {:?}", limit)),
            },
            None => fetch.await,
        };
        outcome.map_err(|e| e.to_string())
    }
}
