//! Identifier → canonical accession resolution.
//!
//! A single driver walks an ordered list of strategies; the first one that
//! produces an accession wins. Strategy failures are logged and absorbed.
//! Only when every strategy has been tried once does resolution report
//! `Unresolvable`.

pub mod accession;
pub mod static_table;
pub mod strategies;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::sources::{AnnotationCatalog, CrossReferenceSource, StructureCatalog};
use strategies::{
    CatalogSearch, CrossReferenceLookup, FormatCheck, RawEntryScan, ResolutionStrategy, StaticTable,
};

const UNRESOLVABLE_NOTE: &str =
    "No canonical accession found; this is most likely a synthetic or non-cataloged entity";

/// Outcome of one resolution call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResolvedIdentifier {
    Resolved {
        accession: String,
        /// 1-based position of the strategy that succeeded.
        step: usize,
        strategy: String,
    },
    Unresolvable { identifier: String },
}

impl ResolvedIdentifier {
    pub fn accession(&self) -> Option<&str> {
        match self {
            ResolvedIdentifier::Resolved { accession, .. } => Some(accession),
            ResolvedIdentifier::Unresolvable { .. } => None,
        }
    }

    pub fn step(&self) -> Option<usize> {
        match self {
            ResolvedIdentifier::Resolved { step, .. } => Some(*step),
            ResolvedIdentifier::Unresolvable { .. } => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, ResolvedIdentifier::Resolved { .. })
    }

    /// Human-readable explanation for an unresolvable identifier.
    pub fn note(&self) -> Option<&'static str> {
        match self {
            ResolvedIdentifier::Resolved { .. } => None,
            ResolvedIdentifier::Unresolvable { .. } => Some(UNRESOLVABLE_NOTE),
        }
    }
}

pub struct IdentifierResolver {
    strategies: Vec<Box<dyn ResolutionStrategy>>,
    step_timeout: Option<Duration>,
}

impl IdentifierResolver {
    /// The standard five-step chain: format check, static table, catalog
    /// search, cross references (in `xref_sources` order), raw entry scan.
    pub fn new(
        catalog: Arc<dyn AnnotationCatalog>,
        xref_sources: Vec<Arc<dyn CrossReferenceSource>>,
        structures: Arc<dyn StructureCatalog>,
    ) -> Self {
        Self::with_strategies(vec![
            Box::new(FormatCheck),
            Box::new(StaticTable),
            Box::new(CatalogSearch::new(catalog)),
            Box::new(CrossReferenceLookup::new(xref_sources)),
            Box::new(RawEntryScan::new(structures)),
        ])
    }

    pub fn with_strategies(strategies: Vec<Box<dyn ResolutionStrategy>>) -> Self {
        Self { strategies, step_timeout: None }
    }

    /// Bound every step; a step that runs over counts as failed.
    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = Some(timeout);
        self
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    #[instrument(skip(self))]
    pub async fn resolve(&self, identifier: &str) -> ResolvedIdentifier {
        let normalized = accession::normalize(identifier);

        for (idx, strategy) in self.strategies.iter().enumerate() {
            let step = idx + 1;
            let attempt = strategy.attempt(&normalized);
            let outcome = match self.step_timeout {
                Some(limit) => match tokio::time::timeout(limit, attempt).await {
                    Ok(result) => result,
                    Err(_) => Err(anyhow::anyhow!("timed out after {:?}", limit)),
                },
                None => attempt.await,
            };

            match outcome {
                Ok(Some(accession)) => {
                    info!(identifier = %normalized, %accession, step, strategy = strategy.name(), "Identifier resolved");
                    return ResolvedIdentifier::Resolved {
                        accession,
                        step,
                        strategy: strategy.name().to_string(),
                    };
                }
                Ok(None) => {
                    debug!(identifier = %normalized, step, strategy = strategy.name(), "No match");
                }
                Err(e) => {
                    debug!(identifier = %normalized, step, strategy = strategy.name(), error = %e, "Step failed");
                }
            }
        }

        warn!(identifier = %normalized, "Identifier unresolvable after all strategies");
        ResolvedIdentifier::Unresolvable { identifier: normalized }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CrossReference;
    use crate::sources::mock::{MockAnnotationCatalog, MockCrossReferenceSource, MockStructureCatalog};

    struct Fixture {
        catalog: Arc<MockAnnotationCatalog>,
        entity: Arc<MockCrossReferenceSource>,
        entry: Arc<MockCrossReferenceSource>,
        structures: Arc<MockStructureCatalog>,
    }

    impl Fixture {
        fn new(
            catalog: MockAnnotationCatalog,
            entity: MockCrossReferenceSource,
            entry: MockCrossReferenceSource,
            structures: MockStructureCatalog,
        ) -> Self {
            Self {
                catalog: Arc::new(catalog),
                entity: Arc::new(entity),
                entry: Arc::new(entry),
                structures: Arc::new(structures),
            }
        }

        fn empty() -> Self {
            Self::new(
                MockAnnotationCatalog::new(),
                MockCrossReferenceSource::new("entity"),
                MockCrossReferenceSource::new("entry"),
                MockStructureCatalog::new(),
            )
        }

        fn resolver(&self) -> IdentifierResolver {
            IdentifierResolver::new(
                self.catalog.clone(),
                vec![self.entity.clone(), self.entry.clone()],
                self.structures.clone(),
            )
        }

        fn external_calls(&self) -> usize {
            self.catalog.calls() + self.entity.calls() + self.entry.calls() + self.structures.calls()
        }
    }

    #[test]
    fn test_canonical_input_returns_itself_at_step_one() {
        let fx = Fixture::empty();
        let resolved = tokio_test::block_on(fx.resolver().resolve("P13569"));
        assert_eq!(resolved.accession(), Some("P13569"));
        assert_eq!(resolved.step(), Some(1));
        assert_eq!(fx.external_calls(), 0);
    }

    #[test]
    fn test_static_table_short_circuits_without_network() {
        let fx = Fixture::empty();
        let resolved = tokio_test::block_on(fx.resolver().resolve(" 1a4u "));
        assert_eq!(
            resolved,
            ResolvedIdentifier::Resolved {
                accession: "P13569".to_string(),
                step: 2,
                strategy: "static_table".to_string(),
            }
        );
        assert_eq!(fx.external_calls(), 0);
    }

    #[tokio::test]
    async fn test_catalog_search_is_step_three() {
        let fx = Fixture::new(
            MockAnnotationCatalog::new().with_search("7ABC", "Q9Y6K9"),
            MockCrossReferenceSource::new("entity"),
            MockCrossReferenceSource::new("entry"),
            MockStructureCatalog::new(),
        );
        let resolved = fx.resolver().resolve("7abc").await;
        assert_eq!(resolved.accession(), Some("Q9Y6K9"));
        assert_eq!(resolved.step(), Some(3));
        assert_eq!(fx.entity.calls(), 0);
    }

    #[tokio::test]
    async fn test_falls_through_to_entry_level_cross_reference() {
        let fx = Fixture::new(
            MockAnnotationCatalog::new(),
            MockCrossReferenceSource::failing("entity"),
            MockCrossReferenceSource::new("entry")
                .with("7ABC", vec![vec![CrossReference::new("UniProt", "O14746")]]),
            MockStructureCatalog::new(),
        );
        let resolved = fx.resolver().resolve("7ABC").await;
        assert_eq!(resolved.accession(), Some("O14746"));
        assert_eq!(resolved.step(), Some(4));
        assert_eq!((fx.catalog.calls(), fx.entity.calls(), fx.entry.calls()), (1, 1, 1));
        assert_eq!(fx.structures.calls(), 0);
    }

    #[tokio::test]
    async fn test_raw_scan_is_last_resort() {
        let fx = Fixture::new(
            MockAnnotationCatalog::new(),
            MockCrossReferenceSource::new("entity"),
            MockCrossReferenceSource::new("entry"),
            MockStructureCatalog::new().with_raw_entry("7ABC", r#"{"note":"see P12345","ref":"P04637"}"#),
        );
        let resolved = fx.resolver().resolve("7ABC").await;
        assert_eq!(resolved.accession(), Some("P04637"));
        assert_eq!(resolved.step(), Some(5));
    }

    #[tokio::test]
    async fn test_unresolvable_after_every_step_once() {
        let fx = Fixture::empty();
        let resolved = fx.resolver().resolve("SYNTH-01").await;
        assert_eq!(
            resolved,
            ResolvedIdentifier::Unresolvable { identifier: "SYNTH-01".to_string() }
        );
        assert!(resolved.note().unwrap().contains("synthetic"));
        assert_eq!(fx.catalog.calls(), 1);
        assert_eq!(fx.entity.calls(), 1);
        assert_eq!(fx.entry.calls(), 1);
        assert_eq!(fx.structures.calls(), 1);
    }

    #[tokio::test]
    async fn test_slow_step_times_out_and_chain_continues() {
        let slow = MockStructureCatalog::new()
            .with_raw_entry("7ABC", "P04637")
            .with_delay(Duration::from_millis(200));
        let resolver = IdentifierResolver::with_strategies(vec![
            Box::new(RawEntryScan::new(Arc::new(slow))),
            Box::new(StaticTable),
        ])
        .with_step_timeout(Duration::from_millis(20));

        let resolved = resolver.resolve("1UBQ").await;
        assert_eq!(resolved.accession(), Some("P0CG48"));
        assert_eq!(resolved.step(), Some(2));
    }
}
