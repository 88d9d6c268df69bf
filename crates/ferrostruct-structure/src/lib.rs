//! ferrostruct-structure: Structure-file parsing and geometric analytics.
//!
//! Raw coordinate text flows through:
//! 1. `parser`: fixed-column record parsing into a `StructuralModel`
//! 2. `model`: the immutable atom/bond container
//! 3. `ligand`, `secondary`, `pocket`: derived geometry
//! 4. `analyzer`: one-call bundle of the above
//!
//! `fetch` retrieves deposited and predicted structure text over HTTP.

pub mod model;
pub mod parser;
pub mod ligand;
pub mod secondary;
pub mod pocket;
pub mod analyzer;
pub mod fetch;

pub use analyzer::{GeometricAnalyzer, StructureAnalysis};
pub use fetch::{StructureFetcher, StructureSource};
pub use ligand::{LigandCandidate, LigandGroup, LigandMetadata, LigandOrigin};
pub use model::{AtomRecord, Bond, ModelError, Position, SecondaryStructure, StructuralModel};
pub use parser::{ParseError, ParseOptions, StructureParser};
pub use pocket::{Druggability, PocketCandidate, PocketParams};
pub use secondary::SecondaryStructureStats;
