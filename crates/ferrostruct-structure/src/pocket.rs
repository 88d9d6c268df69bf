//! Per-chain pocket heuristic.
//!
//! This is a coarse ranking signal, not a cavity finder. Each sufficiently
//! large chain is scored by how tightly its atoms pack around the chain
//! centroid: compact chains score higher. Use the output to order chains
//! for closer inspection, never as a statement that a pocket exists.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{centroid, distance, Position, StructuralModel};

const MIN_VOLUME: f64 = 300.0;
const MAX_VOLUME: f64 = 1800.0;
const BASE_SCORE: f64 = 0.55;
const DENSITY_WEIGHT: f64 = 0.4;
const MAX_SCORE: f64 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Druggability {
    High,
    Medium,
    Low,
}

impl Druggability {
    pub fn from_score(score: f64) -> Self {
        if score > 0.85 {
            Druggability::High
        } else if score > 0.70 {
            Druggability::Medium
        } else {
            Druggability::Low
        }
    }
}

/// Tunables for the pocket heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PocketParams {
    /// Chains with fewer atoms are ignored.
    pub min_atoms: usize,
    /// Volume scale factor `k` in `atoms * mean_distance * k`.
    pub volume_factor: f64,
    /// Added to the mean distance before inverting.
    pub epsilon: f64,
}

impl Default for PocketParams {
    fn default() -> Self {
        Self {
            min_atoms: 12,
            volume_factor: 0.25,
            epsilon: 0.001,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PocketCandidate {
    pub name: String,
    pub chain_id: String,
    pub center: Position,
    /// In [0, 0.95].
    pub score: f64,
    /// Å³, clamped to [300, 1800].
    pub volume: f64,
    pub druggability: Druggability,
}

/// Score every chain with at least `params.min_atoms` atoms, best first.
pub fn find_pockets(model: &StructuralModel, params: &PocketParams) -> Vec<PocketCandidate> {
    let atoms = model.atoms();
    let mut pockets = Vec::new();

    for chain in model.chain_ids() {
        let positions: Vec<&Position> = atoms
            .iter()
            .filter(|a| a.chain_id == chain)
            .map(|a| &a.position)
            .collect();
        if positions.len() < params.min_atoms {
            debug!(chain, atoms = positions.len(), "Chain too small for pocket scoring");
            continue;
        }
        let Some(center) = centroid(positions.iter().copied()) else {
            continue;
        };

        let n = positions.len() as f64;
        let mean_distance = positions
            .iter()
            .map(|p| distance(p, &center) as f64)
            .sum::<f64>()
            / n;

        let density = (1.0 / (mean_distance + params.epsilon)).clamp(0.0, 1.0);
        let volume = (n * mean_distance * params.volume_factor).clamp(MIN_VOLUME, MAX_VOLUME);
        let score = (BASE_SCORE + DENSITY_WEIGHT * density).min(MAX_SCORE);

        pockets.push(PocketCandidate {
            name: format!("Chain {chain} pocket"),
            chain_id: chain.to_string(),
            center,
            score,
            volume,
            druggability: Druggability::from_score(score),
        });
    }

    pockets.sort_by(|a, b| b.score.total_cmp(&a.score));
    pockets
}
