//! Secondary-structure composition of a model.

use serde::{Deserialize, Serialize};

use crate::model::{SecondaryStructure, StructuralModel};

/// Per-class atom counts and percentage shares.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SecondaryStructureStats {
    pub total: usize,
    pub helix: usize,
    pub sheet: usize,
    pub coil: usize,
    pub unknown: usize,
}

impl SecondaryStructureStats {
    pub fn from_model(model: &StructuralModel) -> Self {
        let mut stats = Self::default();
        for atom in model.atoms() {
            stats.total += 1;
            match atom.secondary_structure {
                SecondaryStructure::Helix   => stats.helix += 1,
                SecondaryStructure::Sheet   => stats.sheet += 1,
                SecondaryStructure::Coil    => stats.coil += 1,
                SecondaryStructure::Unknown => stats.unknown += 1,
            }
        }
        stats
    }

    pub fn count(&self, class: SecondaryStructure) -> usize {
        match class {
            SecondaryStructure::Helix   => self.helix,
            SecondaryStructure::Sheet   => self.sheet,
            SecondaryStructure::Coil    => self.coil,
            SecondaryStructure::Unknown => self.unknown,
        }
    }

    /// Share of atoms in `class`, 0-100. Zero for an empty model.
    pub fn percentage(&self, class: SecondaryStructure) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.count(class) as f64 * 100.0 / self.total as f64
    }

    pub fn helix_percent(&self) -> f64 { self.percentage(SecondaryStructure::Helix) }
    pub fn sheet_percent(&self) -> f64 { self.percentage(SecondaryStructure::Sheet) }
    pub fn coil_percent(&self) -> f64 { self.percentage(SecondaryStructure::Coil) }
    pub fn unknown_percent(&self) -> f64 { self.percentage(SecondaryStructure::Unknown) }
}
