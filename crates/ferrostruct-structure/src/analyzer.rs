//! One-call geometric analysis of a parsed model.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::ligand::{group_ligands, merge_ligands, LigandCandidate, LigandMetadata};
use crate::model::StructuralModel;
use crate::pocket::{find_pockets, PocketCandidate, PocketParams};
use crate::secondary::SecondaryStructureStats;

/// Everything derived from one model. Ephemeral: recompute rather than edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureAnalysis {
    pub ligands: Vec<LigandCandidate>,
    pub pockets: Vec<PocketCandidate>,
    pub secondary_structure: SecondaryStructureStats,
}

#[derive(Debug, Clone, Default)]
pub struct GeometricAnalyzer {
    params: PocketParams,
}

impl GeometricAnalyzer {
    pub fn new(params: PocketParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &PocketParams {
        &self.params
    }

    /// Ligands (merged with `ligand_metadata`), pockets and composition.
    #[instrument(skip_all, fields(atoms = model.atom_count()))]
    pub fn analyze(&self, model: &StructuralModel, ligand_metadata: &[LigandMetadata]) -> StructureAnalysis {
        let groups = group_ligands(model);
        let ligands = merge_ligands(&groups, ligand_metadata);
        let pockets = find_pockets(model, &self.params);
        let secondary_structure = SecondaryStructureStats::from_model(model);

        debug!(
            groups = groups.len(),
            ligands = ligands.len(),
            pockets = pockets.len(),
            "Structure analysed"
        );

        StructureAnalysis { ligands, pockets, secondary_structure }
    }

    pub fn secondary_structure(&self, model: &StructuralModel) -> SecondaryStructureStats {
        SecondaryStructureStats::from_model(model)
    }

    pub fn pockets(&self, model: &StructuralModel) -> Vec<PocketCandidate> {
        find_pockets(model, &self.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ligand::LigandOrigin;
    use crate::parser::StructureParser;

    #[allow(clippy::too_many_arguments)]
    fn atom_line(record: &str, serial: i32, name: &str, residue: &str, chain: &str, number: i32, xyz: [f64; 3], element: &str) -> String {
        format!(
            "{:<6}{:>5} {:<4} {:>3}{:>2}{:>4}    {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}          {:>2}",
            record, serial, name, residue, chain, number, xyz[0], xyz[1], xyz[2], 1.0, 0.0, element
        )
    }

    fn sample_entry() -> String {
        let mut lines = vec![format!("HELIX    1   1 ALA{:>2} {:>4}  ALA{:>2} {:>4}", "A", 1, "A", 8)];
        for i in 1..=14 {
            let x = (i as f64) * 0.5;
            lines.push(atom_line("ATOM", i, "CA", "ALA", "A", i, [x, 0.0, 0.0], "C"));
        }
        lines.push(atom_line("HETATM", 15, "FE", "HEM", "A", 201, [3.0, 1.0, 0.0], "FE"));
        lines.push(atom_line("HETATM", 16, "NA", "HEM", "A", 201, [5.0, 3.0, 0.0], "N"));
        lines.push(atom_line("HETATM", 17, "O", "HOH", "A", 301, [9.0, 9.0, 9.0], "O"));
        lines.join("\n")
    }

    #[test]
    fn test_analyze_bundles_everything() {
        let model = StructureParser::default().parse(&sample_entry()).unwrap();
        let metadata = vec![LigandMetadata {
            id: "HEM".to_string(),
            name: "PROTOPORPHYRIN IX CONTAINING FE".to_string(),
            formula_weight: Some(616.49),
            formal_charge: Some(0),
            kind: Some("non-polymer".to_string()),
        }];

        let analysis = GeometricAnalyzer::default().analyze(&model, &metadata);

        assert_eq!(analysis.ligands.len(), 1);
        assert_eq!(analysis.ligands[0].origin, LigandOrigin::Catalog);
        assert_eq!(analysis.ligands[0].position, [4.0, 2.0, 0.0]);

        assert_eq!(analysis.pockets.len(), 1);
        assert_eq!(analysis.pockets[0].chain_id, "A");

        let stats = analysis.secondary_structure;
        assert_eq!(stats.total, 17);
        assert_eq!(stats.helix, 8);
    }

    #[test]
    fn test_analyze_empty_model() {
        let analysis = GeometricAnalyzer::default().analyze(&StructuralModel::empty(), &[]);
        assert!(analysis.ligands.is_empty());
        assert!(analysis.pockets.is_empty());
        assert_eq!(analysis.secondary_structure.helix_percent(), 0.0);
    }
}
