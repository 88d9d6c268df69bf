//! Ligand grouping and merge with catalog ligand metadata.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{centroid, Position, StructuralModel};

/// Non-polymer residue names that are grouped as ligands.
/// Cofactors, nucleotides, sugars, common buffer/cryo additives and ions.
pub const NON_POLYMER_ALLOW_LIST: &[&str] = &[
    // nucleotides / cofactors
    "ATP", "ADP", "AMP", "ANP", "GTP", "GDP", "GNP", "GSP",
    "NAD", "NAP", "NDP", "FAD", "FMN", "COA", "ACO", "SAM", "SAH", "PLP", "TPP",
    // hemes
    "HEM", "HEC", "HEA",
    // sugars
    "NAG", "MAN", "BMA", "GAL", "GLC", "FUC", "SIA",
    // additives
    "SO4", "PO4", "GOL", "EDO", "PEG", "PG4", "ACT", "CIT", "FMT", "DMS", "TRS", "EPE", "MPD", "BOG",
    // ions
    "MG", "ZN", "CA", "MN", "FE", "FE2", "CU", "NI", "CO", "NA", "K", "CL", "IOD", "BR", "CD",
];

/// Solvent residue names, never treated as ligands.
pub const WATER_RESIDUES: &[&str] = &["HOH", "WAT", "DOD"];

/// Atoms of one non-polymer residue instance, keyed by
/// (residue name, chain, residue number).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LigandGroup {
    pub residue_name: String,
    pub chain_id: String,
    pub residue_number: i32,
    pub atom_indices: Vec<usize>,
    pub centroid: Position,
    /// Sum of standard atomic masses of the member atoms (Da).
    pub estimated_weight: f64,
}

/// Ligand description fetched from a chemical-component catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LigandMetadata {
    /// Chemical component id, e.g. "HEM".
    pub id: String,
    pub name: String,
    pub formula_weight: Option<f64>,
    pub formal_charge: Option<i32>,
    /// Component type, e.g. "non-polymer".
    pub kind: Option<String>,
}

/// Where a ligand candidate's data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LigandOrigin {
    /// Catalog metadata placed at a matched atom group's centroid.
    Catalog,
    /// Catalog metadata with no atoms in the model; position stays at origin.
    CatalogOnly,
    /// Synthesised from atom geometry alone.
    Geometry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LigandCandidate {
    pub name: String,
    pub description: String,
    pub position: Position,
    pub molecular_weight: f64,
    pub charge: i32,
    pub ligand_type: String,
    pub origin: LigandOrigin,
}

impl LigandCandidate {
    fn from_metadata(meta: &LigandMetadata) -> Self {
        Self {
            name: meta.id.clone(),
            description: meta.name.clone(),
            position: [0.0; 3],
            molecular_weight: meta.formula_weight.unwrap_or(0.0),
            charge: meta.formal_charge.unwrap_or(0),
            ligand_type: meta.kind.clone().unwrap_or_else(|| "non-polymer".to_string()),
            origin: LigandOrigin::CatalogOnly,
        }
    }

    fn from_group(group: &LigandGroup) -> Self {
        Self {
            name: group.residue_name.clone(),
            description: format!(
                "{} at {}:{} (geometry only)",
                group.residue_name, group.chain_id, group.residue_number
            ),
            position: group.centroid,
            molecular_weight: group.estimated_weight,
            charge: 0,
            ligand_type: "non-polymer".to_string(),
            origin: LigandOrigin::Geometry,
        }
    }

    /// A copy of this candidate placed at `position`.
    pub fn with_position(self, position: Position, origin: LigandOrigin) -> Self {
        Self { position, origin, ..self }
    }
}

pub fn is_ligand_residue(residue_name: &str) -> bool {
    !WATER_RESIDUES.contains(&residue_name) && NON_POLYMER_ALLOW_LIST.contains(&residue_name)
}

/// Group allow-listed non-polymer atoms by (residue name, chain, residue
/// number), in order of first appearance.
pub fn group_ligands(model: &StructuralModel) -> Vec<LigandGroup> {
    let mut index: HashMap<(&str, &str, i32), usize> = HashMap::new();
    let mut members: Vec<((&str, &str, i32), Vec<usize>)> = Vec::new();

    for (idx, atom) in model.atoms().iter().enumerate() {
        if !is_ligand_residue(&atom.residue_name) {
            continue;
        }
        let key = (atom.residue_name.as_str(), atom.chain_id.as_str(), atom.residue_number);
        let slot = *index.entry(key).or_insert_with(|| {
            members.push((key, Vec::new()));
            members.len() - 1
        });
        members[slot].1.push(idx);
    }

    let atoms = model.atoms();
    members
        .into_iter()
        .filter_map(|((residue_name, chain_id, residue_number), atom_indices)| {
            let centroid = centroid(atom_indices.iter().map(|&i| &atoms[i].position))?;
            let estimated_weight = atom_indices
                .iter()
                .map(|&i| atomic_mass(&atoms[i].element))
                .sum();
            Some(LigandGroup {
                residue_name: residue_name.to_string(),
                chain_id: chain_id.to_string(),
                residue_number,
                atom_indices,
                centroid,
                estimated_weight,
            })
        })
        .collect()
}

/// Merge atom groups with catalog metadata.
///
/// A metadata entry claims every not-yet-claimed group whose residue name is
/// an exact prefix of the metadata component id, producing one candidate per
/// claimed group. Metadata that claims nothing stays at the origin. Groups no
/// metadata claimed become geometry-only candidates.
pub fn merge_ligands(groups: &[LigandGroup], metadata: &[LigandMetadata]) -> Vec<LigandCandidate> {
    let mut claimed = vec![false; groups.len()];
    let mut candidates = Vec::new();

    for meta in metadata {
        let base = LigandCandidate::from_metadata(meta);
        let mut matched = 0usize;
        for (idx, group) in groups.iter().enumerate() {
            if claimed[idx] || !meta.id.starts_with(group.residue_name.as_str()) {
                continue;
            }
            claimed[idx] = true;
            matched += 1;
            candidates.push(base.clone().with_position(group.centroid, LigandOrigin::Catalog));
        }
        if matched == 0 {
            debug!(ligand = %meta.id, "Catalog ligand has no atoms in the model");
            candidates.push(base);
        }
    }

    candidates.extend(
        groups
            .iter()
            .zip(claimed)
            .filter(|(_, was_claimed)| !was_claimed)
            .map(|(group, _)| LigandCandidate::from_group(group)),
    );

    candidates
}

/// Standard atomic mass in Da. Unknown elements count as carbon.
fn atomic_mass(element: &str) -> f64 {
    match element {
        "H"  => 1.008,
        "C"  => 12.011,
        "N"  => 14.007,
        "O"  => 15.999,
        "F"  => 18.998,
        "NA" => 22.990,
        "MG" => 24.305,
        "P"  => 30.974,
        "S"  => 32.06,
        "CL" => 35.45,
        "K"  => 39.098,
        "CA" => 40.078,
        "MN" => 54.938,
        "FE" => 55.845,
        "CO" => 58.933,
        "NI" => 58.693,
        "CU" => 63.546,
        "ZN" => 65.38,
        "BR" => 79.904,
        "CD" => 112.41,
        "I"  => 126.90,
        _    => 12.011,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AtomRecord, SecondaryStructure};

    fn het(residue: &str, chain: &str, number: i32, element: &str, position: Position) -> AtomRecord {
        AtomRecord {
            serial: 1,
            element: element.to_string(),
            name: element.to_string(),
            chain_id: chain.to_string(),
            residue_name: residue.to_string(),
            residue_number: number,
            position,
            secondary_structure: SecondaryStructure::Unknown,
            is_backbone: false,
            is_hetero: true,
        }
    }

    fn model(atoms: Vec<AtomRecord>) -> StructuralModel {
        StructuralModel::new(atoms, vec![]).unwrap()
    }

    fn meta(id: &str, name: &str) -> LigandMetadata {
        LigandMetadata {
            id: id.to_string(),
            name: name.to_string(),
            formula_weight: Some(616.49),
            formal_charge: Some(0),
            kind: Some("non-polymer".to_string()),
        }
    }

    #[test]
    fn test_group_centroid_is_mean() {
        let m = model(vec![
            het("HEM", "A", 147, "FE", [0.0, 0.0, 0.0]),
            het("HEM", "A", 147, "C", [2.0, 2.0, 2.0]),
            het("HEM", "A", 147, "N", [4.0, -2.0, 1.0]),
        ]);
        let groups = group_ligands(&m);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].atom_indices, vec![0, 1, 2]);
        assert_eq!(groups[0].centroid, [2.0, 0.0, 1.0]);
    }

    #[test]
    fn test_single_atom_group_centroid_is_atom_position() {
        let m = model(vec![het("ZN", "B", 301, "ZN", [1.5, -2.25, 8.0])]);
        let groups = group_ligands(&m);
        assert_eq!(groups[0].centroid, [1.5, -2.25, 8.0]);
        assert!((groups[0].estimated_weight - 65.38).abs() < 1e-9);
    }

    #[test]
    fn test_grouping_key_splits_instances_and_skips_water() {
        let m = model(vec![
            het("HEM", "A", 147, "FE", [0.0, 0.0, 0.0]),
            het("HOH", "A", 500, "O", [9.0, 9.0, 9.0]),
            het("HEM", "B", 147, "FE", [10.0, 0.0, 0.0]),
            het("XYZ", "A", 600, "C", [5.0, 5.0, 5.0]),
            het("HEM", "A", 148, "FE", [20.0, 0.0, 0.0]),
        ]);
        let groups = group_ligands(&m);
        let keys: Vec<_> = groups
            .iter()
            .map(|g| (g.residue_name.as_str(), g.chain_id.as_str(), g.residue_number))
            .collect();
        assert_eq!(keys, vec![("HEM", "A", 147), ("HEM", "B", 147), ("HEM", "A", 148)]);
    }

    #[test]
    fn test_merge_places_metadata_at_every_matching_group() {
        let m = model(vec![
            het("HEM", "A", 147, "FE", [1.0, 1.0, 1.0]),
            het("HEM", "B", 147, "FE", [3.0, 3.0, 3.0]),
        ]);
        let merged = merge_ligands(&group_ligands(&m), &[meta("HEM", "PROTOPORPHYRIN IX CONTAINING FE")]);
        assert_eq!(merged.len(), 2);
        assert!(merged.iter().all(|c| c.origin == LigandOrigin::Catalog));
        assert_eq!(merged[0].position, [1.0, 1.0, 1.0]);
        assert_eq!(merged[1].position, [3.0, 3.0, 3.0]);
        assert_eq!(merged[0].description, "PROTOPORPHYRIN IX CONTAINING FE");
    }

    #[test]
    fn test_merge_unmatched_metadata_keeps_origin_position() {
        let merged = merge_ligands(&[], &[meta("ATP", "ADENOSINE-5'-TRIPHOSPHATE")]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].position, [0.0, 0.0, 0.0]);
        assert_eq!(merged[0].origin, LigandOrigin::CatalogOnly);
    }

    #[test]
    fn test_merge_promotes_unmatched_groups() {
        let m = model(vec![
            het("SO4", "A", 401, "S", [0.0, 0.0, 0.0]),
            het("SO4", "A", 401, "O", [1.0, 0.0, 0.0]),
            het("HEM", "A", 147, "FE", [5.0, 5.0, 5.0]),
        ]);
        let merged = merge_ligands(&group_ligands(&m), &[meta("HEM", "HEME")]);
        assert_eq!(merged.len(), 2);
        let sulfate = merged.iter().find(|c| c.name == "SO4").unwrap();
        assert_eq!(sulfate.origin, LigandOrigin::Geometry);
        assert_eq!(sulfate.position, [0.5, 0.0, 0.0]);
        assert!((sulfate.molecular_weight - (32.06 + 15.999)).abs() < 1e-9);
    }

    #[test]
    fn test_merge_prefix_rule_and_first_claim_wins() {
        let m = model(vec![het("FE", "A", 1, "FE", [1.0, 0.0, 0.0])]);
        let merged = merge_ligands(
            &group_ligands(&m),
            &[meta("FE2", "FE (II) ION"), meta("FE", "FE (III) ION")],
        );
        assert_eq!(merged[0].name, "FE2");
        assert_eq!(merged[0].origin, LigandOrigin::Catalog);
        assert_eq!(merged[1].name, "FE");
        assert_eq!(merged[1].origin, LigandOrigin::CatalogOnly);
    }
}
