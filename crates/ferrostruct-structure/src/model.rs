//! The parsed structural model: atoms in file order plus inferred bonds.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Cartesian coordinates in Å, stored at single precision.
pub type Position = [f32; 3];

/// Secondary-structure class assigned to an atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecondaryStructure {
    Helix,
    Sheet,
    Coil,
    Unknown,
}

impl SecondaryStructure {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecondaryStructure::Helix   => "helix",
            SecondaryStructure::Sheet   => "sheet",
            SecondaryStructure::Coil    => "coil",
            SecondaryStructure::Unknown => "unknown",
        }
    }
}

/// One ATOM/HETATM record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomRecord {
    pub serial: i32,
    pub element: String,
    pub name: String,
    /// Usually one character, but two-character ids are accepted.
    pub chain_id: String,
    pub residue_name: String,
    pub residue_number: i32,
    pub position: Position,
    pub secondary_structure: SecondaryStructure,
    pub is_backbone: bool,
    pub is_hetero: bool,
}

/// A bond between two atoms, as indices into the owning model's atom list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bond {
    pub first: usize,
    pub second: usize,
}

impl Bond {
    pub fn new(first: usize, second: usize) -> Self {
        Self { first, second }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ModelError {
    #[error("bond ({first}, {second}) references an atom outside 0..{atom_count}")]
    BondOutOfRange {
        first: usize,
        second: usize,
        atom_count: usize,
    },
}

/// Immutable container of atoms and bonds produced by one parse.
///
/// Atom order is file order and is significant: bond inference and ligand
/// grouping both depend on it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuralModel {
    entry_id: Option<String>,
    title: Option<String>,
    atoms: Vec<AtomRecord>,
    bonds: Vec<Bond>,
}

impl StructuralModel {
    /// Build a model, rejecting any bond that points past the atom list.
    pub fn new(atoms: Vec<AtomRecord>, bonds: Vec<Bond>) -> Result<Self, ModelError> {
        let atom_count = atoms.len();
        if let Some(bad) = bonds
            .iter()
            .find(|b| b.first >= atom_count || b.second >= atom_count)
        {
            return Err(ModelError::BondOutOfRange {
                first: bad.first,
                second: bad.second,
                atom_count,
            });
        }
        Ok(Self { entry_id: None, title: None, atoms, bonds })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Attach header metadata. Consumes and returns the model so no
    /// mutable handle ever escapes construction.
    pub fn with_header(mut self, entry_id: Option<String>, title: Option<String>) -> Self {
        self.entry_id = entry_id;
        self.title = title;
        self
    }

    pub fn entry_id(&self) -> Option<&str> { self.entry_id.as_deref() }
    pub fn title(&self) -> Option<&str> { self.title.as_deref() }
    pub fn atoms(&self) -> &[AtomRecord] { &self.atoms }
    pub fn bonds(&self) -> &[Bond] { &self.bonds }
    pub fn atom_count(&self) -> usize { self.atoms.len() }
    pub fn is_empty(&self) -> bool { self.atoms.is_empty() }

    /// Chain ids in order of first appearance.
    pub fn chain_ids(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for atom in &self.atoms {
            if !seen.contains(&atom.chain_id.as_str()) {
                seen.push(atom.chain_id.as_str());
            }
        }
        seen
    }
}

/// Arithmetic mean of a set of positions. `None` for an empty set.
pub fn centroid<'a, I>(positions: I) -> Option<Position>
where
    I: IntoIterator<Item = &'a Position>,
{
    let mut sum = [0.0f64; 3];
    let mut n = 0usize;
    for p in positions {
        sum[0] += p[0] as f64;
        sum[1] += p[1] as f64;
        sum[2] += p[2] as f64;
        n += 1;
    }
    if n == 0 {
        return None;
    }
    let n = n as f64;
    Some([(sum[0] / n) as f32, (sum[1] / n) as f32, (sum[2] / n) as f32])
}

pub fn distance(a: &Position, b: &Position) -> f32 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}
