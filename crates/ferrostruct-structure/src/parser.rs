//! Fixed-column structure-file parser.
//!
//! Lines are classified by their 6-character record prefix. Atom fields are
//! cut at fixed column offsets (fields may abut with no separator, so
//! whitespace splitting is wrong). The offsets below follow the legacy
//! coordinate-file convention and must not move.

use std::collections::HashMap;
use std::ops::Range;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::model::{AtomRecord, Bond, ModelError, SecondaryStructure, StructuralModel};

/// 0-based, half-open column ranges.
mod columns {
    use std::ops::Range;

    pub const SERIAL: Range<usize> = 6..11;
    pub const ATOM_NAME: Range<usize> = 12..16;
    pub const RESIDUE_NAME: Range<usize> = 17..20;
    /// Standard chain column is 21; column 20 carries the first character
    /// of two-character chain ids.
    pub const CHAIN_ID: Range<usize> = 20..22;
    pub const RESIDUE_NUMBER: Range<usize> = 22..26;
    pub const X: Range<usize> = 30..38;
    pub const Y: Range<usize> = 38..46;
    pub const Z: Range<usize> = 46..54;
    pub const ELEMENT: Range<usize> = 76..78;

    pub const HELIX_CHAIN: Range<usize> = 18..20;
    pub const HELIX_START: Range<usize> = 21..25;
    pub const HELIX_END: Range<usize> = 33..37;

    pub const SHEET_CHAIN: Range<usize> = 20..22;
    pub const SHEET_START: Range<usize> = 22..26;
    pub const SHEET_END: Range<usize> = 33..37;

    pub const TURN_CHAIN: Range<usize> = 18..20;
    pub const TURN_START: Range<usize> = 20..24;
    pub const TURN_END: Range<usize> = 31..35;

    pub const HEADER_ID: Range<usize> = 62..66;
    pub const TITLE_TEXT: Range<usize> = 10..80;
}

const BACKBONE_ATOMS: &[&str] = &["N", "CA", "C", "O"];

/// Parser behaviour switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOptions {
    /// Abort on the first malformed atom/range record instead of skipping it.
    pub strict: bool,
}

/// A line-scoped parse fault.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    #[error("line {line}: {record} record is missing required field `{field}`")]
    MissingField {
        line: usize,
        record: &'static str,
        field: &'static str,
    },

    #[error("line {line}: {record} record has malformed `{field}` value {value:?}")]
    MalformedField {
        line: usize,
        record: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("inconsistent model: {0}")]
    Model(#[from] ModelError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordType {
    Atom,
    HetAtom,
    Range(RangeKind),
    Header,
    Title,
    Model,
    EndModel,
}

impl RecordType {
    fn classify(line: &str) -> Option<Self> {
        let prefix = line.get(..line.len().min(6)).unwrap_or("");
        match prefix.trim_end() {
            "ATOM"   => Some(RecordType::Atom),
            "HETATM" => Some(RecordType::HetAtom),
            "HELIX"  => Some(RecordType::Range(RangeKind::Helix)),
            "SHEET"  => Some(RecordType::Range(RangeKind::Sheet)),
            "TURN"   => Some(RecordType::Range(RangeKind::Turn)),
            "HEADER" => Some(RecordType::Header),
            "TITLE"  => Some(RecordType::Title),
            "MODEL"  => Some(RecordType::Model),
            "ENDMDL" => Some(RecordType::EndModel),
            _        => None,
        }
    }
}

/// Secondary-structure range record kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RangeKind {
    Helix,
    Sheet,
    Turn,
}

impl RangeKind {
    fn record(self) -> &'static str {
        match self {
            RangeKind::Helix => "HELIX",
            RangeKind::Sheet => "SHEET",
            RangeKind::Turn  => "TURN",
        }
    }

    fn tag(self) -> SecondaryStructure {
        match self {
            RangeKind::Helix => SecondaryStructure::Helix,
            RangeKind::Sheet => SecondaryStructure::Sheet,
            RangeKind::Turn  => SecondaryStructure::Coil,
        }
    }

    /// (chain, start residue, end residue) columns.
    fn layout(self) -> (Range<usize>, Range<usize>, Range<usize>) {
        match self {
            RangeKind::Helix => (columns::HELIX_CHAIN, columns::HELIX_START, columns::HELIX_END),
            RangeKind::Sheet => (columns::SHEET_CHAIN, columns::SHEET_START, columns::SHEET_END),
            RangeKind::Turn  => (columns::TURN_CHAIN, columns::TURN_START, columns::TURN_END),
        }
    }
}

/// A recorded (chain, start, end) annotation, consumed after the atom pass.
#[derive(Debug, Clone, PartialEq)]
struct StructureRange {
    kind: RangeKind,
    chain_id: String,
    start: i32,
    end: i32,
}

impl StructureRange {
    fn covers(&self, residue_number: i32) -> bool {
        (self.start..=self.end).contains(&residue_number)
    }
}

/// Converts raw structure text into a `StructuralModel`.
#[derive(Debug, Clone, Default)]
pub struct StructureParser {
    options: ParseOptions,
}

impl StructureParser {
    pub fn new(options: ParseOptions) -> Self {
        Self { options }
    }

    /// Malformed atom and range records raise a `ParseError`.
    pub fn strict() -> Self {
        Self::new(ParseOptions { strict: true })
    }

    pub fn options(&self) -> ParseOptions {
        self.options
    }

    /// Parse raw text. Empty input yields an empty model.
    ///
    /// Unknown record types are always skipped. Malformed atom/range records
    /// are skipped in lenient mode and returned as errors in strict mode.
    #[instrument(skip(self, text), fields(strict = self.options.strict, bytes = text.len()))]
    pub fn parse(&self, text: &str) -> Result<StructuralModel, ParseError> {
        let mut atoms: Vec<AtomRecord> = Vec::new();
        let mut ranges: Vec<StructureRange> = Vec::new();
        let mut entry_id: Option<String> = None;
        let mut title = String::new();
        let mut skipped = 0usize;

        for (idx, line) in text.lines().enumerate() {
            let line_no = idx + 1;
            let Some(record) = RecordType::classify(line) else {
                continue;
            };

            let outcome = match record {
                RecordType::Atom | RecordType::HetAtom => {
                    parse_atom(line, line_no, record == RecordType::HetAtom).map(|a| atoms.push(a))
                }
                RecordType::Range(kind) => parse_range(line, line_no, kind).map(|r| ranges.push(r)),
                RecordType::Header => {
                    entry_id = column(line, columns::HEADER_ID).map(str::to_string);
                    Ok(())
                }
                RecordType::Title => {
                    if let Some(fragment) = column(line, columns::TITLE_TEXT) {
                        if !title.is_empty() {
                            title.push(' ');
                        }
                        title.push_str(fragment);
                    }
                    Ok(())
                }
                RecordType::Model => Ok(()),
                // Only the first model is read.
                RecordType::EndModel => break,
            };

            if let Err(err) = outcome {
                if self.options.strict {
                    return Err(err);
                }
                debug!(line = line_no, %err, "Skipping malformed record");
                skipped += 1;
            }
        }

        if skipped > 0 {
            warn!(skipped, "Skipped malformed records in lenient mode");
        }

        assign_secondary_structure(&mut atoms, &ranges);
        let bonds = infer_backbone_bonds(&atoms);
        debug!(atoms = atoms.len(), bonds = bonds.len(), ranges = ranges.len(), "Parsed structure");

        let title = if title.is_empty() { None } else { Some(title) };
        Ok(StructuralModel::new(atoms, bonds)?.with_header(entry_id, title))
    }
}

/// Trimmed, non-empty text in `range`, tolerating short lines.
fn column(line: &str, range: Range<usize>) -> Option<&str> {
    if range.start >= line.len() {
        return None;
    }
    let end = range.end.min(line.len());
    line.get(range.start..end)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

struct FieldReader<'a> {
    line: &'a str,
    line_no: usize,
    record: &'static str,
}

impl<'a> FieldReader<'a> {
    fn required<T: FromStr>(&self, range: Range<usize>, field: &'static str) -> Result<T, ParseError> {
        let raw = column(self.line, range).ok_or(ParseError::MissingField {
            line: self.line_no,
            record: self.record,
            field,
        })?;
        raw.parse::<T>().map_err(|_| ParseError::MalformedField {
            line: self.line_no,
            record: self.record,
            field,
            value: raw.to_string(),
        })
    }

    /// Coordinates are read at double precision and stored at single precision.
    fn coordinate(&self, range: Range<usize>, field: &'static str) -> Result<f32, ParseError> {
        self.required::<f64>(range, field).map(|v| v as f32)
    }

    fn text(&self, range: Range<usize>) -> String {
        column(self.line, range).unwrap_or_default().to_string()
    }
}

fn parse_atom(line: &str, line_no: usize, is_hetero: bool) -> Result<AtomRecord, ParseError> {
    let reader = FieldReader {
        line,
        line_no,
        record: if is_hetero { "HETATM" } else { "ATOM" },
    };

    let serial = reader.required::<i32>(columns::SERIAL, "serial")?;
    let residue_number = reader.required::<i32>(columns::RESIDUE_NUMBER, "residue number")?;
    let x = reader.coordinate(columns::X, "x")?;
    let y = reader.coordinate(columns::Y, "y")?;
    let z = reader.coordinate(columns::Z, "z")?;

    let name = reader.text(columns::ATOM_NAME);
    let element = column(line, columns::ELEMENT)
        .map(|e| e.to_ascii_uppercase())
        .unwrap_or_else(|| infer_element(&name, is_hetero));
    let is_backbone = !is_hetero && BACKBONE_ATOMS.contains(&name.as_str());

    Ok(AtomRecord {
        serial,
        element,
        name,
        chain_id: reader.text(columns::CHAIN_ID),
        residue_name: reader.text(columns::RESIDUE_NAME),
        residue_number,
        position: [x, y, z],
        secondary_structure: SecondaryStructure::Unknown,
        is_backbone,
        is_hetero,
    })
}

fn parse_range(line: &str, line_no: usize, kind: RangeKind) -> Result<StructureRange, ParseError> {
    let reader = FieldReader { line, line_no, record: kind.record() };
    let (chain_cols, start_cols, end_cols) = kind.layout();

    let start = reader.required::<i32>(start_cols, "start residue")?;
    let end = reader.required::<i32>(end_cols, "end residue")?;

    Ok(StructureRange {
        kind,
        chain_id: reader.text(chain_cols),
        start: start.min(end),
        end: start.max(end),
    })
}

/// Element guess for records with blank element columns.
fn infer_element(atom_name: &str, is_hetero: bool) -> String {
    let letters: String = atom_name
        .chars()
        .skip_while(|c| c.is_ascii_digit())
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    // Hetero ions are usually named after their element (FE, ZN, MG, CA).
    if is_hetero && (1..=2).contains(&letters.len()) && letters.len() == atom_name.len() {
        return letters.to_ascii_uppercase();
    }
    letters
        .chars()
        .next()
        .map(|c| c.to_ascii_uppercase().to_string())
        .unwrap_or_default()
}

/// Second pass: tag every atom covered by a recorded range. The first
/// recorded range covering an atom wins; uncovered atoms stay `Unknown`.
fn assign_secondary_structure(atoms: &mut [AtomRecord], ranges: &[StructureRange]) {
    if ranges.is_empty() {
        return;
    }
    let mut by_chain: HashMap<&str, Vec<&StructureRange>> = HashMap::new();
    for range in ranges {
        by_chain.entry(range.chain_id.as_str()).or_default().push(range);
    }

    for atom in atoms.iter_mut() {
        let tag = by_chain
            .get(atom.chain_id.as_str())
            .and_then(|chain_ranges| chain_ranges.iter().find(|r| r.covers(atom.residue_number)))
            .map(|r| r.kind.tag());
        if let Some(tag) = tag {
            atom.secondary_structure = tag;
        }
    }
}

/// Index-adjacency bond inference.
///
/// Within one chain, each backbone atom is bonded to the previous backbone
/// atom of that chain when their residue numbers differ by exactly 1. This is
/// an approximation with no distance cutoff: it is wrong across chain gaps
/// and when two chains share an id.
pub fn infer_backbone_bonds(atoms: &[AtomRecord]) -> Vec<Bond> {
    let mut previous: HashMap<&str, usize> = HashMap::new();
    let mut bonds = Vec::new();

    for (idx, atom) in atoms.iter().enumerate() {
        if !atom.is_backbone {
            continue;
        }
        if let Some(&prev) = previous.get(atom.chain_id.as_str()) {
            let step = atom.residue_number as i64 - atoms[prev].residue_number as i64;
            if step == 1 {
                bonds.push(Bond::new(prev, idx));
            }
        }
        previous.insert(atom.chain_id.as_str(), idx);
    }

    bonds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secondary::SecondaryStructureStats;

    #[allow(clippy::too_many_arguments)]
    fn atom_line(
        record: &str,
        serial: i32,
        name: &str,
        residue: &str,
        chain: &str,
        residue_number: i32,
        xyz: [f64; 3],
        element: &str,
    ) -> String {
        format!(
            "{:<6}{:>5} {:<4} {:>3}{:>2}{:>4}    {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}          {:>2}",
            record, serial, name, residue, chain, residue_number,
            xyz[0], xyz[1], xyz[2], 1.0, 20.0, element
        )
    }

    fn helix_line(chain: &str, start: i32, end: i32) -> String {
        format!("HELIX    1   1 ALA{:>2} {:>4}  ALA{:>2} {:>4}", chain, start, chain, end)
    }

    fn sheet_line(chain: &str, start: i32, end: i32) -> String {
        format!("SHEET    1   A 2 VAL{:>2}{:>4}  VAL{:>2}{:>4}", chain, start, chain, end)
    }

    fn turn_line(chain: &str, start: i32, end: i32) -> String {
        format!("TURN     1 T1  GLY{:>2}{:>4}  GLY{:>2}{:>4}", chain, start, chain, end)
    }

    fn ca_trace(chain: &str, residues: std::ops::RangeInclusive<i32>) -> Vec<String> {
        residues
            .map(|r| atom_line("ATOM", r, "CA", "ALA", chain, r, [r as f64 * 3.8, 0.0, 0.0], "C"))
            .collect()
    }

    #[test]
    fn test_scenario_helix_trace() {
        let mut lines = vec![helix_line("A", 1, 5)];
        lines.extend(ca_trace("A", 1..=5));
        let model = StructureParser::default().parse(&lines.join("\n")).unwrap();

        assert_eq!(model.atom_count(), 5);
        assert!(model
            .atoms()
            .iter()
            .all(|a| a.secondary_structure == SecondaryStructure::Helix));
        assert_eq!(
            model.bonds(),
            &[Bond::new(0, 1), Bond::new(1, 2), Bond::new(2, 3), Bond::new(3, 4)]
        );

        let stats = SecondaryStructureStats::from_model(&model);
        assert_eq!(stats.helix, 5);
        assert_eq!(stats.helix_percent(), 100.0);
        assert_eq!(stats.sheet_percent() + stats.coil_percent() + stats.unknown_percent(), 0.0);
    }

    #[test]
    fn test_empty_input_is_valid_empty_model() {
        let model = StructureParser::strict().parse("").unwrap();
        assert!(model.is_empty());
        assert!(model.bonds().is_empty());
    }

    #[test]
    fn test_atom_fields_by_column() {
        let line = atom_line("ATOM", 42, "CB", "LEU", "B", 117, [-12.5, 7.25, 101.125], "C");
        let model = StructureParser::strict().parse(&line).unwrap();
        let atom = &model.atoms()[0];

        assert_eq!(atom.serial, 42);
        assert_eq!(atom.name, "CB");
        assert_eq!(atom.residue_name, "LEU");
        assert_eq!(atom.chain_id, "B");
        assert_eq!(atom.residue_number, 117);
        assert_eq!(atom.element, "C");
        assert_eq!(atom.position, [-12.5, 7.25, 101.125]);
        assert!(!atom.is_backbone);
        assert!(!atom.is_hetero);
        assert_eq!(atom.secondary_structure, SecondaryStructure::Unknown);
    }

    #[test]
    fn test_abutting_fields_are_split_by_column() {
        // Chain id abuts the residue number and the x/y/z values touch.
        let line = "ATOM  99999 CA  GLY A9999    -999.999-888.888-777.777  1.00  0.00           C";
        let model = StructureParser::strict().parse(line).unwrap();
        let atom = &model.atoms()[0];
        assert_eq!(atom.serial, 99999);
        assert_eq!(atom.residue_number, 9999);
        assert_eq!(atom.position, [-999.999f32, -888.888f32, -777.777f32]);
    }

    #[test]
    fn test_coordinate_round_trip_at_single_precision() {
        let values = [0.001, 12.345, -45.678, 999.999, -0.5];
        for v in values {
            let line = atom_line("ATOM", 1, "CA", "ALA", "A", 1, [v, v, v], "C");
            let model = StructureParser::strict().parse(&line).unwrap();
            let stored = model.atoms()[0].position;
            assert_eq!(stored, [v as f32; 3]);
        }
    }

    #[test]
    fn test_unknown_records_skipped() {
        let text = [
            "REMARK   2 RESOLUTION.    1.50 ANGSTROMS.".to_string(),
            "SEQRES   1 A    5  ALA ALA ALA ALA ALA".to_string(),
            atom_line("ATOM", 1, "CA", "ALA", "A", 1, [0.0, 0.0, 0.0], "C"),
            "CONECT    1    2".to_string(),
            "END".to_string(),
        ]
        .join("\n");
        let model = StructureParser::strict().parse(&text).unwrap();
        assert_eq!(model.atom_count(), 1);
    }

    #[test]
    fn test_lenient_skips_malformed_atom() {
        let text = [
            atom_line("ATOM", 1, "CA", "ALA", "A", 1, [0.0, 0.0, 0.0], "C"),
            "ATOM      2  CA  ALA A   2".to_string(),
            atom_line("ATOM", 3, "CA", "ALA", "A", 3, [1.0, 0.0, 0.0], "C"),
        ]
        .join("\n");
        let model = StructureParser::default().parse(&text).unwrap();
        assert_eq!(model.atom_count(), 2);
    }

    #[test]
    fn test_strict_reports_missing_coordinate() {
        let text = [
            atom_line("ATOM", 1, "CA", "ALA", "A", 1, [0.0, 0.0, 0.0], "C"),
            "ATOM      2  CA  ALA A   2".to_string(),
        ]
        .join("\n");
        let err = StructureParser::strict().parse(&text).unwrap_err();
        assert_eq!(
            err,
            ParseError::MissingField { line: 2, record: "ATOM", field: "x" }
        );
    }

    #[test]
    fn test_strict_reports_malformed_residue_number() {
        let line = "ATOM      1  CA  ALA A  x1      11.104   6.134  -6.504  1.00  0.00           C";
        let err = StructureParser::strict().parse(line).unwrap_err();
        assert!(matches!(
            err,
            ParseError::MalformedField { line: 1, field: "residue number", .. }
        ));
    }

    #[test]
    fn test_duplicate_serials_retained() {
        let text = [
            atom_line("ATOM", 7, "N", "ALA", "A", 1, [0.0, 0.0, 0.0], "N"),
            atom_line("ATOM", 7, "CA", "ALA", "A", 1, [1.0, 0.0, 0.0], "C"),
        ]
        .join("\n");
        let model = StructureParser::strict().parse(&text).unwrap();
        assert_eq!(model.atom_count(), 2);
        assert!(model.atoms().iter().all(|a| a.serial == 7));
    }

    #[test]
    fn test_two_character_chain_id() {
        let mut lines = vec![helix_line("AB", 1, 2)];
        lines.extend(ca_trace("AB", 1..=3));
        let model = StructureParser::strict().parse(&lines.join("\n")).unwrap();

        assert!(model.atoms().iter().all(|a| a.chain_id == "AB"));
        assert_eq!(model.atoms()[0].secondary_structure, SecondaryStructure::Helix);
        assert_eq!(model.atoms()[2].secondary_structure, SecondaryStructure::Unknown);
        assert_eq!(model.bonds().len(), 2);
    }

    #[test]
    fn test_sheet_and_turn_ranges() {
        let mut lines = vec![sheet_line("A", 1, 2), turn_line("A", 3, 3)];
        lines.extend(ca_trace("A", 1..=4));
        let model = StructureParser::strict().parse(&lines.join("\n")).unwrap();
        let tags: Vec<_> = model.atoms().iter().map(|a| a.secondary_structure).collect();
        assert_eq!(
            tags,
            vec![
                SecondaryStructure::Sheet,
                SecondaryStructure::Sheet,
                SecondaryStructure::Coil,
                SecondaryStructure::Unknown,
            ]
        );
    }

    #[test]
    fn test_range_only_applies_to_its_chain() {
        let mut lines = vec![helix_line("A", 1, 3)];
        lines.extend(ca_trace("A", 1..=3));
        lines.extend(ca_trace("B", 1..=3));
        let model = StructureParser::strict().parse(&lines.join("\n")).unwrap();
        for atom in model.atoms() {
            let expected = if atom.chain_id == "A" {
                SecondaryStructure::Helix
            } else {
                SecondaryStructure::Unknown
            };
            assert_eq!(atom.secondary_structure, expected);
        }
    }

    #[test]
    fn test_bonds_break_at_gaps_and_chain_changes() {
        let mut lines = ca_trace("A", 1..=2);
        lines.extend(ca_trace("A", 4..=5));
        lines.extend(ca_trace("B", 6..=6));
        let model = StructureParser::strict().parse(&lines.join("\n")).unwrap();
        assert_eq!(model.bonds(), &[Bond::new(0, 1), Bond::new(2, 3)]);
    }

    #[test]
    fn test_hetero_calcium_is_not_backbone() {
        let text = [
            atom_line("ATOM", 1, "CA", "ALA", "A", 1, [0.0, 0.0, 0.0], "C"),
            atom_line("HETATM", 2, "CA", "CA", "A", 2, [5.0, 0.0, 0.0], ""),
        ]
        .join("\n");
        let model = StructureParser::strict().parse(&text).unwrap();
        let calcium = &model.atoms()[1];
        assert!(calcium.is_hetero);
        assert!(!calcium.is_backbone);
        assert_eq!(calcium.element, "CA");
        assert!(model.bonds().is_empty());
    }

    #[test]
    fn test_element_inferred_from_name() {
        let line = atom_line("ATOM", 1, "OD1", "ASP", "A", 1, [0.0, 0.0, 0.0], "");
        let model = StructureParser::strict().parse(&line).unwrap();
        assert_eq!(model.atoms()[0].element, "O");
    }

    #[test]
    fn test_header_title_and_first_model_only() {
        let text = [
            format!("{:<62}{}", "HEADER    OXYGEN TRANSPORT", "4HHB"),
            "TITLE     THE CRYSTAL STRUCTURE OF HUMAN".to_string(),
            "TITLE    2 DEOXYHAEMOGLOBIN".to_string(),
            "MODEL        1".to_string(),
            atom_line("ATOM", 1, "CA", "VAL", "A", 1, [0.0, 0.0, 0.0], "C"),
            "ENDMDL".to_string(),
            "MODEL        2".to_string(),
            atom_line("ATOM", 1, "CA", "VAL", "A", 1, [9.0, 0.0, 0.0], "C"),
            "ENDMDL".to_string(),
        ]
        .join("\n");
        let model = StructureParser::strict().parse(&text).unwrap();
        assert_eq!(model.entry_id(), Some("4HHB"));
        assert_eq!(
            model.title(),
            Some("THE CRYSTAL STRUCTURE OF HUMAN DEOXYHAEMOGLOBIN")
        );
        assert_eq!(model.atom_count(), 1);
    }

    #[test]
    fn test_non_ascii_line_does_not_panic() {
        let text = "ATOM  ééééé";
        assert!(StructureParser::default().parse(text).unwrap().is_empty());
    }
}
