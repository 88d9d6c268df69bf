//! Curated structure entry → canonical accession pairs.
//!
//! Checked before any network call. Entries here are authoritative for the
//! structures they cover.

/// (structure entry id, canonical accession)
pub const STATIC_ACCESSIONS: &[(&str, &str)] = &[
    ("1A4U", "P13569"), // CFTR
    ("1CRN", "P01542"), // crambin
    ("1UBQ", "P0CG48"), // ubiquitin
    ("2LYZ", "P00698"), // hen egg-white lysozyme
    ("4HHB", "P69905"), // haemoglobin alpha
    ("1HSG", "P04585"), // HIV-1 protease (Gag-Pol)
    ("1M17", "P00533"), // EGFR kinase domain
    ("2HYY", "P00519"), // ABL1 with imatinib
    ("1ATP", "P05132"), // PKA catalytic subunit
    ("1TUP", "P04637"), // p53 DNA-binding domain
    ("5P21", "P01112"), // H-Ras
    ("3EML", "P29274"), // adenosine A2A receptor
    ("6LU7", "P0DTD1"), // SARS-CoV-2 main protease (pp1ab)
    ("1GFL", "P42212"), // green fluorescent protein
];

pub fn lookup(entry_id: &str) -> Option<&'static str> {
    STATIC_ACCESSIONS
        .iter()
        .find(|(entry, _)| entry.eq_ignore_ascii_case(entry_id))
        .map(|(_, accession)| *accession)
}
