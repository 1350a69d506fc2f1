use super::config::SelectionPolicy;
use super::error::PrepError;
use super::selector::SanitizingSelector;
use crate::core::io::format::StructureFormat;
use crate::core::io::traits::ParsedStructure;
use crate::core::io::warnings::StructuralWarning;
use std::io::BufRead;
use std::path::Path;
use tracing::{debug, warn};

/// Output of one sanitization pass: the filtered structure re-serialized in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedStructure {
    pub contents: String,
    pub format: StructureFormat,
    pub warning_count: usize,
    pub disorder_groups: usize,
}

/// Turns a raw structure into a single-model, disorder-free record according to a
/// [`SelectionPolicy`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Sanitizer {
    policy: SelectionPolicy,
}

impl Sanitizer {
    pub fn new(policy: SelectionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &SelectionPolicy {
        &self.policy
    }

    /// Parses `reader`, filters the structure through a [`SanitizingSelector`] and writes the
    /// result into a new in-memory buffer of the same format.
    ///
    /// # Errors
    ///
    /// * [`PrepError::StructureParse`] if nothing could be parsed.
    /// * [`PrepError::Configuration`] if the policy's model does not exist; nothing is written.
    pub fn sanitize(
        &self,
        reader: &mut impl BufRead,
        format: StructureFormat,
        source_name: &str,
    ) -> Result<SanitizedStructure, PrepError> {
        let parsed = parse_logged(reader, format, source_name)?;
        let structure = parsed.structure;

        let selector = SanitizingSelector::new(&structure, self.policy);
        let contents = format
            .write_to_string(&structure, &selector)
            .map_err(|e| PrepError::from_write("sanitized buffer", e))?;

        debug!(
            source = source_name,
            bytes = contents.len(),
            "Sanitized structure written to buffer"
        );

        Ok(SanitizedStructure {
            contents,
            format,
            warning_count: parsed.warnings.len(),
            disorder_groups: selector.resolver().group_count(),
        })
    }
}

/// Parses a structure and logs every tolerated problem at WARN, prefixed with `source_name`.
pub fn parse_logged(
    reader: &mut impl BufRead,
    format: StructureFormat,
    source_name: &str,
) -> Result<ParsedStructure, PrepError> {
    let id = Path::new(source_name)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| source_name.to_string());
    let parsed = format
        .read(reader, &id)
        .map_err(|e| PrepError::from_parse(source_name, e))?;
    log_warnings(source_name, &parsed.warnings);
    Ok(parsed)
}

pub fn log_warnings(source_name: &str, warnings: &[StructuralWarning]) {
    for warning in warnings {
        warn!("{}: {}", source_name, warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::pdb::PdbFile;
    use crate::core::io::selection::Selection;
    use crate::core::io::traits::StructureFile;
    use std::collections::BTreeSet;
    use std::io::Cursor;

    const RAW: &str = "\
SEQRES   1 A    2  GLY SER
SEQRES   1 B    1  ALA
MODEL        1
ATOM      1  N   GLY A   1       0.000   0.000   0.000  1.00  0.00           N
ATOM      2  CA  GLY A   1       1.000   0.000   0.000  1.00  0.00           C
ATOM      3  OG ASER A   2       2.000   0.000   0.000  0.30  0.00           O
ATOM      4  OG BSER A   2       2.100   0.000   0.000  0.70  0.00           O
ATOM      5  CA  ALA B   1       4.000   0.000   0.000  1.00  0.00           C
HETATM    6  O   HOH B 301       9.000   0.000   0.000  1.00  0.00           O
HETATM    7  C1  NAG B 401       8.000   0.000   0.000  1.00  0.00           C
ENDMDL
MODEL        2
ATOM      8  N   GLY A   1       0.000   5.000   0.000  1.00  0.00           N
ATOM      9  OG ASER A   2       2.000   5.000   0.000  0.30  0.00           O
ATOM     10  OG BSER A   2       2.100   5.000   0.000  0.70  0.00           O
HETATM   11  O   HOH A 301       9.000   5.000   0.000  1.00  0.00           O
ENDMDL
";

    fn sanitize(policy: SelectionPolicy) -> Result<SanitizedStructure, PrepError> {
        Sanitizer::new(policy).sanitize(&mut Cursor::new(RAW), StructureFormat::Pdb, "raw.pdb")
    }

    fn reparse(text: &str) -> crate::core::models::structure::StructureRecord {
        PdbFile::read_from(&mut Cursor::new(text), "out").unwrap().structure
    }

    fn serials(structure: &crate::core::models::structure::StructureRecord) -> Vec<usize> {
        structure
            .atom_ids()
            .into_iter()
            .map(|id| structure.atom(id).unwrap().serial)
            .collect()
    }

    #[test]
    fn output_holds_exactly_the_target_model() {
        for (model_id, expected) in [(0, vec![1, 2, 3, 5, 6, 7]), (1, vec![8, 9, 11])] {
            let policy = SelectionPolicy {
                model_id,
                ..Default::default()
            };
            let output = sanitize(policy).unwrap();
            assert!(!output.contents.contains("MODEL"));
            let structure = reparse(&output.contents);
            assert_eq!(structure.model_count(), 1);
            assert_eq!(serials(&structure), expected);
        }
    }

    #[test]
    fn absent_model_is_a_configuration_error() {
        let policy = SelectionPolicy {
            model_id: 5,
            ..Default::default()
        };
        assert!(matches!(sanitize(policy), Err(PrepError::Configuration(_))));
    }

    #[test]
    fn unparsable_input_is_a_parse_error() {
        let err = Sanitizer::default()
            .sanitize(&mut Cursor::new("HEADER only\n"), StructureFormat::Pdb, "bad.pdb")
            .unwrap_err();
        assert!(matches!(err, PrepError::StructureParse { .. }));
    }

    #[test]
    fn at_most_one_atom_per_disorder_group_survives() {
        let structure = reparse(&sanitize(SelectionPolicy::default()).unwrap().contents);
        let mut seen = BTreeSet::new();
        for residue_id in structure.residue_ids() {
            for (_, atom) in structure.atoms_of(residue_id) {
                assert!(seen.insert((residue_id, atom.name.clone())));
            }
        }
    }

    #[test]
    fn water_removal_is_complete_and_optional() {
        let with_water = reparse(&sanitize(SelectionPolicy::default()).unwrap().contents);
        let water_count = |s: &crate::core::models::structure::StructureRecord| {
            s.residue_ids()
                .into_iter()
                .filter(|&id| s.residue(id).unwrap().is_water())
                .map(|id| s.atoms_of(id).count())
                .sum::<usize>()
        };
        assert_eq!(water_count(&with_water), 1);

        let policy = SelectionPolicy {
            remove_water: true,
            ..Default::default()
        };
        let without_water = reparse(&sanitize(policy).unwrap().contents);
        assert_eq!(water_count(&without_water), 0);
    }

    #[test]
    fn hetero_removal_spares_water() {
        let policy = SelectionPolicy {
            remove_hetero: true,
            ..Default::default()
        };
        let structure = reparse(&sanitize(policy).unwrap().contents);
        let names: Vec<_> = structure
            .residue_ids()
            .into_iter()
            .map(|id| structure.residue(id).unwrap().name.clone())
            .collect();
        assert_eq!(names, vec!["GLY", "SER", "ALA", "HOH"]);
    }

    #[test]
    fn round_trip_matches_the_in_memory_selection() {
        let policy = SelectionPolicy {
            model_id: 0,
            remove_water: true,
            ..Default::default()
        };
        let raw = PdbFile::read_from(&mut Cursor::new(RAW), "raw").unwrap().structure;
        let selector = SanitizingSelector::new(&raw, policy);
        let selection = Selection::collect(&raw, &selector).unwrap();
        let expected: Vec<_> = selection
            .atom_ids()
            .map(|id| raw.atom(id).unwrap().serial)
            .collect();

        let output = sanitize(policy).unwrap();
        let structure = reparse(&output.contents);
        assert_eq!(structure.model_count(), 1);
        assert_eq!(serials(&structure), expected);
        let model = structure.find_model(0).unwrap();
        let chains: Vec<_> = structure.chains_of(model).map(|(_, c)| c.id).collect();
        assert_eq!(chains, selection.chain_ids(&raw));
        assert_eq!(structure.header.seqres.len(), 2);
    }

    #[test]
    fn reports_disorder_groups_and_warnings() {
        let output = sanitize(SelectionPolicy::default()).unwrap();
        assert_eq!(output.disorder_groups, 2);
        assert_eq!(output.warning_count, 0);
        assert_eq!(output.format, StructureFormat::Pdb);
    }
}
