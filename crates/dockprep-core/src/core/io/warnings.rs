use crate::core::models::builder::BuildConflict;
use std::fmt;

/// Non-fatal problem found while parsing; the offending record is skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralWarning {
    /// 1-based line number in the source text.
    pub line: usize,
    pub kind: WarningKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarningKind {
    /// Record shorter than its mandatory columns.
    TruncatedRecord { length: usize },
    /// A numeric field could not be parsed.
    InvalidNumber { field: &'static str, value: String },
    /// The record conflicts with data already in the structure.
    Conflict(BuildConflict),
    /// A multi-character chain id was stored under a free single-character id.
    ChainRenamed { from: String, to: char },
    /// The line held bytes that are not valid UTF-8; they were replaced before parsing.
    InvalidEncoding,
}

impl StructuralWarning {
    pub fn new(line: usize, kind: WarningKind) -> Self {
        Self { line, kind }
    }
}

impl fmt::Display for StructuralWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: ", self.line)?;
        match &self.kind {
            WarningKind::TruncatedRecord { length } => {
                write!(f, "record too short ({length} columns), skipped")
            }
            WarningKind::InvalidNumber { field, value } => {
                write!(f, "invalid {field} '{value}', record skipped")
            }
            WarningKind::Conflict(conflict) => write!(f, "{conflict}, record skipped"),
            WarningKind::ChainRenamed { from, to } => {
                write!(f, "chain id '{from}' stored as '{to}'")
            }
            WarningKind::InvalidEncoding => {
                write!(f, "invalid UTF-8 replaced with U+FFFD")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::residue::ResidueNumber;

    #[test]
    fn display_includes_line_and_reason() {
        let warning = StructuralWarning::new(
            12,
            WarningKind::InvalidNumber {
                field: "x coordinate",
                value: "abc".into(),
            },
        );
        assert_eq!(
            warning.to_string(),
            "line 12: invalid x coordinate 'abc', record skipped"
        );
    }

    #[test]
    fn conflict_warnings_render_the_conflict() {
        let warning = StructuralWarning::new(
            3,
            WarningKind::Conflict(BuildConflict::DuplicateAtom {
                chain: 'A',
                number: ResidueNumber::from(5),
                atom: "CA".into(),
                alt_loc: None,
            }),
        );
        assert!(warning.to_string().contains("duplicate atom 'CA'"));
    }

    #[test]
    fn chain_renames_show_both_ids() {
        let warning = StructuralWarning::new(
            40,
            WarningKind::ChainRenamed {
                from: "AB".into(),
                to: 'a',
            },
        );
        assert_eq!(warning.to_string(), "line 40: chain id 'AB' stored as 'a'");
    }
}
