//! The ordered chain of repair operations.
//!
//! Each [`RepairOperation`] consumes the current structure by value and returns the repaired
//! structure together with the findings it acted on. Operations with nothing to do return the
//! structure unchanged and log that fact.

mod heavy_atoms;
mod hydrogens;
mod nonstandard;
mod residues;

use super::config::EngineConfig;
use super::error::PrepError;
use super::external::adapter::RepairAdapter;
use super::external::modeller::ModellerEngine;
use super::external::pdbfixer::PdbFixerEngine;
use super::external::CompletionEngine;
use super::findings::RepairFinding;
use crate::core::models::structure::StructureRecord;
use std::fmt;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RepairOperation {
    ReplaceNonStandardResidues,
    AddMissingHeavyAtoms,
    AddMissingResidues,
    AddMissingHydrogens { ph: f64 },
}

impl RepairOperation {
    pub fn apply(
        &self,
        structure: StructureRecord,
        context: &mut RepairContext,
    ) -> Result<RepairOutcome, PrepError> {
        match *self {
            Self::ReplaceNonStandardResidues => nonstandard::apply(structure, context),
            Self::AddMissingHeavyAtoms => heavy_atoms::apply(structure, context),
            Self::AddMissingResidues => residues::apply(structure, context),
            Self::AddMissingHydrogens { ph } => hydrogens::apply(structure, ph, context),
        }
    }

    fn builds_heavy_atoms(&self) -> bool {
        matches!(self, Self::AddMissingHeavyAtoms | Self::AddMissingResidues)
    }
}

impl fmt::Display for RepairOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReplaceNonStandardResidues => write!(f, "replace non-standard residues"),
            Self::AddMissingHeavyAtoms => write!(f, "add missing heavy atoms"),
            Self::AddMissingResidues => write!(f, "add missing residues"),
            Self::AddMissingHydrogens { ph } => write!(f, "add missing hydrogens (pH {ph})"),
        }
    }
}

/// Operations in the order they will run. Duplicates are allowed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepairPlan {
    operations: Vec<RepairOperation>,
}

impl RepairPlan {
    /// Builds a plan, warning about orderings that undo or invalidate earlier work.
    pub fn new(operations: Vec<RepairOperation>) -> Self {
        for message in order_warnings(&operations) {
            warn!("{}", message);
        }
        Self { operations }
    }

    pub fn operations(&self) -> &[RepairOperation] {
        &self.operations
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }
}

fn order_warnings(operations: &[RepairOperation]) -> Vec<String> {
    let mut messages = Vec::new();
    for (i, earlier) in operations.iter().enumerate() {
        for later in &operations[i + 1..] {
            if *later == RepairOperation::ReplaceNonStandardResidues && earlier.builds_heavy_atoms()
            {
                messages.push(format!(
                    "'{later}' is scheduled after '{earlier}'; residues it renames will be missing side-chain atoms"
                ));
            }
            if matches!(earlier, RepairOperation::AddMissingHydrogens { .. })
                && (later.builds_heavy_atoms()
                    || *later == RepairOperation::ReplaceNonStandardResidues)
            {
                messages.push(format!(
                    "'{earlier}' is scheduled before '{later}'; hydrogens should be placed last"
                ));
            }
        }
    }
    messages
}

/// Engines the repair operations delegate to.
pub struct RepairContext {
    adapter: RepairAdapter,
    completion: Option<Box<dyn CompletionEngine>>,
}

impl RepairContext {
    pub fn new(adapter: RepairAdapter, completion: Option<Box<dyn CompletionEngine>>) -> Self {
        Self {
            adapter,
            completion,
        }
    }

    /// pdbfixer for repair; MODELLER for completion when an interpreter is configured.
    pub fn from_config(config: &EngineConfig) -> Self {
        let engine = PdbFixerEngine::new(
            config.pdbfixer_executable.clone(),
            config.substitutions.clone(),
        );
        let completion = ModellerEngine::from_config(config)
            .map(|engine| Box::new(engine) as Box<dyn CompletionEngine>);
        Self::new(RepairAdapter::new(Box::new(engine)), completion)
    }
}

#[derive(Debug, Clone)]
pub struct RepairOutcome {
    pub structure: StructureRecord,
    pub findings: Vec<RepairFinding>,
}

impl RepairOutcome {
    fn unchanged(structure: StructureRecord) -> Self {
        Self {
            structure,
            findings: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::residue::HeteroFlag;
    use crate::core::models::structure::ResidueKey;
    use crate::engine::external::testing::{EngineCall, ScriptedCompletion, ScriptedEngine, parse};
    use crate::engine::findings::FindingKind;
    use std::collections::BTreeSet;

    const INCOMPLETE: &str = "\
SEQRES   1 A    3  SER MSE GLY
ATOM      1  N   SER A   1       0.000   0.000   0.000  1.00  0.00           N
ATOM      2  CA  SER A   1       1.000   0.000   0.000  1.00  0.00           C
ATOM      3  C   SER A   1       2.000   0.000   0.000  1.00  0.00           C
ATOM      4  O   SER A   1       3.000   0.000   0.000  1.00  0.00           O
HETATM    5  N   MSE A   2       4.000   0.000   0.000  1.00  0.00           N
HETATM    6  CA  MSE A   2       5.000   0.000   0.000  1.00  0.00           C
HETATM    7  C   MSE A   2       6.000   0.000   0.000  1.00  0.00           C
HETATM    8  O   MSE A   2       7.000   0.000   0.000  1.00  0.00           O
HETATM    9  CB  MSE A   2       5.000   1.000   0.000  1.00  0.00           C
HETATM   10 SE   MSE A   2       5.000   2.000   0.000  1.00  0.00          SE
";

    fn context() -> (RepairContext, ScriptedEngine) {
        let engine = ScriptedEngine::new();
        let context = RepairContext::new(RepairAdapter::new(Box::new(engine.clone())), None);
        (context, engine)
    }

    fn atom_set(structure: &StructureRecord) -> BTreeSet<(ResidueKey, String, String)> {
        structure
            .residue_ids()
            .into_iter()
            .flat_map(|id| {
                let key = structure.residue_key(id).unwrap();
                let residue = structure.residue(id).unwrap().name.clone();
                structure
                    .atoms_of(id)
                    .map(move |(_, atom)| (key, residue.clone(), atom.name.clone()))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    #[test]
    fn heavy_atom_completion_is_idempotent() {
        let (mut context, engine) = context();
        let first = RepairOperation::AddMissingHeavyAtoms
            .apply(parse(INCOMPLETE), &mut context)
            .unwrap();
        assert!(!first.findings.is_empty());
        let after_first = atom_set(&first.structure);

        let second = RepairOperation::AddMissingHeavyAtoms
            .apply(first.structure, &mut context)
            .unwrap();
        assert!(second.findings.is_empty());
        assert_eq!(atom_set(&second.structure), after_first);

        let completions = engine
            .calls()
            .iter()
            .filter(|c| matches!(c, EngineCall::AddMissingAtoms(_)))
            .count();
        assert_eq!(completions, 1);
    }

    #[test]
    fn heavy_atom_findings_cover_atoms_and_terminals() {
        let (mut context, _) = context();
        let outcome = RepairOperation::AddMissingHeavyAtoms
            .apply(parse(INCOMPLETE), &mut context)
            .unwrap();
        let kinds: Vec<_> = outcome
            .findings
            .iter()
            .map(|f| (f.kind, f.residue.as_str(), f.detail.as_str()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (FindingKind::MissingHeavyAtom, "1", "CB"),
                (FindingKind::MissingHeavyAtom, "1", "OG"),
                (FindingKind::MissingTerminalAtom, "1", "OXT"),
            ]
        );
    }

    #[test]
    fn nonstandard_residue_is_renamed_and_pruned_before_completion() {
        let engine = ScriptedEngine::new();
        let completion = ScriptedCompletion::new();
        let mut context = RepairContext::new(
            RepairAdapter::new(Box::new(engine)),
            Some(Box::new(completion.clone())),
        );

        let outcome = RepairOperation::ReplaceNonStandardResidues
            .apply(parse(INCOMPLETE), &mut context)
            .unwrap();
        assert_eq!(outcome.findings.len(), 1);
        assert_eq!(outcome.findings[0].kind, FindingKind::NonStandardResidue);
        assert_eq!(outcome.findings[0].detail, "MET");

        let received = completion.received();
        assert_eq!(received.len(), 1);
        let pruned = &received[0];
        let key = ResidueKey::new('A', 2);
        let residue_id = pruned.find_residue_by_key(&key).unwrap();
        let residue = pruned.residue(residue_id).unwrap();
        assert_eq!(residue.name, "MET");
        assert_eq!(residue.hetero_flag, HeteroFlag::Polymer);
        let names: Vec<_> = pruned
            .atoms_of(residue_id)
            .map(|(_, a)| a.name.clone())
            .collect();
        assert_eq!(names, vec!["N", "CA", "C", "O"]);

        let repaired = &outcome.structure;
        assert!(
            repaired
                .residue_ids()
                .into_iter()
                .all(|id| repaired.residue(id).unwrap().name != "MSE")
        );
        let residue_id = repaired.find_residue_by_key(&key).unwrap();
        let rebuilt: BTreeSet<_> = repaired
            .atoms_of(residue_id)
            .map(|(_, a)| a.name.clone())
            .collect();
        assert!(rebuilt.contains("SD") && rebuilt.contains("CE"));
    }

    #[test]
    fn nonstandard_replacement_falls_back_to_atom_completion() {
        let (mut context, engine) = context();
        let outcome = RepairOperation::ReplaceNonStandardResidues
            .apply(parse(INCOMPLETE), &mut context)
            .unwrap();
        assert!(matches!(
            engine.calls().last(),
            Some(EngineCall::AddMissingAtoms(state)) if state.missing_residues == Some(Vec::new())
        ));
        let residue_id = outcome
            .structure
            .find_residue_by_key(&ResidueKey::new('A', 2))
            .unwrap();
        assert_eq!(outcome.structure.atoms_of(residue_id).count(), 9);
    }

    #[test]
    fn no_nonstandard_residues_is_a_no_op() {
        let (mut context, engine) = context();
        let text: String = INCOMPLETE.lines().take(5).map(|l| format!("{l}\n")).collect();
        let outcome = RepairOperation::ReplaceNonStandardResidues
            .apply(parse(&text), &mut context)
            .unwrap();
        assert!(outcome.findings.is_empty());
        assert_eq!(outcome.structure.atom_count(), 4);
        assert_eq!(engine.calls(), vec![EngineCall::Load]);
    }

    #[test]
    fn missing_residues_are_built_from_seqres() {
        let (mut context, engine) = context();
        let outcome = RepairOperation::AddMissingResidues
            .apply(parse(INCOMPLETE), &mut context)
            .unwrap();
        let gaps: Vec<_> = outcome
            .findings
            .iter()
            .map(|f| (f.kind, f.residue.as_str(), f.residue_name.as_str()))
            .collect();
        assert_eq!(gaps, vec![(FindingKind::MissingResidue, "3", "GLY")]);
        assert!(matches!(
            engine.calls().last(),
            Some(EngineCall::AddMissingAtoms(state))
                if state.missing_atoms.as_ref().is_some_and(|m| m.is_empty())
        ));
        assert!(
            outcome
                .structure
                .find_residue_by_key(&ResidueKey::new('A', 3))
                .is_some()
        );
    }

    #[test]
    fn missing_residues_without_seqres_is_a_no_op() {
        let (mut context, _) = context();
        let text: String = INCOMPLETE.lines().skip(1).map(|l| format!("{l}\n")).collect();
        let outcome = RepairOperation::AddMissingResidues
            .apply(parse(&text), &mut context)
            .unwrap();
        assert!(outcome.findings.is_empty());
        assert_eq!(outcome.structure.atom_count(), 10);
    }

    #[test]
    fn hydrogens_reflect_only_the_latest_ph() {
        let (mut context, engine) = context();
        let neutral = RepairOperation::AddMissingHydrogens { ph: 7.0 }
            .apply(parse(INCOMPLETE), &mut context)
            .unwrap();
        let hydrogens = |s: &StructureRecord| {
            s.atom_ids()
                .into_iter()
                .filter_map(|id| s.atom(id))
                .filter(|a| a.is_hydrogen())
                .map(|a| (a.name.clone(), a.b_factor))
                .collect::<Vec<_>>()
        };
        assert_eq!(hydrogens(&neutral.structure).len(), 2);

        let acidic = RepairOperation::AddMissingHydrogens { ph: 5.0 }
            .apply(neutral.structure, &mut context)
            .unwrap();
        let placed = hydrogens(&acidic.structure);
        assert_eq!(placed.len(), 4);
        assert!(placed.iter().all(|(_, ph)| *ph == 5.0));
        assert_eq!(
            engine
                .calls()
                .into_iter()
                .filter(|c| matches!(c, EngineCall::AddMissingHydrogens(_)))
                .collect::<Vec<_>>(),
            vec![
                EngineCall::AddMissingHydrogens(7.0),
                EngineCall::AddMissingHydrogens(5.0)
            ]
        );
    }

    #[test]
    fn plan_keeps_order_and_duplicates() {
        let plan = RepairPlan::new(vec![
            RepairOperation::AddMissingHydrogens { ph: 7.0 },
            RepairOperation::AddMissingHydrogens { ph: 5.0 },
        ]);
        assert_eq!(plan.len(), 2);
        assert!(!plan.is_empty());
        assert_eq!(
            plan.operations()[1],
            RepairOperation::AddMissingHydrogens { ph: 5.0 }
        );
    }

    #[test]
    fn order_warnings_flag_inverted_steps() {
        use RepairOperation::*;
        assert!(
            order_warnings(&[
                ReplaceNonStandardResidues,
                AddMissingHeavyAtoms,
                AddMissingResidues,
                AddMissingHydrogens { ph: 7.0 },
            ])
            .is_empty()
        );
        assert_eq!(
            order_warnings(&[AddMissingHeavyAtoms, ReplaceNonStandardResidues]).len(),
            1
        );
        assert_eq!(
            order_warnings(&[AddMissingHydrogens { ph: 7.0 }, AddMissingResidues]).len(),
            1
        );
    }

    #[test]
    fn operations_display_their_parameters() {
        assert_eq!(
            RepairOperation::AddMissingHydrogens { ph: 7.4 }.to_string(),
            "add missing hydrogens (pH 7.4)"
        );
    }
}
