use super::error::EngineError;
use super::handoff::Handoff;
use super::process::run_tool;
use super::{EngineState, RepairEngine};
use crate::core::models::structure::StructureRecord;
use crate::core::residues::SubstitutionTable;
use std::path::PathBuf;
use tracing::info;

const TOOL: &str = "pdbfixer";
const INPUT_FILE: &str = "input.pdb";
const OUTPUT_FILE: &str = "output.pdb";

/// Repair engine backed by the `pdbfixer` command-line tool.
///
/// Detection and non-standard replacement run in-process. Atom, residue and hydrogen
/// completion hand the structure to `pdbfixer` and read its output back; the bookkeeping
/// decides which of the tool's completion passes are switched on.
#[derive(Debug, Clone)]
pub struct PdbFixerEngine {
    executable: PathBuf,
    substitutions: SubstitutionTable,
    structure: Option<StructureRecord>,
    state: EngineState,
    #[cfg(test)]
    launcher: Option<PathBuf>,
}

impl PdbFixerEngine {
    pub fn new(executable: impl Into<PathBuf>, substitutions: SubstitutionTable) -> Self {
        Self {
            executable: executable.into(),
            substitutions,
            structure: None,
            state: EngineState::default(),
            #[cfg(test)]
            launcher: None,
        }
    }

    fn completion_args(state: &EngineState) -> Vec<String> {
        let atoms_needed = state.missing_atoms.iter().flatten().next().is_some()
            || state.missing_terminals.iter().flatten().next().is_some();
        let residues_needed = state.missing_residues.iter().flatten().next().is_some();

        let mut args = vec![if atoms_needed {
            "--add-atoms=heavy".to_string()
        } else {
            "--add-atoms=none".to_string()
        }];
        if residues_needed {
            args.push("--add-residues".to_string());
        }
        args
    }

    fn hydrogen_args(ph: f64) -> Vec<String> {
        vec!["--add-atoms=hydrogen".to_string(), format!("--ph={ph}")]
    }

    /// Runs the tool on the held structure with the given switches and installs its output.
    fn run(&mut self, switches: Vec<String>) -> Result<(), EngineError> {
        let structure = self.structure.as_ref().ok_or(EngineError::NoStructure)?;
        let handoff = Handoff::new(TOOL)?;
        let input = handoff.write_structure(INPUT_FILE, structure)?;

        let mut args = vec![input.to_string_lossy().to_string()];
        args.extend(switches);
        args.push("--keep-heterogens=all".to_string());
        args.push(format!("--output={}", handoff.path(OUTPUT_FILE).display()));

        info!("Running {} {}", TOOL, args[1..].join(" "));
        self.invoke(&args, &handoff)?;

        let mut repaired = handoff.read_structure(OUTPUT_FILE)?;
        repaired.header = structure.header.clone();
        handoff.close()?;

        self.structure = Some(repaired);
        Ok(())
    }

    #[cfg(not(test))]
    fn invoke(&self, args: &[String], handoff: &Handoff) -> Result<(), EngineError> {
        run_tool(TOOL, &self.executable, args, handoff.dir()).map(|_| ())
    }

    #[cfg(test)]
    fn invoke(&self, args: &[String], handoff: &Handoff) -> Result<(), EngineError> {
        match &self.launcher {
            Some(launcher) => {
                let mut full = vec![self.executable.to_string_lossy().to_string()];
                full.extend(args.iter().cloned());
                run_tool(TOOL, launcher, full, handoff.dir()).map(|_| ())
            }
            None => run_tool(TOOL, &self.executable, args, handoff.dir()).map(|_| ()),
        }
    }
}

impl RepairEngine for PdbFixerEngine {
    fn name(&self) -> &str {
        TOOL
    }

    fn substitutions(&self) -> &SubstitutionTable {
        &self.substitutions
    }

    fn load(&mut self, structure: StructureRecord) {
        self.structure = Some(structure);
        self.state = EngineState::default();
    }

    fn unload(&mut self) -> Option<StructureRecord> {
        self.state = EngineState::default();
        self.structure.take()
    }

    fn structure(&self) -> Option<&StructureRecord> {
        self.structure.as_ref()
    }

    fn structure_mut(&mut self) -> Option<&mut StructureRecord> {
        self.structure.as_mut()
    }

    fn state(&self) -> &EngineState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut EngineState {
        &mut self.state
    }

    fn add_missing_atoms(&mut self) -> Result<(), EngineError> {
        self.state.require_completion_state("add_missing_atoms")?;
        let switches = Self::completion_args(&self.state);
        self.run(switches)
    }

    fn add_missing_hydrogens(&mut self, ph: f64) -> Result<(), EngineError> {
        self.run(Self::hydrogen_args(ph))
    }
}
