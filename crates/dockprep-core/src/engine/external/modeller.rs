use super::CompletionEngine;
use super::error::EngineError;
use super::handoff::Handoff;
use super::process::run_tool;
use crate::core::models::structure::StructureRecord;
use crate::engine::config::EngineConfig;
use std::path::PathBuf;
use tracing::info;

const TOOL: &str = "modeller";
const INPUT_FILE: &str = "input.pdb";
const OUTPUT_FILE: &str = "output.pdb";
const SCRIPT_FILE: &str = "complete.py";

/// Driver run inside the MODELLER-enabled interpreter.
///
/// Arguments: input, output, transfer flag, hetatm flag, water flag, parameter library, then
/// one or more topology libraries.
const COMPLETE_PDB_SCRIPT: &str = r#"import sys

from modeller import Environ
from modeller.scripts import complete_pdb

source, target, transfer, hetatm, water, parameters = sys.argv[1:7]
topologies = sys.argv[7:]

env = Environ()
for topology in topologies:
    env.libs.topology.read(file=topology)
env.libs.parameters.read(file=parameters)
env.io.hetatm = hetatm == "1"
env.io.water = water == "1"

model = complete_pdb(env, source, transfer_res_num=transfer == "1")
model.write(file=target, model_format="PDB")
"#;

/// Comparative-modeling completion through MODELLER's `complete_pdb`.
#[derive(Debug, Clone, PartialEq)]
pub struct ModellerEngine {
    python: PathBuf,
    topology: Vec<String>,
    parameters: String,
    include_hetatm: bool,
    include_water: bool,
    transfer_res_num: bool,
    script: String,
}

impl ModellerEngine {
    /// Returns `None` unless a MODELLER interpreter is configured.
    pub fn from_config(config: &EngineConfig) -> Option<Self> {
        let python = config.modeller_python.clone()?;
        Some(Self {
            python,
            topology: config.modeller_topology.clone(),
            parameters: config.modeller_parameters.clone(),
            include_hetatm: config.include_hetatm,
            include_water: config.include_water,
            transfer_res_num: config.transfer_res_num,
            script: COMPLETE_PDB_SCRIPT.to_string(),
        })
    }

    fn args(&self, script: String, input: String, output: String) -> Vec<String> {
        let flag = |on: bool| String::from(if on { "1" } else { "0" });
        let mut args = vec![
            script,
            input,
            output,
            flag(self.transfer_res_num),
            flag(self.include_hetatm),
            flag(self.include_water),
            self.parameters.clone(),
        ];
        args.extend(self.topology.iter().cloned());
        args
    }
}

impl CompletionEngine for ModellerEngine {
    fn name(&self) -> &str {
        TOOL
    }

    fn complete(&self, structure: &StructureRecord) -> Result<StructureRecord, EngineError> {
        let handoff = Handoff::new(TOOL)?;
        let script = handoff.write_text(SCRIPT_FILE, &self.script)?;
        let input = handoff.write_structure(INPUT_FILE, structure)?;
        let args = self.args(
            script.to_string_lossy().to_string(),
            input.to_string_lossy().to_string(),
            handoff.path(OUTPUT_FILE).to_string_lossy().to_string(),
        );

        info!(
            transfer_res_num = self.transfer_res_num,
            "Completing structure with MODELLER"
        );
        run_tool(TOOL, &self.python, &args, handoff.dir())?;

        let mut completed = handoff.read_structure(OUTPUT_FILE)?;
        completed.header = structure.header.clone();
        handoff.close()?;
        Ok(completed)
    }
}
