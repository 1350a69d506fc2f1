use super::repair::{RepairOperation, RepairPlan};
use crate::core::residues::SubstitutionTable;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_PH: f64 = 7.0;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Which parts of the raw structure survive sanitization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionPolicy {
    /// Zero-based index of the model to keep.
    pub model_id: usize,
    /// Keep one member per disorder group.
    pub remove_disorder: bool,
    pub remove_water: bool,
    /// Drop hetero groups (ligands, ions, modified residues). Water is governed separately.
    pub remove_hetero: bool,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            model_id: 0,
            remove_disorder: true,
            remove_water: false,
            remove_hetero: false,
        }
    }
}

/// Settings of the external repair and completion engines.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Executable of the atom/residue repair engine.
    pub pdbfixer_executable: PathBuf,
    /// Python interpreter with MODELLER installed; enables comparative-modeling completion.
    pub modeller_python: Option<PathBuf>,
    pub modeller_topology: Vec<String>,
    pub modeller_parameters: String,
    pub include_hetatm: bool,
    pub include_water: bool,
    /// Keep the original residue numbering in completed models.
    pub transfer_res_num: bool,
    pub substitutions: SubstitutionTable,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pdbfixer_executable: PathBuf::from("pdbfixer"),
            modeller_python: None,
            modeller_topology: vec!["$(LIB)/top_heav.lib".into(), "$(LIB)/top_allh.lib".into()],
            modeller_parameters: "$(LIB)/par.lib".into(),
            include_hetatm: true,
            include_water: true,
            transfer_res_num: false,
            substitutions: SubstitutionTable::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrepareConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub selection: SelectionPolicy,
    pub plan: RepairPlan,
    pub engines: EngineConfig,
}

#[derive(Default)]
pub struct PrepareConfigBuilder {
    input_path: Option<PathBuf>,
    output_path: Option<PathBuf>,
    selection: Option<SelectionPolicy>,
    operations: Vec<RepairOperation>,
    engines: Option<EngineConfig>,
}

impl PrepareConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_path = Some(path.into());
        self
    }
    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }
    pub fn selection(mut self, policy: SelectionPolicy) -> Self {
        self.selection = Some(policy);
        self
    }
    pub fn operation(mut self, operation: RepairOperation) -> Self {
        self.operations.push(operation);
        self
    }
    pub fn operations(mut self, operations: impl IntoIterator<Item = RepairOperation>) -> Self {
        self.operations.extend(operations);
        self
    }
    pub fn engines(mut self, engines: EngineConfig) -> Self {
        self.engines = Some(engines);
        self
    }

    pub fn build(self) -> Result<PrepareConfig, ConfigError> {
        for operation in &self.operations {
            if let RepairOperation::AddMissingHydrogens { ph } = operation {
                if !ph.is_finite() {
                    return Err(ConfigError::InvalidParameter {
                        name: "ph",
                        reason: format!("{ph} is not a finite number"),
                    });
                }
            }
        }

        Ok(PrepareConfig {
            input_path: self
                .input_path
                .ok_or(ConfigError::MissingParameter("input_path"))?,
            output_path: self
                .output_path
                .ok_or(ConfigError::MissingParameter("output_path"))?,
            selection: self.selection.unwrap_or_default(),
            plan: RepairPlan::new(self.operations),
            engines: self.engines.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_behaviour() {
        let policy = SelectionPolicy::default();
        assert_eq!(policy.model_id, 0);
        assert!(policy.remove_disorder);
        assert!(!policy.remove_water);
        assert!(!policy.remove_hetero);

        let engines = EngineConfig::default();
        assert_eq!(engines.pdbfixer_executable, PathBuf::from("pdbfixer"));
        assert!(engines.modeller_python.is_none());
        assert!(engines.include_hetatm && engines.include_water);
    }

    #[test]
    fn build_requires_input_and_output() {
        let err = PrepareConfigBuilder::new()
            .output_path("out.pdb")
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingParameter("input_path"));

        let err = PrepareConfigBuilder::new()
            .input_path("in.pdb")
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingParameter("output_path"));
    }

    #[test]
    fn build_keeps_operation_order() {
        let config = PrepareConfigBuilder::new()
            .input_path("in.pdb")
            .output_path("out.pdb")
            .operation(RepairOperation::ReplaceNonStandardResidues)
            .operation(RepairOperation::AddMissingHeavyAtoms)
            .operation(RepairOperation::AddMissingHydrogens { ph: 7.4 })
            .build()
            .unwrap();
        assert_eq!(
            config.plan.operations(),
            &[
                RepairOperation::ReplaceNonStandardResidues,
                RepairOperation::AddMissingHeavyAtoms,
                RepairOperation::AddMissingHydrogens { ph: 7.4 },
            ]
        );
    }

    #[test]
    fn non_finite_ph_is_rejected_but_extreme_values_pass() {
        let err = PrepareConfigBuilder::new()
            .input_path("in.pdb")
            .output_path("out.pdb")
            .operation(RepairOperation::AddMissingHydrogens { ph: f64::NAN })
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidParameter { name: "ph", .. }));

        assert!(
            PrepareConfigBuilder::new()
                .input_path("in.pdb")
                .output_path("out.pdb")
                .operation(RepairOperation::AddMissingHydrogens { ph: 15.0 })
                .build()
                .is_ok()
        );
    }
}
