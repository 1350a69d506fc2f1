use super::defaults::DefaultsConfig;
use super::file::{FileConfig, FileEnginesConfig, FileRepairConfig, FileSanitizeConfig};
use super::models::{AppConfig, InspectConfig};
use crate::cli::{InspectArgs, PrepareArgs, SanitizeArgs};
use crate::error::{CliError, Result};
use dockprep::core::residues::SubstitutionTable;
use dockprep::engine::config::{EngineConfig, PrepareConfigBuilder, SelectionPolicy};
use dockprep::engine::repair::RepairOperation;
use std::path::Path;
use tracing::{debug, warn};

pub fn build_prepare_config(args: &PrepareArgs) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();
    let mut file_config = load_file(&args.sanitize)?;

    let sanitize_file = file_config.sanitize.take().unwrap_or_default();
    let repair_file = file_config.repair.take().unwrap_or_default();
    let engines_file = file_config.engines.take().unwrap_or_default();

    let selection = merge_selection(&args.sanitize, &sanitize_file, &defaults);
    let substitutions = load_substitutions(
        args.sanitize.substitutions.as_deref(),
        repair_file.substitutions.as_deref(),
    )?;
    let operations = merge_operations(args, &repair_file, &defaults);
    let engines = merge_engines(args, engines_file, substitutions, &defaults);

    let core_config = PrepareConfigBuilder::new()
        .input_path(&args.sanitize.input)
        .output_path(&args.output)
        .selection(selection)
        .operations(operations)
        .engines(engines)
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    Ok(AppConfig {
        core_config,
        report_path: args.sanitize.report.clone(),
    })
}

pub fn build_inspect_config(args: &InspectArgs) -> Result<InspectConfig> {
    let defaults = DefaultsConfig::default();
    let mut file_config = load_file(&args.sanitize)?;

    let sanitize_file = file_config.sanitize.take().unwrap_or_default();
    let repair_file = file_config.repair.take().unwrap_or_default();

    Ok(InspectConfig {
        input_path: args.sanitize.input.clone(),
        selection: merge_selection(&args.sanitize, &sanitize_file, &defaults),
        substitutions: load_substitutions(
            args.sanitize.substitutions.as_deref(),
            repair_file.substitutions.as_deref(),
        )?,
        report_path: args.sanitize.report.clone(),
    })
}

fn load_file(args: &SanitizeArgs) -> Result<FileConfig> {
    match &args.config {
        Some(path) => FileConfig::from_file(path),
        None => Ok(FileConfig::default()),
    }
}

fn merge_selection(
    args: &SanitizeArgs,
    file: &FileSanitizeConfig,
    defaults: &DefaultsConfig,
) -> SelectionPolicy {
    SelectionPolicy {
        model_id: args.model.or(file.model).unwrap_or(defaults.model_id),
        remove_disorder: if args.keep_disorder {
            false
        } else {
            file.remove_disorder.unwrap_or(defaults.remove_disorder)
        },
        remove_water: args.remove_water || file.remove_water.unwrap_or(defaults.remove_water),
        remove_hetero: args.remove_hetero || file.remove_hetero.unwrap_or(defaults.remove_hetero),
    }
}

/// Enabled steps in their recommended order: identity fixes, then residues, atoms, hydrogens.
fn merge_operations(
    args: &PrepareArgs,
    file: &FileRepairConfig,
    defaults: &DefaultsConfig,
) -> Vec<RepairOperation> {
    let enabled = |flag: bool, from_file: Option<bool>| flag || from_file.unwrap_or(false);
    let ph = args.ph.or(file.ph).unwrap_or(defaults.ph);

    let mut operations = Vec::new();
    if enabled(args.replace_nonstandard, file.replace_nonstandard) {
        operations.push(RepairOperation::ReplaceNonStandardResidues);
    }
    if enabled(args.add_missing_residues, file.add_missing_residues) {
        operations.push(RepairOperation::AddMissingResidues);
    }
    if enabled(args.add_missing_atoms, file.add_missing_atoms) {
        operations.push(RepairOperation::AddMissingHeavyAtoms);
    }
    if enabled(args.add_hydrogens, file.add_hydrogens) {
        operations.push(RepairOperation::AddMissingHydrogens { ph });
    } else if args.ph.is_some() {
        warn!("--ph is ignored because hydrogens are not being added.");
    }
    debug!("Repair plan assembled: {:?}", operations);
    operations
}

fn merge_engines(
    args: &PrepareArgs,
    file: FileEnginesConfig,
    substitutions: SubstitutionTable,
    defaults: &DefaultsConfig,
) -> EngineConfig {
    EngineConfig {
        pdbfixer_executable: args
            .pdbfixer
            .clone()
            .or(file.pdbfixer)
            .unwrap_or_else(|| defaults.pdbfixer.clone()),
        modeller_python: args.modeller_python.clone().or(file.modeller_python),
        modeller_topology: file
            .modeller_topology
            .unwrap_or_else(|| defaults.modeller_topology.clone()),
        modeller_parameters: file
            .modeller_parameters
            .unwrap_or_else(|| defaults.modeller_parameters.clone()),
        include_hetatm: file.include_hetatm.unwrap_or(defaults.include_hetatm),
        include_water: file.include_water.unwrap_or(defaults.include_water),
        transfer_res_num: args.transfer_res_num
            || file.transfer_res_num.unwrap_or(defaults.transfer_res_num),
        substitutions,
    }
}

fn load_substitutions(cli: Option<&Path>, file: Option<&Path>) -> Result<SubstitutionTable> {
    match cli.or(file) {
        Some(path) => {
            debug!("Loading residue substitutions from {:?}", path);
            Ok(SubstitutionTable::load(path)?)
        }
        None => Ok(SubstitutionTable::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn base_prepare_args() -> PrepareArgs {
        PrepareArgs {
            sanitize: SanitizeArgs {
                input: PathBuf::from("in.pdb"),
                ..SanitizeArgs::default()
            },
            output: PathBuf::from("out.pdb"),
            ..PrepareArgs::default()
        }
    }

    #[test]
    fn defaults_apply_without_file_or_flags() {
        let app = build_prepare_config(&base_prepare_args()).unwrap();
        let config = app.core_config;
        assert_eq!(config.selection, SelectionPolicy::default());
        assert!(config.plan.is_empty());
        assert_eq!(config.engines.pdbfixer_executable, PathBuf::from("pdbfixer"));
        assert!(config.engines.modeller_python.is_none());
        assert!(app.report_path.is_none());
    }

    #[test]
    fn flags_assemble_the_plan_in_recommended_order() {
        let mut args = base_prepare_args();
        args.add_hydrogens = true;
        args.add_missing_atoms = true;
        args.replace_nonstandard = true;
        args.add_missing_residues = true;
        args.ph = Some(5.5);

        let config = build_prepare_config(&args).unwrap().core_config;
        assert_eq!(
            config.plan.operations(),
            &[
                RepairOperation::ReplaceNonStandardResidues,
                RepairOperation::AddMissingResidues,
                RepairOperation::AddMissingHeavyAtoms,
                RepairOperation::AddMissingHydrogens { ph: 5.5 },
            ]
        );
    }

    #[test]
    fn cli_overrides_file_and_file_overrides_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("dockprep.toml");
        fs::write(
            &config_path,
            r#"
[sanitize]
model = 3
remove-disorder = false
remove-hetero = true

[repair]
add-hydrogens = true
ph = 6.0

[engines]
pdbfixer = "/opt/bin/pdbfixer"
include-water = false
"#,
        )
        .unwrap();

        let mut args = base_prepare_args();
        args.sanitize.config = Some(config_path);
        args.sanitize.model = Some(1);
        args.pdbfixer = Some(PathBuf::from("/usr/local/bin/pdbfixer"));

        let config = build_prepare_config(&args).unwrap().core_config;
        assert_eq!(config.selection.model_id, 1);
        assert!(!config.selection.remove_disorder);
        assert!(config.selection.remove_hetero);
        assert!(!config.selection.remove_water);
        assert_eq!(
            config.plan.operations(),
            &[RepairOperation::AddMissingHydrogens { ph: 6.0 }]
        );
        assert_eq!(
            config.engines.pdbfixer_executable,
            PathBuf::from("/usr/local/bin/pdbfixer")
        );
        assert!(!config.engines.include_water);
        assert!(config.engines.include_hetatm);
    }

    #[test]
    fn non_finite_ph_is_a_configuration_error() {
        let mut args = base_prepare_args();
        args.add_hydrogens = true;
        args.ph = Some(f64::NAN);
        assert!(matches!(
            build_prepare_config(&args),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn substitutions_file_is_loaded_and_validated() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("good.toml");
        fs::write(&good, "XYZ = \"ALA\"\n").unwrap();
        let bad = dir.path().join("bad.toml");
        fs::write(&bad, "XYZ = \"HOH\"\n").unwrap();

        let mut args = InspectArgs::default();
        args.sanitize.input = PathBuf::from("in.pdb");
        args.sanitize.substitutions = Some(good);
        let config = build_inspect_config(&args).unwrap();
        assert_eq!(config.substitutions.standard_for("XYZ"), Some("ALA"));

        args.sanitize.substitutions = Some(bad);
        assert!(matches!(
            build_inspect_config(&args),
            Err(CliError::Substitutions(_))
        ));
    }

    #[test]
    fn keep_disorder_flag_wins_over_file() {
        let mut args = InspectArgs::default();
        args.sanitize.input = PathBuf::from("in.pdb");
        args.sanitize.keep_disorder = true;
        args.sanitize.remove_water = true;
        let config = build_inspect_config(&args).unwrap();
        assert!(!config.selection.remove_disorder);
        assert!(config.selection.remove_water);
    }
}
