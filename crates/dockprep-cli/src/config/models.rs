use dockprep::core::residues::SubstitutionTable;
use dockprep::engine::config::{PrepareConfig, SelectionPolicy};
use std::path::PathBuf;

pub struct AppConfig {
    pub core_config: PrepareConfig,
    pub report_path: Option<PathBuf>,
}

pub struct InspectConfig {
    pub input_path: PathBuf,
    pub selection: SelectionPolicy,
    pub substitutions: SubstitutionTable,
    pub report_path: Option<PathBuf>,
}
