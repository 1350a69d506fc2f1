use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileSanitizeConfig {
    pub model: Option<usize>,
    pub remove_disorder: Option<bool>,
    pub remove_water: Option<bool>,
    pub remove_hetero: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileRepairConfig {
    pub replace_nonstandard: Option<bool>,
    pub add_missing_atoms: Option<bool>,
    pub add_missing_residues: Option<bool>,
    pub add_hydrogens: Option<bool>,
    pub ph: Option<f64>,
    pub substitutions: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileEnginesConfig {
    pub pdbfixer: Option<PathBuf>,
    pub modeller_python: Option<PathBuf>,
    pub modeller_topology: Option<Vec<String>>,
    pub modeller_parameters: Option<String>,
    pub include_hetatm: Option<bool>,
    pub include_water: Option<bool>,
    pub transfer_res_num: Option<bool>,
}

/// Contents of a `dockprep` TOML configuration file. Every key is optional.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub sanitize: Option<FileSanitizeConfig>,
    pub repair: Option<FileRepairConfig>,
    pub engines: Option<FileEnginesConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}
