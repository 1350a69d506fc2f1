use dockprep::engine::config::{DEFAULT_PH, EngineConfig, SelectionPolicy};
use std::path::PathBuf;

pub struct DefaultsConfig {
    pub model_id: usize,
    pub remove_disorder: bool,
    pub remove_water: bool,
    pub remove_hetero: bool,
    pub ph: f64,
    pub pdbfixer: PathBuf,
    pub modeller_topology: Vec<String>,
    pub modeller_parameters: String,
    pub include_hetatm: bool,
    pub include_water: bool,
    pub transfer_res_num: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        let selection = SelectionPolicy::default();
        let engines = EngineConfig::default();
        Self {
            model_id: selection.model_id,
            remove_disorder: selection.remove_disorder,
            remove_water: selection.remove_water,
            remove_hetero: selection.remove_hetero,
            ph: DEFAULT_PH,
            pdbfixer: engines.pdbfixer_executable,
            modeller_topology: engines.modeller_topology,
            modeller_parameters: engines.modeller_parameters,
            include_hetatm: engines.include_hetatm,
            include_water: engines.include_water,
            transfer_res_num: engines.transfer_res_num,
        }
    }
}
