use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "DockPrep Developers",
    version,
    about = "dockprep - Sanitize and repair receptor structures (PDB/mmCIF) for molecular docking.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all console log output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Also write logs (INFO and above) to this file
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sanitize a receptor and apply the requested repairs.
    Prepare(PrepareArgs),
    /// Sanitize a receptor and report what the repairs would find, without changing it.
    Inspect(InspectArgs),
}

/// Options shared by every command that sanitizes a structure.
#[derive(Args, Debug, Clone, Default)]
pub struct SanitizeArgs {
    /// Path to the input structure (.pdb, .ent, .cif, .mmcif).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Optional configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Zero-based index of the model to keep.
    #[arg(short, long, value_name = "INT")]
    pub model: Option<usize>,

    /// Remove water molecules.
    #[arg(long)]
    pub remove_water: bool,

    /// Remove hetero groups (ligands, ions, modified residues).
    #[arg(long)]
    pub remove_hetero: bool,

    /// Keep every alternate location instead of the first one per atom.
    #[arg(long)]
    pub keep_disorder: bool,

    /// Additional non-standard residue mappings in TOML format (NAME = "STD").
    #[arg(long, value_name = "PATH")]
    pub substitutions: Option<PathBuf>,

    /// Export the findings as CSV.
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,
}

/// Arguments for the `prepare` subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct PrepareArgs {
    #[command(flatten)]
    pub sanitize: SanitizeArgs,

    /// Path for the prepared structure; the extension selects the format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    // --- Repair steps (always run in the order listed) ---
    /// Replace known non-standard residues with their standard parents.
    #[arg(long)]
    pub replace_nonstandard: bool,

    /// Add residues listed in SEQRES but absent from the coordinates.
    #[arg(long)]
    pub add_missing_residues: bool,

    /// Add missing heavy atoms, including C-terminal oxygens.
    #[arg(long)]
    pub add_missing_atoms: bool,

    /// Protonate the structure.
    #[arg(long)]
    pub add_hydrogens: bool,

    /// pH used for protonation.
    #[arg(long, value_name = "FLOAT")]
    pub ph: Option<f64>,

    // --- Engines ---
    /// Keep the original residue numbering when MODELLER completes the structure.
    #[arg(long)]
    pub transfer_res_num: bool,

    /// pdbfixer executable.
    #[arg(long, value_name = "PATH")]
    pub pdbfixer: Option<PathBuf>,

    /// Python interpreter with MODELLER installed; enables MODELLER completion.
    #[arg(long, value_name = "PATH")]
    pub modeller_python: Option<PathBuf>,
}

/// Arguments for the `inspect` subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct InspectArgs {
    #[command(flatten)]
    pub sanitize: SanitizeArgs,
}
