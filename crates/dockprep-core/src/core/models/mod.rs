//! # Structure Models
//!
//! Format-independent representation of a parsed macromolecular structure.
//!
//! A [`structure::StructureRecord`] is a four-level tree (model → chain → residue → atom)
//! stored in slot-map arenas and addressed by the typed keys in [`ids`]. Readers construct
//! records through [`builder::StructureBuilder`]; the sanitizer and the repair operations
//! inspect and mutate them in place.
//!
//! - [`atom`] - Atom records with alternate location, occupancy and serial number
//! - [`residue`] - Residue numbering and the polymer/water/hetero classification
//! - [`chain`] / [`model`] - Ordered containers of the tree
//! - [`structure`] - The arena-backed record with its header (entry id, SEQRES)
//! - [`builder`] - Incremental construction with conflict reporting

pub mod atom;
pub mod builder;
pub mod chain;
pub mod ids;
pub mod model;
pub mod residue;
pub mod structure;
