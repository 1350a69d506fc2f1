//! # Core Module
//!
//! Stateless foundation of the receptor preparation pipeline.
//!
//! - **Structure representation** ([`models`]) - The model → chain → residue → atom tree
//! - **Residue vocabulary** ([`residues`]) - Standard residues, water names, expected heavy
//!   atoms and non-standard substitutions
//! - **File I/O** ([`io`]) - PDB and mmCIF readers and writers with selector-based filtering

pub mod io;
pub mod models;
pub mod residues;
