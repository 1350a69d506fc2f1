//! # dockprep Core Library
//!
//! Sanitization and repair of macromolecular receptor structures (PDB/mmCIF) ahead of
//! molecular docking.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture.
//!
//! - **[`core`]: The Foundation.** Stateless data model (`StructureRecord`), residue
//!   vocabulary tables and format I/O with selector-based filtering.
//!
//! - **[`engine`]: The Logic Core.** Disorder resolution, the sanitizing selector, the
//!   repair operation chain and the boundary to the external repair and completion engines.
//!
//! - **[`workflows`]: The Public API.** The receptor session that owns the current structure
//!   and the end-to-end `prepare` and `inspect` workflows.

pub mod core;
pub mod engine;
pub mod workflows;
