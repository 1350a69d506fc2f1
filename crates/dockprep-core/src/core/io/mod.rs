//! Reading and writing of structure files.
//!
//! Both formats share the [`traits::StructureFile`] interface and the
//! [`traits::Selector`] seam that filters what gets serialized. Readers tolerate malformed
//! records by reporting [`warnings::StructuralWarning`]s instead of failing.

pub mod error;
pub mod format;
mod lines;
pub mod mmcif;
pub mod pdb;
pub mod selection;
pub mod traits;
pub mod warnings;
