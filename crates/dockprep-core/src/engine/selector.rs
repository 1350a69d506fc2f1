use super::config::SelectionPolicy;
use super::disorder::DisorderResolver;
use crate::core::io::error::SelectionError;
use crate::core::io::traits::Selector;
use crate::core::models::atom::Atom;
use crate::core::models::ids::AtomId;
use crate::core::models::model::Model;
use crate::core::models::residue::Residue;
use crate::core::models::structure::StructureRecord;
use std::fmt;
use tracing::{error, info};

/// Why an atom was left out of the sanitized output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Disorder,
    Water,
    Hetero,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disorder => write!(f, "disorder"),
            Self::Water => write!(f, "water"),
            Self::Hetero => write!(f, "hetero"),
        }
    }
}

/// Serialization-time filter implementing a [`SelectionPolicy`] over one structure snapshot.
pub struct SanitizingSelector {
    policy: SelectionPolicy,
    available_models: Vec<usize>,
    resolver: DisorderResolver,
}

impl SanitizingSelector {
    /// Binds the policy to `structure`, resolving its disorder groups up front.
    pub fn new(structure: &StructureRecord, policy: SelectionPolicy) -> Self {
        Self {
            policy,
            available_models: structure.model_indices(),
            resolver: DisorderResolver::new(structure),
        }
    }

    pub fn resolver(&self) -> &DisorderResolver {
        &self.resolver
    }

    /// The rejection decision for one atom, checked in priority order.
    pub fn reject_reason(&self, atom_id: AtomId, residue: &Residue) -> Option<RejectReason> {
        if self.policy.remove_disorder && self.resolver.is_rejected(atom_id) {
            Some(RejectReason::Disorder)
        } else if self.policy.remove_water && residue.is_water() {
            Some(RejectReason::Water)
        } else if self.policy.remove_hetero && residue.is_hetero() {
            Some(RejectReason::Hetero)
        } else {
            None
        }
    }
}

impl Selector for SanitizingSelector {
    fn accept_model(&self, model: &Model) -> Result<bool, SelectionError> {
        if !self.available_models.contains(&self.policy.model_id) {
            let err = SelectionError::ModelNotFound {
                requested: self.policy.model_id,
                available: self.available_models.clone(),
            };
            error!("{}", err);
            return Err(err);
        }
        if model.id == self.policy.model_id {
            info!("Selected model ID {}", model.id);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn accept_atom(
        &self,
        atom_id: AtomId,
        atom: &Atom,
        residue: &Residue,
    ) -> Result<bool, SelectionError> {
        match self.reject_reason(atom_id, residue) {
            Some(reason) => {
                info!(
                    serial = atom.serial,
                    atom = %atom.name,
                    reason = %reason,
                    "Rejected atom {} {} ({})",
                    atom.serial,
                    atom.name,
                    reason
                );
                Ok(false)
            }
            None => Ok(true),
        }
    }
}
