use super::ids::{ModelId, ResidueId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    pub id: char,                        // Chain identifier (e.g., 'A', 'B')
    pub model_id: ModelId,               // ID of the parent model
    pub(crate) residues: Vec<ResidueId>, // Residues in file order
}

impl Chain {
    pub(crate) fn new(id: char, model_id: ModelId) -> Self {
        Self {
            id,
            model_id,
            residues: Vec::new(),
        }
    }

    pub fn residues(&self) -> &[ResidueId] {
        &self.residues
    }
}
