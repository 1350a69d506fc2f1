use super::atom::Atom;
use super::ids::{ChainId, ModelId, ResidueId};
use super::residue::{HeteroFlag, ResidueNumber};
use super::structure::StructureRecord;
use thiserror::Error;

/// A record the builder refused to add; readers report these as structural warnings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildConflict {
    #[error("residue {chain}:{number} is already named '{existing}', ignoring record named '{found}'")]
    ResidueNameConflict {
        chain: char,
        number: ResidueNumber,
        existing: String,
        found: String,
    },
    #[error("duplicate atom '{atom}' (alt-loc {alt_loc:?}) in residue {chain}:{number}")]
    DuplicateAtom {
        chain: char,
        number: ResidueNumber,
        atom: String,
        alt_loc: Option<char>,
    },
    #[error("atom record without an enclosing residue")]
    NoCurrentResidue,
}

/// Incremental constructor used by the format readers.
///
/// The builder tracks the current model, chain and residue so readers can feed records in
/// file order. A chain started before any model implicitly opens model 0.
#[derive(Debug, Default)]
pub struct StructureBuilder {
    structure: StructureRecord,
    current_model: Option<ModelId>,
    current_chain: Option<ChainId>,
    current_residue: Option<ResidueId>,
}

impl StructureBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            structure: StructureRecord::new(id),
            ..Default::default()
        }
    }

    pub fn set_seqres(&mut self, chain: char, names: Vec<String>) -> &mut Self {
        self.structure.header.seqres.entry(chain).or_default().extend(names);
        self
    }

    pub fn start_model(&mut self, serial: Option<isize>) -> &mut Self {
        self.current_model = Some(self.structure.add_model(serial));
        self.current_chain = None;
        self.current_residue = None;
        self
    }

    pub fn start_chain(&mut self, id: char) -> &mut Self {
        let model_id = match self.current_model {
            Some(model_id) => model_id,
            None => {
                let model_id = self.structure.add_model(None);
                self.current_model = Some(model_id);
                model_id
            }
        };
        if self.current_chain.and_then(|c| self.structure.chain(c)).map(|c| c.id) != Some(id) {
            self.current_chain = self.structure.add_chain(model_id, id);
            self.current_residue = None;
        }
        self
    }

    /// Makes the residue `number` of the current chain current, creating it on first sight.
    ///
    /// # Errors
    ///
    /// Returns [`BuildConflict::ResidueNameConflict`] when the residue already exists under a
    /// different name; the current residue is cleared so the following atoms are rejected too.
    pub fn start_residue(
        &mut self,
        number: ResidueNumber,
        name: &str,
        hetero_flag: HeteroFlag,
    ) -> Result<&mut Self, BuildConflict> {
        let Some(chain_id) = self.current_chain else {
            self.current_residue = None;
            return Err(BuildConflict::NoCurrentResidue);
        };

        if let Some(existing_id) = self.structure.find_residue(chain_id, number) {
            let existing = self
                .structure
                .residue(existing_id)
                .map(|r| r.name.clone())
                .unwrap_or_default();
            if existing != name {
                self.current_residue = None;
                return Err(BuildConflict::ResidueNameConflict {
                    chain: self.chain_char(chain_id),
                    number,
                    existing,
                    found: name.to_string(),
                });
            }
            self.current_residue = Some(existing_id);
            return Ok(self);
        }

        self.current_residue = self
            .structure
            .add_residue(chain_id, number, name, hetero_flag);
        Ok(self)
    }

    /// Adds an atom to the current residue.
    ///
    /// # Errors
    ///
    /// Returns [`BuildConflict::DuplicateAtom`] if the residue already holds an atom with the same
    /// name and alternate-location code.
    pub fn add_atom(&mut self, atom: Atom) -> Result<&mut Self, BuildConflict> {
        let residue_id = self
            .current_residue
            .ok_or(BuildConflict::NoCurrentResidue)?;

        let duplicate = self
            .structure
            .atoms_of(residue_id)
            .any(|(_, a)| a.name == atom.name && a.alt_loc == atom.alt_loc);
        if duplicate {
            let residue = self.structure.residue(residue_id);
            return Err(BuildConflict::DuplicateAtom {
                chain: residue
                    .map(|r| self.chain_char(r.chain_id))
                    .unwrap_or(' '),
                number: residue
                    .map(|r| r.number)
                    .unwrap_or_else(|| ResidueNumber::from(0)),
                atom: atom.name,
                alt_loc: atom.alt_loc,
            });
        }

        self.structure.add_atom_to_residue(residue_id, atom);
        Ok(self)
    }

    pub fn build(self) -> StructureRecord {
        self.structure
    }

    fn chain_char(&self, chain_id: ChainId) -> char {
        self.structure.chain(chain_id).map(|c| c.id).unwrap_or(' ')
    }
}
