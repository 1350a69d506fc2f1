use super::ids::ChainId;

/// One complete coordinate set of the structure (e.g., one member of an NMR ensemble).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    /// Zero-based position of the model in the source file; this is the selectable model index.
    pub id: usize,
    /// Serial number from the `MODEL` record, if the file had one.
    pub serial: Option<isize>,
    pub(crate) chains: Vec<ChainId>,
}

impl Model {
    pub(crate) fn new(id: usize, serial: Option<isize>) -> Self {
        Self {
            id,
            serial,
            chains: Vec::new(),
        }
    }

    pub fn chains(&self) -> &[ChainId] {
        &self.chains
    }
}
