use super::ids::ResidueId;
use nalgebra::Point3;

/// Represents a single atom record of a parsed structure.
///
/// Atoms keep every field the structure formats carry so that a structure can be
/// re-serialized without loss: the original serial number, the alternate-location code
/// that marks crystallographic disorder, and occupancy/B-factor values.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Serial number from the source file (preserved on write).
    pub serial: usize,
    /// The atom name within its residue (e.g., "CA", "OG1").
    pub name: String,
    /// Element symbol in upper case (e.g., "C", "SE").
    pub element: String,
    /// Cartesian coordinates in Angstroms.
    pub position: Point3<f64>,
    /// Fractional occupancy of this conformation.
    pub occupancy: f64,
    /// Isotropic temperature factor.
    pub b_factor: f64,
    /// Alternate-location code; `None` for ordered atoms.
    pub alt_loc: Option<char>,
    /// Formal charge as written in the source (e.g., "1+"), empty when absent.
    pub charge: String,
    /// The ID of the parent residue.
    pub residue_id: ResidueId,
}

impl Atom {
    /// Creates a new `Atom` with occupancy 1.0 and no alternate location.
    ///
    /// # Arguments
    ///
    /// * `serial` - The serial number of the atom.
    /// * `name` - The name of the atom.
    /// * `element` - The element symbol; it is normalized to upper case.
    /// * `position` - The 3D coordinates of the atom.
    pub fn new(serial: usize, name: &str, element: &str, position: Point3<f64>) -> Self {
        Self {
            serial,
            name: name.to_string(),
            element: element.trim().to_ascii_uppercase(),
            position,
            occupancy: 1.0,
            b_factor: 0.0,
            alt_loc: None,
            charge: String::new(),
            residue_id: ResidueId::default(),
        }
    }

    pub fn with_alt_loc(mut self, alt_loc: char) -> Self {
        self.alt_loc = Some(alt_loc);
        self
    }

    pub fn with_occupancy(mut self, occupancy: f64) -> Self {
        self.occupancy = occupancy;
        self
    }

    /// Returns `true` for hydrogen and deuterium atoms.
    pub fn is_hydrogen(&self) -> bool {
        matches!(self.element.as_str(), "H" | "D")
    }
}

/// Infers an element symbol from a PDB-style atom name when the element column is blank.
///
/// The first alphabetic character is taken as the element, which also covers digit-prefixed
/// hydrogen names such as "1HB".
pub fn infer_element(atom_name: &str) -> String {
    let trimmed = atom_name.trim();
    let first_alpha = trimmed.chars().find(|c| c.is_ascii_alphabetic());
    match first_alpha {
        Some(c) => c.to_ascii_uppercase().to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_atom_has_expected_default_fields() {
        let atom = Atom::new(7, "CA", "c", Point3::new(1.0, 2.0, 3.0));

        assert_eq!(atom.serial, 7);
        assert_eq!(atom.name, "CA");
        assert_eq!(atom.element, "C");
        assert_eq!(atom.position, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(atom.occupancy, 1.0);
        assert_eq!(atom.alt_loc, None);
        assert!(atom.charge.is_empty());
    }

    #[test]
    fn builder_style_setters_apply() {
        let atom = Atom::new(1, "CB", "C", Point3::origin())
            .with_alt_loc('B')
            .with_occupancy(0.4);
        assert_eq!(atom.alt_loc, Some('B'));
        assert_eq!(atom.occupancy, 0.4);
    }

    #[test]
    fn hydrogen_and_deuterium_are_recognized() {
        assert!(Atom::new(1, "H", "H", Point3::origin()).is_hydrogen());
        assert!(Atom::new(2, "D1", "D", Point3::origin()).is_hydrogen());
        assert!(!Atom::new(3, "HG", "HG", Point3::origin()).is_hydrogen());
    }

    #[test]
    fn infer_element_uses_first_alphabetic_character() {
        assert_eq!(infer_element(" CA "), "C");
        assert_eq!(infer_element("1HB "), "H");
        assert_eq!(infer_element("OXT"), "O");
        assert_eq!(infer_element("123"), "");
    }
}
