use super::error::{ParseError, WriteError};
use super::lines::LossyLines;
use super::selection::Selection;
use super::traits::{ParsedStructure, Selector, StructureFile};
use super::warnings::{StructuralWarning, WarningKind};
use crate::core::models::atom::{Atom, infer_element};
use crate::core::models::builder::{BuildConflict, StructureBuilder};
use crate::core::models::residue::{HeteroFlag, ResidueNumber};
use crate::core::models::structure::StructureRecord;
use crate::core::residues::is_water_name;
use nalgebra::Point3;
use std::collections::{HashMap, HashSet};
use std::io::{BufRead, Write};

/// Free ids handed to chains whose own id does not fit in one character, lowercase first.
const SPARE_CHAIN_IDS: &str = "abcdefghijklmnopqrstuvwxyz0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

const ATOM_SITE_COLUMNS: [&str; 20] = [
    "group_PDB",
    "id",
    "type_symbol",
    "label_atom_id",
    "label_alt_id",
    "label_comp_id",
    "label_asym_id",
    "label_seq_id",
    "pdbx_PDB_ins_code",
    "Cartn_x",
    "Cartn_y",
    "Cartn_z",
    "occupancy",
    "B_iso_or_equiv",
    "pdbx_formal_charge",
    "auth_seq_id",
    "auth_comp_id",
    "auth_asym_id",
    "auth_atom_id",
    "pdbx_PDB_model_num",
];

#[derive(Default)]
struct AtomSiteIndices {
    group_pdb: Option<usize>,
    id: Option<usize>,
    type_symbol: Option<usize>,
    label_atom_id: Option<usize>,
    auth_atom_id: Option<usize>,
    label_alt_id: Option<usize>,
    label_comp_id: Option<usize>,
    auth_comp_id: Option<usize>,
    label_asym_id: Option<usize>,
    auth_asym_id: Option<usize>,
    label_seq_id: Option<usize>,
    auth_seq_id: Option<usize>,
    ins_code: Option<usize>,
    cartn_x: Option<usize>,
    cartn_y: Option<usize>,
    cartn_z: Option<usize>,
    occupancy: Option<usize>,
    b_factor: Option<usize>,
    formal_charge: Option<usize>,
    model_num: Option<usize>,
}

impl AtomSiteIndices {
    fn from_headers(headers: &[String]) -> Self {
        let mut indices = Self::default();
        for (i, header) in headers.iter().enumerate() {
            let Some(column) = header.strip_prefix("_atom_site.") else {
                continue;
            };
            let slot = match column {
                "group_PDB" => &mut indices.group_pdb,
                "id" => &mut indices.id,
                "type_symbol" => &mut indices.type_symbol,
                "label_atom_id" => &mut indices.label_atom_id,
                "auth_atom_id" => &mut indices.auth_atom_id,
                "label_alt_id" => &mut indices.label_alt_id,
                "label_comp_id" => &mut indices.label_comp_id,
                "auth_comp_id" => &mut indices.auth_comp_id,
                "label_asym_id" => &mut indices.label_asym_id,
                "auth_asym_id" => &mut indices.auth_asym_id,
                "label_seq_id" => &mut indices.label_seq_id,
                "auth_seq_id" => &mut indices.auth_seq_id,
                "pdbx_PDB_ins_code" => &mut indices.ins_code,
                "Cartn_x" => &mut indices.cartn_x,
                "Cartn_y" => &mut indices.cartn_y,
                "Cartn_z" => &mut indices.cartn_z,
                "occupancy" => &mut indices.occupancy,
                "B_iso_or_equiv" => &mut indices.b_factor,
                "pdbx_formal_charge" => &mut indices.formal_charge,
                "pdbx_PDB_model_num" => &mut indices.model_num,
                _ => continue,
            };
            *slot = Some(i);
        }
        indices
    }

    fn missing_required(&self) -> Option<&'static str> {
        if self.cartn_x.is_none() || self.cartn_y.is_none() || self.cartn_z.is_none() {
            Some("Cartn_x/Cartn_y/Cartn_z")
        } else if self.auth_atom_id.or(self.label_atom_id).is_none() {
            Some("atom_id")
        } else if self.auth_comp_id.or(self.label_comp_id).is_none() {
            Some("comp_id")
        } else if self.auth_asym_id.or(self.label_asym_id).is_none() {
            Some("asym_id")
        } else if self.auth_seq_id.or(self.label_seq_id).is_none() {
            Some("seq_id")
        } else {
            None
        }
    }
}

enum ParserState {
    Base,
    LoopHeader,
    AtomSite,
    OtherLoop,
}

/// PDBx/mmCIF format, limited to the `_atom_site` category.
pub struct MmcifFile;

impl StructureFile for MmcifFile {
    fn read_from(reader: &mut impl BufRead, id: &str) -> Result<ParsedStructure, ParseError> {
        let mut loader = AtomSiteLoader::new(id);
        let mut state = ParserState::Base;
        let mut headers: Vec<String> = Vec::new();
        let mut indices = AtomSiteIndices::default();
        let mut pending: Vec<String> = Vec::new();
        let mut pending_line = 0;

        for (index, line) in LossyLines::new(reader).enumerate() {
            let (line, replaced) = line?;
            let line_num = index + 1;
            if replaced {
                loader
                    .warnings
                    .push(StructuralWarning::new(line_num, WarningKind::InvalidEncoding));
            }
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let tokens = tokenize(trimmed);
            let Some(first) = tokens.first() else {
                continue;
            };

            if first == "loop_" {
                state = ParserState::LoopHeader;
                headers.clear();
                pending.clear();
                continue;
            }
            if first.starts_with("data_") {
                state = ParserState::Base;
                continue;
            }

            match state {
                ParserState::Base => {}
                ParserState::LoopHeader if first.starts_with('_') => {
                    headers.push(first.clone());
                }
                ParserState::LoopHeader => {
                    if headers.iter().any(|h| h.starts_with("_atom_site.")) {
                        indices = AtomSiteIndices::from_headers(&headers);
                        if let Some(column) = indices.missing_required() {
                            return Err(ParseError::Malformed {
                                line: line_num,
                                message: format!("_atom_site loop lacks required column {column}"),
                            });
                        }
                        state = ParserState::AtomSite;
                        pending_line = line_num;
                        pending.extend(tokens);
                        loader.drain_rows(&mut pending, headers.len(), &indices, pending_line);
                    } else {
                        state = ParserState::OtherLoop;
                    }
                }
                ParserState::AtomSite if first.starts_with('_') => {
                    state = ParserState::Base;
                }
                ParserState::AtomSite => {
                    if pending.is_empty() {
                        pending_line = line_num;
                    }
                    pending.extend(tokens);
                    loader.drain_rows(&mut pending, headers.len(), &indices, pending_line);
                }
                ParserState::OtherLoop => {
                    if first.starts_with('_') {
                        state = ParserState::Base;
                    }
                }
            }
        }

        loader.finish(id)
    }

    fn write_to(
        structure: &StructureRecord,
        selector: &dyn Selector,
        writer: &mut impl Write,
    ) -> Result<(), WriteError> {
        let selection = Selection::collect(structure, selector)?;

        let block = structure.header.id.split_whitespace().collect::<Vec<_>>().join("_");
        writeln!(
            writer,
            "data_{}",
            if block.is_empty() { "structure" } else { block.as_str() }
        )?;
        writeln!(writer, "#")?;
        writeln!(writer, "loop_")?;
        for column in ATOM_SITE_COLUMNS {
            writeln!(writer, "_atom_site.{}", column)?;
        }

        for selected_model in &selection.models {
            let model_num = structure
                .model(selected_model.id)
                .map(|m| m.serial.unwrap_or(m.id as isize + 1))
                .unwrap_or(1);
            for selected_chain in &selected_model.chains {
                let Some(chain) = structure.chain(selected_chain.id) else {
                    continue;
                };
                for selected_residue in &selected_chain.residues {
                    let Some(residue) = structure.residue(selected_residue.id) else {
                        continue;
                    };
                    for &atom_id in &selected_residue.atoms {
                        let Some(atom) = structure.atom(atom_id) else {
                            continue;
                        };
                        let group = if residue.hetero_flag.is_hetatm() { "HETATM" } else { "ATOM" };
                        let name = quote(&atom.name);
                        let comp = quote(&residue.name);
                        let chain_id = quote(&chain.id.to_string());
                        writeln!(
                            writer,
                            "{} {} {} {} {} {} {} {} {} {:.3} {:.3} {:.3} {:.2} {:.2} {} {} {} {} {} {}",
                            group,
                            atom.serial,
                            if atom.element.is_empty() { "?" } else { atom.element.as_str() },
                            name,
                            atom.alt_loc.map(String::from).unwrap_or_else(|| ".".into()),
                            comp,
                            chain_id,
                            residue.number.seq,
                            residue.number.insertion_code.map(String::from).unwrap_or_else(|| "?".into()),
                            atom.position.x,
                            atom.position.y,
                            atom.position.z,
                            atom.occupancy,
                            atom.b_factor,
                            pdb_charge_to_cif(&atom.charge),
                            residue.number.seq,
                            comp,
                            chain_id,
                            name,
                            model_num,
                        )?;
                    }
                }
            }
        }
        writeln!(writer, "#")?;
        Ok(())
    }
}

struct AtomSiteLoader {
    builder: StructureBuilder,
    warnings: Vec<StructuralWarning>,
    atom_count: usize,
    current_model: Option<String>,
    chain_ids: HashMap<String, char>,
    used_chain_ids: HashSet<char>,
    last_conflict: Option<BuildConflict>,
}

impl AtomSiteLoader {
    fn new(id: &str) -> Self {
        Self {
            builder: StructureBuilder::new(id),
            warnings: Vec::new(),
            atom_count: 0,
            current_model: None,
            chain_ids: HashMap::new(),
            used_chain_ids: HashSet::new(),
            last_conflict: None,
        }
    }

    fn drain_rows(
        &mut self,
        pending: &mut Vec<String>,
        width: usize,
        indices: &AtomSiteIndices,
        line_num: usize,
    ) {
        if width == 0 {
            pending.clear();
            return;
        }
        while pending.len() >= width {
            let row: Vec<String> = pending.drain(..width).collect();
            self.load_row(&row, indices, line_num);
        }
    }

    fn load_row(&mut self, row: &[String], idx: &AtomSiteIndices, line_num: usize) {
        let field = |i: Option<usize>| {
            i.and_then(|i| row.get(i))
                .map(String::as_str)
                .filter(|v| *v != "?" && *v != ".")
        };
        let number = |name: &'static str, i: Option<usize>| -> Result<Option<f64>, StructuralWarning> {
            match field(i) {
                None => Ok(None),
                Some(v) => v.parse::<f64>().map(Some).map_err(|_| {
                    StructuralWarning::new(
                        line_num,
                        WarningKind::InvalidNumber {
                            field: name,
                            value: v.to_string(),
                        },
                    )
                }),
            }
        };

        let parsed = (|| -> Result<(Option<f64>, Option<f64>, Option<f64>), StructuralWarning> {
            Ok((
                number("x coordinate", idx.cartn_x)?,
                number("y coordinate", idx.cartn_y)?,
                number("z coordinate", idx.cartn_z)?,
            ))
        })();
        let (x, y, z) = match parsed {
            Ok((Some(x), Some(y), Some(z))) => (x, y, z),
            Ok(_) => {
                self.warnings.push(StructuralWarning::new(
                    line_num,
                    WarningKind::TruncatedRecord { length: row.len() },
                ));
                return;
            }
            Err(warning) => {
                self.warnings.push(warning);
                return;
            }
        };
        let occupancy = number("occupancy", idx.occupancy).ok().flatten().unwrap_or(1.0);
        let b_factor = number("B-factor", idx.b_factor).ok().flatten().unwrap_or(0.0);

        let seq_str = field(idx.auth_seq_id).or(field(idx.label_seq_id)).unwrap_or("");
        let Ok(seq) = seq_str.parse::<isize>() else {
            self.warnings.push(StructuralWarning::new(
                line_num,
                WarningKind::InvalidNumber {
                    field: "residue number",
                    value: seq_str.to_string(),
                },
            ));
            return;
        };

        let atom_name = field(idx.auth_atom_id).or(field(idx.label_atom_id)).unwrap_or("");
        let residue_name = field(idx.auth_comp_id).or(field(idx.label_comp_id)).unwrap_or("");
        let asym = field(idx.auth_asym_id).or(field(idx.label_asym_id)).unwrap_or(" ");
        let chain = self.chain_for(asym, line_num);

        if let Some(model) = field(idx.model_num) {
            if self.current_model.as_deref() != Some(model) {
                self.builder.start_model(model.parse::<isize>().ok());
                self.current_model = Some(model.to_string());
            }
        }

        let is_hetatm = field(idx.group_pdb) == Some("HETATM");
        let hetero_flag = match (is_hetatm, is_water_name(residue_name)) {
            (false, _) => HeteroFlag::Polymer,
            (true, true) => HeteroFlag::Water,
            (true, false) => HeteroFlag::Hetero,
        };

        let element = field(idx.type_symbol)
            .map(str::to_string)
            .unwrap_or_else(|| infer_element(atom_name));
        let serial = field(idx.id)
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(self.atom_count + 1);

        let mut atom = Atom::new(serial, atom_name, &element, Point3::new(x, y, z));
        atom.alt_loc = field(idx.label_alt_id).and_then(|v| v.chars().next());
        atom.occupancy = occupancy;
        atom.b_factor = b_factor;
        atom.charge = field(idx.formal_charge).map(cif_charge_to_pdb).unwrap_or_default();

        let insertion_code = field(idx.ins_code).and_then(|v| v.chars().next());
        self.builder.start_chain(chain);
        let result = self
            .builder
            .start_residue(ResidueNumber::new(seq, insertion_code), residue_name, hetero_flag)
            .and_then(|b| b.add_atom(atom));
        match result {
            Ok(_) => {
                self.atom_count += 1;
                self.last_conflict = None;
            }
            Err(conflict) => {
                if self.last_conflict.as_ref() != Some(&conflict) {
                    self.warnings.push(StructuralWarning::new(
                        line_num,
                        WarningKind::Conflict(conflict.clone()),
                    ));
                    self.last_conflict = Some(conflict);
                }
            }
        }
    }

    /// Maps an asym id to the single-character chain id it is stored under. Distinct asym ids
    /// never share a chain while spare ids remain.
    fn chain_for(&mut self, asym: &str, line_num: usize) -> char {
        if let Some(&chain) = self.chain_ids.get(asym) {
            return chain;
        }
        let preferred = asym.chars().next().unwrap_or(' ');
        let chain = if !self.used_chain_ids.contains(&preferred) {
            preferred
        } else {
            SPARE_CHAIN_IDS
                .chars()
                .find(|c| !self.used_chain_ids.contains(c))
                .unwrap_or(preferred)
        };
        if asym.chars().count() > 1 || chain != preferred {
            self.warnings.push(StructuralWarning::new(
                line_num,
                WarningKind::ChainRenamed {
                    from: asym.to_string(),
                    to: chain,
                },
            ));
        }
        self.used_chain_ids.insert(chain);
        self.chain_ids.insert(asym.to_string(), chain);
        chain
    }

    fn finish(self, id: &str) -> Result<ParsedStructure, ParseError> {
        if self.atom_count == 0 {
            return Err(ParseError::NoAtoms { id: id.to_string() });
        }
        Ok(ParsedStructure {
            structure: self.builder.build(),
            warnings: self.warnings,
        })
    }
}

/// Splits a CIF line into tokens. A quote only closes when followed by whitespace, so primes
/// inside quoted atom names such as `"O5'"` survive.
fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) if c == q && chars.peek().is_none_or(|n| n.is_whitespace()) => {
                tokens.push(std::mem::take(&mut current));
                quote = None;
            }
            Some(_) => current.push(c),
            None if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            None if (c == '\'' || c == '"') && current.is_empty() => quote = Some(c),
            None => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn quote(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value.contains(char::is_whitespace)
        || value.starts_with(['_', '#', '$', ';', '[', ']'])
        || value.contains(['\'', '"'])
        || value == "?"
        || value == ".";
    if !needs_quotes {
        value.to_string()
    } else if value.contains('"') {
        format!("'{}'", value)
    } else {
        format!("\"{}\"", value)
    }
}

fn cif_charge_to_pdb(value: &str) -> String {
    match value.parse::<i32>() {
        Ok(0) | Err(_) => String::new(),
        Ok(charge) if charge > 0 => format!("{}+", charge),
        Ok(charge) => format!("{}-", -charge),
    }
}

fn pdb_charge_to_cif(value: &str) -> String {
    let value = value.trim();
    let (digits, sign) = match value.chars().last() {
        Some('+') => (&value[..value.len() - 1], 1),
        Some('-') => (&value[..value.len() - 1], -1),
        _ => return "?".to_string(),
    };
    match digits.parse::<i32>() {
        Ok(n) => (n * sign).to_string(),
        Err(_) => "?".to_string(),
    }
}
