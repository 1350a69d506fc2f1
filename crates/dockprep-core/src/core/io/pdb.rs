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
use itertools::Itertools;
use nalgebra::Point3;
use std::io::{BufRead, Write};

const SEQRES_NAMES_PER_LINE: usize = 13;

/// Serials wrap to fit the five-column field.
const SERIAL_MODULUS: usize = 100_000;

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end.min(line.len())).unwrap_or("").trim()
}

fn column_char(line: &str, index: usize) -> Option<char> {
    line.get(index..index + 1)
        .and_then(|s| s.chars().next())
        .filter(|c| *c != ' ')
}

/// Fixed-column PDB format.
pub struct PdbFile;

impl StructureFile for PdbFile {
    fn read_from(reader: &mut impl BufRead, id: &str) -> Result<ParsedStructure, ParseError> {
        let mut builder = StructureBuilder::new(id);
        let mut warnings = Vec::new();
        let mut atom_count = 0usize;
        let mut last_conflict: Option<BuildConflict> = None;

        for (index, line) in LossyLines::new(reader).enumerate() {
            let (line, replaced) = line?;
            let line_num = index + 1;
            if replaced {
                warnings.push(StructuralWarning::new(line_num, WarningKind::InvalidEncoding));
            }

            if line.starts_with("SEQRES") {
                if let Some(chain) = line.get(11..12).and_then(|s| s.chars().next()) {
                    let names = line
                        .get(19..)
                        .unwrap_or("")
                        .split_whitespace()
                        .map(str::to_string)
                        .collect();
                    builder.set_seqres(chain, names);
                }
            } else if line.starts_with("MODEL") {
                let serial = slice_and_trim(&line, 10, 14).parse::<isize>().ok();
                builder.start_model(serial);
            } else if line.starts_with("ATOM  ") || line.starts_with("HETATM") {
                let record = match parse_atom_record(&line, line_num) {
                    Ok(record) => record,
                    Err(warning) => {
                        warnings.push(warning);
                        continue;
                    }
                };

                builder.start_chain(record.chain);
                let result = builder
                    .start_residue(record.number, &record.residue_name, record.hetero_flag)
                    .and_then(|b| b.add_atom(record.atom));
                match result {
                    Ok(_) => {
                        atom_count += 1;
                        last_conflict = None;
                    }
                    Err(conflict) => {
                        // One warning per run of records hitting the same conflict.
                        let repeated = matches!(
                            (&last_conflict, &conflict),
                            (Some(BuildConflict::ResidueNameConflict { .. }), BuildConflict::NoCurrentResidue)
                        ) || last_conflict.as_ref() == Some(&conflict);
                        if !repeated {
                            warnings.push(StructuralWarning::new(
                                line_num,
                                WarningKind::Conflict(conflict.clone()),
                            ));
                            last_conflict = Some(conflict);
                        }
                    }
                }
            }
        }

        if atom_count == 0 {
            return Err(ParseError::NoAtoms { id: id.to_string() });
        }

        Ok(ParsedStructure {
            structure: builder.build(),
            warnings,
        })
    }

    fn write_to(
        structure: &StructureRecord,
        selector: &dyn Selector,
        writer: &mut impl Write,
    ) -> Result<(), WriteError> {
        let selection = Selection::collect(structure, selector)?;

        for chain_id in selection.chain_ids(structure) {
            if let Some(names) = structure.header.seqres.get(&chain_id) {
                write_seqres(writer, chain_id, names)?;
            }
        }

        let multi_model = selection.models.len() > 1;
        for selected_model in &selection.models {
            if multi_model {
                let serial = structure
                    .model(selected_model.id)
                    .map(|m| m.serial.unwrap_or(m.id as isize + 1))
                    .unwrap_or(1);
                writeln!(writer, "MODEL     {:>4}", serial)?;
            }

            for selected_chain in &selected_model.chains {
                let Some(chain) = structure.chain(selected_chain.id) else {
                    continue;
                };
                let mut last_polymer: Option<(usize, String, ResidueNumber)> = None;
                let mut ter_written = false;

                for selected_residue in &selected_chain.residues {
                    let Some(residue) = structure.residue(selected_residue.id) else {
                        continue;
                    };
                    let is_polymer = residue.hetero_flag == HeteroFlag::Polymer;
                    if !is_polymer && !ter_written {
                        if let Some((serial, name, number)) = last_polymer.take() {
                            write_ter(writer, serial.saturating_add(1), &name, chain.id, number)?;
                            ter_written = true;
                        }
                    }

                    for &atom_id in &selected_residue.atoms {
                        let Some(atom) = structure.atom(atom_id) else {
                            continue;
                        };
                        writeln!(
                            writer,
                            "{}",
                            format_atom_line(atom, &residue.name, residue.hetero_flag, chain.id, residue.number)
                        )?;
                        if is_polymer {
                            last_polymer = Some((atom.serial, residue.name.clone(), residue.number));
                        }
                    }
                }

                if let Some((serial, name, number)) = last_polymer {
                    if !ter_written {
                        write_ter(writer, serial.saturating_add(1), &name, chain.id, number)?;
                    }
                }
            }

            if multi_model {
                writeln!(writer, "ENDMDL")?;
            }
        }

        writeln!(writer, "END")?;
        Ok(())
    }
}

struct AtomRecord {
    chain: char,
    number: ResidueNumber,
    residue_name: String,
    hetero_flag: HeteroFlag,
    atom: Atom,
}

fn parse_atom_record(line: &str, line_num: usize) -> Result<AtomRecord, StructuralWarning> {
    if line.len() < 54 {
        return Err(StructuralWarning::new(
            line_num,
            WarningKind::TruncatedRecord { length: line.len() },
        ));
    }

    let number_field = |field: &'static str, start: usize, end: usize| {
        let value = slice_and_trim(line, start, end);
        value.parse::<f64>().map_err(|_| {
            StructuralWarning::new(
                line_num,
                WarningKind::InvalidNumber {
                    field,
                    value: value.to_string(),
                },
            )
        })
    };
    let optional_number = |field: &'static str, start: usize, end: usize, default: f64| {
        if slice_and_trim(line, start, end).is_empty() {
            Ok(default)
        } else {
            number_field(field, start, end)
        }
    };

    let serial_str = slice_and_trim(line, 6, 11);
    let serial = serial_str.parse::<usize>().map_err(|_| {
        StructuralWarning::new(
            line_num,
            WarningKind::InvalidNumber {
                field: "serial number",
                value: serial_str.to_string(),
            },
        )
    })?;
    let seq_str = slice_and_trim(line, 22, 26);
    let seq = seq_str.parse::<isize>().map_err(|_| {
        StructuralWarning::new(
            line_num,
            WarningKind::InvalidNumber {
                field: "residue number",
                value: seq_str.to_string(),
            },
        )
    })?;

    let x = number_field("x coordinate", 30, 38)?;
    let y = number_field("y coordinate", 38, 46)?;
    let z = number_field("z coordinate", 46, 54)?;
    let occupancy = optional_number("occupancy", 54, 60, 1.0)?;
    let b_factor = optional_number("B-factor", 60, 66, 0.0)?;

    let name = slice_and_trim(line, 12, 16);
    // Four-character residue names (e.g. TIP3) spill into column 21.
    let residue_name = if column_char(line, 20).is_some() {
        slice_and_trim(line, 17, 21)
    } else {
        slice_and_trim(line, 17, 20)
    };
    let element = match slice_and_trim(line, 76, 78) {
        "" => infer_element(name),
        symbol => symbol.to_string(),
    };

    let hetero_flag = if line.starts_with("HETATM") {
        if is_water_name(residue_name) {
            HeteroFlag::Water
        } else {
            HeteroFlag::Hetero
        }
    } else {
        HeteroFlag::Polymer
    };

    let mut atom = Atom::new(serial, name, &element, Point3::new(x, y, z));
    atom.alt_loc = column_char(line, 16);
    atom.occupancy = occupancy;
    atom.b_factor = b_factor;
    atom.charge = slice_and_trim(line, 78, 80).to_string();

    Ok(AtomRecord {
        chain: line.get(21..22).and_then(|s| s.chars().next()).unwrap_or(' '),
        number: ResidueNumber::new(seq, column_char(line, 26)),
        residue_name: residue_name.to_string(),
        hetero_flag,
        atom,
    })
}

fn format_atom_line(
    atom: &Atom,
    residue_name: &str,
    hetero_flag: HeteroFlag,
    chain: char,
    number: ResidueNumber,
) -> String {
    let record = if hetero_flag.is_hetatm() { "HETATM" } else { "ATOM" };
    let name = if atom.name.len() < 4 && atom.element.len() == 1 {
        format!(" {:<3}", atom.name)
    } else {
        format!("{:<4}", atom.name)
    };
    let residue_field = if residue_name.len() >= 4 {
        residue_name.chars().take(4).collect::<String>()
    } else {
        format!("{:>3} ", residue_name)
    };
    format!(
        "{:<6}{:>5} {}{}{}{}{:>4}{}   {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}          {:>2}{:>2}",
        record,
        atom.serial % SERIAL_MODULUS,
        name,
        atom.alt_loc.unwrap_or(' '),
        residue_field,
        chain,
        number.seq,
        number.insertion_code.unwrap_or(' '),
        atom.position.x,
        atom.position.y,
        atom.position.z,
        atom.occupancy,
        atom.b_factor,
        atom.element,
        atom.charge,
    )
}

fn write_ter(
    writer: &mut impl Write,
    serial: usize,
    residue_name: &str,
    chain: char,
    number: ResidueNumber,
) -> std::io::Result<()> {
    writeln!(
        writer,
        "TER   {:>5}      {:>3} {}{:>4}{}",
        serial % SERIAL_MODULUS,
        residue_name,
        chain,
        number.seq,
        number.insertion_code.unwrap_or(' ')
    )
}

fn write_seqres(writer: &mut impl Write, chain: char, names: &[String]) -> std::io::Result<()> {
    for (index, chunk) in names.chunks(SEQRES_NAMES_PER_LINE).enumerate() {
        writeln!(
            writer,
            "SEQRES {:>3} {} {:>4}  {}",
            index + 1,
            chain,
            names.len(),
            chunk.iter().map(|n| format!("{:>3}", n)).join(" ")
        )?;
    }
    Ok(())
}
