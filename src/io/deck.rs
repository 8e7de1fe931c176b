//! Solver input deck (CalculiX / Abaqus `.inp`) writer and reader
//!
//! Keyword sections are written in a fixed order. The solver reads the file
//! top to bottom and treats each keyword as a state transition, so no
//! section may move.

use crate::config::DeckConfig;
use crate::contact::types::ContactFaceTag;
use crate::error::{Result, TetDeckError};
use crate::mesh::geometry::round_to;
use crate::mesh::types::{FaceLabel, GlobalMesh, Node, Point, TetElement, TET10_NODES};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Node set holding every node
pub const NODE_SET: &str = "Nall";

/// Element set holding every element
pub const ELEMENT_SET: &str = "Eall";

/// Node set of ground nodes
pub const FIX_SET: &str = "FIX";

pub const SLAVE_SURFACE: &str = "Sslav";
pub const MASTER_SURFACE: &str = "Smast";
pub const INTERACTION: &str = "SI1";

/// Format a real as a plain decimal literal
///
/// Never uses exponent notation; integral values keep a trailing `.0`.
pub fn format_real(value: f64) -> String {
    // Avoid writing "-0.0"
    let value = if value == 0.0 { 0.0 } else { value };
    let text = value.to_string();
    if text.contains('.') || !value.is_finite() {
        text
    } else {
        format!("{}.0", text)
    }
}

/// Writes the deck sections in order
pub struct DeckWriter<'a, W: Write> {
    out: W,
    config: &'a DeckConfig,
}

impl<'a, W: Write> DeckWriter<'a, W> {
    pub fn new(out: W, config: &'a DeckConfig) -> Self {
        Self { out, config }
    }

    /// Return the underlying stream
    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn write_heading(&mut self) -> Result<()> {
        writeln!(self.out, "*HEADING")?;
        writeln!(self.out, "{}", self.config.units.heading())?;
        Ok(())
    }

    pub fn write_nodes(&mut self, nodes: &[Node]) -> Result<()> {
        let scale = self.config.units.length_scale();
        let precision = self.config.precision;
        // Scaling must not reintroduce digits dropped at import
        let coordinate = |value: f64| {
            if scale == 1.0 {
                format_real(value)
            } else {
                format_real(round_to(value * scale, precision))
            }
        };

        writeln!(self.out)?;
        writeln!(self.out, "*NODE, NSET={}", NODE_SET)?;
        for node in nodes {
            writeln!(
                self.out,
                "{}, {}, {}, {}",
                node.id,
                coordinate(node.position.x),
                coordinate(node.position.y),
                coordinate(node.position.z)
            )?;
        }
        Ok(())
    }

    pub fn write_elements(&mut self, elements: &[TetElement]) -> Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "*ELEMENT, TYPE=C3D10, ELSET={}", ELEMENT_SET)?;
        for element in elements {
            write!(self.out, "{}", element.id)?;
            for id in element.node_ids {
                write!(self.out, ", {}", id)?;
            }
            writeln!(self.out)?;
        }
        Ok(())
    }

    /// Fix all translations of the ground nodes; nothing is written without any
    pub fn write_ground_boundary(&mut self, ground_nodes: &[usize]) -> Result<()> {
        if ground_nodes.is_empty() {
            return Ok(());
        }

        writeln!(self.out)?;
        writeln!(self.out, "*NSET, NSET={}", FIX_SET)?;
        let ids: Vec<String> = ground_nodes.iter().map(|id| id.to_string()).collect();
        writeln!(self.out, "{}", ids.join(",\n"))?;

        writeln!(self.out)?;
        writeln!(self.out, "*BOUNDARY")?;
        for dof in 1..=3 {
            writeln!(self.out, "{}, {}", FIX_SET, dof)?;
        }
        Ok(())
    }

    pub fn write_material(&mut self) -> Result<()> {
        let material = &self.config.material;
        let units = self.config.units;

        writeln!(self.out)?;
        writeln!(self.out, "*MATERIAL, NAME={}", material.name)?;
        writeln!(self.out, "*ELASTIC")?;
        writeln!(
            self.out,
            "{}, {}",
            format_real(units.stress(material.youngs_modulus)),
            format_real(material.poissons_ratio)
        )?;
        writeln!(self.out, "*DENSITY")?;
        writeln!(
            self.out,
            "{}",
            format_real(units.density(material.density))
        )?;
        writeln!(
            self.out,
            "*SOLID SECTION, ELSET={}, MATERIAL={}",
            ELEMENT_SET, material.name
        )?;
        Ok(())
    }

    pub fn write_contact_pair(
        &mut self,
        slaves: &[ContactFaceTag],
        masters: &[ContactFaceTag],
    ) -> Result<()> {
        if slaves.is_empty() {
            log::warn!("Slave contact surface is empty");
        }
        if masters.is_empty() {
            log::warn!("Master contact surface is empty");
        }

        let contact = &self.config.contact;
        let modulus = self.config.units.stress(self.config.material.youngs_modulus);

        writeln!(self.out)?;
        writeln!(self.out, "*SURFACE, NAME={}", SLAVE_SURFACE)?;
        for tag in slaves {
            writeln!(self.out, "{}", tag)?;
        }
        writeln!(self.out, "*SURFACE, NAME={}", MASTER_SURFACE)?;
        for tag in masters {
            writeln!(self.out, "{}", tag)?;
        }
        writeln!(
            self.out,
            "*CONTACT PAIR, INTERACTION={}, TYPE=SURFACE TO SURFACE",
            INTERACTION
        )?;
        writeln!(self.out, "{}, {}", SLAVE_SURFACE, MASTER_SURFACE)?;
        writeln!(self.out, "*SURFACE INTERACTION,NAME={}", INTERACTION)?;
        writeln!(self.out, "*SURFACE BEHAVIOR,PRESSURE-OVERCLOSURE=LINEAR")?;
        writeln!(
            self.out,
            "{},{}",
            format_real(contact.penalty_stiffness_for(modulus)),
            format_real(contact.overclosure_tension)
        )?;
        writeln!(self.out, "*FRICTION")?;
        writeln!(
            self.out,
            "{},{}",
            format_real(contact.friction_coefficient),
            format_real(contact.stick_slope_for(modulus))
        )?;
        Ok(())
    }

    pub fn write_step(&mut self) -> Result<()> {
        let step = &self.config.step;
        let gravity = step.gravity * self.config.units.length_scale();
        let [dx, dy, dz] = step.gravity_direction;

        writeln!(self.out)?;
        if step.nlgeom {
            writeln!(self.out, "*STEP,NLGEOM")?;
        } else {
            writeln!(self.out, "*STEP")?;
        }
        writeln!(self.out, "{}", step.procedure.keyword())?;
        writeln!(
            self.out,
            "{},{}",
            format_real(step.initial_increment),
            format_real(step.period)
        )?;
        writeln!(self.out, "*DLOAD")?;
        writeln!(
            self.out,
            "{},GRAV,{},{},{},{}",
            ELEMENT_SET,
            format_real(gravity),
            format_real(dx),
            format_real(dy),
            format_real(dz)
        )?;
        writeln!(self.out, "*NODE FILE")?;
        writeln!(self.out, "U")?;
        writeln!(self.out, "*EL FILE")?;
        writeln!(self.out, "S")?;
        writeln!(self.out, "*END STEP")?;
        Ok(())
    }
}

/// Write a complete deck to a stream
pub fn write_deck<W: Write>(
    out: W,
    mesh: &GlobalMesh,
    ground_nodes: &[usize],
    config: &DeckConfig,
) -> Result<()> {
    let mut writer = DeckWriter::new(out, config);
    writer.write_heading()?;
    writer.write_nodes(&mesh.nodes)?;
    writer.write_elements(&mesh.elements)?;
    writer.write_ground_boundary(ground_nodes)?;
    writer.write_material()?;
    writer.write_contact_pair(&mesh.slaves, &mesh.masters)?;
    writer.write_step()?;
    writer.into_inner().flush()?;
    Ok(())
}

/// Write a complete deck to `path`
///
/// The deck goes to a temporary file in the same directory first and only
/// replaces `path` once every section is written.
pub fn write_deck_file(
    path: &Path,
    mesh: &GlobalMesh,
    ground_nodes: &[usize],
    config: &DeckConfig,
) -> Result<()> {
    log::info!(
        "Writing deck with {} nodes and {} elements to {:?}",
        mesh.num_nodes(),
        mesh.num_elements(),
        path
    );

    let dir = path
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    write_deck(BufWriter::new(tmp.as_file_mut()), mesh, ground_nodes, config)?;
    tmp.persist(path).map_err(|e| TetDeckError::IoError(e.error))?;

    log::info!("Successfully wrote deck to {:?}", path);
    Ok(())
}

/// Mesh and sets read back from a deck
#[derive(Debug, Clone, Default)]
pub struct DeckMesh {
    pub nodes: Vec<Node>,
    pub elements: Vec<TetElement>,
    pub fixed_nodes: Vec<usize>,
    pub slaves: Vec<ContactFaceTag>,
    pub masters: Vec<ContactFaceTag>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Nodes,
    Elements,
    FixSet,
    Slaves,
    Masters,
    Other,
}

/// Value of a `NAME=value` keyword parameter
fn keyword_parameter<'a>(params: &[&'a str], name: &str) -> Option<&'a str> {
    params.iter().find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if key.trim().eq_ignore_ascii_case(name) {
            Some(value.trim())
        } else {
            None
        }
    })
}

fn classify(keyword_line: &str) -> Section {
    let parts: Vec<&str> = keyword_line.split(',').map(str::trim).collect();
    let keyword = parts[0].to_ascii_uppercase();
    let params = &parts[1..];

    match keyword.as_str() {
        "*NODE" => Section::Nodes,
        "*ELEMENT" => Section::Elements,
        "*NSET" if keyword_parameter(params, "NSET") == Some(FIX_SET) => Section::FixSet,
        "*SURFACE" => match keyword_parameter(params, "NAME") {
            Some(SLAVE_SURFACE) => Section::Slaves,
            Some(MASTER_SURFACE) => Section::Masters,
            _ => Section::Other,
        },
        _ => Section::Other,
    }
}

/// Parse the node, element, ground set and contact surface sections of a deck
pub fn read_deck_mesh(text: &str) -> Result<DeckMesh> {
    let mut deck = DeckMesh::default();
    let mut section = Section::Other;

    for (k, raw_line) in text.lines().enumerate() {
        let line_no = k + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with("**") {
            continue;
        }
        if line.starts_with('*') {
            section = classify(line);
            continue;
        }

        let fields: Vec<&str> = line
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .collect();
        let int = |field: &str| -> Result<usize> {
            field.parse().map_err(|_| {
                TetDeckError::parse("deck", line_no, format!("'{}' is not an id", field))
            })
        };

        match section {
            Section::Nodes => {
                if fields.len() != 4 {
                    return Err(TetDeckError::parse(
                        "deck",
                        line_no,
                        format!("node line needs 4 fields, found {}", fields.len()),
                    ));
                }
                let real = |field: &str| -> Result<f64> {
                    field.parse().map_err(|_| {
                        TetDeckError::parse("deck", line_no, format!("'{}' is not a number", field))
                    })
                };
                deck.nodes.push(Node::new(
                    int(fields[0])?,
                    Point::new(real(fields[1])?, real(fields[2])?, real(fields[3])?),
                ));
            }
            Section::Elements => {
                if fields.len() != TET10_NODES + 1 {
                    return Err(TetDeckError::parse(
                        "deck",
                        line_no,
                        format!(
                            "element line needs {} fields, found {}",
                            TET10_NODES + 1,
                            fields.len()
                        ),
                    ));
                }
                let mut node_ids = [0usize; TET10_NODES];
                for (slot, field) in fields[1..].iter().enumerate() {
                    node_ids[slot] = int(*field)?;
                }
                deck.elements.push(TetElement::new(int(fields[0])?, node_ids));
            }
            Section::FixSet => {
                for field in fields {
                    deck.fixed_nodes.push(int(field)?);
                }
            }
            Section::Slaves | Section::Masters => {
                let tag = match fields.as_slice() {
                    [id, label] => FaceLabel::from_name(*label)
                        .map(|face| int(*id).map(|id| ContactFaceTag::new(id, face))),
                    _ => None,
                }
                .ok_or_else(|| {
                    TetDeckError::parse("deck", line_no, format!("bad surface line '{}'", line))
                })??;
                if section == Section::Slaves {
                    deck.slaves.push(tag);
                } else {
                    deck.masters.push(tag);
                }
            }
            Section::Other => {}
        }
    }

    Ok(deck)
}
