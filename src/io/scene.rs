//! JSON input scene: the triangulated solids to mesh
//!
//! The editor that produced the surfaces is not part of this crate; a scene
//! file carries what the pipeline needs from it. Each object provides its
//! vertex positions, triangles, contact role and the vertices of its
//! contact vertex group.

use crate::error::{Result, TetDeckError};
use crate::mesh::geometry::round_point;
use crate::mesh::types::Point;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Already tetrahedralized tables for an object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableFiles {
    /// Node table (`.node`)
    pub nodes: PathBuf,

    /// Element table (`.ele`)
    pub elements: PathBuf,
}

/// One closed, triangulated input solid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfaceObject {
    /// Unique object name
    pub name: String,

    /// Tagged faces form the master surface when true, the slave otherwise
    #[serde(default)]
    pub master: bool,

    /// Vertex positions
    pub vertices: Vec<[f64; 3]>,

    /// Triangles as vertex index triples
    pub triangles: Vec<[usize; 3]>,

    /// Indices of vertices in the contact vertex group
    #[serde(default)]
    pub tagged_vertices: Vec<usize>,

    /// Skip the tetrahedralizer and import these tables instead
    #[serde(default)]
    pub tables: Option<TableFiles>,
}

impl SurfaceObject {
    /// Vertex position by index
    pub fn vertex(&self, index: usize) -> Result<Point> {
        self.vertices
            .get(index)
            .map(|&[x, y, z]| Point::new(x, y, z))
            .ok_or_else(|| {
                TetDeckError::InvalidScene(format!(
                    "Object '{}': vertex index {} out of bounds ({} vertices)",
                    self.name,
                    index,
                    self.vertices.len()
                ))
            })
    }

    /// Check that every triangle and tagged index resolves
    pub fn validate(&self) -> Result<()> {
        if self.vertices.is_empty() || self.triangles.is_empty() {
            return Err(TetDeckError::InvalidScene(format!(
                "Object '{}' has no surface",
                self.name
            )));
        }
        for &[a, b, c] in &self.triangles {
            self.vertex(a)?;
            self.vertex(b)?;
            self.vertex(c)?;
            if a == b || b == c || a == c {
                return Err(TetDeckError::InvalidMeshTopology(format!(
                    "Object '{}': triangle [{}, {}, {}] repeats a vertex",
                    self.name, a, b, c
                )));
            }
        }
        for &index in &self.tagged_vertices {
            self.vertex(index)?;
        }
        Ok(())
    }

    /// Tagged vertex positions rounded to `precision` decimals
    pub fn tagged_points(&self, precision: u32) -> Result<Vec<Point>> {
        self.tagged_vertices
            .iter()
            .map(|&index| Ok(round_point(&self.vertex(index)?, precision)))
            .collect()
    }

    /// Triangles whose three vertices are all tagged, rounded to `precision`
    pub fn tagged_triangles(&self, precision: u32) -> Result<Vec<[Point; 3]>> {
        let tagged: HashSet<usize> = self.tagged_vertices.iter().copied().collect();
        self.triangles
            .iter()
            .filter(|tri| tri.iter().all(|v| tagged.contains(v)))
            .map(|&[a, b, c]| {
                Ok([
                    round_point(&self.vertex(a)?, precision),
                    round_point(&self.vertex(b)?, precision),
                    round_point(&self.vertex(c)?, precision),
                ])
            })
            .collect()
    }
}

/// A set of objects to assemble into one deck
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    pub objects: Vec<SurfaceObject>,
}

impl Scene {
    /// Load a scene from a JSON file
    ///
    /// Relative table paths are resolved against the scene file's directory.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut scene: Scene = serde_json::from_reader(reader).map_err(|e| {
            TetDeckError::InvalidScene(format!("Failed to parse scene file: {}", e))
        })?;

        if let Some(dir) = path.parent() {
            for object in &mut scene.objects {
                if let Some(tables) = object.tables.as_mut() {
                    tables.nodes = dir.join(&tables.nodes);
                    tables.elements = dir.join(&tables.elements);
                }
            }
        }

        scene.validate()?;
        Ok(scene)
    }

    /// Save the scene to a JSON file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        serde_json::to_writer_pretty(file, self).map_err(|e| {
            TetDeckError::InvalidScene(format!("Failed to write scene file: {}", e))
        })?;
        Ok(())
    }

    /// Check object names are unique and every object is well formed
    pub fn validate(&self) -> Result<()> {
        if self.objects.is_empty() {
            return Err(TetDeckError::InvalidScene("Scene has no objects".to_string()));
        }
        let mut names = HashSet::new();
        for object in &self.objects {
            if !names.insert(object.name.as_str()) {
                return Err(TetDeckError::InvalidScene(format!(
                    "Duplicate object name '{}'",
                    object.name
                )));
            }
            object.validate()?;
        }
        Ok(())
    }

    /// Objects in processing order
    ///
    /// Node and element ids depend on this order. An explicit `order` must
    /// name every object exactly once; without one the file order is used.
    pub fn ordered(&self, order: Option<&[String]>) -> Result<Vec<&SurfaceObject>> {
        let Some(order) = order else {
            return Ok(self.objects.iter().collect());
        };

        if order.len() != self.objects.len() {
            return Err(TetDeckError::ConfigError(format!(
                "Object order names {} object(s) but the scene has {}",
                order.len(),
                self.objects.len()
            )));
        }

        let mut seen = HashSet::new();
        order
            .iter()
            .map(|name| {
                if !seen.insert(name.as_str()) {
                    return Err(TetDeckError::ConfigError(format!(
                        "Object '{}' appears twice in the object order",
                        name
                    )));
                }
                self.objects
                    .iter()
                    .find(|object| &object.name == name)
                    .ok_or_else(|| {
                        TetDeckError::ConfigError(format!(
                            "Object order names unknown object '{}'",
                            name
                        ))
                    })
            })
            .collect()
    }
}
