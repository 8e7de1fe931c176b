//! Scene to deck assembly
//!
//! Objects are meshed and renumbered one after another, since every
//! object's ids start where the previous object's ended. Tagging only
//! reads the finished per-object meshes and runs afterwards.

use crate::cancel::CancelToken;
use crate::config::DeckConfig;
use crate::contact::tagging::{build_region, tag_object_faces};
use crate::error::{Result, TetDeckError};
use crate::io::report::ObjectSummary;
use crate::io::scene::{Scene, SurfaceObject};
use crate::io::stl::write_ascii_stl_file;
use crate::io::tetgen::{read_tables, RawTetMesh, TetgenRunner};
use crate::mesh::assembly::IndexAllocator;
use crate::mesh::boundary::detect_ground_nodes;
use crate::mesh::types::{GlobalMesh, ObjectMesh};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Pipeline stage reported to the progress callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Tetrahedralizing or importing an object and renumbering it
    Meshing,

    /// Tagging an object's contact faces
    Tagging,
}

/// Everything the deck is written from
#[derive(Debug, Clone)]
pub struct AssembledDeck {
    pub mesh: GlobalMesh,

    /// Ids of nodes on the ground plane, ascending
    pub ground_nodes: Vec<usize>,

    /// Per-object contribution, in processing order
    pub objects: Vec<ObjectSummary>,
}

/// Builds the global mesh of a scene
pub struct DeckBuilder<'a> {
    config: &'a DeckConfig,
    runner: TetgenRunner,
    cancel: CancelToken,
}

impl<'a> DeckBuilder<'a> {
    pub fn new(config: &'a DeckConfig) -> Self {
        Self {
            config,
            runner: TetgenRunner::from_config(&config.tetgen),
            cancel: CancelToken::new(),
        }
    }

    /// Observe `cancel` between objects and while the tetrahedralizer runs
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_runner(mut self, runner: TetgenRunner) -> Self {
        self.runner = runner;
        self
    }

    /// Mesh, renumber and tag every object of `scene`
    ///
    /// `progress` is called once per object and stage before the work starts.
    pub fn build<F>(&self, scene: &Scene, mut progress: F) -> Result<AssembledDeck>
    where
        F: FnMut(Stage, &str),
    {
        let objects = scene.ordered(self.config.object_order.as_deref())?;
        log::info!("Building deck from {} objects", objects.len());

        let mut allocator = IndexAllocator::new();
        let mut meshes = Vec::with_capacity(objects.len());
        let mut scratch: Option<TempDir> = None;

        for (index, object) in objects.iter().enumerate() {
            self.check_cancelled(index, objects.len())?;
            progress(Stage::Meshing, &object.name);
            log::info!("Importing object '{}'", object.name);

            let raw = match &object.tables {
                Some(tables) => read_tables(&tables.nodes, &tables.elements, self.config.precision)
                    .map_err(|e| e.in_object(&object.name))?,
                None => {
                    let dir = self.scratch_dir(&mut scratch)?;
                    self.tetrahedralize(index, object, &dir)?
                }
            };
            if raw.elements.is_empty() {
                return Err(TetDeckError::TetrahedralizationFailure {
                    object: object.name.clone(),
                    reason: "element table has no elements".to_string(),
                });
            }

            meshes.push(allocator.assign(&object.name, object.master, &raw)?);
        }

        let policy = self.config.tagging.policy;
        let first_match_only = self.config.tagging.first_match_only();
        log::info!(
            "Tagging contact faces with the {} policy{}",
            policy,
            if first_match_only { ", first match only" } else { "" }
        );

        let mut global = GlobalMesh::new();
        let mut summaries = Vec::with_capacity(objects.len());

        for (index, (object, mesh)) in objects.iter().zip(&meshes).enumerate() {
            self.check_cancelled(index, objects.len())?;
            progress(Stage::Tagging, &object.name);

            let region = build_region(policy, object, self.config.precision)?;
            let tags = tag_object_faces(mesh, region.as_ref(), first_match_only)?;

            summaries.push(summarize(mesh, tags.len()));
            global.absorb(mesh);
            global.add_tags(mesh.role(), tags);
        }

        let ground_nodes = detect_ground_nodes(&global.nodes);
        if ground_nodes.is_empty() {
            log::warn!("No nodes lie on the ground plane z = 0, the deck has no boundary conditions");
        } else {
            log::info!("Found {} ground nodes", ground_nodes.len());
        }

        Ok(AssembledDeck {
            mesh: global,
            ground_nodes,
            objects: summaries,
        })
    }

    fn check_cancelled(&self, done: usize, total: usize) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(TetDeckError::Cancelled(format!(
                "after {} of {} objects",
                done, total
            )));
        }
        Ok(())
    }

    /// Directory for surfaces and tables; a temporary one lives as long as `scratch`
    fn scratch_dir(&self, scratch: &mut Option<TempDir>) -> Result<PathBuf> {
        if let Some(dir) = &self.config.tetgen.work_dir {
            std::fs::create_dir_all(dir)?;
            return Ok(dir.clone());
        }

        let dir = match scratch.take() {
            Some(dir) => dir,
            None => tempfile::tempdir()?,
        };
        let path = dir.path().to_path_buf();
        *scratch = Some(dir);
        Ok(path)
    }

    fn tetrahedralize(&self, index: usize, object: &SurfaceObject, dir: &Path) -> Result<RawTetMesh> {
        let input = dir.join(format!("{}_{}.stl", index, file_stem(&object.name)));
        write_ascii_stl_file(object, &input)?;

        let output = self.runner.run(&object.name, &input, &self.cancel)?;
        read_tables(&output.nodes, &output.elements, self.config.precision)
            .map_err(|e| e.in_object(&object.name))
    }
}

/// Build the global mesh of `scene` with the configured tetrahedralizer
pub fn build_deck(scene: &Scene, config: &DeckConfig) -> Result<AssembledDeck> {
    DeckBuilder::new(config).build(scene, |_, _| {})
}

fn summarize(mesh: &ObjectMesh, tagged_faces: usize) -> ObjectSummary {
    ObjectSummary {
        name: mesh.name.clone(),
        role: mesh.role(),
        first_node_id: mesh.nodes.first().map_or(0, |n| n.id),
        nodes: mesh.nodes.len(),
        first_element_id: mesh.elements.first().map_or(0, |e| e.id),
        elements: mesh.elements.len(),
        tagged_faces,
    }
}

/// Object name reduced to a safe file name
fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
