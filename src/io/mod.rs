//! I/O module for scenes, tetrahedralizer tables and output files

pub mod deck;
pub mod report;
pub mod scene;
pub mod stl;
pub mod tetgen;
pub mod vtu;

pub use deck::{read_deck_mesh, write_deck, write_deck_file, DeckMesh};
pub use report::{DeckTotals, ObjectSummary, RunReport};
pub use scene::{Scene, SurfaceObject, TableFiles};
pub use stl::{write_ascii_stl, write_ascii_stl_file};
pub use tetgen::{read_tables, RawTetMesh, TetgenOutput, TetgenRunner};
pub use vtu::write_tet_mesh_vtu;
