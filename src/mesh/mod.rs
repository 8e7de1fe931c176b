//! Mesh data structures and operations

pub mod assembly;
pub mod boundary;
pub mod geometry;
pub mod reorder;
pub mod types;

pub use assembly::IndexAllocator;
pub use boundary::detect_ground_nodes;
pub use geometry::*;
pub use types::*;
