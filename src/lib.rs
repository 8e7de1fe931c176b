//! Tetdeck Library
//!
//! Assembles independently tetrahedralized solids into one quadratic
//! tetrahedral mesh, tags the contact faces of master and slave objects,
//! fixes the nodes on the ground plane and writes a CalculiX / Abaqus
//! input deck.

pub mod cancel;
pub mod config;
pub mod contact;
pub mod error;
pub mod io;
pub mod mesh;
pub mod pipeline;

pub use error::{Result, TetDeckError};
