//! Node ordering conversion between the tetrahedralizer and the solver
//!
//! Both conventions list the four corners first. They differ in which edge
//! each of the six mid-edge nodes sits on (0-based corners):
//!
//! | slot | tetrahedralizer | solver (C3D10) |
//! |------|-----------------|----------------|
//! | 4    | (2,3)           | (0,1)          |
//! | 5    | (0,3)           | (1,2)          |
//! | 6    | (0,1)           | (2,0)          |
//! | 7    | (1,2)           | (0,3)          |
//! | 8    | (1,3)           | (1,3)          |
//! | 9    | (2,0)           | (2,3)          |

use crate::mesh::types::TET10_NODES;

/// Solver slot `i` takes the tetrahedralizer's slot `TETGEN_TO_C3D10[i]`
pub const TETGEN_TO_C3D10: [usize; TET10_NODES] = [0, 1, 2, 3, 6, 7, 9, 5, 8, 4];

/// Tetrahedralizer slot `i` takes the solver's slot `C3D10_TO_TETGEN[i]`
pub const C3D10_TO_TETGEN: [usize; TET10_NODES] = [0, 1, 2, 3, 9, 7, 4, 5, 8, 6];

/// Permute `values` so that `out[i] = values[table[i]]`
pub fn permute<T: Copy>(values: &[T; TET10_NODES], table: &[usize; TET10_NODES]) -> [T; TET10_NODES] {
    std::array::from_fn(|i| values[table[i]])
}

/// Reorder element nodes from tetrahedralizer order to solver order
pub fn to_solver_order<T: Copy>(values: &[T; TET10_NODES]) -> [T; TET10_NODES] {
    permute(values, &TETGEN_TO_C3D10)
}

/// Reorder element nodes from solver order back to tetrahedralizer order
pub fn to_tetgen_order<T: Copy>(values: &[T; TET10_NODES]) -> [T; TET10_NODES] {
    permute(values, &C3D10_TO_TETGEN)
}
