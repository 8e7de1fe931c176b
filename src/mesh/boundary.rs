//! Ground boundary detection

use crate::mesh::types::Node;

/// Ids of nodes lying on the ground plane `z == 0`
///
/// The comparison is exact: coordinates were already rounded at import, so
/// anything that is not exactly zero is treated as above or below ground.
/// Output follows node order, which is ascending id order.
pub fn detect_ground_nodes(nodes: &[Node]) -> Vec<usize> {
    nodes
        .iter()
        .filter(|node| node.position.z == 0.0)
        .map(|node| node.id)
        .collect()
}
