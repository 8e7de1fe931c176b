//! Global renumbering of per-object tetrahedral meshes
//!
//! Every object is tetrahedralized on its own, so its node and element ids
//! start again from the tool's index base. [`IndexAllocator`] turns those
//! local ids into one contiguous global numbering, one object at a time.

use crate::error::{Result, TetDeckError};
use crate::io::tetgen::RawTetMesh;
use crate::mesh::reorder::to_solver_order;
use crate::mesh::types::{Node, ObjectMesh, TetElement, TET10_NODES};

/// Running id counters for one deck
///
/// Objects must be assigned in the order they will appear in the deck;
/// the node offset carried between calls is what keeps element references
/// of later objects pointing at their own nodes.
#[derive(Debug, Clone)]
pub struct IndexAllocator {
    next_node_id: usize,
    next_element_id: usize,
    node_offset: usize,
}

impl Default for IndexAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexAllocator {
    /// Create an allocator for an empty mesh
    pub fn new() -> Self {
        Self {
            next_node_id: 1,
            next_element_id: 1,
            node_offset: 0,
        }
    }

    /// Id the next node will receive
    pub fn next_node_id(&self) -> usize {
        self.next_node_id
    }

    /// Id the next element will receive
    pub fn next_element_id(&self) -> usize {
        self.next_element_id
    }

    /// Highest node id assigned to previously completed objects
    pub fn node_offset(&self) -> usize {
        self.node_offset
    }

    /// Renumber one object's raw tables into global ids
    ///
    /// Nodes receive fresh ids in table order. Element references are
    /// shifted by the current node offset and permuted into solver order.
    /// The offset advances only once the whole object is done.
    pub fn assign(&mut self, name: &str, is_master: bool, raw: &RawTetMesh) -> Result<ObjectMesh> {
        let base = raw.nodes.first().map(|n| n.local_id).unwrap_or(1);
        if base > 1 {
            return Err(TetDeckError::IndexResolution(format!(
                "Object '{}': node table starts at local id {}, expected 0 or 1",
                name, base
            )));
        }

        let mut nodes = Vec::with_capacity(raw.nodes.len());
        for (k, raw_node) in raw.nodes.iter().enumerate() {
            let expected = base.checked_add(k);
            if expected != Some(raw_node.local_id) {
                return Err(TetDeckError::IndexResolution(format!(
                    "Object '{}': node table is not contiguous (row {} has local id {})",
                    name,
                    k + 1,
                    raw_node.local_id
                )));
            }
            nodes.push(Node::new(self.next_node_id, raw_node.position));
            self.next_node_id += 1;
        }

        let mut elements = Vec::with_capacity(raw.elements.len());
        for raw_element in &raw.elements {
            let mut global = [0usize; TET10_NODES];
            for (slot, &local_ref) in raw_element.nodes.iter().enumerate() {
                let index = local_ref
                    .checked_sub(base)
                    .filter(|&idx| idx < nodes.len())
                    .ok_or_else(|| {
                        TetDeckError::IndexResolution(format!(
                            "Object '{}': element {} references node {} which is not in its node table",
                            name, raw_element.local_id, local_ref
                        ))
                    })?;
                global[slot] = self.node_offset + index + 1;
            }

            let node_ids = to_solver_order(&global);
            check_distinct(name, raw_element.local_id, &node_ids)?;

            elements.push(TetElement::new(self.next_element_id, node_ids));
            self.next_element_id += 1;
        }

        self.node_offset = self.next_node_id - 1;

        log::debug!(
            "Assigned object '{}': {} nodes, {} elements, node offset now {}",
            name,
            nodes.len(),
            elements.len(),
            self.node_offset
        );

        Ok(ObjectMesh {
            name: name.to_string(),
            is_master,
            nodes,
            elements,
        })
    }
}

fn check_distinct(name: &str, local_id: usize, node_ids: &[usize; TET10_NODES]) -> Result<()> {
    for i in 0..TET10_NODES {
        if node_ids[i + 1..].contains(&node_ids[i]) {
            return Err(TetDeckError::InvalidMeshTopology(format!(
                "Object '{}': element {} references node {} more than once",
                name, local_id, node_ids[i]
            )));
        }
    }
    Ok(())
}
