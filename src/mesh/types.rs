//! Core mesh data structures

use crate::contact::types::{ContactFaceTag, SurfaceRole};
use nalgebra::{Point3, Vector3};
use std::fmt;

/// 3D point type
pub type Point = Point3<f64>;

/// 3D vector type
pub type Vec3 = Vector3<f64>;

/// Number of nodes of a quadratic tetrahedron
pub const TET10_NODES: usize = 10;

/// Mesh node with a 1-based global id
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub id: usize,
    pub position: Point,
}

impl Node {
    /// Create a new node
    pub fn new(id: usize, position: Point) -> Self {
        Self { id, position }
    }
}

/// Quadratic tetrahedron (C3D10) with 10 global node ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TetElement {
    /// 1-based global element id
    pub id: usize,

    /// Node ids in solver ordering:
    ///   corners:   0,1,2,3
    ///   mid-edges: 4=(0,1) 5=(1,2) 6=(2,0) 7=(0,3) 8=(1,3) 9=(2,3)
    pub node_ids: [usize; TET10_NODES],
}

impl TetElement {
    /// Create a new element
    pub fn new(id: usize, node_ids: [usize; TET10_NODES]) -> Self {
        Self { id, node_ids }
    }

    /// The four corner node ids
    pub fn corners(&self) -> [usize; 4] {
        [
            self.node_ids[0],
            self.node_ids[1],
            self.node_ids[2],
            self.node_ids[3],
        ]
    }

    /// Corner node ids of one triangular face
    pub fn face(&self, label: FaceLabel) -> [usize; 3] {
        label.corner_slots().map(|slot| self.node_ids[slot])
    }
}

/// One of the four triangular faces of a tetrahedron
///
/// Faces are defined by corner slots only; mid-edge nodes never bound a
/// face in this model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FaceLabel {
    S1,
    S2,
    S3,
    S4,
}

impl FaceLabel {
    /// All faces in template order
    pub const ALL: [FaceLabel; 4] = [FaceLabel::S1, FaceLabel::S2, FaceLabel::S3, FaceLabel::S4];

    /// 0-based corner slots of this face: S1=1-2-3, S2=1-4-2, S3=2-4-3, S4=3-4-1
    pub fn corner_slots(self) -> [usize; 3] {
        match self {
            FaceLabel::S1 => [0, 1, 2],
            FaceLabel::S2 => [0, 3, 1],
            FaceLabel::S3 => [1, 3, 2],
            FaceLabel::S4 => [2, 3, 0],
        }
    }

    /// Parse a label such as `S3`
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "S1" => Some(FaceLabel::S1),
            "S2" => Some(FaceLabel::S2),
            "S3" => Some(FaceLabel::S3),
            "S4" => Some(FaceLabel::S4),
            _ => None,
        }
    }
}

impl fmt::Display for FaceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FaceLabel::S1 => "S1",
            FaceLabel::S2 => "S2",
            FaceLabel::S3 => "S3",
            FaceLabel::S4 => "S4",
        };
        f.write_str(name)
    }
}

/// Nodes and elements of one input object after global renumbering
///
/// Only lives for one pass over the input objects.
#[derive(Debug, Clone)]
pub struct ObjectMesh {
    /// Name of the source object
    pub name: String,

    /// Whether the object's tagged faces form the master surface
    pub is_master: bool,

    /// Nodes with global ids
    pub nodes: Vec<Node>,

    /// Elements with global ids, in solver node ordering
    pub elements: Vec<TetElement>,
}

impl ObjectMesh {
    /// Contact role of this object
    pub fn role(&self) -> SurfaceRole {
        if self.is_master {
            SurfaceRole::Master
        } else {
            SurfaceRole::Slave
        }
    }
}

/// Fully assembled mesh for one run
#[derive(Debug, Clone, Default)]
pub struct GlobalMesh {
    /// All nodes, in id order
    pub nodes: Vec<Node>,

    /// All elements, in id order
    pub elements: Vec<TetElement>,

    /// Faces of the master contact surface
    pub masters: Vec<ContactFaceTag>,

    /// Faces of the slave contact surface
    pub slaves: Vec<ContactFaceTag>,
}

impl GlobalMesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Get total number of nodes
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Get total number of elements
    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }

    /// Look up a node by global id
    pub fn node(&self, id: usize) -> Option<&Node> {
        // ids are contiguous from 1, so the id doubles as an index
        id.checked_sub(1)
            .and_then(|idx| self.nodes.get(idx))
            .filter(|node| node.id == id)
    }

    /// Append an object's nodes and elements
    pub fn absorb(&mut self, object: &ObjectMesh) {
        self.nodes.extend_from_slice(&object.nodes);
        self.elements.extend_from_slice(&object.elements);
    }

    /// Append tagged faces to the surface matching `role`
    pub fn add_tags(&mut self, role: SurfaceRole, tags: Vec<ContactFaceTag>) {
        match role {
            SurfaceRole::Master => self.masters.extend(tags),
            SurfaceRole::Slave => self.slaves.extend(tags),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_corners() {
        let tet = TetElement::new(1, [10, 11, 12, 13, 14, 15, 16, 17, 18, 19]);

        assert_eq!(tet.face(FaceLabel::S1), [10, 11, 12]);
        assert_eq!(tet.face(FaceLabel::S2), [10, 13, 11]);
        assert_eq!(tet.face(FaceLabel::S3), [11, 13, 12]);
        assert_eq!(tet.face(FaceLabel::S4), [12, 13, 10]);
    }

    #[test]
    fn test_faces_use_corners_only() {
        for label in FaceLabel::ALL {
            assert!(label.corner_slots().iter().all(|&slot| slot < 4));
        }
    }

    #[test]
    fn test_face_label_names() {
        for label in FaceLabel::ALL {
            assert_eq!(FaceLabel::from_name(&label.to_string()), Some(label));
        }
        assert_eq!(FaceLabel::from_name("S5"), None);
    }

    #[test]
    fn test_node_lookup() {
        let mut mesh = GlobalMesh::new();
        let object = ObjectMesh {
            name: "A".to_string(),
            is_master: true,
            nodes: vec![
                Node::new(1, Point::new(0.0, 0.0, 0.0)),
                Node::new(2, Point::new(1.0, 0.0, 0.0)),
            ],
            elements: Vec::new(),
        };
        mesh.absorb(&object);

        assert_eq!(mesh.num_nodes(), 2);
        assert_eq!(mesh.node(2).map(|n| n.position.x), Some(1.0));
        assert!(mesh.node(0).is_none());
        assert!(mesh.node(3).is_none());
    }
}
