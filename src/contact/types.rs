//! Contact surface data types

use crate::mesh::types::FaceLabel;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One tetrahedron face that belongs to a contact surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContactFaceTag {
    /// Global element id
    pub element_id: usize,

    /// Which face of the element
    pub face: FaceLabel,
}

impl ContactFaceTag {
    /// Create a new face tag
    pub fn new(element_id: usize, face: FaceLabel) -> Self {
        Self { element_id, face }
    }
}

impl fmt::Display for ContactFaceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.element_id, self.face)
    }
}

/// Side of the contact pair an object's tagged faces belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceRole {
    Master,
    Slave,
}

impl fmt::Display for SurfaceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceRole::Master => f.write_str("master"),
            SurfaceRole::Slave => f.write_str("slave"),
        }
    }
}

/// How a face corner is decided to lie on the tagged surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MembershipPolicy {
    /// Corner coincides with a tagged vertex after rounding
    ///
    /// Accepts any face whose three corners are individually tagged, even
    /// when they do not lie on one tagged polygon.
    #[default]
    VertexSet,

    /// Corner lies on one of the tagged triangles of the source surface
    ///
    /// Also accepts corners the tetrahedralizer inserted inside a tagged
    /// triangle.
    TriangleContainment,
}

impl MembershipPolicy {
    /// Whether tagging stops at the first matching face of each element
    /// when the configuration does not say otherwise
    pub fn default_first_match_only(self) -> bool {
        match self {
            MembershipPolicy::VertexSet => false,
            MembershipPolicy::TriangleContainment => true,
        }
    }
}

impl fmt::Display for MembershipPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MembershipPolicy::VertexSet => f.write_str("vertex-set"),
            MembershipPolicy::TriangleContainment => f.write_str("triangle-containment"),
        }
    }
}

impl std::str::FromStr for MembershipPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "vertex-set" => Ok(MembershipPolicy::VertexSet),
            "triangle-containment" => Ok(MembershipPolicy::TriangleContainment),
            other => Err(format!(
                "unknown membership policy '{}' (expected 'vertex-set' or 'triangle-containment')",
                other
            )),
        }
    }
}
