//! Contact surface tagging
//!
//! Every face of every element of an object is tested against the object's
//! tagged region. A face is tagged when all three of its corners lie in the
//! region; what "lie in" means is decided by the [`MembershipPolicy`].

use crate::contact::types::{ContactFaceTag, MembershipPolicy};
use crate::error::{Result, TetDeckError};
use crate::io::scene::SurfaceObject;
use crate::mesh::geometry::{point_in_triangle, triangle_centroid, triangle_area, PointKey};
use crate::mesh::types::{FaceLabel, ObjectMesh, Point, TetElement};
use kiddo::ImmutableKdTree;
use std::collections::HashSet;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Geometry a face corner is tested against
pub trait TaggedRegion: Send + Sync {
    /// Whether `point` lies in the tagged region
    fn contains(&self, point: &Point) -> bool;
}

/// Tagged vertices of the source surface, compared after rounding
#[derive(Debug, Clone)]
pub struct TaggedVertexSet {
    keys: HashSet<PointKey>,
    precision: u32,
}

impl TaggedVertexSet {
    pub fn new(points: &[Point], precision: u32) -> Self {
        let keys = points.iter().map(|p| PointKey::new(p, precision)).collect();
        Self { keys, precision }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl TaggedRegion for TaggedVertexSet {
    fn contains(&self, point: &Point) -> bool {
        self.keys.contains(&PointKey::new(point, self.precision))
    }
}

/// Tagged triangles of the source surface
///
/// Triangles are indexed by centroid so each query only tests the few
/// triangles whose bounding sphere can reach the point.
pub struct TaggedTriangles {
    triangles: Vec<[Point; 3]>,
    tree: Option<ImmutableKdTree<f64, 3>>,
    search_radius: f64,
    precision: u32,
}

impl TaggedTriangles {
    /// Build the region, skipping degenerate triangles
    pub fn new(triangles: Vec<[Point; 3]>, precision: u32) -> Self {
        let (triangles, degenerate): (Vec<_>, Vec<_>) = triangles
            .into_iter()
            .partition(|[a, b, c]| triangle_area(a, b, c) > 1e-12);
        if !degenerate.is_empty() {
            log::warn!(
                "Ignoring {} degenerate tagged triangle(s)",
                degenerate.len()
            );
        }

        let centroids: Vec<[f64; 3]> = triangles
            .iter()
            .map(|[a, b, c]| {
                let centroid = triangle_centroid(a, b, c);
                [centroid.x, centroid.y, centroid.z]
            })
            .collect();

        // Every triangle lies inside the sphere around its centroid that
        // reaches its farthest vertex
        let max_reach = triangles
            .iter()
            .zip(centroids.iter())
            .flat_map(|(tri, c)| {
                let centroid = Point::new(c[0], c[1], c[2]);
                tri.iter().map(move |v| (v - centroid).norm())
            })
            .fold(0.0f64, f64::max);
        let search_radius = max_reach + 10f64.powi(-(precision as i32));

        let tree = if centroids.is_empty() {
            None
        } else {
            Some(ImmutableKdTree::new_from_slice(&centroids))
        };

        Self {
            triangles,
            tree,
            search_radius,
            precision,
        }
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}

impl TaggedRegion for TaggedTriangles {
    fn contains(&self, point: &Point) -> bool {
        let Some(tree) = &self.tree else {
            return false;
        };

        let candidates = tree.within::<kiddo::SquaredEuclidean>(
            &[point.x, point.y, point.z],
            self.search_radius * self.search_radius,
        );

        candidates.iter().any(|neighbor| {
            let [a, b, c] = &self.triangles[neighbor.item as usize];
            point_in_triangle(point, a, b, c, self.precision).unwrap_or(false)
        })
    }
}

/// Build the tagged region of a source surface for a policy
pub fn build_region(
    policy: MembershipPolicy,
    surface: &SurfaceObject,
    precision: u32,
) -> Result<Box<dyn TaggedRegion>> {
    match policy {
        MembershipPolicy::VertexSet => {
            let region = TaggedVertexSet::new(&surface.tagged_points(precision)?, precision);
            log::debug!(
                "Object '{}': {} distinct tagged vertices",
                surface.name,
                region.len()
            );
            Ok(Box::new(region))
        }
        MembershipPolicy::TriangleContainment => {
            let region = TaggedTriangles::new(surface.tagged_triangles(precision)?, precision);
            log::debug!(
                "Object '{}': {} tagged triangles",
                surface.name,
                region.len()
            );
            Ok(Box::new(region))
        }
    }
}

/// Find the faces of an object's elements that lie on its tagged region
///
/// Faces are reported in element order and, within an element, in template
/// order S1..S4. With `first_match_only` an element contributes at most one
/// face.
pub fn tag_object_faces(
    object: &ObjectMesh,
    region: &dyn TaggedRegion,
    first_match_only: bool,
) -> Result<Vec<ContactFaceTag>> {
    log::info!(
        "Tagging contact faces of '{}' ({} elements)",
        object.name,
        object.elements.len()
    );

    // Threshold for parallelization (below this, overhead isn't worth it)
    const PARALLEL_THRESHOLD: usize = 5000;

    #[cfg(feature = "parallel")]
    let per_element: Result<Vec<Vec<ContactFaceTag>>> =
        if object.elements.len() >= PARALLEL_THRESHOLD {
            object
                .elements
                .par_iter()
                .map(|element| tag_element(object, element, region, first_match_only))
                .collect()
        } else {
            object
                .elements
                .iter()
                .map(|element| tag_element(object, element, region, first_match_only))
                .collect()
        };

    #[cfg(not(feature = "parallel"))]
    let per_element: Result<Vec<Vec<ContactFaceTag>>> = object
        .elements
        .iter()
        .map(|element| tag_element(object, element, region, first_match_only))
        .collect();

    let tags: Vec<ContactFaceTag> = per_element?.into_iter().flatten().collect();

    log::info!(
        "Tagged {} {} face(s) on '{}'",
        tags.len(),
        object.role(),
        object.name
    );

    Ok(tags)
}

fn tag_element(
    object: &ObjectMesh,
    element: &TetElement,
    region: &dyn TaggedRegion,
    first_match_only: bool,
) -> Result<Vec<ContactFaceTag>> {
    let mut tags = Vec::new();

    for label in FaceLabel::ALL {
        let corners = element.face(label);
        let mut on_surface = true;
        for id in corners {
            if !region.contains(node_position(object, id)?) {
                on_surface = false;
                break;
            }
        }

        if on_surface {
            tags.push(ContactFaceTag::new(element.id, label));
            if first_match_only {
                break;
            }
        }
    }

    Ok(tags)
}

/// Resolve a global node id against the object's own node list
fn node_position(object: &ObjectMesh, id: usize) -> Result<&Point> {
    let first = object.nodes.first().map(|n| n.id).unwrap_or(1);
    id.checked_sub(first)
        .and_then(|idx| object.nodes.get(idx))
        .filter(|node| node.id == id)
        .map(|node| &node.position)
        .ok_or_else(|| {
            TetDeckError::IndexResolution(format!(
                "Object '{}': node {} is not part of this object",
                object.name, id
            ))
        })
}
