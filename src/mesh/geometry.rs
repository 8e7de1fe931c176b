//! Geometric helpers: coordinate rounding and point-in-triangle containment

use crate::error::{Result, TetDeckError};
use crate::mesh::types::{Point, Vec3};

/// Tolerance on barycentric coordinates for boundary points
const BARYCENTRIC_EPS: f64 = 1e-9;

/// Round a value to `precision` decimal places
pub fn round_to(value: f64, precision: u32) -> f64 {
    let scale = 10f64.powi(precision as i32);
    (value * scale).round() / scale
}

/// Round every coordinate of a point to `precision` decimal places
pub fn round_point(point: &Point, precision: u32) -> Point {
    Point::new(
        round_to(point.x, precision),
        round_to(point.y, precision),
        round_to(point.z, precision),
    )
}

/// Hashable key of a point quantized to a decimal precision
///
/// Two points share a key exactly when they are equal after rounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointKey([i64; 3]);

impl PointKey {
    /// Quantize a point to `precision` decimal places
    pub fn new(point: &Point, precision: u32) -> Self {
        let scale = 10f64.powi(precision as i32);
        let q = |v: f64| (v * scale).round() as i64;
        PointKey([q(point.x), q(point.y), q(point.z)])
    }
}

/// Compute the (non-normalized) normal of a triangle
pub fn triangle_normal(a: &Point, b: &Point, c: &Point) -> Vec3 {
    (b - a).cross(&(c - a))
}

/// Compute the area of a triangle
pub fn triangle_area(a: &Point, b: &Point, c: &Point) -> f64 {
    triangle_normal(a, b, c).norm() / 2.0
}

/// Compute the centroid of a triangle
pub fn triangle_centroid(a: &Point, b: &Point, c: &Point) -> Point {
    Point::from((a.coords + b.coords + c.coords) / 3.0)
}

/// Test whether `point` lies on triangle `abc`
///
/// The point is projected onto the triangle's plane; it is contained when
/// the projection equals the point after rounding to `precision` decimals
/// and the projection falls inside the triangle or on its boundary.
/// Coinciding with a vertex always counts as contained.
pub fn point_in_triangle(
    point: &Point,
    a: &Point,
    b: &Point,
    c: &Point,
    precision: u32,
) -> Result<bool> {
    let normal = triangle_normal(a, b, c);
    let norm = normal.norm();
    if norm < 1e-12 {
        return Err(TetDeckError::GeometryError(
            "Degenerate triangle (zero area)".to_string(),
        ));
    }
    let unit = normal / norm;

    let distance = (point - a).dot(&unit);
    let projected = Point::from(point.coords - distance * unit);
    if PointKey::new(&projected, precision) != PointKey::new(point, precision) {
        return Ok(false);
    }

    // Barycentric coordinates of the projection
    let v0 = b - a;
    let v1 = c - a;
    let v2 = projected - a;
    let d00 = v0.dot(&v0);
    let d01 = v0.dot(&v1);
    let d11 = v1.dot(&v1);
    let d20 = v2.dot(&v0);
    let d21 = v2.dot(&v1);
    let denom = d00 * d11 - d01 * d01;

    let v = (d11 * d20 - d01 * d21) / denom;
    let w = (d00 * d21 - d01 * d20) / denom;
    let u = 1.0 - v - w;

    Ok(u >= -BARYCENTRIC_EPS && v >= -BARYCENTRIC_EPS && w >= -BARYCENTRIC_EPS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_triangle() -> (Point, Point, Point) {
        (
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(0.0, 1.0, 0.0),
        )
    }

    #[test]
    fn test_round_to() {
        assert_relative_eq!(round_to(1.23456, 2), 1.23, epsilon = 1e-12);
        assert_relative_eq!(round_to(-0.005001, 2), -0.01, epsilon = 1e-12);
        assert_relative_eq!(round_to(2.5, 0), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_point_key_absorbs_jitter() {
        let p = Point::new(0.1, 0.2, 0.3);
        let q = Point::new(0.1 + 1e-7, 0.2 - 1e-7, 0.30000000000000004);
        assert_eq!(PointKey::new(&p, 2), PointKey::new(&q, 2));
        assert_ne!(PointKey::new(&p, 2), PointKey::new(&Point::new(0.11, 0.2, 0.3), 2));
    }

    #[test]
    fn test_triangle_properties() {
        let (a, b, c) = unit_triangle();
        assert_relative_eq!(triangle_area(&a, &b, &c), 0.5, epsilon = 1e-12);

        let centroid = triangle_centroid(&a, &b, &c);
        assert_relative_eq!(centroid.x, 1.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(centroid.y, 1.0 / 3.0, epsilon = 1e-12);

        let normal = triangle_normal(&a, &b, &c);
        assert_relative_eq!(normal.z, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_point_in_triangle_vertices_and_interior() {
        let (a, b, c) = unit_triangle();

        assert!(point_in_triangle(&a, &a, &b, &c, 2).unwrap());
        assert!(point_in_triangle(&c, &a, &b, &c, 2).unwrap());
        assert!(point_in_triangle(&Point::new(0.25, 0.25, 0.0), &a, &b, &c, 2).unwrap());
        // On the hypotenuse
        assert!(point_in_triangle(&Point::new(0.5, 0.5, 0.0), &a, &b, &c, 2).unwrap());
    }

    #[test]
    fn test_point_in_triangle_outside() {
        let (a, b, c) = unit_triangle();

        assert!(!point_in_triangle(&Point::new(0.6, 0.6, 0.0), &a, &b, &c, 2).unwrap());
        assert!(!point_in_triangle(&Point::new(-0.1, 0.5, 0.0), &a, &b, &c, 2).unwrap());
        // Off the plane
        assert!(!point_in_triangle(&Point::new(0.25, 0.25, 0.5), &a, &b, &c, 2).unwrap());
    }

    #[test]
    fn test_point_in_triangle_off_plane_within_rounding() {
        let (a, b, c) = unit_triangle();
        let p = Point::new(0.25, 0.25, 0.001);
        assert!(point_in_triangle(&p, &a, &b, &c, 2).unwrap());
        assert!(!point_in_triangle(&p, &a, &b, &c, 3).unwrap());
    }

    #[test]
    fn test_point_in_degenerate_triangle() {
        let a = Point::new(0.0, 0.0, 0.0);
        let b = Point::new(1.0, 0.0, 0.0);
        let c = Point::new(2.0, 0.0, 0.0);
        assert!(point_in_triangle(&a, &a, &b, &c, 2).is_err());
    }
}
