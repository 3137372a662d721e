//! Plane equation used for volume slices.
//!
//! A slice plane is rebuilt for every draw from the view state. A plane whose
//! normal is degenerate is kept around but marked invalid, and callers must
//! skip drawing when [`Plane::is_valid`] is false.

use glam::Vec3;

/// Normals shorter than this are treated as degenerate.
const MIN_NORMAL_LENGTH: f32 = 1.0e-6;

/// A plane defined by a unit normal and a point on the plane.
///
/// The equation is `normal · p + d = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    normal: Vec3,
    point: Vec3,
    d: f32,
    valid: bool,
}

impl Plane {
    /// Creates a plane from a normal vector and a point on the plane.
    ///
    /// The normal is normalized. A zero-length or non-finite normal yields an
    /// invalid plane.
    pub fn new(normal: Vec3, point: Vec3) -> Self {
        let length = normal.length();
        if !length.is_finite() || length < MIN_NORMAL_LENGTH || !point.is_finite() {
            return Self::invalid();
        }
        let normal = normal / length;
        Self {
            normal,
            point,
            d: -normal.dot(point),
            valid: true,
        }
    }

    /// Returns an invalid plane marker.
    pub fn invalid() -> Self {
        Self {
            normal: Vec3::ZERO,
            point: Vec3::ZERO,
            d: 0.0,
            valid: false,
        }
    }

    /// Returns whether the plane has a usable normal.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Returns the unit normal of the plane.
    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    /// Returns the reference point the plane was built from.
    pub fn point(&self) -> Vec3 {
        self.point
    }

    /// Returns the `d` coefficient of the plane equation.
    pub fn d(&self) -> f32 {
        self.d
    }

    /// Returns the signed distance from a point to the plane.
    ///
    /// Positive values are on the side the normal points toward.
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.d
    }

    /// Projects a point onto the plane.
    pub fn project(&self, point: Vec3) -> Vec3 {
        point - self.signed_distance(point) * self.normal
    }

    /// Computes the segment where a triangle crosses the plane.
    ///
    /// Returns `None` when the triangle lies entirely on one side of the plane
    /// or only touches it at a single vertex.
    pub fn triangle_intersection(&self, a: Vec3, b: Vec3, c: Vec3) -> Option<(Vec3, Vec3)> {
        if !self.valid {
            return None;
        }
        let verts = [a, b, c];
        let d: [f32; 3] = std::array::from_fn(|i| self.signed_distance(verts[i]));

        let mut points: Vec<Vec3> = Vec::with_capacity(3);
        for &(i, j) in &[(0usize, 1usize), (1, 2), (2, 0)] {
            if d[i] == 0.0 {
                push_unique(&mut points, verts[i]);
            }
            if d[i] * d[j] < 0.0 {
                let t = d[i] / (d[i] - d[j]);
                push_unique(&mut points, verts[i].lerp(verts[j], t));
            }
        }

        if points.len() >= 2 {
            Some((points[0], points[1]))
        } else {
            None
        }
    }
}

impl Default for Plane {
    fn default() -> Self {
        Self::invalid()
    }
}

impl std::fmt::Display for Plane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.valid {
            write!(
                f,
                "Plane(normal=({:.4}, {:.4}, {:.4}), point=({:.3}, {:.3}, {:.3}))",
                self.normal.x, self.normal.y, self.normal.z, self.point.x, self.point.y, self.point.z
            )
        } else {
            write!(f, "Plane(invalid)")
        }
    }
}

fn push_unique(points: &mut Vec<Vec3>, p: Vec3) {
    if !points.iter().any(|q| q.distance_squared(p) < 1.0e-12) {
        points.push(p);
    }
}
