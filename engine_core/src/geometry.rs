//! Plane and frustum geometry.
//!
//! Frustum planes face inward: a point inside the view volume has a
//! positive signed distance to every plane. Classification results are
//! `+1` (fully in front), `-1` (fully behind) and `0` (straddling).

use serde::{Deserialize, Serialize};

use crate::math::{unproject, Mat4, Vec3};

/// Plane `dot(normal, p) = offset`. `normal` is unit length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Plane {
    pub normal: Vec3,
    pub offset: f32,
}

impl Plane {
    pub fn signed_distance(&self, p: Vec3) -> f32 {
        p.dot(self.normal) - self.offset
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

/// Axis-aligned box stored as center and half-widths.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Aabb {
    pub center: Vec3,
    pub extents: Vec3,
}

impl Aabb {
    pub const fn new(center: Vec3, extents: Vec3) -> Self {
        Self { center, extents }
    }

    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        Self {
            center: (min + max) * 0.5,
            extents: (max - min) * 0.5,
        }
    }

    pub fn min(&self) -> Vec3 {
        self.center - self.extents
    }

    pub fn max(&self) -> Vec3 {
        self.center + self.extents
    }

    /// The eight corners. Indices 0..4 are the bottom face (-y), 4..8 the
    /// top face, each wound -x-z, +x-z, +x+z, -x+z.
    pub fn corners(&self) -> [Vec3; 8] {
        let (lo, hi) = (self.min(), self.max());
        [
            Vec3::new(lo.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, hi.z),
            Vec3::new(lo.x, lo.y, hi.z),
            Vec3::new(lo.x, hi.y, lo.z),
            Vec3::new(hi.x, hi.y, lo.z),
            Vec3::new(hi.x, hi.y, hi.z),
            Vec3::new(lo.x, hi.y, hi.z),
        ]
    }
}

/// Six inward-facing planes in the order top, bottom, front, back, right, left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Frustum {
    pub planes: [Plane; 6],
}

impl Frustum {
    pub const TOP: usize = 0;
    pub const BOTTOM: usize = 1;
    pub const FRONT: usize = 2;
    pub const BACK: usize = 3;
    pub const RIGHT: usize = 4;
    pub const LEFT: usize = 5;
}

/// A camera's view (world-to-view) and projection matrices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct View {
    pub view: Mat4,
    pub projection: Mat4,
}

impl View {
    pub fn new(view: Mat4, projection: Mat4) -> Self {
        Self { view, projection }
    }

    pub fn view_projection(&self) -> Mat4 {
        self.view * self.projection
    }
}

/// Builds the plane through `a`, `b`, `c`. The winding decides which side
/// the normal points to.
pub fn calculate_plane(a: Vec3, b: Vec3, c: Vec3) -> Plane {
    let normal = (b - a).cross(c - b).normalize();
    Plane {
        normal,
        offset: normal.dot(a),
    }
}

/// Derives the view frustum by unprojecting the eight screen corners at
/// depth 0 (near) and 1 (far).
///
/// A singular view-projection degrades to the identity mapping, so the
/// result is the unit clip volume.
pub fn calculate_frustum(view: &View, screen_width: f32, screen_height: f32) -> Frustum {
    let inverse = view.view_projection().inverse().unwrap_or(Mat4::IDENTITY);
    let corner = |x: f32, y: f32, z: f32| unproject(Vec3::new(x, y, z), screen_width, screen_height, &inverse);

    let (w, h) = (screen_width, screen_height);
    let ftl = corner(0.0, h, 1.0);
    let ftr = corner(w, h, 1.0);
    let fbl = corner(0.0, 0.0, 1.0);
    let fbr = corner(w, 0.0, 1.0);
    let ntl = corner(0.0, h, 0.0);
    let ntr = corner(w, h, 0.0);
    let nbl = corner(0.0, 0.0, 0.0);
    let nbr = corner(w, 0.0, 0.0);

    Frustum {
        planes: [
            calculate_plane(ntl, ftl, ftr),
            calculate_plane(nbr, fbr, fbl),
            calculate_plane(nbr, nbl, ntl),
            calculate_plane(fbl, fbr, ftr),
            calculate_plane(fbr, nbr, ntr),
            calculate_plane(nbl, fbl, ftl),
        ],
    }
}

fn classify_distance(distance: f32, radius: f32) -> i32 {
    if distance > radius {
        1
    } else if distance < -radius {
        -1
    } else {
        0
    }
}

pub fn classify_sphere_to_plane(sphere: &Sphere, plane: &Plane) -> i32 {
    classify_distance(plane.signed_distance(sphere.center), sphere.radius)
}

pub fn classify_aabb_to_plane(aabb: &Aabb, plane: &Plane) -> i32 {
    let n = plane.normal;
    let e = aabb.extents;
    let radius = (e.x * n.x).abs() + (e.y * n.y).abs() + (e.z * n.z).abs();
    classify_distance(plane.signed_distance(aabb.center), radius)
}

/// Conservative containment: false only when some plane has the box fully
/// behind it.
pub fn aabb_in_frustum(aabb: &Aabb, frustum: &Frustum) -> bool {
    frustum
        .planes
        .iter()
        .all(|plane| classify_aabb_to_plane(aabb, plane) != -1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{degrees_to_radians, is_nearly_equal};

    fn camera_view(eye: Vec3, focus: Vec3) -> View {
        View::new(
            Mat4::look_at_lh(eye, focus, Vec3::Y),
            Mat4::perspective_fov_lh(degrees_to_radians(90.0), 16.0 / 9.0, 1.0, 1000.0),
        )
    }

    #[test]
    fn plane_from_triangle() {
        let p = calculate_plane(
            Vec3::new(0.0, 2.0, 0.0),
            Vec3::new(0.0, 2.0, 1.0),
            Vec3::new(1.0, 2.0, 1.0),
        );
        assert_eq!(p.normal, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(p.offset, 2.0);
    }

    #[test]
    fn sphere_classification_is_strict() {
        let plane = Plane {
            normal: Vec3::Y,
            offset: 2.0,
        };
        let r = 1.0;
        let eps = 0.5;
        let at = |d: f32| Sphere {
            center: Vec3::new(3.0, 2.0 + d, -7.0),
            radius: r,
        };
        assert_eq!(classify_sphere_to_plane(&at(r + eps), &plane), 1);
        assert_eq!(classify_sphere_to_plane(&at(-r - eps), &plane), -1);
        assert_eq!(classify_sphere_to_plane(&at(0.0), &plane), 0);
        // Touching exactly is still straddling.
        assert_eq!(classify_sphere_to_plane(&at(r), &plane), 0);
    }

    #[test]
    fn aabb_projected_radius() {
        let plane = Plane {
            normal: Vec3::X,
            offset: 0.0,
        };
        let b = Aabb::new(Vec3::new(3.0, 0.0, 0.0), Vec3::new(2.0, 50.0, 50.0));
        assert_eq!(classify_aabb_to_plane(&b, &plane), 1);
        let b = Aabb::new(Vec3::new(-3.0, 0.0, 0.0), Vec3::new(2.0, 50.0, 50.0));
        assert_eq!(classify_aabb_to_plane(&b, &plane), -1);
        let b = Aabb::new(Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 50.0, 50.0));
        assert_eq!(classify_aabb_to_plane(&b, &plane), 0);
    }

    #[test]
    fn frustum_interior_is_positive() {
        let eye = Vec3::new(0.0, 15.0, -15.0);
        let view = camera_view(eye, Vec3::ZERO);
        let frustum = calculate_frustum(&view, 1280.0, 720.0);

        // Origin is dead ahead, well inside near/far.
        for plane in &frustum.planes {
            assert!(plane.signed_distance(Vec3::ZERO) > 0.0, "{plane:?}");
        }

        // Side planes pass through the eye; the near plane is one unit ahead.
        for i in [Frustum::TOP, Frustum::BOTTOM, Frustum::RIGHT, Frustum::LEFT] {
            let d = frustum.planes[i].signed_distance(eye);
            assert!(is_nearly_equal(d, 0.0, 1e-2), "plane {i}: {d}");
        }
        let d = frustum.planes[Frustum::FRONT].signed_distance(eye);
        assert!(is_nearly_equal(d, -1.0, 1e-2), "front: {d}");
    }

    #[test]
    fn box_around_camera_is_kept() {
        let eye = Vec3::new(5.0, 2.0, 5.0);
        let view = camera_view(eye, Vec3::new(5.0, 2.0, 50.0));
        let frustum = calculate_frustum(&view, 800.0, 600.0);

        let around = Aabb::new(eye, Vec3::splat(2.0));
        assert!(aabb_in_frustum(&around, &frustum));

        let ahead = Aabb::new(Vec3::new(5.0, 2.0, 40.0), Vec3::splat(0.5));
        assert!(aabb_in_frustum(&ahead, &frustum));
    }

    #[test]
    fn box_behind_camera_is_culled() {
        let eye = Vec3::new(5.0, 2.0, 5.0);
        let view = camera_view(eye, Vec3::new(5.0, 2.0, 50.0));
        let frustum = calculate_frustum(&view, 800.0, 600.0);

        let behind = Aabb::new(eye - Vec3::Z * 10_000.0, Vec3::splat(0.5));
        assert!(!aabb_in_frustum(&behind, &frustum));

        let far_beyond = Aabb::new(Vec3::new(5.0, 2.0, 2_000.0), Vec3::splat(0.5));
        assert!(!aabb_in_frustum(&far_beyond, &frustum));
    }

    #[test]
    fn corners_match_bounds() {
        let b = Aabb::from_min_max(Vec3::new(-1.0, 0.0, -2.0), Vec3::new(1.0, 4.0, 2.0));
        assert_eq!(b.center, Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(b.extents, Vec3::new(1.0, 2.0, 2.0));
        let c = b.corners();
        assert_eq!(c[0], b.min());
        assert_eq!(c[6], b.max());
    }
}
