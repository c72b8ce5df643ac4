//! Math types.
//!
//! This module intentionally stays small and deterministic.
//! It avoids SIMD/unsafe and focuses on stable semantics.
//!
//! Matrices are row-major and use the row-vector convention: a point is
//! transformed as `p * M`, translation lives in row 3, and `a * b` applies
//! `a` first. Rotations and projections are left-handed.

use std::ops::{
    Add, AddAssign, Div, DivAssign, Index, IndexMut, Mul, MulAssign, Neg, Sub, SubAssign,
};

use serde::{Deserialize, Serialize};

pub const PI: f32 = 3.141_592_653_59;

/// Returns true when `|lhs - rhs| < delta`.
///
/// The comparison is strict: a difference of exactly `delta` is not
/// nearly equal.
pub fn is_nearly_equal<T: NearlyEqual>(lhs: T, rhs: T, delta: T) -> bool {
    lhs.differs_less_than(rhs, delta)
}

/// Scalar domains supported by [`is_nearly_equal`].
pub trait NearlyEqual: Copy {
    fn differs_less_than(self, rhs: Self, delta: Self) -> bool;
}

impl NearlyEqual for f32 {
    fn differs_less_than(self, rhs: Self, delta: Self) -> bool {
        (self - rhs).abs() < delta
    }
}

impl NearlyEqual for f64 {
    fn differs_less_than(self, rhs: Self, delta: Self) -> bool {
        (self - rhs).abs() < delta
    }
}

impl NearlyEqual for i32 {
    fn differs_less_than(self, rhs: Self, delta: Self) -> bool {
        delta > 0 && self.abs_diff(rhs) < delta.unsigned_abs()
    }
}

/// Clamps `val` into `[min, max]` (inclusive).
///
/// NaN passes through unchanged.
pub fn fclamp(val: f32, min: f32, max: f32) -> f32 {
    if val < min {
        min
    } else if val > max {
        max
    } else {
        val
    }
}

pub fn degrees_to_radians(degrees: f32) -> f32 {
    degrees * (PI / 180.0)
}

pub fn radians_to_degrees(radians: f32) -> f32 {
    (radians * 180.0) / PI
}

/// 2D vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

/// 3D vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// 4D vector. Also used for RGBA colors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Vec4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

macro_rules! impl_vec_ops {
    ($ty:ident { $($f:ident),+ }, $len:expr) => {
        impl $ty {
            pub const fn new($($f: f32),+) -> Self {
                Self { $($f),+ }
            }

            pub const fn splat(v: f32) -> Self {
                Self { $($f: v),+ }
            }

            pub fn dot(self, rhs: Self) -> f32 {
                0.0 $(+ self.$f * rhs.$f)+
            }

            pub fn abs(self) -> Self {
                Self { $($f: self.$f.abs()),+ }
            }

            pub const fn size() -> usize {
                $len
            }
        }

        impl Add for $ty {
            type Output = Self;
            fn add(self, rhs: Self) -> Self {
                Self { $($f: self.$f + rhs.$f),+ }
            }
        }

        impl Sub for $ty {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self {
                Self { $($f: self.$f - rhs.$f),+ }
            }
        }

        impl Mul for $ty {
            type Output = Self;
            fn mul(self, rhs: Self) -> Self {
                Self { $($f: self.$f * rhs.$f),+ }
            }
        }

        impl Div for $ty {
            type Output = Self;
            fn div(self, rhs: Self) -> Self {
                Self { $($f: self.$f / rhs.$f),+ }
            }
        }

        impl Mul<f32> for $ty {
            type Output = Self;
            fn mul(self, rhs: f32) -> Self {
                Self { $($f: self.$f * rhs),+ }
            }
        }

        impl Div<f32> for $ty {
            type Output = Self;
            fn div(self, rhs: f32) -> Self {
                Self { $($f: self.$f / rhs),+ }
            }
        }

        impl Neg for $ty {
            type Output = Self;
            fn neg(self) -> Self {
                Self { $($f: -self.$f),+ }
            }
        }

        impl AddAssign for $ty {
            fn add_assign(&mut self, rhs: Self) {
                $(self.$f += rhs.$f;)+
            }
        }

        impl SubAssign for $ty {
            fn sub_assign(&mut self, rhs: Self) {
                $(self.$f -= rhs.$f;)+
            }
        }

        impl MulAssign for $ty {
            fn mul_assign(&mut self, rhs: Self) {
                $(self.$f *= rhs.$f;)+
            }
        }

        impl DivAssign for $ty {
            fn div_assign(&mut self, rhs: Self) {
                $(self.$f /= rhs.$f;)+
            }
        }

        impl MulAssign<f32> for $ty {
            fn mul_assign(&mut self, rhs: f32) {
                $(self.$f *= rhs;)+
            }
        }

        impl DivAssign<f32> for $ty {
            fn div_assign(&mut self, rhs: f32) {
                $(self.$f /= rhs;)+
            }
        }

        impl Index<usize> for $ty {
            type Output = f32;
            fn index(&self, i: usize) -> &f32 {
                let fields = [$(&self.$f),+];
                fields[i]
            }
        }

        impl IndexMut<usize> for $ty {
            fn index_mut(&mut self, i: usize) -> &mut f32 {
                let fields = [$(&mut self.$f),+];
                fields.into_iter().nth(i).unwrap_or_else(|| {
                    panic!("index {} out of range for {}", i, stringify!($ty))
                })
            }
        }
    };
}

impl_vec_ops!(Vec2 { x, y }, 2);
impl_vec_ops!(Vec3 { x, y, z }, 3);
impl_vec_ops!(Vec4 { x, y, z, w }, 4);

impl Vec3 {
    pub const ZERO: Self = Self::splat(0.0);
    pub const ONE: Self = Self::splat(1.0);
    pub const X: Self = Self::new(1.0, 0.0, 0.0);
    pub const Y: Self = Self::new(0.0, 1.0, 0.0);
    pub const Z: Self = Self::new(0.0, 0.0, 1.0);

    pub fn cross(self, rhs: Self) -> Self {
        Self::new(
            self.y * rhs.z - self.z * rhs.y,
            self.z * rhs.x - self.x * rhs.z,
            self.x * rhs.y - self.y * rhs.x,
        )
    }

    pub fn len_sq(self) -> f32 {
        self.dot(self)
    }

    pub fn length(self) -> f32 {
        self.len_sq().sqrt()
    }

    /// Unit-length copy. A zero vector stays zero.
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len > 0.0 {
            self / len
        } else {
            self
        }
    }

    pub fn lerp(self, to: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self::new(
            self.x + (to.x - self.x) * t,
            self.y + (to.y - self.y) * t,
            self.z + (to.z - self.z) * t,
        )
    }

    pub const fn extend(self, w: f32) -> Vec4 {
        Vec4::new(self.x, self.y, self.z, w)
    }
}

impl Vec4 {
    pub const fn xyz(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self::new(r, g, b, a)
    }
}

/// Free-function forms, mirroring the component methods.
pub fn dot(lhs: Vec3, rhs: Vec3) -> f32 {
    lhs.dot(rhs)
}

pub fn cross(lhs: Vec3, rhs: Vec3) -> Vec3 {
    lhs.cross(rhs)
}

/// Unit quaternion (conceptually).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quat {
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Builds the quaternion of a pure rotation matrix (row-vector form).
    pub fn from_rotation(m: &Mat4) -> Self {
        let r = &m.m;
        let trace = r[0][0] + r[1][1] + r[2][2];
        if trace > 0.0 {
            let s = (trace + 1.0).sqrt() * 2.0;
            Self::new(
                (r[1][2] - r[2][1]) / s,
                (r[2][0] - r[0][2]) / s,
                (r[0][1] - r[1][0]) / s,
                0.25 * s,
            )
        } else if r[0][0] > r[1][1] && r[0][0] > r[2][2] {
            let s = (1.0 + r[0][0] - r[1][1] - r[2][2]).sqrt() * 2.0;
            Self::new(
                0.25 * s,
                (r[1][0] + r[0][1]) / s,
                (r[2][0] + r[0][2]) / s,
                (r[1][2] - r[2][1]) / s,
            )
        } else if r[1][1] > r[2][2] {
            let s = (1.0 + r[1][1] - r[0][0] - r[2][2]).sqrt() * 2.0;
            Self::new(
                (r[0][1] + r[1][0]) / s,
                0.25 * s,
                (r[2][1] + r[1][2]) / s,
                (r[2][0] - r[0][2]) / s,
            )
        } else {
            let s = (1.0 + r[2][2] - r[0][0] - r[1][1]).sqrt() * 2.0;
            Self::new(
                (r[0][2] + r[2][0]) / s,
                (r[1][2] + r[2][1]) / s,
                0.25 * s,
                (r[0][1] - r[1][0]) / s,
            )
        }
    }
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// 4x4 matrix, row-major (`m[row][col]`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mat4 {
    pub m: [[f32; 4]; 4],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat4 {
    pub const IDENTITY: Self = Self {
        m: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub const fn from_rows(m: [[f32; 4]; 4]) -> Self {
        Self { m }
    }

    /// Reads 16 floats in row-major order (the joint transform layout).
    pub fn from_array(a: [f32; 16]) -> Self {
        let mut m = [[0.0; 4]; 4];
        for (i, v) in a.into_iter().enumerate() {
            m[i / 4][i % 4] = v;
        }
        Self { m }
    }

    pub fn to_array(&self) -> [f32; 16] {
        let mut a = [0.0; 16];
        for (i, v) in a.iter_mut().enumerate() {
            *v = self.m[i / 4][i % 4];
        }
        a
    }

    pub fn row(&self, i: usize) -> Vec4 {
        let r = self.m[i];
        Vec4::new(r[0], r[1], r[2], r[3])
    }

    /// The xyz part of row `i`.
    pub fn row3(&self, i: usize) -> Vec3 {
        let r = self.m[i];
        Vec3::new(r[0], r[1], r[2])
    }

    /// Writes the xyz part of row `i`, leaving w untouched.
    pub fn set_row3(&mut self, i: usize, v: Vec3) {
        self.m[i][0] = v.x;
        self.m[i][1] = v.y;
        self.m[i][2] = v.z;
    }

    pub fn translation_part(&self) -> Vec3 {
        self.row3(3)
    }

    pub fn from_translation(t: Vec3) -> Self {
        let mut out = Self::IDENTITY;
        out.set_row3(3, t);
        out
    }

    pub fn from_scale(s: Vec3) -> Self {
        let mut out = Self::IDENTITY;
        out.m[0][0] = s.x;
        out.m[1][1] = s.y;
        out.m[2][2] = s.z;
        out
    }

    pub fn rotation_x(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self::from_rows([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, c, s, 0.0],
            [0.0, -s, c, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn rotation_y(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self::from_rows([
            [c, 0.0, -s, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [s, 0.0, c, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn rotation_z(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self::from_rows([
            [c, s, 0.0, 0.0],
            [-s, c, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Left-handed perspective projection mapping depth to `[0, 1]`.
    pub fn perspective_fov_lh(fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        let h = 1.0 / (fov_y * 0.5).tan();
        let w = h / aspect;
        let range = far / (far - near);
        Self::from_rows([
            [w, 0.0, 0.0, 0.0],
            [0.0, h, 0.0, 0.0],
            [0.0, 0.0, range, 1.0],
            [0.0, 0.0, -range * near, 0.0],
        ])
    }

    /// Left-handed view matrix looking from `eye` at `focus`.
    pub fn look_at_lh(eye: Vec3, focus: Vec3, up: Vec3) -> Self {
        let z = (focus - eye).normalize();
        let x = up.cross(z).normalize();
        let y = z.cross(x);
        Self::from_rows([
            [x.x, y.x, z.x, 0.0],
            [x.y, y.y, z.y, 0.0],
            [x.z, y.z, z.z, 0.0],
            [-x.dot(eye), -y.dot(eye), -z.dot(eye), 1.0],
        ])
    }

    pub fn transpose(&self) -> Self {
        let mut out = *self;
        for r in 0..4 {
            for c in 0..4 {
                out.m[r][c] = self.m[c][r];
            }
        }
        out
    }

    /// Laplace expansion over the 2x2 minors of rows 0-1 and rows 2-3.
    pub fn determinant(&self) -> f32 {
        let m = &self.m;
        let s0 = m[0][0] * m[1][1] - m[1][0] * m[0][1];
        let s1 = m[0][0] * m[1][2] - m[1][0] * m[0][2];
        let s2 = m[0][0] * m[1][3] - m[1][0] * m[0][3];
        let s3 = m[0][1] * m[1][2] - m[1][1] * m[0][2];
        let s4 = m[0][1] * m[1][3] - m[1][1] * m[0][3];
        let s5 = m[0][2] * m[1][3] - m[1][2] * m[0][3];

        let c5 = m[2][2] * m[3][3] - m[3][2] * m[2][3];
        let c4 = m[2][1] * m[3][3] - m[3][1] * m[2][3];
        let c3 = m[2][1] * m[3][2] - m[3][1] * m[2][2];
        let c2 = m[2][0] * m[3][3] - m[3][0] * m[2][3];
        let c1 = m[2][0] * m[3][2] - m[3][0] * m[2][2];
        let c0 = m[2][0] * m[3][1] - m[3][0] * m[2][1];

        s0 * c5 - s1 * c4 + s2 * c3 + s3 * c2 - s4 * c1 + s5 * c0
    }

    /// General inverse. `None` when the matrix is singular.
    pub fn inverse(&self) -> Option<Self> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let inv_det = 1.0 / det;
        Some(Self::from_array(self.adjugate().map(|v| v * inv_det)))
    }

    fn adjugate(&self) -> [f32; 16] {
        let a = self.to_array();
        let mut inv = [0.0f32; 16];

        inv[0] = a[5] * a[10] * a[15] - a[5] * a[11] * a[14] - a[9] * a[6] * a[15]
            + a[9] * a[7] * a[14]
            + a[13] * a[6] * a[11]
            - a[13] * a[7] * a[10];
        inv[4] = -a[4] * a[10] * a[15] + a[4] * a[11] * a[14] + a[8] * a[6] * a[15]
            - a[8] * a[7] * a[14]
            - a[12] * a[6] * a[11]
            + a[12] * a[7] * a[10];
        inv[8] = a[4] * a[9] * a[15] - a[4] * a[11] * a[13] - a[8] * a[5] * a[15]
            + a[8] * a[7] * a[13]
            + a[12] * a[5] * a[11]
            - a[12] * a[7] * a[9];
        inv[12] = -a[4] * a[9] * a[14] + a[4] * a[10] * a[13] + a[8] * a[5] * a[14]
            - a[8] * a[6] * a[13]
            - a[12] * a[5] * a[10]
            + a[12] * a[6] * a[9];
        inv[1] = -a[1] * a[10] * a[15] + a[1] * a[11] * a[14] + a[9] * a[2] * a[15]
            - a[9] * a[3] * a[14]
            - a[13] * a[2] * a[11]
            + a[13] * a[3] * a[10];
        inv[5] = a[0] * a[10] * a[15] - a[0] * a[11] * a[14] - a[8] * a[2] * a[15]
            + a[8] * a[3] * a[14]
            + a[12] * a[2] * a[11]
            - a[12] * a[3] * a[10];
        inv[9] = -a[0] * a[9] * a[15] + a[0] * a[11] * a[13] + a[8] * a[1] * a[15]
            - a[8] * a[3] * a[13]
            - a[12] * a[1] * a[11]
            + a[12] * a[3] * a[9];
        inv[13] = a[0] * a[9] * a[14] - a[0] * a[10] * a[13] - a[8] * a[1] * a[14]
            + a[8] * a[2] * a[13]
            + a[12] * a[1] * a[10]
            - a[12] * a[2] * a[9];
        inv[2] = a[1] * a[6] * a[15] - a[1] * a[7] * a[14] - a[5] * a[2] * a[15]
            + a[5] * a[3] * a[14]
            + a[13] * a[2] * a[7]
            - a[13] * a[3] * a[6];
        inv[6] = -a[0] * a[6] * a[15] + a[0] * a[7] * a[14] + a[4] * a[2] * a[15]
            - a[4] * a[3] * a[14]
            - a[12] * a[2] * a[7]
            + a[12] * a[3] * a[6];
        inv[10] = a[0] * a[5] * a[15] - a[0] * a[7] * a[13] - a[4] * a[1] * a[15]
            + a[4] * a[3] * a[13]
            + a[12] * a[1] * a[7]
            - a[12] * a[3] * a[5];
        inv[14] = -a[0] * a[5] * a[14] + a[0] * a[6] * a[13] + a[4] * a[1] * a[14]
            - a[4] * a[2] * a[13]
            - a[12] * a[1] * a[6]
            + a[12] * a[2] * a[5];
        inv[3] = -a[1] * a[6] * a[11] + a[1] * a[7] * a[10] + a[5] * a[2] * a[11]
            - a[5] * a[3] * a[10]
            - a[9] * a[2] * a[7]
            + a[9] * a[3] * a[6];
        inv[7] = a[0] * a[6] * a[11] - a[0] * a[7] * a[10] - a[4] * a[2] * a[11]
            + a[4] * a[3] * a[10]
            + a[8] * a[2] * a[7]
            - a[8] * a[3] * a[6];
        inv[11] = -a[0] * a[5] * a[11] + a[0] * a[7] * a[9] + a[4] * a[1] * a[11]
            - a[4] * a[3] * a[9]
            - a[8] * a[1] * a[7]
            + a[8] * a[3] * a[5];
        inv[15] = a[0] * a[5] * a[10] - a[0] * a[6] * a[9] - a[4] * a[1] * a[10]
            + a[4] * a[2] * a[9]
            + a[8] * a[1] * a[6]
            - a[8] * a[2] * a[5];

        inv
    }

    /// Transforms a point (w = 1) and divides by the resulting w.
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        let v = p.extend(1.0);
        let mut out = [0.0f32; 4];
        for (c, o) in out.iter_mut().enumerate() {
            *o = v.x * self.m[0][c] + v.y * self.m[1][c] + v.z * self.m[2][c] + v.w * self.m[3][c];
        }
        Vec3::new(out[0], out[1], out[2]) / out[3]
    }

    /// Splits an affine matrix into scale, rotation and translation.
    pub fn decompose(&self) -> (Vec3, Quat, Vec3) {
        let translation = self.translation_part();
        let mut axes = [self.row3(0), self.row3(1), self.row3(2)];
        let mut scale = Vec3::new(axes[0].length(), axes[1].length(), axes[2].length());
        if axes[0].cross(axes[1]).dot(axes[2]) < 0.0 {
            scale.x = -scale.x;
            axes[0] = -axes[0];
        }

        let mut rot = Self::IDENTITY;
        for (i, axis) in axes.iter().enumerate() {
            let len = scale[i].abs();
            if len > 0.0 {
                rot.set_row3(i, *axis / len);
            }
        }
        (scale, Quat::from_rotation(&rot), translation)
    }
}

impl Mul for Mat4 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let mut out = [[0.0f32; 4]; 4];
        for (r, row) in out.iter_mut().enumerate() {
            for (c, v) in row.iter_mut().enumerate() {
                *v = (0..4).map(|k| self.m[r][k] * rhs.m[k][c]).sum();
            }
        }
        Self { m: out }
    }
}

/// Maps a screen point through a viewport of `width` x `height` pixels
/// (origin 0, depth range 0..1) back into world space.
///
/// `inverse_view_proj` is the inverse of `view * projection`. Screen y grows
/// downward, so y = 0 maps to NDC +1.
pub fn unproject(screen: Vec3, width: f32, height: f32, inverse_view_proj: &Mat4) -> Vec3 {
    let ndc = Vec3::new(
        screen.x / (width * 0.5) - 1.0,
        1.0 - screen.y / (height * 0.5),
        screen.z,
    );
    inverse_view_proj.transform_point(ndc)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mat_nearly_equal(a: &Mat4, b: &Mat4, delta: f32) -> bool {
        a.to_array()
            .iter()
            .zip(b.to_array().iter())
            .all(|(x, y)| is_nearly_equal(*x, *y, delta))
    }

    #[test]
    fn vec3_lerp_midpoint() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(2.0, 4.0, 6.0);
        let mid = a.lerp(b, 0.5);
        assert_eq!(mid, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn nearly_equal_is_strict() {
        let delta = 0.25f32;
        assert!(!is_nearly_equal(5.0, 5.0 + delta, delta));
        assert!(is_nearly_equal(5.0, 5.0 + delta * 0.5, delta));

        assert!(!is_nearly_equal(10, 13, 3));
        assert!(is_nearly_equal(10, 12, 3));
        assert!(!is_nearly_equal(i32::MIN, i32::MAX, 5));
    }

    #[test]
    fn fclamp_is_inclusive() {
        assert_eq!(fclamp(-1.0, 0.0, 1.0), 0.0);
        assert_eq!(fclamp(2.0, 0.0, 1.0), 1.0);
        assert_eq!(fclamp(1.0, 0.0, 1.0), 1.0);
        assert_eq!(fclamp(0.25, 0.0, 1.0), 0.25);
    }

    #[test]
    fn degree_radian_conversion() {
        assert!(is_nearly_equal(degrees_to_radians(180.0), PI, 1e-6));
        assert!(is_nearly_equal(radians_to_degrees(PI * 0.5), 90.0, 1e-4));
    }

    #[test]
    fn vector_operators() {
        let mut a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);
        assert_eq!(a + b, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(b - a, Vec3::splat(3.0));
        assert_eq!(a * b, Vec3::new(4.0, 10.0, 18.0));
        assert_eq!(a * 2.0, Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(dot(a, b), 32.0);
        assert_eq!(cross(Vec3::X, Vec3::Y), Vec3::Z);

        a += b;
        a /= 5.0;
        assert_eq!(a, Vec3::new(1.0, 1.4, 1.8));
        a[2] = 7.0;
        assert_eq!(a[2], 7.0);
        assert_eq!(Vec4::new(1.0, 2.0, 3.0, 4.0)[3], 4.0);
    }

    #[test]
    fn translation_row_is_applied_last() {
        let m = Mat4::from_scale(Vec3::splat(2.0)) * Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(m.transform_point(Vec3::new(1.0, 1.0, 1.0)), Vec3::new(3.0, 2.0, 2.0));
    }

    #[test]
    fn inverse_roundtrip() {
        let m = Mat4::rotation_y(0.7)
            * Mat4::rotation_x(-0.3)
            * Mat4::from_translation(Vec3::new(4.0, -2.0, 9.0));
        let inv = m.inverse().unwrap();
        assert!(mat_nearly_equal(&(m * inv), &Mat4::IDENTITY, 1e-5));
        assert!(Mat4::from_scale(Vec3::ZERO).inverse().is_none());
    }

    #[test]
    fn determinant_tracks_volume_and_handedness() {
        assert_eq!(Mat4::IDENTITY.determinant(), 1.0);
        let m = Mat4::from_scale(Vec3::new(2.0, 3.0, 4.0))
            * Mat4::rotation_z(1.1)
            * Mat4::from_translation(Vec3::new(-5.0, 1.0, 2.0));
        assert!(is_nearly_equal(m.determinant(), 24.0, 1e-4));

        let swapped = Mat4::from_rows([
            [0.0, 1.0, 0.0, 0.0],
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ]);
        assert_eq!(swapped.determinant(), -1.0);
        assert_eq!(swapped.inverse(), Some(swapped));

        let flat = Mat4::from_scale(Vec3::new(1.0, 0.0, 1.0));
        assert_eq!(flat.determinant(), 0.0);
        assert!(flat.inverse().is_none());
    }

    #[test]
    fn look_at_moves_eye_to_origin() {
        let eye = Vec3::new(0.0, 15.0, -15.0);
        let view = Mat4::look_at_lh(eye, Vec3::ZERO, Vec3::Y);
        let p = view.transform_point(eye);
        assert!(p.length() < 1e-4);
        // Focus sits straight ahead on +Z.
        let f = view.transform_point(Vec3::ZERO);
        assert!(is_nearly_equal(f.x, 0.0, 1e-4));
        assert!(f.z > 0.0);
    }

    #[test]
    fn decompose_recovers_parts() {
        let m = Mat4::from_scale(Vec3::new(2.0, 3.0, 4.0))
            * Mat4::rotation_y(PI * 0.5)
            * Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let (scale, rot, pos) = m.decompose();
        assert!(is_nearly_equal(scale.x, 2.0, 1e-5));
        assert!(is_nearly_equal(scale.y, 3.0, 1e-5));
        assert!(is_nearly_equal(scale.z, 4.0, 1e-5));
        assert_eq!(pos, Vec3::new(1.0, 2.0, 3.0));
        let half = (0.5f32).sqrt();
        assert!(is_nearly_equal(rot.y, half, 1e-5));
        assert!(is_nearly_equal(rot.w, half, 1e-5));
    }

    #[test]
    fn flat_array_is_row_major() {
        let m = Mat4::from_translation(Vec3::new(7.0, 8.0, 9.0));
        let a = m.to_array();
        assert_eq!(&a[12..15], &[7.0, 8.0, 9.0]);
        assert_eq!(Mat4::from_array(a), m);
    }
}
