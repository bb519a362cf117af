//! Interpolation over keyframe value types.

use glam::{Quat, Vec3, Vec4};

/// A value type a keyframe channel can carry.
///
/// `hermite` evaluates the cubic-spline basis over an
/// (in-tangent, value, out-tangent) keyframe pair; tangents are scaled by
/// the keyframe interval `dt` before being combined.
pub trait Interpolatable: Copy {
    fn lerp_value(start: Self, end: Self, t: f32) -> Self;

    fn hermite(v0: Self, out_tangent0: Self, in_tangent1: Self, v1: Self, t: f32, dt: f32)
    -> Self;
}

#[inline]
fn hermite_basis(t: f32) -> (f32, f32, f32, f32) {
    let t2 = t * t;
    let t3 = t2 * t;

    let s2 = -2.0 * t3 + 3.0 * t2;
    let s3 = t3 - t2;
    let s0 = 1.0 - s2;
    let s1 = s3 - t2 + t;
    (s0, s1, s2, s3)
}

impl Interpolatable for f32 {
    fn lerp_value(start: Self, end: Self, t: f32) -> Self {
        start + (end - start) * t
    }

    fn hermite(v0: Self, out_tangent0: Self, in_tangent1: Self, v1: Self, t: f32, dt: f32) -> Self {
        let (s0, s1, s2, s3) = hermite_basis(t);
        let m0 = out_tangent0 * dt;
        let m1 = in_tangent1 * dt;
        s0 * v0 + s1 * m0 + s2 * v1 + s3 * m1
    }
}

impl Interpolatable for Vec3 {
    fn lerp_value(start: Self, end: Self, t: f32) -> Self {
        start.lerp(end, t)
    }

    fn hermite(v0: Self, out_tangent0: Self, in_tangent1: Self, v1: Self, t: f32, dt: f32) -> Self {
        let (s0, s1, s2, s3) = hermite_basis(t);
        let m0 = out_tangent0 * dt;
        let m1 = in_tangent1 * dt;
        v0 * s0 + m0 * s1 + v1 * s2 + m1 * s3
    }
}

impl Interpolatable for Quat {
    /// Spherical-linear blend; the result is renormalized so a rotation
    /// channel always yields a unit quaternion.
    fn lerp_value(start: Self, end: Self, t: f32) -> Self {
        start.slerp(end, t).normalize()
    }

    /// Component-wise Hermite over the quaternion lanes, renormalized after
    /// evaluation.
    fn hermite(v0: Self, out_tangent0: Self, in_tangent1: Self, v1: Self, t: f32, dt: f32) -> Self {
        let (s0, s1, s2, s3) = hermite_basis(t);

        let v0_v = Vec4::from(v0);
        let v1_v = Vec4::from(v1);
        let m0_v = Vec4::from(out_tangent0) * dt;
        let m1_v = Vec4::from(in_tangent1) * dt;

        let result = v0_v * s0 + m0_v * s1 + v1_v * s2 + m1_v * s3;
        Quat::from_vec4(result).normalize()
    }
}
