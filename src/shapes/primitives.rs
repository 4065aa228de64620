//! Distance functions evaluated on the CPU
//!
//! Each function mirrors the GLSL emitted for the same node kind in
//! [`super::glsl`], so software evaluation and the generated program agree
//! up to floating-point differences.

use super::Axis;
use glam::{Vec2, Vec3};

/// Smallest blend radius / period treated as non-zero
pub const MIN_RADIUS: f32 = 1e-6;

/// GLSL `fract`: `x - floor(x)` (differs from `f32::fract` for negatives)
#[inline(always)]
pub fn fract(x: f32) -> f32 {
    x - x.floor()
}

/// Fixed per-cell hash in [0, 1)
#[inline]
pub fn cell_hash(cell: Vec3) -> f32 {
    fract(cell.dot(Vec3::new(7.0, 157.0, 113.0)).sin() * 43758.5453)
}

/// Sphere of radius 0.5
#[inline(always)]
pub fn sdf_sphere(point: Vec3) -> f32 {
    point.length() - 0.5
}

/// Box with half-extents `half`
#[inline(always)]
pub fn sdf_box(point: Vec3, half: Vec3) -> f32 {
    let q = point.abs() - half;
    q.max(Vec3::ZERO).length() + q.max_element().min(0.0)
}

/// Unit cube
#[inline(always)]
pub fn sdf_cube(point: Vec3) -> f32 {
    sdf_box(point, Vec3::splat(0.5))
}

/// Half-space `dot(p, normal) + offset`
#[inline(always)]
pub fn sdf_plane(point: Vec3, normal: Vec3, offset: f32) -> f32 {
    point.dot(normal) + offset
}

/// Box of full size `size` with rounded edges
#[inline(always)]
pub fn sdf_smooth_box(point: Vec3, size: Vec3, radius: f32) -> f32 {
    let q = point.abs() - size * 0.5 + Vec3::splat(radius);
    q.max(Vec3::ZERO).length() + q.max_element().min(0.0) - radius
}

/// Capped cylinder along Y with full height `height`
#[inline(always)]
pub fn sdf_cylinder(point: Vec3, radius: f32, height: f32) -> f32 {
    let d = Vec2::new(
        Vec2::new(point.x, point.z).length() - radius,
        point.y.abs() - height * 0.5,
    );
    d.x.max(d.y).min(0.0) + d.max(Vec2::ZERO).length()
}

/// Torus in the XZ plane
#[inline(always)]
pub fn sdf_torus(point: Vec3, major: f32, minor: f32) -> f32 {
    let q = Vec2::new(Vec2::new(point.x, point.z).length() - major, point.y);
    q.length() - minor
}

/// Approximate ellipsoid distance (bound, not exact)
#[inline(always)]
pub fn sdf_ellipsoid(point: Vec3, radii: Vec3) -> f32 {
    let k0 = (point / radii).length();
    let k1 = (point / (radii * radii)).length().max(1e-9);
    k0 * (k0 - 1.0) / k1
}

/// Truchet tiling: three quarter tori per unit cell, mirrored by a cell hash
pub fn sdf_truchet(point: Vec3, thickness: f32) -> f32 {
    let cell = point.floor();
    let mut q = point - cell - Vec3::splat(0.5);
    if cell_hash(cell) > 0.5 {
        q.x = -q.x;
    }
    let a = Vec2::new((Vec2::new(q.x, q.y) - Vec2::new(0.5, 0.5)).length() - 0.5, q.z).length();
    let b = Vec2::new((Vec2::new(q.y, q.z) - Vec2::new(-0.5, -0.5)).length() - 0.5, q.x).length();
    let c = Vec2::new((Vec2::new(q.x, q.z) - Vec2::new(-0.5, 0.5)).length() - 0.5, q.y).length();
    a.min(b).min(c) - thickness
}

/// Skull approximation: blended cranium, face and jaw with carved sockets
pub fn sdf_skull(point: Vec3) -> f32 {
    let mirrored = Vec3::new(point.x.abs(), point.y, point.z);
    let cranium = sdf_ellipsoid(point - Vec3::new(0.0, 0.12, -0.05), Vec3::new(0.36, 0.34, 0.42));
    let face = sdf_ellipsoid(point - Vec3::new(0.0, -0.12, 0.12), Vec3::new(0.26, 0.24, 0.28));
    let jaw = sdf_ellipsoid(point - Vec3::new(0.0, -0.32, 0.1), Vec3::new(0.18, 0.1, 0.2));
    let mut d = smooth_min(cranium, face, 0.12);
    d = smooth_min(d, jaw, 0.08);
    let socket = (mirrored - Vec3::new(0.11, -0.06, 0.32)).length() - 0.08;
    d = smooth_max(d, -socket, 0.03);
    let nose = sdf_ellipsoid(mirrored - Vec3::new(0.025, -0.17, 0.38), Vec3::new(0.03, 0.05, 0.06));
    smooth_max(d, -nose, 0.02)
}

/// Polynomial smooth minimum; reduces to `min` as `k` tends to zero
#[inline(always)]
pub fn smooth_min(a: f32, b: f32, k: f32) -> f32 {
    let k = k.max(MIN_RADIUS);
    let h = (k - (a - b).abs()).max(0.0) / k;
    a.min(b) - h * h * k * 0.25
}

/// Polynomial smooth maximum; reduces to `max` as `k` tends to zero
#[inline(always)]
pub fn smooth_max(a: f32, b: f32, k: f32) -> f32 {
    let k = k.max(MIN_RADIUS);
    let h = (k - (a - b).abs()).max(0.0) / k;
    a.max(b) + h * h * k * 0.25
}

/// Inverse rotation of the query point
#[inline]
pub fn rotate_inverse(point: Vec3, axis: Axis, angle: f32) -> Vec3 {
    let (s, c) = angle.sin_cos();
    match axis {
        Axis::X => Vec3::new(point.x, c * point.y + s * point.z, -s * point.y + c * point.z),
        Axis::Y => Vec3::new(c * point.x - s * point.z, point.y, s * point.x + c * point.z),
        Axis::Z => Vec3::new(c * point.x + s * point.y, -s * point.x + c * point.y, point.z),
    }
}

/// Integer cell containing `point` for a grid of `period`; axes with a zero
/// period always report cell 0.
#[inline]
pub fn repetition_cell(point: Vec3, period: Vec3) -> Vec3 {
    let span = period.abs();
    let active = Vec3::select(span.cmpge(Vec3::splat(MIN_RADIUS)), Vec3::ONE, Vec3::ZERO);
    (point / span.max(Vec3::splat(MIN_RADIUS)) + 0.5).floor() * active
}

/// Fold `point` into the cell-local frame of `cell`
#[inline]
pub fn fold_into_cell(point: Vec3, period: Vec3, cell: Vec3) -> Vec3 {
    point - period.abs() * cell
}
