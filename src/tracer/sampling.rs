//! Direction sampling and GLSL reflection/refraction builtins

use crate::compiler::PI;
use glam::{Vec2, Vec3};

/// A vector perpendicular to `v` (not normalized)
#[inline(always)]
pub fn ortho(v: Vec3) -> Vec3 {
    if v.x.abs() > v.z.abs() {
        Vec3::new(-v.y, v.x, 0.0)
    } else {
        Vec3::new(0.0, -v.z, v.y)
    }
}

/// Cosine-power sample around `normal`; `smoothness = 1` returns `normal`
#[inline]
pub fn calculate_sample(normal: Vec3, smoothness: f32, noise: Vec2) -> Vec3 {
    let o1 = ortho(normal).normalize_or_zero();
    let o2 = normal.cross(o1).normalize_or_zero();
    let angle = noise.x * 2.0 * PI;
    let y = (smoothness + (1.0 - smoothness) * noise.y).sqrt();
    let q = (1.0 - y * y).max(0.0).sqrt();
    q * (angle.cos() * o1 + angle.sin() * o2) + y * normal
}

/// Uniform direction on the unit sphere
#[inline]
pub fn sample_sphere(noise: Vec2) -> Vec3 {
    let angle = noise.x * 2.0 * PI;
    let y = noise.y * 2.0 - 1.0;
    let q = (1.0 - y * y).max(0.0).sqrt();
    Vec3::new(q * angle.cos(), q * angle.sin(), y)
}

/// GLSL `reflect(i, n)`
#[inline(always)]
pub fn reflect(incident: Vec3, normal: Vec3) -> Vec3 {
    incident - 2.0 * normal.dot(incident) * normal
}

/// GLSL `refract(i, n, eta)`: zero on total internal reflection
#[inline(always)]
pub fn refract(incident: Vec3, normal: Vec3, eta: f32) -> Vec3 {
    let cos = normal.dot(incident);
    let k = 1.0 - eta * eta * (1.0 - cos * cos);
    if k < 0.0 {
        Vec3::ZERO
    } else {
        eta * incident - (eta * cos + k.sqrt()) * normal
    }
}

/// Thin-lens offset for aperture sampling
#[inline(always)]
pub(crate) fn lens_offset(jitter: Vec2, aperture: f32) -> Vec2 {
    let angle = jitter.y * 2.0 * PI;
    jitter.x * aperture * Vec2::new(angle.cos(), angle.sin())
}
