//! Software path tracer
//!
//! Runs the generated `main` on the CPU, one pixel at a time, using the
//! software evaluator for the dispatch functions. The hash, the order in
//! which random numbers are drawn and the refraction/reflection branches
//! follow the generated program line by line, so a frame traced here is what
//! the GPU would accumulate for the same uniforms.
//!
//! Pixels are traced in parallel with rayon, one row per task.

mod film;
mod sampling;

pub use film::{present, save};
pub use sampling::{calculate_sample, ortho, reflect, refract, sample_sphere};

use crate::compiler::MAX_VALUE;
use crate::eval::{random, Closest, EvalContext, EvalError, MaterialSample, SceneEvaluator};
use crate::options::{Options, OptionsError};
use crate::scene::Scene;
use glam::{Vec2, Vec3, Vec4};
use image::RgbImage;
use rayon::prelude::*;

/// Per-frame uniforms
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Frame {
    /// Elapsed time in seconds
    pub time: f32,
    /// Mouse position
    pub mouse: Vec2,
    /// Halves the accumulated image before adding this frame
    pub clicked: bool,
}

impl Frame {
    /// Frame shown `index` ticks of 1/60 s after the start
    pub fn at(index: u32) -> Self {
        Frame {
            time: index as f32 / 60.0,
            ..Self::default()
        }
    }

    /// Set mouse position
    #[must_use]
    pub fn with_mouse(mut self, mouse: Vec2) -> Self {
        self.mouse = mouse;
        self
    }
}

/// CPU execution of the compiled path tracer for one scene
#[derive(Debug, Clone, Copy)]
pub struct PathTracer<'a> {
    scene: &'a Scene,
    options: Options,
}

impl<'a> PathTracer<'a> {
    /// Tracer using the constants of `options`; fails on invalid options
    pub fn new(scene: &'a Scene, options: Options) -> Result<Self, OptionsError> {
        options.validate()?;
        Ok(PathTracer { scene, options })
    }

    /// Options in use
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Screen coordinate in [-1, 1]² of the center of pixel `(x, y)`; row 0
    /// is the top of the image
    pub fn pixel_uv(&self, x: u32, y: u32) -> Vec2 {
        let w = self.options.width as f32;
        let h = self.options.height as f32;
        Vec2::new((x as f32 + 0.5) / w * 2.0 - 1.0, 1.0 - (y as f32 + 0.5) / h * 2.0)
    }

    /// Accumulator value of one pixel after this frame: `previous` (halved
    /// when clicked) plus `(radiance, emissive events)` of this frame
    pub fn trace_pixel(&self, uv: Vec2, frame: &Frame, previous: Vec4) -> Result<Vec4, EvalError> {
        let Options {
            epsilon,
            steps,
            bounces,
            iterations,
            ..
        } = self.options;
        let resolution = Vec2::new(self.options.width as f32, self.options.height as f32);
        let ctx = EvalContext::frame(uv, frame.time, frame.mouse);
        let evaluator = SceneEvaluator::new(self.scene, epsilon).with_frame(ctx);
        let noise_at = |seed: f32| random(uv, frame.time, seed);

        let camera = self.scene.camera();
        let eye = camera.eye.eval(&ctx)?.to_vec3();
        let target = camera.target.eval(&ctx)?.to_vec3();
        let up = camera.up.eval(&ctx)?.to_vec3();
        let field_of_view = camera.field_of_view.eval(&ctx)?.x();
        let aperture = camera.aperture.eval(&ctx)?.x();

        let look = (target - eye).normalize_or_zero();
        let up = (up - look.dot(up) * look).normalize_or_zero();
        let right = look.cross(up);

        let mut result = Vec4::ZERO;

        for iteration in 0..=iterations {
            let jitter = noise_at(iteration as f32);

            let lens = sampling::lens_offset(jitter, aperture);
            let mut from = eye + lens.x * right + lens.y * up;

            let angle = (uv * 0.5 + (jitter - 0.5) / resolution) * field_of_view;
            let screen = Vec3::new(
                angle.y.cos() * angle.x.sin(),
                angle.y.sin(),
                angle.y.cos() * angle.x.cos(),
            );
            let to = eye + (target - eye).length() * (right * screen.x + up * screen.y + look * screen.z);

            let mut direction = (to - from).normalize_or_zero();

            let mut luminance = Vec3::ONE;
            let air = evaluator.air(from, direction)?;
            let mut current = air;

            for bounce in 1..=bounces {
                let noise = noise_at((iteration * bounces + bounce) as f32);
                let limit = -noise.y.ln() * current.scatter;

                let (closest, position, travelled) =
                    march(&evaluator, from, direction, limit, epsilon, steps)?;

                if closest.object == 0 {
                    break;
                }

                if travelled == limit {
                    from = position;
                    direction = sample_sphere(noise);
                    result += (luminance * current.emissivity).extend(1.0);
                    luminance *= current.color;
                    continue;
                }

                let mut normal = evaluator.normal(closest.object, position)?;
                let material = evaluator.material(closest.object, position, normal, direction)?;

                result += (luminance * material.emissivity).extend(1.0);

                let backface = normal.dot(direction) > 0.0;
                if backface {
                    normal = -normal;
                }

                let normal = calculate_sample(normal, material.smoothness, noise);

                if material.color == Vec3::ZERO {
                    break;
                }

                luminance *= material.color;

                if noise.y < material.transmittance {
                    if let Some(next) = transmit(&current, &material, &air, backface, direction, normal) {
                        from = refraction_origin(position, direction, normal, epsilon);
                        direction = next.0;
                        current = next.1;
                        continue;
                    }
                }

                from = reflection_origin(position, normal, epsilon);
                direction = reflect(direction, normal);
            }
        }

        let mut original = previous;
        if frame.clicked {
            original *= 0.5;
        }
        Ok(original + result)
    }

    /// Trace every pixel of one frame on top of `previous` (row-major,
    /// `width * height` entries; empty means a cleared accumulator)
    pub fn render_frame(&self, frame: &Frame, previous: &[Vec4]) -> Result<Vec<Vec4>, EvalError> {
        let width = self.options.width as usize;
        let height = self.options.height as usize;
        let mut accum = vec![Vec4::ZERO; width * height];
        if previous.len() == accum.len() {
            accum.copy_from_slice(previous);
        }

        accum
            .par_chunks_mut(width)
            .enumerate()
            .try_for_each(|(y, row)| {
                for (x, pixel) in row.iter_mut().enumerate() {
                    let uv = self.pixel_uv(x as u32, y as u32);
                    *pixel = self.trace_pixel(uv, frame, *pixel)?;
                }
                Ok::<(), EvalError>(())
            })?;

        Ok(accum)
    }

    /// Present an accumulator with the configured size and gamma
    pub fn present(&self, accum: &[Vec4]) -> RgbImage {
        present(accum, self.options.width, self.options.height, self.options.gamma)
    }

    /// Accumulate `frames` consecutive frames from a cleared buffer
    pub fn render(&self, frames: u32) -> Result<Vec<Vec4>, EvalError> {
        let mut accum = Vec::new();
        for index in 0..frames {
            tracing::debug!(frame = index, "tracing frame");
            accum = self.render_frame(&Frame::at(index), &accum)?;
        }
        Ok(accum)
    }
}

/// Sphere-trace from `from` until a hit, the free-path `limit` or the step
/// budget. Returns the last closest query, the end point and the distance
/// travelled.
fn march(
    evaluator: &SceneEvaluator<'_>,
    from: Vec3,
    direction: Vec3,
    limit: f32,
    epsilon: f32,
    steps: u32,
) -> Result<(Closest, Vec3, f32), EvalError> {
    let mut closest = Closest {
        object: 0,
        distance: MAX_VALUE,
    };
    let mut position = from;
    let mut travelled = 0.0;

    for _ in 1..=steps {
        closest = evaluator.closest(position)?;

        if closest.distance < epsilon {
            travelled += closest.distance;
            position = from + direction * travelled;
            break;
        }

        if travelled > limit {
            travelled = limit;
            position = from + direction * travelled;
            break;
        }

        travelled += closest.distance * 0.5;
        position = from + direction * travelled;
        travelled -= epsilon;
    }

    Ok((closest, position, travelled))
}

/// Start of a refracted ray: `6 * epsilon` past the surface along the
/// normal. Marched hits rest about `2 * epsilon` in front of it.
#[inline]
fn refraction_origin(position: Vec3, direction: Vec3, normal: Vec3, epsilon: f32) -> Vec3 {
    position - 6.0 * epsilon * direction / direction.dot(normal)
}

/// Start of a reflected ray: `2 * epsilon` off the surface along the normal
#[inline]
fn reflection_origin(position: Vec3, normal: Vec3, epsilon: f32) -> Vec3 {
    position + 2.0 * epsilon * normal
}

/// Refracted direction and the medium entered, or `None` on total internal
/// reflection
fn transmit(
    current: &MaterialSample,
    material: &MaterialSample,
    air: &MaterialSample,
    backface: bool,
    direction: Vec3,
    normal: Vec3,
) -> Option<(Vec3, MaterialSample)> {
    let mut eta = current.refraction / material.refraction;
    if backface {
        eta = 1.0 / eta;
    }
    let refracted = refract(direction, normal, eta);
    if refracted == Vec3::ZERO {
        return None;
    }
    Some((refracted, if backface { *air } else { *material }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::{Material, Spotlight};
    use crate::expression::{scalar, value};
    use crate::scene::{Camera, SceneBuilder};

    fn small() -> Options {
        Options::default().with_size(8, 8).with_steps(96).with_bounces(3)
    }

    #[test]
    fn test_empty_scene_is_black() {
        let scene = SceneBuilder::new().build();
        let tracer = PathTracer::new(&scene, small()).unwrap();
        let px = tracer.trace_pixel(Vec2::ZERO, &Frame::default(), Vec4::ZERO).unwrap();
        assert_eq!(px, Vec4::ZERO);
    }

    #[test]
    fn test_emitter_in_view_is_counted() {
        let mut b = SceneBuilder::new();
        let s = b.sphere();
        let lamp = Material::default().with_color(value(&[0.0])).with_emissivity(value(&[2.0]));
        b.model(s, lamp).unwrap();
        let scene = b.build();
        let tracer = PathTracer::new(&scene, small()).unwrap();
        let px = tracer.trace_pixel(Vec2::new(0.01, 0.02), &Frame::default(), Vec4::ZERO).unwrap();
        // Absorbing emitter: one event, then the path stops
        assert_eq!(px.w, 1.0);
        assert!((px.x - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_inside_spotlight_sphere() {
        let mut b = SceneBuilder::new();
        let s = b.sphere();
        let sky = b.scale(scalar(100.0), s).unwrap();
        let light = Spotlight::default().with_ambient(scalar(1.0));
        b.model(sky, light.into()).unwrap();
        b.camera(Camera::look_at(value(&[0.0, 0.0, 4.0]), value(&[0.0]))).unwrap();
        let scene = b.build();
        let tracer = PathTracer::new(&scene, small()).unwrap();
        let px = tracer.trace_pixel(Vec2::new(0.3, -0.2), &Frame::default(), Vec4::ZERO).unwrap();
        assert_eq!(px.w, 1.0);
        assert!(px.x >= 1.0);
    }

    #[test]
    fn test_clicked_halves_previous() {
        let scene = SceneBuilder::new().build();
        let tracer = PathTracer::new(&scene, small()).unwrap();
        let frame = Frame {
            clicked: true,
            ..Frame::default()
        };
        let px = tracer.trace_pixel(Vec2::ZERO, &frame, Vec4::splat(4.0)).unwrap();
        assert_eq!(px, Vec4::splat(2.0));
    }

    #[test]
    fn test_render_frame_accumulates() {
        let mut b = SceneBuilder::new();
        let s = b.sphere();
        let big = b.scale(scalar(100.0), s).unwrap();
        let glow = Material::default().with_color(value(&[0.0])).with_emissivity(value(&[1.0]));
        b.model(big, glow).unwrap();
        let scene = b.build();
        let tracer = PathTracer::new(&scene, small()).unwrap();

        let first = tracer.render_frame(&Frame::at(0), &[]).unwrap();
        assert_eq!(first.len(), 64);
        assert!(first.iter().all(|p| p.w == 1.0));
        let second = tracer.render_frame(&Frame::at(1), &first).unwrap();
        assert!(second.iter().all(|p| p.w == 2.0));
    }

    #[test]
    fn test_pixel_uv_corners() {
        let scene = SceneBuilder::new().build();
        let tracer = PathTracer::new(&scene, Options::default().with_size(2, 2)).unwrap();
        assert_eq!(tracer.pixel_uv(0, 0), Vec2::new(-0.5, 0.5));
        assert_eq!(tracer.pixel_uv(1, 1), Vec2::new(0.5, -0.5));
    }

    #[test]
    fn test_invalid_options_rejected() {
        let scene = SceneBuilder::new().build();
        let err = PathTracer::new(&scene, Options::default().with_size(0, 4)).err();
        assert!(matches!(err, Some(OptionsError::Invalid { field: "width", .. })));
        assert!(PathTracer::new(&scene, small().with_bounces(0)).is_err());
    }

    #[test]
    fn test_spawn_offsets() {
        let e = 1e-3;
        // A hit resting 2 epsilon above the plane y = 0
        let hit = Vec3::new(0.3, 2.0 * e, -0.1);
        for direction in [Vec3::NEG_Y, Vec3::new(0.6, -0.8, 0.0)] {
            let through = refraction_origin(hit, direction, Vec3::Y, e);
            assert!((through.y + 4.0 * e).abs() < 1e-6, "{:?}", through);
        }
        let lifted = reflection_origin(hit, Vec3::Y, e);
        assert!((lifted - Vec3::new(0.3, 4.0 * e, -0.1)).length() < 1e-6);
    }

    #[test]
    fn test_total_internal_reflection_keeps_medium() {
        let glass = MaterialSample {
            refraction: 1.5,
            ..MaterialSample::default()
        };
        let air = MaterialSample {
            refraction: 1.0,
            ..MaterialSample::default()
        };
        // Back face: eta inverts to 1.5, a grazing ray cannot get through
        let d = Vec3::new(0.9, 0.1, 0.0).normalize();
        assert!(transmit(&air, &glass, &air, true, d, -Vec3::Y).is_none());
        // Entering glass head-on
        let hit = transmit(&air, &glass, &air, false, -Vec3::Y, Vec3::Y).unwrap();
        assert_eq!(hit.1.refraction, 1.5);
    }
}
