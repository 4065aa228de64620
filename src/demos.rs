//! Built-in demo scenes
//!
//! Small scenes exercising each part of the shape algebra; used by the CLI
//! and the benches.

use crate::expression::{random, raw, scalar, value};
use crate::material::{Material, Spotlight};
use crate::scene::{Orbit, Scene, SceneBuilder, SceneError};
use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;

/// A named built-in scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Demo {
    /// A sphere next to a cube
    Simple,
    /// Sphere and cube standing on a floor
    Cubes,
    /// Field of boxes with random per-cell heights under a spotlight
    Modulation,
    /// Truchet tiling carved into a sphere
    Truchet,
    /// Row of repeated skulls on a floor
    Skull,
}

impl Demo {
    /// Every demo
    pub const ALL: [Demo; 5] = [Demo::Simple, Demo::Cubes, Demo::Modulation, Demo::Truchet, Demo::Skull];

    /// Lowercase name
    pub fn name(self) -> &'static str {
        match self {
            Demo::Simple => "simple",
            Demo::Cubes => "cubes",
            Demo::Modulation => "modulation",
            Demo::Truchet => "truchet",
            Demo::Skull => "skull",
        }
    }

    /// Build the scene
    pub fn scene(self) -> Result<Scene, SceneError> {
        let mut b = SceneBuilder::new();
        match self {
            Demo::Simple => {
                b.camera(orbit(4.0, [0.25, -0.5]).camera()?)?;
                sphere_and_cube(&mut b)?;
            }
            Demo::Cubes => {
                b.camera(orbit(4.0, [0.25, -0.5]).camera()?)?;
                let floor = b.plane(value(&[0.0, 1.0, 0.0]), value(&[0.5]))?;
                b.model(floor, Material::new().with_color(value(&[0.6])))?;
                sphere_and_cube(&mut b)?;
            }
            Demo::Modulation => {
                b.air(Material::new().with_scatter(value(&[1000.0])))?;
                let camera = Orbit {
                    field_of_view: value(&[60.0 / 180.0 * PI]),
                    aperture: value(&[0.1]),
                    ..orbit(10.0, [0.25, -0.5])
                };
                b.camera(camera.camera()?)?;
                sky(
                    &mut b,
                    Spotlight::default().with_direction(value(&[1.0, 1.0, 1.0])),
                )?;

                let boxes = b.modulate(value(&[1.0, 100.0, 1.0]), |b, cell| {
                    let height = raw(
                        "0.9, 1.0 + 5.0 * {r}.x, 0.9",
                        vec![("r", random(cell.dot(value(&[1.0, 57.0, 113.0]))))],
                    );
                    b.smooth_box(height, value(&[0.5]))
                })?;
                let ground = b.plane(value(&[0.0, 1.0, 0.0]), value(&[-6.0]))?;
                let field = b.intersection(boxes, ground)?;
                b.model(
                    field,
                    Material::new()
                        .with_color(value(&[0.7, 0.6, 0.5]))
                        .with_smoothness(value(&[0.99])),
                )?;
            }
            Demo::Truchet => {
                b.camera(orbit(1.54, [-0.2, -0.5]).camera()?)?;
                sky(
                    &mut b,
                    Spotlight::default()
                        .with_direction(value(&[1.0, 1.0, 0.0]))
                        .with_color(value(&[0.5])),
                )?;
                let floor = b.plane(value(&[0.0, 1.0, 0.0]), value(&[0.0]))?;
                b.model(floor, Material::default())?;

                let ball = b.sphere();
                let tiles = b.truchet(scalar(0.1))?;
                let fine = b.scale(value(&[0.1]), tiles)?;
                let carved = b.intersection(ball, fine)?;
                b.model(
                    carved,
                    Material::new()
                        .with_color(value(&[0.9, 0.8, 0.4]))
                        .with_smoothness(value(&[0.999])),
                )?;
            }
            Demo::Skull => {
                let camera = Orbit {
                    aperture: value(&[0.1]),
                    ..orbit(3.0, [-0.3, -0.4])
                };
                b.camera(camera.camera()?)?;
                sky(
                    &mut b,
                    Spotlight::default()
                        .with_direction(value(&[1.0, 1.0, 0.0]))
                        .with_color(value(&[0.5]))
                        .with_ambient(value(&[1.0])),
                )?;
                let floor = b.plane(value(&[0.0, 1.0, 0.0]), value(&[0.3]))?;
                b.model(floor, Material::new().with_color(value(&[0.5])))?;

                let skull = b.skull();
                let tilted = b.rotate_z(value(&[-PI / 4.0]), skull)?;
                let row = b.repeat(value(&[1.3, 0.0, 1.0]), tilted)?;
                b.model(
                    row,
                    Material::new()
                        .with_smoothness(value(&[0.99]))
                        .with_color(value(&[0.4, 0.6, 0.8])),
                )?;
            }
        }
        Ok(b.build())
    }
}

impl fmt::Display for Demo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Demo {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Demo::ALL
            .into_iter()
            .find(|d| d.name() == s)
            .ok_or_else(|| format!("unknown demo `{}`", s))
    }
}

fn orbit(radius: f32, offset: [f32; 2]) -> Orbit {
    Orbit {
        radius: value(&[radius]),
        offset: value(&offset),
        ..Orbit::default()
    }
}

/// Huge enclosing sphere lit by `light`
fn sky(b: &mut SceneBuilder, light: Spotlight) -> Result<u32, SceneError> {
    let sphere = b.sphere();
    let dome = b.scale(value(&[1000.0]), sphere)?;
    b.model(dome, light.into())
}

fn sphere_and_cube(b: &mut SceneBuilder) -> Result<(), SceneError> {
    let sphere = b.sphere();
    let left = b.translate(value(&[-0.5, 0.0, 0.0]), sphere)?;
    b.model(left, Material::new().with_color(value(&[0.8, 0.4, 0.8])))?;
    let cube = b.cube();
    let right = b.translate(value(&[0.5, 0.0, 0.0]), cube)?;
    b.model(right, Material::new().with_color(value(&[0.8, 0.9, 0.1])))?;
    Ok(())
}
