//! GLSL bodies of shape distance functions
//!
//! Every node becomes `float <name>(vec3 p, vec3 cell)`. Children are
//! invoked by name, so a node's function may only be emitted after the
//! functions of all its dependencies.
//!
//! Locals declared by a body start with `_` and never shadow a name an
//! expression can read.

use super::{Axis, ShapeId, ShapeKind, ShapeNode};
use crate::expression::render_scalar;

/// Naming scheme for the distance functions of one model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionNames {
    /// Model whose functions are being named
    pub model: u32,
}

impl FunctionNames {
    /// Function name of node `id`
    pub fn shape(&self, id: ShapeId) -> String {
        format!("shape{}_{}", self.model, id)
    }

    /// Invocation of node `id` at `point` within `cell`
    pub fn call(&self, id: ShapeId, point: &str, cell: &str) -> String {
        format!("{}({}, {})", self.shape(id), point, cell)
    }
}

/// Statements of the distance function for `node`
pub fn shape_body(node: &ShapeNode, names: &FunctionNames) -> Vec<String> {
    let call = |id: ShapeId, point: &str| names.call(id, point, "cell");

    match &node.kind {
        // === Primitives ===
        ShapeKind::Sphere => vec!["return length(p) - 0.5;".to_string()],

        ShapeKind::Cube => vec![
            "vec3 _q = abs(p) - vec3(0.5);".to_string(),
            "return length(max(_q, vec3(0.0))) + min(max(_q.x, max(_q.y, _q.z)), 0.0);".to_string(),
        ],

        ShapeKind::Plane { normal, offset } => vec![format!(
            "return dot(p, {}) + {};",
            normal,
            render_scalar(offset)
        )],

        ShapeKind::SmoothBox { size, radius } => vec![
            format!("float _r = {};", render_scalar(radius)),
            format!("vec3 _q = abs(p) - {} * 0.5 + vec3(_r);", size),
            "return length(max(_q, vec3(0.0))) + min(max(_q.x, max(_q.y, _q.z)), 0.0) - _r;".to_string(),
        ],

        ShapeKind::Cylinder { radius, height } => vec![
            format!(
                "vec2 _d = vec2(length(p.xz) - {}, abs(p.y) - {} * 0.5);",
                render_scalar(radius),
                render_scalar(height)
            ),
            "return min(max(_d.x, _d.y), 0.0) + length(max(_d, vec2(0.0)));".to_string(),
        ],

        ShapeKind::Torus { major, minor } => vec![
            format!("vec2 _q = vec2(length(p.xz) - {}, p.y);", render_scalar(major)),
            format!("return length(_q) - {};", render_scalar(minor)),
        ],

        ShapeKind::Truchet { thickness } => vec![
            "vec3 _c = floor(p);".to_string(),
            "vec3 _q = p - _c - vec3(0.5);".to_string(),
            "if (fract(sin(dot(_c, vec3(7.0, 157.0, 113.0))) * 43758.5453) > 0.5)".to_string(),
            "    _q.x = -_q.x;".to_string(),
            "float _a = length(vec2(length(_q.xy - vec2(0.5, 0.5)) - 0.5, _q.z));".to_string(),
            "float _b = length(vec2(length(_q.yz - vec2(-0.5, -0.5)) - 0.5, _q.x));".to_string(),
            "float _e = length(vec2(length(_q.xz - vec2(-0.5, 0.5)) - 0.5, _q.y));".to_string(),
            format!("return min(_a, min(_b, _e)) - {};", render_scalar(thickness)),
        ],

        ShapeKind::Skull => vec![
            "vec3 _m = vec3(abs(p.x), p.y, p.z);".to_string(),
            "float _d = smin(ellipsoid(p - vec3(0.0, 0.12, -0.05), vec3(0.36, 0.34, 0.42)),".to_string(),
            "    ellipsoid(p - vec3(0.0, -0.12, 0.12), vec3(0.26, 0.24, 0.28)), 0.12);".to_string(),
            "_d = smin(_d, ellipsoid(p - vec3(0.0, -0.32, 0.1), vec3(0.18, 0.1, 0.2)), 0.08);".to_string(),
            "_d = smax(_d, -(length(_m - vec3(0.11, -0.06, 0.32)) - 0.08), 0.03);".to_string(),
            "return smax(_d, -ellipsoid(_m - vec3(0.025, -0.17, 0.38), vec3(0.03, 0.05, 0.06)), 0.02);"
                .to_string(),
        ],

        // === Transforms ===
        ShapeKind::Translate { offset, child } => {
            vec![format!("return {};", call(*child, &format!("p - {}", offset)))]
        }

        ShapeKind::Scale { factor, child } => vec![
            format!("float _s = {};", render_scalar(factor)),
            format!("return {} * _s;", call(*child, "p / _s")),
        ],

        ShapeKind::Rotate { axis, angle, child } => {
            let rotated = match axis {
                Axis::X => "vec3(p.x, _c * p.y + _s * p.z, -_s * p.y + _c * p.z)",
                Axis::Y => "vec3(_c * p.x - _s * p.z, p.y, _s * p.x + _c * p.z)",
                Axis::Z => "vec3(_c * p.x + _s * p.y, -_s * p.x + _c * p.y, p.z)",
            };
            vec![
                format!("float _a = {};", render_scalar(angle)),
                "float _c = cos(_a);".to_string(),
                "float _s = sin(_a);".to_string(),
                format!("return {};", call(*child, rotated)),
            ]
        }

        // === Operations ===
        ShapeKind::Union { a, b } => {
            vec![format!("return min({}, {});", call(*a, "p"), call(*b, "p"))]
        }
        ShapeKind::Intersection { a, b } => {
            vec![format!("return max({}, {});", call(*a, "p"), call(*b, "p"))]
        }
        ShapeKind::Difference { a, b } => {
            vec![format!("return max({}, -{});", call(*a, "p"), call(*b, "p"))]
        }
        ShapeKind::SmoothUnion { a, b, radius } => vec![format!(
            "return smin({}, {}, {});",
            call(*a, "p"),
            call(*b, "p"),
            render_scalar(radius)
        )],
        ShapeKind::SmoothIntersection { a, b, radius } => vec![format!(
            "return smax({}, {}, {});",
            call(*a, "p"),
            call(*b, "p"),
            render_scalar(radius)
        )],
        ShapeKind::SmoothDifference { a, b, radius } => vec![format!(
            "return smax({}, -{}, {});",
            call(*a, "p"),
            call(*b, "p"),
            render_scalar(radius)
        )],

        // === Repetition ===
        ShapeKind::Modulate { period, child } => {
            let mut body = repetition_prelude(&period.to_string());
            body.push(format!("return {};", names.call(*child, "p - _span * _index", "_index")));
            body
        }
        ShapeKind::Repeat { period, child } => {
            let mut body = repetition_prelude(&period.to_string());
            body.push(format!("return {};", names.call(*child, "p - _span * _index", "cell")));
            body
        }
    }
}

fn repetition_prelude(period: &str) -> Vec<String> {
    vec![
        format!("vec3 _span = abs({});", period),
        "vec3 _index = floor(p / max(_span, vec3(1e-6)) + 0.5) * step(vec3(1e-6), _span);".to_string(),
    ]
}
