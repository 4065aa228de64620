//! Program assembly
//!
//! Layout, top to bottom: precision, uniforms and varyings, constants,
//! structs, prototypes of the dispatch functions, helpers, `main`, then for
//! each model its shape functions (dependencies first), `distance<id>`,
//! `normal<id>` and `material<id>`, and finally `materialAir` and the three
//! dispatch functions.

use super::program::{Declaration, Function, Item, Program, Signature, Statement};
use super::resolve_dependencies;
use super::templates::{fill, Helper, MAIN_BODY};
use super::MAX_VALUE;
use crate::expression::{float_literal, render_scalar, Expression, Variable};
use crate::material::Material;
use crate::options::Options;
use crate::scene::{Model, Scene};
use crate::shapes::{shape_body, FunctionNames, ShapeArena, ShapeId, ShapeKind};

/// Assemble the complete program for `scene`
pub fn build_program(scene: &Scene, options: &Options) -> Program {
    let mut program = Program::new();
    let resolved: Vec<(&Model, Vec<ShapeId>)> = scene
        .models()
        .iter()
        .map(|m| (m, resolve_dependencies(scene.shapes(), m.shape)))
        .collect();

    program.push(Item::Precision("highp float".to_string()));
    program.extend(interface());
    program.extend(constants(options));
    program.extend(structs());
    program.extend(prototypes().into_iter().map(Item::Prototype));

    for helper in needed_helpers(scene.shapes(), resolved.iter().flat_map(|(_, ids)| ids.iter())) {
        program.push(Item::Function(helper.function()));
    }

    program.push(Item::Function(main_function(scene)));

    for (model, order) in &resolved {
        tracing::trace!(model = model.id, shapes = order.len(), "emitting model");
        let names = FunctionNames { model: model.id };
        for id in order {
            let node = scene.shapes().node(*id);
            let body = shape_body(node, &names).into_iter().map(Statement::Line).collect();
            program.push(Item::Function(Function::new(
                Signature::new("float", names.shape(*id), &[("vec3", "p"), ("vec3", "cell")]),
                body,
            )));
        }
        program.push(Item::Function(distance_function(model, &names)));
        program.push(Item::Function(normal_function(model.id)));
        program.push(Item::Function(material_function(
            format!("material{}", model.id),
            &model.material,
        )));
    }

    program.push(Item::Function(material_function("materialAir".to_string(), scene.air())));
    program.push(Item::Function(closest_dispatch(scene.models())));
    program.push(Item::Function(normal_dispatch(scene.models())));
    program.push(Item::Function(material_dispatch(scene.models())));

    program
}

fn interface() -> Vec<Item> {
    vec![
        Item::Uniform(Declaration::new("sampler2D", "texture")),
        Item::Uniform(Declaration::new("vec2", "resolution")),
        Item::Uniform(Declaration::new("vec2", "mouse")),
        Item::Uniform(Declaration::new("bool", "clicked")),
        Item::Uniform(Declaration::new("float", "time")),
        Item::Varying(Declaration::new("vec2", "uv")),
    ]
}

fn constants(options: &Options) -> Vec<Item> {
    let constant = |ty: &str, name: &str, value: String| Item::Constant {
        declaration: Declaration::new(ty, name),
        value,
    };
    vec![
        constant("float", "PI", "3.14159".to_string()),
        constant("float", "MAX_VALUE", float_literal(MAX_VALUE)),
        constant("float", "epsilon", float_literal(options.epsilon)),
        constant("int", "steps", options.steps.to_string()),
        constant("int", "bounces", options.bounces.to_string()),
        constant("int", "iterations", options.iterations.to_string()),
    ]
}

fn structs() -> Vec<Item> {
    vec![
        Item::Struct {
            name: "Closest".to_string(),
            fields: vec![
                Declaration::new("int", "object"),
                Declaration::new("float", "distance"),
            ],
        },
        Item::Struct {
            name: "Material".to_string(),
            fields: vec![
                Declaration::new("float", "transmittance"),
                Declaration::new("float", "smoothness"),
                Declaration::new("float", "refraction"),
                Declaration::new("float", "scatter"),
                Declaration::new("vec3", "color"),
                Declaration::new("vec3", "emissivity"),
            ],
        },
    ]
}

fn prototypes() -> Vec<Signature> {
    vec![
        Signature::new("Closest", "calculateClosest", &[("vec3", "position")]),
        Signature::new("vec3", "calculateNormal", &[("int", "object"), ("vec3", "position")]),
        Signature::new(
            "Material",
            "calculateMaterial",
            &[
                ("int", "object"),
                ("vec3", "position"),
                ("vec3", "normal"),
                ("vec3", "direction"),
            ],
        ),
        Signature::new("Material", "materialAir", &[("vec3", "p"), ("vec3", "n"), ("vec3", "d")]),
    ]
}

/// Fixed helpers plus the ones referenced by emitted shape bodies
pub(crate) fn needed_helpers<'a>(
    arena: &ShapeArena,
    ids: impl Iterator<Item = &'a ShapeId>,
) -> Vec<Helper> {
    let (mut smin, mut smax, mut ellipsoid) = (false, false, false);
    for id in ids {
        match arena.node(*id).kind {
            ShapeKind::SmoothUnion { .. } => smin = true,
            ShapeKind::SmoothIntersection { .. } | ShapeKind::SmoothDifference { .. } => smax = true,
            ShapeKind::Skull => {
                smin = true;
                smax = true;
                ellipsoid = true;
            }
            _ => {}
        }
    }

    let mut helpers = Helper::ALWAYS.to_vec();
    if smin {
        helpers.push(Helper::SmoothMin);
    }
    if smax {
        helpers.push(Helper::SmoothMax);
    }
    if ellipsoid {
        helpers.push(Helper::Ellipsoid);
    }
    helpers
}

fn main_function(scene: &Scene) -> Function {
    let camera = scene.camera();
    let eye = camera.eye.to_string();
    let target = camera.target.to_string();
    let up = camera.up.to_string();
    let field_of_view = render_scalar(&camera.field_of_view);
    let aperture = render_scalar(&camera.aperture);
    let body = fill(
        MAIN_BODY,
        &[
            ("eye", &eye),
            ("target", &target),
            ("up", &up),
            ("field_of_view", &field_of_view),
            ("aperture", &aperture),
        ],
    );
    Function::new(Signature::new("void", "main", &[]), Statement::lines(&body))
}

fn distance_function(model: &Model, names: &FunctionNames) -> Function {
    Function::new(
        Signature::new("float", format!("distance{}", model.id), &[("vec3", "p")]),
        vec![Statement::line(format!(
            "return {};",
            names.call(model.shape, "p", "vec3(0.0)")
        ))],
    )
}

fn normal_function(id: u32) -> Function {
    let difference = |offset: &str| format!("distance{id}(p + e.{offset}) - distance{id}(p - e.{offset})");
    Function::new(
        Signature::new("vec3", format!("normal{}", id), &[("vec3", "p")]),
        vec![
            Statement::line("vec2 e = vec2(epsilon, 0.0);"),
            Statement::line("return normalize(vec3("),
            Statement::line(format!("    {},", difference("xyy"))),
            Statement::line(format!("    {},", difference("yxy"))),
            Statement::line(format!("    {}));", difference("yyx"))),
        ],
    )
}

fn material_function(name: String, material: &Material) -> Function {
    let mut body = Vec::new();
    if material.fields().iter().any(|(_, e)| e.reads(Variable::Cell)) {
        body.push(Statement::line("vec3 cell = vec3(0.0);"));
    }
    body.push(Statement::line("Material m;"));
    for (field, expression) in material.fields() {
        body.push(Statement::line(format!("m.{} = {};", field, render_field(field, expression))));
    }
    body.push(Statement::line("return m;"));
    Function::new(
        Signature::new("Material", name, &[("vec3", "p"), ("vec3", "n"), ("vec3", "d")]),
        body,
    )
}

fn render_field(field: &str, expression: &Expression) -> String {
    match field {
        "color" | "emissivity" => expression.to_string(),
        _ => render_scalar(expression),
    }
}

fn closest_dispatch(models: &[Model]) -> Function {
    let mut body = vec![
        Statement::line("Closest closest = Closest(0, MAX_VALUE);"),
        Statement::line("float candidate;"),
    ];
    for model in models {
        body.push(Statement::Blank);
        body.push(Statement::line(format!("candidate = abs(distance{}(position));", model.id)));
        body.push(Statement::Block {
            header: "if (candidate < closest.distance)".to_string(),
            body: vec![Statement::line(format!("closest = Closest({}, candidate);", model.id))],
        });
    }
    body.push(Statement::Blank);
    body.push(Statement::line("return closest;"));
    Function::new(prototypes().swap_remove(0), body)
}

fn normal_dispatch(models: &[Model]) -> Function {
    let mut body: Vec<Statement> = models
        .iter()
        .map(|model| guard(model.id, format!("return normal{}(position);", model.id)))
        .collect();
    body.push(Statement::line("return vec3(0.0);"));
    Function::new(prototypes().swap_remove(1), body)
}

fn material_dispatch(models: &[Model]) -> Function {
    let mut body: Vec<Statement> = models
        .iter()
        .map(|model| {
            guard(
                model.id,
                format!("return material{}(position, normal, direction);", model.id),
            )
        })
        .collect();
    body.push(Statement::line(
        "return Material(0.0, 0.0, 0.0, 0.0, vec3(0.0), vec3(0.0));",
    ));
    Function::new(prototypes().swap_remove(2), body)
}

fn guard(id: u32, statement: String) -> Statement {
    Statement::Guard {
        header: format!("if (object == {})", id),
        statement: Box::new(Statement::Line(statement)),
    }
}
