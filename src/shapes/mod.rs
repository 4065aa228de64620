//! Shape algebra
//!
//! Shapes form a DAG of distance-function nodes stored in a [`ShapeArena`].
//! A node is identified by its [`ShapeId`], assigned once when the node is
//! pushed and never reused. Two handles denote "the same shape" exactly when
//! their ids are equal; structurally equal nodes pushed twice stay distinct.
//!
//! Children must already live in the arena when a parent is pushed, so a
//! dependency always has a smaller id than its dependent and the graph is
//! acyclic by construction.
//!
//! # Node kinds
//!
//! - **Primitives**: sphere, cube, plane, smooth box, cylinder, torus,
//!   truchet, skull
//! - **Transforms**: translate, scale, rotate about X/Y/Z
//! - **Operations**: union, intersection, difference and their smooth variants
//! - **Repetition**: modulate (per-cell child), repeat (shared child)

mod glsl;
pub mod primitives;

pub use glsl::{FunctionNames, shape_body};

use crate::expression::Expression;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_ARENA: AtomicU32 = AtomicU32::new(1);

/// Stable identifier of a shape node (1-based, in construction order).
///
/// An id also carries the tag of the arena that issued it, so a handle
/// from another builder is rejected even when its number is in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId {
    arena: u32,
    number: u32,
}

impl ShapeId {
    /// Position of the node inside its arena
    #[inline]
    pub fn index(self) -> usize {
        (self.number - 1) as usize
    }

    /// Raw numeric id
    #[inline]
    pub fn get(self) -> u32 {
        self.number
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number)
    }
}

/// Handle to a shape inside a scene under construction
pub type Shape = ShapeId;

/// Rotation axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// X axis
    X,
    /// Y axis
    Y,
    /// Z axis
    Z,
}

/// A shape node's operator and parameters
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeKind {
    // === Primitives ===
    /// Sphere of radius 0.5 at the origin
    Sphere,
    /// Axis-aligned cube with edge 1 at the origin
    Cube,
    /// Half-space `dot(p, normal) + offset`
    Plane {
        /// Plane normal (vec3)
        normal: Expression,
        /// Offset along the normal (scalar slot)
        offset: Expression,
    },
    /// Box of full size `size` with edges rounded by `radius`
    SmoothBox {
        /// Full extents (vec3)
        size: Expression,
        /// Rounding radius (scalar slot)
        radius: Expression,
    },
    /// Capped cylinder along Y
    Cylinder {
        /// Radius (scalar slot)
        radius: Expression,
        /// Full height (scalar slot)
        height: Expression,
    },
    /// Torus in the XZ plane
    Torus {
        /// Ring radius (scalar slot)
        major: Expression,
        /// Tube radius (scalar slot)
        minor: Expression,
    },
    /// Unit-cell truchet tiling of quarter tori
    Truchet {
        /// Tube radius (scalar slot)
        thickness: Expression,
    },
    /// Fixed analytic skull approximation, about one unit tall
    Skull,

    // === Transforms ===
    /// Move `child` by `offset`
    Translate {
        /// Offset (vec3)
        offset: Expression,
        /// Transformed shape
        child: ShapeId,
    },
    /// Uniformly scale `child`
    Scale {
        /// Scale factor (scalar slot)
        factor: Expression,
        /// Transformed shape
        child: ShapeId,
    },
    /// Rotate `child` about an axis
    Rotate {
        /// Rotation axis
        axis: Axis,
        /// Angle in radians (scalar slot)
        angle: Expression,
        /// Transformed shape
        child: ShapeId,
    },

    // === Operations ===
    /// `min(a, b)`
    Union {
        /// First operand
        a: ShapeId,
        /// Second operand
        b: ShapeId,
    },
    /// `max(a, b)`
    Intersection {
        /// First operand
        a: ShapeId,
        /// Second operand
        b: ShapeId,
    },
    /// `max(a, -b)`
    Difference {
        /// Shape carved from
        a: ShapeId,
        /// Shape carved out
        b: ShapeId,
    },
    /// Polynomial smooth minimum
    SmoothUnion {
        /// First operand
        a: ShapeId,
        /// Second operand
        b: ShapeId,
        /// Blend radius (scalar slot)
        radius: Expression,
    },
    /// Polynomial smooth maximum
    SmoothIntersection {
        /// First operand
        a: ShapeId,
        /// Second operand
        b: ShapeId,
        /// Blend radius (scalar slot)
        radius: Expression,
    },
    /// Polynomial smooth maximum of `a` and `-b`
    SmoothDifference {
        /// Shape carved from
        a: ShapeId,
        /// Shape carved out
        b: ShapeId,
        /// Blend radius (scalar slot)
        radius: Expression,
    },

    // === Repetition ===
    /// Grid repetition where the child may read the cell index
    Modulate {
        /// Cell size per axis, zero disables an axis (vec3)
        period: Expression,
        /// Shape produced by the mapping for a symbolic cell
        child: ShapeId,
    },
    /// Grid repetition of an unchanged child
    Repeat {
        /// Cell size per axis, zero disables an axis (vec3)
        period: Expression,
        /// Repeated shape
        child: ShapeId,
    },
}

impl ShapeKind {
    /// Child nodes in declaration order
    pub fn children(&self) -> Vec<ShapeId> {
        match self {
            ShapeKind::Sphere
            | ShapeKind::Cube
            | ShapeKind::Plane { .. }
            | ShapeKind::SmoothBox { .. }
            | ShapeKind::Cylinder { .. }
            | ShapeKind::Torus { .. }
            | ShapeKind::Truchet { .. }
            | ShapeKind::Skull => Vec::new(),
            ShapeKind::Translate { child, .. }
            | ShapeKind::Scale { child, .. }
            | ShapeKind::Rotate { child, .. }
            | ShapeKind::Modulate { child, .. }
            | ShapeKind::Repeat { child, .. } => vec![*child],
            ShapeKind::Union { a, b }
            | ShapeKind::Intersection { a, b }
            | ShapeKind::Difference { a, b }
            | ShapeKind::SmoothUnion { a, b, .. }
            | ShapeKind::SmoothIntersection { a, b, .. }
            | ShapeKind::SmoothDifference { a, b, .. } => vec![*a, *b],
        }
    }

    /// Expression parameters with their slot names
    pub fn parameters(&self) -> Vec<(&'static str, &Expression)> {
        match self {
            ShapeKind::Plane { normal, offset } => vec![("plane.normal", normal), ("plane.offset", offset)],
            ShapeKind::SmoothBox { size, radius } => {
                vec![("smooth_box.size", size), ("smooth_box.radius", radius)]
            }
            ShapeKind::Cylinder { radius, height } => {
                vec![("cylinder.radius", radius), ("cylinder.height", height)]
            }
            ShapeKind::Torus { major, minor } => vec![("torus.major", major), ("torus.minor", minor)],
            ShapeKind::Truchet { thickness } => vec![("truchet.thickness", thickness)],
            ShapeKind::Translate { offset, .. } => vec![("translate.offset", offset)],
            ShapeKind::Scale { factor, .. } => vec![("scale.factor", factor)],
            ShapeKind::Rotate { angle, .. } => vec![("rotate.angle", angle)],
            ShapeKind::SmoothUnion { radius, .. }
            | ShapeKind::SmoothIntersection { radius, .. }
            | ShapeKind::SmoothDifference { radius, .. } => vec![("smooth.radius", radius)],
            ShapeKind::Modulate { period, .. } => vec![("modulate.period", period)],
            ShapeKind::Repeat { period, .. } => vec![("repeat.period", period)],
            ShapeKind::Sphere
            | ShapeKind::Cube
            | ShapeKind::Skull
            | ShapeKind::Union { .. }
            | ShapeKind::Intersection { .. }
            | ShapeKind::Difference { .. } => Vec::new(),
        }
    }

    /// Short lowercase name, used in diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            ShapeKind::Sphere => "sphere",
            ShapeKind::Cube => "cube",
            ShapeKind::Plane { .. } => "plane",
            ShapeKind::SmoothBox { .. } => "smooth_box",
            ShapeKind::Cylinder { .. } => "cylinder",
            ShapeKind::Torus { .. } => "torus",
            ShapeKind::Truchet { .. } => "truchet",
            ShapeKind::Skull => "skull",
            ShapeKind::Translate { .. } => "translate",
            ShapeKind::Scale { .. } => "scale",
            ShapeKind::Rotate { .. } => "rotate",
            ShapeKind::Union { .. } => "union",
            ShapeKind::Intersection { .. } => "intersection",
            ShapeKind::Difference { .. } => "difference",
            ShapeKind::SmoothUnion { .. } => "smooth_union",
            ShapeKind::SmoothIntersection { .. } => "smooth_intersection",
            ShapeKind::SmoothDifference { .. } => "smooth_difference",
            ShapeKind::Modulate { .. } => "modulate",
            ShapeKind::Repeat { .. } => "repeat",
        }
    }

    /// True for leaf nodes
    pub fn is_primitive(&self) -> bool {
        self.children().is_empty()
    }
}

/// A node of the shape DAG
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeNode {
    /// Identity of the node
    pub id: ShapeId,
    /// Operator and parameters
    pub kind: ShapeKind,
    /// Direct children, in declaration order
    pub dependencies: Vec<ShapeId>,
}

/// Append-only storage of shape nodes
#[derive(Debug, Clone)]
pub struct ShapeArena {
    tag: u32,
    nodes: Vec<ShapeNode>,
}

impl Default for ShapeArena {
    fn default() -> Self {
        ShapeArena {
            tag: NEXT_ARENA.fetch_add(1, Ordering::Relaxed),
            nodes: Vec::new(),
        }
    }
}

impl ShapeArena {
    /// Empty arena with a fresh tag
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a node and return its fresh id.
    ///
    /// Returns `None` if a child id does not belong to this arena.
    pub(crate) fn push(&mut self, kind: ShapeKind) -> Option<ShapeId> {
        if kind.children().iter().any(|c| !self.contains(*c)) {
            return None;
        }
        Some(self.insert(kind))
    }

    /// Store a node whose children are known to belong to this arena
    pub(crate) fn insert(&mut self, kind: ShapeKind) -> ShapeId {
        let dependencies = kind.children();
        let id = ShapeId {
            arena: self.tag,
            number: self.nodes.len() as u32 + 1,
        };
        self.nodes.push(ShapeNode {
            id,
            kind,
            dependencies,
        });
        id
    }

    /// True if `id` names a node of this arena
    #[inline]
    pub fn contains(&self, id: ShapeId) -> bool {
        id.arena == self.tag && id.number >= 1 && id.index() < self.nodes.len()
    }

    /// Look a node up.
    ///
    /// # Panics
    /// If `id` does not belong to this arena.
    #[inline]
    pub fn node(&self, id: ShapeId) -> &ShapeNode {
        &self.nodes[id.index()]
    }

    /// Look a node up without panicking
    #[inline]
    pub fn get(&self, id: ShapeId) -> Option<&ShapeNode> {
        if self.contains(id) {
            Some(&self.nodes[id.index()])
        } else {
            None
        }
    }

    /// Number of nodes
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if no node has been pushed
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate nodes in id order
    pub fn iter(&self) -> impl Iterator<Item = &ShapeNode> {
        self.nodes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::value;

    #[test]
    fn test_ids_are_sequential() {
        let mut arena = ShapeArena::new();
        let a = arena.push(ShapeKind::Sphere).unwrap();
        let b = arena.push(ShapeKind::Cube).unwrap();
        assert_eq!(a.get(), 1);
        assert_eq!(b.get(), 2);
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_dependencies_follow_children() {
        let mut arena = ShapeArena::new();
        let a = arena.push(ShapeKind::Sphere).unwrap();
        let b = arena.push(ShapeKind::Cube).unwrap();
        let u = arena.push(ShapeKind::Union { a, b }).unwrap();
        assert_eq!(arena.node(u).dependencies, vec![a, b]);
        assert!(arena.node(a).kind.is_primitive());
    }

    #[test]
    fn test_foreign_child_rejected() {
        let mut arena = ShapeArena::new();
        let missing = ShapeId {
            arena: arena.tag,
            number: 7,
        };
        let pushed = arena.push(ShapeKind::Translate {
            offset: value(&[1.0, 0.0, 0.0]),
            child: missing,
        });
        assert!(pushed.is_none());
        assert!(arena.is_empty());
    }

    #[test]
    fn test_ids_are_scoped_to_their_arena() {
        let mut first = ShapeArena::new();
        let mut second = ShapeArena::new();
        let a = first.push(ShapeKind::Sphere).unwrap();
        second.push(ShapeKind::Cube).unwrap();
        assert_eq!(a.get(), 1);
        assert!(!second.contains(a));
        assert!(second.get(a).is_none());
        assert!(second.push(ShapeKind::Scale { factor: value(&[2.0]), child: a }).is_none());
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn test_structurally_equal_nodes_stay_distinct() {
        let mut arena = ShapeArena::new();
        let a = arena.push(ShapeKind::Sphere).unwrap();
        let b = arena.push(ShapeKind::Sphere).unwrap();
        assert_ne!(a, b);
        assert_eq!(arena.node(a).kind, arena.node(b).kind);
    }
}
