//! Dependency resolution
//!
//! Orders the nodes reachable from a root so that every node appears after
//! all of its dependencies, and each node appears once. The order equals
//! "concatenate the resolved lists of the children in declaration order,
//! append the node itself, keep the first occurrence of every id".

use crate::shapes::{ShapeArena, ShapeId};

/// Post-order list of the nodes reachable from `root`, without duplicates.
///
/// Nodes not stored in `arena` are skipped, so an unknown root yields an
/// empty list. Uses an explicit stack; deep chains do not recurse.
pub fn resolve_dependencies(arena: &ShapeArena, root: ShapeId) -> Vec<ShapeId> {
    let mut order = Vec::new();
    let mut done = vec![false; arena.len()];
    // (node, index of the next child to visit)
    let mut stack: Vec<(ShapeId, usize)> = Vec::new();

    if arena.contains(root) {
        stack.push((root, 0));
    }

    while let Some(frame) = stack.last_mut() {
        let (id, next) = *frame;
        let dependencies = &arena.node(id).dependencies;

        if next < dependencies.len() {
            frame.1 += 1;
            let child = dependencies[next];
            if arena.contains(child) && !done[child.index()] {
                stack.push((child, 0));
            }
            continue;
        }

        stack.pop();
        if !done[id.index()] {
            done[id.index()] = true;
            order.push(id);
        }
    }

    order
}
