// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Conversion of per-instance transforms into GPU-instanced draws.

use nalgebra::Matrix4;
use rustc_hash::FxHashMap;

use crate::error::Result;
use crate::graph::SceneGraph;
use crate::keys::NodeKey;
use crate::node::{Node, NodeKind};

/// Replace transform children of `root` that share a single child with one
/// [`NodeKind::Instanced`] node per shared child, and mark `root` as drawn
/// instanced.
///
/// Children that are not single-child transforms are left alone. Returns
/// the number of instanced nodes created.
pub fn convert_to_draw_instanced(graph: &mut SceneGraph, root: NodeKey) -> Result<usize> {
    let mut order: Vec<NodeKey> = Vec::new();
    let mut groups: FxHashMap<NodeKey, (Vec<Matrix4<f64>>, Vec<NodeKey>)> = FxHashMap::default();

    for &child in graph.get(root)?.children() {
        let Some(node) = graph.node(child) else {
            continue;
        };
        let (NodeKind::Transform(matrix), [shared]) = (&node.kind, node.children()) else {
            continue;
        };
        let entry = groups.entry(*shared).or_insert_with(|| {
            order.push(*shared);
            (Vec::new(), Vec::new())
        });
        entry.0.push(*matrix);
        entry.1.push(child);
    }

    let mut created = 0;
    for shared in order {
        let Some((matrices, transforms)) = groups.remove(&shared) else {
            continue;
        };
        tracing::debug!(instances = matrices.len(), "converting transforms to draw-instanced");

        let instanced = graph.add_node(Node::new(NodeKind::Instanced(matrices)));
        graph.add_child(instanced, shared)?;
        graph.add_child(root, instanced)?;
        for xf in &transforms {
            graph.remove_child(root, *xf);
        }
        graph.prune_orphans(&transforms);
        created += 1;
    }

    graph.state_mut(root)?.draw_instanced = true;
    Ok(created)
}
