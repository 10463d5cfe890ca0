// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh flattening: bake every transform beneath a node into one merged
//! drawable.

use std::sync::Arc;

use instancer_geometry::Mesh;

use crate::error::Result;
use crate::graph::SceneGraph;
use crate::keys::NodeKey;
use crate::node::{Node, NodeKind};

/// Replace the children of `root` with a single geode holding every
/// non-billboard mesh beneath it, transformed into `root`'s frame.
///
/// Billboards cannot be baked and are dropped along with the rest of the
/// old sub-graph. Returns the new geode, or `None` if there was nothing to
/// merge.
pub fn flatten_meshes(graph: &mut SceneGraph, root: NodeKey) -> Result<Option<NodeKey>> {
    let placed = graph.collect_meshes(root);

    let mut merged = Mesh::new();
    let mut parts = 0usize;
    for p in placed.iter().filter(|p| !p.billboard) {
        let mut mesh = Mesh::clone(&p.mesh);
        mesh.transform(&p.matrix);
        merged.merge(&mesh);
        parts += 1;
    }

    let old = graph.take_children(root)?;
    let removed = graph.prune_orphans(&old);
    tracing::debug!(parts, removed, vertices = merged.vertex_count(), "flattened meshes");

    if merged.is_empty() {
        return Ok(None);
    }
    let geode = graph.add_node(Node::new(NodeKind::Geode(vec![Arc::new(merged)])));
    graph.add_child(root, geode)?;
    Ok(Some(geode))
}
